//! CPU reference traversal.
//!
//! Walks the tree the same way the device kernel does: an explicit stack of
//! node indices, a slab test at every node and a ray/triangle test for every
//! triangle of a leaf. `child_index == 0` is the only leaf test.

use rayon::prelude::*;
use smallvec::{smallvec, SmallVec};

use super::aabb::BoundingBox;
use super::tree::Bvh;
use super::triangle::Triangle;
use crate::util::{Result, Vec3};

/// Determinant below which a ray counts as parallel to a triangle.
const PARALLEL_EPS: f32 = 1e-12;

/// Inline stack capacity; deeper trees spill to the heap.
type NodeStack = SmallVec<[u32; 64]>;

/// A ray with a cached reciprocal direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
    pub inv_direction: Vec3,
    pub t_min: f32,
    pub t_max: f32,
}

impl Ray {
    /// Ray over `[0, inf)`.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self::with_range(origin, direction, 0.0, f32::INFINITY)
    }

    pub fn with_range(origin: Vec3, direction: Vec3, t_min: f32, t_max: f32) -> Self {
        Self {
            origin,
            direction,
            inv_direction: direction.recip(),
            t_min,
            t_max,
        }
    }

    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// Closest intersection found by a traversal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub t: f32,
    /// Barycentric weight of the second vertex.
    pub u: f32,
    /// Barycentric weight of the third vertex.
    pub v: f32,
    /// Index into the global triangle buffer.
    pub triangle: u32,
    pub model: u32,
}

/// Slab test. Returns the entry distance if the ray overlaps the box within
/// `[ray.t_min, t_max]`.
#[inline]
pub fn intersect_aabb(ray: &Ray, bounds: &BoundingBox, t_max: f32) -> Option<f32> {
    if bounds.is_empty() {
        return None;
    }
    // Axes the ray runs parallel to give 0 * inf = NaN on a face; those only
    // need the origin inside the slab.
    let moving = ray.direction.cmpne(Vec3::ZERO);
    let inside = ray.origin.cmpge(bounds.min) & ray.origin.cmple(bounds.max);
    if !(moving | inside).all() {
        return None;
    }
    let t1 = (bounds.min - ray.origin) * ray.inv_direction;
    let t2 = (bounds.max - ray.origin) * ray.inv_direction;
    let lo = Vec3::select(moving, t1.min(t2), Vec3::NEG_INFINITY);
    let hi = Vec3::select(moving, t1.max(t2), Vec3::INFINITY);
    let t_near = lo.max_element().max(ray.t_min);
    let t_far = hi.min_element().min(t_max);
    (t_near <= t_far).then_some(t_near)
}

/// Möller-Trumbore ray/triangle test. Returns `(t, u, v)`.
#[inline]
pub fn intersect_triangle(ray: &Ray, tri: &Triangle, t_max: f32) -> Option<(f32, f32, f32)> {
    let [a, b, c] = tri.positions;
    let e1 = b - a;
    let e2 = c - a;
    let p = ray.direction.cross(e2);
    let det = e1.dot(p);
    if det.abs() < PARALLEL_EPS {
        return None;
    }
    let inv_det = 1.0 / det;
    let s = ray.origin - a;
    let u = s.dot(p) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }
    let q = s.cross(e1);
    let v = ray.direction.dot(q) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }
    let t = e2.dot(q) * inv_det;
    if t < ray.t_min || t > t_max {
        return None;
    }
    Some((t, u, v))
}

impl<M> Bvh<M> {
    /// Closest hit against a single model.
    pub fn intersect_model(&self, model_index: usize, ray: &Ray) -> Result<Option<Hit>> {
        let model = self.model(model_index)?;
        Ok(self.trace(model_index as u32, model.node_offset, ray, ray.t_max))
    }

    /// Closest hit over every model.
    pub fn intersect(&self, ray: &Ray) -> Option<Hit> {
        let mut closest: Option<Hit> = None;
        for (i, model) in self.models().iter().enumerate() {
            let t_max = closest.map_or(ray.t_max, |h| h.t);
            if let Some(hit) = self.trace(i as u32, model.node_offset, ray, t_max) {
                closest = Some(hit);
            }
        }
        closest
    }

    /// Trace a batch of rays in parallel.
    pub fn intersect_batch(&self, rays: &[Ray]) -> Vec<Option<Hit>>
    where
        M: Sync,
    {
        rays.par_iter().map(|ray| self.intersect(ray)).collect()
    }

    /// Stack walk from `root`, keeping only hits closer than `t_max`.
    fn trace(&self, model: u32, root: u32, ray: &Ray, mut t_max: f32) -> Option<Hit> {
        let nodes = self.nodes();
        let triangles = self.triangles();
        let mut closest = None;
        let mut stack: NodeStack = smallvec![root];

        while let Some(idx) = stack.pop() {
            let node = &nodes[idx as usize];
            if intersect_aabb(ray, &node.bounds, t_max).is_none() {
                continue;
            }

            if node.child_index == 0 {
                for i in node.triangle_range() {
                    if let Some((t, u, v)) = intersect_triangle(ray, &triangles[i], t_max) {
                        t_max = t;
                        closest = Some(Hit {
                            t,
                            u,
                            v,
                            triangle: i as u32,
                            model,
                        });
                    }
                }
                continue;
            }

            // Push the far child first so the near one is popped next
            let left = node.child_index;
            let right = left + 1;
            let t_left = intersect_aabb(ray, &nodes[left as usize].bounds, t_max);
            let t_right = intersect_aabb(ray, &nodes[right as usize].bounds, t_max);
            match (t_left, t_right) {
                (Some(tl), Some(tr)) if tl <= tr => stack.extend([right, left]),
                (Some(_), Some(_)) => stack.extend([left, right]),
                (Some(_), None) => stack.push(left),
                (None, Some(_)) => stack.push(right),
                (None, None) => {}
            }
        }
        closest
    }
}
