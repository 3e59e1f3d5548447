//! Split-plane selection and in-place partitioning.
//!
//! Two policies are available:
//! - [`SplitPolicy::Sah`]: a handful of evenly spaced candidate planes per
//!   axis, scored by the surface area heuristic. The default.
//! - [`SplitPolicy::Midpoint`]: centre of the longest axis, no cost model.
//!
//! Both classify triangles by centroid: strictly below the plane goes left,
//! everything else goes right.

use serde::{Deserialize, Serialize};

use super::aabb::BoundingBox;
use super::triangle::Triangle;
use crate::util::Axis;

/// Default number of SAH candidate planes per axis.
pub const DEFAULT_SAH_CANDIDATES: u32 = 5;

/// How a node picks its split plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SplitPolicy {
    /// Evaluate `candidates` planes per axis at `i / (candidates + 1)` of the
    /// node extent and keep the cheapest.
    Sah { candidates: u32 },
    /// Split the longest axis at the box centre.
    Midpoint,
}

impl Default for SplitPolicy {
    fn default() -> Self {
        Self::Sah {
            candidates: DEFAULT_SAH_CANDIDATES,
        }
    }
}

/// A chosen split plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitPlane {
    pub axis: Axis,
    pub position: f32,
    /// SAH cost of the split, `None` for policies without a cost model.
    pub cost: Option<f32>,
}

impl SplitPolicy {
    /// Pick a split plane for `triangles` (the node's range) bounded by
    /// `bounds`, or `None` when the node should stay a leaf.
    pub fn choose(&self, triangles: &[Triangle], bounds: &BoundingBox) -> Option<SplitPlane> {
        if triangles.is_empty() || bounds.is_empty() {
            return None;
        }
        match *self {
            Self::Sah { candidates } => sah_split(triangles, bounds, candidates),
            Self::Midpoint => Some(midpoint_split(bounds)),
        }
    }
}

/// Centre of the longest axis.
pub fn midpoint_split(bounds: &BoundingBox) -> SplitPlane {
    let axis = bounds.longest_axis();
    SplitPlane {
        axis,
        position: bounds.centre()[axis],
        cost: None,
    }
}

/// SAH cost of splitting `triangles` at `position` on `axis`.
///
/// Returns `None` when one side would be empty.
pub fn evaluate_sah(triangles: &[Triangle], axis: Axis, position: f32) -> Option<f32> {
    let mut left_box = BoundingBox::EMPTY;
    let mut right_box = BoundingBox::EMPTY;
    let mut left_count = 0u32;
    let mut right_count = 0u32;

    for tri in triangles {
        if tri.centroid()[axis] < position {
            left_box.grow_triangle(tri);
            left_count += 1;
        } else {
            right_box.grow_triangle(tri);
            right_count += 1;
        }
    }

    if left_count == 0 || right_count == 0 {
        return None;
    }
    Some(left_count as f32 * left_box.surface_area() + right_count as f32 * right_box.surface_area())
}

/// Best SAH split across all three axes.
///
/// Candidates are compared with strict `<`, so on equal cost the earlier
/// axis (x, y, z) and the lower plane win. The winner is rejected unless it
/// beats the cost of leaving the node whole, `count * area(bounds)`.
pub fn sah_split(triangles: &[Triangle], bounds: &BoundingBox, candidates: u32) -> Option<SplitPlane> {
    let extent = bounds.extent();
    let steps = candidates as f32 + 1.0;
    let mut best: Option<SplitPlane> = None;
    let mut best_cost = f32::INFINITY;

    for axis in 0..3 {
        for i in 1..=candidates {
            let position = bounds.min[axis] + extent[axis] * (i as f32 / steps);
            let Some(cost) = evaluate_sah(triangles, axis, position) else {
                continue;
            };
            if cost < best_cost {
                best_cost = cost;
                best = Some(SplitPlane {
                    axis,
                    position,
                    cost: Some(cost),
                });
            }
        }
    }

    let leaf_cost = triangles.len() as f32 * bounds.surface_area();
    best.filter(|_| best_cost < leaf_cost)
}

/// Reorder `triangles` in place so that those with centroid below `position`
/// on `axis` come first. Returns the number of such triangles.
///
/// Single forward pass with swaps, no extra storage.
pub fn partition(triangles: &mut [Triangle], axis: Axis, position: f32) -> usize {
    let mut mid = 0;
    for i in 0..triangles.len() {
        if triangles[i].centroid()[axis] < position {
            triangles.swap(i, mid);
            mid += 1;
        }
    }
    mid
}
