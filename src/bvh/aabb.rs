//! Axis-aligned bounding box.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::triangle::Triangle;
use crate::util::{Axis, Vec3};

/// Axis-aligned bounding box.
///
/// The default box is inverted (`min = +inf`, `max = -inf`), which is the
/// identity for [`BoundingBox::grow`]. Once a single point has been added,
/// `min <= max` holds componentwise.
#[derive(Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Vec3,
    pub max: Vec3,
}

impl BoundingBox {
    /// Empty bounding box (inverted, will expand on first point).
    pub const EMPTY: Self = Self {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };

    /// Create a new bounding box from min and max points.
    #[inline]
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Bounding box of a run of triangles.
    pub fn from_triangles<'a>(triangles: impl IntoIterator<Item = &'a Triangle>) -> Self {
        let mut b = Self::EMPTY;
        for tri in triangles {
            b.grow_triangle(tri);
        }
        b
    }

    /// True until at least one point has been added.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Grow to include a point.
    #[inline]
    pub fn grow_point(&mut self, p: Vec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    /// Grow to include all three vertices of a triangle.
    #[inline]
    pub fn grow_triangle(&mut self, tri: &Triangle) {
        for p in tri.positions {
            self.grow_point(p);
        }
    }

    /// Grow to include another box.
    #[inline]
    pub fn grow(&mut self, other: &BoundingBox) {
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    /// Centre of the box.
    #[inline]
    pub fn centre(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Per-axis size (`max - min`).
    #[inline]
    pub fn extent(&self) -> Vec3 {
        self.max - self.min
    }

    /// Surface area (for SAH cost).
    ///
    /// Empty boxes report zero rather than the NaN/inf the inverted
    /// extents would produce.
    #[inline]
    pub fn surface_area(&self) -> f32 {
        if self.is_empty() {
            return 0.0;
        }
        let d = self.extent();
        2.0 * (d.x * d.y + d.x * d.z + d.y * d.z)
    }

    /// Volume, zero for empty boxes.
    #[inline]
    pub fn volume(&self) -> f32 {
        if self.is_empty() {
            return 0.0;
        }
        let d = self.extent();
        d.x * d.y * d.z
    }

    /// Longest axis (0=x, 1=y, 2=z). Ties resolve to x, then y.
    #[inline]
    pub fn longest_axis(&self) -> Axis {
        let d = self.extent();
        if d.x >= d.y && d.x >= d.z {
            0
        } else if d.y >= d.z {
            1
        } else {
            2
        }
    }

    /// Whether `p` lies inside the box, allowing `eps` of slack on every side.
    #[inline]
    pub fn contains_point(&self, p: Vec3, eps: f32) -> bool {
        let e = Vec3::splat(eps);
        p.cmpge(self.min - e).all() && p.cmple(self.max + e).all()
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl fmt::Debug for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BoundingBox({:?} - {:?})", self.min, self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_empty() {
        let b = BoundingBox::default();
        assert!(b.is_empty());
        assert_eq!(b.min, Vec3::splat(f32::INFINITY));
        assert_eq!(b.max, Vec3::splat(f32::NEG_INFINITY));
        assert_eq!(b.surface_area(), 0.0);
        assert_eq!(b.volume(), 0.0);
    }

    #[test]
    fn test_grow_point() {
        let mut b = BoundingBox::EMPTY;
        b.grow_point(Vec3::new(1.0, 2.0, 3.0));
        assert!(!b.is_empty());
        assert_eq!(b.min, b.max);
        b.grow_point(Vec3::new(-1.0, 5.0, 0.0));
        assert_eq!(b.min, Vec3::new(-1.0, 2.0, 0.0));
        assert_eq!(b.max, Vec3::new(1.0, 5.0, 3.0));
    }

    #[test]
    fn test_grow_empty_is_identity() {
        let mut b = BoundingBox::new(Vec3::ZERO, Vec3::ONE);
        b.grow(&BoundingBox::EMPTY);
        assert_eq!(b, BoundingBox::new(Vec3::ZERO, Vec3::ONE));
    }

    #[test]
    fn test_grow_triangle() {
        let tri = Triangle::new(
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(2.0, 0.0, -1.0),
            Vec3::new(0.0, 3.0, 0.0),
        );
        let mut b = BoundingBox::EMPTY;
        b.grow_triangle(&tri);
        assert_eq!(b.min, Vec3::new(0.0, 0.0, -1.0));
        assert_eq!(b.max, Vec3::new(2.0, 3.0, 0.0));
    }

    #[test]
    fn test_surface_area_and_centre() {
        let b = BoundingBox::new(Vec3::ZERO, Vec3::new(1.0, 2.0, 3.0));
        // 2 * (1*2 + 1*3 + 2*3)
        assert_eq!(b.surface_area(), 22.0);
        assert_eq!(b.volume(), 6.0);
        assert_eq!(b.centre(), Vec3::new(0.5, 1.0, 1.5));
    }

    #[test]
    fn test_longest_axis_tie_break() {
        assert_eq!(BoundingBox::new(Vec3::ZERO, Vec3::ONE).longest_axis(), 0);
        assert_eq!(BoundingBox::new(Vec3::ZERO, Vec3::new(1.0, 2.0, 2.0)).longest_axis(), 1);
        assert_eq!(BoundingBox::new(Vec3::ZERO, Vec3::new(1.0, 1.0, 2.0)).longest_axis(), 2);
    }

    #[test]
    fn test_contains_point() {
        let b = BoundingBox::new(Vec3::ZERO, Vec3::ONE);
        assert!(b.contains_point(Vec3::splat(0.5), 0.0));
        assert!(b.contains_point(Vec3::new(1.0 + 1e-7, 0.5, 0.5), 1e-6));
        assert!(!b.contains_point(Vec3::new(1.1, 0.5, 0.5), 1e-6));
        assert!(!BoundingBox::EMPTY.contains_point(Vec3::ZERO, 1e-6));
    }
}
