//! Triangle primitive stored in the builder's triangle buffer.

use serde::{Deserialize, Serialize};

use super::aabb::BoundingBox;
use crate::util::{Vec2, Vec3};

/// A triangle as the renderer consumes it.
///
/// Only `positions` matter to the hierarchy; normals and UVs ride along so
/// the shading kernel can read them from the same reordered buffer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Triangle {
    pub positions: [Vec3; 3],
    pub normals: [Vec3; 3],
    pub uvs: [Vec2; 3],
}

impl Triangle {
    /// Triangle with flat face normals and zero UVs.
    pub fn new(p1: Vec3, p2: Vec3, p3: Vec3) -> Self {
        let n = (p2 - p1).cross(p3 - p1).normalize_or_zero();
        Self {
            positions: [p1, p2, p3],
            normals: [n; 3],
            uvs: [Vec2::ZERO; 3],
        }
    }

    /// Attach per-vertex normals.
    pub fn with_normals(mut self, normals: [Vec3; 3]) -> Self {
        self.normals = normals;
        self
    }

    /// Attach per-vertex texture coordinates.
    pub fn with_uvs(mut self, uvs: [Vec2; 3]) -> Self {
        self.uvs = uvs;
        self
    }

    /// Mean of the three vertices.
    #[inline]
    pub fn centroid(&self) -> Vec3 {
        let [a, b, c] = self.positions;
        (a + b + c) / 3.0
    }

    /// Bounding box of the three vertices.
    pub fn bounds(&self) -> BoundingBox {
        let mut b = BoundingBox::EMPTY;
        b.grow_triangle(self);
        b
    }

    /// Unit face normal from the winding, zero for degenerate triangles.
    pub fn face_normal(&self) -> Vec3 {
        let [a, b, c] = self.positions;
        (b - a).cross(c - a).normalize_or_zero()
    }
}
