//! Node and model records of the hierarchy.
//!
//! Nodes live in one flat array and refer to each other by index:
//! - Interior node: `child_index` = index of the left child, the right child
//!   is always `child_index + 1`
//! - Leaf node: `child_index == 0`
//!
//! Index 0 is always the first registered model's root, so it can never be
//! somebody's child and `0` is free to mean "no children".

use serde::{Deserialize, Serialize};

use super::aabb::BoundingBox;

/// One node of the binary tree.
///
/// `triangle_start..triangle_start + triangle_count` is the contiguous run of
/// the global triangle buffer under this node. For interior nodes this is the
/// whole subtree's run, not a payload of its own.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BvhNode {
    pub bounds: BoundingBox,
    pub triangle_start: u32,
    pub triangle_count: u32,
    pub child_index: u32,
}

impl BvhNode {
    /// Leaf covering `[start, start + count)` with the given bounds.
    pub fn leaf(bounds: BoundingBox, start: u32, count: u32) -> Self {
        Self {
            bounds,
            triangle_start: start,
            triangle_count: count,
            child_index: 0,
        }
    }

    /// True when the node has no children.
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.child_index == 0
    }

    /// Triangle index range of this node.
    #[inline]
    pub fn triangle_range(&self) -> std::ops::Range<usize> {
        let start = self.triangle_start as usize;
        start..start + self.triangle_count as usize
    }

    /// Left and right child indices, `None` for leaves.
    #[inline]
    pub fn children(&self) -> Option<(usize, usize)> {
        if self.is_leaf() {
            None
        } else {
            let left = self.child_index as usize;
            Some((left, left + 1))
        }
    }
}

/// Placement of one registered model inside the shared buffers.
///
/// `material` is whatever handle the caller passed in; the builder never
/// looks at it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BvhModel<M> {
    /// Index of the model's root node.
    pub node_offset: u32,
    /// Index of the model's first triangle.
    pub triangle_offset: u32,
    /// Number of triangles registered with the model.
    pub triangle_count: u32,
    pub material: M,
}

impl<M> BvhModel<M> {
    /// Triangle index range owned by this model.
    #[inline]
    pub fn triangle_range(&self) -> std::ops::Range<usize> {
        let start = self.triangle_offset as usize;
        start..start + self.triangle_count as usize
    }
}
