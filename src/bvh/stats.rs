//! Tree statistics and structural validation.

use serde::Serialize;

use super::aabb::BoundingBox;
use super::node::{BvhModel, BvhNode};
use super::triangle::Triangle;
use crate::util::{Error, Result};

/// Relative cost of visiting an interior node, in units of one triangle test.
const TRAVERSAL_COST: f32 = 1.0;

/// Shape summary of one model's subtree.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BvhStats {
    pub node_count: usize,
    pub leaf_count: usize,
    pub interior_count: usize,
    /// Deepest leaf, root = 0.
    pub max_depth: u32,
    pub min_leaf_triangles: u32,
    pub max_leaf_triangles: u32,
    pub mean_leaf_triangles: f32,
    pub empty_leaves: usize,
    /// SAH cost of the whole tree relative to the root's surface area.
    pub sah_cost: f32,
    pub root_bounds: BoundingBox,
}

/// Walk a model's subtree and collect [`BvhStats`].
pub fn model_stats<M>(nodes: &[BvhNode], model: &BvhModel<M>) -> BvhStats {
    let root = nodes[model.node_offset as usize];
    let mut stats = BvhStats {
        min_leaf_triangles: u32::MAX,
        root_bounds: root.bounds,
        ..Default::default()
    };
    let mut leaf_triangles = 0u64;
    let mut weighted = 0.0f32;

    let mut stack = vec![(model.node_offset as usize, 0u32)];
    while let Some((idx, depth)) = stack.pop() {
        let node = &nodes[idx];
        stats.node_count += 1;
        match node.children() {
            Some((left, right)) => {
                stats.interior_count += 1;
                weighted += TRAVERSAL_COST * node.bounds.surface_area();
                stack.push((right, depth + 1));
                stack.push((left, depth + 1));
            }
            None => {
                stats.leaf_count += 1;
                stats.max_depth = stats.max_depth.max(depth);
                stats.min_leaf_triangles = stats.min_leaf_triangles.min(node.triangle_count);
                stats.max_leaf_triangles = stats.max_leaf_triangles.max(node.triangle_count);
                if node.triangle_count == 0 {
                    stats.empty_leaves += 1;
                }
                leaf_triangles += node.triangle_count as u64;
                weighted += node.triangle_count as f32 * node.bounds.surface_area();
            }
        }
    }

    stats.mean_leaf_triangles = leaf_triangles as f32 / stats.leaf_count as f32;
    let root_area = root.bounds.surface_area();
    stats.sah_cost = if root_area > 0.0 { weighted / root_area } else { 0.0 };
    stats
}

/// Slack allowed when checking vertices against bounds.
fn bounds_tolerance(b: &BoundingBox) -> f32 {
    let scale = b.min.abs().max(b.max.abs()).max_element();
    1e-5 * (1.0 + scale)
}

/// Check one model's subtree:
/// - the root covers exactly the model's triangle range
/// - child ranges split the parent's range contiguously
/// - children are stored after their parent
/// - every node's bounds contain all vertices in its range
/// - no leaf is deeper than `max_depth`
pub fn validate_model<M>(
    nodes: &[BvhNode],
    triangles: &[Triangle],
    model: &BvhModel<M>,
    max_depth: u32,
) -> Result<()> {
    let root_idx = model.node_offset as usize;
    let root = nodes
        .get(root_idx)
        .ok_or_else(|| Error::tree(root_idx, "model root out of bounds"))?;
    let model_range = model.triangle_range();
    if root.triangle_range() != model_range {
        return Err(Error::tree(
            root_idx,
            format!("root covers {:?}, model owns {:?}", root.triangle_range(), model_range),
        ));
    }

    let mut stack = vec![(root_idx, 0u32)];
    while let Some((idx, depth)) = stack.pop() {
        let node = &nodes[idx];
        let range = node.triangle_range();
        if range.start < model_range.start || range.end > model_range.end || range.end > triangles.len() {
            return Err(Error::tree(idx, format!("range {range:?} outside model {model_range:?}")));
        }

        if node.triangle_count > 0 {
            if node.bounds.is_empty() {
                return Err(Error::tree(idx, "non-empty node with empty bounds"));
            }
            let eps = bounds_tolerance(&node.bounds);
            for (i, tri) in triangles[range.clone()].iter().enumerate() {
                if tri.positions.iter().any(|&p| !node.bounds.contains_point(p, eps)) {
                    return Err(Error::tree(
                        idx,
                        format!("triangle {} escapes {:?}", range.start + i, node.bounds),
                    ));
                }
            }
        }

        let Some((left, right)) = node.children() else {
            if depth > max_depth {
                return Err(Error::tree(idx, format!("leaf at depth {depth} > {max_depth}")));
            }
            continue;
        };

        if left <= idx || right >= nodes.len() {
            return Err(Error::tree(idx, format!("bad child index {left}")));
        }
        let (l, r) = (&nodes[left], &nodes[right]);
        if l.triangle_start != node.triangle_start {
            return Err(Error::tree(idx, "left child does not start at parent start"));
        }
        if r.triangle_start != l.triangle_start + l.triangle_count {
            return Err(Error::tree(idx, "child ranges are not contiguous"));
        }
        if l.triangle_count + r.triangle_count != node.triangle_count {
            return Err(Error::tree(
                idx,
                format!(
                    "children hold {} + {}, parent {}",
                    l.triangle_count, r.triangle_count, node.triangle_count
                ),
            ));
        }
        stack.push((right, depth + 1));
        stack.push((left, depth + 1));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::Vec3;

    fn tri_at(x: f32) -> Triangle {
        Triangle::new(
            Vec3::new(x, 0.0, 0.0),
            Vec3::new(x + 1.0, 0.0, 0.0),
            Vec3::new(x, 1.0, 0.0),
        )
    }

    /// Root with two single-triangle leaves, built by hand.
    fn two_leaf_tree() -> (Vec<BvhNode>, Vec<Triangle>, BvhModel<()>) {
        let tris = vec![tri_at(0.0), tri_at(10.0)];
        let nodes = vec![
            BvhNode {
                bounds: BoundingBox::from_triangles(&tris),
                triangle_start: 0,
                triangle_count: 2,
                child_index: 1,
            },
            BvhNode::leaf(tris[0].bounds(), 0, 1),
            BvhNode::leaf(tris[1].bounds(), 1, 1),
        ];
        let model = BvhModel {
            node_offset: 0,
            triangle_offset: 0,
            triangle_count: 2,
            material: (),
        };
        (nodes, tris, model)
    }

    #[test]
    fn test_stats_two_leaves() {
        let (nodes, _, model) = two_leaf_tree();
        let s = model_stats(&nodes, &model);
        assert_eq!(s.node_count, 3);
        assert_eq!(s.leaf_count, 2);
        assert_eq!(s.interior_count, 1);
        assert_eq!(s.max_depth, 1);
        assert_eq!(s.min_leaf_triangles, 1);
        assert_eq!(s.max_leaf_triangles, 1);
        assert_eq!(s.mean_leaf_triangles, 1.0);
        assert_eq!(s.empty_leaves, 0);
        assert!(s.sah_cost > 1.0);
    }

    #[test]
    fn test_valid_tree_passes() {
        let (nodes, tris, model) = two_leaf_tree();
        validate_model(&nodes, &tris, &model, 16).unwrap();
    }

    #[test]
    fn test_detects_bad_counts() {
        let (mut nodes, tris, model) = two_leaf_tree();
        nodes[2].triangle_count = 0;
        let err = validate_model(&nodes, &tris, &model, 16).unwrap_err();
        assert!(matches!(err, Error::InvalidTree { node: 0, .. }));
    }

    #[test]
    fn test_detects_gap_between_children() {
        let (mut nodes, tris, model) = two_leaf_tree();
        nodes[1].triangle_count = 0;
        nodes[2].triangle_start = 1;
        assert!(validate_model(&nodes, &tris, &model, 16).is_err());
    }

    #[test]
    fn test_detects_escaping_vertex() {
        let (mut nodes, tris, model) = two_leaf_tree();
        nodes[2].bounds = tris[0].bounds();
        let err = validate_model(&nodes, &tris, &model, 16).unwrap_err();
        assert!(matches!(err, Error::InvalidTree { node: 2, .. }));
    }

    #[test]
    fn test_detects_depth_overflow() {
        let (nodes, tris, model) = two_leaf_tree();
        assert!(validate_model(&nodes, &tris, &model, 0).is_err());
    }

    #[test]
    fn test_detects_root_range_mismatch() {
        let (nodes, tris, mut model) = two_leaf_tree();
        model.triangle_count = 1;
        assert!(validate_model(&nodes, &tris, &model, 16).is_err());
    }
}
