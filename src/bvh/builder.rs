//! Incremental SAH BVH builder.
//!
//! Models are registered one after another into shared triangle and node
//! buffers. Each registration appends its triangles, pushes a root node and
//! splits it top-down with an explicit work stack. Triangles are reordered in
//! place inside the model's own range; nothing outside that range moves.

use super::aabb::BoundingBox;
use super::node::{BvhModel, BvhNode};
use super::split::partition;
use super::stats::{self, BvhStats};
use super::tree::Bvh;
use super::triangle::Triangle;
use crate::config::BuildConfig;
use crate::util::{Error, Result, AXIS_NAMES};

/// Pending split of one node.
struct Task {
    node_idx: usize,
    depth: u32,
}

/// Owns the triangle and node buffers while models are being registered.
///
/// `M` is the caller's material handle, stored in each [`BvhModel`] untouched.
#[derive(Debug, Clone)]
pub struct BvhBuilder<M> {
    config: BuildConfig,
    triangles: Vec<Triangle>,
    nodes: Vec<BvhNode>,
    models: Vec<BvhModel<M>>,
}

impl<M> Default for BvhBuilder<M> {
    fn default() -> Self {
        Self::with_config(BuildConfig::default())
    }
}

impl<M> BvhBuilder<M> {
    /// Builder with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder with a custom configuration.
    pub fn with_config(config: BuildConfig) -> Self {
        Self {
            config,
            triangles: Vec::new(),
            nodes: Vec::new(),
            models: Vec::new(),
        }
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Triangle buffer in its current (partitioned) order.
    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    /// Node buffer. Densely indexed at all times.
    pub fn nodes(&self) -> &[BvhNode] {
        &self.nodes
    }

    /// Models registered so far, in registration order.
    pub fn models(&self) -> &[BvhModel<M>] {
        &self.models
    }

    /// Register a model and build its subtree.
    ///
    /// The model's triangles land at the end of the triangle buffer and its
    /// root at the end of the node buffer; the returned descriptor records
    /// both offsets. An empty slice produces a single empty leaf.
    #[tracing::instrument(skip_all, fields(tri_count = triangles.len()))]
    pub fn register_model(&mut self, triangles: &[Triangle], material: M) -> BvhModel<M>
    where
        M: Clone,
    {
        let triangle_offset = to_index(self.triangles.len());
        let node_offset = to_index(self.nodes.len());
        let triangle_count = to_index(triangles.len());

        self.triangles.extend_from_slice(triangles);
        let bounds = BoundingBox::from_triangles(triangles);
        self.nodes
            .push(BvhNode::leaf(bounds, triangle_offset, triangle_count));

        self.split(node_offset as usize);

        let model = BvhModel {
            node_offset,
            triangle_offset,
            triangle_count,
            material,
        };
        tracing::debug!(
            model = self.models.len(),
            node_offset,
            triangle_offset,
            nodes = self.nodes.len() - node_offset as usize,
            "registered model"
        );
        self.models.push(model.clone());
        model
    }

    /// Split `root` and its descendants until every leaf hits a stop rule.
    fn split(&mut self, root: usize) {
        let max_depth = self.config.max_depth;
        let leaf_threshold = self.config.leaf_threshold;
        let policy = self.config.policy;

        // Left child is pushed last so it is processed first (depth-first)
        let mut stack = vec![Task {
            node_idx: root,
            depth: 0,
        }];

        while let Some(task) = stack.pop() {
            let node = self.nodes[task.node_idx];
            if task.depth >= max_depth || node.triangle_count <= leaf_threshold {
                continue;
            }

            let range = node.triangle_range();
            let Some(plane) = policy.choose(&self.triangles[range.clone()], &node.bounds) else {
                tracing::trace!(node = task.node_idx, count = node.triangle_count, "no profitable split");
                continue;
            };

            let left_count = partition(&mut self.triangles[range.clone()], plane.axis, plane.position);
            if left_count == 0 || left_count == range.len() {
                tracing::trace!(
                    node = task.node_idx,
                    axis = AXIS_NAMES[plane.axis],
                    position = plane.position,
                    cost = ?plane.cost,
                    "degenerate partition, keeping leaf"
                );
                continue;
            }

            let mid = range.start + left_count;
            let left_bounds = BoundingBox::from_triangles(&self.triangles[range.start..mid]);
            let right_bounds = BoundingBox::from_triangles(&self.triangles[mid..range.end]);

            let left_idx = self.nodes.len();
            self.nodes.push(BvhNode::leaf(
                left_bounds,
                to_index(range.start),
                to_index(left_count),
            ));
            self.nodes.push(BvhNode::leaf(
                right_bounds,
                to_index(mid),
                to_index(range.end - mid),
            ));
            self.nodes[task.node_idx].child_index = to_index(left_idx);
            tracing::trace!(
                node = task.node_idx,
                axis = AXIS_NAMES[plane.axis],
                position = plane.position,
                cost = ?plane.cost,
                left = left_count,
                right = range.end - mid,
                "split"
            );

            stack.push(Task {
                node_idx: left_idx + 1,
                depth: task.depth + 1,
            });
            stack.push(Task {
                node_idx: left_idx,
                depth: task.depth + 1,
            });
        }
    }

    /// Check every registered model against the hierarchy invariants.
    pub fn validate(&self) -> Result<()> {
        for model in &self.models {
            stats::validate_model(&self.nodes, &self.triangles, model, self.config.max_depth)?;
        }
        Ok(())
    }

    /// Statistics for one registered model.
    pub fn stats(&self, model_index: usize) -> Result<BvhStats> {
        let model = self.models.get(model_index).ok_or(Error::ModelOutOfBounds {
            index: model_index,
            count: self.models.len(),
        })?;
        Ok(stats::model_stats(&self.nodes, model))
    }

    /// Freeze the buffers into a read-only [`Bvh`].
    ///
    /// Node indices, triangle order and model offsets are carried over
    /// unchanged; only the storage becomes fixed-size.
    pub fn finish(self) -> Bvh<M> {
        tracing::debug!(
            nodes = self.nodes.len(),
            triangles = self.triangles.len(),
            models = self.models.len(),
            "finished BVH"
        );
        Bvh::from_parts(
            self.config,
            self.triangles.into_boxed_slice(),
            self.nodes.into_boxed_slice(),
            self.models.into_boxed_slice(),
        )
    }
}

/// Buffer positions are stored as `u32` for the device layout.
///
/// # Panics
///
/// Panics if `n` does not fit; running out of index space is fatal.
#[inline]
fn to_index(n: usize) -> u32 {
    u32::try_from(n).unwrap_or_else(|_| panic!("buffer index {n} exceeds u32 range"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bvh::SplitPolicy;
    use crate::util::Vec3;

    fn make_tri(cx: f32, cy: f32, cz: f32) -> Triangle {
        Triangle::new(
            Vec3::new(cx - 0.5, cy - 0.5, cz),
            Vec3::new(cx + 0.5, cy - 0.5, cz),
            Vec3::new(cx, cy + 0.5, cz),
        )
    }

    #[test]
    fn test_empty_model() {
        let mut builder = BvhBuilder::new();
        let model = builder.register_model(&[], 7u32);
        assert_eq!(model.node_offset, 0);
        assert_eq!(model.triangle_offset, 0);
        assert_eq!(model.material, 7);
        assert_eq!(builder.nodes().len(), 1);
        let root = builder.nodes()[0];
        assert!(root.is_leaf());
        assert_eq!(root.triangle_count, 0);
        assert!(root.bounds.is_empty());
        assert_eq!(root.bounds, BoundingBox::EMPTY);
    }

    #[test]
    fn test_single_triangle() {
        let mut builder = BvhBuilder::new();
        let tri = make_tri(1.0, 2.0, 3.0);
        builder.register_model(&[tri], ());
        assert_eq!(builder.nodes().len(), 1);
        let root = builder.nodes()[0];
        assert!(root.is_leaf());
        assert_eq!(root.triangle_count, 1);
        assert_eq!(root.bounds.min, Vec3::new(0.5, 1.5, 3.0));
        assert_eq!(root.bounds.max, Vec3::new(1.5, 2.5, 3.0));
    }

    #[test]
    fn test_two_separated_triangles() {
        let mut builder = BvhBuilder::new();
        builder.register_model(&[make_tri(0.0, 0.0, 0.0), make_tri(0.0, 100.0, 0.0)], ());
        let nodes = builder.nodes();
        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes[0].child_index, 1);
        for child in &nodes[1..] {
            assert!(child.is_leaf());
            assert_eq!(child.triangle_count, 1);
        }
        assert!(builder.triangles()[0].centroid().y < builder.triangles()[1].centroid().y);
    }

    #[test]
    fn test_leaf_threshold_blocks_split() {
        let config = BuildConfig {
            leaf_threshold: 2,
            ..Default::default()
        };
        let mut builder = BvhBuilder::with_config(config);
        builder.register_model(&[make_tri(0.0, 0.0, 0.0), make_tri(100.0, 0.0, 0.0)], ());
        assert_eq!(builder.nodes().len(), 1);
        assert_eq!(builder.nodes()[0].triangle_count, 2);
    }

    #[test]
    fn test_coincident_triangles_stay_one_leaf() {
        let mut builder = BvhBuilder::new();
        builder.register_model(&vec![make_tri(3.0, 3.0, 3.0); 32], ());
        assert_eq!(builder.nodes().len(), 1);
        assert_eq!(builder.nodes()[0].triangle_count, 32);
        builder.validate().unwrap();
    }

    #[test]
    fn test_midpoint_degenerate_partition_keeps_leaf() {
        // Centroids sit on the box centre, so every triangle falls right.
        let config = BuildConfig {
            policy: SplitPolicy::Midpoint,
            ..Default::default()
        };
        let mut builder = BvhBuilder::with_config(config);
        builder.register_model(&vec![make_tri(3.0, 3.0, 3.0); 32], ());
        assert_eq!(builder.nodes().len(), 1);
        let root = builder.nodes()[0];
        assert!(root.is_leaf());
        assert_eq!(root.child_index, 0);
        assert_eq!(root.triangle_count, 32);
        builder.validate().unwrap();
    }

    #[test]
    fn test_midpoint_policy_builds_valid_tree() {
        let config = BuildConfig {
            policy: SplitPolicy::Midpoint,
            ..Default::default()
        };
        let mut builder = BvhBuilder::with_config(config);
        let tris: Vec<Triangle> = (0..64).map(|i| make_tri(i as f32 * 2.0, 0.0, 0.0)).collect();
        builder.register_model(&tris, ());
        assert!(builder.nodes().len() > 1);
        builder.validate().unwrap();
        let stats = builder.stats(0).unwrap();
        assert_eq!(stats.leaf_count, 64);
    }

    #[test]
    fn test_depth_cap() {
        let config = BuildConfig {
            max_depth: 2,
            ..Default::default()
        };
        let mut builder = BvhBuilder::with_config(config);
        let tris: Vec<Triangle> = (0..100).map(|i| make_tri(i as f32 * 2.0, 0.0, 0.0)).collect();
        builder.register_model(&tris, ());
        let stats = builder.stats(0).unwrap();
        assert!(stats.max_depth <= 2);
        assert!(stats.leaf_count <= 4);
        builder.validate().unwrap();
    }

    #[test]
    fn test_second_model_offsets() {
        let mut builder = BvhBuilder::new();
        let a: Vec<Triangle> = (0..10).map(|i| make_tri(i as f32 * 3.0, 0.0, 0.0)).collect();
        let b: Vec<Triangle> = (0..5).map(|i| make_tri(0.0, i as f32 * 3.0, 0.0)).collect();
        builder.register_model(&a, "a");
        let tri_len = builder.triangles().len();
        let node_len = builder.nodes().len();
        let model_b = builder.register_model(&b, "b");
        assert_eq!(model_b.triangle_offset as usize, tri_len);
        assert_eq!(model_b.node_offset as usize, node_len);
        assert_eq!(builder.models().len(), 2);
        builder.validate().unwrap();
    }

    #[test]
    fn test_stats_unknown_model() {
        let builder: BvhBuilder<()> = BvhBuilder::new();
        assert!(matches!(
            builder.stats(0),
            Err(Error::ModelOutOfBounds { index: 0, count: 0 })
        ));
    }

    #[test]
    fn test_to_index_in_range() {
        assert_eq!(to_index(0), 0);
        assert_eq!(to_index(u32::MAX as usize), u32::MAX);
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    #[should_panic(expected = "exceeds u32 range")]
    fn test_to_index_overflow_panics() {
        to_index(u32::MAX as usize + 1);
    }
}
