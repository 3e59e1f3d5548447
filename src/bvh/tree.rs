//! Finished, read-only hierarchy.

use super::node::{BvhModel, BvhNode};
use super::stats::{self, BvhStats};
use super::triangle::Triangle;
use crate::config::BuildConfig;
use crate::util::{Error, Result};

/// Contiguous triangle, node and model arrays produced by
/// [`BvhBuilder::finish`](super::BvhBuilder::finish).
///
/// Nothing here is mutable; the arrays can be shared across threads and
/// handed to [`GpuScene`](crate::gpu::GpuScene) for upload.
#[derive(Debug, Clone)]
pub struct Bvh<M> {
    config: BuildConfig,
    triangles: Box<[Triangle]>,
    nodes: Box<[BvhNode]>,
    models: Box<[BvhModel<M>]>,
}

impl<M> Bvh<M> {
    pub(crate) fn from_parts(
        config: BuildConfig,
        triangles: Box<[Triangle]>,
        nodes: Box<[BvhNode]>,
        models: Box<[BvhModel<M>]>,
    ) -> Self {
        Self {
            config,
            triangles,
            nodes,
            models,
        }
    }

    /// Configuration the hierarchy was built with.
    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    pub fn nodes(&self) -> &[BvhNode] {
        &self.nodes
    }

    pub fn models(&self) -> &[BvhModel<M>] {
        &self.models
    }

    /// Model by registration index.
    pub fn model(&self, index: usize) -> Result<&BvhModel<M>> {
        self.models.get(index).ok_or(Error::ModelOutOfBounds {
            index,
            count: self.models.len(),
        })
    }

    /// Root node of a model.
    pub fn root(&self, model_index: usize) -> Result<&BvhNode> {
        let model = self.model(model_index)?;
        Ok(&self.nodes[model.node_offset as usize])
    }

    /// Indices of the leaves under a model's root, depth-first, left to right.
    pub fn leaves(&self, model_index: usize) -> Result<Vec<usize>> {
        let model = self.model(model_index)?;
        let mut leaves = Vec::new();
        let mut stack = vec![model.node_offset as usize];
        while let Some(idx) = stack.pop() {
            match self.nodes[idx].children() {
                Some((left, right)) => {
                    stack.push(right);
                    stack.push(left);
                }
                None => leaves.push(idx),
            }
        }
        Ok(leaves)
    }

    /// Statistics for one model.
    pub fn stats(&self, model_index: usize) -> Result<BvhStats> {
        let model = self.model(model_index)?;
        Ok(stats::model_stats(&self.nodes, model))
    }

    /// Check every model against the hierarchy invariants.
    pub fn validate(&self) -> Result<()> {
        for model in self.models.iter() {
            stats::validate_model(&self.nodes, &self.triangles, model, self.config.max_depth)?;
        }
        Ok(())
    }
}
