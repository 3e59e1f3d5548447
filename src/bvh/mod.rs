//! Bounding volume hierarchy over triangle soups.
//!
//! ## Architecture
//! ```text
//! &[Triangle] -> BvhBuilder::register_model (SAH split, in-place partition)
//!             -> BvhBuilder::finish -> Bvh -> GpuScene (flat Pod buffers)
//! ```
//!
//! Every model shares the builder's triangle and node buffers. Nodes refer to
//! children by index; see [`node`] for the layout rules.

pub mod aabb;
pub mod builder;
pub mod node;
pub mod split;
pub mod stats;
pub mod traverse;
pub mod tree;
pub mod triangle;

pub use aabb::BoundingBox;
pub use builder::BvhBuilder;
pub use node::{BvhModel, BvhNode};
pub use split::{SplitPlane, SplitPolicy};
pub use stats::BvhStats;
pub use traverse::{Hit, Ray};
pub use tree::Bvh;
pub use triangle::Triangle;
