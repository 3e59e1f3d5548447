//! # tribvh
//!
//! Surface-area-heuristic BVH builder for GPU triangle ray tracing.
//!
//! Triangles are registered model by model into one shared triangle buffer
//! and one flat node array. The result is consumed by a device kernel that
//! walks the tree with an explicit stack, so everything is addressed by
//! index and laid out for bulk transfer.
//!
//! ## Modules
//!
//! - [`util`] - Errors and math re-exports
//! - [`bvh`] - Builder, tree, split policies, CPU traversal, validation
//! - [`config`] - Build parameters, loadable from JSON
//! - [`material`] - Surface material passed through as a model handle
//! - [`gpu`] - `Pod` records for device upload
//!
//! ## Example
//!
//! ```
//! use tribvh::prelude::*;
//!
//! let tris = vec![
//!     Triangle::new(Vec3::ZERO, Vec3::X, Vec3::Y),
//!     Triangle::new(Vec3::new(0.0, 0.0, 9.0), Vec3::new(1.0, 0.0, 9.0), Vec3::new(0.0, 1.0, 9.0)),
//! ];
//!
//! let mut builder = BvhBuilder::new();
//! let model = builder.register_model(&tris, Material::default());
//! assert_eq!(model.node_offset, 0);
//!
//! let bvh = builder.finish();
//! bvh.validate()?;
//! let scene = GpuScene::from_material_bvh(&bvh);
//! assert_eq!(scene.nodes.len(), bvh.nodes().len());
//! # Ok::<(), tribvh::Error>(())
//! ```

pub mod bvh;
pub mod config;
pub mod gpu;
pub mod material;
pub mod util;

// Re-export commonly used types
pub use bvh::{Bvh, BvhBuilder, BvhModel, BvhNode, Triangle};
pub use config::BuildConfig;
pub use util::{Error, Result};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::bvh::{
        BoundingBox, Bvh, BvhBuilder, BvhModel, BvhNode, BvhStats, Hit, Ray, SplitPolicy, Triangle,
    };
    pub use crate::config::BuildConfig;
    pub use crate::gpu::GpuScene;
    pub use crate::material::Material;
    pub use crate::util::{Error, Result, Vec2, Vec3};
}
