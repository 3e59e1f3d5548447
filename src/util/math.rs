//! Math type re-exports.
//!
//! Everything geometric in the crate is single precision `glam`.

pub use glam::{Vec2, Vec3};

/// Axis index into a `Vec3` (0 = x, 1 = y, 2 = z).
pub type Axis = usize;

/// Component names, for logs and diagnostics.
pub const AXIS_NAMES: [&str; 3] = ["x", "y", "z"];
