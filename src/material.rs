//! Surface material carried as a model's handle.
//!
//! The builder never inspects materials; this type exists so tools and the
//! GPU export have a concrete record to pass through.

use serde::{Deserialize, Serialize};

use crate::gpu::GpuMaterial;
use crate::util::Vec3;

/// Sentinel texture slot for "no texture" in [`GpuMaterial`].
pub const NO_TEXTURE: u32 = u32::MAX;

/// Diffuse/specular/emissive surface description.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Material {
    pub emission_color: Vec3,
    pub emission_strength: f32,
    pub diffuse_color: Vec3,
    pub smoothness: f32,
    /// Probability of a specular bounce.
    pub specular_chance: f32,
    pub specular_color: Vec3,
    pub opacity: f32,
    /// Index into the renderer's texture array.
    pub texture_slot: Option<u32>,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            emission_color: Vec3::ZERO,
            emission_strength: 0.0,
            diffuse_color: Vec3::splat(0.8),
            smoothness: 0.0,
            specular_chance: 0.0,
            specular_color: Vec3::ONE,
            opacity: 1.0,
            texture_slot: None,
        }
    }
}

impl Material {
    /// Plain diffuse material.
    pub fn diffuse(color: Vec3) -> Self {
        Self {
            diffuse_color: color,
            ..Default::default()
        }
    }

    /// Light source with the given colour and strength.
    pub fn emissive(color: Vec3, strength: f32) -> Self {
        Self {
            emission_color: color,
            emission_strength: strength,
            diffuse_color: Vec3::ZERO,
            ..Default::default()
        }
    }

    /// Pack for device upload.
    pub fn to_gpu(&self) -> GpuMaterial {
        GpuMaterial {
            emission: self.emission_color.extend(self.emission_strength).to_array(),
            diffuse_smoothness: self.diffuse_color.extend(self.smoothness).to_array(),
            specular: self.specular_color.extend(self.specular_chance).to_array(),
            opacity: self.opacity,
            texture_slot: self.texture_slot.unwrap_or(NO_TEXTURE),
            _pad: [0; 2],
        }
    }
}
