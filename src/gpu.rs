//! Flat, device-ready copies of a finished [`Bvh`].
//!
//! All records are `#[repr(C)]` and padded to 16-byte multiples so they match
//! std430 storage buffer structs field for field:
//!
//! ```text
//! struct BvhNode  { vec3 min; uint start; vec3 max; uint count; uint child; uint pad[3]; };
//! struct Triangle { vec3 p1; vec3 p2; vec3 p3; vec3 n1; vec3 n2; vec3 n3; vec2 uv[4]; };
//! struct Model    { uint node_offset; uint triangle_offset; uint triangle_count; uint material; };
//! ```
//!
//! A node is a leaf iff `child == 0`.

use bytemuck::{Pod, Zeroable};

use crate::bvh::{Bvh, BvhNode, Triangle};
use crate::material::Material;

/// GPU BVH node (48 bytes).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct GpuBvhNode {
    pub aabb_min: [f32; 3],
    pub triangle_start: u32,
    pub aabb_max: [f32; 3],
    pub triangle_count: u32,
    pub child_index: u32,
    pub _pad: [u32; 3],
}

impl From<&BvhNode> for GpuBvhNode {
    fn from(node: &BvhNode) -> Self {
        Self {
            aabb_min: node.bounds.min.to_array(),
            triangle_start: node.triangle_start,
            aabb_max: node.bounds.max.to_array(),
            triangle_count: node.triangle_count,
            child_index: node.child_index,
            _pad: [0; 3],
        }
    }
}

/// GPU triangle (128 bytes). The fourth UV slot is padding.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct GpuTriangle {
    pub p1: [f32; 3],
    pub _pad0: u32,
    pub p2: [f32; 3],
    pub _pad1: u32,
    pub p3: [f32; 3],
    pub _pad2: u32,
    pub n1: [f32; 3],
    pub _pad3: u32,
    pub n2: [f32; 3],
    pub _pad4: u32,
    pub n3: [f32; 3],
    pub _pad5: u32,
    pub uvs: [[f32; 2]; 4],
}

impl From<&Triangle> for GpuTriangle {
    fn from(tri: &Triangle) -> Self {
        let [p1, p2, p3] = tri.positions.map(|p| p.to_array());
        let [n1, n2, n3] = tri.normals.map(|n| n.to_array());
        let [uv1, uv2, uv3] = tri.uvs.map(|uv| uv.to_array());
        Self {
            p1,
            _pad0: 0,
            p2,
            _pad1: 0,
            p3,
            _pad2: 0,
            n1,
            _pad3: 0,
            n2,
            _pad4: 0,
            n3,
            _pad5: 0,
            uvs: [uv1, uv2, uv3, [0.0; 2]],
        }
    }
}

/// GPU model descriptor (16 bytes). `material_index` points into the
/// materials array, one entry per model.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct GpuModel {
    pub node_offset: u32,
    pub triangle_offset: u32,
    pub triangle_count: u32,
    pub material_index: u32,
}

/// GPU material (64 bytes).
///
/// - `emission`: rgb = emission colour, a = strength
/// - `diffuse_smoothness`: rgb = diffuse colour, a = smoothness
/// - `specular`: rgb = specular colour, a = specular chance
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct GpuMaterial {
    pub emission: [f32; 4],
    pub diffuse_smoothness: [f32; 4],
    pub specular: [f32; 4],
    pub opacity: f32,
    pub texture_slot: u32,
    pub _pad: [u32; 2],
}

/// Complete scene data ready for upload.
#[derive(Debug, Clone, PartialEq)]
pub struct GpuScene {
    pub nodes: Vec<GpuBvhNode>,
    /// Triangles in partitioned (leaf) order.
    pub triangles: Vec<GpuTriangle>,
    pub models: Vec<GpuModel>,
    pub materials: Vec<GpuMaterial>,
}

impl GpuScene {
    /// Flatten a finished hierarchy, converting each model's handle with
    /// `material`.
    ///
    /// Indices are copied verbatim, so calling this twice on the same
    /// [`Bvh`] gives identical buffers.
    #[tracing::instrument(skip_all, fields(nodes = bvh.nodes().len(), models = bvh.models().len()))]
    pub fn from_bvh<M>(bvh: &Bvh<M>, material: impl Fn(&M) -> GpuMaterial) -> Self {
        let nodes = bvh.nodes().iter().map(GpuBvhNode::from).collect();
        let triangles = bvh.triangles().iter().map(GpuTriangle::from).collect();
        let models = bvh
            .models()
            .iter()
            .enumerate()
            .map(|(i, m)| GpuModel {
                node_offset: m.node_offset,
                triangle_offset: m.triangle_offset,
                triangle_count: m.triangle_count,
                material_index: i as u32,
            })
            .collect();
        let materials = bvh.models().iter().map(|m| material(&m.material)).collect();

        Self {
            nodes,
            triangles,
            models,
            materials,
        }
    }

    /// Flatten a hierarchy whose handles are [`Material`]s.
    pub fn from_material_bvh(bvh: &Bvh<Material>) -> Self {
        Self::from_bvh(bvh, Material::to_gpu)
    }

    pub fn nodes_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.nodes)
    }

    pub fn triangles_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.triangles)
    }

    pub fn models_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.models)
    }

    pub fn materials_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.materials)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bvh::BvhBuilder;
    use crate::util::Vec3;
    use std::mem::size_of;

    fn make_tri(cx: f32) -> Triangle {
        Triangle::new(
            Vec3::new(cx - 0.5, -0.5, 0.0),
            Vec3::new(cx + 0.5, -0.5, 0.0),
            Vec3::new(cx, 0.5, 0.0),
        )
    }

    #[test]
    fn test_record_sizes() {
        assert_eq!(size_of::<GpuBvhNode>(), 48);
        assert_eq!(size_of::<GpuTriangle>(), 128);
        assert_eq!(size_of::<GpuModel>(), 16);
        assert_eq!(size_of::<GpuMaterial>(), 64);
    }

    #[test]
    fn test_node_field_order() {
        let node = BvhNode {
            bounds: crate::bvh::BoundingBox::new(Vec3::new(1.0, 2.0, 3.0), Vec3::new(4.0, 5.0, 6.0)),
            triangle_start: 7,
            triangle_count: 8,
            child_index: 9,
        };
        let gpu = GpuBvhNode::from(&node);
        let words: &[u32] = bytemuck::cast_slice(std::slice::from_ref(&gpu));
        assert_eq!(f32::from_bits(words[0]), 1.0);
        assert_eq!(words[3], 7);
        assert_eq!(f32::from_bits(words[6]), 6.0);
        assert_eq!(words[7], 8);
        assert_eq!(words[8], 9);
    }

    #[test]
    fn test_flatten_is_idempotent() {
        let mut builder = BvhBuilder::new();
        let tris: Vec<Triangle> = (0..50).map(|i| make_tri(i as f32 * 2.0)).collect();
        builder.register_model(&tris, Material::default());
        builder.register_model(&tris[..7], Material::emissive(Vec3::ONE, 5.0));
        let bvh = builder.finish();

        let a = GpuScene::from_material_bvh(&bvh);
        let b = GpuScene::from_material_bvh(&bvh);
        assert_eq!(a, b);
        assert_eq!(a.nodes_bytes(), b.nodes_bytes());
        assert_eq!(a.nodes.len(), bvh.nodes().len());
        assert_eq!(a.triangles_bytes().len(), bvh.triangles().len() * 128);

        for (gpu, node) in a.nodes.iter().zip(bvh.nodes()) {
            assert_eq!(gpu.child_index, node.child_index);
            assert_eq!(gpu.triangle_start, node.triangle_start);
            assert_eq!(gpu.triangle_count, node.triangle_count);
        }
    }

    #[test]
    fn test_models_and_materials() {
        let mut builder = BvhBuilder::new();
        builder.register_model(&[make_tri(0.0)], 3u32);
        builder.register_model(&[make_tri(5.0), make_tri(9.0)], 11u32);
        let bvh = builder.finish();

        let scene = GpuScene::from_bvh(&bvh, |&id| GpuMaterial {
            texture_slot: id,
            ..Zeroable::zeroed()
        });
        assert_eq!(
            scene.models,
            vec![
                GpuModel { node_offset: 0, triangle_offset: 0, triangle_count: 1, material_index: 0 },
                GpuModel { node_offset: 1, triangle_offset: 1, triangle_count: 2, material_index: 1 },
            ]
        );
        assert_eq!(scene.materials[1].texture_slot, 11);
        assert_eq!(scene.models_bytes().len(), 32);
        assert_eq!(scene.materials_bytes().len(), 128);
    }
}
