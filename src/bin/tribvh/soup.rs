//! Triangle sources for the CLI: random soups and raw float files.

use std::path::Path;

use rand::rngs::StdRng;
use rand::Rng;
use tribvh::prelude::{Material, Ray, Triangle, Vec3};
use tribvh::{Error, Result};

/// Half-size of the cube random soups are scattered in.
pub const SOUP_EXTENT: f32 = 10.0;

/// Bytes per triangle in a raw file: 9 little-endian f32.
const RAW_TRIANGLE_BYTES: usize = 9 * 4;

fn random_vec(rng: &mut StdRng, half: f32) -> Vec3 {
    Vec3::new(
        rng.gen_range(-half..half),
        rng.gen_range(-half..half),
        rng.gen_range(-half..half),
    )
}

/// `count` small triangles with centres uniform in the soup cube.
pub fn random_triangles(rng: &mut StdRng, count: usize) -> Vec<Triangle> {
    (0..count)
        .map(|_| {
            let c = random_vec(rng, SOUP_EXTENT);
            Triangle::new(
                c + random_vec(rng, 0.2),
                c + random_vec(rng, 0.2),
                c + random_vec(rng, 0.2),
            )
        })
        .collect()
}

/// Random diffuse material, one per model.
pub fn random_material(rng: &mut StdRng) -> Material {
    Material::diffuse(Vec3::new(rng.gen(), rng.gen(), rng.gen()))
}

/// Rays from a sphere around the soup aimed at random points inside it.
pub fn random_rays(rng: &mut StdRng, count: usize) -> Vec<Ray> {
    (0..count)
        .map(|_| {
            let origin = random_vec(rng, 1.0).normalize_or(Vec3::Z) * SOUP_EXTENT * 3.0;
            let target = random_vec(rng, SOUP_EXTENT);
            Ray::new(origin, (target - origin).normalize_or(Vec3::X))
        })
        .collect()
}

/// Read triangles stored as consecutive `p1 p2 p3` f32 triples.
pub fn read_raw_triangles(path: &Path) -> Result<Vec<Triangle>> {
    let bytes = std::fs::read(path)?;
    if bytes.len() % RAW_TRIANGLE_BYTES != 0 {
        return Err(Error::InvalidInput(format!(
            "{}: {} bytes is not a multiple of {}",
            path.display(),
            bytes.len(),
            RAW_TRIANGLE_BYTES
        )));
    }
    let floats: Vec<f32> = bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect();
    Ok(floats
        .chunks_exact(9)
        .map(|f| {
            Triangle::new(
                Vec3::new(f[0], f[1], f[2]),
                Vec3::new(f[3], f[4], f[5]),
                Vec3::new(f[6], f[7], f[8]),
            )
        })
        .collect())
}
