//! Icosphere generation for the shared star proxy mesh.

use std::collections::HashMap;

use glam::Vec3;

/// A unit-radius icosphere.
#[derive(Clone, Debug)]
pub struct IcosphereMesh {
    /// Vertex positions on the unit sphere.
    pub positions: Vec<Vec3>,
    /// Per-vertex normals (equal to positions on a unit sphere).
    pub normals: Vec<Vec3>,
    /// Triangle list indices, counter-clockwise when viewed from outside.
    pub indices: Vec<u32>,
}

impl IcosphereMesh {
    /// Number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Generate an icosphere by repeatedly splitting each face of an icosahedron
/// into four. Level 0 is the bare icosahedron (20 faces).
pub fn generate_icosphere(subdivisions: u32) -> IcosphereMesh {
    let t = (1.0 + 5.0_f32.sqrt()) / 2.0;

    let mut positions: Vec<Vec3> = [
        Vec3::new(-1.0, t, 0.0),
        Vec3::new(1.0, t, 0.0),
        Vec3::new(-1.0, -t, 0.0),
        Vec3::new(1.0, -t, 0.0),
        Vec3::new(0.0, -1.0, t),
        Vec3::new(0.0, 1.0, t),
        Vec3::new(0.0, -1.0, -t),
        Vec3::new(0.0, 1.0, -t),
        Vec3::new(t, 0.0, -1.0),
        Vec3::new(t, 0.0, 1.0),
        Vec3::new(-t, 0.0, -1.0),
        Vec3::new(-t, 0.0, 1.0),
    ]
    .into_iter()
    .map(Vec3::normalize)
    .collect();

    let mut indices: Vec<u32> = vec![
        0, 11, 5, 0, 5, 1, 0, 1, 7, 0, 7, 10, 0, 10, 11, 1, 5, 9, 5, 11, 4, 11, 10, 2, 10, 7, 6, 7,
        1, 8, 3, 9, 4, 3, 4, 2, 3, 2, 6, 3, 6, 8, 3, 8, 9, 4, 9, 5, 2, 4, 11, 6, 2, 10, 8, 6, 7, 9,
        8, 1,
    ];

    for _ in 0..subdivisions {
        indices = subdivide(&mut positions, &indices);
    }

    let normals = positions.clone();
    IcosphereMesh {
        positions,
        normals,
        indices,
    }
}

fn subdivide(positions: &mut Vec<Vec3>, indices: &[u32]) -> Vec<u32> {
    let mut midpoints: HashMap<(u32, u32), u32> = HashMap::new();
    let mut out = Vec::with_capacity(indices.len() * 4);

    let mut midpoint = |a: u32, b: u32, positions: &mut Vec<Vec3>| -> u32 {
        let key = (a.min(b), a.max(b));
        *midpoints.entry(key).or_insert_with(|| {
            let mid = (positions[a as usize] + positions[b as usize]).normalize();
            positions.push(mid);
            (positions.len() - 1) as u32
        })
    };

    for tri in indices.chunks_exact(3) {
        let (a, b, c) = (tri[0], tri[1], tri[2]);
        let ab = midpoint(a, b, positions);
        let bc = midpoint(b, c, positions);
        let ca = midpoint(c, a, positions);

        out.extend_from_slice(&[a, ab, ca]);
        out.extend_from_slice(&[b, bc, ab]);
        out.extend_from_slice(&[c, ca, bc]);
        out.extend_from_slice(&[ab, bc, ca]);
    }
    out
}
