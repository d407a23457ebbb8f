//! CPU tessellation for the fixed primitive catalog.
//!
//! Everything here produces plain vertex/index data; the renderer uploads it
//! once at startup and never touches it again. Dimensions match the catalog
//! in `scene::ShapeKind`.

use glam::Vec3;
use std::collections::HashMap;

/// Vertex layout shared by every fill mesh.
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
}

/// Tessellated primitive plus its silhouette-edge overlay segments.
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    /// Line-list endpoints (pairs) for the edge overlay, extracted once.
    pub edge_positions: Vec<[f32; 3]>,
}

impl MeshData {
    pub fn min_max(&self) -> Option<(Vec3, Vec3)> {
        let mut iter = self.vertices.iter().map(|v| Vec3::from(v.position));
        let first = iter.next()?;
        let (min, max) = iter.fold((first, first), |(min, max), p| (min.min(p), max.max(p)));
        Some((min, max))
    }

    fn finish(mut self) -> Self {
        self.edge_positions = extract_edges(&self.vertices, &self.indices, 1.0);
        self
    }
}

pub fn uv_sphere(radius: f32, width_segments: u32, height_segments: u32) -> MeshData {
    let width_segments = width_segments.max(3);
    let height_segments = height_segments.max(2);
    let mut mesh = MeshData::default();

    for y in 0..=height_segments {
        let v = y as f32 / height_segments as f32;
        let phi = v * std::f32::consts::PI;
        for x in 0..=width_segments {
            let u = x as f32 / width_segments as f32;
            let theta = u * std::f32::consts::TAU;
            let position = [
                -radius * theta.cos() * phi.sin(),
                radius * phi.cos(),
                radius * theta.sin() * phi.sin(),
            ];
            mesh.vertices.push(Vertex {
                position,
                uv: [u, 1.0 - v],
            });
        }
    }

    let stride = width_segments + 1;
    for y in 0..height_segments {
        for x in 0..width_segments {
            let a = y * stride + x;
            let b = a + stride;
            if y != 0 {
                mesh.indices.extend_from_slice(&[a, b, a + 1]);
            }
            if y != height_segments - 1 {
                mesh.indices.extend_from_slice(&[a + 1, b, b + 1]);
            }
        }
    }

    mesh.finish()
}

pub fn icosahedron(radius: f32, detail: u32) -> MeshData {
    let t = (1.0 + 5.0f32.sqrt()) / 2.0;
    let positions = [
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
    ];
    let faces: [[usize; 3]; 20] = [
        [0, 11, 5],
        [0, 5, 1],
        [0, 1, 7],
        [0, 7, 10],
        [0, 10, 11],
        [1, 5, 9],
        [5, 11, 4],
        [11, 10, 2],
        [10, 7, 6],
        [7, 1, 8],
        [3, 9, 4],
        [3, 4, 2],
        [3, 2, 6],
        [3, 6, 8],
        [3, 8, 9],
        [4, 9, 5],
        [2, 4, 11],
        [6, 2, 10],
        [8, 6, 7],
        [9, 8, 1],
    ];
    polyhedron(&positions, &faces, radius, detail)
}

pub fn octahedron(radius: f32, detail: u32) -> MeshData {
    let positions = [
        Vec3::new(1.0, 0.0, 0.0),
        Vec3::new(-1.0, 0.0, 0.0),
        Vec3::new(0.0, 1.0, 0.0),
        Vec3::new(0.0, -1.0, 0.0),
        Vec3::new(0.0, 0.0, 1.0),
        Vec3::new(0.0, 0.0, -1.0),
    ];
    let faces: [[usize; 3]; 8] = [
        [0, 2, 4],
        [0, 4, 3],
        [0, 3, 5],
        [0, 5, 2],
        [1, 2, 5],
        [1, 5, 3],
        [1, 3, 4],
        [1, 4, 2],
    ];
    polyhedron(&positions, &faces, radius, detail)
}

pub fn tetrahedron(radius: f32, detail: u32) -> MeshData {
    let positions = [
        Vec3::new(1.0, 1.0, 1.0),
        Vec3::new(-1.0, -1.0, 1.0),
        Vec3::new(-1.0, 1.0, -1.0),
        Vec3::new(1.0, -1.0, -1.0),
    ];
    let faces: [[usize; 3]; 4] = [[2, 1, 0], [0, 3, 2], [1, 3, 0], [2, 3, 1]];
    polyhedron(&positions, &faces, radius, detail)
}

/// Subdivide each face of a base solid into a triangular lattice and project
/// every point onto the sphere of the given radius. UVs are spherical.
fn polyhedron(positions: &[Vec3], faces: &[[usize; 3]], radius: f32, detail: u32) -> MeshData {
    let n = detail + 1;
    let mut mesh = MeshData::default();

    for face in faces {
        let (a, b, c) = (positions[face[0]], positions[face[1]], positions[face[2]]);
        let base = mesh.vertices.len() as u32;

        // Row i holds n - i + 1 lattice points; row_start[i] indexes into it.
        let mut row_start = Vec::with_capacity(n as usize + 1);
        let mut offset = 0u32;
        for i in 0..=n {
            row_start.push(offset);
            for j in 0..=(n - i) {
                let li = i as f32 / n as f32;
                let lj = j as f32 / n as f32;
                let point = a * (1.0 - li - lj) + b * lj + c * li;
                let dir = point.normalize_or_zero();
                mesh.vertices.push(Vertex {
                    position: (dir * radius).to_array(),
                    uv: spherical_uv(dir),
                });
            }
            offset += n - i + 1;
        }

        for i in 0..n {
            for j in 0..(n - i) {
                let p0 = base + row_start[i as usize] + j;
                let p1 = p0 + 1;
                let p2 = base + row_start[i as usize + 1] + j;
                mesh.indices.extend_from_slice(&[p0, p1, p2]);
                if j + 1 < n - i {
                    mesh.indices.extend_from_slice(&[p2, p1, p2 + 1]);
                }
            }
        }
    }

    mesh.finish()
}

fn spherical_uv(dir: Vec3) -> [f32; 2] {
    let u = dir.z.atan2(dir.x) / std::f32::consts::TAU + 0.5;
    let v = dir.y.clamp(-1.0, 1.0).asin() / std::f32::consts::PI + 0.5;
    [u, v]
}

pub fn boxed(width: f32, height: f32, depth: f32, segments: u32) -> MeshData {
    let segments = segments.max(1);
    let mut mesh = MeshData::default();
    let (hw, hh, hd) = (width / 2.0, height / 2.0, depth / 2.0);

    // (u axis, v axis, w normal offset) per face.
    let faces = [
        (Vec3::Z * hd, Vec3::Y * hh, Vec3::X * hw),
        (Vec3::NEG_Z * hd, Vec3::Y * hh, Vec3::NEG_X * hw),
        (Vec3::X * hw, Vec3::NEG_Z * hd, Vec3::Y * hh),
        (Vec3::X * hw, Vec3::Z * hd, Vec3::NEG_Y * hh),
        (Vec3::NEG_X * hw, Vec3::Y * hh, Vec3::Z * hd),
        (Vec3::X * hw, Vec3::Y * hh, Vec3::NEG_Z * hd),
    ];

    for (u_axis, v_axis, w_offset) in faces {
        let base = mesh.vertices.len() as u32;
        for y in 0..=segments {
            let fv = y as f32 / segments as f32;
            for x in 0..=segments {
                let fu = x as f32 / segments as f32;
                let point = w_offset + u_axis * (fu * 2.0 - 1.0) + v_axis * (fv * 2.0 - 1.0);
                mesh.vertices.push(Vertex {
                    position: point.to_array(),
                    uv: [fu, fv],
                });
            }
        }
        let stride = segments + 1;
        for y in 0..segments {
            for x in 0..segments {
                let a = base + y * stride + x;
                let b = a + stride;
                mesh.indices.extend_from_slice(&[a, a + 1, b, a + 1, b + 1, b]);
            }
        }
    }

    mesh.finish()
}

/// Cone as a zero-top-radius cylinder with a bottom cap.
pub fn cone(radius: f32, height: f32, radial_segments: u32, height_segments: u32) -> MeshData {
    let radial_segments = radial_segments.max(3);
    let height_segments = height_segments.max(1);
    let mut mesh = MeshData::default();
    let half = height / 2.0;

    for y in 0..=height_segments {
        let v = y as f32 / height_segments as f32;
        let ring_radius = radius * (1.0 - v);
        let ring_y = -half + v * height;
        for x in 0..=radial_segments {
            let u = x as f32 / radial_segments as f32;
            let theta = u * std::f32::consts::TAU;
            mesh.vertices.push(Vertex {
                position: [ring_radius * theta.sin(), ring_y, ring_radius * theta.cos()],
                uv: [u, v],
            });
        }
    }

    let stride = radial_segments + 1;
    for y in 0..height_segments {
        for x in 0..radial_segments {
            let a = y * stride + x;
            let b = a + stride;
            mesh.indices.extend_from_slice(&[a, b, a + 1]);
            if y != height_segments - 1 {
                mesh.indices.extend_from_slice(&[a + 1, b, b + 1]);
            }
        }
    }

    // Bottom cap fan.
    let center = mesh.vertices.len() as u32;
    mesh.vertices.push(Vertex {
        position: [0.0, -half, 0.0],
        uv: [0.5, 0.5],
    });
    let cap_base = mesh.vertices.len() as u32;
    for x in 0..=radial_segments {
        let theta = x as f32 / radial_segments as f32 * std::f32::consts::TAU;
        mesh.vertices.push(Vertex {
            position: [radius * theta.sin(), -half, radius * theta.cos()],
            uv: [theta.sin() * 0.5 + 0.5, theta.cos() * 0.5 + 0.5],
        });
    }
    for x in 0..radial_segments {
        mesh.indices
            .extend_from_slice(&[center, cap_base + x + 1, cap_base + x]);
    }

    mesh.finish()
}

/// Silhouette-edge extraction: emit a segment for every edge whose adjacent
/// faces meet at more than `threshold_deg`, and for boundary edges. Positions
/// are quantized so seams between duplicated vertices merge.
pub fn extract_edges(vertices: &[Vertex], indices: &[u32], threshold_deg: f32) -> Vec<[f32; 3]> {
    #[derive(Hash, PartialEq, Eq, Clone, Copy)]
    struct Key(i64, i64, i64);

    fn quantize(p: [f32; 3]) -> Key {
        const SCALE: f32 = 1.0e4;
        Key(
            (p[0] * SCALE).round() as i64,
            (p[1] * SCALE).round() as i64,
            (p[2] * SCALE).round() as i64,
        )
    }

    struct EdgeInfo {
        a: [f32; 3],
        b: [f32; 3],
        normals: Vec<Vec3>,
    }

    let mut edges: HashMap<(Key, Key), EdgeInfo> = HashMap::new();
    for face in indices.chunks_exact(3) {
        let p = [
            vertices[face[0] as usize].position,
            vertices[face[1] as usize].position,
            vertices[face[2] as usize].position,
        ];
        let normal = (Vec3::from(p[1]) - Vec3::from(p[0]))
            .cross(Vec3::from(p[2]) - Vec3::from(p[0]))
            .normalize_or_zero();
        for i in 0..3 {
            let (a, b) = (p[i], p[(i + 1) % 3]);
            let (ka, kb) = (quantize(a), quantize(b));
            if ka == kb {
                continue; // degenerate (e.g. pole fan)
            }
            let key = if (ka.0, ka.1, ka.2) <= (kb.0, kb.1, kb.2) {
                (ka, kb)
            } else {
                (kb, ka)
            };
            edges
                .entry(key)
                .or_insert_with(|| EdgeInfo {
                    a,
                    b,
                    normals: Vec::new(),
                })
                .normals
                .push(normal);
        }
    }

    let threshold_cos = threshold_deg.to_radians().cos();
    let mut out = Vec::new();
    for info in edges.values() {
        let sharp = match info.normals.as_slice() {
            [_] => true, // boundary
            [n0, n1, ..] => n0.dot(*n1) < threshold_cos,
            [] => false,
        };
        if sharp {
            out.push(info.a);
            out.push(info.b);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_indices_in_range(mesh: &MeshData) {
        let count = mesh.vertices.len() as u32;
        assert!(mesh.indices.iter().all(|i| *i < count));
        assert_eq!(mesh.indices.len() % 3, 0);
    }

    #[test]
    fn sphere_tessellation_is_well_formed() {
        let mesh = uv_sphere(75.0, 20, 10);
        assert_indices_in_range(&mesh);
        let (min, max) = mesh.min_max().unwrap();
        assert!((max.x - 75.0).abs() < 1.0);
        assert!((min.y + 75.0).abs() < 1e-3);
        assert!(mesh
            .vertices
            .iter()
            .all(|v| (Vec3::from(v.position).length() - 75.0).abs() < 1e-2));
    }

    #[test]
    fn polyhedra_project_onto_sphere() {
        for mesh in [
            icosahedron(75.0, 1),
            octahedron(75.0, 2),
            tetrahedron(75.0, 0),
        ] {
            assert_indices_in_range(&mesh);
            assert!(mesh
                .vertices
                .iter()
                .all(|v| (Vec3::from(v.position).length() - 75.0).abs() < 1e-2));
        }
    }

    #[test]
    fn polyhedron_detail_grows_triangle_count() {
        let coarse = icosahedron(75.0, 0);
        let fine = icosahedron(75.0, 1);
        assert_eq!(coarse.indices.len(), 20 * 3);
        assert_eq!(fine.indices.len(), 20 * 4 * 3);
    }

    #[test]
    fn box_bounds_match_dimensions() {
        let mesh = boxed(100.0, 100.0, 100.0, 4);
        assert_indices_in_range(&mesh);
        let (min, max) = mesh.min_max().unwrap();
        assert_eq!(min, Vec3::splat(-50.0));
        assert_eq!(max, Vec3::splat(50.0));
    }

    #[test]
    fn unit_box_has_twelve_silhouette_edges() {
        // Face-interior diagonals are coplanar and must not appear; the twelve
        // 90-degree corner edges must.
        let mesh = boxed(1.0, 1.0, 1.0, 1);
        assert_eq!(mesh.edge_positions.len(), 12 * 2);
    }

    #[test]
    fn segmented_box_keeps_only_corner_edges() {
        let mesh = boxed(100.0, 100.0, 100.0, 4);
        // Each corner edge is split into 4 collinear segments.
        assert_eq!(mesh.edge_positions.len(), 12 * 4 * 2);
    }

    #[test]
    fn cone_spans_its_height() {
        let mesh = cone(75.0, 120.0, 40, 5);
        assert_indices_in_range(&mesh);
        let (min, max) = mesh.min_max().unwrap();
        assert!((min.y + 60.0).abs() < 1e-3);
        assert!((max.y - 60.0).abs() < 1e-3);
        assert!((max.x - 75.0).abs() < 1.0);
        // Rim and cap meet at a sharp angle, so an overlay must exist.
        assert!(!mesh.edge_positions.is_empty());
    }
}
