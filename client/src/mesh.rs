use bytemuck::{Pod, Zeroable};
use glam::{Mat3, Mat4, Vec3};
use std::f32::consts::{PI, TAU};

/// Unified vertex type for all meshes
#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable, Debug)]
pub struct Vertex {
    pub position: [f32; 3],
    pub tex_coord: [f32; 2],
    pub normal: [f32; 3],
}

impl Vertex {
    pub const ATTRIBS: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
        0 => Float32x3,
        1 => Float32x2,
        2 => Float32x3
    ];

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBS,
        }
    }
}

/// Indexed triangle list on the CPU side.
#[derive(Clone, Default, Debug)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Appends `other` with `transform` applied. Normals use the
    /// inverse-transpose so non-uniform scales stay correct.
    pub fn append_transformed(&mut self, other: &MeshData, transform: Mat4) {
        let base = self.vertices.len() as u32;
        let normal_matrix = Mat3::from_mat4(transform).inverse().transpose();
        self.vertices.extend(other.vertices.iter().map(|v| Vertex {
            position: transform.transform_point3(Vec3::from(v.position)).into(),
            tex_coord: v.tex_coord,
            normal: (normal_matrix * Vec3::from(v.normal))
                .normalize_or_zero()
                .into(),
        }));
        self.indices.extend(other.indices.iter().map(|i| base + i));
    }

    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let mut iter = self.vertices.iter().map(|v| Vec3::from(v.position));
        let first = iter.next()?;
        Some(iter.fold((first, first), |(lo, hi), p| (lo.min(p), hi.max(p))))
    }

    fn push_quad(&mut self, corners: [[f32; 3]; 4], normal: [f32; 3], uv_extent: [f32; 2]) {
        let base = self.vertices.len() as u32;
        let [u, v] = uv_extent;
        let uvs = [[0.0, v], [u, v], [u, 0.0], [0.0, 0.0]];
        for (position, tex_coord) in corners.into_iter().zip(uvs) {
            self.vertices.push(Vertex {
                position,
                tex_coord,
                normal,
            });
        }
        self.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
}

/// Box centred on the origin with one quad per face, wound counter-clockwise
/// seen from outside. Each face maps the full texture once.
pub fn cuboid(size: Vec3) -> MeshData {
    let Vec3 { x, y, z } = size * 0.5;
    let mut mesh = MeshData::default();
    mesh.push_quad(
        [[-x, -y, z], [x, -y, z], [x, y, z], [-x, y, z]],
        [0.0, 0.0, 1.0],
        [1.0, 1.0],
    );
    mesh.push_quad(
        [[x, -y, -z], [-x, -y, -z], [-x, y, -z], [x, y, -z]],
        [0.0, 0.0, -1.0],
        [1.0, 1.0],
    );
    mesh.push_quad(
        [[-x, -y, -z], [-x, -y, z], [-x, y, z], [-x, y, -z]],
        [-1.0, 0.0, 0.0],
        [1.0, 1.0],
    );
    mesh.push_quad(
        [[x, -y, z], [x, -y, -z], [x, y, -z], [x, y, z]],
        [1.0, 0.0, 0.0],
        [1.0, 1.0],
    );
    mesh.push_quad(
        [[-x, y, z], [x, y, z], [x, y, -z], [-x, y, -z]],
        [0.0, 1.0, 0.0],
        [1.0, 1.0],
    );
    mesh.push_quad(
        [[-x, -y, -z], [x, -y, -z], [x, -y, z], [-x, -y, z]],
        [0.0, -1.0, 0.0],
        [1.0, 1.0],
    );
    mesh
}

/// Horizontal square facing +Y, UVs spanning `uv_repeat` tiles.
pub fn plane(size: f32, uv_repeat: f32) -> MeshData {
    let h = size * 0.5;
    let mut mesh = MeshData::default();
    mesh.push_quad(
        [[-h, 0.0, h], [h, 0.0, h], [h, 0.0, -h], [-h, 0.0, -h]],
        [0.0, 1.0, 0.0],
        [uv_repeat, uv_repeat],
    );
    mesh
}

/// Capped cylinder along Y, centred on the origin.
pub fn cylinder(radius: f32, height: f32, segments: u32) -> MeshData {
    let segments = segments.max(3);
    let half = height * 0.5;
    let mut mesh = MeshData::default();

    for i in 0..=segments {
        let t = i as f32 / segments as f32;
        let (sin, cos) = (t * TAU).sin_cos();
        let normal = [sin, 0.0, cos];
        mesh.vertices.push(Vertex {
            position: [radius * sin, -half, radius * cos],
            tex_coord: [t, 1.0],
            normal,
        });
        mesh.vertices.push(Vertex {
            position: [radius * sin, half, radius * cos],
            tex_coord: [t, 0.0],
            normal,
        });
    }
    for i in 0..segments {
        let b = i * 2;
        mesh.indices
            .extend_from_slice(&[b, b + 2, b + 3, b, b + 3, b + 1]);
    }

    for (y, normal_y) in [(half, 1.0f32), (-half, -1.0f32)] {
        let center = mesh.vertices.len() as u32;
        mesh.vertices.push(Vertex {
            position: [0.0, y, 0.0],
            tex_coord: [0.5, 0.5],
            normal: [0.0, normal_y, 0.0],
        });
        for i in 0..segments {
            let (sin, cos) = (i as f32 / segments as f32 * TAU).sin_cos();
            mesh.vertices.push(Vertex {
                position: [radius * sin, y, radius * cos],
                tex_coord: [0.5 + 0.5 * sin, 0.5 + 0.5 * cos],
                normal: [0.0, normal_y, 0.0],
            });
        }
        for i in 0..segments {
            let a = center + 1 + i;
            let b = center + 1 + (i + 1) % segments;
            if normal_y > 0.0 {
                mesh.indices.extend_from_slice(&[center, a, b]);
            } else {
                mesh.indices.extend_from_slice(&[center, b, a]);
            }
        }
    }

    mesh
}

/// UV sphere centred on the origin.
pub fn sphere(radius: f32, segments: u32, rings: u32) -> MeshData {
    let segments = segments.max(3);
    let rings = rings.max(2);
    let mut mesh = MeshData::default();

    for ring in 0..=rings {
        let v = ring as f32 / rings as f32;
        let (sin_phi, cos_phi) = match ring {
            0 => (0.0, 1.0),
            r if r == rings => (0.0, -1.0),
            _ => (v * PI).sin_cos(),
        };
        for seg in 0..=segments {
            let u = seg as f32 / segments as f32;
            let (sin_theta, cos_theta) = (u * TAU).sin_cos();
            let normal = Vec3::new(sin_phi * sin_theta, cos_phi, sin_phi * cos_theta);
            mesh.vertices.push(Vertex {
                position: (normal * radius).into(),
                tex_coord: [u, v],
                normal: normal.into(),
            });
        }
    }

    let stride = segments + 1;
    for ring in 0..rings {
        for seg in 0..segments {
            let a = ring * stride + seg;
            let b = a + stride;
            // The pole rings collapse to one point, so each pole quad
            // keeps only its non-degenerate triangle.
            if ring != 0 {
                mesh.indices.extend_from_slice(&[a, b, a + 1]);
            }
            if ring != rings - 1 {
                mesh.indices.extend_from_slice(&[a + 1, b, b + 1]);
            }
        }
    }

    mesh
}
