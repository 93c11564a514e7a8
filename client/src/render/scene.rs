use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use rand::Rng;
use wgpu::util::DeviceExt;

use crate::gpu::{
    DEPTH_FORMAT, HDR_FORMAT, create_placeholder_bind_group, create_texture_with_bind_group,
    texture_bind_group_layout, uniform_bind_group_layout,
};
use crate::materials::{Material, MaterialId};
use crate::mesh::{MeshData, Vertex};
use crate::textures::TextureKind;

/// Format of the view-space normal + reflectivity target.
pub const NORMAL_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
pub struct ObjectUniform {
    pub model: [[f32; 4]; 4],
    pub normal_matrix: [[f32; 4]; 4],
    pub color: [f32; 4],
    /// rgb emissive, w reflectivity.
    pub emissive: [f32; 4],
    /// Roughness, metalness, unused, unused.
    pub surface: [f32; 4],
}

impl ObjectUniform {
    pub fn new(model: Mat4, material: &Material) -> Self {
        let [r, g, b] = material.color;
        let [er, eg, eb] = material.emissive;
        Self {
            model: model.to_cols_array_2d(),
            normal_matrix: model.inverse().transpose().to_cols_array_2d(),
            color: [r, g, b, 1.0],
            emissive: [er, eg, eb, material.reflectivity()],
            surface: [material.roughness, material.metalness, 0.0, 0.0],
        }
    }
}

pub struct GpuMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

impl GpuMesh {
    pub fn new(device: &wgpu::Device, mesh: &MeshData, label: &str) -> Self {
        Self {
            vertex_buffer: crate::gpu::create_vertex_buffer(device, &mesh.vertices, label),
            index_buffer: crate::gpu::create_index_buffer(device, &mesh.indices, label),
            index_count: mesh.indices.len() as u32,
        }
    }

    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..self.index_count, 0, 0..1);
    }
}

/// Texture bind group for every material; untextured materials share a
/// white placeholder.
pub struct MaterialBindings {
    pub layout: wgpu::BindGroupLayout,
    bind_groups: Vec<wgpu::BindGroup>,
}

impl MaterialBindings {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue, rng: &mut impl Rng) -> Self {
        let layout = texture_bind_group_layout(device);
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Material Sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::MipmapFilterMode::Linear,
            ..Default::default()
        });

        let textures: Vec<(TextureKind, wgpu::BindGroup)> = TextureKind::ALL
            .iter()
            .map(|&kind| {
                let image = kind.generate(rng);
                let (_, _, bind_group) = create_texture_with_bind_group(
                    device,
                    queue,
                    &layout,
                    &sampler,
                    image.as_raw(),
                    image.width(),
                    image.height(),
                    kind.label(),
                );
                (kind, bind_group)
            })
            .collect();
        let placeholder = create_placeholder_bind_group(device, queue, &layout, &sampler);

        let bind_groups = MaterialId::ALL
            .iter()
            .map(|id| {
                id.material()
                    .texture
                    .and_then(|kind| textures.iter().find(|(k, _)| *k == kind))
                    .map(|(_, bind_group)| bind_group.clone())
                    .unwrap_or_else(|| placeholder.clone())
            })
            .collect();

        Self {
            layout,
            bind_groups,
        }
    }

    pub fn get(&self, id: MaterialId) -> &wgpu::BindGroup {
        &self.bind_groups[id.index()]
    }
}

/// Growable set of per-object uniform buffers, reused every frame.
pub struct UniformPool {
    pub layout: wgpu::BindGroupLayout,
    pool: Vec<(wgpu::Buffer, wgpu::BindGroup)>,
}

impl UniformPool {
    pub fn new(device: &wgpu::Device) -> Self {
        Self {
            layout: uniform_bind_group_layout(device, "Object Uniform Layout"),
            pool: Vec::new(),
        }
    }

    pub fn ensure_size(&mut self, device: &wgpu::Device, count: usize) {
        while self.pool.len() < count {
            let uniform = ObjectUniform::new(Mat4::IDENTITY, &Material::default());
            let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Object Uniform Buffer"),
                contents: bytemuck::cast_slice(&[uniform]),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });
            let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Object Bind Group"),
                layout: &self.layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                }],
            });
            self.pool.push((buffer, bind_group));
        }
    }

    pub fn write(&self, queue: &wgpu::Queue, index: usize, uniform: &ObjectUniform) {
        queue.write_buffer(&self.pool[index].0, 0, bytemuck::cast_slice(&[*uniform]));
    }

    pub fn bind_group(&self, index: usize) -> &wgpu::BindGroup {
        &self.pool[index].1
    }
}

/// Lit pass writing HDR colour and view normals. Bind groups: frame,
/// material texture, object.
pub fn create_scene_pipeline(
    device: &wgpu::Device,
    frame_layout: &wgpu::BindGroupLayout,
    material_layout: &wgpu::BindGroupLayout,
    object_layout: &wgpu::BindGroupLayout,
) -> wgpu::RenderPipeline {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("Scene Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("scene.wgsl").into()),
    });

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Scene Pipeline Layout"),
        bind_group_layouts: &[frame_layout, material_layout, object_layout],
        immediate_size: 0,
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("Scene Render Pipeline"),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: &[Vertex::desc()],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            targets: &[
                Some(wgpu::ColorTargetState {
                    format: HDR_FORMAT,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                }),
                Some(wgpu::ColorTargetState {
                    format: NORMAL_FORMAT,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                }),
            ],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: Some(wgpu::Face::Back),
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview_mask: None,
        cache: None,
    })
}

/// Depth-only pass from the sun. Shares bind group slots with the scene
/// pipeline so the same draw code serves both: light, material, object.
pub fn create_shadow_pipeline(
    device: &wgpu::Device,
    light_layout: &wgpu::BindGroupLayout,
    material_layout: &wgpu::BindGroupLayout,
    object_layout: &wgpu::BindGroupLayout,
) -> wgpu::RenderPipeline {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("Shadow Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("shadow.wgsl").into()),
    });

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Shadow Pipeline Layout"),
        bind_group_layouts: &[light_layout, material_layout, object_layout],
        immediate_size: 0,
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("Shadow Render Pipeline"),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: &[Vertex::desc()],
            compilation_options: Default::default(),
        },
        fragment: None,
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            cull_mode: None,
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::LessEqual,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState {
                constant: 2,
                slope_scale: 2.0,
                clamp: 0.0,
            },
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview_mask: None,
        cache: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn object_uniform_carries_material_parameters() {
        let material = MaterialId::Coin.material();
        let uniform = ObjectUniform::new(Mat4::from_translation(Vec3::X), &material);
        assert_eq!(uniform.surface[0], material.roughness);
        assert_eq!(uniform.surface[1], material.metalness);
        assert_eq!(uniform.emissive[3], material.reflectivity());
        assert_eq!(uniform.model[3][0], 1.0);
        assert_eq!(std::mem::size_of::<ObjectUniform>() % 16, 0);
    }

    #[test]
    fn normal_matrix_undoes_non_uniform_scale() {
        let model = Mat4::from_scale(Vec3::new(2.0, 1.0, 1.0));
        let uniform = ObjectUniform::new(model, &Material::default());
        let normal = Mat4::from_cols_array_2d(&uniform.normal_matrix);
        assert_eq!(normal.x_axis.x, 0.5);
        assert_eq!(normal.y_axis.y, 1.0);
    }
}
