use glam::Mat4;

use crate::gpu::create_uniform_buffer;
use crate::level::Level;

use super::scene::{GpuMesh, MaterialBindings, ObjectUniform};
use super::traits::Renderable;

struct StaticBatch {
    mesh: GpuMesh,
    material_bind_group: wgpu::BindGroup,
    object_bind_group: wgpu::BindGroup,
}

/// Static level geometry, one draw per material.
pub struct LevelRenderer {
    batches: Vec<StaticBatch>,
}

impl LevelRenderer {
    pub fn new(
        device: &wgpu::Device,
        object_layout: &wgpu::BindGroupLayout,
        materials: &MaterialBindings,
        level: &Level,
    ) -> Self {
        let batches: Vec<_> = level
            .statics
            .parts
            .iter()
            .filter(|part| !part.mesh.is_empty())
            .map(|part| {
                let label = format!("Level {:?}", part.material);
                let uniform = ObjectUniform::new(Mat4::IDENTITY, &part.material.material());
                let buffer = create_uniform_buffer(device, &uniform, &label);
                let object_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some(&format!("{label} Bind Group")),
                    layout: object_layout,
                    entries: &[wgpu::BindGroupEntry {
                        binding: 0,
                        resource: buffer.as_entire_binding(),
                    }],
                });
                StaticBatch {
                    mesh: GpuMesh::new(device, &part.mesh, &label),
                    material_bind_group: materials.get(part.material).clone(),
                    object_bind_group,
                }
            })
            .collect();

        log::info!("Uploaded {} static level batches", batches.len());
        Self { batches }
    }
}

impl Renderable for LevelRenderer {
    fn render<'a>(&'a self, pass: &mut wgpu::RenderPass<'a>, pass_bind_group: &'a wgpu::BindGroup) {
        pass.set_bind_group(0, pass_bind_group, &[]);
        for batch in &self.batches {
            pass.set_bind_group(1, &batch.material_bind_group, &[]);
            pass.set_bind_group(2, &batch.object_bind_group, &[]);
            batch.mesh.draw(pass);
        }
    }
}
