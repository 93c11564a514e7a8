use std::collections::HashMap;

use glam::Mat4;

use crate::materials::Material;
use crate::models::ModelId;

use super::scene::{GpuMesh, MaterialBindings, ObjectUniform, UniformPool};
use super::traits::Renderable;

struct GpuPart {
    mesh: GpuMesh,
    material: Material,
    material_bind_group: wgpu::BindGroup,
}

struct Draw {
    model: ModelId,
    part: usize,
    slot: usize,
}

/// Dynamic instances (player, coins, blocks, clouds). Each part of each
/// instance gets its own slot in the uniform pool.
pub struct ModelRenderer {
    models: HashMap<ModelId, Vec<GpuPart>>,
    pool: UniformPool,
    draws: Vec<Draw>,
}

impl ModelRenderer {
    pub fn new(device: &wgpu::Device, pool: UniformPool, materials: &MaterialBindings) -> Self {
        let models = ModelId::ALL
            .iter()
            .map(|&id| {
                let parts = id
                    .build()
                    .parts
                    .iter()
                    .map(|part| GpuPart {
                        mesh: GpuMesh::new(device, &part.mesh, &format!("{id:?} {:?}", part.material)),
                        material: part.material.material(),
                        material_bind_group: materials.get(part.material).clone(),
                    })
                    .collect();
                (id, parts)
            })
            .collect();

        Self {
            models,
            pool,
            draws: Vec::new(),
        }
    }

    pub fn object_layout(&self) -> &wgpu::BindGroupLayout {
        &self.pool.layout
    }

    /// Writes one uniform per drawn part. Must run before the passes that
    /// use this frame's draws are recorded.
    pub fn prepare(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, instances: &[(ModelId, Mat4)]) {
        let count: usize = instances
            .iter()
            .map(|(id, _)| self.models.get(id).map_or(0, Vec::len))
            .sum();
        self.pool.ensure_size(device, count);

        self.draws.clear();
        for (id, transform) in instances {
            let Some(parts) = self.models.get(id) else {
                continue;
            };
            for (index, part) in parts.iter().enumerate() {
                let slot = self.draws.len();
                self.pool
                    .write(queue, slot, &ObjectUniform::new(*transform, &part.material));
                self.draws.push(Draw {
                    model: *id,
                    part: index,
                    slot,
                });
            }
        }
    }

    fn record<'a>(
        &'a self,
        pass: &mut wgpu::RenderPass<'a>,
        pass_bind_group: &'a wgpu::BindGroup,
        filter: impl Fn(ModelId) -> bool,
    ) {
        pass.set_bind_group(0, pass_bind_group, &[]);
        for draw in self.draws.iter().filter(|d| filter(d.model)) {
            let part = &self.models[&draw.model][draw.part];
            pass.set_bind_group(1, &part.material_bind_group, &[]);
            pass.set_bind_group(2, self.pool.bind_group(draw.slot), &[]);
            part.mesh.draw(pass);
        }
    }

    pub fn render_shadow_casters<'a>(
        &'a self,
        pass: &mut wgpu::RenderPass<'a>,
        light_bind_group: &'a wgpu::BindGroup,
    ) {
        self.record(pass, light_bind_group, casts_shadow);
    }
}

impl Renderable for ModelRenderer {
    fn render<'a>(&'a self, pass: &mut wgpu::RenderPass<'a>, pass_bind_group: &'a wgpu::BindGroup) {
        self.record(pass, pass_bind_group, |_| true);
    }
}

/// Clouds are decoration and stay out of the shadow map.
pub fn casts_shadow(model: ModelId) -> bool {
    model != ModelId::Cloud
}
