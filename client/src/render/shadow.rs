use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

use crate::config::*;
use crate::gpu::{DEPTH_FORMAT, create_uniform_buffer, uniform_bind_group_layout};

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
pub struct LightUniform {
    pub view_proj: [[f32; 4]; 4],
}

/// Orthographic projection from the sun toward the origin, covering the
/// whole play area.
pub fn light_view_proj() -> Mat4 {
    let view = Mat4::look_at_rh(SUN_POSITION, Vec3::ZERO, Vec3::Y);
    let projection = Mat4::orthographic_rh(
        -SHADOW_EXTENT,
        SHADOW_EXTENT,
        -SHADOW_EXTENT,
        SHADOW_EXTENT,
        SHADOW_NEAR,
        SHADOW_FAR,
    );
    projection * view
}

pub struct ShadowMap {
    _texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
    pub light_layout: wgpu::BindGroupLayout,
    pub light_bind_group: wgpu::BindGroup,
    pub light_view_proj: Mat4,
}

impl ShadowMap {
    pub fn new(device: &wgpu::Device) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Shadow Map"),
            size: wgpu::Extent3d {
                width: SHADOW_MAP_SIZE,
                height: SHADOW_MAP_SIZE,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Shadow Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            compare: Some(wgpu::CompareFunction::LessEqual),
            ..Default::default()
        });

        let light_view_proj = light_view_proj();
        let buffer = create_uniform_buffer(
            device,
            &LightUniform {
                view_proj: light_view_proj.to_cols_array_2d(),
            },
            "Light Uniform",
        );
        let light_layout = uniform_bind_group_layout(device, "Light Uniform Layout");
        let light_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Light Bind Group"),
            layout: &light_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });

        Self {
            _texture: texture,
            view,
            sampler,
            light_layout,
            light_bind_group,
            light_view_proj,
        }
    }

    pub fn begin_pass<'e>(&self, encoder: &'e mut wgpu::CommandEncoder) -> wgpu::RenderPass<'e> {
        encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Shadow Pass"),
            color_attachments: &[],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project(point: Vec3) -> Vec3 {
        light_view_proj().project_point3(point)
    }

    #[test]
    fn play_area_lands_inside_the_shadow_map() {
        for point in [
            Vec3::ZERO,
            Vec3::new(40.0, 0.0, 40.0),
            Vec3::new(-40.0, 0.0, -40.0),
            Vec3::new(0.0, 20.0, 0.0),
        ] {
            let ndc = project(point);
            assert!(ndc.x.abs() < 1.0 && ndc.y.abs() < 1.0, "{point:?} -> {ndc:?}");
            assert!(ndc.z > 0.0 && ndc.z < 1.0, "{point:?} -> {ndc:?}");
        }
    }

    #[test]
    fn higher_points_are_closer_to_the_sun() {
        assert!(project(Vec3::new(0.0, 10.0, 0.0)).z < project(Vec3::ZERO).z);
    }
}
