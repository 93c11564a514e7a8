use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

use crate::config::*;
use crate::gpu::{create_uniform_buffer, frame_bind_group_layout};
use crate::materials::srgb_hex;

use super::shadow::ShadowMap;

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
pub struct FrameUniform {
    pub view_proj: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub light_view_proj: [[f32; 4]; 4],
    pub camera_position: [f32; 4],
    /// xyz points toward the sun, w is its intensity.
    pub sun_direction: [f32; 4],
    /// rgb is the linear sky colour, w the ambient intensity.
    pub sky: [f32; 4],
    /// Fog near, fog far, shadow bias, shadow texel size.
    pub params: [f32; 4],
}

impl FrameUniform {
    pub fn new(view: Mat4, projection: Mat4, camera_position: Vec3, light_view_proj: Mat4) -> Self {
        let [r, g, b] = srgb_hex(SKY_COLOR);
        Self {
            view_proj: (projection * view).to_cols_array_2d(),
            view: view.to_cols_array_2d(),
            light_view_proj: light_view_proj.to_cols_array_2d(),
            camera_position: camera_position.extend(1.0).to_array(),
            sun_direction: SUN_POSITION.normalize().extend(SUN_INTENSITY).to_array(),
            sky: [r, g, b, AMBIENT_INTENSITY],
            params: [
                FOG_NEAR,
                FOG_FAR,
                SHADOW_BIAS,
                1.0 / SHADOW_MAP_SIZE as f32,
            ],
        }
    }
}

pub struct FrameState {
    pub layout: wgpu::BindGroupLayout,
    pub uniform_buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
}

impl FrameState {
    pub fn new(device: &wgpu::Device, shadow: &ShadowMap) -> Self {
        let uniform = FrameUniform::new(Mat4::IDENTITY, Mat4::IDENTITY, Vec3::ZERO, shadow.light_view_proj);
        let uniform_buffer = create_uniform_buffer(device, &uniform, "Frame Uniform");

        let layout = frame_bind_group_layout(device);
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Frame Bind Group"),
            layout: &layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&shadow.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&shadow.sampler),
                },
            ],
        });

        Self {
            layout,
            uniform_buffer,
            bind_group,
        }
    }

    pub fn update(&self, queue: &wgpu::Queue, uniform: &FrameUniform) {
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[*uniform]));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_matches_wgsl_layout() {
        assert_eq!(std::mem::size_of::<FrameUniform>(), 256);
    }

    #[test]
    fn sun_direction_is_unit_and_above_horizon() {
        let uniform = FrameUniform::new(Mat4::IDENTITY, Mat4::IDENTITY, Vec3::ZERO, Mat4::IDENTITY);
        let dir = Vec3::from_slice(&uniform.sun_direction[..3]);
        assert!((dir.length() - 1.0).abs() < 1e-5);
        assert!(dir.y > 0.0);
        assert_eq!(uniform.sun_direction[3], SUN_INTENSITY);
    }
}
