use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use rand::Rng;

use crate::config::*;
use crate::gpu::{
    HDR_FORMAT, create_depth_texture, create_render_target_texture,
    create_uniform_buffer, create_vertex_buffer, sampler_entry, texture_entry, uniform_entry,
    uniform_bind_group_layout,
};

use super::scene::NORMAL_FORMAT;

const AO_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::R8Unorm;

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
pub struct PostUniform {
    pub projection: [[f32; 4]; 4],
    pub inv_projection: [[f32; 4]; 4],
    /// Width, height, 1 / width, 1 / height.
    pub resolution: [f32; 4],
    pub kernel: [[f32; 4]; SSAO_KERNEL_SIZE],
    /// Kernel radius, min relative depth delta, max relative depth delta.
    pub ssao: [f32; 4],
    /// Ray length, relative thickness.
    pub ssr: [f32; 4],
    /// Threshold, strength, radius, 1 when the output needs manual sRGB
    /// encoding.
    pub bloom: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct BlurUniform {
    direction: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct PostProcessVertex {
    position: [f32; 2],
    tex_coord: [f32; 2],
}

impl PostProcessVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<PostProcessVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 2]>() as u64,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x2,
                },
            ],
        }
    }
}

const FULLSCREEN_QUAD: [PostProcessVertex; 6] = [
    PostProcessVertex {
        position: [-1.0, -1.0],
        tex_coord: [0.0, 1.0],
    },
    PostProcessVertex {
        position: [1.0, -1.0],
        tex_coord: [1.0, 1.0],
    },
    PostProcessVertex {
        position: [-1.0, 1.0],
        tex_coord: [0.0, 0.0],
    },
    PostProcessVertex {
        position: [1.0, -1.0],
        tex_coord: [1.0, 1.0],
    },
    PostProcessVertex {
        position: [1.0, 1.0],
        tex_coord: [1.0, 0.0],
    },
    PostProcessVertex {
        position: [-1.0, 1.0],
        tex_coord: [0.0, 0.0],
    },
];

/// Hemisphere samples around +Z, denser near the origin.
pub fn ssao_kernel(rng: &mut impl Rng) -> [[f32; 4]; SSAO_KERNEL_SIZE] {
    let mut kernel = [[0.0; 4]; SSAO_KERNEL_SIZE];
    for (i, sample) in kernel.iter_mut().enumerate() {
        let direction = Vec3::new(
            rng.random_range(-1.0..1.0),
            rng.random_range(-1.0..1.0),
            rng.random_range(0.0..1.0),
        )
        .normalize_or(Vec3::Z);
        let t = i as f32 / SSAO_KERNEL_SIZE as f32;
        let scale = 0.1 + 0.9 * t * t;
        let v = direction * rng.random_range(0.0..1.0f32) * scale;
        *sample = [v.x, v.y, v.z, 0.0];
    }
    kernel
}

/// Render targets and everything that has to be rebuilt with them.
struct Targets {
    color: (wgpu::Texture, wgpu::TextureView),
    normal: (wgpu::Texture, wgpu::TextureView),
    depth: (wgpu::Texture, wgpu::TextureView),
    ao: (wgpu::Texture, wgpu::TextureView),
    lit: (wgpu::Texture, wgpu::TextureView),
    bloom: [(wgpu::Texture, wgpu::TextureView); 2],
    ssao_inputs: wgpu::BindGroup,
    composite_inputs: wgpu::BindGroup,
    bright_inputs: wgpu::BindGroup,
    blur_inputs: [wgpu::BindGroup; 2],
    output_inputs: wgpu::BindGroup,
    passthrough_inputs: wgpu::BindGroup,
}

struct Layouts {
    ssao: wgpu::BindGroupLayout,
    composite: wgpu::BindGroupLayout,
    bloom: wgpu::BindGroupLayout,
    output: wgpu::BindGroupLayout,
}

fn bind_views(
    device: &wgpu::Device,
    label: &str,
    layout: &wgpu::BindGroupLayout,
    resources: &[wgpu::BindingResource<'_>],
) -> wgpu::BindGroup {
    let entries: Vec<_> = resources
        .iter()
        .enumerate()
        .map(|(binding, resource)| wgpu::BindGroupEntry {
            binding: binding as u32,
            resource: resource.clone(),
        })
        .collect();
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout,
        entries: &entries,
    })
}

impl Targets {
    fn new(
        device: &wgpu::Device,
        layouts: &Layouts,
        sampler: &wgpu::Sampler,
        blur_buffers: &[wgpu::Buffer; 2],
        width: u32,
        height: u32,
    ) -> Self {
        let (half_w, half_h) = ((width / 2).max(1), (height / 2).max(1));
        let color = create_render_target_texture(device, width, height, HDR_FORMAT, "Scene Color");
        let normal = create_render_target_texture(device, width, height, NORMAL_FORMAT, "Scene Normal");
        let depth = create_depth_texture(device, width, height, "Scene Depth");
        let ao = create_render_target_texture(device, width, height, AO_FORMAT, "SSAO");
        let lit = create_render_target_texture(device, width, height, HDR_FORMAT, "Lit Color");
        let bloom = [
            create_render_target_texture(device, half_w, half_h, HDR_FORMAT, "Bloom A"),
            create_render_target_texture(device, half_w, half_h, HDR_FORMAT, "Bloom B"),
        ];

        use wgpu::BindingResource::{Sampler, TextureView};
        let ssao_inputs = bind_views(
            device,
            "SSAO Inputs",
            &layouts.ssao,
            &[TextureView(&depth.1), TextureView(&normal.1)],
        );
        let composite_inputs = bind_views(
            device,
            "Composite Inputs",
            &layouts.composite,
            &[
                TextureView(&color.1),
                TextureView(&normal.1),
                TextureView(&depth.1),
                TextureView(&ao.1),
            ],
        );
        let bright_inputs = bind_views(
            device,
            "Bloom Bright Inputs",
            &layouts.bloom,
            &[
                Sampler(sampler),
                TextureView(&lit.1),
                blur_buffers[0].as_entire_binding(),
            ],
        );
        let blur_inputs = [
            bind_views(
                device,
                "Bloom Blur H Inputs",
                &layouts.bloom,
                &[
                    Sampler(sampler),
                    TextureView(&bloom[0].1),
                    blur_buffers[0].as_entire_binding(),
                ],
            ),
            bind_views(
                device,
                "Bloom Blur V Inputs",
                &layouts.bloom,
                &[
                    Sampler(sampler),
                    TextureView(&bloom[1].1),
                    blur_buffers[1].as_entire_binding(),
                ],
            ),
        ];
        let output_inputs = bind_views(
            device,
            "Output Inputs",
            &layouts.output,
            &[Sampler(sampler), TextureView(&lit.1), TextureView(&bloom[0].1)],
        );
        let passthrough_inputs = bind_views(
            device,
            "Output Passthrough Inputs",
            &layouts.output,
            &[Sampler(sampler), TextureView(&color.1), TextureView(&bloom[0].1)],
        );

        Self {
            color,
            normal,
            depth,
            ao,
            lit,
            bloom,
            ssao_inputs,
            composite_inputs,
            bright_inputs,
            blur_inputs,
            output_inputs,
            passthrough_inputs,
        }
    }
}

fn fullscreen_pipeline(
    device: &wgpu::Device,
    label: &str,
    source: &str,
    entry_point: &str,
    bind_group_layouts: &[&wgpu::BindGroupLayout],
    format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(&format!("{label} Shader")),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(&format!("{label} Pipeline Layout")),
        bind_group_layouts,
        immediate_size: 0,
    });
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(&format!("{label} Pipeline")),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: &[PostProcessVertex::desc()],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some(entry_point),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            ..Default::default()
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview_mask: None,
        cache: None,
    })
}

/// Owns the scene render targets and runs the screen-space chain:
/// SSAO, lighting composite with reflections, bloom, tone mapping.
pub struct PostProcessor {
    ssao_pipeline: wgpu::RenderPipeline,
    composite_pipeline: wgpu::RenderPipeline,
    bright_pipeline: wgpu::RenderPipeline,
    blur_pipeline: wgpu::RenderPipeline,
    output_pipeline: wgpu::RenderPipeline,
    layouts: Layouts,
    targets: Targets,
    uniform: PostUniform,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    blur_buffers: [wgpu::Buffer; 2],
    fullscreen_quad_buffer: wgpu::Buffer,
    sampler: wgpu::Sampler,
    pub enabled: bool,
}

impl PostProcessor {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        enabled: bool,
        rng: &mut impl Rng,
    ) -> Self {
        let uniform_layout = uniform_bind_group_layout(device, "Postprocess Uniform Layout");
        let unfilterable = wgpu::TextureSampleType::Float { filterable: false };
        let filterable = wgpu::TextureSampleType::Float { filterable: true };
        let layout = |label: &str, entries: &[wgpu::BindGroupLayoutEntry]| {
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some(label),
                entries,
            })
        };
        let layouts = Layouts {
            ssao: layout(
                "SSAO Inputs Layout",
                &[
                    texture_entry(0, wgpu::TextureSampleType::Depth),
                    texture_entry(1, unfilterable),
                ],
            ),
            composite: layout(
                "Composite Inputs Layout",
                &[
                    texture_entry(0, unfilterable),
                    texture_entry(1, unfilterable),
                    texture_entry(2, wgpu::TextureSampleType::Depth),
                    texture_entry(3, unfilterable),
                ],
            ),
            bloom: layout(
                "Bloom Inputs Layout",
                &[
                    sampler_entry(0, wgpu::SamplerBindingType::Filtering),
                    texture_entry(1, filterable),
                    uniform_entry(2, wgpu::ShaderStages::FRAGMENT),
                ],
            ),
            output: layout(
                "Output Inputs Layout",
                &[
                    sampler_entry(0, wgpu::SamplerBindingType::Filtering),
                    texture_entry(1, filterable),
                    texture_entry(2, filterable),
                ],
            ),
        };

        let ssao_pipeline = fullscreen_pipeline(
            device,
            "SSAO",
            include_str!("ssao.wgsl"),
            "fs_main",
            &[&uniform_layout, &layouts.ssao],
            AO_FORMAT,
        );
        let composite_pipeline = fullscreen_pipeline(
            device,
            "Composite",
            include_str!("composite.wgsl"),
            "fs_main",
            &[&uniform_layout, &layouts.composite],
            HDR_FORMAT,
        );
        let bright_pipeline = fullscreen_pipeline(
            device,
            "Bloom Bright",
            include_str!("bloom.wgsl"),
            "fs_bright",
            &[&uniform_layout, &layouts.bloom],
            HDR_FORMAT,
        );
        let blur_pipeline = fullscreen_pipeline(
            device,
            "Bloom Blur",
            include_str!("bloom.wgsl"),
            "fs_blur",
            &[&uniform_layout, &layouts.bloom],
            HDR_FORMAT,
        );
        let output_pipeline = fullscreen_pipeline(
            device,
            "Output",
            include_str!("output.wgsl"),
            "fs_main",
            &[&uniform_layout, &layouts.output],
            surface_format,
        );

        let uniform = PostUniform {
            projection: Mat4::IDENTITY.to_cols_array_2d(),
            inv_projection: Mat4::IDENTITY.to_cols_array_2d(),
            resolution: resolution(width, height),
            kernel: ssao_kernel(rng),
            ssao: [SSAO_KERNEL_RADIUS, SSAO_MIN_DISTANCE, SSAO_MAX_DISTANCE, 0.0],
            ssr: [SSR_MAX_DISTANCE, SSR_THICKNESS, 0.0, 0.0],
            bloom: [
                BLOOM_THRESHOLD,
                BLOOM_STRENGTH,
                BLOOM_RADIUS,
                if surface_format.is_srgb() { 0.0 } else { 1.0 },
            ],
        };
        let uniform_buffer = create_uniform_buffer(device, &uniform, "Postprocess Uniform");
        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Postprocess Uniform Bind Group"),
            layout: &uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let blur_buffers = [
            create_uniform_buffer(
                device,
                &BlurUniform {
                    direction: [1.0, 0.0, 0.0, 0.0],
                },
                "Blur H Uniform",
            ),
            create_uniform_buffer(
                device,
                &BlurUniform {
                    direction: [0.0, 1.0, 0.0, 0.0],
                },
                "Blur V Uniform",
            ),
        ];

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Postprocess Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let targets = Targets::new(device, &layouts, &sampler, &blur_buffers, width, height);
        let fullscreen_quad_buffer = create_vertex_buffer(device, &FULLSCREEN_QUAD, "Fullscreen Quad");

        Self {
            ssao_pipeline,
            composite_pipeline,
            bright_pipeline,
            blur_pipeline,
            output_pipeline,
            layouts,
            targets,
            uniform,
            uniform_buffer,
            uniform_bind_group,
            blur_buffers,
            fullscreen_quad_buffer,
            sampler,
            enabled,
        }
    }

    pub fn color_view(&self) -> &wgpu::TextureView {
        &self.targets.color.1
    }

    pub fn normal_view(&self) -> &wgpu::TextureView {
        &self.targets.normal.1
    }

    pub fn depth_view(&self) -> &wgpu::TextureView {
        &self.targets.depth.1
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.targets = Targets::new(
            device,
            &self.layouts,
            &self.sampler,
            &self.blur_buffers,
            width,
            height,
        );
        self.uniform.resolution = resolution(width, height);
    }

    fn run(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        label: &str,
        target: &wgpu::TextureView,
        pipeline: &wgpu::RenderPipeline,
        inputs: &wgpu::BindGroup,
    ) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(label),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, &self.uniform_bind_group, &[]);
        pass.set_bind_group(1, inputs, &[]);
        pass.set_vertex_buffer(0, self.fullscreen_quad_buffer.slice(..));
        pass.draw(0..6, 0..1);
    }

    pub fn apply(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        queue: &wgpu::Queue,
        swapchain_view: &wgpu::TextureView,
        projection: Mat4,
    ) {
        self.uniform.projection = projection.to_cols_array_2d();
        self.uniform.inv_projection = projection.inverse().to_cols_array_2d();
        self.uniform.bloom[1] = if self.enabled { BLOOM_STRENGTH } else { 0.0 };
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[self.uniform]));

        let t = &self.targets;
        if !self.enabled {
            self.run(
                encoder,
                "Output Pass",
                swapchain_view,
                &self.output_pipeline,
                &t.passthrough_inputs,
            );
            return;
        }

        self.run(encoder, "SSAO Pass", &t.ao.1, &self.ssao_pipeline, &t.ssao_inputs);
        self.run(
            encoder,
            "Composite Pass",
            &t.lit.1,
            &self.composite_pipeline,
            &t.composite_inputs,
        );
        self.run(
            encoder,
            "Bloom Bright Pass",
            &t.bloom[0].1,
            &self.bright_pipeline,
            &t.bright_inputs,
        );
        self.run(
            encoder,
            "Bloom Blur H Pass",
            &t.bloom[1].1,
            &self.blur_pipeline,
            &t.blur_inputs[0],
        );
        self.run(
            encoder,
            "Bloom Blur V Pass",
            &t.bloom[0].1,
            &self.blur_pipeline,
            &t.blur_inputs[1],
        );
        self.run(
            encoder,
            "Output Pass",
            swapchain_view,
            &self.output_pipeline,
            &t.output_inputs,
        );
    }
}

fn resolution(width: u32, height: u32) -> [f32; 4] {
    let (w, h) = (width.max(1) as f32, height.max(1) as f32);
    [w, h, 1.0 / w, 1.0 / h]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn kernel_stays_in_the_unit_hemisphere() {
        let kernel = ssao_kernel(&mut SmallRng::seed_from_u64(11));
        for [x, y, z, w] in kernel {
            assert!(z >= 0.0);
            assert!(Vec3::new(x, y, z).length() <= 1.0);
            assert_eq!(w, 0.0);
        }
    }

    #[test]
    fn kernel_grows_outward() {
        let kernel = ssao_kernel(&mut SmallRng::seed_from_u64(11));
        let max_len = |range: std::ops::Range<usize>| {
            kernel[range]
                .iter()
                .map(|[x, y, z, _]| Vec3::new(*x, *y, *z).length())
                .fold(0.0, f32::max)
        };
        assert!(max_len(0..4) <= 0.1 + 0.9 * (3.0f32 / 16.0).powi(2) + 1e-6);
        assert!(max_len(0..SSAO_KERNEL_SIZE) <= 1.0);
    }

    #[test]
    fn uniform_layout_is_16_byte_aligned() {
        assert_eq!(std::mem::size_of::<PostUniform>(), 448);
        assert_eq!(std::mem::size_of::<BlurUniform>(), 16);
    }

    #[test]
    fn resolution_never_divides_by_zero() {
        assert_eq!(resolution(0, 0), [1.0, 1.0, 1.0, 1.0]);
        assert_eq!(resolution(800, 400), [800.0, 400.0, 1.0 / 800.0, 1.0 / 400.0]);
    }
}
