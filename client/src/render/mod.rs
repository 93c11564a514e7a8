use std::sync::Arc;
use winit::window::Window;

use crate::config::SKY_COLOR;
use crate::error::RenderError;
use crate::game::GameState;
use crate::level::Level;
use crate::materials::srgb_hex;
use crate::settings::Settings;

pub mod camera;
pub mod level;
pub mod models;
pub mod postprocess;
pub mod scene;
pub mod shadow;
pub mod traits;

use camera::{FrameState, FrameUniform};
use level::LevelRenderer;
use models::ModelRenderer;
use postprocess::PostProcessor;
use scene::{MaterialBindings, UniformPool, create_scene_pipeline, create_shadow_pipeline};
use shadow::ShadowMap;
use traits::Renderable;

pub struct RenderContext {
    pub window: Arc<Window>,
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
}

#[cfg(target_arch = "wasm32")]
fn initial_size(_window: &Window) -> (u32, u32) {
    let Some(web_window) = web_sys::window() else {
        return (1, 1);
    };
    let dpr = web_window.device_pixel_ratio();
    let dimension = |value: Result<wasm_bindgen::JsValue, wasm_bindgen::JsValue>| {
        value.ok().and_then(|v| v.as_f64()).unwrap_or(1.0) * dpr
    };
    let w = dimension(web_window.inner_width()) as u32;
    let h = dimension(web_window.inner_height()) as u32;
    (w.max(1), h.max(1))
}

#[cfg(not(target_arch = "wasm32"))]
fn initial_size(window: &Window) -> (u32, u32) {
    let size = window.inner_size();
    (size.width.max(1), size.height.max(1))
}

impl RenderContext {
    pub async fn new(window: Arc<Window>) -> Result<Self, RenderError> {
        let (width, height) = initial_size(&window);

        #[cfg(target_arch = "wasm32")]
        let backends = wgpu::Backends::BROWSER_WEBGPU | wgpu::Backends::GL;
        #[cfg(not(target_arch = "wasm32"))]
        let backends = wgpu::Backends::all();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends,
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone())?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;
        log::info!("Using adapter {:?}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor::default())
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or(RenderError::NoSurfaceFormat)?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
        })
    }
}

fn sky_clear_color() -> wgpu::Color {
    let [r, g, b] = srgb_hex(SKY_COLOR);
    wgpu::Color {
        r: r as f64,
        g: g as f64,
        b: b as f64,
        a: 1.0,
    }
}

pub struct Renderer {
    pub ctx: RenderContext,
    frame: FrameState,
    shadow: ShadowMap,
    scene_pipeline: wgpu::RenderPipeline,
    shadow_pipeline: wgpu::RenderPipeline,
    level_renderer: LevelRenderer,
    model_renderer: ModelRenderer,
    postprocessor: PostProcessor,
}

impl Renderer {
    pub async fn new(
        window: Arc<Window>,
        level: &Level,
        settings: &Settings,
    ) -> Result<Self, RenderError> {
        let ctx = RenderContext::new(window).await?;
        let mut rng = settings.rng();

        let shadow = ShadowMap::new(&ctx.device);
        let frame = FrameState::new(&ctx.device, &shadow);
        let materials = MaterialBindings::new(&ctx.device, &ctx.queue, &mut rng);

        let model_renderer =
            ModelRenderer::new(&ctx.device, UniformPool::new(&ctx.device), &materials);
        let object_layout = model_renderer.object_layout();

        let scene_pipeline =
            create_scene_pipeline(&ctx.device, &frame.layout, &materials.layout, object_layout);
        let shadow_pipeline = create_shadow_pipeline(
            &ctx.device,
            &shadow.light_layout,
            &materials.layout,
            object_layout,
        );
        let level_renderer = LevelRenderer::new(&ctx.device, object_layout, &materials, level);

        let postprocessor = PostProcessor::new(
            &ctx.device,
            ctx.config.format,
            ctx.config.width,
            ctx.config.height,
            settings.post_processing,
            &mut rng,
        );

        log::info!(
            "Renderer ready: {}x{} {:?}, post-processing {}",
            ctx.config.width,
            ctx.config.height,
            ctx.config.format,
            if settings.post_processing { "on" } else { "off" }
        );

        Ok(Self {
            ctx,
            frame,
            shadow,
            scene_pipeline,
            shadow_pipeline,
            level_renderer,
            model_renderer,
            postprocessor,
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.ctx.config.width = width;
            self.ctx.config.height = height;
            self.ctx
                .surface
                .configure(&self.ctx.device, &self.ctx.config);
            self.postprocessor.resize(&self.ctx.device, width, height);
        }
    }

    pub fn render_frame(&mut self, game: &GameState) -> Result<(), wgpu::SurfaceError> {
        let aspect = self.ctx.config.width as f32 / self.ctx.config.height as f32;
        let projection = game.camera.projection(aspect);
        let view = game.camera.view_matrix();
        self.frame.update(
            &self.ctx.queue,
            &FrameUniform::new(
                view,
                projection,
                game.camera.position,
                self.shadow.light_view_proj,
            ),
        );
        self.model_renderer
            .prepare(&self.ctx.device, &self.ctx.queue, &game.draw_list());

        let output = self.ctx.surface.get_current_texture()?;
        let swapchain_view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut pass = self.shadow.begin_pass(&mut encoder);
            pass.set_pipeline(&self.shadow_pipeline);
            self.level_renderer
                .render(&mut pass, &self.shadow.light_bind_group);
            self.model_renderer
                .render_shadow_casters(&mut pass, &self.shadow.light_bind_group);
        }

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[
                    Some(wgpu::RenderPassColorAttachment {
                        view: self.postprocessor.color_view(),
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Clear(sky_clear_color()),
                            store: wgpu::StoreOp::Store,
                        },
                        depth_slice: None,
                    }),
                    Some(wgpu::RenderPassColorAttachment {
                        view: self.postprocessor.normal_view(),
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                            store: wgpu::StoreOp::Store,
                        },
                        depth_slice: None,
                    }),
                ],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: self.postprocessor.depth_view(),
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            pass.set_pipeline(&self.scene_pipeline);
            self.level_renderer.render(&mut pass, &self.frame.bind_group);
            self.model_renderer.render(&mut pass, &self.frame.bind_group);
        }

        self.postprocessor
            .apply(&mut encoder, &self.ctx.queue, &swapchain_view, projection);

        self.ctx.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }

    pub fn request_redraw(&self) {
        self.ctx.window.request_redraw();
    }

    pub fn width(&self) -> u32 {
        self.ctx.config.width
    }

    pub fn height(&self) -> u32 {
        self.ctx.config.height
    }
}
