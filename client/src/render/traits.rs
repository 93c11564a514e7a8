/// Something that records its own draws once the caller has set a
/// pipeline. Group 0 is the per-pass bind group (frame or light).
pub trait Renderable {
    fn render<'a>(&'a self, pass: &mut wgpu::RenderPass<'a>, pass_bind_group: &'a wgpu::BindGroup);
}
