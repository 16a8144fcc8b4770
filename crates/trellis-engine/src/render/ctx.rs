use crate::coords::Viewport;

/// Renderer-facing context: device, queue and the viewport in physical pixels.
///
/// Borrowed for the duration of one pass; renderers keep their own GPU
/// resources between passes.
pub struct RenderCtx<'a> {
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
    pub viewport: Viewport,
}

impl<'a> RenderCtx<'a> {
    #[inline]
    pub fn new(device: &'a wgpu::Device, queue: &'a wgpu::Queue, viewport: Viewport) -> Self {
        Self { device, queue, viewport }
    }

    #[inline]
    pub fn from_gpu(gpu: &'a crate::device::Gpu, viewport: Viewport) -> Self {
        Self::new(gpu.device(), gpu.queue(), viewport)
    }
}
