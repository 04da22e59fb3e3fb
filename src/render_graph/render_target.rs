//! Offscreen render surfaces.

use crate::gpu::GpuContext;

/// Color format of every offscreen HDR surface.
pub const HDR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;
/// Depth format of the geometry pass.
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// A single texture used as a render pass attachment.
///
/// Color surfaces are created with `RENDER_ATTACHMENT | TEXTURE_BINDING | COPY_SRC`
/// so one pass can write them, a later pass can sample them, and tests can read
/// them back. Depth surfaces are attachment-only.
///
/// # Fields
///
/// * `texture` - The underlying wgpu texture resource
/// * `view` - A default view, used both as attachment and as shader input
pub struct RenderSurface {
    /// The underlying GPU texture that stores pixel data.
    pub texture: wgpu::Texture,
    /// A view into the texture, used for render pass attachments and shader sampling.
    pub view: wgpu::TextureView,
    label: String,
}

impl RenderSurface {
    /// Creates a color surface of the given format and size.
    pub fn color(
        gpu: &GpuContext,
        label: &str,
        format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) -> Self {
        Self::create(
            gpu,
            label,
            format,
            width,
            height,
            wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC,
        )
    }

    /// Creates a depth surface in [`DEPTH_FORMAT`].
    pub fn depth(gpu: &GpuContext, label: &str, width: u32, height: u32) -> Self {
        Self::create(
            gpu,
            label,
            DEPTH_FORMAT,
            width,
            height,
            wgpu::TextureUsages::RENDER_ATTACHMENT,
        )
    }

    fn create(
        gpu: &GpuContext,
        label: &str,
        format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        usage: wgpu::TextureUsages,
    ) -> Self {
        let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            texture,
            view,
            label: label.to_string(),
        }
    }

    /// Size as reported by the GPU texture.
    pub fn size(&self) -> (u32, u32) {
        (self.texture.width(), self.texture.height())
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.texture.format()
    }

    pub fn usage(&self) -> wgpu::TextureUsages {
        self.texture.usage()
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}
