//! The per-frame pass sequence.

use crate::gpu::GpuContext;
use crate::mesh::{Mesh, ScreenQuad};
use crate::mesh_pass::GeometryPass;
use crate::post_process::{BloomPasses, BloomSettings};
use crate::render_graph::framebuffer::FramebufferGraph;
use crate::render_graph::schedule::{
    BRIGHT_PASS_SLOT, BlurOutput, BrightPassOutput, FrameOutput, GeometryOutput, SurfaceId,
};
use crate::scene::SceneUniforms;
use crate::shader::{ShaderProgram, ShaderSources};
use crate::texture::MaterialTextures;

/// Everything a frame reads besides the renderer's own resources.
pub struct FrameInputs<'a> {
    pub uniforms: SceneUniforms,
    /// `None` when the model failed to load; the geometry pass then only clears.
    pub mesh: Option<&'a Mesh>,
}

/// Owns the framebuffer graph and the four passes, and runs them in order:
///
/// ```text
/// geometry ──▶ HDR scene ─────────────────────────────┐
///          └─▶ HDR bright ─▶ bright pass ─▶ blur ×N ─▶ combine ─▶ target
/// ```
///
/// Each pass returns the surface it wrote and the next pass binds exactly that
/// surface.
pub struct FrameRenderer {
    framebuffers: FramebufferGraph,
    quad: ScreenQuad,
    geometry: GeometryPass,
    bloom: BloomPasses,
    settings: BloomSettings,
    clear_color: wgpu::Color,
}

impl FrameRenderer {
    /// Build all targets and programs.
    ///
    /// `output_format` is the format of the views later passed to
    /// [`render`](Self::render).
    pub fn new(
        gpu: &GpuContext,
        sources: &ShaderSources,
        materials: &MaterialTextures,
        output_format: wgpu::TextureFormat,
        (width, height): (u32, u32),
        settings: BloomSettings,
        clear_color: wgpu::Color,
    ) -> Self {
        let framebuffers = FramebufferGraph::new(gpu, width, height);
        if !framebuffers.completeness().is_complete() {
            log::warn!("frames will only clear the output until the targets are usable");
        }
        let quad = ScreenQuad::new(gpu);
        let geometry = GeometryPass::new(gpu, sources, materials);
        let bloom = BloomPasses::new(gpu, sources, &framebuffers, output_format, &settings);

        Self {
            framebuffers,
            quad,
            geometry,
            bloom,
            settings,
            clear_color,
        }
    }

    /// Record and submit one frame into `target`.
    ///
    /// With an incomplete framebuffer graph only `target` is cleared.
    pub fn render(
        &self,
        gpu: &GpuContext,
        frame: &FrameInputs,
        target: &wgpu::TextureView,
    ) -> FrameOutput {
        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        if !self.framebuffers.completeness().is_complete() {
            self.clear_target(&mut encoder, target);
            gpu.queue.submit(std::iter::once(encoder.finish()));
            return Self::skipped_frame();
        }

        self.geometry.update(gpu, &frame.uniforms);

        let geometry =
            self.geometry
                .record(&mut encoder, &self.framebuffers, frame.mesh, self.clear_color);
        let bright = self.bloom.bright_pass(
            &mut encoder,
            &self.framebuffers,
            &self.quad,
            geometry.bright,
        );
        let blur = self.bloom.blur(
            &mut encoder,
            &self.framebuffers,
            &self.quad,
            bright.bright,
            self.settings.blur_passes,
        );
        self.bloom.combine(
            &mut encoder,
            &self.quad,
            geometry.scene,
            blur.blurred,
            target,
            self.clear_color,
        );

        gpu.queue.submit(std::iter::once(encoder.finish()));

        FrameOutput {
            geometry,
            bright,
            blur,
        }
    }

    fn clear_target(&self, encoder: &mut wgpu::CommandEncoder, target: &wgpu::TextureView) {
        encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Clear Only Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(self.clear_color),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
    }

    /// What a frame reports when no offscreen pass ran.
    fn skipped_frame() -> FrameOutput {
        let bright = SurfaceId::PingPong(BRIGHT_PASS_SLOT);
        FrameOutput {
            geometry: GeometryOutput {
                scene: SurfaceId::HdrScene,
                bright: SurfaceId::HdrBright,
                drew_mesh: false,
            },
            bright: BrightPassOutput { bright },
            blur: BlurOutput {
                blurred: bright,
                passes: 0,
            },
        }
    }

    pub fn framebuffers(&self) -> &FramebufferGraph {
        &self.framebuffers
    }

    /// Aspect ratio of the offscreen targets, used for the projection.
    pub fn aspect(&self) -> f32 {
        self.framebuffers.aspect()
    }

    pub fn settings(&self) -> &BloomSettings {
        &self.settings
    }

    /// The geometry, bright, blur and combine programs, in pass order.
    pub fn programs(&self) -> [&ShaderProgram; 4] {
        let [bright, blur, combine] = self.bloom.programs();
        [self.geometry.program(), bright, blur, combine]
    }
}
