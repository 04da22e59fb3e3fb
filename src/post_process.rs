//! Screen-space bloom passes: bright extraction, separable blur, combine.
//!
//! Every pass draws the shared [`ScreenQuad`] and samples its inputs through
//! one bind group layout (texture at binding 0, sampler at binding 1). A bind
//! group exists for each offscreen color surface, so a pass binds whatever
//! [`SurfaceId`] the previous pass reported writing.

use crate::gpu::GpuContext;
use crate::mesh::{QuadVertex, ScreenQuad};
use crate::render_graph::framebuffer::FramebufferGraph;
use crate::render_graph::render_target::HDR_FORMAT;
use crate::render_graph::schedule::{
    BRIGHT_PASS_SLOT, BlurOutput, BrightPassOutput, PingPongSlot, SurfaceId, blur_schedule,
};
use crate::shader::{ProgramDesc, ShaderProgram, ShaderSources, ShaderStage};

/// Tuning of the bloom chain.
#[derive(Clone, Debug)]
pub struct BloomSettings {
    /// Number of 1D blur passes; alternates horizontal and vertical.
    pub blur_passes: u32,
    pub exposure: f32,
    pub bloom_intensity: f32,
    /// Luminance above which the bright pass keeps a pixel.
    pub threshold: f32,
}

impl Default for BloomSettings {
    fn default() -> Self {
        Self {
            blur_passes: 15,
            exposure: 8.0,
            bloom_intensity: 8.2,
            threshold: 1.0,
        }
    }
}

impl BloomSettings {
    pub fn blur_passes(mut self, passes: u32) -> Self {
        self.blur_passes = passes;
        self
    }

    pub fn exposure(mut self, exposure: f32) -> Self {
        self.exposure = exposure;
        self
    }

    pub fn bloom_intensity(mut self, intensity: f32) -> Self {
        self.bloom_intensity = intensity;
        self
    }
}

const SAMPLED_SURFACES: [SurfaceId; 4] = [
    SurfaceId::HdrScene,
    SurfaceId::HdrBright,
    SurfaceId::PingPong(PingPongSlot::First),
    SurfaceId::PingPong(PingPongSlot::Second),
];

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct BrightUniforms {
    pub threshold: f32,
    pub _padding: [f32; 3],
}

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct BlurUniforms {
    /// Size of one texel in uv units.
    pub texel_size: [f32; 2],
    /// 1 for a horizontal pass, 0 for vertical.
    pub horizontal: u32,
    pub _padding: u32,
}

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CombineUniforms {
    pub exposure: f32,
    pub bloom_intensity: f32,
    pub _padding: [f32; 2],
}

pub struct BloomPasses {
    bright_program: ShaderProgram,
    blur_program: ShaderProgram,
    combine_program: ShaderProgram,
    /// One per color surface, in `SAMPLED_SURFACES` order.
    sampled: [wgpu::BindGroup; 4],
    bright_params: wgpu::BindGroup,
    /// Indexed by `horizontal as usize`.
    blur_params: [wgpu::BindGroup; 2],
    combine_params: wgpu::BindGroup,
}

impl BloomPasses {
    pub fn new(
        gpu: &GpuContext,
        sources: &ShaderSources,
        framebuffers: &FramebufferGraph,
        output_format: wgpu::TextureFormat,
        settings: &BloomSettings,
    ) -> Self {
        use wgpu::util::DeviceExt;

        let device = &gpu.device;

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Bloom Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Sampled Surface Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let params_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Bloom Params Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        // Surfaces of an incomplete graph are invalid; the frame renderer never
        // records with these groups then.
        let (sampled, scope_error) = gpu.with_validation_scope(|device| {
            SAMPLED_SURFACES.map(|id| {
                device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some(&format!("{} Bind Group", framebuffers.surface(id).label())),
                    layout: &texture_layout,
                    entries: &[
                        wgpu::BindGroupEntry {
                            binding: 0,
                            resource: wgpu::BindingResource::TextureView(framebuffers.view(id)),
                        },
                        wgpu::BindGroupEntry {
                            binding: 1,
                            resource: wgpu::BindingResource::Sampler(&sampler),
                        },
                    ],
                })
            })
        });
        if let Some(error) = scope_error {
            log::warn!("offscreen surfaces cannot be sampled: {error}");
        }

        // Uniform contents never change after creation, so each value gets its own buffer.
        let params = |label: &str, contents: &[u8]| {
            let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents,
                usage: wgpu::BufferUsages::UNIFORM,
            });
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(label),
                layout: &params_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                }],
            })
        };

        let (width, height) = framebuffers.color_size();
        let texel_size = [1.0 / width.max(1) as f32, 1.0 / height.max(1) as f32];
        let blur_uniforms = |horizontal: bool| BlurUniforms {
            texel_size,
            horizontal: horizontal as u32,
            _padding: 0,
        };

        let bright_params = params(
            "Bright Params",
            bytemuck::bytes_of(&BrightUniforms {
                threshold: settings.threshold,
                _padding: [0.0; 3],
            }),
        );
        let blur_params = [
            params("Vertical Blur Params", bytemuck::bytes_of(&blur_uniforms(false))),
            params("Horizontal Blur Params", bytemuck::bytes_of(&blur_uniforms(true))),
        ];
        let combine_params = params(
            "Combine Params",
            bytemuck::bytes_of(&CombineUniforms {
                exposure: settings.exposure,
                bloom_intensity: settings.bloom_intensity,
                _padding: [0.0; 2],
            }),
        );

        let single_input_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Single Input Pipeline Layout"),
            bind_group_layouts: &[&texture_layout, &params_layout],
            push_constant_ranges: &[],
        });
        let combine_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Combine Pipeline Layout"),
            bind_group_layouts: &[&texture_layout, &texture_layout, &params_layout],
            push_constant_ranges: &[],
        });

        let quad_program = |label: &str,
                            fragment: ShaderStage,
                            layout: &wgpu::PipelineLayout,
                            format: wgpu::TextureFormat| {
            ShaderProgram::build(
                gpu,
                sources,
                &ProgramDesc {
                    label,
                    vertex: ShaderStage::QuadVertex,
                    fragment,
                    layout,
                    buffers: &[QuadVertex::LAYOUT],
                    targets: &[Some(wgpu::ColorTargetState {
                        format,
                        blend: None,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    primitive: wgpu::PrimitiveState {
                        topology: wgpu::PrimitiveTopology::TriangleList,
                        ..Default::default()
                    },
                    depth_stencil: None,
                },
            )
        };

        let bright_program = quad_program(
            "Bright Extract Program",
            ShaderStage::BrightExtract,
            &single_input_layout,
            HDR_FORMAT,
        );
        let blur_program = quad_program(
            "Gaussian Blur Program",
            ShaderStage::GaussianBlur,
            &single_input_layout,
            HDR_FORMAT,
        );
        let combine_program = quad_program(
            "Bloom Combine Program",
            ShaderStage::BloomCombine,
            &combine_layout,
            output_format,
        );

        Self {
            bright_program,
            blur_program,
            combine_program,
            sampled,
            bright_params,
            blur_params,
            combine_params,
        }
    }

    fn sampled(&self, id: SurfaceId) -> &wgpu::BindGroup {
        let index = match id {
            SurfaceId::HdrScene => 0,
            SurfaceId::HdrBright => 1,
            SurfaceId::PingPong(slot) => 2 + slot.index(),
        };
        &self.sampled[index]
    }

    pub fn programs(&self) -> [&ShaderProgram; 3] {
        [&self.bright_program, &self.blur_program, &self.combine_program]
    }

    /// Extract bright pixels from `input` into the first ping-pong surface.
    pub fn bright_pass(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        framebuffers: &FramebufferGraph,
        quad: &ScreenQuad,
        input: SurfaceId,
    ) -> BrightPassOutput {
        let output = SurfaceId::PingPong(BRIGHT_PASS_SLOT);
        self.quad_pass(
            encoder,
            "Bright Extract Pass",
            framebuffers.view(output),
            wgpu::Color::TRANSPARENT,
            &self.bright_program,
            &[self.sampled(input), &self.bright_params],
            quad,
        );
        BrightPassOutput { bright: output }
    }

    /// Run `passes` alternating 1D blurs starting from `input`.
    pub fn blur(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        framebuffers: &FramebufferGraph,
        quad: &ScreenQuad,
        input: SurfaceId,
        passes: u32,
    ) -> BlurOutput {
        let mut current = input;
        for step in blur_schedule(passes) {
            debug_assert_eq!(current, SurfaceId::PingPong(step.source));
            let destination = SurfaceId::PingPong(step.destination);
            debug_assert_ne!(current, destination);

            self.quad_pass(
                encoder,
                if step.horizontal {
                    "Horizontal Blur Pass"
                } else {
                    "Vertical Blur Pass"
                },
                framebuffers.view(destination),
                wgpu::Color::TRANSPARENT,
                &self.blur_program,
                &[
                    self.sampled(current),
                    &self.blur_params[step.horizontal as usize],
                ],
                quad,
            );
            current = destination;
        }
        BlurOutput {
            blurred: current,
            passes,
        }
    }

    /// Tone-map `scene` plus `bloom` into the caller's target.
    pub fn combine(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        quad: &ScreenQuad,
        scene: SurfaceId,
        bloom: SurfaceId,
        target: &wgpu::TextureView,
        clear_color: wgpu::Color,
    ) {
        self.quad_pass(
            encoder,
            "Bloom Combine Pass",
            target,
            clear_color,
            &self.combine_program,
            &[self.sampled(scene), self.sampled(bloom), &self.combine_params],
            quad,
        );
    }

    #[allow(clippy::too_many_arguments)]
    fn quad_pass(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        label: &str,
        target: &wgpu::TextureView,
        clear_color: wgpu::Color,
        program: &ShaderProgram,
        bind_groups: &[&wgpu::BindGroup],
        quad: &ScreenQuad,
    ) {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(label),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(clear_color),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        let Some(pipeline) = program.pipeline() else {
            return;
        };
        render_pass.set_pipeline(pipeline);
        for (index, bind_group) in bind_groups.iter().enumerate() {
            render_pass.set_bind_group(index as u32, *bind_group, &[]);
        }
        quad.draw(&mut render_pass);
    }
}
