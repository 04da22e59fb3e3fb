//! The geometry pass: one PBR-shaded mesh into the two-output HDR target.
//!
//! # Bind groups
//!
//! - **Group 0**: [`SceneUniforms`] (matrices, camera position, time, lights)
//! - **Group 1**: the five material maps, each a texture at binding `2i` and its
//!   sampler at binding `2i + 1`, in [`MaterialSlot::ALL`] order
//!
//! # Outputs
//!
//! Location 0 receives the full shaded HDR color, location 1 the bright-only
//! color. Depth is tested and written against the HDR target's depth surface.

use crate::gpu::GpuContext;
use crate::mesh::{Mesh, Vertex3d};
use crate::render_graph::framebuffer::FramebufferGraph;
use crate::render_graph::render_target::{DEPTH_FORMAT, HDR_FORMAT};
use crate::render_graph::schedule::{GeometryOutput, SurfaceId};
use crate::scene::SceneUniforms;
use crate::shader::{ProgramDesc, ShaderProgram, ShaderSources, ShaderStage};
use crate::texture::{MaterialSlot, MaterialTextures};

pub struct GeometryPass {
    program: ShaderProgram,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    material_bind_group: wgpu::BindGroup,
}

impl GeometryPass {
    pub fn new(gpu: &GpuContext, sources: &ShaderSources, materials: &MaterialTextures) -> Self {
        let device = &gpu.device;

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Scene Uniforms"),
            size: std::mem::size_of::<SceneUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Scene Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Scene Bind Group"),
            layout: &uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let material_entries: Vec<_> = (0..MaterialSlot::ALL.len() as u32)
            .flat_map(|i| {
                [
                    wgpu::BindGroupLayoutEntry {
                        binding: 2 * i,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 2 * i + 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ]
            })
            .collect();

        let material_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Material Bind Group Layout"),
            entries: &material_entries,
        });

        let material_bind_group = Self::material_bind_group(gpu, &material_layout, materials);

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Geometry Pipeline Layout"),
            bind_group_layouts: &[&uniform_layout, &material_layout],
            push_constant_ranges: &[],
        });

        let color_target = Some(wgpu::ColorTargetState {
            format: HDR_FORMAT,
            blend: None,
            write_mask: wgpu::ColorWrites::ALL,
        });

        let program = ShaderProgram::build(
            gpu,
            sources,
            &ProgramDesc {
                label: "Geometry Program",
                vertex: ShaderStage::PbrVertex,
                fragment: ShaderStage::PbrFragment,
                layout: &pipeline_layout,
                buffers: &[Vertex3d::LAYOUT],
                targets: &[color_target.clone(), color_target],
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    cull_mode: Some(wgpu::Face::Back),
                    front_face: wgpu::FrontFace::Ccw,
                    ..Default::default()
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
            },
        );

        Self {
            program,
            uniform_buffer,
            uniform_bind_group,
            material_bind_group,
        }
    }

    fn material_bind_group(
        gpu: &GpuContext,
        layout: &wgpu::BindGroupLayout,
        materials: &MaterialTextures,
    ) -> wgpu::BindGroup {
        let entries: Vec<_> = MaterialSlot::ALL
            .iter()
            .enumerate()
            .flat_map(|(i, slot)| {
                let texture = materials.get(*slot);
                [
                    wgpu::BindGroupEntry {
                        binding: 2 * i as u32,
                        resource: wgpu::BindingResource::TextureView(&texture.view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2 * i as u32 + 1,
                        resource: wgpu::BindingResource::Sampler(&texture.sampler),
                    },
                ]
            })
            .collect();

        gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Material Bind Group"),
            layout,
            entries: &entries,
        })
    }

    pub fn program(&self) -> &ShaderProgram {
        &self.program
    }

    /// Upload this frame's uniforms. Must precede [`record`](Self::record) in the same submit.
    pub fn update(&self, gpu: &GpuContext, uniforms: &SceneUniforms) {
        gpu.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[*uniforms]));
    }

    /// Clear the HDR target and draw the mesh if there is one.
    pub fn record(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        framebuffers: &FramebufferGraph,
        mesh: Option<&Mesh>,
        clear_color: wgpu::Color,
    ) -> GeometryOutput {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Geometry Pass"),
            color_attachments: &[
                Some(wgpu::RenderPassColorAttachment {
                    view: framebuffers.view(SurfaceId::HdrScene),
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                }),
                Some(wgpu::RenderPassColorAttachment {
                    view: framebuffers.view(SurfaceId::HdrBright),
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                }),
            ],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &framebuffers.hdr.depth.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        let drew_mesh = match (self.program.pipeline(), mesh) {
            (Some(pipeline), Some(mesh)) => {
                render_pass.set_pipeline(pipeline);
                render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
                render_pass.set_bind_group(1, &self.material_bind_group, &[]);
                mesh.draw(&mut render_pass);
                true
            }
            _ => false,
        };

        GeometryOutput {
            scene: SurfaceId::HdrScene,
            bright: SurfaceId::HdrBright,
            drew_mesh,
        }
    }
}
