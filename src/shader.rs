//! WGSL sources loaded from disk and the render programs built from them.
//!
//! Sources are read once at startup. A missing or empty file is logged and
//! kept as an empty string, so every program that needs it fails to build.
//! Building a program runs inside a validation error scope: on failure the
//! diagnostic is logged and the program carries no pipeline, and passes that
//! use it skip their draw.

use std::fs;
use std::path::Path;

use crate::gpu::GpuContext;

/// The six source files of the renderer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    PbrVertex,
    PbrFragment,
    QuadVertex,
    BrightExtract,
    GaussianBlur,
    BloomCombine,
}

impl ShaderStage {
    pub const ALL: [ShaderStage; 6] = [
        ShaderStage::PbrVertex,
        ShaderStage::PbrFragment,
        ShaderStage::QuadVertex,
        ShaderStage::BrightExtract,
        ShaderStage::GaussianBlur,
        ShaderStage::BloomCombine,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            ShaderStage::PbrVertex => "pbr_vertex.wgsl",
            ShaderStage::PbrFragment => "pbr_fragment.wgsl",
            ShaderStage::QuadVertex => "quad_vertex.wgsl",
            ShaderStage::BrightExtract => "bright_extract.wgsl",
            ShaderStage::GaussianBlur => "gaussian_blur.wgsl",
            ShaderStage::BloomCombine => "bloom_combine.wgsl",
        }
    }

    /// Entry point name inside the file.
    pub fn entry_point(self) -> &'static str {
        match self {
            ShaderStage::PbrVertex | ShaderStage::QuadVertex => "vs_main",
            _ => "fs_main",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Text of every shader stage.
#[derive(Clone, Debug, Default)]
pub struct ShaderSources {
    sources: [String; 6],
}

impl ShaderSources {
    /// Read all six files from `dir`.
    pub fn load(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        let mut sources = Self::default();
        for stage in ShaderStage::ALL {
            let path = dir.join(stage.file_name());
            match fs::read_to_string(&path) {
                Ok(text) if text.trim().is_empty() => {
                    log::error!("shader source {} is empty", path.display());
                }
                Ok(text) => sources.sources[stage.index()] = text,
                Err(e) => log::error!("shader source {} not found: {e}", path.display()),
            }
        }
        sources
    }

    /// Replace one stage's source text.
    pub fn with_source(mut self, stage: ShaderStage, source: impl Into<String>) -> Self {
        self.sources[stage.index()] = source.into();
        self
    }

    pub fn get(&self, stage: ShaderStage) -> &str {
        &self.sources[stage.index()]
    }

    pub fn is_empty(&self, stage: ShaderStage) -> bool {
        self.get(stage).trim().is_empty()
    }
}

/// Fixed-function state and layout for one program.
pub struct ProgramDesc<'a> {
    pub label: &'a str,
    pub vertex: ShaderStage,
    pub fragment: ShaderStage,
    pub layout: &'a wgpu::PipelineLayout,
    pub buffers: &'a [wgpu::VertexBufferLayout<'a>],
    pub targets: &'a [Option<wgpu::ColorTargetState>],
    pub primitive: wgpu::PrimitiveState,
    pub depth_stencil: Option<wgpu::DepthStencilState>,
}

/// A render pipeline that may have failed to build.
pub struct ShaderProgram {
    label: String,
    pipeline: Option<wgpu::RenderPipeline>,
}

impl ShaderProgram {
    pub fn build(gpu: &GpuContext, sources: &ShaderSources, desc: &ProgramDesc) -> Self {
        let label = desc.label.to_string();

        for stage in [desc.vertex, desc.fragment] {
            if sources.is_empty(stage) {
                log::error!(
                    "{label}: cannot link, {} source is empty or missing",
                    stage.file_name()
                );
                return Self {
                    label,
                    pipeline: None,
                };
            }
        }

        let (pipeline, error) = gpu.with_validation_scope(|device| {
            let vertex = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(desc.vertex.file_name()),
                source: wgpu::ShaderSource::Wgsl(sources.get(desc.vertex).into()),
            });
            let fragment = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(desc.fragment.file_name()),
                source: wgpu::ShaderSource::Wgsl(sources.get(desc.fragment).into()),
            });

            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(desc.label),
                layout: Some(desc.layout),
                vertex: wgpu::VertexState {
                    module: &vertex,
                    entry_point: Some(desc.vertex.entry_point()),
                    buffers: desc.buffers,
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &fragment,
                    entry_point: Some(desc.fragment.entry_point()),
                    targets: desc.targets,
                    compilation_options: Default::default(),
                }),
                primitive: desc.primitive,
                depth_stencil: desc.depth_stencil.clone(),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            })
        });

        match error {
            Some(e) => {
                log::error!("{label}: program failed to build:\n{e}");
                Self {
                    label,
                    pipeline: None,
                }
            }
            None => {
                log::debug!("{label}: program built");
                Self {
                    label,
                    pipeline: Some(pipeline),
                }
            }
        }
    }

    pub fn pipeline(&self) -> Option<&wgpu::RenderPipeline> {
        self.pipeline.as_ref()
    }

    pub fn is_valid(&self) -> bool {
        self.pipeline.is_some()
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_file_names_are_distinct() {
        let mut names: Vec<_> = ShaderStage::ALL.iter().map(|s| s.file_name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 6);
    }

    #[test]
    fn missing_directory_yields_empty_sources() {
        let sources = ShaderSources::load("no/such/shader/dir");
        for stage in ShaderStage::ALL {
            assert!(sources.is_empty(stage));
        }
    }

    #[test]
    fn bundled_sources_are_present() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("shaders");
        let sources = ShaderSources::load(dir);
        for stage in ShaderStage::ALL {
            assert!(!sources.is_empty(stage), "{} is empty", stage.file_name());
            assert!(sources.get(stage).contains(stage.entry_point()));
        }
    }

    #[test]
    fn with_source_overrides_one_stage() {
        let sources = ShaderSources::default().with_source(ShaderStage::QuadVertex, "x");
        assert_eq!(sources.get(ShaderStage::QuadVertex), "x");
        assert!(sources.is_empty(ShaderStage::BloomCombine));
    }
}
