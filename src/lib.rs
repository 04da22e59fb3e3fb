//! # PBR Bloom
//!
//! **A single physically based mesh, lit by two moving lights, with HDR bloom.**
//!
//! Every frame renders the mesh into a two-output HDR target, extracts its
//! bright parts, blurs them with a separable Gaussian over a ping-pong pair and
//! tone-maps scene plus bloom onto the window.
//!
//! ## Quick Start
//!
//! ```no_run
//! use pbr_bloom::*;
//!
//! fn main() -> anyhow::Result<()> {
//!     run(AppConfig::new()
//!         .size(1280, 720)
//!         .bloom(BloomSettings::default().blur_passes(10)))
//! }
//! ```
//!
//! The WGSL sources are read from `shaders/` and the model and material maps
//! from `resources/`, both relative to the working directory.
//!
//! ## Controls
//!
//! - **W / A / S / D**: move along the view direction and its right vector
//! - **E / Q**: move up and down
//! - **Right mouse drag**: look around
//! - **Scroll**: zoom (field of view)
//! - **Escape**: quit

mod app;
mod camera;
mod geometry;
mod gpu;
mod input;
mod mesh;
mod mesh_pass;
mod post_process;
pub mod render_graph;
mod scene;
mod shader;
mod texture;

pub use app::{AppConfig, MODEL_FILE, run};
pub use camera::{CameraSettings, FlyCamera};
pub use geometry::{GeometryError, MeshData};
pub use gpu::{GpuContext, GpuError, HEADLESS_FORMAT};
pub use input::{HeldKeys, InputEvent, InputQueue};
pub use mesh::{Mesh, QUAD_VERTICES, QuadVertex, ScreenQuad, Vertex3d};
pub use mesh_pass::GeometryPass;
pub use post_process::{BloomPasses, BloomSettings};
pub use render_graph::{FrameInputs, FrameOutput, FrameRenderer, FramebufferGraph, SurfaceId};
pub use scene::{PointLight, SceneParams, SceneUniforms, lights_at};
pub use shader::{ProgramDesc, ShaderProgram, ShaderSources, ShaderStage};
pub use texture::{
    ColorSpace, MaterialSet, MaterialSlot, MaterialTextures, Texture, TextureData, TextureError,
};

// Re-export glam math types for convenience
pub use glam::{Mat4, Vec2, Vec3};

// Re-export commonly used winit types for convenience
pub use winit::event::MouseButton;
pub use winit::keyboard::KeyCode;
