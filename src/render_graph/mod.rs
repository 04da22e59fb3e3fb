//! Offscreen targets and the fixed pass sequence of a frame.
//!
//! # Resources
//!
//! ```text
//! HDR target   ── scene color (Rgba16Float), bright color (Rgba16Float), depth
//! ping-pong    ── two Rgba16Float surfaces for the separable blur
//! ```
//!
//! All surfaces are created once at a fixed size by [`FramebufferGraph`].
//!
//! # Passes
//!
//! [`FrameRenderer::render`] runs geometry, bright extraction, `N` blur passes
//! and the tone-mapped combine. Passes hand each other [`SurfaceId`]s instead of
//! relying on index bookkeeping; [`blur_schedule`] and [`final_blur_slot`]
//! describe the ping-pong parity as plain data.

pub mod framebuffer;
mod graph;
pub mod render_target;
pub mod schedule;

pub use framebuffer::{AttachmentInfo, Completeness, FramebufferGraph, HdrTarget, PingPong};
pub use graph::{FrameInputs, FrameRenderer};
pub use render_target::{DEPTH_FORMAT, HDR_FORMAT, RenderSurface};
pub use schedule::{
    BlurOutput, BlurStep, BrightPassOutput, FrameOutput, GeometryOutput, PingPongSlot, SurfaceId,
    blur_schedule, final_blur_slot,
};
