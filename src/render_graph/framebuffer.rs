//! The offscreen resource graph: HDR target plus the ping-pong blur pair.
//!
//! All surfaces share one size, fixed when the graph is built. Creation runs
//! a completeness check (size limits, format capabilities, matching sizes)
//! and a validation error scope; problems are logged and the graph is still
//! returned.

use super::render_target::{HDR_FORMAT, RenderSurface};
use super::schedule::{PingPongSlot, SurfaceId};
use crate::gpu::GpuContext;

/// Geometry pass target: two color outputs and depth.
pub struct HdrTarget {
    pub scene: RenderSurface,
    pub bright: RenderSurface,
    pub depth: RenderSurface,
}

/// Two blur surfaces alternately read and written.
pub struct PingPong {
    surfaces: [RenderSurface; 2],
}

impl PingPong {
    pub fn get(&self, slot: PingPongSlot) -> &RenderSurface {
        &self.surfaces[slot.index()]
    }
}

/// What the completeness check needs to know about one attachment.
#[derive(Clone, Debug)]
pub struct AttachmentInfo {
    pub label: String,
    pub width: u32,
    pub height: u32,
    /// Format can be rendered to with the requested usage.
    pub renderable: bool,
    /// Format can be sampled (and filtered) by a later pass.
    pub sampleable: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Completeness {
    Complete,
    Incomplete(Vec<String>),
}

impl Completeness {
    pub fn is_complete(&self) -> bool {
        matches!(self, Completeness::Complete)
    }
}

/// Check a set of attachments that are meant to be used together.
pub fn check_attachments(attachments: &[AttachmentInfo], max_dimension: u32) -> Completeness {
    let mut problems = Vec::new();
    let expected = attachments.first().map(|a| (a.width, a.height));

    for a in attachments {
        if a.width == 0 || a.height == 0 {
            problems.push(format!("{} has zero size {}x{}", a.label, a.width, a.height));
        }
        if a.width > max_dimension || a.height > max_dimension {
            problems.push(format!(
                "{} size {}x{} exceeds device limit {}",
                a.label, a.width, a.height, max_dimension
            ));
        }
        if !a.renderable {
            problems.push(format!("{} format is not renderable", a.label));
        }
        if !a.sampleable {
            problems.push(format!("{} format is not sampleable", a.label));
        }
        if let Some(size) = expected {
            if (a.width, a.height) != size {
                problems.push(format!(
                    "{} size {}x{} differs from {}x{}",
                    a.label, a.width, a.height, size.0, size.1
                ));
            }
        }
    }

    if problems.is_empty() {
        Completeness::Complete
    } else {
        Completeness::Incomplete(problems)
    }
}

/// Owner of every offscreen surface used by a frame.
pub struct FramebufferGraph {
    pub hdr: HdrTarget,
    pub ping_pong: PingPong,
    completeness: Completeness,
}

impl FramebufferGraph {
    /// Allocate all surfaces at `width`×`height`.
    pub fn new(gpu: &GpuContext, width: u32, height: u32) -> Self {
        let (graph, scope_error) = gpu.with_validation_scope(|_| {
            let hdr = HdrTarget {
                scene: RenderSurface::color(gpu, "HDR Scene Color", HDR_FORMAT, width, height),
                bright: RenderSurface::color(gpu, "HDR Bright Color", HDR_FORMAT, width, height),
                depth: RenderSurface::depth(gpu, "HDR Depth", width, height),
            };
            let ping_pong = PingPong {
                surfaces: [
                    RenderSurface::color(gpu, "Ping-Pong 0", HDR_FORMAT, width, height),
                    RenderSurface::color(gpu, "Ping-Pong 1", HDR_FORMAT, width, height),
                ],
            };
            (hdr, ping_pong)
        });
        let (hdr, ping_pong) = graph;

        let max_dimension = gpu.device.limits().max_texture_dimension_2d;
        let hdr_check = check_attachments(
            &[
                describe(gpu, &hdr.scene),
                describe(gpu, &hdr.bright),
                describe_depth(gpu, &hdr.depth),
            ],
            max_dimension,
        );
        let ping_pong_check = check_attachments(
            &[
                describe(gpu, &ping_pong.surfaces[0]),
                describe(gpu, &ping_pong.surfaces[1]),
            ],
            max_dimension,
        );

        let mut problems = Vec::new();
        for check in [hdr_check, ping_pong_check] {
            if let Completeness::Incomplete(p) = check {
                problems.extend(p);
            }
        }
        if let Some(e) = scope_error {
            problems.push(format!("allocation failed: {e}"));
        }

        let completeness = if problems.is_empty() {
            log::info!("framebuffers ready: {width}x{height} {HDR_FORMAT:?}");
            Completeness::Complete
        } else {
            for p in &problems {
                log::error!("framebuffer incomplete: {p}");
            }
            Completeness::Incomplete(problems)
        };

        Self {
            hdr,
            ping_pong,
            completeness,
        }
    }

    pub fn surface(&self, id: SurfaceId) -> &RenderSurface {
        match id {
            SurfaceId::HdrScene => &self.hdr.scene,
            SurfaceId::HdrBright => &self.hdr.bright,
            SurfaceId::PingPong(slot) => self.ping_pong.get(slot),
        }
    }

    pub fn view(&self, id: SurfaceId) -> &wgpu::TextureView {
        &self.surface(id).view
    }

    /// Size of the HDR color attachment.
    pub fn color_size(&self) -> (u32, u32) {
        self.hdr.scene.size()
    }

    pub fn aspect(&self) -> f32 {
        let (w, h) = self.color_size();
        w as f32 / h.max(1) as f32
    }

    pub fn completeness(&self) -> &Completeness {
        &self.completeness
    }
}

fn describe(gpu: &GpuContext, surface: &RenderSurface) -> AttachmentInfo {
    let features = gpu.adapter.get_texture_format_features(surface.format());
    let (width, height) = surface.size();
    AttachmentInfo {
        label: surface.label().to_string(),
        width,
        height,
        renderable: features.allowed_usages.contains(surface.usage()),
        sampleable: features
            .flags
            .contains(wgpu::TextureFormatFeatureFlags::FILTERABLE),
    }
}

fn describe_depth(gpu: &GpuContext, surface: &RenderSurface) -> AttachmentInfo {
    let features = gpu.adapter.get_texture_format_features(surface.format());
    let (width, height) = surface.size();
    AttachmentInfo {
        label: surface.label().to_string(),
        width,
        height,
        renderable: features.allowed_usages.contains(surface.usage()),
        sampleable: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attachment(label: &str, width: u32, height: u32) -> AttachmentInfo {
        AttachmentInfo {
            label: label.to_string(),
            width,
            height,
            renderable: true,
            sampleable: true,
        }
    }

    #[test]
    fn matching_supported_attachments_are_complete() {
        let set = [attachment("a", 640, 360), attachment("b", 640, 360)];
        assert_eq!(check_attachments(&set, 8192), Completeness::Complete);
    }

    #[test]
    fn mismatched_sizes_are_incomplete() {
        let set = [attachment("a", 640, 360), attachment("b", 320, 180)];
        assert!(!check_attachments(&set, 8192).is_complete());
    }

    #[test]
    fn zero_and_oversized_surfaces_are_incomplete() {
        assert!(!check_attachments(&[attachment("a", 0, 10)], 8192).is_complete());
        assert!(!check_attachments(&[attachment("a", 9000, 10)], 8192).is_complete());
    }

    #[test]
    fn unsupported_format_is_reported() {
        let mut a = attachment("hdr", 64, 64);
        a.sampleable = false;
        match check_attachments(&[a], 8192) {
            Completeness::Incomplete(problems) => {
                assert_eq!(problems.len(), 1);
                assert!(problems[0].contains("sampleable"));
            }
            Completeness::Complete => panic!("expected incomplete"),
        }
    }
}
