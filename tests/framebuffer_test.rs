mod common;

use pbr_bloom::render_graph::{
    DEPTH_FORMAT, FramebufferGraph, HDR_FORMAT, PingPongSlot, SurfaceId,
};
use pbr_bloom::{
    BloomSettings, FrameInputs, FrameRenderer, HEADLESS_FORMAT, Mat4, MaterialTextures,
    SceneUniforms, ShaderSources, Vec3,
};

const COLOR_SURFACES: [SurfaceId; 4] = [
    SurfaceId::HdrScene,
    SurfaceId::HdrBright,
    SurfaceId::PingPong(PingPongSlot::First),
    SurfaceId::PingPong(PingPongSlot::Second),
];

#[test]
fn surfaces_match_requested_size() {
    let Some(gpu) = common::headless(320, 180) else {
        return;
    };

    let graph = FramebufferGraph::new(&gpu, 320, 180);

    assert!(graph.completeness().is_complete(), "{:?}", graph.completeness());
    assert_eq!(graph.color_size(), (320, 180));
    for id in COLOR_SURFACES {
        let surface = graph.surface(id);
        assert_eq!(surface.size(), (320, 180), "{id:?}");
        assert_eq!(surface.format(), HDR_FORMAT, "{id:?}");
        assert!(
            surface
                .usage()
                .contains(wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING),
            "{id:?}"
        );
    }
    assert_eq!(graph.hdr.depth.size(), (320, 180));
    assert_eq!(graph.hdr.depth.format(), DEPTH_FORMAT);
}

#[test]
fn aspect_follows_target_not_window() {
    let Some(gpu) = common::headless(64, 64) else {
        return;
    };

    let graph = FramebufferGraph::new(&gpu, 256, 144);
    assert!((graph.aspect() - 16.0 / 9.0).abs() < 1e-5);
}

#[test]
fn oversized_graph_is_reported_incomplete() {
    let Some(gpu) = common::headless(64, 64) else {
        return;
    };

    let too_wide = gpu.device.limits().max_texture_dimension_2d + 1;
    let graph = FramebufferGraph::new(&gpu, too_wide, 4);
    assert!(!graph.completeness().is_complete());
}

#[test]
fn oversized_renderer_only_clears_the_output() {
    let Some(gpu) = common::headless(64, 64) else {
        return;
    };

    let clear = wgpu::Color {
        r: 1.0,
        g: 0.0,
        b: 0.0,
        a: 1.0,
    };
    let too_wide = gpu.device.limits().max_texture_dimension_2d + 1;
    let sources = ShaderSources::load(common::shader_dir());
    let materials = MaterialTextures::load(&gpu, "no/such/resources");
    let renderer = FrameRenderer::new(
        &gpu,
        &sources,
        &materials,
        HEADLESS_FORMAT,
        (too_wide, 4),
        BloomSettings::default(),
        clear,
    );
    assert!(!renderer.framebuffers().completeness().is_complete());

    let output = common::output_texture(&gpu, 64, 64);
    let view = output.create_view(&wgpu::TextureViewDescriptor::default());
    let frame = renderer.render(
        &gpu,
        &FrameInputs {
            uniforms: SceneUniforms::new(
                Mat4::IDENTITY,
                Mat4::IDENTITY,
                Mat4::IDENTITY,
                Vec3::ZERO,
                0.0,
            ),
            mesh: None,
        },
        &view,
    );

    assert!(!frame.geometry.drew_mesh);
    assert_eq!(frame.blur.passes, 0);
    let presented = common::read_rgba8(&gpu, &output);
    assert_eq!(presented[0], [255, 0, 0, 255]);
}
