mod common;

use pbr_bloom::render_graph::{PingPongSlot, final_blur_slot};
use pbr_bloom::{
    BloomSettings, CameraSettings, FlyCamera, FrameInputs, FrameRenderer, HEADLESS_FORMAT,
    MODEL_FILE, MaterialTextures, Mesh, MeshData, SceneParams, SceneUniforms, ShaderSources,
    ShaderStage, SurfaceId, Vertex3d,
};

const SIZE: u32 = 64;

/// Positions are taken as clip coordinates directly.
const PASS_THROUGH_VERTEX: &str = r#"
struct VertexOutput {
    @builtin(position) clip_position: vec4f,
    @location(0) uv: vec2f,
}

@vertex
fn vs_main(@location(0) position: vec3f, @location(2) uv: vec2f) -> VertexOutput {
    var out: VertexOutput;
    out.clip_position = vec4f(position, 1.0);
    out.uv = uv;
    return out;
}
"#;

/// Unlit albedo into both attachments.
const ALBEDO_FRAGMENT: &str = r#"
@group(1) @binding(0) var albedo_map: texture_2d<f32>;
@group(1) @binding(1) var albedo_sampler: sampler;

struct FragmentOutput {
    @location(0) color: vec4f,
    @location(1) bright: vec4f,
}

@fragment
fn fs_main(@location(0) uv: vec2f) -> FragmentOutput {
    let albedo = textureSample(albedo_map, albedo_sampler, uv);
    var out: FragmentOutput;
    out.color = vec4f(albedo.rgb, 1.0);
    out.bright = vec4f(albedo.rgb, 1.0);
    return out;
}
"#;

/// Albedo scaled well above the bright threshold.
const HDR_FRAGMENT: &str = r#"
@group(1) @binding(0) var albedo_map: texture_2d<f32>;
@group(1) @binding(1) var albedo_sampler: sampler;

struct FragmentOutput {
    @location(0) color: vec4f,
    @location(1) bright: vec4f,
}

@fragment
fn fs_main(@location(0) uv: vec2f) -> FragmentOutput {
    let hdr = textureSample(albedo_map, albedo_sampler, uv).rgb * 4.0;
    var out: FragmentOutput;
    out.color = vec4f(hdr, 1.0);
    out.bright = vec4f(hdr, 1.0);
    return out;
}
"#;

fn triangle() -> MeshData {
    let n = [0.0, 0.0, 1.0];
    MeshData {
        vertices: vec![
            Vertex3d::new([-0.5, -0.5, 0.5], n, [0.0, 0.0]),
            Vertex3d::new([0.5, -0.5, 0.5], n, [1.0, 0.0]),
            Vertex3d::new([0.0, 0.5, 0.5], n, [0.5, 1.0]),
        ],
        indices: vec![0, 1, 2],
    }
}

fn pixel<T: Copy>(pixels: &[T], x: u32, y: u32) -> T {
    pixels[(y * SIZE + x) as usize]
}

fn identity_uniforms() -> SceneUniforms {
    SceneUniforms::new(
        glam::Mat4::IDENTITY,
        glam::Mat4::IDENTITY,
        glam::Mat4::IDENTITY,
        glam::Vec3::ZERO,
        0.0,
    )
}

#[test]
fn triangle_covers_center_and_leaves_background() {
    let Some(gpu) = common::headless(SIZE, SIZE) else {
        return;
    };

    let sources = ShaderSources::load(common::shader_dir())
        .with_source(ShaderStage::PbrVertex, PASS_THROUGH_VERTEX)
        .with_source(ShaderStage::PbrFragment, ALBEDO_FRAGMENT);
    // No maps on disk: every slot is the white fallback.
    let materials = MaterialTextures::load(&gpu, "no/such/resources");
    let renderer = FrameRenderer::new(
        &gpu,
        &sources,
        &materials,
        HEADLESS_FORMAT,
        (SIZE, SIZE),
        BloomSettings::default().blur_passes(0),
        wgpu::Color::BLACK,
    );
    let mesh = Mesh::new(&gpu, &triangle());
    let output = common::output_texture(&gpu, SIZE, SIZE);
    let view = output.create_view(&wgpu::TextureViewDescriptor::default());

    let frame = renderer.render(
        &gpu,
        &FrameInputs {
            uniforms: identity_uniforms(),
            mesh: Some(&mesh),
        },
        &view,
    );
    assert!(frame.geometry.drew_mesh);

    let scene = common::read_rgba16f(&gpu, &renderer.framebuffers().hdr.scene.texture);
    common::assert_close(pixel(&scene, SIZE / 2, SIZE / 2), [1.0, 1.0, 1.0, 1.0]);
    common::assert_close(pixel(&scene, 0, 0), [0.0, 0.0, 0.0, 1.0]);
    common::assert_close(pixel(&scene, SIZE - 1, SIZE - 1), [0.0, 0.0, 0.0, 1.0]);

    // With no blur the background stays black and the tone-mapped center saturates.
    let presented = common::read_rgba8(&gpu, &output);
    assert_eq!(pixel(&presented, SIZE / 2, SIZE / 2), [255, 255, 255, 255]);
    assert_eq!(pixel(&presented, 0, 0), [0, 0, 0, 255]);
}

#[test]
fn bright_triangle_bleeds_past_its_edge() {
    let Some(gpu) = common::headless(SIZE, SIZE) else {
        return;
    };

    let sources = ShaderSources::load(common::shader_dir())
        .with_source(ShaderStage::PbrVertex, PASS_THROUGH_VERTEX)
        .with_source(ShaderStage::PbrFragment, HDR_FRAGMENT);
    let materials = MaterialTextures::load(&gpu, "no/such/resources");
    let renderer = FrameRenderer::new(
        &gpu,
        &sources,
        &materials,
        HEADLESS_FORMAT,
        (SIZE, SIZE),
        BloomSettings::default().blur_passes(2),
        wgpu::Color::BLACK,
    );
    let mesh = Mesh::new(&gpu, &triangle());
    let output = common::output_texture(&gpu, SIZE, SIZE);
    let view = output.create_view(&wgpu::TextureViewDescriptor::default());

    let frame = renderer.render(
        &gpu,
        &FrameInputs {
            uniforms: identity_uniforms(),
            mesh: Some(&mesh),
        },
        &view,
    );
    let blurred = SurfaceId::PingPong(final_blur_slot(2));
    assert_eq!(frame.blur.blurred, blurred);

    // The base of the triangle is the row boundary at y = 48; (32, 50) lies
    // just below it and (2, 2) is far from every edge.
    let (near_x, near_y) = (SIZE / 2, 50);
    let scene = common::read_rgba16f(&gpu, &renderer.framebuffers().hdr.scene.texture);
    common::assert_close(pixel(&scene, SIZE / 2, SIZE / 2), [4.0, 4.0, 4.0, 1.0]);
    common::assert_close(pixel(&scene, near_x, near_y), [0.0, 0.0, 0.0, 1.0]);

    let bloom = common::read_rgba16f(&gpu, &renderer.framebuffers().surface(blurred).texture);
    let spilled = pixel(&bloom, near_x, near_y);
    assert!(spilled[0] > 0.05, "no bloom below the edge: {spilled:?}");
    assert!(pixel(&bloom, 2, 2)[0].abs() < 1e-3);

    let presented = common::read_rgba8(&gpu, &output);
    let background = pixel(&presented, near_x, near_y);
    assert!(background[0] > 0, "bloom missing from output: {background:?}");
    assert_eq!(pixel(&presented, 2, 2), [0, 0, 0, 255]);
}

#[test]
fn full_frame_with_bundled_assets() {
    let Some(gpu) = common::headless(SIZE, SIZE) else {
        return;
    };

    let sources = ShaderSources::load(common::shader_dir());
    let materials = MaterialTextures::load(&gpu, common::resource_dir());
    let settings = BloomSettings::default();
    let passes = settings.blur_passes;
    let renderer = FrameRenderer::new(
        &gpu,
        &sources,
        &materials,
        HEADLESS_FORMAT,
        (SIZE, SIZE),
        settings,
        wgpu::Color::BLACK,
    );
    for program in renderer.programs() {
        assert!(program.is_valid(), "{} failed to build", program.label());
    }

    let data = MeshData::load(common::resource_dir().join(MODEL_FILE)).expect("bundled model");
    let mesh = Mesh::new(&gpu, &data);
    let camera = FlyCamera::new(CameraSettings::default());
    let uniforms = SceneUniforms::new(
        camera.projection_matrix(renderer.aspect()),
        camera.view_matrix(),
        SceneParams::default().model_matrix(0.0),
        camera.position,
        0.0,
    );
    let output = common::output_texture(&gpu, SIZE, SIZE);
    let view = output.create_view(&wgpu::TextureViewDescriptor::default());

    let frame = renderer.render(
        &gpu,
        &FrameInputs {
            uniforms,
            mesh: Some(&mesh),
        },
        &view,
    );

    assert!(frame.geometry.drew_mesh);
    assert_eq!(frame.bright.bright, SurfaceId::PingPong(PingPongSlot::First));
    assert_eq!(frame.blur.passes, passes);
    assert_eq!(
        frame.blur.blurred,
        SurfaceId::PingPong(final_blur_slot(passes))
    );
    assert_eq!(frame.blur.blurred, SurfaceId::PingPong(PingPongSlot::Second));
}

#[test]
fn missing_mesh_only_clears() {
    let Some(gpu) = common::headless(SIZE, SIZE) else {
        return;
    };

    let clear = wgpu::Color {
        r: 0.25,
        g: 0.5,
        b: 0.75,
        a: 1.0,
    };
    let sources = ShaderSources::load(common::shader_dir());
    let materials = MaterialTextures::load(&gpu, "no/such/resources");
    let renderer = FrameRenderer::new(
        &gpu,
        &sources,
        &materials,
        HEADLESS_FORMAT,
        (SIZE, SIZE),
        BloomSettings::default().blur_passes(2),
        clear,
    );
    let output = common::output_texture(&gpu, SIZE, SIZE);
    let view = output.create_view(&wgpu::TextureViewDescriptor::default());

    let frame = renderer.render(
        &gpu,
        &FrameInputs {
            uniforms: identity_uniforms(),
            mesh: None,
        },
        &view,
    );

    assert!(!frame.geometry.drew_mesh);
    assert_eq!(frame.blur.blurred, SurfaceId::PingPong(PingPongSlot::First));
    let scene = common::read_rgba16f(&gpu, &renderer.framebuffers().hdr.scene.texture);
    common::assert_close(pixel(&scene, 10, 50), [0.25, 0.5, 0.75, 1.0]);
}

#[test]
fn broken_shader_source_skips_pass_without_panicking() {
    let Some(gpu) = common::headless(SIZE, SIZE) else {
        return;
    };

    let sources = ShaderSources::load(common::shader_dir())
        .with_source(ShaderStage::BrightExtract, "fn fs_main( -> not wgsl")
        .with_source(ShaderStage::PbrFragment, "");
    let materials = MaterialTextures::load(&gpu, "no/such/resources");
    let renderer = FrameRenderer::new(
        &gpu,
        &sources,
        &materials,
        HEADLESS_FORMAT,
        (SIZE, SIZE),
        BloomSettings::default().blur_passes(3),
        wgpu::Color::BLACK,
    );

    let [geometry, bright, blur, combine] = renderer.programs();
    assert!(!geometry.is_valid());
    assert!(!bright.is_valid());
    assert!(blur.is_valid());
    assert!(combine.is_valid());

    let mesh = Mesh::new(&gpu, &triangle());
    let output = common::output_texture(&gpu, SIZE, SIZE);
    let view = output.create_view(&wgpu::TextureViewDescriptor::default());
    let frame = renderer.render(
        &gpu,
        &FrameInputs {
            uniforms: identity_uniforms(),
            mesh: Some(&mesh),
        },
        &view,
    );

    assert!(!frame.geometry.drew_mesh);
    assert_eq!(frame.blur.blurred, SurfaceId::PingPong(final_blur_slot(3)));
}
