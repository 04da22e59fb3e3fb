use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use winit::application::ApplicationHandler;
use winit::event::{MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::KeyCode;
use winit::window::{Window, WindowAttributes, WindowId};

use crate::camera::{CameraSettings, FlyCamera};
use crate::geometry::MeshData;
use crate::gpu::GpuContext;
use crate::input::{HeldKeys, InputEvent, InputQueue};
use crate::mesh::Mesh;
use crate::post_process::BloomSettings;
use crate::render_graph::{FrameInputs, FrameRenderer};
use crate::scene::{SceneParams, SceneUniforms};
use crate::shader::ShaderSources;
use crate::texture::MaterialTextures;

/// Model file looked up inside [`AppConfig::resource_dir`].
pub const MODEL_FILE: &str = "model.obj";

/// Configuration for the demo window and scene.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Directory holding the six WGSL sources.
    pub shader_dir: PathBuf,
    /// Directory holding the model and the material maps.
    pub resource_dir: PathBuf,
    pub clear_color: wgpu::Color,
    pub camera: CameraSettings,
    pub scene: SceneParams,
    pub bloom: BloomSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "PBR Bloom".to_string(),
            width: 2560,
            height: 1440,
            shader_dir: PathBuf::from("shaders"),
            resource_dir: PathBuf::from("resources"),
            clear_color: wgpu::Color::BLACK,
            camera: CameraSettings::default(),
            scene: SceneParams::default(),
            bloom: BloomSettings::default(),
        }
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn shader_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.shader_dir = dir.into();
        self
    }

    pub fn resource_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.resource_dir = dir.into();
        self
    }

    pub fn clear_color(mut self, color: wgpu::Color) -> Self {
        self.clear_color = color;
        self
    }

    pub fn camera(mut self, camera: CameraSettings) -> Self {
        self.camera = camera;
        self
    }

    pub fn scene(mut self, scene: SceneParams) -> Self {
        self.scene = scene;
        self
    }

    pub fn bloom(mut self, bloom: BloomSettings) -> Self {
        self.bloom = bloom;
        self
    }
}

/// Open the window and run the render loop until it closes.
///
/// Returns an error if the window or the GPU could not be set up. Missing
/// assets and broken shaders are logged and rendered around instead.
///
/// # Example
/// ```ignore
/// pbr_bloom::run(AppConfig::new().size(1280, 720))?;
/// ```
pub fn run(config: AppConfig) -> anyhow::Result<()> {
    let event_loop = EventLoop::new().context("failed to create event loop")?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = DemoApp::Pending {
        config: Some(config),
    };
    event_loop.run_app(&mut app).context("event loop error")?;

    match app {
        DemoApp::Failed(e) => Err(e),
        _ => Ok(()),
    }
}

/// Everything alive while the window is open.
struct Running {
    window: Arc<Window>,
    gpu: GpuContext,
    renderer: FrameRenderer,
    mesh: Option<Mesh>,
    camera: FlyCamera,
    scene: SceneParams,
    input: InputQueue,
    held: HeldKeys,
    start_time: Instant,
    last_frame: Instant,
}

enum DemoApp {
    Pending { config: Option<AppConfig> },
    Running(Box<Running>),
    Failed(anyhow::Error),
}

impl Running {
    fn start(event_loop: &ActiveEventLoop, config: AppConfig) -> anyhow::Result<Self> {
        let window_attrs = WindowAttributes::default()
            .with_title(&config.title)
            .with_inner_size(winit::dpi::LogicalSize::new(config.width, config.height))
            .with_resizable(false);

        let window = Arc::new(
            event_loop
                .create_window(window_attrs)
                .context("failed to create window")?,
        );
        let gpu = GpuContext::new(window.clone()).context("failed to initialize GPU")?;

        let sources = ShaderSources::load(&config.shader_dir);
        let materials = MaterialTextures::load(&gpu, &config.resource_dir);

        let model_path = config.resource_dir.join(MODEL_FILE);
        let mesh = match MeshData::load(&model_path) {
            Ok(data) => Some(Mesh::new(&gpu, &data)),
            Err(e) => {
                log::error!("model unavailable, drawing nothing: {e}");
                None
            }
        };

        let renderer = FrameRenderer::new(
            &gpu,
            &sources,
            &materials,
            gpu.config.format,
            (gpu.width(), gpu.height()),
            config.bloom,
            config.clear_color,
        );

        let now = Instant::now();
        Ok(Self {
            window,
            gpu,
            renderer,
            mesh,
            camera: FlyCamera::new(config.camera),
            scene: config.scene,
            input: InputQueue::new(),
            held: HeldKeys::default(),
            start_time: now,
            last_frame: now,
        })
    }

    /// Apply queued input. Returns false once the user asked to quit.
    fn process_input(&mut self) -> bool {
        let mut keep_running = true;
        for event in self.input.drain() {
            keep_running &= apply_input(event, &mut self.camera, &mut self.held);
        }
        keep_running
    }

    fn redraw(&mut self) {
        let now = Instant::now();
        let time = self.start_time.elapsed().as_secs_f32();
        let dt = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;

        self.camera.integrate(&self.held, dt);

        let uniforms = SceneUniforms::new(
            self.camera.projection_matrix(self.renderer.aspect()),
            self.camera.view_matrix(),
            self.scene.model_matrix(time),
            self.camera.position,
            time,
        );

        let Some(frame) = self.gpu.acquire_frame() else {
            return;
        };
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.renderer.render(
            &self.gpu,
            &FrameInputs {
                uniforms,
                mesh: self.mesh.as_ref(),
            },
            &view,
        );

        self.window.pre_present_notify();
        frame.present();
    }
}

/// Route one event to the camera or the held-key set. Returns false for Escape.
fn apply_input(event: InputEvent, camera: &mut FlyCamera, held: &mut HeldKeys) -> bool {
    match event {
        InputEvent::Key {
            key: KeyCode::Escape,
            pressed: true,
        } => return false,
        InputEvent::Key { key, pressed: true } => held.press(key),
        InputEvent::Key {
            key,
            pressed: false,
        } => held.release(key),
        InputEvent::MouseButton {
            button: MouseButton::Right,
            pressed,
        } => camera.set_drag(pressed),
        InputEvent::MouseButton { .. } => {}
        InputEvent::CursorMoved { x, y } => camera.cursor_moved(x, y),
        InputEvent::Scroll { delta } => camera.scroll(delta),
    }
    true
}

impl ApplicationHandler for DemoApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let DemoApp::Pending { config } = self else {
            return;
        };
        let Some(config) = config.take() else {
            return;
        };

        match Running::start(event_loop, config) {
            Ok(running) => {
                running.window.request_redraw();
                *self = DemoApp::Running(Box::new(running));
            }
            Err(e) => {
                log::error!("{e:#}");
                *self = DemoApp::Failed(e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let DemoApp::Running(app) = self else {
            return;
        };

        if app.input.handle_event(&event) {
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                app.gpu.resize(size.width, size.height);
            }
            WindowEvent::RedrawRequested => {
                if !app.process_input() {
                    event_loop.exit();
                    return;
                }
                app.redraw();
                app.window.request_redraw();
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_demo() {
        let config = AppConfig::default();
        assert_eq!((config.width, config.height), (2560, 1440));
        assert_eq!(config.shader_dir, PathBuf::from("shaders"));
        assert_eq!(config.resource_dir, PathBuf::from("resources"));
        assert_eq!(config.clear_color, wgpu::Color::BLACK);
        assert_eq!(config.bloom.blur_passes, 15);
    }

    #[test]
    fn builder_overrides_fields() {
        let config = AppConfig::new()
            .title("t")
            .size(640, 360)
            .shader_dir("s")
            .resource_dir("r")
            .bloom(BloomSettings::default().blur_passes(4));
        assert_eq!(config.title, "t");
        assert_eq!((config.width, config.height), (640, 360));
        assert_eq!(config.shader_dir, PathBuf::from("s"));
        assert_eq!(config.resource_dir, PathBuf::from("r"));
        assert_eq!(config.bloom.blur_passes, 4);
    }

    fn drive(events: impl IntoIterator<Item = InputEvent>) -> (bool, FlyCamera, HeldKeys) {
        let mut queue = InputQueue::new();
        for event in events {
            queue.push(event);
        }
        let mut camera = FlyCamera::new(CameraSettings::default());
        let mut held = HeldKeys::default();
        let mut keep_running = true;
        for event in queue.drain() {
            keep_running &= apply_input(event, &mut camera, &mut held);
        }
        (keep_running, camera, held)
    }

    #[test]
    fn escape_press_quits() {
        let (keep_running, _, held) = drive([InputEvent::Key {
            key: KeyCode::Escape,
            pressed: true,
        }]);
        assert!(!keep_running);
        assert!(!held.is_down(KeyCode::Escape));

        let (keep_running, _, _) = drive([InputEvent::Key {
            key: KeyCode::Escape,
            pressed: false,
        }]);
        assert!(keep_running);
    }

    #[test]
    fn keys_are_held_until_released() {
        let (keep_running, _, held) = drive([
            InputEvent::Key {
                key: KeyCode::KeyW,
                pressed: true,
            },
            InputEvent::Key {
                key: KeyCode::KeyA,
                pressed: true,
            },
            InputEvent::Key {
                key: KeyCode::KeyA,
                pressed: false,
            },
        ]);
        assert!(keep_running);
        assert!(held.is_down(KeyCode::KeyW));
        assert!(!held.is_down(KeyCode::KeyA));
    }

    #[test]
    fn only_right_button_drives_drag() {
        let (_, camera, _) = drive([InputEvent::MouseButton {
            button: MouseButton::Left,
            pressed: true,
        }]);
        assert!(!camera.is_dragging());

        let (_, camera, _) = drive([InputEvent::MouseButton {
            button: MouseButton::Right,
            pressed: true,
        }]);
        assert!(camera.is_dragging());

        let (_, camera, _) = drive([
            InputEvent::MouseButton {
                button: MouseButton::Right,
                pressed: true,
            },
            InputEvent::MouseButton {
                button: MouseButton::Right,
                pressed: false,
            },
        ]);
        assert!(!camera.is_dragging());
    }

    #[test]
    fn cursor_turns_camera_only_while_dragging() {
        let start = FlyCamera::new(CameraSettings::default()).yaw();
        let moves = [
            InputEvent::CursorMoved { x: 100.0, y: 100.0 },
            InputEvent::CursorMoved { x: 140.0, y: 100.0 },
        ];

        let (_, idle, _) = drive(moves);
        assert_eq!(idle.yaw(), start);

        let drag = InputEvent::MouseButton {
            button: MouseButton::Right,
            pressed: true,
        };
        let (_, dragged, _) = drive(std::iter::once(drag).chain(moves));
        assert!(dragged.yaw() > start);
    }

    #[test]
    fn scroll_changes_fov() {
        let start = FlyCamera::new(CameraSettings::default()).fov();
        let (_, camera, _) = drive([InputEvent::Scroll { delta: 1.0 }]);
        assert!(camera.fov() < start);
    }

    #[test]
    fn bundled_model_loads() {
        let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("resources")
            .join(MODEL_FILE);
        let data = MeshData::load(path).expect("bundled model");
        assert!(data.triangle_count() > 0);
    }
}
