//! Core GPU context and device management.
//!
//! [`GpuContext`] owns the wgpu adapter, device and queue, plus the window
//! surface when there is one. It is created once at startup and passed by
//! reference to every builder and pass in the crate.
//!
//! # Initialization
//!
//! Two constructors exist:
//!
//! - [`GpuContext::new`] creates a surface for a winit [`Window`] and configures
//!   it with an sRGB format and FIFO (vsync) presentation.
//! - [`GpuContext::headless`] skips the surface entirely. The configuration still
//!   records an output format and size so offscreen rendering code can treat
//!   both cases the same way. Integration tests use this.
//!
//! Failure to create the surface, adapter or device is returned as a
//! [`GpuError`]; callers treat it as fatal.
//!
//! [`Window`]: winit::window::Window

use std::sync::Arc;
use winit::window::Window;

/// Output format used when rendering without a window.
pub const HEADLESS_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

/// Errors raised while bringing up the GPU. All of them are fatal.
#[derive(Debug, thiserror::Error)]
pub enum GpuError {
    #[error("failed to create window surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),
    #[error("no suitable GPU adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),
    #[error("failed to create GPU device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),
    #[error("window surface reports no supported formats")]
    NoSurfaceFormat,
}

/// Core GPU context holding wgpu resources.
///
/// All fields are public to allow direct access to wgpu APIs when needed.
pub struct GpuContext {
    /// The surface for presenting rendered frames, absent when headless.
    pub surface: Option<wgpu::Surface<'static>>,
    /// The adapter the device was created from. Kept for format capability queries.
    pub adapter: wgpu::Adapter,
    /// The logical GPU device for creating resources and pipelines.
    pub device: wgpu::Device,
    /// The command queue for submitting work to the GPU.
    pub queue: wgpu::Queue,
    /// Current output configuration (format, size, present mode).
    pub config: wgpu::SurfaceConfiguration,
}

impl GpuContext {
    /// Create a new GPU context presenting to a winit window.
    ///
    /// This performs all wgpu initialization:
    /// 1. Creates a wgpu instance with primary backends (Vulkan, Metal, DX12)
    /// 2. Creates a surface for the window
    /// 3. Requests an adapter compatible with that surface
    /// 4. Creates the logical device and command queue
    /// 5. Configures the surface with an sRGB format and Fifo present mode
    pub fn new(window: Arc<Window>) -> Result<Self, GpuError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window)?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))?;
        log::info!("using adapter {:?}", adapter.get_info().name);

        let (device, queue) = Self::request_device(&adapter)?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or(GpuError::NoSurfaceFormat)?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);
        log::info!(
            "surface configured: {:?} {}x{}",
            config.format,
            config.width,
            config.height
        );

        Ok(Self {
            surface: Some(surface),
            adapter,
            device,
            queue,
            config,
        })
    }

    /// Create a GPU context with no window surface.
    ///
    /// The stored configuration uses [`HEADLESS_FORMAT`] and the given size; it
    /// is never applied to a surface.
    pub fn headless(width: u32, height: u32) -> Result<Self, GpuError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: None,
            force_fallback_adapter: false,
        }))?;
        log::info!("using headless adapter {:?}", adapter.get_info().name);

        let (device, queue) = Self::request_device(&adapter)?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: HEADLESS_FORMAT,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: wgpu::CompositeAlphaMode::Auto,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        Ok(Self {
            surface: None,
            adapter,
            device,
            queue,
            config,
        })
    }

    fn request_device(adapter: &wgpu::Adapter) -> Result<(wgpu::Device, wgpu::Queue), GpuError> {
        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("PBR Bloom Device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default().using_resolution(adapter.limits()),
            memory_hints: Default::default(),
            trace: Default::default(),
            experimental_features: Default::default(),
        }))?;
        Ok((device, queue))
    }

    /// Reconfigure the surface for new dimensions.
    ///
    /// Zero-sized dimensions (minimized window) are ignored. Offscreen targets
    /// keep the size they were created with.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.config.width = width;
            self.config.height = height;
            if let Some(surface) = &self.surface {
                surface.configure(&self.device, &self.config);
            }
        }
    }

    /// Acquire the next swapchain image.
    ///
    /// Returns `None` when there is no surface or the frame has to be skipped.
    /// A lost or outdated surface is reconfigured so the next frame can succeed.
    pub fn acquire_frame(&self) -> Option<wgpu::SurfaceTexture> {
        let surface = self.surface.as_ref()?;
        match surface.get_current_texture() {
            Ok(frame) => Some(frame),
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::warn!("surface lost or outdated, reconfiguring");
                surface.configure(&self.device, &self.config);
                None
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::debug!("surface acquisition timed out, skipping frame");
                None
            }
            Err(e) => {
                log::error!("failed to acquire surface texture: {e}");
                None
            }
        }
    }

    /// Returns the current output width in pixels.
    pub fn width(&self) -> u32 {
        self.config.width
    }

    /// Returns the current output height in pixels.
    pub fn height(&self) -> u32 {
        self.config.height
    }

    /// Returns the current aspect ratio (width / height).
    pub fn aspect(&self) -> f32 {
        self.config.width as f32 / self.config.height as f32
    }

    /// Run `f` inside a validation error scope and return the captured error, if any.
    ///
    /// Used around shader, pipeline and render target creation so a bad resource is
    /// logged instead of reaching the device's uncaptured error handler.
    pub fn with_validation_scope<T>(
        &self,
        f: impl FnOnce(&wgpu::Device) -> T,
    ) -> (T, Option<wgpu::Error>) {
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let value = f(&self.device);
        let error = pollster::block_on(self.device.pop_error_scope());
        (value, error)
    }
}
