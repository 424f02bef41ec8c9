//! Core GPU context and device management.
//!
//! [`GpuContext`] owns the wgpu surface, device, queue, and surface
//! configuration. It is created exactly once per process by
//! [`Manager::init`](crate::scene::Manager::init) and shared by reference (or
//! `Rc`) with everything that renders. All fields are public so advanced page
//! loaders can reach the raw wgpu API.

use std::sync::Arc;
use winit::window::Window;

/// Fatal initialisation failure.
///
/// There is no recovery path: if the GPU context cannot be built, rendering
/// cannot proceed and the backdrop stays absent.
#[derive(Debug)]
pub enum SetupError {
    /// The rendering surface could not be created for the window.
    Surface(wgpu::CreateSurfaceError),
    /// No suitable GPU adapter was found.
    Adapter(wgpu::RequestAdapterError),
    /// The logical device could not be created.
    Device(wgpu::RequestDeviceError),
}

impl std::fmt::Display for SetupError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SetupError::Surface(e) => write!(f, "failed to create surface: {}", e),
            SetupError::Adapter(e) => write!(f, "no suitable GPU adapter: {}", e),
            SetupError::Device(e) => write!(f, "failed to create device: {}", e),
        }
    }
}

impl std::error::Error for SetupError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SetupError::Surface(e) => Some(e),
            SetupError::Adapter(e) => Some(e),
            SetupError::Device(e) => Some(e),
        }
    }
}

impl From<wgpu::CreateSurfaceError> for SetupError {
    fn from(e: wgpu::CreateSurfaceError) -> Self {
        SetupError::Surface(e)
    }
}

impl From<wgpu::RequestAdapterError> for SetupError {
    fn from(e: wgpu::RequestAdapterError) -> Self {
        SetupError::Adapter(e)
    }
}

impl From<wgpu::RequestDeviceError> for SetupError {
    fn from(e: wgpu::RequestDeviceError) -> Self {
        SetupError::Device(e)
    }
}

/// Core GPU context holding wgpu resources.
///
/// Constructed once per process; the manager guarantees idempotence by
/// refusing to build a second one.
pub struct GpuContext {
    /// The surface for presenting rendered frames to the window.
    pub surface: wgpu::Surface<'static>,
    /// The logical GPU device for creating resources and pipelines.
    pub device: wgpu::Device,
    /// The command queue for submitting work to the GPU.
    pub queue: wgpu::Queue,
    /// Current surface configuration (format, size, present mode).
    pub config: wgpu::SurfaceConfiguration,
}

impl GpuContext {
    /// Create a new GPU context from a winit window.
    ///
    /// Performs instance creation, adapter selection, device/queue creation,
    /// and surface configuration with an sRGB format and Fifo present mode.
    pub fn new(window: Arc<Window>) -> Result<Self, SetupError> {
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

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("Backdrop Device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            memory_hints: Default::default(),
            trace: Default::default(),
            experimental_features: Default::default(),
        }))?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        Ok(Self {
            surface,
            device,
            queue,
            config,
        })
    }

    /// Resize the surface to new dimensions.
    ///
    /// Ignores zero-sized dimensions to avoid wgpu validation errors during
    /// window minimise.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.config.width = width;
            self.config.height = height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    /// Returns the current surface width in pixels.
    pub fn width(&self) -> u32 {
        self.config.width
    }

    /// Returns the current surface height in pixels.
    pub fn height(&self) -> u32 {
        self.config.height
    }

    /// Returns the current aspect ratio (width / height).
    pub fn aspect(&self) -> f32 {
        self.config.width as f32 / self.config.height as f32
    }
}
