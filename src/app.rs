//! Windowed application shell.
//!
//! Wraps the winit event loop around a [`Manager`] and [`Router`]: window
//! events feed the input tracker and manager, and every redraw runs the
//! user's frame closure, applies navigation, advances the scene, and renders.

use std::sync::Arc;
use std::time::Instant;
use winit::application::ApplicationHandler;
use winit::error::EventLoopError;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowAttributes, WindowId};

use crate::input::Input;
use crate::router::Router;
use crate::scene::{Manager, Registry, RouteTable};

/// Configuration for the app window.
pub struct AppConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Path applied before the first frame.
    pub initial_path: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "Backdrop".to_string(),
            width: 1280,
            height: 720,
            initial_path: "/".to_string(),
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

    pub fn initial_path(mut self, path: impl Into<String>) -> Self {
        self.initial_path = path.into();
        self
    }
}

/// Context provided to the frame closure each redraw.
pub struct Frame<'a> {
    /// Keyboard state for this frame.
    pub input: &'a Input,
    /// The scene manager, for camera zooms or direct scene access.
    pub manager: &'a mut Manager,
    /// Total elapsed time in seconds.
    pub time: f32,
    /// Delta time since last frame in seconds.
    pub dt: f32,
    router: &'a mut Router,
}

impl Frame<'_> {
    /// Request navigation to a path; applied after the frame closure returns.
    pub fn navigate(&mut self, path: &str) {
        self.router.navigate(path);
    }

    /// The most recently requested path.
    pub fn path(&self) -> &str {
        self.router.path()
    }

    /// Current frames per second.
    pub fn fps(&self) -> f32 {
        if self.dt > 0.0 { 1.0 / self.dt } else { 0.0 }
    }
}

/// Run a backdrop application with the default window configuration.
pub fn run<S, F>(routes: RouteTable, registry: Registry, setup: S) -> Result<(), EventLoopError>
where
    S: FnOnce(&mut Manager) -> F + 'static,
    F: FnMut(&mut Frame) + 'static,
{
    run_with_config(AppConfig::default(), routes, registry, setup)
}

/// Run a backdrop application.
///
/// `setup` receives the manager once the window and GPU exist, and returns
/// the closure invoked every frame.
pub fn run_with_config<S, F>(
    config: AppConfig,
    routes: RouteTable,
    registry: Registry,
    setup: S,
) -> Result<(), EventLoopError>
where
    S: FnOnce(&mut Manager) -> F + 'static,
    F: FnMut(&mut Frame) + 'static,
{
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = BackdropApp::Pending {
        config,
        manager: Some(Manager::new(routes, registry)),
        setup: Some(Box::new(move |manager| Box::new(setup(manager)))),
    };

    event_loop.run_app(&mut app)
}

type SetupFn = Box<dyn FnOnce(&mut Manager) -> Box<dyn FnMut(&mut Frame)>>;

enum BackdropApp {
    Pending {
        config: AppConfig,
        manager: Option<Manager>,
        setup: Option<SetupFn>,
    },
    Running {
        window: Arc<Window>,
        manager: Manager,
        router: Router,
        input: Input,
        frame_fn: Box<dyn FnMut(&mut Frame)>,
        start_time: Instant,
        last_frame: Instant,
    },
}

impl ApplicationHandler for BackdropApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if let BackdropApp::Pending {
            config,
            manager,
            setup,
        } = self
        {
            let window_attrs = WindowAttributes::default()
                .with_title(&config.title)
                .with_inner_size(winit::dpi::LogicalSize::new(config.width, config.height));

            let window = match event_loop.create_window(window_attrs) {
                Ok(window) => Arc::new(window),
                Err(e) => {
                    log::error!("failed to create window: {e}");
                    event_loop.exit();
                    return;
                }
            };

            let (Some(mut manager), Some(setup_fn)) = (manager.take(), setup.take()) else {
                return;
            };
            if let Err(e) = manager.init(window.clone()) {
                log::error!("GPU initialisation failed: {e}");
                event_loop.exit();
                return;
            }

            let frame_fn = setup_fn(&mut manager);
            let router = Router::new(&config.initial_path);

            *self = BackdropApp::Running {
                window,
                manager,
                router,
                input: Input::new(),
                frame_fn,
                start_time: Instant::now(),
                last_frame: Instant::now(),
            };
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let BackdropApp::Running {
            window,
            manager,
            router,
            input,
            frame_fn,
            start_time,
            last_frame,
        } = self
        else {
            return;
        };

        if let Some((key, pressed)) = input.handle_event(&event) {
            manager.key_event(key, pressed);
        }

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                manager.resize(size.width, size.height);
            }
            WindowEvent::RedrawRequested => {
                let now = Instant::now();
                let time = start_time.elapsed().as_secs_f32();
                let dt = now.duration_since(*last_frame).as_secs_f32();
                *last_frame = now;

                let mut frame = Frame {
                    input,
                    manager,
                    time,
                    dt,
                    router,
                };
                frame_fn(&mut frame);

                // Navigation failures keep the shared loop alive: the world
                // and any previous page stay up, only the new page is absent.
                if let Err(e) = router.tick(dt, manager) {
                    log::error!("navigation failed: {e}");
                }
                if let Err(e) = manager.update(dt) {
                    log::error!("page load failed: {e}");
                }
                manager.render();

                input.begin_frame();
                window.request_redraw();
            }
            _ => {}
        }
    }
}
