//! The scene lifecycle manager.
//!
//! One [`Manager`] owns the whole 3D backdrop for the lifetime of the
//! process: the shared scene graph, camera, tween registry, and GPU context.
//! Navigation maps URL paths to page keys through the route table, loads the
//! matching page asynchronously, and tears the previous page down with a
//! deep disposal pass so GPU resources never leak across navigations.
//!
//! Page loads are plain local futures driven from the frame loop. A load
//! superseded by a newer navigation is cancelled cooperatively: its token is
//! set, it is moved to the stale list, and it keeps getting polled until it
//! resolves so whatever partial subtree it built can be reclaimed.

use crate::anim::{Tween, TweenTarget, Tweens};
use crate::assets::{LoadingTracker, TextureLoader};
use crate::camera::Camera;
use crate::dispose::dispose_subtree;
use crate::geometry::Geometry;
use crate::gpu::{GpuContext, SetupError};
use crate::graph::{Mesh, NodeId, SceneGraph};
use crate::material::{Blend, Color, Material};
use crate::render::MeshRenderer;
use crate::scene::page::{
    CancelToken, Disposer, LoadError, LoadFuture, PageContext, Updater,
};
use crate::scene::routes::{Registry, RouteTable};
use glam::{Quat, Vec3};
use std::cell::RefCell;
use std::collections::HashSet;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::rc::Rc;
use std::sync::Arc;
use std::task::{Context, Poll, Waker};
use winit::keyboard::KeyCode;
use winit::window::Window;

/// Upper bound on the per-frame delta fed to updaters and tweens, so a
/// backgrounded tab or debugger pause does not produce one giant step.
pub const MAX_FRAME_DELTA: f32 = 0.05;

/// Angular speed of the WASD world rotation, radians per second.
const WORLD_ROTATE_SPEED: f32 = 0.25;

const STAR_COUNT: usize = 1500;
const STAR_RADIUS: f32 = 900.0;

/// Monotonic clock tracking total elapsed time and clamped frame deltas.
struct FrameClock {
    elapsed: f32,
}

impl FrameClock {
    fn new() -> Self {
        Self { elapsed: 0.0 }
    }

    /// Advance by a raw frame delta, returning `(dt, elapsed)` where `dt`
    /// is clamped to [`MAX_FRAME_DELTA`]. Elapsed time accumulates the raw
    /// delta so wall-clock-based animation stays in sync.
    fn advance(&mut self, raw: f32) -> (f32, f32) {
        let raw = raw.max(0.0);
        self.elapsed += raw;
        (raw.min(MAX_FRAME_DELTA), self.elapsed)
    }
}

/// Handle to a registered per-frame updater.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UpdaterId(u64);

/// A page load in flight.
struct PendingLoad {
    key: String,
    token: CancelToken,
    fut: LoadFuture,
}

/// Singleton owner of the backdrop: scene graph, camera, renderer, and the
/// current page's lifecycle.
pub struct Manager {
    graph: Rc<RefCell<SceneGraph>>,
    camera: Rc<RefCell<Camera>>,
    tweens: Rc<RefCell<Tweens>>,
    tracker: Rc<LoadingTracker>,
    textures: Rc<TextureLoader>,
    gpu: Option<Rc<RefCell<GpuContext>>>,
    renderer: Option<MeshRenderer>,

    /// Persistent root rotated by WASD input; holds shared world content.
    world: NodeId,
    /// Persistent root page subtrees attach under.
    page_layer: NodeId,

    clock: FrameClock,
    keys: Rc<RefCell<HashSet<KeyCode>>>,

    routes: RouteTable,
    registry: Registry,

    current_key: Option<String>,
    current_dispose: Option<Disposer>,
    page_updater: Option<UpdaterId>,
    updaters: Vec<(UpdaterId, Updater)>,
    next_updater: u64,

    pending: Option<PendingLoad>,
    /// Superseded loads still being driven so their subtrees get reclaimed.
    stale: Vec<PendingLoad>,
}

impl Manager {
    /// Build a manager with the persistent world content in place.
    ///
    /// No GPU work happens here; [`Manager::init`] attaches the window and
    /// renderer later. Everything else — navigation, updates, disposal — is
    /// fully functional headless.
    pub fn new(routes: RouteTable, registry: Registry) -> Self {
        let graph = Rc::new(RefCell::new(SceneGraph::new()));
        let camera = Rc::new(RefCell::new(Camera::new()));
        let tweens = Rc::new(RefCell::new(Tweens::new()));
        let tracker = Rc::new(LoadingTracker::new());
        let textures = Rc::new(TextureLoader::new(tracker.clone()));
        let keys = Rc::new(RefCell::new(HashSet::new()));

        let (world, page_layer) = {
            let mut g = graph.borrow_mut();
            let world = g.spawn("world");
            let page_layer = g.spawn("pages");
            let stars = g.spawn_child(world, "starfield");
            if let Some(node) = g.get_mut(stars) {
                node.mesh = Some(Mesh::new(
                    Rc::new(Geometry::points(&star_positions())),
                    Rc::new(Material {
                        color: Color::rgb(0.9, 0.92, 1.0),
                        unlit: true,
                        blend: Blend::Additive,
                        ..Material::new()
                    }),
                ));
            }
            (world, page_layer)
        };

        let mut manager = Self {
            graph,
            camera,
            tweens,
            tracker,
            textures,
            gpu: None,
            renderer: None,
            world,
            page_layer,
            clock: FrameClock::new(),
            keys: keys.clone(),
            routes,
            registry,
            current_key: None,
            current_dispose: None,
            page_updater: None,
            updaters: Vec::new(),
            next_updater: 0,
            pending: None,
            stale: Vec::new(),
        };

        // Stable updater: WASD rotates the world root. Registered up front
        // so it outlives every page.
        let graph = manager.graph.clone();
        manager.add_updater(Box::new(move |dt, _t| {
            let keys = keys.borrow();
            let mut pitch = 0.0;
            let mut yaw = 0.0;
            if keys.contains(&KeyCode::KeyW) {
                pitch -= WORLD_ROTATE_SPEED * dt;
            }
            if keys.contains(&KeyCode::KeyS) {
                pitch += WORLD_ROTATE_SPEED * dt;
            }
            if keys.contains(&KeyCode::KeyA) {
                yaw -= WORLD_ROTATE_SPEED * dt;
            }
            if keys.contains(&KeyCode::KeyD) {
                yaw += WORLD_ROTATE_SPEED * dt;
            }
            if pitch != 0.0 || yaw != 0.0 {
                let mut g = graph.borrow_mut();
                if let Some(node) = g.get_mut(world) {
                    node.transform.rotation = Quat::from_euler(glam::EulerRot::XYZ, pitch, yaw, 0.0)
                        * node.transform.rotation;
                }
            }
        }));

        manager
    }

    /// Attach the window and build the GPU context and renderer.
    ///
    /// Idempotent: callers re-running their boot path cannot create a second
    /// context, the first one wins.
    pub fn init(&mut self, window: Arc<Window>) -> Result<(), SetupError> {
        if self.gpu.is_some() {
            return Ok(());
        }
        let gpu = GpuContext::new(window)?;
        self.camera
            .borrow_mut()
            .set_aspect(gpu.width(), gpu.height());
        self.renderer = Some(MeshRenderer::new(&gpu));
        self.gpu = Some(Rc::new(RefCell::new(gpu)));
        Ok(())
    }

    /// Navigate to the page for a URL path.
    ///
    /// Re-navigating to the current page (or to the page already loading) is
    /// a no-op. Otherwise the current page is unloaded first, then the new
    /// page's loader starts; it gets driven once immediately so synchronous
    /// loaders finish within this call.
    pub fn load_for_path(&mut self, path: &str) -> Result<(), LoadError> {
        let key = self.routes.key_for(path).to_string();

        if self.pending.as_ref().is_some_and(|p| p.key == key) {
            return Ok(());
        }
        if self.pending.is_none() && self.current_key.as_deref() == Some(key.as_str()) {
            return Ok(());
        }

        self.unload_current();

        let Some(loader) = self.registry.loader(&key) else {
            log::warn!("no page registered for key '{key}', showing world only");
            self.current_key = Some(key);
            return Ok(());
        };

        log::info!("loading page '{key}'");
        let token = CancelToken::new();
        let ctx = PageContext {
            graph: self.graph.clone(),
            parent: self.page_layer,
            camera: self.camera.clone(),
            gpu: self.gpu.clone(),
            textures: self.textures.clone(),
            tracker: self.tracker.clone(),
            tweens: self.tweens.clone(),
            cancelled: token.clone(),
        };
        let fut = loader(ctx);
        self.pending = Some(PendingLoad { key, token, fut });

        self.drive_loads()
    }

    /// Tear down the current page and cancel any load in flight.
    ///
    /// Runs the page's disposer (a panicking disposer is logged and
    /// swallowed), kills its tweens, deep-disposes its subtree, and then
    /// sweeps anything still parented under the page layer.
    pub fn unload_current(&mut self) {
        if let Some(p) = self.pending.take() {
            p.token.cancel();
            self.stale.push(p);
        }

        if let Some(id) = self.page_updater.take() {
            self.remove_updater(id);
        }

        if let Some(mut dispose) = self.current_dispose.take() {
            if catch_unwind(AssertUnwindSafe(|| dispose())).is_err() {
                log::warn!("page disposer panicked during unload, continuing teardown");
            }
        }

        // Defensive sweep: reclaim anything a page parented under the page
        // layer without reporting it through its load result.
        let orphans = self.graph.borrow().children_of(self.page_layer);
        for child in orphans {
            let ids = self.graph.borrow().collect_subtree(child);
            self.tweens.borrow_mut().kill_targeting(&ids);
            dispose_subtree(&mut self.graph.borrow_mut(), child);
        }

        self.current_key = None;
    }

    /// Key of the page currently shown, if any.
    pub fn current_key(&self) -> Option<&str> {
        self.current_key.as_deref()
    }

    /// True while a page load is in flight.
    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    /// Register a per-frame updater. Updaters run in registration order and
    /// receive `(dt, elapsed)` seconds.
    pub fn add_updater(&mut self, updater: Updater) -> UpdaterId {
        let id = UpdaterId(self.next_updater);
        self.next_updater += 1;
        self.updaters.push((id, updater));
        id
    }

    /// Remove an updater. Unknown ids are ignored.
    pub fn remove_updater(&mut self, id: UpdaterId) {
        self.updaters.retain(|(uid, _)| *uid != id);
    }

    /// Glide the camera to a position. Concurrent requests retarget the same
    /// tween, so the last call wins.
    pub fn zoom_to(&mut self, position: Vec3, duration: f32, delay: f32) {
        self.tweens.borrow_mut().add(
            Tween::new(TweenTarget::CameraPosition, position, duration).delay(delay),
        );
    }

    /// Record a keyboard state change for the world-rotation controls.
    pub fn key_event(&mut self, key: KeyCode, pressed: bool) {
        let mut keys = self.keys.borrow_mut();
        if pressed {
            keys.insert(key);
        } else {
            keys.remove(&key);
        }
    }

    /// Propagate a window resize to the surface and the camera.
    pub fn resize(&mut self, width: u32, height: u32) {
        if let Some(gpu) = &self.gpu {
            gpu.borrow_mut().resize(width, height);
        }
        self.camera.borrow_mut().set_aspect(width, height);
    }

    /// Advance one frame: drive loads, run updaters, step tweens.
    pub fn update(&mut self, raw_dt: f32) -> Result<(), LoadError> {
        let (dt, elapsed) = self.clock.advance(raw_dt);

        self.drive_loads()?;

        for (_, updater) in self.updaters.iter_mut() {
            updater(dt, elapsed);
        }

        self.tweens.borrow_mut().update(
            dt,
            &mut self.graph.borrow_mut(),
            &mut self.camera.borrow_mut(),
        );
        Ok(())
    }

    /// Render the current frame. No-op until [`Manager::init`] has run.
    pub fn render(&mut self) {
        if let (Some(gpu), Some(renderer)) = (&self.gpu, &mut self.renderer) {
            renderer.render(
                &gpu.borrow(),
                &self.graph.borrow(),
                &self.camera.borrow(),
                self.clock.elapsed,
            );
        }
    }

    /// Poll the pending and stale load futures once each.
    fn drive_loads(&mut self) -> Result<(), LoadError> {
        let waker = Waker::noop();
        let mut cx = Context::from_waker(waker);

        // Stale loads are driven to completion so their partial subtrees can
        // be reclaimed; their results never attach.
        let mut still_stale = Vec::new();
        for mut load in self.stale.drain(..) {
            match load.fut.as_mut().poll(&mut cx) {
                Poll::Pending => still_stale.push(load),
                Poll::Ready(Ok(mut result)) => {
                    if let Some(mut dispose) = result.dispose.take() {
                        if catch_unwind(AssertUnwindSafe(|| dispose())).is_err() {
                            log::warn!(
                                "disposer of cancelled page '{}' panicked",
                                load.key
                            );
                        }
                    }
                    let ids = self.graph.borrow().collect_subtree(result.root);
                    self.tweens.borrow_mut().kill_targeting(&ids);
                    dispose_subtree(&mut self.graph.borrow_mut(), result.root);
                }
                Poll::Ready(Err(e)) => {
                    log::debug!("cancelled page '{}' failed to load: {e}", load.key);
                }
            }
        }
        self.stale = still_stale;

        let Some(mut load) = self.pending.take() else {
            return Ok(());
        };
        match load.fut.as_mut().poll(&mut cx) {
            Poll::Pending => {
                self.pending = Some(load);
                Ok(())
            }
            Poll::Ready(Ok(result)) => {
                self.finish_load(load.key, result);
                Ok(())
            }
            Poll::Ready(Err(e)) => {
                log::error!("page '{}' failed to load: {e}", load.key);
                Err(e)
            }
        }
    }

    /// Attach a finished page: parent its root, register its updater, and
    /// compose the disposer that will tear it down on the next navigation.
    fn finish_load(&mut self, key: String, result: crate::scene::page::LoadResult) {
        let root = result.root;
        self.graph.borrow_mut().attach(self.page_layer, root);

        if let Some(updater) = result.updater {
            self.page_updater = Some(self.add_updater(updater));
        }

        let mut module_dispose = result.dispose;
        let graph = self.graph.clone();
        let tweens = self.tweens.clone();
        self.current_dispose = Some(Box::new(move || {
            if let Some(dispose) = module_dispose.as_mut() {
                if catch_unwind(AssertUnwindSafe(|| dispose())).is_err() {
                    log::warn!("page disposer panicked, continuing subtree teardown");
                }
            }
            let ids = graph.borrow().collect_subtree(root);
            tweens.borrow_mut().kill_targeting(&ids);
            dispose_subtree(&mut graph.borrow_mut(), root);
        }));

        log::info!("page '{key}' ready");
        self.current_key = Some(key);
    }

    #[cfg(test)]
    pub(crate) fn graph_handle(&self) -> Rc<RefCell<SceneGraph>> {
        self.graph.clone()
    }

    #[cfg(test)]
    pub(crate) fn page_layer(&self) -> NodeId {
        self.page_layer
    }

    #[cfg(test)]
    pub(crate) fn camera_handle(&self) -> Rc<RefCell<Camera>> {
        self.camera.clone()
    }

    #[cfg(test)]
    pub(crate) fn updater_count(&self) -> usize {
        self.updaters.len()
    }
}

/// Deterministic star shell for the persistent world backdrop.
fn star_positions() -> Vec<[f32; 3]> {
    let mut state: u32 = 0x9e37_79b9;
    let mut next = move || {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        state as f32 / u32::MAX as f32
    };

    let mut positions = Vec::with_capacity(STAR_COUNT);
    for _ in 0..STAR_COUNT {
        // Uniform direction on the sphere, pushed out to a thick shell.
        let z = next() * 2.0 - 1.0;
        let theta = next() * std::f32::consts::TAU;
        let r = STAR_RADIUS * (0.6 + 0.4 * next());
        let xy = (1.0 - z * z).max(0.0).sqrt();
        positions.push([r * xy * theta.cos(), r * xy * theta.sin(), r * z]);
    }
    positions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::page::{LoadResult, next_tick};
    use std::cell::Cell;

    fn counting_registry(log: Rc<RefCell<Vec<String>>>) -> Registry {
        let mut registry = Registry::new();
        for key in ["home", "contact"] {
            let key = key.to_string();
            let log = log.clone();
            registry.register(
                &key.clone(),
                Box::new(move || {
                    let key = key.clone();
                    let log = log.clone();
                    Box::new(move |ctx: PageContext| {
                        let key = key.clone();
                        let log = log.clone();
                        Box::pin(async move {
                            log.borrow_mut().push(format!("load:{key}"));
                            let root = ctx.graph.borrow_mut().spawn(&key);
                            let dispose_log = log.clone();
                            let dispose_key = key.clone();
                            Ok(LoadResult::new(root).with_dispose(Box::new(move || {
                                dispose_log.borrow_mut().push(format!("dispose:{dispose_key}"));
                            })))
                        })
                    })
                }),
            );
        }
        registry
    }

    fn routes() -> RouteTable {
        RouteTable::new("home").route("/contact", "contact")
    }

    fn manager_with_log() -> (Manager, Rc<RefCell<Vec<String>>>) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let manager = Manager::new(routes(), counting_registry(log.clone()));
        (manager, log)
    }

    #[test]
    fn renavigation_to_same_key_is_noop() {
        let (mut m, log) = manager_with_log();
        m.load_for_path("/").unwrap();
        m.load_for_path("/").unwrap();
        m.load_for_path("/anything-unrouted").unwrap();
        assert_eq!(log.borrow().as_slice(), ["load:home"]);
        assert_eq!(m.current_key(), Some("home"));
    }

    #[test]
    fn unload_runs_before_next_load() {
        let (mut m, log) = manager_with_log();
        m.load_for_path("/").unwrap();
        m.load_for_path("/contact").unwrap();
        assert_eq!(
            log.borrow().as_slice(),
            ["load:home", "dispose:home", "load:contact"]
        );
        assert_eq!(m.current_key(), Some("contact"));
    }

    #[test]
    fn page_subtree_is_reclaimed_on_navigation() {
        let (mut m, _log) = manager_with_log();
        m.load_for_path("/").unwrap();
        let graph = m.graph_handle();
        assert_eq!(graph.borrow().children_of(m.page_layer()).len(), 1);

        m.load_for_path("/contact").unwrap();
        let children = graph.borrow().children_of(m.page_layer());
        assert_eq!(children.len(), 1);
        let name = graph.borrow().get(children[0]).map(|n| n.name.clone());
        assert_eq!(name.as_deref(), Some("contact"));
    }

    #[test]
    fn at_most_one_page_updater() {
        let mut registry = Registry::new();
        for key in ["home", "contact"] {
            registry.register(
                key,
                Box::new(|| {
                    Box::new(|ctx: PageContext| {
                        Box::pin(async move {
                            let root = ctx.graph.borrow_mut().spawn("page");
                            Ok(LoadResult::new(root).with_updater(Box::new(|_, _| {})))
                        })
                    })
                }),
            );
        }
        let mut m = Manager::new(routes(), registry);
        // One stable world-rotation updater is registered at construction.
        assert_eq!(m.updater_count(), 1);

        m.load_for_path("/").unwrap();
        assert_eq!(m.updater_count(), 2);

        m.load_for_path("/contact").unwrap();
        assert_eq!(m.updater_count(), 2);

        m.unload_current();
        assert_eq!(m.updater_count(), 1);
        assert_eq!(m.current_key(), None);
    }

    #[test]
    fn superseded_load_is_cancelled_and_reclaimed() {
        let slow_ran_to_end = Rc::new(Cell::new(false));
        let flag = slow_ran_to_end.clone();

        let mut registry = Registry::new();
        registry.register(
            "home",
            Box::new(move || {
                let flag = flag.clone();
                Box::new(move |ctx: PageContext| {
                    let flag = flag.clone();
                    Box::pin(async move {
                        let root = ctx.graph.borrow_mut().spawn("home-partial");
                        next_tick().await;
                        if ctx.cancelled.is_cancelled() {
                            // Bail out with the partial subtree for reclaim.
                            return Ok(LoadResult::new(root));
                        }
                        flag.set(true);
                        Ok(LoadResult::new(root))
                    })
                })
            }),
        );
        registry.register(
            "contact",
            Box::new(|| {
                Box::new(|ctx: PageContext| {
                    Box::pin(async move {
                        let root = ctx.graph.borrow_mut().spawn("contact");
                        Ok(LoadResult::new(root))
                    })
                })
            }),
        );

        let mut m = Manager::new(routes(), registry);
        m.load_for_path("/").unwrap();
        assert!(m.is_loading());

        // Navigate away while the first load is parked at its yield point.
        m.load_for_path("/contact").unwrap();
        assert_eq!(m.current_key(), Some("contact"));

        // Next frame the stale load resolves and its subtree is reclaimed.
        m.update(0.016).unwrap();
        assert!(!slow_ran_to_end.get());

        let graph = m.graph_handle();
        let children = graph.borrow().children_of(m.page_layer());
        assert_eq!(children.len(), 1);
        let name = graph.borrow().get(children[0]).map(|n| n.name.clone());
        assert_eq!(name.as_deref(), Some("contact"));
    }

    #[test]
    fn reload_same_key_while_pending_is_noop() {
        let starts = Rc::new(Cell::new(0u32));
        let counter = starts.clone();

        let mut registry = Registry::new();
        registry.register(
            "home",
            Box::new(move || {
                let counter = counter.clone();
                Box::new(move |ctx: PageContext| {
                    let counter = counter.clone();
                    Box::pin(async move {
                        counter.set(counter.get() + 1);
                        next_tick().await;
                        let root = ctx.graph.borrow_mut().spawn("home");
                        Ok(LoadResult::new(root))
                    })
                })
            }),
        );

        let mut m = Manager::new(routes(), registry);
        m.load_for_path("/").unwrap();
        m.load_for_path("/").unwrap();
        m.update(0.016).unwrap();
        assert_eq!(starts.get(), 1);
        assert_eq!(m.current_key(), Some("home"));
    }

    #[test]
    fn frame_delta_is_clamped() {
        let seen = Rc::new(Cell::new(0.0f32));
        let probe = seen.clone();

        let mut m = Manager::new(RouteTable::new("home"), Registry::new());
        m.add_updater(Box::new(move |dt, _| probe.set(dt)));

        m.update(10.0).unwrap();
        assert!(seen.get() <= MAX_FRAME_DELTA + f32::EPSILON);
        assert!(seen.get() > 0.0);
    }

    #[test]
    fn route_miss_clears_scene_but_keeps_key() {
        let (mut m, _log) = manager_with_log();
        m.load_for_path("/contact").unwrap();

        // A routed key with no registered loader unloads and shows nothing.
        let mut m2 = Manager::new(
            RouteTable::new("home").route("/contact", "contact"),
            Registry::new(),
        );
        m2.load_for_path("/contact").unwrap();
        assert_eq!(m2.current_key(), Some("contact"));
        assert!(m2.graph_handle().borrow().children_of(m2.page_layer()).is_empty());
    }

    #[test]
    fn panicking_disposer_does_not_block_navigation() {
        let mut registry = Registry::new();
        registry.register(
            "home",
            Box::new(|| {
                Box::new(|ctx: PageContext| {
                    Box::pin(async move {
                        let root = ctx.graph.borrow_mut().spawn("home");
                        Ok(LoadResult::new(root)
                            .with_dispose(Box::new(|| panic!("bad disposer"))))
                    })
                })
            }),
        );
        registry.register(
            "contact",
            Box::new(|| {
                Box::new(|ctx: PageContext| {
                    Box::pin(async move {
                        let root = ctx.graph.borrow_mut().spawn("contact");
                        Ok(LoadResult::new(root))
                    })
                })
            }),
        );

        let mut m = Manager::new(routes(), registry);
        m.load_for_path("/").unwrap();
        m.load_for_path("/contact").unwrap();
        assert_eq!(m.current_key(), Some("contact"));

        let graph = m.graph_handle();
        let children = graph.borrow().children_of(m.page_layer());
        assert_eq!(children.len(), 1);
    }

    #[test]
    fn zoom_to_retargets_last_wins() {
        let mut m = Manager::new(RouteTable::new("home"), Registry::new());
        m.zoom_to(Vec3::new(100.0, 0.0, 0.0), 1.0, 0.0);
        m.zoom_to(Vec3::new(0.0, 4.0, 0.0), 0.1, 0.0);

        for _ in 0..20 {
            m.update(0.05).unwrap();
        }
        let pos = m.camera_handle().borrow().position;
        assert!((pos - Vec3::new(0.0, 4.0, 0.0)).length() < 1e-3);
    }

    #[test]
    fn wasd_rotates_world() {
        let mut m = Manager::new(RouteTable::new("home"), Registry::new());
        let graph = m.graph_handle();
        let world = m.world;

        let before = graph.borrow().get(world).map(|n| n.transform.rotation);
        m.key_event(KeyCode::KeyD, true);
        m.update(0.016).unwrap();
        let after = graph.borrow().get(world).map(|n| n.transform.rotation);
        assert_ne!(before, after);

        m.key_event(KeyCode::KeyD, false);
        let settled = graph.borrow().get(world).map(|n| n.transform.rotation);
        m.update(0.016).unwrap();
        let still = graph.borrow().get(world).map(|n| n.transform.rotation);
        assert_eq!(settled, still);
    }
}
