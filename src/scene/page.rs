//! The contract between the scene manager and individual page scenes.
//!
//! A page is an async loader: it receives a [`PageContext`], builds its
//! subtree under `ctx.parent`, and resolves to a [`LoadResult`] carrying the
//! subtree root plus optional per-frame updater and teardown hook. Loaders
//! are expected to check `ctx.cancelled` after every await point and bail
//! out early when a newer navigation has superseded them.

use crate::anim::Tweens;
use crate::assets::{LoadingTracker, TextureLoader};
use crate::camera::Camera;
use crate::gpu::GpuContext;
use crate::graph::{NodeId, SceneGraph};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

/// Shared cancellation flag handed to each page load.
///
/// Cancellation is cooperative: the manager sets the flag when a load is
/// superseded, and the loader is responsible for checking it between await
/// points. A cancelled loader should stop doing work and return whatever
/// partial subtree it has built so it can be reclaimed.
#[derive(Clone, Default)]
pub struct CancelToken(Rc<Cell<bool>>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.get()
    }
}

/// Per-frame callback registered by a page. Receives `(dt, elapsed)` in
/// seconds, with `dt` already clamped by the manager's clock.
pub type Updater = Box<dyn FnMut(f32, f32)>;

/// Teardown hook a page may supply for resources the generic subtree sweep
/// cannot see.
pub type Disposer = Box<dyn FnMut()>;

/// What a finished page load hands back to the manager.
pub struct LoadResult {
    /// Root of the page's subtree, already spawned in the shared graph.
    pub root: NodeId,
    pub updater: Option<Updater>,
    pub dispose: Option<Disposer>,
}

impl LoadResult {
    pub fn new(root: NodeId) -> Self {
        Self {
            root,
            updater: None,
            dispose: None,
        }
    }

    pub fn with_updater(mut self, updater: Updater) -> Self {
        self.updater = Some(updater);
        self
    }

    pub fn with_dispose(mut self, dispose: Disposer) -> Self {
        self.dispose = Some(dispose);
        self
    }
}

/// Why a page load failed.
#[derive(Debug)]
pub enum LoadError {
    Image(image::ImageError),
    Io(std::io::Error),
    Other(String),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Image(e) => write!(f, "image decode failed: {e}"),
            LoadError::Io(e) => write!(f, "asset read failed: {e}"),
            LoadError::Other(msg) => write!(f, "page load failed: {msg}"),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Image(e) => Some(e),
            LoadError::Io(e) => Some(e),
            LoadError::Other(_) => None,
        }
    }
}

impl From<image::ImageError> for LoadError {
    fn from(e: image::ImageError) -> Self {
        LoadError::Image(e)
    }
}

impl From<std::io::Error> for LoadError {
    fn from(e: std::io::Error) -> Self {
        LoadError::Io(e)
    }
}

/// Everything a page loader needs to build its scene.
#[derive(Clone)]
pub struct PageContext {
    pub graph: Rc<RefCell<SceneGraph>>,
    /// Node the page should parent its subtree under.
    pub parent: NodeId,
    pub camera: Rc<RefCell<Camera>>,
    /// Present once the window exists; pages must work without it.
    pub gpu: Option<Rc<RefCell<GpuContext>>>,
    pub textures: Rc<TextureLoader>,
    pub tracker: Rc<LoadingTracker>,
    pub tweens: Rc<RefCell<Tweens>>,
    pub cancelled: CancelToken,
}

/// Boxed page load in flight. Loads run on the frame loop, not an executor,
/// so the future type is local and non-Send.
pub type LoadFuture = Pin<Box<dyn Future<Output = Result<LoadResult, LoadError>>>>;

/// A page's entry point.
pub type PageLoader = Box<dyn Fn(PageContext) -> LoadFuture>;

/// Lazily produces a [`PageLoader`]; not invoked until the page's route is
/// first visited.
pub type LoaderFactory = Box<dyn Fn() -> PageLoader>;

/// Yield to the frame loop once, resuming on the next poll.
///
/// Loaders call this between build steps so cancellation can take effect
/// mid-load.
pub fn next_tick() -> impl Future<Output = ()> {
    struct NextTick {
        polled: bool,
    }

    impl Future for NextTick {
        type Output = ();

        fn poll(mut self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<()> {
            if self.polled {
                Poll::Ready(())
            } else {
                self.polled = true;
                Poll::Pending
            }
        }
    }

    NextTick { polled: false }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::task::Waker;

    #[test]
    fn cancel_token_is_shared() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn next_tick_pends_once() {
        let waker = Waker::noop();
        let mut cx = Context::from_waker(waker);
        let mut fut = Box::pin(next_tick());
        assert!(fut.as_mut().poll(&mut cx).is_pending());
        assert!(fut.as_mut().poll(&mut cx).is_ready());
    }
}
