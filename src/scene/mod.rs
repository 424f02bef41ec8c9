//! Scene lifecycle: routing, page loading, and the manager that owns it all.

pub mod manager;
pub mod page;
pub mod routes;

pub use manager::{MAX_FRAME_DELTA, Manager, UpdaterId};
pub use page::{
    CancelToken, Disposer, LoadError, LoadFuture, LoadResult, LoaderFactory, PageContext,
    PageLoader, Updater, next_tick,
};
pub use routes::{Registry, RouteTable};
