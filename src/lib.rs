//! # Backdrop
//!
//! **A persistent 3D backdrop engine with route-keyed page scenes.**
//!
//! One window, one scene graph, one camera — shared across an entire site's
//! lifetime. Navigation swaps *page scenes* in and out underneath: each URL
//! path maps to a page that builds its subtree asynchronously, animates via
//! a per-frame updater, and is deep-disposed (geometry, materials, every
//! texture slot) when the visitor moves on.
//!
//! ## Quick Start
//!
//! ```no_run
//! use backdrop::*;
//!
//! fn main() -> Result<(), winit::error::EventLoopError> {
//!     env_logger::init();
//!     run(pages::routes(), pages::registry(), |_manager| {
//!         move |frame| {
//!             if frame.input.key_pressed(KeyCode::Digit2) {
//!                 frame.navigate("/contact/");
//!             }
//!         }
//!     })
//! }
//! ```
//!
//! ## Design
//!
//! - **One lifecycle owner** — [`Manager`] holds the graph, camera, tweens,
//!   and GPU context; pages never own shared infrastructure.
//! - **Cooperative cancellation** — a superseded load keeps running until it
//!   yields, sees its token, and hands back its partial subtree for reclaim.
//! - **Disposal as a marker** — resources flag themselves disposed; the
//!   renderer drops the GPU copies on the next frame.
//! - **Headless by default** — everything except [`Manager::init`] and
//!   rendering works without a window, which is how the tests run.

mod anim;
mod app;
mod assets;
mod camera;
mod dispose;
mod geometry;
mod gpu;
mod graph;
mod input;
mod material;
pub mod pages;
mod render;
mod router;
pub mod scene;
mod texture;

pub use anim::{Easing, Tween, TweenTarget, Tweens};
pub use app::{AppConfig, Frame, run, run_with_config};
pub use assets::{LoadingTracker, TextureLoader};
pub use camera::Camera;
pub use dispose::dispose_subtree;
pub use geometry::{Geometry, GeometryId, Topology, Vertex3d};
pub use gpu::{GpuContext, SetupError};
pub use graph::{Mesh, Node, NodeId, SceneGraph, Transform};
pub use input::Input;
pub use material::{Blend, Color, Material, MaterialId};
pub use render::MeshRenderer;
pub use router::{FALLBACK_POLL_INTERVAL, Router};
pub use scene::{
    CancelToken, LoadError, LoadResult, Manager, PageContext, Registry, RouteTable, next_tick,
};
pub use texture::{Texture, TextureId};

// Re-export glam math types for convenience
pub use glam::{Mat4, Quat, Vec2, Vec3, Vec4};

// Re-export commonly used winit types for convenience
pub use winit::keyboard::KeyCode;
