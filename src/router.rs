//! Bridges external navigation events to the scene manager.
//!
//! Navigation sources (key bindings in the demo binary, an embedding app's
//! route changes) call [`Router::navigate`]; the frame loop calls
//! [`Router::tick`], which applies path changes and additionally re-syncs on
//! a fixed interval in case a navigation event was missed entirely.

use crate::scene::{LoadError, Manager};

/// Seconds between fallback re-syncs of the current path.
pub const FALLBACK_POLL_INTERVAL: f32 = 0.5;

/// Debounced path state between navigation events and the manager.
pub struct Router {
    current: String,
    applied: Option<String>,
    poll_timer: f32,
}

impl Router {
    pub fn new(initial_path: &str) -> Self {
        Self {
            current: initial_path.to_string(),
            applied: None,
            poll_timer: 0.0,
        }
    }

    /// Record a path change. Applied on the next [`Router::tick`].
    pub fn navigate(&mut self, path: &str) {
        if path != self.current {
            self.current = path.to_string();
        }
    }

    /// The most recently requested path.
    pub fn path(&self) -> &str {
        &self.current
    }

    /// Apply any pending path change, plus the periodic fallback re-sync.
    ///
    /// The re-sync hands the unchanged path back to the manager, which
    /// no-ops when the page key matches, so the poll is idle work in the
    /// steady state.
    pub fn tick(&mut self, dt: f32, manager: &mut Manager) -> Result<(), LoadError> {
        self.poll_timer += dt;
        let poll_due = self.poll_timer >= FALLBACK_POLL_INTERVAL;
        if poll_due {
            self.poll_timer = 0.0;
        }

        if poll_due || self.applied.as_deref() != Some(self.current.as_str()) {
            manager.load_for_path(&self.current)?;
            self.applied = Some(self.current.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{LoadResult, PageContext, Registry, RouteTable};
    use std::cell::Cell;
    use std::rc::Rc;

    fn manager_counting_loads() -> (Manager, Rc<Cell<u32>>) {
        let loads = Rc::new(Cell::new(0u32));
        let mut registry = Registry::new();
        for key in ["home", "contact"] {
            let loads = loads.clone();
            registry.register(
                key,
                Box::new(move || {
                    let loads = loads.clone();
                    Box::new(move |ctx: PageContext| {
                        let loads = loads.clone();
                        Box::pin(async move {
                            loads.set(loads.get() + 1);
                            let root = ctx.graph.borrow_mut().spawn("page");
                            Ok(LoadResult::new(root))
                        })
                    })
                }),
            );
        }
        let routes = RouteTable::new("home").route("/contact", "contact");
        (Manager::new(routes, registry), loads)
    }

    #[test]
    fn applies_initial_path_on_first_tick() {
        let (mut manager, loads) = manager_counting_loads();
        let mut router = Router::new("/");
        router.tick(0.016, &mut manager).unwrap();
        assert_eq!(loads.get(), 1);
        assert_eq!(manager.current_key(), Some("home"));
    }

    #[test]
    fn fallback_poll_does_not_reload() {
        let (mut manager, loads) = manager_counting_loads();
        let mut router = Router::new("/");

        // Several seconds of frames cross many poll intervals.
        for _ in 0..240 {
            router.tick(0.016, &mut manager).unwrap();
        }
        assert_eq!(loads.get(), 1);
    }

    #[test]
    fn navigation_switches_page() {
        let (mut manager, loads) = manager_counting_loads();
        let mut router = Router::new("/");
        router.tick(0.016, &mut manager).unwrap();

        router.navigate("/contact");
        assert_eq!(manager.current_key(), Some("home"));
        router.tick(0.016, &mut manager).unwrap();
        assert_eq!(manager.current_key(), Some("contact"));
        assert_eq!(loads.get(), 2);
    }

    #[test]
    fn poll_resyncs_after_external_unload() {
        let (mut manager, loads) = manager_counting_loads();
        let mut router = Router::new("/");
        router.tick(0.016, &mut manager).unwrap();
        assert_eq!(loads.get(), 1);

        // Something outside the router tore the page down.
        manager.unload_current();
        assert_eq!(manager.current_key(), None);

        router.tick(FALLBACK_POLL_INTERVAL, &mut manager).unwrap();
        assert_eq!(manager.current_key(), Some("home"));
        assert_eq!(loads.get(), 2);
    }
}
