//! Built-in page scenes and the route table that selects them.

mod contact;
mod home;
mod projects;

use crate::scene::{Registry, RouteTable};

/// The site's route table. Order matters: the deeper case-study prefixes
/// must match before the shorter `/projects` prefix.
pub fn routes() -> RouteTable {
    RouteTable::new("home")
        .route("/case-studies/kiosk", "case-kiosk")
        .route("/case-studies/automation", "case-automation")
        .route("/case-studies/product-tour", "case-product-tour")
        .route("/projects", "projects")
        .route("/contact", "contact")
}

/// Registry of every built-in page, keyed to match [`routes`].
pub fn registry() -> Registry {
    let mut registry = Registry::new();
    registry.register("home", Box::new(|| Box::new(home::load)));
    registry.register("contact", Box::new(|| Box::new(contact::load)));
    registry.register("projects", Box::new(|| projects::empty_page("projects")));
    registry.register("case-kiosk", Box::new(|| projects::empty_page("case-kiosk")));
    registry.register(
        "case-automation",
        Box::new(|| projects::empty_page("case-automation")),
    );
    registry.register(
        "case-product-tour",
        Box::new(|| projects::empty_page("case-product-tour")),
    );
    registry
}

/// Tiny xorshift generator for page animation noise. Not for anything that
/// needs statistical quality; it just has to be cheap and dependency-free.
pub(crate) struct Rng {
    state: u32,
}

impl Rng {
    pub(crate) fn new(seed: u32) -> Self {
        Self {
            state: seed.max(1),
        }
    }

    /// Uniform in [0, 1).
    pub(crate) fn unit(&mut self) -> f32 {
        self.state ^= self.state << 13;
        self.state ^= self.state >> 17;
        self.state ^= self.state << 5;
        (self.state >> 8) as f32 / (1u32 << 24) as f32
    }

    /// Uniform in [-1, 1).
    pub(crate) fn signed(&mut self) -> f32 {
        self.unit() * 2.0 - 1.0
    }

    /// Uniform in [lo, hi).
    pub(crate) fn range(&mut self, lo: f32, hi: f32) -> f32 {
        lo + (hi - lo) * self.unit()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Manager;

    #[test]
    fn routes_cover_every_registered_page() {
        let table = routes();
        let reg = registry();
        for path in [
            "/",
            "/contact/",
            "/projects/",
            "/case-studies/kiosk/",
            "/case-studies/automation/",
            "/case-studies/product-tour/",
        ] {
            assert!(reg.contains(table.key_for(path)), "no page for {path}");
        }
    }

    #[test]
    fn home_builds_and_animates_headless() {
        let mut m = Manager::new(routes(), registry());
        m.load_for_path("/").unwrap();
        // Drive the staged load to completion.
        for _ in 0..10 {
            m.update(0.016).unwrap();
        }
        assert_eq!(m.current_key(), Some("home"));
        assert!(!m.is_loading());

        let graph = m.graph_handle();
        let children = graph.borrow().children_of(m.page_layer());
        assert_eq!(children.len(), 1);
        let subtree = graph.borrow().collect_subtree(children[0]);
        // Root, planet, satellite assembly, astronaut at minimum.
        assert!(subtree.len() >= 4, "got {} nodes", subtree.len());

        // The updater keeps the planet spinning.
        let before: Vec<_> = subtree
            .iter()
            .map(|&id| graph.borrow().get(id).map(|n| n.transform.rotation))
            .collect();
        for _ in 0..30 {
            m.update(0.016).unwrap();
        }
        let after: Vec<_> = subtree
            .iter()
            .map(|&id| graph.borrow().get(id).map(|n| n.transform.rotation))
            .collect();
        assert_ne!(before, after);
    }

    #[test]
    fn contact_particles_rewrite_vertices() {
        let mut m = Manager::new(routes(), registry());
        m.load_for_path("/contact/").unwrap();
        for _ in 0..10 {
            m.update(0.016).unwrap();
        }
        assert_eq!(m.current_key(), Some("contact"));

        let graph = m.graph_handle();
        let children = graph.borrow().children_of(m.page_layer());
        assert_eq!(children.len(), 1);

        // Find the particle cloud and confirm the updater marks it dirty.
        let subtree = graph.borrow().collect_subtree(children[0]);
        let mut found_dirty_points = false;
        m.update(0.016).unwrap();
        for id in subtree {
            let g = graph.borrow();
            if let Some(mesh) = g.get(id).and_then(|n| n.mesh.as_ref()) {
                if mesh.geometry.topology == crate::geometry::Topology::Points
                    && mesh.geometry.take_dirty()
                {
                    found_dirty_points = true;
                }
            }
        }
        assert!(found_dirty_points);
    }

    #[test]
    fn case_pages_load_empty() {
        let mut m = Manager::new(routes(), registry());
        for path in ["/projects/", "/case-studies/kiosk/", "/case-studies/automation/"] {
            m.load_for_path(path).unwrap();
            assert!(!m.is_loading());
            let graph = m.graph_handle();
            let children = graph.borrow().children_of(m.page_layer());
            assert_eq!(children.len(), 1, "path {path}");
        }
    }
}
