//! Route resolution and the page loader registry.

use crate::scene::page::{LoaderFactory, PageLoader};
use std::collections::HashMap;

/// Ordered prefix table mapping URL paths to page keys.
///
/// Routes are matched in declaration order, so more specific prefixes must
/// be declared before shorter ones that would shadow them. Unmatched paths
/// fall back to the default key.
pub struct RouteTable {
    routes: Vec<(String, String)>,
    default_key: String,
}

impl RouteTable {
    pub fn new(default_key: &str) -> Self {
        Self {
            routes: Vec::new(),
            default_key: default_key.to_string(),
        }
    }

    /// Append a prefix route. Builder style so tables read as a list.
    pub fn route(mut self, prefix: &str, key: &str) -> Self {
        self.routes.push((prefix.to_string(), key.to_string()));
        self
    }

    pub fn default_key(&self) -> &str {
        &self.default_key
    }

    /// Resolve a path to its page key.
    pub fn key_for(&self, path: &str) -> &str {
        let path = normalize(path);
        if path.is_empty() || path == "/" {
            return &self.default_key;
        }
        for (prefix, key) in &self.routes {
            if path.starts_with(prefix.as_str()) {
                return key;
            }
        }
        &self.default_key
    }
}

/// Collapse repeated slashes so "//contact" and "/contact" resolve alike.
fn normalize(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut prev_slash = false;
    for c in path.chars() {
        if c == '/' {
            if !prev_slash {
                out.push(c);
            }
            prev_slash = true;
        } else {
            out.push(c);
            prev_slash = false;
        }
    }
    out
}

/// Page loaders keyed by page key, constructed lazily on first visit.
#[derive(Default)]
pub struct Registry {
    factories: HashMap<String, LoaderFactory>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, key: &str, factory: LoaderFactory) {
        self.factories.insert(key.to_string(), factory);
    }

    /// Instantiate the loader for a key. Returns `None` for unknown keys;
    /// the factory itself runs on every call, loaders are not cached.
    pub fn loader(&self, key: &str) -> Option<PageLoader> {
        self.factories.get(key).map(|f| f())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.factories.contains_key(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::page::LoadResult;
    use std::cell::Cell;
    use std::rc::Rc;

    fn table() -> RouteTable {
        RouteTable::new("home")
            .route("/contact", "contact")
            .route("/projects/case-kiosk", "case-kiosk")
            .route("/projects", "projects")
    }

    #[test]
    fn root_paths_use_default() {
        let t = table();
        assert_eq!(t.key_for("/"), "home");
        assert_eq!(t.key_for(""), "home");
        assert_eq!(t.key_for("/unknown/deep/path"), "home");
    }

    #[test]
    fn declaration_order_wins() {
        let t = table();
        assert_eq!(t.key_for("/projects/case-kiosk"), "case-kiosk");
        assert_eq!(t.key_for("/projects/case-kiosk/extra"), "case-kiosk");
        assert_eq!(t.key_for("/projects"), "projects");
        assert_eq!(t.key_for("/projects/other"), "projects");
    }

    #[test]
    fn repeated_slashes_collapse() {
        let t = table();
        assert_eq!(t.key_for("//contact"), "contact");
        assert_eq!(t.key_for("/projects//case-kiosk"), "case-kiosk");
        assert_eq!(t.key_for("//"), "home");
    }

    #[test]
    fn resolution_is_deterministic() {
        let t = table();
        for _ in 0..3 {
            assert_eq!(t.key_for("/contact/form"), "contact");
        }
    }

    #[test]
    fn registry_invokes_factory_lazily() {
        let calls = Rc::new(Cell::new(0u32));
        let counted = calls.clone();

        let mut registry = Registry::new();
        registry.register(
            "home",
            Box::new(move || {
                counted.set(counted.get() + 1);
                Box::new(|ctx| {
                    Box::pin(async move {
                        let root = ctx.graph.borrow_mut().spawn("home");
                        Ok(LoadResult::new(root))
                    })
                })
            }),
        );

        assert_eq!(calls.get(), 0);
        assert!(registry.loader("home").is_some());
        assert_eq!(calls.get(), 1);
        assert!(registry.loader("missing").is_none());
        assert_eq!(calls.get(), 1);
    }
}
