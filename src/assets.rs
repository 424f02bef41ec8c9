//! Asset loading helpers shared across pages.

use crate::texture::Texture;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

/// Counts outstanding asset loads so callers can tell when a page has
/// finished fetching everything it asked for.
#[derive(Default)]
pub struct LoadingTracker {
    started: Cell<u32>,
    completed: Cell<u32>,
}

impl LoadingTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that a load has begun.
    pub fn begin(&self) {
        self.started.set(self.started.get() + 1);
    }

    /// Record that a load finished, successfully or not.
    pub fn finish(&self) {
        self.completed.set(self.completed.get() + 1);
    }

    /// True when every started load has completed.
    pub fn is_idle(&self) -> bool {
        self.started.get() == self.completed.get()
    }

    /// Fraction of started loads that have completed, 1.0 when idle.
    pub fn progress(&self) -> f32 {
        let started = self.started.get();
        if started == 0 {
            1.0
        } else {
            self.completed.get() as f32 / started as f32
        }
    }
}

/// File-backed texture loader with a path-keyed cache.
///
/// Pages request textures by path; repeat requests for the same path hand
/// back the cached `Rc` instead of decoding the image again.
pub struct TextureLoader {
    tracker: Rc<LoadingTracker>,
    cache: RefCell<HashMap<String, Rc<Texture>>>,
}

impl TextureLoader {
    pub fn new(tracker: Rc<LoadingTracker>) -> Self {
        Self {
            tracker,
            cache: RefCell::new(HashMap::new()),
        }
    }

    /// Load a texture from disk, or return the cached copy.
    pub fn load(&self, path: &str) -> Result<Rc<Texture>, image::ImageError> {
        if let Some(tex) = self.cache.borrow().get(path) {
            return Ok(tex.clone());
        }
        self.tracker.begin();
        let result = Texture::from_file(path);
        self.tracker.finish();
        let tex = Rc::new(result?);
        self.cache
            .borrow_mut()
            .insert(path.to_string(), tex.clone());
        Ok(tex)
    }

    /// Insert a procedurally generated texture under a synthetic path so
    /// later lookups share it.
    pub fn insert(&self, key: &str, texture: Texture) -> Rc<Texture> {
        let tex = Rc::new(texture);
        self.cache
            .borrow_mut()
            .insert(key.to_string(), tex.clone());
        tex
    }

    /// Fetch a previously inserted or loaded texture without touching disk.
    pub fn get(&self, key: &str) -> Option<Rc<Texture>> {
        self.cache.borrow().get(key).cloned()
    }

    pub fn tracker(&self) -> &Rc<LoadingTracker> {
        &self.tracker
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracker_idle_transitions() {
        let tracker = LoadingTracker::new();
        assert!(tracker.is_idle());
        assert_eq!(tracker.progress(), 1.0);

        tracker.begin();
        tracker.begin();
        assert!(!tracker.is_idle());
        assert_eq!(tracker.progress(), 0.0);

        tracker.finish();
        assert_eq!(tracker.progress(), 0.5);
        tracker.finish();
        assert!(tracker.is_idle());
    }

    #[test]
    fn loader_caches_inserted_textures() {
        let loader = TextureLoader::new(Rc::new(LoadingTracker::new()));
        let tex = loader.insert(
            "gen:ramp",
            Texture::gradient(8, [255, 255, 255], [0, 0, 0]),
        );
        let again = loader.get("gen:ramp").unwrap();
        assert_eq!(tex.id(), again.id());
    }

    #[test]
    fn missing_file_counts_as_finished() {
        let tracker = Rc::new(LoadingTracker::new());
        let loader = TextureLoader::new(tracker.clone());
        assert!(loader.load("does/not/exist.png").is_err());
        assert!(tracker.is_idle());
    }
}
