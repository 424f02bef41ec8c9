//! Property tweens for the camera and scene nodes.
//!
//! The manager drives one [`Tweens`] registry from the shared frame loop.
//! Camera zooms requested by page UI land here, and pages may add tweens
//! against their own nodes; when a page is unloaded every tween targeting
//! its subtree is killed so no animation outlives its target.

use crate::camera::Camera;
use crate::graph::{NodeId, SceneGraph};
use glam::Vec3;

/// Easing functions for tween interpolation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Easing {
    /// Constant speed throughout.
    Linear,
    /// Start slow, accelerate.
    EaseIn,
    /// Start fast, decelerate.
    EaseOut,
    /// Start slow, speed up, then slow down.
    #[default]
    EaseInOut,
}

impl Easing {
    /// Apply the easing curve to a linear progress value in [0, 1].
    pub fn apply(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::EaseIn => t * t,
            Easing::EaseOut => 1.0 - (1.0 - t) * (1.0 - t),
            Easing::EaseInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
        }
    }
}

/// What a tween writes to each frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TweenTarget {
    /// The shared camera's world position.
    CameraPosition,
    /// A node's local position.
    NodePosition(NodeId),
    /// A node's local scale.
    NodeScale(NodeId),
}

impl TweenTarget {
    fn node(&self) -> Option<NodeId> {
        match self {
            TweenTarget::CameraPosition => None,
            TweenTarget::NodePosition(id) | TweenTarget::NodeScale(id) => Some(*id),
        }
    }
}

/// A single in-flight interpolation toward a target value.
#[derive(Debug)]
pub struct Tween {
    pub target: TweenTarget,
    pub to: Vec3,
    pub duration: f32,
    pub delay: f32,
    pub easing: Easing,
    elapsed: f32,
    // Captured when the delay expires, so delayed tweens start from the
    // value current at that moment rather than at scheduling time.
    from: Option<Vec3>,
}

impl Tween {
    pub fn new(target: TweenTarget, to: Vec3, duration: f32) -> Self {
        Self {
            target,
            to,
            duration,
            delay: 0.0,
            easing: Easing::EaseInOut,
            elapsed: 0.0,
            from: None,
        }
    }

    pub fn delay(mut self, delay: f32) -> Self {
        self.delay = delay;
        self
    }

    pub fn easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }
}

/// Registry of active tweens, advanced once per frame by the manager.
#[derive(Default)]
pub struct Tweens {
    active: Vec<Tween>,
}

impl Tweens {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule a tween. A tween already running against the same target is
    /// replaced — concurrent requests retarget rather than queue.
    pub fn add(&mut self, tween: Tween) {
        self.active.retain(|t| t.target != tween.target);
        self.active.push(tween);
    }

    /// Drop every tween that targets one of the given nodes.
    ///
    /// Called during page teardown with the page subtree's ids; camera
    /// tweens are left running.
    pub fn kill_targeting(&mut self, ids: &[NodeId]) {
        self.active
            .retain(|t| t.target.node().is_none_or(|id| !ids.contains(&id)));
    }

    /// Number of in-flight tweens.
    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Advance all tweens by `dt` seconds and write their current values.
    pub fn update(&mut self, dt: f32, graph: &mut SceneGraph, camera: &mut Camera) {
        self.active.retain_mut(|tween| {
            tween.elapsed += dt;
            if tween.elapsed < tween.delay {
                return true;
            }

            let from = match tween.from {
                Some(v) => v,
                None => {
                    let Some(v) = read(tween.target, graph, camera) else {
                        // Target vanished before the tween started.
                        return false;
                    };
                    tween.from = Some(v);
                    v
                }
            };

            let local = tween.elapsed - tween.delay;
            let progress = if tween.duration > 0.0 {
                (local / tween.duration).clamp(0.0, 1.0)
            } else {
                1.0
            };
            let value = from.lerp(tween.to, tween.easing.apply(progress));

            if !write(tween.target, value, graph, camera) {
                return false;
            }
            progress < 1.0
        });
    }
}

fn read(target: TweenTarget, graph: &SceneGraph, camera: &Camera) -> Option<Vec3> {
    match target {
        TweenTarget::CameraPosition => Some(camera.position),
        TweenTarget::NodePosition(id) => graph.get(id).map(|n| n.transform.position),
        TweenTarget::NodeScale(id) => graph.get(id).map(|n| n.transform.scale),
    }
}

fn write(target: TweenTarget, value: Vec3, graph: &mut SceneGraph, camera: &mut Camera) -> bool {
    match target {
        TweenTarget::CameraPosition => {
            camera.position = value;
            true
        }
        TweenTarget::NodePosition(id) => match graph.get_mut(id) {
            Some(n) => {
                n.transform.position = value;
                true
            }
            None => false,
        },
        TweenTarget::NodeScale(id) => match graph.get_mut(id) {
            Some(n) => {
                n.transform.scale = value;
                true
            }
            None => false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn easing_endpoints() {
        for easing in [
            Easing::Linear,
            Easing::EaseIn,
            Easing::EaseOut,
            Easing::EaseInOut,
        ] {
            assert_eq!(easing.apply(0.0), 0.0);
            assert!((easing.apply(1.0) - 1.0).abs() < 1e-6);
        }
        assert_eq!(Easing::EaseInOut.apply(0.5), 0.5);
    }

    #[test]
    fn camera_tween_reaches_target() {
        let mut graph = SceneGraph::new();
        let mut camera = Camera::new();
        camera.position = Vec3::ZERO;

        let mut tweens = Tweens::new();
        tweens.add(Tween::new(
            TweenTarget::CameraPosition,
            Vec3::new(10.0, 0.0, 0.0),
            1.0,
        ));

        for _ in 0..100 {
            tweens.update(0.0125, &mut graph, &mut camera);
        }
        assert!((camera.position.x - 10.0).abs() < 1e-4);
        assert!(tweens.is_empty());
    }

    #[test]
    fn delayed_tween_captures_start_late() {
        let mut graph = SceneGraph::new();
        let mut camera = Camera::new();
        camera.position = Vec3::ZERO;

        let mut tweens = Tweens::new();
        tweens.add(Tween::new(TweenTarget::CameraPosition, Vec3::X, 0.5).delay(0.5));

        // Move the camera during the delay; the tween must start from here.
        tweens.update(0.25, &mut graph, &mut camera);
        camera.position = Vec3::new(0.0, 5.0, 0.0);
        tweens.update(0.25, &mut graph, &mut camera);

        for _ in 0..50 {
            tweens.update(0.0125, &mut graph, &mut camera);
        }
        assert!((camera.position - Vec3::X).length() < 1e-3);
    }

    #[test]
    fn same_target_retargets_last_wins() {
        let mut graph = SceneGraph::new();
        let mut camera = Camera::new();
        camera.position = Vec3::ZERO;

        let mut tweens = Tweens::new();
        tweens.add(Tween::new(TweenTarget::CameraPosition, Vec3::X * 100.0, 1.0));
        tweens.add(Tween::new(TweenTarget::CameraPosition, Vec3::Y * 2.0, 0.1));
        assert_eq!(tweens.len(), 1);

        for _ in 0..20 {
            tweens.update(0.05, &mut graph, &mut camera);
        }
        assert!((camera.position - Vec3::Y * 2.0).length() < 1e-4);
    }

    #[test]
    fn kill_targeting_spares_camera() {
        let mut graph = SceneGraph::new();
        let node = graph.spawn("n");

        let mut tweens = Tweens::new();
        tweens.add(Tween::new(TweenTarget::NodePosition(node), Vec3::X, 1.0));
        tweens.add(Tween::new(TweenTarget::CameraPosition, Vec3::X, 1.0));

        tweens.kill_targeting(&[node]);
        assert_eq!(tweens.len(), 1);
    }

    #[test]
    fn stale_node_tween_drops_out() {
        let mut graph = SceneGraph::new();
        let mut camera = Camera::new();
        let node = graph.spawn("n");

        let mut tweens = Tweens::new();
        tweens.add(Tween::new(TweenTarget::NodePosition(node), Vec3::X, 1.0));
        graph.remove(node);

        tweens.update(0.016, &mut graph, &mut camera);
        assert!(tweens.is_empty());
    }
}
