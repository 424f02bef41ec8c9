//! Retained scene graph with generational node ids.
//!
//! The graph outlives every page: the manager owns two persistent roots
//! (`world` and the page layer) and page loaders allocate subtrees that are
//! attached, updated, and eventually deep-disposed as navigation happens.
//! Generational ids make stale handles harmless — operations on a removed
//! node are silent no-ops, which is what lets disposal be idempotent.

use crate::geometry::Geometry;
use crate::material::Material;
use glam::{EulerRot, Mat4, Quat, Vec3};
use std::rc::Rc;

/// Handle to a node in a [`SceneGraph`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

/// Position, rotation, and scale for a node, relative to its parent.
#[derive(Clone, Copy, Debug)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Set rotation from XYZ Euler angles in radians.
    pub fn set_euler(&mut self, x: f32, y: f32, z: f32) {
        self.rotation = Quat::from_euler(EulerRot::XYZ, x, y, z);
    }

    /// Local transformation matrix in scale-rotate-translate order.
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }
}

/// Renderable payload: one geometry plus its material slots.
#[derive(Clone)]
pub struct Mesh {
    pub geometry: Rc<Geometry>,
    pub materials: Vec<Rc<Material>>,
}

impl Mesh {
    pub fn new(geometry: Rc<Geometry>, material: Rc<Material>) -> Self {
        Self {
            geometry,
            materials: vec![material],
        }
    }
}

/// A single node: transform, optional mesh, and parent/child links.
pub struct Node {
    pub name: String,
    pub transform: Transform,
    pub mesh: Option<Mesh>,
    pub visible: bool,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// Generational arena of scene nodes.
#[derive(Default)]
pub struct SceneGraph {
    slots: Vec<Slot>,
    free: Vec<u32>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a detached node.
    pub fn spawn(&mut self, name: &str) -> NodeId {
        let node = Node {
            name: name.to_string(),
            transform: Transform::default(),
            mesh: None,
            visible: true,
            parent: None,
            children: Vec::new(),
        };

        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.generation += 1;
            slot.node = Some(node);
            NodeId {
                index,
                generation: slot.generation,
            }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                node: Some(node),
            });
            NodeId {
                index,
                generation: 0,
            }
        }
    }

    /// Allocate a node already attached under `parent`.
    pub fn spawn_child(&mut self, parent: NodeId, name: &str) -> NodeId {
        let id = self.spawn(name);
        self.attach(parent, id);
        id
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.slots
            .get(id.index as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.node.as_ref())
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.node.as_mut())
    }

    /// Parent `child` under `parent`, detaching from any previous parent.
    /// No-op if either id is stale.
    pub fn attach(&mut self, parent: NodeId, child: NodeId) {
        if !self.contains(parent) || !self.contains(child) || parent == child {
            return;
        }
        self.detach(child);
        if let Some(p) = self.get_mut(parent) {
            p.children.push(child);
        }
        if let Some(c) = self.get_mut(child) {
            c.parent = Some(parent);
        }
    }

    /// Remove `child` from its parent's child list. Safe on detached or
    /// stale ids.
    pub fn detach(&mut self, child: NodeId) {
        let Some(parent) = self.get(child).and_then(|n| n.parent) else {
            return;
        };
        if let Some(p) = self.get_mut(parent) {
            p.children.retain(|&c| c != child);
        }
        if let Some(c) = self.get_mut(child) {
            c.parent = None;
        }
    }

    /// The node's children, cloned so the caller can mutate the graph while
    /// iterating.
    pub fn children_of(&self, id: NodeId) -> Vec<NodeId> {
        self.get(id).map(|n| n.children.clone()).unwrap_or_default()
    }

    /// All ids in the subtree rooted at `id`, root first. Empty for stale ids.
    pub fn collect_subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if let Some(node) = self.get(next) {
                out.push(next);
                stack.extend(node.children.iter().copied());
            }
        }
        out
    }

    /// Free a single node's slot. The caller is responsible for having
    /// detached it and handled its children.
    pub(crate) fn remove(&mut self, id: NodeId) {
        if let Some(slot) = self
            .slots
            .get_mut(id.index as usize)
            .filter(|s| s.generation == id.generation)
        {
            if slot.node.take().is_some() {
                self.free.push(id.index);
            }
        }
    }

    /// Model-to-world matrix accumulated through the parent chain.
    pub fn world_matrix(&self, id: NodeId) -> Mat4 {
        let mut matrix = Mat4::IDENTITY;
        let mut current = Some(id);
        while let Some(node_id) = current {
            let Some(node) = self.get(node_id) else { break };
            matrix = node.transform.matrix() * matrix;
            current = node.parent;
        }
        matrix
    }

    /// Ids of all parentless live nodes, in slot order.
    pub fn roots(&self) -> Vec<NodeId> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| {
                let node = slot.node.as_ref()?;
                node.parent.is_none().then_some(NodeId {
                    index: index as u32,
                    generation: slot.generation,
                })
            })
            .collect()
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.node.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attach_and_detach() {
        let mut g = SceneGraph::new();
        let root = g.spawn("root");
        let child = g.spawn_child(root, "child");

        assert_eq!(g.get(child).unwrap().parent(), Some(root));
        assert_eq!(g.children_of(root), vec![child]);

        g.detach(child);
        assert_eq!(g.get(child).unwrap().parent(), None);
        assert!(g.children_of(root).is_empty());

        // Detaching again is a no-op.
        g.detach(child);
    }

    #[test]
    fn reattach_moves_between_parents() {
        let mut g = SceneGraph::new();
        let a = g.spawn("a");
        let b = g.spawn("b");
        let child = g.spawn_child(a, "child");

        g.attach(b, child);
        assert!(g.children_of(a).is_empty());
        assert_eq!(g.children_of(b), vec![child]);
    }

    #[test]
    fn stale_ids_are_inert() {
        let mut g = SceneGraph::new();
        let root = g.spawn("root");
        let child = g.spawn_child(root, "child");

        g.detach(child);
        g.remove(child);
        assert!(!g.contains(child));

        // A new node may reuse the slot; the old id must not resolve to it.
        let replacement = g.spawn("replacement");
        assert!(g.contains(replacement));
        assert!(!g.contains(child));
        g.attach(root, child); // silently ignored
        assert!(g.children_of(root).is_empty());
    }

    #[test]
    fn collect_subtree_is_exhaustive() {
        let mut g = SceneGraph::new();
        let root = g.spawn("root");
        let a = g.spawn_child(root, "a");
        let b = g.spawn_child(root, "b");
        let aa = g.spawn_child(a, "aa");

        let ids = g.collect_subtree(root);
        assert_eq!(ids.len(), 4);
        for id in [root, a, b, aa] {
            assert!(ids.contains(&id));
        }
        assert_eq!(ids[0], root);
    }

    #[test]
    fn world_matrix_composes_parents() {
        let mut g = SceneGraph::new();
        let root = g.spawn("root");
        let child = g.spawn_child(root, "child");

        g.get_mut(root).unwrap().transform.position = Vec3::new(10.0, 0.0, 0.0);
        g.get_mut(child).unwrap().transform.position = Vec3::new(0.0, 5.0, 0.0);

        let world = g.world_matrix(child);
        let p = world.transform_point3(Vec3::ZERO);
        assert!((p - Vec3::new(10.0, 5.0, 0.0)).length() < 1e-5);
    }
}
