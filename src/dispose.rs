//! Deep disposal of scene subtrees.
//!
//! One shared traversal frees every GPU-backed resource reachable from a
//! subtree — geometry, every material slot, and every texture-bearing slot
//! of every material — then detaches the root from its parent and frees the
//! nodes. Disposal markers are idempotent cells, so calling this twice on
//! the same (by then stale) root is harmless.

use crate::graph::{NodeId, SceneGraph};

/// Deep-dispose the subtree rooted at `root` and remove it from the graph.
///
/// Safe on nodes without meshes (skipped silently) and on stale ids
/// (complete no-op). Shared resources referenced from several nodes are
/// simply marked twice, which the markers absorb.
pub fn dispose_subtree(graph: &mut SceneGraph, root: NodeId) {
    let ids = graph.collect_subtree(root);
    if ids.is_empty() {
        return;
    }

    for &id in &ids {
        let Some(node) = graph.get(id) else { continue };
        let Some(mesh) = &node.mesh else { continue };

        mesh.geometry.dispose();
        for material in &mesh.materials {
            for texture in material.texture_slots() {
                texture.dispose();
            }
            material.dispose();
        }
    }

    graph.detach(root);
    for id in ids {
        graph.remove(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Geometry;
    use crate::graph::Mesh;
    use crate::material::Material;
    use crate::texture::Texture;
    use std::rc::Rc;

    fn textured_material() -> (Rc<Material>, Rc<Texture>, Rc<Texture>) {
        let map = Rc::new(Texture::from_rgba(vec![0; 4], 1, 1, "map"));
        let env = Rc::new(Texture::from_rgba(vec![0; 4], 1, 1, "env"));
        let mut mat = Material::new();
        mat.color_map = Some(Rc::clone(&map));
        mat.env_map = Some(Rc::clone(&env));
        (Rc::new(mat), map, env)
    }

    #[test]
    fn disposes_every_resource_and_detaches() {
        let mut g = SceneGraph::new();
        let layer = g.spawn("layer");
        let root = g.spawn_child(layer, "page");
        let inner = g.spawn_child(root, "inner");

        let geo = Rc::new(Geometry::sphere(1.0, 4, 2));
        let (mat, map, env) = textured_material();
        g.get_mut(inner).unwrap().mesh = Some(Mesh::new(Rc::clone(&geo), Rc::clone(&mat)));

        dispose_subtree(&mut g, root);

        assert!(geo.is_disposed());
        assert!(mat.is_disposed());
        assert!(map.is_disposed());
        assert!(env.is_disposed());
        assert!(!g.contains(root));
        assert!(!g.contains(inner));
        assert!(g.children_of(layer).is_empty());
    }

    #[test]
    fn repeat_disposal_is_a_no_op() {
        let mut g = SceneGraph::new();
        let root = g.spawn("page");
        let geo = Rc::new(Geometry::points(&[[0.0; 3]]));
        g.get_mut(root).unwrap().mesh = Some(Mesh::new(Rc::clone(&geo), Rc::new(Material::new())));

        dispose_subtree(&mut g, root);
        dispose_subtree(&mut g, root);
        assert!(geo.is_disposed());
        assert!(g.is_empty());
    }

    #[test]
    fn nodes_without_meshes_are_skipped() {
        let mut g = SceneGraph::new();
        let root = g.spawn("empty-group");
        let _child = g.spawn_child(root, "also-empty");
        dispose_subtree(&mut g, root);
        assert!(g.is_empty());
    }

    #[test]
    fn shared_resources_survive_double_marking() {
        let mut g = SceneGraph::new();
        let root = g.spawn("page");
        let a = g.spawn_child(root, "a");
        let b = g.spawn_child(root, "b");

        let geo = Rc::new(Geometry::cuboid(1.0, 1.0, 1.0));
        let mat = Rc::new(Material::new());
        g.get_mut(a).unwrap().mesh = Some(Mesh::new(Rc::clone(&geo), Rc::clone(&mat)));
        g.get_mut(b).unwrap().mesh = Some(Mesh::new(Rc::clone(&geo), Rc::clone(&mat)));

        dispose_subtree(&mut g, root);
        assert!(geo.is_disposed());
        assert!(mat.is_disposed());
    }
}
