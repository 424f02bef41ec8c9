//! Geometry resources and procedural primitives.
//!
//! A [`Geometry`] holds CPU-side vertex/index data plus disposal and dirty
//! tracking. The renderer uploads geometries lazily, re-uploads when marked
//! dirty (particle systems rewrite their vertices every frame), and drops
//! the GPU buffers once the geometry is disposed.
//!
//! # Vertex Layout
//!
//! [`Vertex3d`] occupies 32 bytes: position (12) + normal (12) + uv (8).
//! The layout is exposed via [`Vertex3d::LAYOUT`] for pipeline creation.

use std::cell::{Cell, RefCell};
use std::sync::atomic::{AtomicU64, Ordering};

/// A vertex with position, normal, and texture coordinates.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex3d {
    /// Model-space position.
    pub position: [f32; 3],
    /// Surface normal; should be normalised for correct lighting.
    pub normal: [f32; 3],
    /// Texture coordinates, typically in [0, 1].
    pub uv: [f32; 2],
}

impl Vertex3d {
    pub fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            uv,
        }
    }

    /// The wgpu vertex buffer layout descriptor for this vertex type.
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex3d>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            },
            wgpu::VertexAttribute {
                offset: 12,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x3,
            },
            wgpu::VertexAttribute {
                offset: 24,
                shader_location: 2,
                format: wgpu::VertexFormat::Float32x2,
            },
        ],
    };
}

/// How the vertex stream is assembled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Topology {
    /// Indexed triangle list.
    Triangles,
    /// Unindexed point cloud (particles, starfields).
    Points,
}

/// Process-unique identifier for a geometry, used as the renderer's cache key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GeometryId(pub u64);

static NEXT_GEOMETRY_ID: AtomicU64 = AtomicU64::new(1);

/// Vertex/index data with disposal and dirty tracking.
///
/// Shared via `Rc`: the owning scene node keeps one handle and a page's
/// updater may keep another to mutate vertices per frame.
#[derive(Debug)]
pub struct Geometry {
    id: GeometryId,
    pub topology: Topology,
    /// Mutable vertex data; call [`mark_dirty`](Self::mark_dirty) after
    /// editing so the renderer re-uploads.
    pub vertices: RefCell<Vec<Vertex3d>>,
    /// Triangle indices; empty for point clouds.
    pub indices: Vec<u32>,
    dirty: Cell<bool>,
    disposed: Cell<bool>,
}

impl Geometry {
    pub fn new(topology: Topology, vertices: Vec<Vertex3d>, indices: Vec<u32>) -> Self {
        Self {
            id: GeometryId(NEXT_GEOMETRY_ID.fetch_add(1, Ordering::Relaxed)),
            topology,
            vertices: RefCell::new(vertices),
            indices,
            dirty: Cell::new(false),
            disposed: Cell::new(false),
        }
    }

    pub fn id(&self) -> GeometryId {
        self.id
    }

    /// Flag the vertex data as changed so the GPU copy is refreshed.
    pub fn mark_dirty(&self) {
        self.dirty.set(true);
    }

    /// Consume the dirty flag (renderer only).
    pub(crate) fn take_dirty(&self) -> bool {
        self.dirty.replace(false)
    }

    /// Mark the geometry released. Idempotent.
    pub fn dispose(&self) {
        self.disposed.set(true);
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.get()
    }

    /// UV sphere centred at the origin.
    pub fn sphere(radius: f32, segments: u32, rings: u32) -> Self {
        let mut vertices = Vec::new();
        let mut indices = Vec::new();

        for ring in 0..=rings {
            let phi = std::f32::consts::PI * ring as f32 / rings as f32;
            let y = phi.cos();
            let ring_radius = phi.sin();

            for seg in 0..=segments {
                let theta = 2.0 * std::f32::consts::PI * seg as f32 / segments as f32;
                let x = ring_radius * theta.cos();
                let z = ring_radius * theta.sin();

                let position = [x * radius, y * radius, z * radius];
                let normal = [x, y, z];
                let uv = [seg as f32 / segments as f32, ring as f32 / rings as f32];

                vertices.push(Vertex3d::new(position, normal, uv));
            }
        }

        for ring in 0..rings {
            for seg in 0..segments {
                let current = ring * (segments + 1) + seg;
                let next = current + segments + 1;

                indices.push(current);
                indices.push(next);
                indices.push(current + 1);

                indices.push(current + 1);
                indices.push(next);
                indices.push(next + 1);
            }
        }

        Self::new(Topology::Triangles, vertices, indices)
    }

    /// Flat annulus on the XZ plane, normals up, `u` running inner to outer.
    pub fn ring(inner_radius: f32, outer_radius: f32, segments: u32) -> Self {
        let mut vertices = Vec::new();
        let mut indices = Vec::new();

        for seg in 0..=segments {
            let theta = 2.0 * std::f32::consts::PI * seg as f32 / segments as f32;
            let (sin, cos) = theta.sin_cos();
            let v = seg as f32 / segments as f32;

            vertices.push(Vertex3d::new(
                [cos * inner_radius, 0.0, sin * inner_radius],
                [0.0, 1.0, 0.0],
                [0.0, v],
            ));
            vertices.push(Vertex3d::new(
                [cos * outer_radius, 0.0, sin * outer_radius],
                [0.0, 1.0, 0.0],
                [1.0, v],
            ));
        }

        for seg in 0..segments {
            let i = seg * 2;
            indices.push(i);
            indices.push(i + 1);
            indices.push(i + 2);

            indices.push(i + 2);
            indices.push(i + 1);
            indices.push(i + 3);
        }

        Self::new(Topology::Triangles, vertices, indices)
    }

    /// Axis-aligned cuboid centred at the origin.
    pub fn cuboid(width: f32, height: f32, depth: f32) -> Self {
        let (hx, hy, hz) = (width * 0.5, height * 0.5, depth * 0.5);
        #[rustfmt::skip]
        let vertices = vec![
            // Front (Z+)
            Vertex3d::new([-hx, -hy,  hz], [ 0.0,  0.0,  1.0], [0.0, 0.0]),
            Vertex3d::new([ hx, -hy,  hz], [ 0.0,  0.0,  1.0], [1.0, 0.0]),
            Vertex3d::new([ hx,  hy,  hz], [ 0.0,  0.0,  1.0], [1.0, 1.0]),
            Vertex3d::new([-hx,  hy,  hz], [ 0.0,  0.0,  1.0], [0.0, 1.0]),
            // Back (Z-)
            Vertex3d::new([ hx, -hy, -hz], [ 0.0,  0.0, -1.0], [0.0, 0.0]),
            Vertex3d::new([-hx, -hy, -hz], [ 0.0,  0.0, -1.0], [1.0, 0.0]),
            Vertex3d::new([-hx,  hy, -hz], [ 0.0,  0.0, -1.0], [1.0, 1.0]),
            Vertex3d::new([ hx,  hy, -hz], [ 0.0,  0.0, -1.0], [0.0, 1.0]),
            // Right (X+)
            Vertex3d::new([ hx, -hy,  hz], [ 1.0,  0.0,  0.0], [0.0, 0.0]),
            Vertex3d::new([ hx, -hy, -hz], [ 1.0,  0.0,  0.0], [1.0, 0.0]),
            Vertex3d::new([ hx,  hy, -hz], [ 1.0,  0.0,  0.0], [1.0, 1.0]),
            Vertex3d::new([ hx,  hy,  hz], [ 1.0,  0.0,  0.0], [0.0, 1.0]),
            // Left (X-)
            Vertex3d::new([-hx, -hy, -hz], [-1.0,  0.0,  0.0], [0.0, 0.0]),
            Vertex3d::new([-hx, -hy,  hz], [-1.0,  0.0,  0.0], [1.0, 0.0]),
            Vertex3d::new([-hx,  hy,  hz], [-1.0,  0.0,  0.0], [1.0, 1.0]),
            Vertex3d::new([-hx,  hy, -hz], [-1.0,  0.0,  0.0], [0.0, 1.0]),
            // Top (Y+)
            Vertex3d::new([-hx,  hy,  hz], [ 0.0,  1.0,  0.0], [0.0, 0.0]),
            Vertex3d::new([ hx,  hy,  hz], [ 0.0,  1.0,  0.0], [1.0, 0.0]),
            Vertex3d::new([ hx,  hy, -hz], [ 0.0,  1.0,  0.0], [1.0, 1.0]),
            Vertex3d::new([-hx,  hy, -hz], [ 0.0,  1.0,  0.0], [0.0, 1.0]),
            // Bottom (Y-)
            Vertex3d::new([-hx, -hy, -hz], [ 0.0, -1.0,  0.0], [0.0, 0.0]),
            Vertex3d::new([ hx, -hy, -hz], [ 0.0, -1.0,  0.0], [1.0, 0.0]),
            Vertex3d::new([ hx, -hy,  hz], [ 0.0, -1.0,  0.0], [1.0, 1.0]),
            Vertex3d::new([-hx, -hy,  hz], [ 0.0, -1.0,  0.0], [0.0, 1.0]),
        ];

        let mut indices = Vec::with_capacity(36);
        for face in 0..6u32 {
            let base = face * 4;
            indices.extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
        }

        Self::new(Topology::Triangles, vertices, indices)
    }

    /// Unindexed point cloud from raw positions.
    pub fn points(positions: &[[f32; 3]]) -> Self {
        let vertices = positions
            .iter()
            .map(|p| Vertex3d::new(*p, [0.0, 1.0, 0.0], [0.0, 0.0]))
            .collect();
        Self::new(Topology::Points, vertices, Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sphere_counts() {
        let g = Geometry::sphere(1.0, 8, 4);
        assert_eq!(g.vertices.borrow().len(), (8 + 1) * (4 + 1));
        assert_eq!(g.indices.len(), (8 * 4 * 6) as usize);
        // All indices must address a valid vertex.
        let n = g.vertices.borrow().len() as u32;
        assert!(g.indices.iter().all(|&i| i < n));
    }

    #[test]
    fn ring_radii() {
        let g = Geometry::ring(1.25, 3.5, 16);
        let verts = g.vertices.borrow();
        for pair in verts.chunks(2) {
            let r_inner = (pair[0].position[0].powi(2) + pair[0].position[2].powi(2)).sqrt();
            let r_outer = (pair[1].position[0].powi(2) + pair[1].position[2].powi(2)).sqrt();
            assert!((r_inner - 1.25).abs() < 1e-4);
            assert!((r_outer - 3.5).abs() < 1e-4);
        }
        let n = verts.len() as u32;
        assert!(g.indices.iter().all(|&i| i < n));
    }

    #[test]
    fn dirty_flag_is_consumed_once() {
        let g = Geometry::points(&[[0.0, 0.0, 0.0]]);
        assert!(!g.take_dirty());
        g.mark_dirty();
        assert!(g.take_dirty());
        assert!(!g.take_dirty());
    }
}
