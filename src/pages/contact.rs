//! Contact page: a black hole with a photon ring, accretion disk, and
//! infalling particle cloud.

use crate::geometry::Geometry;
use crate::graph::Mesh;
use crate::material::{Blend, Color, Material};
use crate::pages::Rng;
use crate::scene::{LoadError, LoadFuture, LoadResult, PageContext};
use glam::{Quat, Vec3};
use std::cell::Cell;
use std::rc::Rc;

const DISK_INNER: f32 = 1.25;
const DISK_OUTER: f32 = 3.5;
const DISK_SEGMENTS: u32 = 256;
const DISK_SPIN: f32 = 0.25;
const PARTICLE_COUNT: usize = 1200;

pub fn load(ctx: PageContext) -> LoadFuture {
    Box::pin(async move { build(ctx) })
}

fn build(ctx: PageContext) -> Result<LoadResult, LoadError> {
    let mut g = ctx.graph.borrow_mut();

    let group = g.spawn("contact");
    let root = g.spawn_child(group, "black-hole");
    if let Some(node) = g.get_mut(root) {
        node.transform.position = Vec3::new(0.0, -30.0, -120.0);
        node.transform.scale = Vec3::splat(40.0);
    }

    // Event horizon: a featureless black sphere.
    let horizon = g.spawn_child(root, "horizon");
    if let Some(node) = g.get_mut(horizon) {
        node.mesh = Some(Mesh::new(
            Rc::new(Geometry::sphere(1.0, 48, 32)),
            Rc::new(Material {
                unlit: true,
                ..Material::colored(Color::BLACK)
            }),
        ));
    }

    // Photon ring: a slightly larger additive glow shell.
    let ring = g.spawn_child(root, "photon-ring");
    if let Some(node) = g.get_mut(ring) {
        node.mesh = Some(Mesh::new(
            Rc::new(Geometry::sphere(1.06, 48, 32)),
            Rc::new(Material {
                emissive: Color::hex(0xffe7b0),
                unlit: true,
                blend: Blend::Additive,
                ..Material::colored(Color::BLACK.with_alpha(0.0))
            }),
        ));
    }

    // Accretion disk: flat annulus with a warm-to-violet radial ramp.
    let ramp = ctx.textures.get("gen:disk-ramp").unwrap_or_else(|| {
        ctx.textures.insert(
            "gen:disk-ramp",
            crate::texture::Texture::gradient(256, [0xff, 0xc3, 0x6b], [0x99, 0x44, 0xff]),
        )
    });
    let disk = g.spawn_child(root, "accretion-disk");
    if let Some(node) = g.get_mut(disk) {
        node.mesh = Some(Mesh::new(
            Rc::new(Geometry::ring(DISK_INNER, DISK_OUTER, DISK_SEGMENTS)),
            Rc::new(Material {
                unlit: true,
                blend: Blend::Additive,
                ..Material::textured(ramp)
            }),
        ));
    }

    // Infall particles, respawned at the rim once they cross the horizon.
    let mut rng = Rng::new(0x51f15eed);
    let mut speeds = Vec::with_capacity(PARTICLE_COUNT);
    let mut positions = Vec::with_capacity(PARTICLE_COUNT);
    for _ in 0..PARTICLE_COUNT {
        let r = rng.range(DISK_OUTER * 0.9, DISK_OUTER * 1.2);
        let a = rng.unit() * std::f32::consts::TAU;
        positions.push([a.cos() * r, rng.signed() * 0.25, a.sin() * r]);
        speeds.push(rng.range(0.2, 0.7));
    }
    let particle_geometry = Rc::new(Geometry::points(&positions));
    let particles = g.spawn_child(root, "infall-particles");
    if let Some(node) = g.get_mut(particles) {
        node.mesh = Some(Mesh::new(
            particle_geometry.clone(),
            Rc::new(Material {
                unlit: true,
                blend: Blend::Additive,
                ..Material::colored(Color::hex(0xffaa88).with_alpha(0.9))
            }),
        ));
    }
    drop(g);

    let disposed = Rc::new(Cell::new(false));
    let dispose_flag = disposed.clone();

    let graph = ctx.graph.clone();
    let camera = ctx.camera.clone();
    let updater = Box::new(move |dt: f32, _t: f32| {
        if disposed.get() {
            return;
        }

        if let Some(node) = graph.borrow_mut().get_mut(disk) {
            node.transform.rotation *= Quat::from_rotation_y(DISK_SPIN * dt);
        }

        // The contact view owns the camera outright.
        camera.borrow_mut().position = Vec3::new(-20.0, -30.0, 80.0);

        // Spiral each particle inward; angular speed falls off like 1/r.
        {
            let mut vertices = particle_geometry.vertices.borrow_mut();
            for (vertex, speed) in vertices.iter_mut().zip(&speeds) {
                let [x, y, z] = vertex.position;
                let r = x.hypot(z).max(0.2);
                let angle = z.atan2(x) + speed * (1.2 / r) * dt;

                let r_new = r - dt * speed * 0.15;
                let y_new = y * (1.0 - dt * 0.35);

                if r_new < DISK_INNER * 0.95 {
                    let r_spawn = rng.range(DISK_OUTER * 0.9, DISK_OUTER * 1.2);
                    let a_spawn = rng.unit() * std::f32::consts::TAU;
                    vertex.position =
                        [a_spawn.cos() * r_spawn, rng.signed() * 0.25, a_spawn.sin() * r_spawn];
                } else {
                    vertex.position = [angle.cos() * r_new, y_new, angle.sin() * r_new];
                }
            }
        }
        particle_geometry.mark_dirty();
    });

    Ok(LoadResult::new(group)
        .with_updater(updater)
        .with_dispose(Box::new(move || dispose_flag.set(true))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn particles_drift_inward_without_escaping() {
        let mut rng = Rng::new(42);
        let mut r = DISK_OUTER * 1.1;
        let speed = 0.5;
        // Many steps of pure inward drift must eventually cross the respawn
        // threshold, never going negative.
        let mut crossed = false;
        for _ in 0..10_000 {
            r -= 0.016 * speed * 0.15;
            if r < DISK_INNER * 0.95 {
                r = rng.range(DISK_OUTER * 0.9, DISK_OUTER * 1.2);
                crossed = true;
            }
            assert!(r > 0.0);
        }
        assert!(crossed);
    }
}
