//! Home page: the red planet with an orbiting satellite and a drifting
//! astronaut.
//!
//! The load is staged with yields between the planet, satellite, and
//! astronaut so a navigation away mid-load cancels cleanly; whatever was
//! built so far is returned for reclamation.

use crate::geometry::Geometry;
use crate::graph::{Mesh, NodeId, SceneGraph};
use crate::material::{Color, Material};
use crate::pages::Rng;
use crate::scene::{LoadError, LoadFuture, LoadResult, PageContext, next_tick};
use glam::{EulerRot, Quat, Vec3};
use std::cell::Cell;
use std::rc::Rc;

const PLANET_RADIUS: f32 = 10.0;
const PLANET_TILT_DEG: f32 = 25.19;
const PLANET_SPIN: f32 = 0.015;

// Ornstein-Uhlenbeck drift parameters for the astronaut's idle float.
const DRIFT_K: f32 = 0.35;
const DRIFT_SIGMA: f32 = 0.10;
const DRIFT_MAX: f32 = 0.35;
const ROT_AMP_DEG: f32 = 8.0;
const TUMBLE_SPEED_X: f32 = 0.050;
const TUMBLE_SPEED_Y: f32 = 0.037;
const TUMBLE_SPEED_Z: f32 = 0.031;
const POS_SMOOTH_HZ: f32 = 2.5;
const ROT_SMOOTH_HZ: f32 = 2.0;

pub fn load(ctx: PageContext) -> LoadFuture {
    Box::pin(async move { build(ctx).await })
}

async fn build(ctx: PageContext) -> Result<LoadResult, LoadError> {
    let group = {
        let mut g = ctx.graph.borrow_mut();
        let group = g.spawn("home");
        if let Some(node) = g.get_mut(group) {
            node.transform.position = Vec3::new(-10.0, -30.0, 50.0);
        }
        group
    };

    // Planet first, it is the visual anchor.
    let surface = ctx
        .textures
        .get("gen:planet-surface")
        .unwrap_or_else(|| {
            ctx.textures
                .insert("gen:planet-surface", crate::texture::Texture::planet_surface(256, 7))
        });
    let planet = {
        let mut g = ctx.graph.borrow_mut();
        let planet = g.spawn_child(group, "planet");
        if let Some(node) = g.get_mut(planet) {
            node.mesh = Some(Mesh::new(
                Rc::new(Geometry::sphere(PLANET_RADIUS, 96, 64)),
                Rc::new(Material {
                    emissive: Color::rgb(0.13, 0.13, 0.13),
                    ..Material::textured(surface)
                }),
            ));
            node.transform.rotation = Quat::from_rotation_z(PLANET_TILT_DEG.to_radians());
        }
        planet
    };

    next_tick().await;
    if ctx.cancelled.is_cancelled() {
        return Ok(LoadResult::new(group));
    }

    let satellite = build_satellite(&mut ctx.graph.borrow_mut(), group);

    next_tick().await;
    if ctx.cancelled.is_cancelled() {
        return Ok(LoadResult::new(group));
    }

    let astronaut = build_astronaut(&mut ctx.graph.borrow_mut(), group);
    let (base_rotation, base_position) = {
        let g = ctx.graph.borrow();
        let node = g.get(astronaut);
        (
            node.map(|n| n.transform.rotation).unwrap_or(Quat::IDENTITY),
            node.map(|n| n.transform.position).unwrap_or(Vec3::ZERO),
        )
    };

    let disposed = Rc::new(Cell::new(false));
    let dispose_flag = disposed.clone();

    let graph = ctx.graph.clone();
    let mut rng = Rng::new(0xdeadbeef);
    let mut drift = Vec3::ZERO;
    let rot_amp = ROT_AMP_DEG.to_radians();
    let mut sat_rx = -0.5f32;
    let mut sat_ry = 0.125f32;

    let updater = Box::new(move |dt: f32, t: f32| {
        if disposed.get() {
            return;
        }
        let mut g = graph.borrow_mut();

        if let Some(node) = g.get_mut(planet) {
            node.transform.rotation *= Quat::from_rotation_y(PLANET_SPIN * dt);
        }

        // Astronaut: mean-reverting random drift around its base position,
        // plus a slow sinusoidal tumble, both smoothed exponentially.
        let sdt = dt.sqrt();
        drift += -DRIFT_K * drift * dt
            + DRIFT_SIGMA * sdt * Vec3::new(rng.signed(), rng.signed(), rng.signed());
        if drift.length() > DRIFT_MAX {
            drift = drift.normalize() * DRIFT_MAX;
        }
        if let Some(node) = g.get_mut(astronaut) {
            let target = base_position + drift;
            let alpha = 1.0 - (-POS_SMOOTH_HZ * dt).exp();
            node.transform.position = node.transform.position.lerp(target, alpha);

            let tumble = Quat::from_euler(
                EulerRot::XYZ,
                rot_amp * (std::f32::consts::TAU * TUMBLE_SPEED_X * t).sin(),
                rot_amp * (std::f32::consts::TAU * TUMBLE_SPEED_Y * t).sin(),
                rot_amp * (std::f32::consts::TAU * TUMBLE_SPEED_Z * t).cos(),
            );
            let desired = base_rotation * tumble;
            let alpha = 1.0 - (-ROT_SMOOTH_HZ * dt).exp();
            node.transform.rotation = node.transform.rotation.slerp(desired, alpha);
        }

        // Satellite: lazy rocking toward a wandering target attitude.
        if let Some(node) = g.get_mut(satellite) {
            let tx = -0.5 + 0.1 * (t * 0.5).sin();
            let ty = 0.125 + 0.1 * (t * 0.4).cos();
            sat_rx += (tx - sat_rx) * 0.1;
            sat_ry += (ty - sat_ry) * 0.1;
            node.transform.set_euler(sat_rx, sat_ry, 0.0);
        }
    });

    Ok(LoadResult::new(group)
        .with_updater(updater)
        .with_dispose(Box::new(move || dispose_flag.set(true))))
}

/// Boxy satellite: a body with two solar panels.
fn build_satellite(g: &mut SceneGraph, parent: NodeId) -> NodeId {
    let satellite = g.spawn_child(parent, "satellite");
    if let Some(node) = g.get_mut(satellite) {
        node.transform.position = Vec3::new(10.0, -(PLANET_RADIUS + 3.0), 0.0);
        node.transform.set_euler(-0.5, 0.125, 0.0);
    }

    let body_material = Rc::new(Material {
        emissive: Color::rgb(0.13, 0.13, 0.13),
        ..Material::colored(Color::rgb(0.75, 0.76, 0.8))
    });
    let panel_material = Rc::new(Material {
        emissive: Color::rgb(0.02, 0.03, 0.10),
        ..Material::colored(Color::rgb(0.15, 0.22, 0.55))
    });

    let body = g.spawn_child(satellite, "body");
    if let Some(node) = g.get_mut(body) {
        node.mesh = Some(Mesh::new(
            Rc::new(Geometry::cuboid(1.2, 1.0, 1.0)),
            body_material,
        ));
    }
    for (name, x) in [("panel-left", -1.9f32), ("panel-right", 1.9f32)] {
        let panel = g.spawn_child(satellite, name);
        if let Some(node) = g.get_mut(panel) {
            node.transform.position = Vec3::new(x, 0.0, 0.0);
            node.mesh = Some(Mesh::new(
                Rc::new(Geometry::cuboid(2.4, 0.05, 1.1)),
                panel_material.clone(),
            ));
        }
    }
    satellite
}

/// Simplified astronaut: a suited body with a helmet sphere.
fn build_astronaut(g: &mut SceneGraph, parent: NodeId) -> NodeId {
    let astronaut = g.spawn_child(parent, "astronaut");
    if let Some(node) = g.get_mut(astronaut) {
        node.transform.position = Vec3::new(10.0, -(PLANET_RADIUS + 30.0), 0.0);
        node.transform.set_euler(1.25, -1.0, 0.0);
    }

    let suit_material = Rc::new(Material {
        emissive: Color::rgb(0.13, 0.13, 0.13),
        ..Material::colored(Color::rgb(0.92, 0.92, 0.95))
    });

    let body = g.spawn_child(astronaut, "body");
    if let Some(node) = g.get_mut(body) {
        node.mesh = Some(Mesh::new(
            Rc::new(Geometry::cuboid(1.0, 1.6, 0.7)),
            suit_material.clone(),
        ));
    }
    let helmet = g.spawn_child(astronaut, "helmet");
    if let Some(node) = g.get_mut(helmet) {
        node.transform.position = Vec3::new(0.0, 1.15, 0.0);
        node.mesh = Some(Mesh::new(Rc::new(Geometry::sphere(0.45, 24, 16)), suit_material));
    }
    astronaut
}
