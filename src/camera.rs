//! The single shared camera for the backdrop scene.
//!
//! One camera lives for the whole process; page scenes never create their
//! own. They may move it (directly in an updater, or smoothly through a
//! camera tween) but the projection setup is owned here.

use glam::{Mat4, Vec3};

/// Perspective camera with position, view direction, and field of view.
#[derive(Clone, Copy, Debug)]
pub struct Camera {
    /// World-space position.
    pub position: Vec3,
    /// Normalised view direction.
    pub forward: Vec3,
    /// Up vector.
    pub up: Vec3,
    /// Vertical field of view in radians.
    pub fov: f32,
    /// Width / height of the viewport, kept in sync on resize.
    pub aspect: f32,
    /// Near clip plane distance.
    pub near: f32,
    /// Far clip plane distance.
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        // The backdrop camera starts pulled back and below the origin so
        // page content placed around the origin reads as distant scenery.
        Self {
            position: Vec3::new(-20.0, -30.0, 80.0),
            forward: Vec3::NEG_Z,
            up: Vec3::Y,
            fov: 50f32.to_radians(),
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 2000.0,
        }
    }
}

impl Camera {
    pub fn new() -> Self {
        Self::default()
    }

    /// Point the camera at a world-space target.
    pub fn look_at(&mut self, target: Vec3) {
        let dir = target - self.position;
        if dir.length_squared() > 0.0 {
            self.forward = dir.normalize();
        }
    }

    /// Update the aspect ratio after a viewport resize.
    pub fn set_aspect(&mut self, width: u32, height: u32) {
        if height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    /// World-to-camera transformation.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_to_rh(self.position, self.forward, self.up)
    }

    /// Camera-to-clip transformation.
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far)
    }

    /// Combined view-projection matrix.
    pub fn view_proj(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn look_at_normalises_forward() {
        let mut cam = Camera::new();
        cam.position = Vec3::ZERO;
        cam.look_at(Vec3::new(0.0, 0.0, -10.0));
        assert!((cam.forward - Vec3::NEG_Z).length() < 1e-6);
        assert!((cam.forward.length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn aspect_ignores_zero_height() {
        let mut cam = Camera::new();
        let before = cam.aspect;
        cam.set_aspect(800, 0);
        assert_eq!(cam.aspect, before);
        cam.set_aspect(200, 100);
        assert_eq!(cam.aspect, 2.0);
    }
}
