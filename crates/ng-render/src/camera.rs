//! Perspective camera with GL clip conventions.
//!
//! Normalized device coordinates run from −1 to 1 on every axis with +Y up.
//! `unproject` and `project` are exact inverses within float precision.

use crate::ray::Ray;
use glam::{Mat4, Vec2, Vec3};
use ng_core::config::{CameraConfig, ViewPortConfig};

#[derive(Debug, Clone, PartialEq)]
pub struct PerspectiveCamera {
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
}

impl PerspectiveCamera {
    pub fn new(fov: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            fov,
            aspect,
            near,
            far,
            position: Vec3::ZERO,
            target: Vec3::NEG_Z,
            up: Vec3::Y,
        }
    }

    pub fn from_config(camera: &CameraConfig, view_port: &ViewPortConfig) -> Self {
        let mut cam = Self::new(camera.fov, camera.aspect, camera.near, camera.far);
        cam.position = camera.position;
        cam.target = view_port.target_position;
        cam
    }

    pub fn look_at(&mut self, target: Vec3) {
        self.target = target;
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        if aspect > 0.0 && aspect.is_finite() {
            self.aspect = aspect;
        }
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh_gl(self.fov.to_radians(), self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection() * self.view()
    }

    /// Unit vector the camera looks along.
    pub fn world_direction(&self) -> Vec3 {
        (self.target - self.position).try_normalize().unwrap_or(Vec3::NEG_Z)
    }

    /// NDC point (x, y, depth) → world.
    pub fn unproject(&self, ndc: Vec3) -> Vec3 {
        self.view_projection().inverse().project_point3(ndc)
    }

    /// World point → NDC (x, y, depth).
    pub fn project(&self, world: Vec3) -> Vec3 {
        self.view_projection().project_point3(world)
    }

    /// Ray from the eye through the NDC point at mid depth.
    pub fn ray_from_ndc(&self, ndc: Vec2) -> Ray {
        let through = self.unproject(ndc.extend(0.5));
        let direction = (through - self.position)
            .try_normalize()
            .unwrap_or_else(|| self.world_direction());
        Ray::new(self.position, direction)
    }
}
