//! Selection frustum: the volume behind a screen-space rectangle.
//!
//! Four side planes pass through the eye and the edges of the rectangle;
//! the camera's near and far planes cap the volume. All normals point
//! inward, so a point is inside when every distance is non-negative.

use crate::camera::PerspectiveCamera;
use crate::ray::Plane;
use glam::{Vec2, Vec3};

/// Minimum NDC extent; a zero-width rectangle would collapse a side plane.
const MIN_EXTENT: f32 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    pub planes: [Plane; 6],
}

impl Frustum {
    /// Frustum behind the rectangle spanned by two NDC corners, in any order.
    pub fn from_ndc_rect(camera: &PerspectiveCamera, a: Vec2, b: Vec2) -> Self {
        let mut min = a.min(b);
        let mut max = a.max(b);
        if max.x - min.x < MIN_EXTENT {
            max.x = min.x + MIN_EXTENT;
        }
        if max.y - min.y < MIN_EXTENT {
            min.y = max.y - MIN_EXTENT;
        }

        let eye = camera.position;
        let forward = camera.world_direction();
        let corner = |x: f32, y: f32| camera.ray_from_ndc(Vec2::new(x, y)).direction;
        let dirs = [
            corner(min.x, max.y),
            corner(max.x, max.y),
            corner(max.x, min.y),
            corner(min.x, min.y),
        ];
        let inside = eye + camera.ray_from_ndc((min + max) * 0.5).direction * camera.near.max(1.0);

        let side = |i: usize| {
            let normal = dirs[i].cross(dirs[(i + 1) % 4]);
            Plane::from_normal_and_point(normal, eye).facing(inside)
        };

        Self {
            planes: [
                side(0),
                side(1),
                side(2),
                side(3),
                Plane::from_normal_and_point(forward, eye + forward * camera.near),
                Plane::from_normal_and_point(-forward, eye + forward * camera.far),
            ],
        }
    }

    pub fn contains_point(&self, point: Vec3) -> bool {
        self.planes.iter().all(|p| p.distance_to_point(point) >= 0.0)
    }
}
