//! Rays, planes and the intersection tests picking is built on.

use glam::Vec3;

const EPSILON: f32 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Unit length.
    pub direction: Vec3,
}

/// Closest approach between a ray and a segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentApproach {
    pub distance_sq: f32,
    pub on_ray: Vec3,
    pub on_segment: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Closest points between this ray (t ≥ 0) and segment `a`–`b`.
    pub fn approach_segment(&self, a: Vec3, b: Vec3) -> SegmentApproach {
        let d = self.direction;
        let seg = b - a;
        let r = self.origin - a;
        let dd = d.dot(d);
        let e = seg.dot(seg);
        let f = seg.dot(r);
        let c = d.dot(r);

        let (t, s) = if e <= EPSILON {
            ((-c / dd).max(0.0), 0.0)
        } else {
            let bb = d.dot(seg);
            let denom = dd * e - bb * bb;
            let t = if denom > EPSILON {
                ((bb * f - c * e) / denom).max(0.0)
            } else {
                0.0
            };
            let s = (bb * t + f) / e;
            if s < 0.0 {
                ((-c / dd).max(0.0), 0.0)
            } else if s > 1.0 {
                (((bb - c) / dd).max(0.0), 1.0)
            } else {
                (t, s)
            }
        };

        let on_ray = self.at(t);
        let on_segment = a + seg * s;
        SegmentApproach {
            distance_sq: on_ray.distance_squared(on_segment),
            on_ray,
            on_segment,
        }
    }

    /// Double-sided ray/triangle test. Returns the ray parameter of the hit.
    pub fn intersect_triangle(&self, v0: Vec3, v1: Vec3, v2: Vec3) -> Option<f32> {
        let e1 = v1 - v0;
        let e2 = v2 - v0;
        let p = self.direction.cross(e2);
        let det = e1.dot(p);
        if det.abs() < EPSILON {
            return None;
        }
        let inv = 1.0 / det;
        let s = self.origin - v0;
        let u = s.dot(p) * inv;
        if !(0.0..=1.0).contains(&u) {
            return None;
        }
        let q = s.cross(e1);
        let v = self.direction.dot(q) * inv;
        if v < 0.0 || u + v > 1.0 {
            return None;
        }
        let t = e2.dot(q) * inv;
        (t > EPSILON).then_some(t)
    }
}

/// Plane `normal · p + constant = 0`; positive distance on the normal side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub normal: Vec3,
    pub constant: f32,
}

impl Plane {
    pub fn from_normal_and_point(normal: Vec3, point: Vec3) -> Self {
        let normal = normal.normalize_or_zero();
        Self {
            normal,
            constant: -normal.dot(point),
        }
    }

    pub fn distance_to_point(&self, point: Vec3) -> f32 {
        self.normal.dot(point) + self.constant
    }

    /// Flip so that `inside` lies on the positive side.
    pub fn facing(self, inside: Vec3) -> Self {
        if self.distance_to_point(inside) < 0.0 {
            Self {
                normal: -self.normal,
                constant: -self.constant,
            }
        } else {
            self
        }
    }

    /// Where the ray crosses the plane, if ahead of its origin.
    pub fn intersect_ray(&self, ray: &Ray) -> Option<Vec3> {
        let denom = self.normal.dot(ray.direction);
        if denom.abs() < EPSILON {
            return None;
        }
        let t = -(self.normal.dot(ray.origin) + self.constant) / denom;
        (t >= 0.0).then(|| ray.at(t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn down_z() -> Ray {
        Ray::new(Vec3::new(0.0, 0.0, 10.0), Vec3::NEG_Z)
    }

    #[test]
    fn triangle_hit_from_either_side() {
        let (a, b, c) = (
            Vec3::new(-1.0, -1.0, 0.0),
            Vec3::new(1.0, -1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        );
        assert_eq!(down_z().intersect_triangle(a, b, c), Some(10.0));
        assert_eq!(down_z().intersect_triangle(a, c, b), Some(10.0));

        let miss = Ray::new(Vec3::new(5.0, 0.0, 10.0), Vec3::NEG_Z);
        assert_eq!(miss.intersect_triangle(a, b, c), None);

        let behind = Ray::new(Vec3::new(0.0, 0.0, -10.0), Vec3::NEG_Z);
        assert_eq!(behind.intersect_triangle(a, b, c), None);
    }

    #[test]
    fn segment_approach_crossing() {
        let ray = down_z();
        let hit = ray.approach_segment(Vec3::new(-5.0, 0.5, 0.0), Vec3::new(5.0, 0.5, 0.0));
        assert!((hit.distance_sq - 0.25).abs() < 1e-5);
        assert!(hit.on_segment.abs_diff_eq(Vec3::new(0.0, 0.5, 0.0), 1e-5));
        assert!(hit.on_ray.abs_diff_eq(Vec3::ZERO, 1e-5));
    }

    #[test]
    fn segment_approach_clamps_to_endpoint() {
        let ray = down_z();
        let hit = ray.approach_segment(Vec3::new(2.0, 0.0, 0.0), Vec3::new(5.0, 0.0, 0.0));
        assert!(hit.on_segment.abs_diff_eq(Vec3::new(2.0, 0.0, 0.0), 1e-5));
        assert!((hit.distance_sq - 4.0).abs() < 1e-4);
    }

    #[test]
    fn plane_crossing_and_facing() {
        let plane = Plane::from_normal_and_point(Vec3::Z, Vec3::new(0.0, 0.0, 2.0));
        assert_eq!(plane.intersect_ray(&down_z()), Some(Vec3::new(0.0, 0.0, 2.0)));
        let flipped = plane.facing(Vec3::ZERO);
        assert!(flipped.distance_to_point(Vec3::ZERO) > 0.0);
    }
}
