//! Hit testing: ray → primitives, and selection frustum → entities.
//!
//! Ray picking reports every pickable, visible primitive the ray touches,
//! nearest first, each resolved to its owning entity. Frustum picking tests
//! the world-space center of each primitive's bounding box.

use crate::camera::PerspectiveCamera;
use crate::frustum::Frustum;
use crate::ray::Ray;
use glam::{Mat4, Vec2, Vec3};
use indexmap::IndexSet;
use ng_core::{EntityKinds, OwnerLookup, PickableEntity, Primitive, PrimitiveId, Scene, Shape};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub entity: PickableEntity,
    pub primitive: PrimitiveId,
    /// World-space intersection point. For lines, the closest point on the line.
    pub point: Vec3,
    /// Distance from the ray origin.
    pub distance: f32,
}

/// All primitives hit by `ray`, nearest first. Equal distances keep scene
/// insertion order, so the result is deterministic.
pub fn pick_at(scene: &Scene, owners: &impl OwnerLookup, ray: &Ray, line_threshold: f32) -> Vec<Hit> {
    let mut hits: Vec<Hit> = scene
        .iter()
        .filter(|(_, p)| p.visible && p.pickable)
        .filter_map(|(id, p)| {
            let entity = owners.owner_of(id)?;
            let (point, distance) = intersect(p, scene.root_transform(), ray, line_threshold)?;
            Some(Hit {
                entity,
                primitive: id,
                point,
                distance,
            })
        })
        .collect();
    hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    log::trace!("pick: {} hit(s)", hits.len());
    hits
}

/// The first hit whose kind is enabled. Hits of disabled kinds in front of
/// it are skipped, not treated as occluders.
pub fn nearest_eligible(hits: &[Hit], enabled: EntityKinds) -> Option<Hit> {
    hits.iter()
        .find(|hit| enabled.intersects(hit.entity.kind()))
        .copied()
}

/// Entities of an enabled kind with at least one primitive centered inside
/// the frustum, each once, in scene order.
pub fn pick_in_frustum(
    scene: &Scene,
    owners: &impl OwnerLookup,
    frustum: &Frustum,
    enabled: EntityKinds,
) -> Vec<PickableEntity> {
    let found: IndexSet<PickableEntity> = scene
        .iter()
        .filter(|(_, p)| p.visible && p.pickable)
        .filter_map(|(id, p)| {
            let entity = owners.owner_of(id)?;
            if !enabled.intersects(entity.kind()) {
                return None;
            }
            let center = p.world_center(scene.root_transform())?;
            frustum.contains_point(center).then_some(entity)
        })
        .collect();
    found.into_iter().collect()
}

/// Frustum picking behind the NDC rectangle spanned by `a` and `b`.
pub fn pick_in_rect(
    scene: &Scene,
    owners: &impl OwnerLookup,
    camera: &PerspectiveCamera,
    a: Vec2,
    b: Vec2,
    enabled: EntityKinds,
) -> Vec<PickableEntity> {
    let frustum = Frustum::from_ndc_rect(camera, a, b);
    pick_in_frustum(scene, owners, &frustum, enabled)
}

fn intersect(p: &Primitive, root: Mat4, ray: &Ray, line_threshold: f32) -> Option<(Vec3, f32)> {
    match &p.shape {
        Shape::Mesh { triangles, .. } => {
            let world: Vec<Vec3> = p.world_points(root).collect();
            triangles
                .iter()
                .filter_map(|&[a, b, c]| {
                    let v = |i: u32| world.get(i as usize).copied();
                    ray.intersect_triangle(v(a)?, v(b)?, v(c)?)
                })
                .min_by(|a, b| a.total_cmp(b))
                .map(|t| (ray.at(t), t))
        }
        Shape::Polyline { .. } => {
            let world: Vec<Vec3> = p.world_points(root).collect();
            nearest_segment(ray, world.windows(2).map(|w| (w[0], w[1])), line_threshold)
        }
        Shape::Outline { .. } => {
            let world: Vec<Vec3> = p.world_points(root).collect();
            let closing = world.last().copied().zip(world.first().copied());
            let segments = world.windows(2).map(|w| (w[0], w[1])).chain(closing);
            nearest_segment(ray, segments, line_threshold)
        }
    }
}

fn nearest_segment(
    ray: &Ray,
    segments: impl Iterator<Item = (Vec3, Vec3)>,
    threshold: f32,
) -> Option<(Vec3, f32)> {
    let threshold_sq = threshold * threshold;
    segments
        .map(|(a, b)| ray.approach_segment(a, b))
        .filter(|hit| hit.distance_sq <= threshold_sq)
        .map(|hit| (hit.on_segment, ray.origin.distance(hit.on_ray)))
        .min_by(|a, b| a.1.total_cmp(&b.1))
}
