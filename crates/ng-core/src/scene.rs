//! Renderable scene: a flat store of primitives keyed by [`PrimitiveId`].
//!
//! The scene knows nothing about nodes or edges. Every primitive holds a
//! shape in its own local space plus a transform into graph space; the
//! scene's root matrix carries graph space into world space. Picking and
//! the renderer both read the same data. Ownership (which logical entity a
//! primitive belongs to) lives in the registry.

use crate::model::Color;
use glam::{Mat4, Vec3};
use indexmap::IndexMap;

/// Opaque handle to a primitive in the [`Scene`]. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PrimitiveId(pub u32);

/// Which part of an entity a primitive draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveLayer {
    Body,
    Label,
    Icon,
    /// Selection outline; never pickable.
    Border,
    Line,
    Arrow,
}

/// Local-space geometry.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// Filled triangles.
    Mesh {
        vertices: Vec<Vec3>,
        triangles: Vec<[u32; 3]>,
    },
    /// Open line strip.
    Polyline { points: Vec<Vec3> },
    /// Closed line loop.
    Outline { points: Vec<Vec3> },
}

impl Shape {
    pub fn points(&self) -> &[Vec3] {
        match self {
            Shape::Mesh { vertices, .. } => vertices,
            Shape::Polyline { points } | Shape::Outline { points } => points,
        }
    }

    /// Axis-aligned bounds in local space, or `None` for an empty shape.
    pub fn local_bounds(&self) -> Option<(Vec3, Vec3)> {
        let mut points = self.points().iter();
        let first = *points.next()?;
        Some(points.fold((first, first), |(min, max), p| (min.min(*p), max.max(*p))))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Primitive {
    pub shape: Shape,
    pub layer: PrimitiveLayer,
    pub color: Color,
    pub visible: bool,
    /// Whether ray and frustum queries may report this primitive.
    pub pickable: bool,
    /// Local-to-graph transform.
    pub transform: Mat4,
}

impl Primitive {
    pub fn new(shape: Shape, layer: PrimitiveLayer, color: Color) -> Self {
        Self {
            shape,
            layer,
            color,
            visible: true,
            pickable: layer != PrimitiveLayer::Border,
            transform: Mat4::IDENTITY,
        }
    }

    pub fn with_transform(mut self, transform: Mat4) -> Self {
        self.transform = transform;
        self
    }

    /// Center of the local bounding box under `root × transform`.
    pub fn world_center(&self, root: Mat4) -> Option<Vec3> {
        let (min, max) = self.shape.local_bounds()?;
        Some((root * self.transform).transform_point3((min + max) * 0.5))
    }

    /// Shape vertices under `root × transform`.
    pub fn world_points(&self, root: Mat4) -> impl Iterator<Item = Vec3> + '_ {
        let m = root * self.transform;
        self.shape.points().iter().map(move |p| m.transform_point3(*p))
    }
}

/// Insertion-ordered primitive store.
#[derive(Debug)]
pub struct Scene {
    primitives: IndexMap<PrimitiveId, Primitive>,
    next_id: u32,
    /// Graph space → world space.
    root: Mat4,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    pub fn new() -> Self {
        Self {
            primitives: IndexMap::new(),
            next_id: 0,
            root: Mat4::IDENTITY,
        }
    }

    pub fn root_transform(&self) -> Mat4 {
        self.root
    }

    pub fn set_root_transform(&mut self, root: Mat4) {
        self.root = root;
    }

    /// World position of a graph-space point.
    pub fn to_world(&self, graph: Vec3) -> Vec3 {
        self.root.transform_point3(graph)
    }

    /// Graph-space position of a world point.
    pub fn to_graph(&self, world: Vec3) -> Vec3 {
        self.root.inverse().transform_point3(world)
    }

    pub fn add(&mut self, primitive: Primitive) -> PrimitiveId {
        let id = PrimitiveId(self.next_id);
        self.next_id += 1;
        self.primitives.insert(id, primitive);
        id
    }

    pub fn remove(&mut self, id: PrimitiveId) -> Option<Primitive> {
        self.primitives.shift_remove(&id)
    }

    pub fn get(&self, id: PrimitiveId) -> Option<&Primitive> {
        self.primitives.get(&id)
    }

    pub fn get_mut(&mut self, id: PrimitiveId) -> Option<&mut Primitive> {
        self.primitives.get_mut(&id)
    }

    pub fn world_center(&self, id: PrimitiveId) -> Option<Vec3> {
        self.primitives.get(&id)?.world_center(self.root)
    }

    /// All primitives in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (PrimitiveId, &Primitive)> {
        self.primitives.iter().map(|(id, p)| (*id, p))
    }

    pub fn len(&self) -> usize {
        self.primitives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn triangle() -> Shape {
        Shape::Mesh {
            vertices: vec![
                Vec3::new(-1.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(0.0, 2.0, 0.0),
            ],
            triangles: vec![[0, 1, 2]],
        }
    }

    #[test]
    fn ids_are_not_reused() {
        let mut scene = Scene::new();
        let a = scene.add(Primitive::new(triangle(), PrimitiveLayer::Body, Color::BLACK));
        scene.remove(a);
        let b = scene.add(Primitive::new(triangle(), PrimitiveLayer::Body, Color::BLACK));
        assert_ne!(a, b);
        assert_eq!(scene.len(), 1);
    }

    #[test]
    fn world_center_follows_transform() {
        let mut scene = Scene::new();
        let id = scene.add(
            Primitive::new(triangle(), PrimitiveLayer::Arrow, Color::BLACK)
                .with_transform(Mat4::from_translation(Vec3::new(10.0, 0.0, 0.0))),
        );
        assert_eq!(scene.world_center(id), Some(Vec3::new(10.0, 1.0, 0.0)));

        scene.set_root_transform(Mat4::from_translation(Vec3::new(0.0, 0.0, -5.0)));
        assert_eq!(scene.world_center(id), Some(Vec3::new(10.0, 1.0, -5.0)));
        assert_eq!(scene.to_graph(Vec3::new(1.0, 1.0, -5.0)), Vec3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn borders_are_never_pickable() {
        let border = Primitive::new(
            Shape::Outline { points: vec![Vec3::ZERO, Vec3::X] },
            PrimitiveLayer::Border,
            Color::BLACK,
        );
        assert!(!border.pickable);
    }
}
