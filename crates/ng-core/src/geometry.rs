//! Derived geometry for edges and nodes.
//!
//! Everything here is a pure function of its inputs: recomputing with the
//! same endpoints and style yields identical output, so the registry can
//! rebuild an edge's geometry whenever a node moves without tracking what
//! changed.

use crate::model::{EdgeStyle, EdgeVariant, NodeStyle};
use crate::scene::{PrimitiveLayer, Shape};
use glam::{Quat, Vec3};
use std::f32::consts::{FRAC_PI_2, TAU};

/// Distance an edge end stops short of its node center.
pub const ENDPOINT_INSET: f32 = 3.0;
/// Number of segments a curved edge is sampled into.
pub const CURVE_SEGMENTS: usize = 50;
/// Scale from bow factor × chord length to control point displacement.
pub const CONTROL_POINT_SCALE: f32 = 0.08;
/// Number of segments of a node disc.
pub const DISC_SEGMENTS: usize = 32;

const UP: Vec3 = Vec3::Y;

/// Rotation carrying +Y onto `dir` (assumed unit length).
pub fn orientation_from_up(dir: Vec3) -> Quat {
    if dir.y > 0.99999 {
        Quat::IDENTITY
    } else if dir.y < -0.99999 {
        // Half turn about X.
        Quat::from_xyzw(1.0, 0.0, 0.0, 0.0)
    } else {
        let axis = UP.cross(dir).normalize();
        let angle = dir.dot(UP).clamp(-1.0, 1.0).acos();
        Quat::from_axis_angle(axis, angle)
    }
}

// ─── Arrowheads ──────────────────────────────────────────────────────────

/// A triangular arrowhead whose tip sits on the edge end.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArrowHead {
    pub tip: Vec3,
    pub orientation: Quat,
    pub length: f32,
    pub width: f32,
}

impl ArrowHead {
    /// Triangle in arrow space: base behind the origin, tip at the origin,
    /// pointing along +Y.
    pub fn local_vertices(&self) -> [Vec3; 3] {
        let (w, l) = (self.width * 0.5, self.length);
        [Vec3::new(-w, -l, 0.0), Vec3::new(w, -l, 0.0), Vec3::ZERO]
    }

    pub fn world_vertices(&self) -> [Vec3; 3] {
        self.local_vertices()
            .map(|v| self.orientation * v + self.tip)
    }

    pub fn transform(&self) -> glam::Mat4 {
        glam::Mat4::from_rotation_translation(self.orientation, self.tip)
    }

    pub fn shape(&self) -> Shape {
        Shape::Mesh {
            vertices: self.local_vertices().to_vec(),
            triangles: vec![[0, 1, 2]],
        }
    }
}

// ─── Straight edges ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct StraightEdgeGeometry {
    pub start: Vec3,
    pub end: Vec3,
    /// Unit direction from source to target.
    pub direction: Vec3,
    /// Distance from `start` to `end`.
    pub length: f32,
    /// Drawn segment; shortened by the arrow length when an arrow is shown.
    pub line: [Vec3; 2],
    pub arrow: Option<ArrowHead>,
}

impl StraightEdgeGeometry {
    pub fn compute(source: Vec3, target: Vec3, style: &EdgeStyle) -> Self {
        let chord = target - source;
        let dist = chord.length();
        let direction = chord.try_normalize().unwrap_or(UP);
        let inset = ENDPOINT_INSET.min(dist * 0.5);
        let start = source + direction * inset;
        let end = target - direction * inset;
        let length = start.distance(end);

        let line_length = if style.arrow_enabled {
            (length - style.arrow_length).max(0.0)
        } else {
            length
        };
        let arrow = style.arrow_enabled.then(|| ArrowHead {
            tip: start + direction * length,
            orientation: orientation_from_up(direction),
            length: style.arrow_length,
            width: style.arrow_width,
        });

        Self {
            start,
            end,
            direction,
            length,
            line: [start, start + direction * line_length],
            arrow,
        }
    }
}

// ─── Curved edges ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct CurveEdgeGeometry {
    pub start: Vec3,
    pub end: Vec3,
    pub control: Vec3,
    /// `CURVE_SEGMENTS + 1` samples of the quadratic Bézier from start to end.
    pub points: Vec<Vec3>,
    pub arrow: Option<ArrowHead>,
}

impl CurveEdgeGeometry {
    pub fn compute(source: Vec3, target: Vec3, control_offset: f32, style: &EdgeStyle) -> Self {
        let control = control_point(source, target, control_offset);
        let start = inset_toward(source, control);
        let end = inset_toward(target, control);

        let points: Vec<Vec3> = (0..=CURVE_SEGMENTS)
            .map(|i| quadratic_bezier(start, control, end, i as f32 / CURVE_SEGMENTS as f32))
            .collect();

        let arrow = if style.arrow_enabled {
            let last = points[CURVE_SEGMENTS];
            let dir = (last - points[CURVE_SEGMENTS - 1]).try_normalize().unwrap_or(UP);
            Some(ArrowHead {
                tip: last,
                orientation: orientation_from_up(dir),
                length: style.arrow_length,
                width: style.arrow_width,
            })
        } else {
            None
        };

        Self {
            start,
            end,
            control,
            points,
            arrow,
        }
    }
}

/// Midpoint of the chord displaced sideways by `offset × |chord| × 0.08`.
///
/// The sideways direction is the chord rotated a quarter turn about the
/// normal of the plane through the origin and both endpoints. When that
/// plane is undefined the rotation axis falls back to +Z made orthogonal
/// to the chord, then to any axis orthogonal to it.
pub fn control_point(source: Vec3, target: Vec3, offset: f32) -> Vec3 {
    let chord = target - source;
    let midpoint = (source + target) * 0.5;
    let Some(dir) = chord.try_normalize() else {
        return midpoint;
    };
    let displacement = dir * (offset * chord.length() * CONTROL_POINT_SCALE);
    let axis = target
        .cross(source)
        .try_normalize()
        .or_else(|| (Vec3::Z - dir * Vec3::Z.dot(dir)).try_normalize())
        .unwrap_or_else(|| dir.any_orthonormal_vector());
    Quat::from_axis_angle(axis, FRAC_PI_2) * displacement + midpoint
}

fn inset_toward(from: Vec3, toward: Vec3) -> Vec3 {
    from + (toward - from).normalize_or_zero() * ENDPOINT_INSET
}

pub fn quadratic_bezier(p0: Vec3, p1: Vec3, p2: Vec3, t: f32) -> Vec3 {
    let u = 1.0 - t;
    p0 * (u * u) + p1 * (2.0 * u * t) + p2 * (t * t)
}

// ─── Either ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum EdgeGeometry {
    Straight(StraightEdgeGeometry),
    Curved(CurveEdgeGeometry),
}

impl EdgeGeometry {
    pub fn compute(
        variant: EdgeVariant,
        source: Vec3,
        target: Vec3,
        control_offset: f32,
        style: &EdgeStyle,
    ) -> Self {
        match variant {
            EdgeVariant::Straight => {
                EdgeGeometry::Straight(StraightEdgeGeometry::compute(source, target, style))
            }
            EdgeVariant::Curved => EdgeGeometry::Curved(CurveEdgeGeometry::compute(
                source,
                target,
                control_offset,
                style,
            )),
        }
    }

    /// World-space line vertices.
    pub fn line_points(&self) -> &[Vec3] {
        match self {
            EdgeGeometry::Straight(g) => &g.line,
            EdgeGeometry::Curved(g) => &g.points,
        }
    }

    pub fn arrow(&self) -> Option<&ArrowHead> {
        match self {
            EdgeGeometry::Straight(g) => g.arrow.as_ref(),
            EdgeGeometry::Curved(g) => g.arrow.as_ref(),
        }
    }

    pub fn line_shape(&self) -> Shape {
        Shape::Polyline {
            points: self.line_points().to_vec(),
        }
    }
}

// ─── Node visuals ────────────────────────────────────────────────────────

/// Local-space shapes of a node, centered on the origin. Position only
/// affects the world matrix, so moving a node never rebuilds these.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeVisual {
    pub body: Shape,
    pub icon: Option<Shape>,
    pub label: Option<Shape>,
    pub border: Shape,
}

impl NodeVisual {
    pub fn build(style: &NodeStyle, label: Option<&str>, has_icon: bool) -> Self {
        let body = disc(style.size, 0.0);
        let icon = has_icon.then(|| disc(style.size, 0.01));
        let label = label
            .filter(|text| !text.is_empty())
            .map(|text| label_quad(style, text));
        let half = style.size + style.border_size;
        let border = Shape::Outline {
            points: vec![
                Vec3::new(-half, -half, 0.0),
                Vec3::new(half, -half, 0.0),
                Vec3::new(half, half, 0.0),
                Vec3::new(-half, half, 0.0),
            ],
        };
        Self {
            body,
            icon,
            label,
            border,
        }
    }

    /// Every shape with the layer it belongs to.
    pub fn parts(&self) -> impl Iterator<Item = (PrimitiveLayer, &Shape)> {
        [
            Some((PrimitiveLayer::Body, &self.body)),
            self.icon.as_ref().map(|s| (PrimitiveLayer::Icon, s)),
            self.label.as_ref().map(|s| (PrimitiveLayer::Label, s)),
            Some((PrimitiveLayer::Border, &self.border)),
        ]
        .into_iter()
        .flatten()
    }
}

/// Triangle fan in the XY plane.
fn disc(radius: f32, z: f32) -> Shape {
    let mut vertices = Vec::with_capacity(DISC_SEGMENTS + 1);
    vertices.push(Vec3::new(0.0, 0.0, z));
    vertices.extend((0..DISC_SEGMENTS).map(|i| {
        let theta = i as f32 / DISC_SEGMENTS as f32 * TAU;
        Vec3::new(radius * theta.cos(), radius * theta.sin(), z)
    }));
    let n = DISC_SEGMENTS as u32;
    let triangles = (0..n).map(|i| [0, 1 + i, 1 + (i + 1) % n]).collect();
    Shape::Mesh {
        vertices,
        triangles,
    }
}

/// Label plate below the disc. Text is measured as 0.6 em per character
/// with a 2 px margin, then scaled 0.01 world units per pixel.
fn label_quad(style: &NodeStyle, text: &str) -> Shape {
    const PIXEL: f32 = 0.01;
    const MARGIN: f32 = 2.0;
    let chars = text.chars().count() as f32;
    let w = (chars * 0.6 * style.label_font_size + 2.0 * MARGIN) * PIXEL * 0.5;
    let h = (style.label_font_size + 2.0 * MARGIN) * PIXEL * 0.5;
    let cy = -1.5 * style.size;
    Shape::Mesh {
        vertices: vec![
            Vec3::new(-w, cy - h, 0.0),
            Vec3::new(w, cy - h, 0.0),
            Vec3::new(w, cy + h, 0.0),
            Vec3::new(-w, cy + h, 0.0),
        ],
        triangles: vec![[0, 1, 2], [0, 2, 3]],
    }
}
