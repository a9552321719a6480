//! Graph data model: caller-facing specs, stored entities, style values and
//! the external-facing data carried by events.
//!
//! Nodes and edges are keyed by caller-supplied ids. Everything geometric
//! about an edge is derived from its endpoints (see [`crate::geometry`]);
//! only the inputs to that derivation live here.

use crate::config::EntityKinds;
use crate::geometry::{EdgeGeometry, NodeVisual};
use crate::id::{EdgeId, NodeId};
use glam::Vec3;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;

// ─── Colors ──────────────────────────────────────────────────────────────

/// RGBA color. Stored as 4 × f32 [0.0, 1.0].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

/// Helper to parse a single hex digit.
fn hex_val(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl Color {
    pub const BLACK: Color = Color::rgba(0.0, 0.0, 0.0, 1.0);
    pub const TRANSPARENT: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Parse a hex color string: `#RGB`, `#RGBA`, `#RRGGBB`, `#RRGGBBAA`.
    /// The string may optionally start with `#`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        let bytes = hex.as_bytes();

        let channel = |i: usize| -> Option<f32> {
            let v = match bytes.len() {
                3 | 4 => hex_val(bytes[i])? * 17,
                _ => hex_val(bytes[i * 2])? << 4 | hex_val(bytes[i * 2 + 1])?,
            };
            Some(v as f32 / 255.0)
        };

        match bytes.len() {
            3 | 6 => Some(Self::rgba(channel(0)?, channel(1)?, channel(2)?, 1.0)),
            4 | 8 => Some(Self::rgba(
                channel(0)?,
                channel(1)?,
                channel(2)?,
                channel(3)?,
            )),
            _ => None,
        }
    }

    /// Emit as `#RRGGBB`, or `#RRGGBBAA` when not fully opaque.
    pub fn to_hex(&self) -> String {
        let to_byte = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        let (r, g, b, a) = (to_byte(self.r), to_byte(self.g), to_byte(self.b), to_byte(self.a));
        if a == 255 {
            format!("#{r:02X}{g:02X}{b:02X}")
        } else {
            format!("#{r:02X}{g:02X}{b:02X}{a:02X}")
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Color::from_hex(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid hex color `{s}`")))
    }
}

// ─── Positions ───────────────────────────────────────────────────────────

/// Serde adapter for `Vec3` as `{x, y, z}`; `z` defaults to 0 so planar
/// callers can omit it.
pub mod xyz {
    use glam::Vec3;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    struct Xyz {
        x: f32,
        y: f32,
        #[serde(default)]
        z: f32,
    }

    pub fn serialize<S: Serializer>(v: &Vec3, serializer: S) -> Result<S::Ok, S::Error> {
        Xyz { x: v.x, y: v.y, z: v.z }.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec3, D::Error> {
        let p = Xyz::deserialize(deserializer)?;
        Ok(Vec3::new(p.x, p.y, p.z))
    }

    pub mod option {
        use super::Xyz;
        use glam::Vec3;
        use serde::{Deserialize, Deserializer, Serialize, Serializer};

        pub fn serialize<S: Serializer>(v: &Option<Vec3>, serializer: S) -> Result<S::Ok, S::Error> {
            v.map(|v| Xyz { x: v.x, y: v.y, z: v.z }).serialize(serializer)
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<Vec3>, D::Error> {
            Ok(Option::<Xyz>::deserialize(deserializer)?.map(|p| Vec3::new(p.x, p.y, p.z)))
        }
    }
}

// ─── Styles ──────────────────────────────────────────────────────────────

/// Resolved visual style of a node.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeStyle {
    /// Disc radius in world units.
    pub size: f32,
    /// Body color.
    pub color: Color,
    /// Body color while selected.
    pub active_color: Color,
    /// Padding between the disc and the selection border.
    pub border_size: f32,
    pub border_color: Color,
    /// Background behind the label text.
    pub fill_color: Color,
    pub label_color: Color,
    /// Label font size in pixels.
    pub label_font_size: f32,
    pub icon_color: Color,
}

/// Per-node overrides; absent fields fall back to the configured defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NodeStyleOverride {
    pub size: Option<f32>,
    pub color: Option<Color>,
    pub active_color: Option<Color>,
    pub border_size: Option<f32>,
    pub border_color: Option<Color>,
    pub fill_color: Option<Color>,
    pub label_color: Option<Color>,
    pub label_font_size: Option<f32>,
    pub icon_color: Option<Color>,
}

impl NodeStyleOverride {
    pub fn apply(&self, base: &NodeStyle) -> NodeStyle {
        NodeStyle {
            size: self.size.unwrap_or(base.size),
            color: self.color.unwrap_or(base.color),
            active_color: self.active_color.unwrap_or(base.active_color),
            border_size: self.border_size.unwrap_or(base.border_size),
            border_color: self.border_color.unwrap_or(base.border_color),
            fill_color: self.fill_color.unwrap_or(base.fill_color),
            label_color: self.label_color.unwrap_or(base.label_color),
            label_font_size: self.label_font_size.unwrap_or(base.label_font_size),
            icon_color: self.icon_color.unwrap_or(base.icon_color),
        }
    }
}

/// Color changes accepted by `update_nodes_color`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NodeColorPatch {
    pub color: Option<Color>,
    pub active_color: Option<Color>,
    pub border_color: Option<Color>,
    pub fill_color: Option<Color>,
    pub label_color: Option<Color>,
    pub icon_color: Option<Color>,
}

impl NodeColorPatch {
    pub fn apply_to(&self, style: &mut NodeStyle) {
        if let Some(c) = self.color {
            style.color = c;
        }
        if let Some(c) = self.active_color {
            style.active_color = c;
        }
        if let Some(c) = self.border_color {
            style.border_color = c;
        }
        if let Some(c) = self.fill_color {
            style.fill_color = c;
        }
        if let Some(c) = self.label_color {
            style.label_color = c;
        }
        if let Some(c) = self.icon_color {
            style.icon_color = c;
        }
    }
}

/// Resolved visual style of an edge.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeStyle {
    pub color: Color,
    pub selected_color: Color,
    /// Line width in pixels (renderer hint).
    pub line_width: f32,
    pub arrow_enabled: bool,
    pub arrow_length: f32,
    pub arrow_width: f32,
    /// Default bow factor for curved edges.
    pub curve_control_offset: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EdgeStyleOverride {
    pub color: Option<Color>,
    pub selected_color: Option<Color>,
    pub line_width: Option<f32>,
    pub arrow_enabled: Option<bool>,
    pub arrow_length: Option<f32>,
    pub arrow_width: Option<f32>,
}

impl EdgeStyleOverride {
    pub fn apply(&self, base: &EdgeStyle) -> EdgeStyle {
        EdgeStyle {
            color: self.color.unwrap_or(base.color),
            selected_color: self.selected_color.unwrap_or(base.selected_color),
            line_width: self.line_width.unwrap_or(base.line_width),
            arrow_enabled: self.arrow_enabled.unwrap_or(base.arrow_enabled),
            arrow_length: self.arrow_length.unwrap_or(base.arrow_length),
            arrow_width: self.arrow_width.unwrap_or(base.arrow_width),
            curve_control_offset: base.curve_control_offset,
        }
    }
}

// ─── Specs (caller input) ────────────────────────────────────────────────

fn default_true() -> bool {
    true
}

/// A node as submitted to `add_nodes`. Unrecognized fields are kept in
/// `data` and handed back verbatim in events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeSpec {
    pub id: NodeId,
    #[serde(default, with = "xyz::option", skip_serializing_if = "Option::is_none")]
    pub position: Option<Vec3>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, alias = "icon_url", skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default)]
    pub style: NodeStyleOverride,
    #[serde(flatten)]
    pub data: Map<String, Value>,
}

impl NodeSpec {
    pub fn new(id: &str) -> Self {
        Self {
            id: NodeId::intern(id),
            position: None,
            label: None,
            icon: None,
            image: None,
            visible: true,
            style: NodeStyleOverride::default(),
            data: Map::new(),
        }
    }

    pub fn at(mut self, position: Vec3) -> Self {
        self.position = Some(position);
        self
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }
}

/// An edge as submitted to `add_edges`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeSpec {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    #[serde(default = "default_true")]
    pub visible: bool,
    /// Bow factor for curved edges; the configured default applies when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub control_point_center_offset: Option<f32>,
    #[serde(default)]
    pub style: EdgeStyleOverride,
    #[serde(flatten)]
    pub data: Map<String, Value>,
}

impl EdgeSpec {
    pub fn new(id: &str, source: &str, target: &str) -> Self {
        Self {
            id: EdgeId::intern(id),
            source: NodeId::intern(source),
            target: NodeId::intern(target),
            visible: true,
            control_point_center_offset: None,
            style: EdgeStyleOverride::default(),
            data: Map::new(),
        }
    }
}

// ─── Entities ────────────────────────────────────────────────────────────

/// How an edge is drawn between its endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EdgeVariant {
    #[default]
    Straight,
    #[serde(alias = "curve")]
    Curved,
}

/// A node owned by the registry.
#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    pub position: Vec3,
    pub selected: bool,
    pub visible: bool,
    pub style: NodeStyle,
    pub label: Option<String>,
    pub icon: Option<String>,
    pub image: Option<String>,
    pub data: Map<String, Value>,
    /// Local-space visual layout; rebuilt on style/content change only.
    pub visual: NodeVisual,
}

impl Node {
    pub fn from_spec(spec: &NodeSpec, defaults: &NodeStyle) -> Self {
        let style = spec.style.apply(defaults);
        let label = spec.label.clone();
        let icon = spec.icon.clone();
        let visual = NodeVisual::build(&style, label.as_deref(), icon.is_some());
        Self {
            id: spec.id,
            position: spec.position.unwrap_or(Vec3::ZERO),
            selected: false,
            visible: spec.visible,
            style,
            label,
            icon,
            image: spec.image.clone(),
            data: spec.data.clone(),
            visual,
        }
    }

    /// Body color for the current selection state.
    pub fn body_color(&self) -> Color {
        if self.selected {
            self.style.active_color
        } else {
            self.style.color
        }
    }

    pub fn to_data(&self) -> NodeData {
        NodeData {
            id: self.id,
            position: self.position,
            label: self.label.clone(),
            icon: self.icon.clone(),
            image: self.image.clone(),
            selected: self.selected,
            visible: self.visible,
            data: self.data.clone(),
        }
    }
}

/// An edge owned by the registry.
#[derive(Debug, Clone)]
pub struct Edge {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    pub variant: EdgeVariant,
    pub selected: bool,
    pub visible: bool,
    pub style: EdgeStyle,
    /// Bow factor used by curved edges.
    pub control_offset: f32,
    pub data: Map<String, Value>,
    /// Endpoint positions the current geometry was derived from.
    pub source_pos: Vec3,
    pub target_pos: Vec3,
    /// Derived geometry; recomputed by [`Edge::update_position`], never edited directly.
    pub geometry: EdgeGeometry,
}

impl Edge {
    pub fn from_spec(
        spec: &EdgeSpec,
        variant: EdgeVariant,
        defaults: &EdgeStyle,
        source_pos: Vec3,
        target_pos: Vec3,
    ) -> Self {
        let style = spec.style.apply(defaults);
        let control_offset = spec
            .control_point_center_offset
            .unwrap_or(style.curve_control_offset);
        let geometry = EdgeGeometry::compute(variant, source_pos, target_pos, control_offset, &style);
        Self {
            id: spec.id,
            source: spec.source,
            target: spec.target,
            variant,
            selected: false,
            visible: spec.visible,
            style,
            control_offset,
            data: spec.data.clone(),
            source_pos,
            target_pos,
            geometry,
        }
    }

    /// Recompute derived geometry for new endpoint positions.
    ///
    /// Idempotent: the same arguments always produce identical geometry.
    /// `control_offset` replaces the stored bow factor when given (curved
    /// edges only; straight edges ignore it).
    pub fn update_position(&mut self, source: Vec3, target: Vec3, control_offset: Option<f32>) {
        self.source_pos = source;
        self.target_pos = target;
        if let Some(offset) = control_offset {
            self.control_offset = offset;
        }
        self.geometry =
            EdgeGeometry::compute(self.variant, source, target, self.control_offset, &self.style);
    }

    /// Line color for the current selection state.
    pub fn line_color(&self) -> Color {
        if self.selected {
            self.style.selected_color
        } else {
            self.style.color
        }
    }

    pub fn entity(&self) -> PickableEntity {
        match self.variant {
            EdgeVariant::Straight => PickableEntity::StraightEdge(self.id),
            EdgeVariant::Curved => PickableEntity::CurveEdge(self.id),
        }
    }

    pub fn to_data(&self) -> EdgeData {
        EdgeData {
            id: self.id,
            source: self.source,
            target: self.target,
            variant: self.variant,
            selected: self.selected,
            visible: self.visible,
            data: self.data.clone(),
        }
    }
}

// ─── Pickable entities ───────────────────────────────────────────────────

/// A logical, pickable graph element. The variant is the kind discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PickableEntity {
    Node(NodeId),
    StraightEdge(EdgeId),
    CurveEdge(EdgeId),
}

impl PickableEntity {
    pub fn kind(&self) -> EntityKinds {
        match self {
            PickableEntity::Node(_) => EntityKinds::NODE,
            PickableEntity::StraightEdge(_) => EntityKinds::STRAIGHT_EDGE,
            PickableEntity::CurveEdge(_) => EntityKinds::CURVE_EDGE,
        }
    }

    pub fn node_id(&self) -> Option<NodeId> {
        match self {
            PickableEntity::Node(id) => Some(*id),
            _ => None,
        }
    }

    pub fn edge_id(&self) -> Option<EdgeId> {
        match self {
            PickableEntity::StraightEdge(id) | PickableEntity::CurveEdge(id) => Some(*id),
            PickableEntity::Node(_) => None,
        }
    }

    /// The caller's id string, regardless of kind.
    pub fn id_str(&self) -> &str {
        match self {
            PickableEntity::Node(id) => id.as_str(),
            PickableEntity::StraightEdge(id) | PickableEntity::CurveEdge(id) => id.as_str(),
        }
    }
}

// ─── External-facing data ────────────────────────────────────────────────

/// A node id with a position, as accepted by `update_nodes_position` and
/// reported after a drag.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodePosition {
    pub id: NodeId,
    #[serde(with = "xyz")]
    pub position: Vec3,
}

/// What callers see of a node in events: no geometry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeData {
    pub id: NodeId,
    #[serde(with = "xyz")]
    pub position: Vec3,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub selected: bool,
    pub visible: bool,
    #[serde(flatten)]
    pub data: Map<String, Value>,
}

/// What callers see of an edge in events: no geometry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeData {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    pub variant: EdgeVariant,
    pub selected: bool,
    pub visible: bool,
    #[serde(flatten)]
    pub data: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn color_hex_forms() {
        let c = Color::from_hex("#0000ff").unwrap();
        assert_eq!(c, Color::rgba(0.0, 0.0, 1.0, 1.0));
        assert_eq!(c.to_hex(), "#0000FF");

        let short = Color::from_hex("f00").unwrap();
        assert_eq!(short.to_hex(), "#FF0000");

        let translucent = Color::from_hex("#4BA0FF4D").unwrap();
        assert_eq!(translucent.to_hex(), "#4BA0FF4D");

        assert!(Color::from_hex("#12345").is_none());
        assert!(Color::from_hex("#zzzzzz").is_none());
    }

    #[test]
    fn node_spec_keeps_extra_fields() {
        let spec: NodeSpec = serde_json::from_str(
            r#"{"id":"n1","position":{"x":1,"y":2},"label":"core","icon":"a.png","owner":"ops"}"#,
        )
        .unwrap();
        assert_eq!(spec.id.as_str(), "n1");
        assert_eq!(spec.position, Some(Vec3::new(1.0, 2.0, 0.0)));
        assert_eq!(spec.icon.as_deref(), Some("a.png"));
        assert!(spec.visible);
        assert_eq!(spec.data.get("owner"), Some(&Value::String("ops".into())));
    }

    #[test]
    fn edge_variant_names() {
        let v: EdgeVariant = serde_json::from_str("\"curve\"").unwrap();
        assert_eq!(v, EdgeVariant::Curved);
        assert_eq!(serde_json::to_string(&EdgeVariant::Straight).unwrap(), "\"straight\"");
    }

    #[test]
    fn style_override_falls_back_per_field() {
        let base = NodeStyle {
            size: 3.0,
            color: Color::BLACK,
            active_color: Color::BLACK,
            border_size: 0.5,
            border_color: Color::BLACK,
            fill_color: Color::TRANSPARENT,
            label_color: Color::BLACK,
            label_font_size: 100.0,
            icon_color: Color::BLACK,
        };
        let over = NodeStyleOverride {
            size: Some(5.0),
            ..Default::default()
        };
        let style = over.apply(&base);
        assert_eq!(style.size, 5.0);
        assert_eq!(style.label_font_size, 100.0);
    }
}
