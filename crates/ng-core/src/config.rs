//! Immutable, eagerly validated configuration.
//!
//! A `GraphConfig` is built once, before any component, from JSON with
//! camelCase keys. Parsing goes through an all-optional raw form so that
//! every missing field is reported in one `IncompleteConfiguration` error
//! instead of failing on the first.

use crate::error::{GraphError, Result};
use crate::model::{Color, EdgeStyle, NodeStyle};
use glam::Vec3;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

// ─── Entity kinds ────────────────────────────────────────────────────────

bitflags::bitflags! {
    /// A set of pickable entity kinds, used to enable click, hover, context
    /// menu and box selection per kind.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct EntityKinds: u8 {
        const NODE = 1;
        const STRAIGHT_EDGE = 1 << 1;
        const CURVE_EDGE = 1 << 2;
        const EDGES = Self::STRAIGHT_EDGE.bits() | Self::CURVE_EDGE.bits();
    }
}

impl EntityKinds {
    /// Parse kind names: `node`, `straightEdge`, `curveEdge`, or `edge` for both edge kinds.
    pub fn from_names<I, S>(names: I) -> std::result::Result<Self, String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names.into_iter().try_fold(EntityKinds::empty(), |acc, name| {
            let kind = match name.as_ref() {
                "node" => EntityKinds::NODE,
                "straightEdge" | "straight" => EntityKinds::STRAIGHT_EDGE,
                "curveEdge" | "curve" => EntityKinds::CURVE_EDGE,
                "edge" => EntityKinds::EDGES,
                other => return Err(format!("unknown entity kind `{other}`")),
            };
            Ok(acc | kind)
        })
    }

    pub fn names(&self) -> Vec<&'static str> {
        let mut out = Vec::new();
        if self.contains(EntityKinds::NODE) {
            out.push("node");
        }
        if self.contains(EntityKinds::STRAIGHT_EDGE) {
            out.push("straightEdge");
        }
        if self.contains(EntityKinds::CURVE_EDGE) {
            out.push("curveEdge");
        }
        out
    }
}

impl Serialize for EntityKinds {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.names().serialize(serializer)
    }
}

/// Serde adapter for `Vec3` as `[x, y, z]`.
mod array3 {
    use glam::Vec3;
    use serde::{Serialize, Serializer};

    pub fn serialize<S: Serializer>(v: &Vec3, serializer: S) -> Result<S::Ok, S::Error> {
        v.to_array().serialize(serializer)
    }
}

// ─── Resolved configuration ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraConfig {
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    #[serde(with = "array3")]
    pub position: Vec3,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewPortConfig {
    /// Point the camera looks at.
    #[serde(with = "array3")]
    pub target_position: Vec3,
    pub enable_rotate: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoxSelectionConfig {
    pub enabled: bool,
    pub enable_types: EntityKinds,
    /// CSS border of the on-screen rectangle (host overlay).
    pub border: String,
    /// CSS background of the on-screen rectangle (host overlay).
    pub background_color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionConfig {
    pub single_selection: bool,
    pub single_selection_enable_types: EntityKinds,
    pub context_menu: bool,
    pub context_menu_enable_types: EntityKinds,
    pub hover_enable_types: EntityKinds,
    /// Pointer travel in pixels before a press on a node becomes a drag.
    pub drag_threshold: f32,
    /// World-space distance within which a ray hits an edge line.
    pub line_pick_threshold: f32,
}

/// The complete, validated configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphConfig {
    pub camera: CameraConfig,
    pub view_port: ViewPortConfig,
    pub node: NodeStyle,
    pub straight_edge: EdgeStyle,
    pub curve_edge: EdgeStyle,
    pub box_selection: BoxSelectionConfig,
    pub interaction: InteractionConfig,
}

fn hex(s: &str) -> Color {
    Color::from_hex(s).unwrap_or(Color::BLACK)
}

impl Default for GraphConfig {
    fn default() -> Self {
        let edge = |arrow_enabled| EdgeStyle {
            color: hex("#000000"),
            selected_color: hex("#ff0000"),
            line_width: 10.0,
            arrow_enabled,
            arrow_length: 2.0,
            arrow_width: 1.0,
            curve_control_offset: 5.0,
        };
        Self {
            camera: CameraConfig {
                fov: 45.0,
                aspect: 1.0,
                near: 1.0,
                far: 1000.0,
                position: Vec3::new(0.0, 0.0, 100.0),
            },
            view_port: ViewPortConfig {
                target_position: Vec3::new(0.0, 2.0, 10.0),
                enable_rotate: false,
            },
            node: NodeStyle {
                size: 3.0,
                color: hex("#0000ff"),
                active_color: hex("#0000ff"),
                border_size: 0.5,
                border_color: hex("#000000"),
                fill_color: Color::TRANSPARENT,
                label_color: hex("#000000"),
                label_font_size: 100.0,
                icon_color: hex("#ffffff"),
            },
            straight_edge: edge(false),
            curve_edge: edge(true),
            box_selection: BoxSelectionConfig {
                enabled: true,
                enable_types: EntityKinds::all(),
                border: "1px solid #55aaff".to_string(),
                background_color: "rgba(75, 160, 255, 0.3)".to_string(),
            },
            interaction: InteractionConfig {
                single_selection: true,
                single_selection_enable_types: EntityKinds::all(),
                context_menu: true,
                context_menu_enable_types: EntityKinds::all(),
                hover_enable_types: EntityKinds::all(),
                drag_threshold: 2.0,
                line_pick_threshold: 1.0,
            },
        }
    }
}

impl GraphConfig {
    /// Parse a complete configuration. Every field is required.
    pub fn from_json(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json).map_err(invalid_document)?;
        Self::from_value(value)
    }

    /// Parse a partial configuration laid over [`GraphConfig::default`].
    pub fn from_json_over_defaults(json: &str) -> Result<Self> {
        let overlay: Value = serde_json::from_str(json).map_err(invalid_document)?;
        let mut base = serde_json::to_value(GraphConfig::default()).map_err(invalid_document)?;
        merge_json(&mut base, overlay);
        Self::from_value(base)
    }

    fn from_value(value: Value) -> Result<Self> {
        let raw: RawGraphConfig = serde_json::from_value(value).map_err(invalid_document)?;
        let config = raw.resolve()?;
        config.validate()?;
        log::debug!("configuration accepted");
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let c = &self.camera;
        check("camera.fov", c.fov > 0.0 && c.fov < 180.0, "must be in (0, 180)")?;
        check("camera.aspect", c.aspect > 0.0, "must be positive")?;
        check("camera.near", c.near > 0.0, "must be positive")?;
        check("camera.far", c.far > c.near, "must exceed camera.near")?;
        check("node.size", self.node.size > 0.0, "must be positive")?;
        check(
            "node.labelFontSize",
            self.node.label_font_size > 0.0,
            "must be positive",
        )?;
        for (field, style) in [
            ("straightEdge", &self.straight_edge),
            ("curveEdge", &self.curve_edge),
        ] {
            if style.arrow_length < 0.0 || style.arrow_width < 0.0 {
                return Err(GraphError::InvalidConfiguration {
                    field: format!("{field}.arrowLength"),
                    reason: "arrow dimensions must not be negative".into(),
                });
            }
        }
        check(
            "interaction.dragThreshold",
            self.interaction.drag_threshold >= 0.0,
            "must not be negative",
        )?;
        check(
            "interaction.linePickThreshold",
            self.interaction.line_pick_threshold >= 0.0,
            "must not be negative",
        )
    }
}

fn check(field: &str, ok: bool, reason: &str) -> Result<()> {
    if ok {
        Ok(())
    } else {
        Err(GraphError::InvalidConfiguration {
            field: field.to_string(),
            reason: reason.to_string(),
        })
    }
}

fn invalid_document(e: serde_json::Error) -> GraphError {
    GraphError::InvalidConfiguration {
        field: "<document>".to_string(),
        reason: e.to_string(),
    }
}

/// Recursively overlay `patch` onto `base`; objects merge key-wise, anything
/// else replaces.
fn merge_json(base: &mut Value, patch: Value) {
    match (base, patch) {
        (Value::Object(base), Value::Object(patch)) => {
            for (key, value) in patch {
                match base.get_mut(&key) {
                    Some(slot) => merge_json(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

// ─── Raw (all-optional) form ─────────────────────────────────────────────

/// Records the dotted path of every absent field.
struct Missing(Vec<String>);

impl Missing {
    fn req<T>(&mut self, path: &str, value: Option<T>) -> Option<T> {
        if value.is_none() {
            self.0.push(path.to_string());
        }
        value
    }

    fn kinds(&mut self, path: &str, value: Option<Vec<String>>) -> Result<Option<EntityKinds>> {
        match self.req(path, value) {
            Some(names) => EntityKinds::from_names(&names)
                .map(Some)
                .map_err(|reason| GraphError::InvalidConfiguration {
                    field: path.to_string(),
                    reason,
                }),
            None => Ok(None),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawGraphConfig {
    camera: Option<RawCamera>,
    view_port: Option<RawViewPort>,
    node: Option<RawNodeStyle>,
    straight_edge: Option<RawEdgeStyle>,
    curve_edge: Option<RawEdgeStyle>,
    box_selection: Option<RawBoxSelection>,
    interaction: Option<RawInteraction>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawCamera {
    fov: Option<f32>,
    aspect: Option<f32>,
    near: Option<f32>,
    far: Option<f32>,
    position: Option<[f32; 3]>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawViewPort {
    target_position: Option<[f32; 3]>,
    enable_rotate: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawNodeStyle {
    size: Option<f32>,
    color: Option<Color>,
    active_color: Option<Color>,
    border_size: Option<f32>,
    border_color: Option<Color>,
    fill_color: Option<Color>,
    label_color: Option<Color>,
    label_font_size: Option<f32>,
    icon_color: Option<Color>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawEdgeStyle {
    color: Option<Color>,
    selected_color: Option<Color>,
    line_width: Option<f32>,
    arrow_enabled: Option<bool>,
    arrow_length: Option<f32>,
    arrow_width: Option<f32>,
    curve_control_offset: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawBoxSelection {
    enabled: Option<bool>,
    enable_types: Option<Vec<String>>,
    border: Option<String>,
    background_color: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawInteraction {
    single_selection: Option<bool>,
    single_selection_enable_types: Option<Vec<String>>,
    context_menu: Option<bool>,
    context_menu_enable_types: Option<Vec<String>>,
    hover_enable_types: Option<Vec<String>>,
    drag_threshold: Option<f32>,
    line_pick_threshold: Option<f32>,
}

impl RawGraphConfig {
    fn resolve(self) -> Result<GraphConfig> {
        let mut m = Missing(Vec::new());

        let camera = self.camera.unwrap_or_default();
        let fov = m.req("camera.fov", camera.fov);
        let aspect = m.req("camera.aspect", camera.aspect);
        let near = m.req("camera.near", camera.near);
        let far = m.req("camera.far", camera.far);
        let position = m.req("camera.position", camera.position);

        let view_port = self.view_port.unwrap_or_default();
        let target_position = m.req("viewPort.targetPosition", view_port.target_position);
        let enable_rotate = m.req("viewPort.enableRotate", view_port.enable_rotate);

        let node = resolve_node(&mut m, self.node.unwrap_or_default());
        let straight_edge = resolve_edge(&mut m, "straightEdge", self.straight_edge.unwrap_or_default());
        let curve_edge = resolve_edge(&mut m, "curveEdge", self.curve_edge.unwrap_or_default());

        let bs = self.box_selection.unwrap_or_default();
        let bs_enabled = m.req("boxSelection.enabled", bs.enabled);
        let bs_types = m.kinds("boxSelection.enableTypes", bs.enable_types)?;
        let bs_border = m.req("boxSelection.border", bs.border);
        let bs_background = m.req("boxSelection.backgroundColor", bs.background_color);

        let ix = self.interaction.unwrap_or_default();
        let single = m.req("interaction.singleSelection", ix.single_selection);
        let single_types = m.kinds(
            "interaction.singleSelectionEnableTypes",
            ix.single_selection_enable_types,
        )?;
        let context = m.req("interaction.contextMenu", ix.context_menu);
        let context_types = m.kinds(
            "interaction.contextMenuEnableTypes",
            ix.context_menu_enable_types,
        )?;
        let hover_types = m.kinds("interaction.hoverEnableTypes", ix.hover_enable_types)?;
        let drag_threshold = m.req("interaction.dragThreshold", ix.drag_threshold);
        let line_pick_threshold = m.req("interaction.linePickThreshold", ix.line_pick_threshold);

        let assemble = || -> Option<GraphConfig> {
            Some(GraphConfig {
                camera: CameraConfig {
                    fov: fov?,
                    aspect: aspect?,
                    near: near?,
                    far: far?,
                    position: Vec3::from_array(position?),
                },
                view_port: ViewPortConfig {
                    target_position: Vec3::from_array(target_position?),
                    enable_rotate: enable_rotate?,
                },
                node: node.clone()?,
                straight_edge: straight_edge.clone()?,
                curve_edge: curve_edge.clone()?,
                box_selection: BoxSelectionConfig {
                    enabled: bs_enabled?,
                    enable_types: bs_types?,
                    border: bs_border.clone()?,
                    background_color: bs_background.clone()?,
                },
                interaction: InteractionConfig {
                    single_selection: single?,
                    single_selection_enable_types: single_types?,
                    context_menu: context?,
                    context_menu_enable_types: context_types?,
                    hover_enable_types: hover_types?,
                    drag_threshold: drag_threshold?,
                    line_pick_threshold: line_pick_threshold?,
                },
            })
        };

        match assemble() {
            Some(config) if m.0.is_empty() => Ok(config),
            _ => {
                log::debug!("configuration rejected, missing {:?}", m.0);
                Err(GraphError::IncompleteConfiguration { missing: m.0 })
            }
        }
    }
}

fn resolve_node(m: &mut Missing, raw: RawNodeStyle) -> Option<NodeStyle> {
    let size = m.req("node.size", raw.size);
    let color = m.req("node.color", raw.color);
    let active_color = m.req("node.activeColor", raw.active_color);
    let border_size = m.req("node.borderSize", raw.border_size);
    let border_color = m.req("node.borderColor", raw.border_color);
    let fill_color = m.req("node.fillColor", raw.fill_color);
    let label_color = m.req("node.labelColor", raw.label_color);
    let label_font_size = m.req("node.labelFontSize", raw.label_font_size);
    let icon_color = m.req("node.iconColor", raw.icon_color);
    Some(NodeStyle {
        size: size?,
        color: color?,
        active_color: active_color?,
        border_size: border_size?,
        border_color: border_color?,
        fill_color: fill_color?,
        label_color: label_color?,
        label_font_size: label_font_size?,
        icon_color: icon_color?,
    })
}

fn resolve_edge(m: &mut Missing, section: &str, raw: RawEdgeStyle) -> Option<EdgeStyle> {
    let path = |field: &str| format!("{section}.{field}");
    let color = m.req(&path("color"), raw.color);
    let selected_color = m.req(&path("selectedColor"), raw.selected_color);
    let line_width = m.req(&path("lineWidth"), raw.line_width);
    let arrow_enabled = m.req(&path("arrowEnabled"), raw.arrow_enabled);
    let arrow_length = m.req(&path("arrowLength"), raw.arrow_length);
    let arrow_width = m.req(&path("arrowWidth"), raw.arrow_width);
    let curve_control_offset = m.req(&path("curveControlOffset"), raw.curve_control_offset);
    Some(EdgeStyle {
        color: color?,
        selected_color: selected_color?,
        line_width: line_width?,
        arrow_enabled: arrow_enabled?,
        arrow_length: arrow_length?,
        arrow_width: arrow_width?,
        curve_control_offset: curve_control_offset?,
    })
}
