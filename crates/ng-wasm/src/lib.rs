//! WASM bridge for Net Graph: exposes the interactive graph to JavaScript.
//!
//! Compiled via `wasm-pack build --target web`. Every method takes and
//! returns JSON strings; mutating calls answer `{"ok":true}` or
//! `{"ok":false,"error":"..."}`, pointer handlers answer the array of
//! emitted events (`[{"type":..., "param":...}]`).

use kurbo::Rect;
use ng_core::glam::Vec3;
use ng_core::{
    Color, EdgeId, EdgeSpec, EdgeVariant, GraphConfig, GraphError, NodeColorPatch, NodeId,
    NodePosition, NodeSpec, PickableEntity, PrimitiveLayer, Scene, Shape,
};
use ng_editor::{GraphEvent, InputEvent, Modifiers, NetworkGraph, PointerButton};
use ng_render::{CanvasBounds, PerspectiveCamera};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use wasm_bindgen::prelude::*;

/// The JS-facing graph controller.
///
/// Holds the `NetworkGraph` facade. The host forwards canvas pointer events
/// and applies the returned events and cursor.
#[wasm_bindgen]
pub struct GraphCanvas {
    graph: NetworkGraph,
}

#[wasm_bindgen]
impl GraphCanvas {
    /// Create a graph over the canvas rectangle (client pixels). An empty
    /// config string means the stock defaults; a partial document is laid
    /// over them.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: &str, left: f64, top: f64, width: f64, height: f64) -> Result<GraphCanvas, JsValue> {
        console_error_panic_hook_setup();
        Self::try_new(config_json, left, top, width, height).map_err(|e| JsValue::from_str(&e.to_string()))
    }

    // ─── Graph content ───────────────────────────────────────────────────

    /// `[{id, position:{x,y,z}, label?, icon?, ...}]`
    pub fn add_nodes(&mut self, json: &str) -> String {
        respond(parse::<Vec<NodeSpec>>(json).and_then(|specs| self.graph.add_nodes(specs).map_err(err_text)))
    }

    /// `["id", ...]`
    pub fn delete_nodes(&mut self, json: &str) -> String {
        respond(parse::<Vec<NodeId>>(json).and_then(|ids| self.graph.delete_nodes(ids).map_err(err_text)))
    }

    /// `[{id, source, target, controlPointCenterOffset?}]`; `variant` is
    /// `"straight"` or `"curve"`.
    pub fn add_edges(&mut self, json: &str, variant: &str) -> String {
        let variant = match variant {
            "curve" | "curved" | "curveEdge" => EdgeVariant::Curved,
            _ => EdgeVariant::Straight,
        };
        respond(
            parse::<Vec<EdgeSpec>>(json)
                .and_then(|specs| self.graph.add_edges(specs, variant).map_err(err_text)),
        )
    }

    pub fn delete_edges(&mut self, json: &str) -> String {
        respond(parse::<Vec<EdgeId>>(json).and_then(|ids| self.graph.delete_edges(ids).map_err(err_text)))
    }

    /// `[{id, position:{x,y,z}}]`
    pub fn update_nodes_position(&mut self, json: &str) -> String {
        respond(
            parse::<Vec<NodePosition>>(json)
                .and_then(|positions| self.graph.update_nodes_position(positions).map_err(err_text)),
        )
    }

    /// `[{id, controlPointCenterOffset}]`. Moves the control point of each
    /// curved edge; an unknown id rejects the whole batch.
    pub fn update_edges_position(&mut self, json: &str) -> String {
        respond(parse::<Vec<EdgeOffset>>(json).and_then(|entries| {
            if let Some(unknown) = entries.iter().find(|e| self.graph.edge_data(e.id).is_none()) {
                return Err(err_text(GraphError::UnknownEdge(unknown.id)));
            }
            for entry in entries {
                self.graph
                    .set_edge_control_offset(entry.id, entry.control_point_center_offset)
                    .map_err(err_text)?;
            }
            Ok(())
        }))
    }

    /// `ids` is `["id", ...]`, `patch` is `{color?, activeColor?, borderColor?, ...}`.
    pub fn update_nodes_color(&mut self, ids: &str, patch: &str) -> String {
        let parsed = parse::<Vec<NodeId>>(ids).and_then(|ids| Ok((ids, parse::<NodeColorPatch>(patch)?)));
        respond(parsed.and_then(|(ids, patch)| self.graph.update_nodes_color(ids, patch).map_err(err_text)))
    }

    pub fn update_edges_color(&mut self, ids: &str, color: &str) -> String {
        let Some(color) = Color::from_hex(color) else {
            return respond(Err(format!("invalid color {color}")));
        };
        respond(
            parse::<Vec<EdgeId>>(ids)
                .and_then(|ids| self.graph.update_edges_color(ids, color).map_err(err_text)),
        )
    }

    pub fn update_nodes_visibility(&mut self, ids: &str, visible: bool) -> String {
        respond(
            parse::<Vec<NodeId>>(ids)
                .and_then(|ids| self.graph.update_nodes_visibility(ids, visible).map_err(err_text)),
        )
    }

    pub fn update_edges_visibility(&mut self, ids: &str, visible: bool) -> String {
        respond(
            parse::<Vec<EdgeId>>(ids)
                .and_then(|ids| self.graph.update_edges_visibility(ids, visible).map_err(err_text)),
        )
    }

    // ─── Selection ───────────────────────────────────────────────────────

    pub fn select_nodes_by_ids(&mut self, ids: &str) -> String {
        respond(parse::<Vec<NodeId>>(ids).and_then(|ids| self.graph.select_nodes_by_ids(ids).map_err(err_text)))
    }

    pub fn select_edges_by_ids(&mut self, ids: &str) -> String {
        respond(parse::<Vec<EdgeId>>(ids).and_then(|ids| self.graph.select_edges_by_ids(ids).map_err(err_text)))
    }

    pub fn get_selected_node_ids(&self) -> String {
        json!(self.graph.selected_node_ids()).to_string()
    }

    pub fn get_selected_edge_ids(&self) -> String {
        json!(self.graph.selected_edge_ids()).to_string()
    }

    /// Arm box selection. Answers `{"ok":true,"events":[...]}` with the
    /// hover-off events produced by leaving the current session, or
    /// `{"ok":false,"error":...}` when box selection cannot start.
    pub fn enable_box_select(&mut self) -> String {
        match self.graph.enable_box_select() {
            Some(events) => {
                let events: Vec<Value> = events.iter().map(GraphEvent::to_json).collect();
                json!({ "ok": true, "events": events }).to_string()
            }
            None => respond(Err("box selection unavailable".to_string())),
        }
    }

    /// `{x, y, width, height}` of the box being dragged, or `null`.
    pub fn get_selection_rect(&self) -> String {
        match self.graph.selection_rect() {
            Some(r) => json!({ "x": r.x0, "y": r.y0, "width": r.width(), "height": r.height() }).to_string(),
            None => "null".to_string(),
        }
    }

    // ─── View ────────────────────────────────────────────────────────────

    pub fn set_canvas_bounds(&mut self, left: f64, top: f64, width: f64, height: f64) {
        self.graph
            .set_canvas_bounds(CanvasBounds::new(left, top, width, height));
    }

    /// Move the camera eye and aim it at a target.
    #[allow(clippy::too_many_arguments)]
    pub fn look_at(&mut self, x: f32, y: f32, z: f32, tx: f32, ty: f32, tz: f32) {
        let mut camera = self.graph.camera().clone();
        camera.position = Vec3::new(x, y, z);
        camera.look_at(Vec3::new(tx, ty, tz));
        self.graph.set_camera(camera);
    }

    /// Column-major view-projection matrix for the host renderer.
    pub fn view_projection(&self) -> Vec<f32> {
        self.graph.camera().view_projection().to_cols_array().to_vec()
    }

    pub fn get_cursor(&self) -> String {
        self.graph.cursor().as_css().to_string()
    }

    pub fn get_node_data(&self, id: &str) -> String {
        json!(self.graph.node_data(NodeId::intern(id))).to_string()
    }

    pub fn get_edge_data(&self, id: &str) -> String {
        json!(self.graph.edge_data(EdgeId::intern(id))).to_string()
    }

    // ─── Picking ─────────────────────────────────────────────────────────

    /// Entities inside a client rectangle: `[{id, kind}]`.
    pub fn pick_in_rect(&self, x0: f64, y0: f64, x1: f64, y1: f64) -> String {
        let found: Vec<Value> = self
            .graph
            .pick_in_rect(Rect::new(x0, y0, x1, y1))
            .iter()
            .map(entity_json)
            .collect();
        Value::Array(found).to_string()
    }

    /// Entities under a client point, nearest first: `[{id, kind, distance}]`.
    pub fn pick_at(&self, x: f64, y: f64) -> String {
        let hits: Vec<Value> = self
            .graph
            .pick_at(x, y)
            .iter()
            .map(|hit| {
                let mut v = entity_json(&hit.entity);
                v["distance"] = json!(hit.distance);
                v
            })
            .collect();
        Value::Array(hits).to_string()
    }

    // ─── Pointer input ───────────────────────────────────────────────────

    #[allow(clippy::too_many_arguments)]
    pub fn handle_pointer_down(
        &mut self,
        x: f64,
        y: f64,
        button: i16,
        shift: bool,
        ctrl: bool,
        alt: bool,
        meta: bool,
    ) -> String {
        let event = InputEvent::PointerDown {
            x,
            y,
            button: PointerButton::from_index(button),
            modifiers: mods(shift, ctrl, alt, meta),
        };
        self.dispatch(&event)
    }

    pub fn handle_pointer_move(&mut self, x: f64, y: f64, shift: bool, ctrl: bool, alt: bool, meta: bool) -> String {
        let event = InputEvent::PointerMove {
            x,
            y,
            modifiers: mods(shift, ctrl, alt, meta),
        };
        self.dispatch(&event)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn handle_pointer_up(
        &mut self,
        x: f64,
        y: f64,
        button: i16,
        shift: bool,
        ctrl: bool,
        alt: bool,
        meta: bool,
    ) -> String {
        let event = InputEvent::PointerUp {
            x,
            y,
            button: PointerButton::from_index(button),
            modifiers: mods(shift, ctrl, alt, meta),
        };
        self.dispatch(&event)
    }

    pub fn handle_click(&mut self, x: f64, y: f64, shift: bool, ctrl: bool, alt: bool, meta: bool) -> String {
        let event = InputEvent::Click {
            x,
            y,
            modifiers: mods(shift, ctrl, alt, meta),
        };
        self.dispatch(&event)
    }

    pub fn handle_double_click(&mut self, x: f64, y: f64, shift: bool, ctrl: bool, alt: bool, meta: bool) -> String {
        let event = InputEvent::DoubleClick {
            x,
            y,
            modifiers: mods(shift, ctrl, alt, meta),
        };
        self.dispatch(&event)
    }

    pub fn handle_context_menu(&mut self, x: f64, y: f64, shift: bool, ctrl: bool, alt: bool, meta: bool) -> String {
        let event = InputEvent::ContextMenu {
            x,
            y,
            modifiers: mods(shift, ctrl, alt, meta),
        };
        self.dispatch(&event)
    }

    /// The browser took the pointer away (`pointercancel`, blur). Ends any
    /// drag or box gesture in progress.
    pub fn handle_pointer_cancel(&mut self, x: f64, y: f64) -> String {
        let event = InputEvent::PointerCancel {
            x,
            y,
            modifiers: Modifiers::default(),
        };
        self.dispatch(&event)
    }

    // ─── Scene export ────────────────────────────────────────────────────

    /// Visible primitives in world space:
    /// `[{layer, color, kind: "mesh"|"line"|"loop", points:[x,y,z,...], triangles?}]`.
    pub fn get_scene_json(&self) -> String {
        scene_json(self.graph.scene()).to_string()
    }

    /// World-space triangle soup of every visible mesh, `x,y,z` per vertex.
    pub fn triangle_buffer(&self) -> js_sys::Float32Array {
        js_sys::Float32Array::from(triangle_soup(self.graph.scene()).as_slice())
    }
}

impl GraphCanvas {
    fn try_new(config_json: &str, left: f64, top: f64, width: f64, height: f64) -> Result<Self, GraphError> {
        let config = if config_json.trim().is_empty() {
            GraphConfig::default()
        } else {
            GraphConfig::from_json_over_defaults(config_json)?
        };
        let canvas = CanvasBounds::new(left, top, width, height);
        let mut camera = PerspectiveCamera::from_config(&config.camera, &config.view_port);
        if let Some(aspect) = canvas.aspect() {
            camera.set_aspect(aspect);
        }
        let graph = NetworkGraph::builder()
            .scene(Scene::new())
            .camera(camera)
            .canvas(canvas)
            .config(config)
            .build()?;
        log::debug!("graph canvas created ({width}x{height})");
        Ok(Self { graph })
    }

    fn dispatch(&mut self, event: &InputEvent) -> String {
        let events: Vec<Value> = self
            .graph
            .handle_input(event)
            .iter()
            .map(GraphEvent::to_json)
            .collect();
        Value::Array(events).to_string()
    }
}

/// One entry of `update_edges_position`.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EdgeOffset {
    id: EdgeId,
    control_point_center_offset: f32,
}

fn mods(shift: bool, ctrl: bool, alt: bool, meta: bool) -> Modifiers {
    Modifiers {
        shift,
        ctrl,
        alt,
        meta,
    }
}

fn parse<T: DeserializeOwned>(json: &str) -> Result<T, String> {
    serde_json::from_str(json).map_err(|e| format!("invalid JSON: {e}"))
}

fn err_text(err: GraphError) -> String {
    err.to_string()
}

fn respond(result: Result<(), String>) -> String {
    match result {
        Ok(()) => json!({ "ok": true }).to_string(),
        Err(error) => json!({ "ok": false, "error": error }).to_string(),
    }
}

fn entity_json(entity: &PickableEntity) -> Value {
    let kind = match entity {
        PickableEntity::Node(_) => "node",
        PickableEntity::StraightEdge(_) => "straightEdge",
        PickableEntity::CurveEdge(_) => "curveEdge",
    };
    json!({ "id": entity.id_str(), "kind": kind })
}

fn layer_name(layer: PrimitiveLayer) -> &'static str {
    match layer {
        PrimitiveLayer::Body => "body",
        PrimitiveLayer::Label => "label",
        PrimitiveLayer::Icon => "icon",
        PrimitiveLayer::Border => "border",
        PrimitiveLayer::Line => "line",
        PrimitiveLayer::Arrow => "arrow",
    }
}

fn scene_json(scene: &Scene) -> Value {
    let root = scene.root_transform();
    let primitives: Vec<Value> = scene
        .iter()
        .filter(|(_, p)| p.visible)
        .map(|(id, p)| {
            let points: Vec<f32> = p.world_points(root).flat_map(|v| v.to_array()).collect();
            let mut v = json!({
                "id": id.0,
                "layer": layer_name(p.layer),
                "color": p.color.to_hex(),
                "points": points,
            });
            match &p.shape {
                Shape::Mesh { triangles, .. } => {
                    v["kind"] = json!("mesh");
                    v["triangles"] = json!(triangles);
                }
                Shape::Polyline { .. } => v["kind"] = json!("line"),
                Shape::Outline { .. } => v["kind"] = json!("loop"),
            }
            v
        })
        .collect();
    Value::Array(primitives)
}

fn triangle_soup(scene: &Scene) -> Vec<f32> {
    let root = scene.root_transform();
    let mut out = Vec::new();
    for (_, p) in scene.iter().filter(|(_, p)| p.visible) {
        let Shape::Mesh { triangles, .. } = &p.shape else {
            continue;
        };
        let world: Vec<Vec3> = p.world_points(root).collect();
        for tri in triangles {
            for &i in tri {
                if let Some(v) = world.get(i as usize) {
                    out.extend_from_slice(&v.to_array());
                }
            }
        }
    }
    out
}

/// Set up console error panic hook for better debugging.
fn console_error_panic_hook_setup() {
    #[cfg(target_arch = "wasm32")]
    {
        use std::sync::Once;
        static SET_HOOK: Once = Once::new();
        SET_HOOK.call_once(|| {
            std::panic::set_hook(Box::new(|info| {
                let msg = format!("Net Graph WASM panic: {info}");
                web_sys::console::error_1(&msg.into());
            }));
        });
    }
}
