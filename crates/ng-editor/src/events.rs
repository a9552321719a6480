//! Semantic events emitted to the host.
//!
//! Every event has an outward name (`clickNode`, `boxSelect`, ...) and a JSON
//! rendering `{"type": name, "param": {...}}`. Entity payloads are the
//! external-facing [`NodeData`]/[`EdgeData`]; geometry never leaves the crate.

use crate::input::InputEvent;
use glam::Vec3;
use ng_core::{EdgeData, EdgeId, NodeData, NodeId, NodePosition};
use serde_json::{Value, json};

/// What a pointer gesture landed on.
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    Node(NodeData),
    Edge(EdgeData),
    /// Background: no eligible entity under the pointer.
    Stage,
}

impl Target {
    fn suffix(&self) -> &'static str {
        match self {
            Target::Node(_) => "Node",
            Target::Edge(_) => "Edge",
            Target::Stage => "Stage",
        }
    }

    fn param(&self, input: &InputEvent) -> Value {
        match self {
            Target::Node(node) => json!({ "event": input, "target": node }),
            Target::Edge(edge) => json!({ "event": input, "target": edge }),
            Target::Stage => json!({ "event": input }),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GraphEvent {
    Click { target: Target, input: InputEvent },
    RightClick { target: Target, input: InputEvent },
    DoubleClick { target: Target, input: InputEvent },
    /// Never carries [`Target::Stage`].
    HoverOn { target: Target, input: InputEvent },
    HoverOff { target: Target, input: InputEvent },
    BoxSelect {
        node_ids: Vec<NodeId>,
        edge_ids: Vec<EdgeId>,
    },
    NodesPositionChanged { nodes_position: Vec<NodePosition> },
    DragStart { node: NodeId, input: InputEvent },
    /// `delta` is the graph-space offset applied by this move, not an
    /// absolute position.
    Drag {
        node: NodeId,
        delta: Vec3,
        input: InputEvent,
    },
    DragEnd {
        nodes: Vec<NodePosition>,
        input: InputEvent,
    },
}

impl GraphEvent {
    /// Outward event name.
    pub fn name(&self) -> String {
        match self {
            GraphEvent::Click { target, .. } => format!("click{}", target.suffix()),
            GraphEvent::RightClick { target, .. } => format!("rightClick{}", target.suffix()),
            GraphEvent::DoubleClick { target, .. } => format!("dblclick{}", target.suffix()),
            GraphEvent::HoverOn { target, .. } => format!("hoveron{}", target.suffix()),
            GraphEvent::HoverOff { target, .. } => format!("hoveroff{}", target.suffix()),
            GraphEvent::BoxSelect { .. } => "boxSelect".into(),
            GraphEvent::NodesPositionChanged { .. } => "nodesPositionChanged".into(),
            GraphEvent::DragStart { .. } => "dragStart".into(),
            GraphEvent::Drag { .. } => "drag".into(),
            GraphEvent::DragEnd { .. } => "dragEnd".into(),
        }
    }

    pub fn param(&self) -> Value {
        match self {
            GraphEvent::Click { target, input }
            | GraphEvent::RightClick { target, input }
            | GraphEvent::DoubleClick { target, input }
            | GraphEvent::HoverOn { target, input }
            | GraphEvent::HoverOff { target, input } => target.param(input),
            GraphEvent::BoxSelect { node_ids, edge_ids } => {
                json!({ "nodeIds": node_ids, "edgeIds": edge_ids })
            }
            GraphEvent::NodesPositionChanged { nodes_position } => {
                json!({ "nodesPosition": nodes_position })
            }
            GraphEvent::DragStart { node, input } => json!({ "event": input, "nodeId": node }),
            GraphEvent::Drag { node, delta, input } => json!({
                "event": input,
                "nodeId": node,
                "delta": { "x": delta.x, "y": delta.y, "z": delta.z },
            }),
            GraphEvent::DragEnd { nodes, input } => json!({ "event": input, "nodes": nodes }),
        }
    }

    pub fn to_json(&self) -> Value {
        json!({ "type": self.name(), "param": self.param() })
    }
}
