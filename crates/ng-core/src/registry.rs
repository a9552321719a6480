//! Entity registry: the single owner of nodes, edges and their scene
//! primitives.
//!
//! Nodes and edges live in a `petgraph::StableDiGraph` with a `HashMap`
//! index per id type. Alongside sit two explicitly maintained tables:
//!
//! - the **reverse index**, node id → incident `{edge, role}` pairs, which
//!   drives cascade deletion and edge refresh after a node moves;
//! - the **owner table**, primitive id → logical entity, which picking
//!   uses to resolve a hit back to a node or edge.
//!
//! Every batch operation validates the whole batch before touching
//! anything, so a failed call leaves the registry and the scene unchanged.

use crate::config::GraphConfig;
use crate::error::{GraphError, Result};
use crate::id::{EdgeId, NodeId};
use crate::model::*;
use crate::scene::{Primitive, PrimitiveId, PrimitiveLayer, Scene};
use glam::{Mat4, Vec3};
use indexmap::IndexSet;
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableDiGraph};
use smallvec::SmallVec;
use std::collections::{HashMap, HashSet};

/// Resolves a scene primitive to the logical entity that owns it.
pub trait OwnerLookup {
    fn owner_of(&self, primitive: PrimitiveId) -> Option<PickableEntity>;
}

/// Which end of an edge a node sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndpointRole {
    Source,
    Target,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IncidentEdge {
    pub edge: EdgeId,
    pub role: EndpointRole,
}

type Primitives = SmallVec<[(PrimitiveLayer, PrimitiveId); 4]>;

#[derive(Debug)]
struct NodeSlot {
    node: Node,
    primitives: Primitives,
}

#[derive(Debug)]
struct EdgeSlot {
    edge: Edge,
    primitives: Primitives,
}

pub struct EntityRegistry {
    graph: StableDiGraph<NodeSlot, EdgeSlot>,
    node_index: HashMap<NodeId, NodeIndex>,
    edge_index: HashMap<EdgeId, EdgeIndex>,
    incident: HashMap<NodeId, SmallVec<[IncidentEdge; 4]>>,
    owners: HashMap<PrimitiveId, PickableEntity>,
    node_defaults: NodeStyle,
    straight_defaults: EdgeStyle,
    curve_defaults: EdgeStyle,
}

impl EntityRegistry {
    pub fn new(config: &GraphConfig) -> Self {
        Self {
            graph: StableDiGraph::new(),
            node_index: HashMap::new(),
            edge_index: HashMap::new(),
            incident: HashMap::new(),
            owners: HashMap::new(),
            node_defaults: config.node.clone(),
            straight_defaults: config.straight_edge.clone(),
            curve_defaults: config.curve_edge.clone(),
        }
    }

    // ─── Creation ────────────────────────────────────────────────────────

    /// Add a batch of nodes. Any id already present, or repeated within the
    /// batch, rejects the whole batch.
    pub fn add_nodes(&mut self, scene: &mut Scene, specs: &[NodeSpec]) -> Result<Vec<NodeId>> {
        let mut seen = HashSet::new();
        for spec in specs {
            if self.node_index.contains_key(&spec.id) || !seen.insert(spec.id) {
                return Err(GraphError::DuplicateNode(spec.id));
            }
        }

        let mut added = Vec::with_capacity(specs.len());
        for spec in specs {
            let node = Node::from_spec(spec, &self.node_defaults);
            let primitives = self.materialize_node(scene, &node);
            let ix = self.graph.add_node(NodeSlot { node, primitives });
            self.node_index.insert(spec.id, ix);
            added.push(spec.id);
        }
        log::debug!("added {} node(s)", added.len());
        Ok(added)
    }

    /// Add a batch of edges of one variant. Both endpoints of every edge
    /// must already exist.
    pub fn add_edges(
        &mut self,
        scene: &mut Scene,
        specs: &[EdgeSpec],
        variant: EdgeVariant,
    ) -> Result<Vec<EdgeId>> {
        let mut seen = HashSet::new();
        for spec in specs {
            if self.edge_index.contains_key(&spec.id) || !seen.insert(spec.id) {
                return Err(GraphError::DuplicateEdge(spec.id));
            }
            for node in [spec.source, spec.target] {
                if !self.node_index.contains_key(&node) {
                    return Err(GraphError::DanglingReference {
                        edge: spec.id,
                        node,
                    });
                }
            }
        }

        let mut added = Vec::with_capacity(specs.len());
        for spec in specs {
            let src = self.node_index[&spec.source];
            let tgt = self.node_index[&spec.target];
            let defaults = match variant {
                EdgeVariant::Straight => &self.straight_defaults,
                EdgeVariant::Curved => &self.curve_defaults,
            };
            let edge = Edge::from_spec(
                spec,
                variant,
                defaults,
                self.graph[src].node.position,
                self.graph[tgt].node.position,
            );
            let primitives = self.materialize_edge(scene, &edge);
            let ix = self.graph.add_edge(src, tgt, EdgeSlot { edge, primitives });
            self.edge_index.insert(spec.id, ix);

            self.incident.entry(spec.source).or_default().push(IncidentEdge {
                edge: spec.id,
                role: EndpointRole::Source,
            });
            self.incident.entry(spec.target).or_default().push(IncidentEdge {
                edge: spec.id,
                role: EndpointRole::Target,
            });
            added.push(spec.id);
        }
        log::debug!("added {} {:?} edge(s)", added.len(), variant);
        Ok(added)
    }

    // ─── Deletion ────────────────────────────────────────────────────────

    /// Delete nodes and, first, every edge incident to them. Returns the ids
    /// of the edges removed by the cascade.
    pub fn delete_nodes(&mut self, scene: &mut Scene, ids: &[NodeId]) -> Result<Vec<EdgeId>> {
        self.check_nodes(ids)?;

        let cascade: IndexSet<EdgeId> = ids
            .iter()
            .flat_map(|id| self.incident_edges(*id).iter().map(|ie| ie.edge))
            .collect();
        for edge in &cascade {
            self.remove_edge(scene, *edge);
        }

        for id in ids {
            let Some(ix) = self.node_index.remove(id) else {
                continue;
            };
            if let Some(slot) = self.graph.remove_node(ix) {
                self.dematerialize(scene, &slot.primitives);
            }
            self.incident.remove(id);
        }
        log::debug!(
            "deleted {} node(s), cascading to {} edge(s)",
            ids.len(),
            cascade.len()
        );
        Ok(cascade.into_iter().collect())
    }

    pub fn delete_edges(&mut self, scene: &mut Scene, ids: &[EdgeId]) -> Result<()> {
        self.check_edges(ids)?;
        for id in ids {
            self.remove_edge(scene, *id);
        }
        Ok(())
    }

    fn remove_edge(&mut self, scene: &mut Scene, id: EdgeId) {
        let Some(ix) = self.edge_index.remove(&id) else {
            return;
        };
        let Some(slot) = self.graph.remove_edge(ix) else {
            return;
        };
        self.dematerialize(scene, &slot.primitives);
        for node in [slot.edge.source, slot.edge.target] {
            if let Some(list) = self.incident.get_mut(&node) {
                list.retain(|ie| ie.edge != id);
                if list.is_empty() {
                    self.incident.remove(&node);
                }
            }
        }
    }

    // ─── Selection ───────────────────────────────────────────────────────

    /// Select exactly `ids` among nodes; every other node is deselected.
    pub fn select_nodes(&mut self, scene: &mut Scene, ids: &[NodeId]) -> Result<()> {
        self.check_nodes(ids)?;
        let wanted: HashSet<NodeId> = ids.iter().copied().collect();
        let indices: Vec<NodeIndex> = self.graph.node_indices().collect();
        for ix in indices {
            let slot = &mut self.graph[ix];
            let selected = wanted.contains(&slot.node.id);
            if slot.node.selected != selected {
                slot.node.selected = selected;
                paint_node(scene, slot);
            }
        }
        Ok(())
    }

    /// Select exactly `ids` among edges; every other edge is deselected.
    pub fn select_edges(&mut self, scene: &mut Scene, ids: &[EdgeId]) -> Result<()> {
        self.check_edges(ids)?;
        let wanted: HashSet<EdgeId> = ids.iter().copied().collect();
        let indices: Vec<EdgeIndex> = self.graph.edge_indices().collect();
        for ix in indices {
            let slot = &mut self.graph[ix];
            let selected = wanted.contains(&slot.edge.id);
            if slot.edge.selected != selected {
                slot.edge.selected = selected;
                paint_edge(scene, slot);
            }
        }
        Ok(())
    }

    pub fn selected_node_ids(&self) -> Vec<NodeId> {
        self.nodes().filter(|n| n.selected).map(|n| n.id).collect()
    }

    pub fn selected_edge_ids(&self) -> Vec<EdgeId> {
        self.edges().filter(|e| e.selected).map(|e| e.id).collect()
    }

    // ─── Updates ─────────────────────────────────────────────────────────

    /// Move nodes to absolute positions and refresh every incident edge.
    pub fn set_node_positions(&mut self, scene: &mut Scene, moves: &[(NodeId, Vec3)]) -> Result<()> {
        for (id, _) in moves {
            self.check_node(*id)?;
        }
        for (id, position) in moves {
            let ix = self.node_index[id];
            let slot = &mut self.graph[ix];
            slot.node.position = *position;
            paint_node(scene, slot);
        }
        self.refresh_edges_of(scene, moves.iter().map(|(id, _)| *id));
        Ok(())
    }

    /// Move nodes by a common offset and refresh every incident edge.
    pub fn translate_nodes(&mut self, scene: &mut Scene, ids: &[NodeId], delta: Vec3) -> Result<()> {
        self.check_nodes(ids)?;
        let moves: Vec<(NodeId, Vec3)> = ids
            .iter()
            .map(|id| (*id, self.graph[self.node_index[id]].node.position + delta))
            .collect();
        self.set_node_positions(scene, &moves)
    }

    pub fn update_nodes_color(
        &mut self,
        scene: &mut Scene,
        patches: &[(NodeId, NodeColorPatch)],
    ) -> Result<()> {
        for (id, _) in patches {
            self.check_node(*id)?;
        }
        for (id, patch) in patches {
            let ix = self.node_index[id];
            let slot = &mut self.graph[ix];
            patch.apply_to(&mut slot.node.style);
            paint_node(scene, slot);
        }
        Ok(())
    }

    /// Change the base color of edges. A selected edge keeps showing its
    /// selected color until deselected.
    pub fn update_edges_color(&mut self, scene: &mut Scene, colors: &[(EdgeId, Color)]) -> Result<()> {
        for (id, _) in colors {
            self.check_edge(*id)?;
        }
        for (id, color) in colors {
            let ix = self.edge_index[id];
            let slot = &mut self.graph[ix];
            slot.edge.style.color = *color;
            paint_edge(scene, slot);
        }
        Ok(())
    }

    pub fn update_nodes_visibility(&mut self, scene: &mut Scene, ids: &[NodeId], visible: bool) -> Result<()> {
        self.check_nodes(ids)?;
        for id in ids {
            let ix = self.node_index[id];
            let slot = &mut self.graph[ix];
            slot.node.visible = visible;
            paint_node(scene, slot);
        }
        Ok(())
    }

    pub fn update_edges_visibility(&mut self, scene: &mut Scene, ids: &[EdgeId], visible: bool) -> Result<()> {
        self.check_edges(ids)?;
        for id in ids {
            let ix = self.edge_index[id];
            let slot = &mut self.graph[ix];
            slot.edge.visible = visible;
            paint_edge(scene, slot);
        }
        Ok(())
    }

    /// Change the bow factor of a curved edge and recompute its geometry.
    pub fn set_edge_control_offset(&mut self, scene: &mut Scene, id: EdgeId, offset: f32) -> Result<()> {
        self.check_edge(id)?;
        let ix = self.edge_index[&id];
        let slot = &mut self.graph[ix];
        let (source, target) = (slot.edge.source_pos, slot.edge.target_pos);
        slot.edge.update_position(source, target, Some(offset));
        paint_edge(scene, slot);
        Ok(())
    }

    /// Recompute the geometry of every edge touching one of `nodes`, each
    /// edge once.
    fn refresh_edges_of(&mut self, scene: &mut Scene, nodes: impl IntoIterator<Item = NodeId>) {
        let edges: IndexSet<EdgeId> = nodes
            .into_iter()
            .flat_map(|id| self.incident_edges(id).iter().map(|ie| ie.edge))
            .collect();
        for id in edges {
            let Some(&ix) = self.edge_index.get(&id) else {
                continue;
            };
            let Some((src, tgt)) = self.graph.edge_endpoints(ix) else {
                continue;
            };
            let (source, target) = (self.graph[src].node.position, self.graph[tgt].node.position);
            let slot = &mut self.graph[ix];
            slot.edge.update_position(source, target, None);
            paint_edge(scene, slot);
        }
    }

    // ─── Queries ─────────────────────────────────────────────────────────

    /// Edges touching `node`, each with the role the node plays. A self-loop
    /// appears twice, once per role.
    pub fn incident_edges(&self, node: NodeId) -> &[IncidentEdge] {
        self.incident.get(&node).map(|l| l.as_slice()).unwrap_or(&[])
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.node_index.get(&id).map(|ix| &self.graph[*ix].node)
    }

    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edge_index.get(&id).map(|ix| &self.graph[*ix].edge)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.graph.node_indices().map(|ix| &self.graph[ix].node)
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.graph.edge_indices().map(|ix| &self.graph[ix].edge)
    }

    pub fn node_count(&self) -> usize {
        self.node_index.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_index.len()
    }

    /// Scene primitives drawn for an entity.
    pub fn primitives_of(&self, entity: PickableEntity) -> &[(PrimitiveLayer, PrimitiveId)] {
        let found = match entity {
            PickableEntity::Node(id) => self
                .node_index
                .get(&id)
                .map(|ix| self.graph[*ix].primitives.as_slice()),
            PickableEntity::StraightEdge(id) | PickableEntity::CurveEdge(id) => self
                .edge_index
                .get(&id)
                .map(|ix| self.graph[*ix].primitives.as_slice()),
        };
        found.unwrap_or(&[])
    }

    fn check_node(&self, id: NodeId) -> Result<()> {
        if self.node_index.contains_key(&id) {
            Ok(())
        } else {
            Err(GraphError::UnknownNode(id))
        }
    }

    fn check_edge(&self, id: EdgeId) -> Result<()> {
        if self.edge_index.contains_key(&id) {
            Ok(())
        } else {
            Err(GraphError::UnknownEdge(id))
        }
    }

    fn check_nodes(&self, ids: &[NodeId]) -> Result<()> {
        ids.iter().try_for_each(|id| self.check_node(*id))
    }

    fn check_edges(&self, ids: &[EdgeId]) -> Result<()> {
        ids.iter().try_for_each(|id| self.check_edge(*id))
    }

    // ─── Scene bookkeeping ───────────────────────────────────────────────

    fn materialize_node(&mut self, scene: &mut Scene, node: &Node) -> Primitives {
        let entity = PickableEntity::Node(node.id);
        let transform = Mat4::from_translation(node.position);
        let mut out = Primitives::new();
        for (layer, shape) in node.visual.parts() {
            let mut primitive =
                Primitive::new(shape.clone(), layer, node_layer_color(node, layer)).with_transform(transform);
            primitive.visible = node_layer_visible(node, layer);
            let id = scene.add(primitive);
            self.owners.insert(id, entity);
            out.push((layer, id));
        }
        out
    }

    fn materialize_edge(&mut self, scene: &mut Scene, edge: &Edge) -> Primitives {
        let entity = edge.entity();
        let color = edge.line_color();
        let mut out = Primitives::new();

        let mut line = Primitive::new(edge.geometry.line_shape(), PrimitiveLayer::Line, color);
        line.visible = edge.visible;
        out.push((PrimitiveLayer::Line, scene.add(line)));

        if let Some(arrow) = edge.geometry.arrow() {
            let mut head = Primitive::new(arrow.shape(), PrimitiveLayer::Arrow, color)
                .with_transform(arrow.transform());
            head.visible = edge.visible;
            out.push((PrimitiveLayer::Arrow, scene.add(head)));
        }

        for (_, id) in &out {
            self.owners.insert(*id, entity);
        }
        out
    }

    fn dematerialize(&mut self, scene: &mut Scene, primitives: &Primitives) {
        for (_, id) in primitives {
            scene.remove(*id);
            self.owners.remove(id);
        }
    }
}

impl OwnerLookup for EntityRegistry {
    fn owner_of(&self, primitive: PrimitiveId) -> Option<PickableEntity> {
        self.owners.get(&primitive).copied()
    }
}

impl EntityRegistry {
    /// Whether the entity exists and is currently shown.
    pub fn is_visible(&self, entity: PickableEntity) -> bool {
        match entity {
            PickableEntity::Node(id) => self.node(id).is_some_and(|n| n.visible),
            PickableEntity::StraightEdge(id) | PickableEntity::CurveEdge(id) => {
                self.edge(id).is_some_and(|e| e.visible)
            }
        }
    }
}

fn node_layer_color(node: &Node, layer: PrimitiveLayer) -> Color {
    match layer {
        PrimitiveLayer::Body => node.body_color(),
        PrimitiveLayer::Icon => node.style.icon_color,
        PrimitiveLayer::Label => node.style.fill_color,
        PrimitiveLayer::Border => node.style.border_color,
        PrimitiveLayer::Line | PrimitiveLayer::Arrow => node.style.color,
    }
}

fn node_layer_visible(node: &Node, layer: PrimitiveLayer) -> bool {
    node.visible && (layer != PrimitiveLayer::Border || node.selected)
}

/// Push a node's current position, colors and visibility into its primitives.
fn paint_node(scene: &mut Scene, slot: &NodeSlot) {
    let node = &slot.node;
    let transform = Mat4::from_translation(node.position);
    for &(layer, id) in &slot.primitives {
        if let Some(p) = scene.get_mut(id) {
            p.transform = transform;
            p.color = node_layer_color(node, layer);
            p.visible = node_layer_visible(node, layer);
        }
    }
}

/// Push an edge's current geometry, color and visibility into its primitives.
fn paint_edge(scene: &mut Scene, slot: &EdgeSlot) {
    let edge = &slot.edge;
    for &(layer, id) in &slot.primitives {
        let Some(p) = scene.get_mut(id) else {
            continue;
        };
        match layer {
            PrimitiveLayer::Line => p.shape = edge.geometry.line_shape(),
            PrimitiveLayer::Arrow => {
                if let Some(arrow) = edge.geometry.arrow() {
                    p.shape = arrow.shape();
                    p.transform = arrow.transform();
                }
            }
            _ => {}
        }
        p.color = edge.line_color();
        p.visible = edge.visible;
    }
}
