//! Sync engine: the authoritative registry + scene pair.
//!
//! Every change to the graph, whether it comes from an outward API call or
//! from a drag gesture, is expressed as a [`GraphMutation`] and applied
//! here. The registry keeps the scene's primitives in step, so after
//! `apply_mutation` returns the scene is ready to render and to pick.

use glam::Vec3;
use ng_core::*;

/// A single change to the graph.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphMutation {
    AddNodes(Vec<NodeSpec>),
    DeleteNodes(Vec<NodeId>),
    AddEdges {
        specs: Vec<EdgeSpec>,
        variant: EdgeVariant,
    },
    DeleteEdges(Vec<EdgeId>),
    SetNodePositions(Vec<NodePosition>),
    /// Move several nodes by the same graph-space offset (group drag).
    TranslateNodes {
        ids: Vec<NodeId>,
        delta: Vec3,
    },
    UpdateNodesColor {
        ids: Vec<NodeId>,
        patch: NodeColorPatch,
    },
    UpdateEdgesColor {
        ids: Vec<EdgeId>,
        color: Color,
    },
    SetNodesVisibility {
        ids: Vec<NodeId>,
        visible: bool,
    },
    SetEdgesVisibility {
        ids: Vec<EdgeId>,
        visible: bool,
    },
    SelectNodes(Vec<NodeId>),
    SelectEdges(Vec<EdgeId>),
    SetEdgeControlOffset {
        id: EdgeId,
        offset: f32,
    },
}

pub struct SyncEngine {
    pub registry: EntityRegistry,
    pub scene: Scene,
    pub config: GraphConfig,
}

impl SyncEngine {
    pub fn new(scene: Scene, config: GraphConfig) -> Self {
        Self {
            registry: EntityRegistry::new(&config),
            scene,
            config,
        }
    }

    /// Apply a mutation. On error nothing has changed.
    pub fn apply_mutation(&mut self, mutation: GraphMutation) -> Result<()> {
        let result = self.apply_inner(&mutation);
        if let Err(err) = &result {
            log::debug!("rejected mutation: {err}");
        }
        result
    }

    fn apply_inner(&mut self, mutation: &GraphMutation) -> Result<()> {
        let reg = &mut self.registry;
        let scene = &mut self.scene;
        match mutation {
            GraphMutation::AddNodes(specs) => reg.add_nodes(scene, specs).map(drop),
            GraphMutation::DeleteNodes(ids) => reg.delete_nodes(scene, ids).map(drop),
            GraphMutation::AddEdges { specs, variant } => {
                reg.add_edges(scene, specs, *variant).map(drop)
            }
            GraphMutation::DeleteEdges(ids) => reg.delete_edges(scene, ids),
            GraphMutation::SetNodePositions(entries) => {
                let moves: Vec<(NodeId, Vec3)> =
                    entries.iter().map(|e| (e.id, e.position)).collect();
                reg.set_node_positions(scene, &moves)
            }
            GraphMutation::TranslateNodes { ids, delta } => reg.translate_nodes(scene, ids, *delta),
            GraphMutation::UpdateNodesColor { ids, patch } => {
                let patches: Vec<(NodeId, NodeColorPatch)> =
                    ids.iter().map(|id| (*id, patch.clone())).collect();
                reg.update_nodes_color(scene, &patches)
            }
            GraphMutation::UpdateEdgesColor { ids, color } => {
                let colors: Vec<(EdgeId, Color)> = ids.iter().map(|id| (*id, *color)).collect();
                reg.update_edges_color(scene, &colors)
            }
            GraphMutation::SetNodesVisibility { ids, visible } => {
                reg.update_nodes_visibility(scene, ids, *visible)
            }
            GraphMutation::SetEdgesVisibility { ids, visible } => {
                reg.update_edges_visibility(scene, ids, *visible)
            }
            GraphMutation::SelectNodes(ids) => reg.select_nodes(scene, ids),
            GraphMutation::SelectEdges(ids) => reg.select_edges(scene, ids),
            GraphMutation::SetEdgeControlOffset { id, offset } => {
                reg.set_edge_control_offset(scene, *id, *offset)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn mutations_flow_through_to_the_scene() {
        let mut engine = SyncEngine::new(Scene::new(), GraphConfig::default());
        engine
            .apply_mutation(GraphMutation::AddNodes(vec![
                NodeSpec::new("sy_a"),
                NodeSpec::new("sy_b").at(Vec3::new(10.0, 0.0, 0.0)),
            ]))
            .unwrap();
        engine
            .apply_mutation(GraphMutation::AddEdges {
                specs: vec![EdgeSpec::new("sy_e", "sy_a", "sy_b")],
                variant: EdgeVariant::Curved,
            })
            .unwrap();
        assert!(!engine.scene.is_empty());

        engine
            .apply_mutation(GraphMutation::TranslateNodes {
                ids: vec![NodeId::intern("sy_a")],
                delta: Vec3::new(0.0, 1.0, 0.0),
            })
            .unwrap();
        let edge = engine.registry.edge(EdgeId::intern("sy_e")).unwrap();
        assert_eq!(edge.source_pos, Vec3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn rejected_mutation_changes_nothing() {
        let mut engine = SyncEngine::new(Scene::new(), GraphConfig::default());
        let err = engine
            .apply_mutation(GraphMutation::SelectEdges(vec![EdgeId::intern("sy_ghost")]))
            .unwrap_err();
        assert_eq!(err, GraphError::UnknownEdge(EdgeId::intern("sy_ghost")));
        assert_eq!(engine.registry.edge_count(), 0);
    }
}
