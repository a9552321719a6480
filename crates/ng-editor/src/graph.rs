//! `NetworkGraph`: the outward facade.
//!
//! Owns the sync engine, the camera and canvas bounds, and both gesture
//! controllers. Input is routed to the box-selection controller while it is
//! armed and to the interaction controller otherwise; never to both.

use crate::box_select::BoxSelectController;
use crate::events::GraphEvent;
use crate::input::InputEvent;
use crate::interaction::{Cursor, InteractionController, PickContext};
use crate::sync::{GraphMutation, SyncEngine};
use kurbo::Rect;
use ng_core::*;
use ng_render::{CanvasBounds, Hit, PerspectiveCamera, pick_in_rect};

#[derive(Default)]
pub struct NetworkGraphBuilder {
    scene: Option<Scene>,
    camera: Option<PerspectiveCamera>,
    canvas: Option<CanvasBounds>,
    config: Option<GraphConfig>,
}

impl NetworkGraphBuilder {
    pub fn scene(mut self, scene: Scene) -> Self {
        self.scene = Some(scene);
        self
    }

    pub fn camera(mut self, camera: PerspectiveCamera) -> Self {
        self.camera = Some(camera);
        self
    }

    pub fn canvas(mut self, canvas: CanvasBounds) -> Self {
        self.canvas = Some(canvas);
        self
    }

    pub fn config(mut self, config: GraphConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn build(self) -> Result<NetworkGraph> {
        let scene = self.scene.ok_or(GraphError::MissingDependency("scene"))?;
        let camera = self.camera.ok_or(GraphError::MissingDependency("camera"))?;
        let canvas = self.canvas.ok_or(GraphError::MissingDependency("canvas"))?;
        let config = self.config.unwrap_or_default();
        Ok(NetworkGraph {
            engine: SyncEngine::new(scene, config),
            camera,
            canvas,
            interaction: InteractionController::new(),
            box_select: BoxSelectController::new(),
        })
    }
}

pub struct NetworkGraph {
    engine: SyncEngine,
    camera: PerspectiveCamera,
    canvas: CanvasBounds,
    interaction: InteractionController,
    box_select: BoxSelectController,
}

impl NetworkGraph {
    pub fn builder() -> NetworkGraphBuilder {
        NetworkGraphBuilder::default()
    }

    // ─── Graph content ───────────────────────────────────────────────────

    pub fn add_nodes(&mut self, specs: Vec<NodeSpec>) -> Result<()> {
        self.engine.apply_mutation(GraphMutation::AddNodes(specs))
    }

    /// Delete nodes and every edge attached to them.
    pub fn delete_nodes(&mut self, ids: Vec<NodeId>) -> Result<()> {
        self.engine.apply_mutation(GraphMutation::DeleteNodes(ids))?;
        self.interaction.prune(&self.engine.registry);
        Ok(())
    }

    pub fn add_edges(&mut self, specs: Vec<EdgeSpec>, variant: EdgeVariant) -> Result<()> {
        self.engine
            .apply_mutation(GraphMutation::AddEdges { specs, variant })
    }

    pub fn delete_edges(&mut self, ids: Vec<EdgeId>) -> Result<()> {
        self.engine.apply_mutation(GraphMutation::DeleteEdges(ids))?;
        self.interaction.prune(&self.engine.registry);
        Ok(())
    }

    /// Move nodes to absolute graph-space positions; incident edges follow.
    pub fn update_nodes_position(&mut self, positions: Vec<NodePosition>) -> Result<()> {
        self.engine
            .apply_mutation(GraphMutation::SetNodePositions(positions))
    }

    pub fn update_nodes_color(&mut self, ids: Vec<NodeId>, patch: NodeColorPatch) -> Result<()> {
        self.engine
            .apply_mutation(GraphMutation::UpdateNodesColor { ids, patch })
    }

    pub fn update_edges_color(&mut self, ids: Vec<EdgeId>, color: Color) -> Result<()> {
        self.engine
            .apply_mutation(GraphMutation::UpdateEdgesColor { ids, color })
    }

    pub fn update_nodes_visibility(&mut self, ids: Vec<NodeId>, visible: bool) -> Result<()> {
        self.engine
            .apply_mutation(GraphMutation::SetNodesVisibility { ids, visible })?;
        self.interaction.prune(&self.engine.registry);
        Ok(())
    }

    pub fn update_edges_visibility(&mut self, ids: Vec<EdgeId>, visible: bool) -> Result<()> {
        self.engine
            .apply_mutation(GraphMutation::SetEdgesVisibility { ids, visible })?;
        self.interaction.prune(&self.engine.registry);
        Ok(())
    }

    pub fn set_edge_control_offset(&mut self, id: EdgeId, offset: f32) -> Result<()> {
        self.engine
            .apply_mutation(GraphMutation::SetEdgeControlOffset { id, offset })
    }

    // ─── Selection ───────────────────────────────────────────────────────

    /// Replace the node selection.
    pub fn select_nodes_by_ids(&mut self, ids: Vec<NodeId>) -> Result<()> {
        self.engine.apply_mutation(GraphMutation::SelectNodes(ids))
    }

    /// Replace the edge selection.
    pub fn select_edges_by_ids(&mut self, ids: Vec<EdgeId>) -> Result<()> {
        self.engine.apply_mutation(GraphMutation::SelectEdges(ids))
    }

    pub fn selected_node_ids(&self) -> Vec<NodeId> {
        self.engine.registry.selected_node_ids()
    }

    pub fn selected_edge_ids(&self) -> Vec<EdgeId> {
        self.engine.registry.selected_edge_ids()
    }

    /// Arm box selection for the next gesture. Returns `None` when box
    /// selection is disabled or a drag is in progress. Otherwise the
    /// interaction controller is reset: a pending press is dropped and the
    /// returned events carry the `hoveroff*` for whatever was hovered.
    pub fn enable_box_select(&mut self) -> Option<Vec<GraphEvent>> {
        if let Some(node) = self.interaction.dragging() {
            log::warn!("box select ignored: drag in progress on {node}");
            return None;
        }
        if !self.box_select.arm(self.engine.config.box_selection.enabled) {
            return None;
        }
        let ctx = PickContext {
            registry: &self.engine.registry,
            scene: &self.engine.scene,
            camera: &self.camera,
            canvas: &self.canvas,
            config: &self.engine.config,
        };
        Some(self.interaction.reset(&ctx))
    }

    /// Rectangle of the box-selection gesture in client pixels, while one is
    /// being dragged.
    pub fn selection_rect(&self) -> Option<Rect> {
        self.box_select.rect()
    }

    // ─── View ────────────────────────────────────────────────────────────

    /// Move or resize the canvas. The camera aspect follows the new size.
    pub fn set_canvas_bounds(&mut self, canvas: CanvasBounds) {
        self.canvas = canvas;
        if let Some(aspect) = canvas.aspect() {
            self.camera.set_aspect(aspect);
        }
    }

    pub fn canvas_bounds(&self) -> CanvasBounds {
        self.canvas
    }

    pub fn set_camera(&mut self, camera: PerspectiveCamera) {
        self.camera = camera;
    }

    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    pub fn cursor(&self) -> Cursor {
        if self.box_select.is_active() {
            Cursor::Crosshair
        } else {
            self.interaction.cursor()
        }
    }

    pub fn config(&self) -> &GraphConfig {
        &self.engine.config
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.engine.registry
    }

    pub fn scene(&self) -> &Scene {
        &self.engine.scene
    }

    pub fn node_data(&self, id: NodeId) -> Option<NodeData> {
        self.engine.registry.node(id).map(|n| n.to_data())
    }

    pub fn edge_data(&self, id: EdgeId) -> Option<EdgeData> {
        self.engine.registry.edge(id).map(|e| e.to_data())
    }

    // ─── Picking ─────────────────────────────────────────────────────────

    /// Entities under a client point, nearest first.
    pub fn pick_at(&self, x: f64, y: f64) -> Vec<Hit> {
        self.pick_context().hits(x, y)
    }

    /// Entities of the box-selectable kinds inside a client rectangle.
    pub fn pick_in_rect(&self, rect: Rect) -> Vec<PickableEntity> {
        let (Some(a), Some(b)) = (
            self.canvas.to_ndc(rect.x0, rect.y0),
            self.canvas.to_ndc(rect.x1, rect.y1),
        ) else {
            return Vec::new();
        };
        pick_in_rect(
            &self.engine.scene,
            &self.engine.registry,
            &self.camera,
            a,
            b,
            self.engine.config.box_selection.enable_types,
        )
    }

    // ─── Input ───────────────────────────────────────────────────────────

    /// Feed one pointer event and collect the semantic events it produced.
    pub fn handle_input(&mut self, input: &InputEvent) -> Vec<GraphEvent> {
        let ctx = PickContext {
            registry: &self.engine.registry,
            scene: &self.engine.scene,
            camera: &self.camera,
            canvas: &self.canvas,
            config: &self.engine.config,
        };

        if self.box_select.is_active() {
            let finished = self.box_select.handle(input, &ctx);
            if finished.is_some() {
                // The release that ends the box is followed by a click.
                self.interaction.suppress_next_click();
            }
            return finished.into_iter().collect();
        }

        let reaction = self.interaction.handle(input, &ctx);
        for mutation in reaction.mutations {
            if let Err(err) = self.engine.apply_mutation(mutation) {
                log::warn!("gesture mutation failed: {err}");
            }
        }
        reaction.events
    }

    fn pick_context(&self) -> PickContext<'_> {
        PickContext {
            registry: &self.engine.registry,
            scene: &self.engine.scene,
            camera: &self.camera,
            canvas: &self.canvas,
            config: &self.engine.config,
        }
    }
}
