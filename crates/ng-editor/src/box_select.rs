//! Box-selection controller.
//!
//! `Disabled → Armed → DraggingRect → Disabled`. While dragging, the
//! rectangle between the anchor and the pointer is frustum-picked on every
//! move and the hits are accumulated in insertion order, so an entity that
//! leaves and re-enters the rectangle is still reported once. The release
//! emits a single `boxSelect` event and disarms; selection flags are left to
//! the host. A cancelled pointer drops the gesture without an event.

use crate::events::GraphEvent;
use crate::input::InputEvent;
use crate::interaction::PickContext;
use glam::Vec2;
use indexmap::IndexSet;
use kurbo::{Point, Rect};
use ng_core::PickableEntity;
use ng_render::pick_in_rect;

#[derive(Debug, Clone, Default)]
enum BoxState {
    #[default]
    Disabled,
    Armed,
    DraggingRect {
        anchor: Point,
        current: Point,
        found: IndexSet<PickableEntity>,
    },
}

#[derive(Debug, Default)]
pub struct BoxSelectController {
    state: BoxState,
}

impl BoxSelectController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm for one gesture. Returns `false` when box selection is disabled
    /// by configuration.
    pub fn arm(&mut self, enabled: bool) -> bool {
        if !enabled {
            log::debug!("box select not armed: disabled by configuration");
            return false;
        }
        if matches!(self.state, BoxState::Disabled) {
            log::debug!("box select armed");
            self.state = BoxState::Armed;
        }
        true
    }

    /// Drop the gesture without emitting anything.
    pub fn disarm(&mut self) {
        self.state = BoxState::Disabled;
    }

    /// Whether input should be routed here instead of to the interaction
    /// controller.
    pub fn is_active(&self) -> bool {
        !matches!(self.state, BoxState::Disabled)
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, BoxState::DraggingRect { .. })
    }

    /// Current rectangle in client pixels, for the host's overlay.
    pub fn rect(&self) -> Option<Rect> {
        match &self.state {
            BoxState::DraggingRect { anchor, current, .. } => Some(Rect::from_points(*anchor, *current)),
            _ => None,
        }
    }

    /// Feed one input event. Returns the finalized `boxSelect` event on the
    /// release that ends the gesture.
    pub fn handle(&mut self, input: &InputEvent, ctx: &PickContext<'_>) -> Option<GraphEvent> {
        if let InputEvent::PointerCancel { .. } = input {
            log::debug!("box select cancelled");
            self.disarm();
            return None;
        }

        if let (BoxState::Armed, InputEvent::PointerDown { x, y, .. }) = (&self.state, *input)
            && input.is_primary()
        {
            let anchor = Point::new(x, y);
            self.state = BoxState::DraggingRect {
                anchor,
                current: anchor,
                found: IndexSet::new(),
            };
            return None;
        }

        match (&mut self.state, *input) {
            (BoxState::DraggingRect { anchor, current, found }, InputEvent::PointerMove { x, y, .. }) => {
                *current = Point::new(x, y);
                let hits = pick_rect(ctx, *anchor, *current);
                log::trace!("box select sweep: {} hit(s)", hits.len());
                found.extend(hits);
                None
            }
            (BoxState::DraggingRect { anchor, found, .. }, InputEvent::PointerUp { x, y, .. })
                if input.is_primary() =>
            {
                found.extend(pick_rect(ctx, *anchor, Point::new(x, y)));
                let found = std::mem::take(found);
                self.disarm();

                let node_ids: Vec<_> = found.iter().filter_map(|e| e.node_id()).collect();
                let edge_ids: Vec<_> = found.iter().filter_map(|e| e.edge_id()).collect();
                log::debug!(
                    "box select finished: {} node(s), {} edge(s)",
                    node_ids.len(),
                    edge_ids.len()
                );
                Some(GraphEvent::BoxSelect { node_ids, edge_ids })
            }
            _ => None,
        }
    }
}

fn pick_rect(ctx: &PickContext<'_>, a: Point, b: Point) -> Vec<PickableEntity> {
    let (Some(ndc_a), Some(ndc_b)) = (ndc(ctx, a), ndc(ctx, b)) else {
        return Vec::new();
    };
    pick_in_rect(
        ctx.scene,
        ctx.registry,
        ctx.camera,
        ndc_a,
        ndc_b,
        ctx.config.box_selection.enable_types,
    )
}

fn ndc(ctx: &PickContext<'_>, p: Point) -> Option<Vec2> {
    ctx.canvas.to_ndc(p.x, p.y)
}
