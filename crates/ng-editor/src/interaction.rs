//! Pick/interaction state machine.
//!
//! Turns raw pointer input into hover, click, double-click, right-click and
//! drag events using ray picking. The controller only reads the graph; any
//! change it wants (moving nodes during a drag) comes back as
//! [`GraphMutation`]s for the sync engine to apply.
//!
//! ## Sessions
//!
//! | Session | Entered on | Left on |
//! |---------|-----------|---------|
//! | `Idle` / `Hovering` | move over nothing / an entity | press on a node |
//! | `Pressing` | primary press on a node | travel past the drag threshold, or release |
//! | `Dragging` | travel past the drag threshold | release |
//!
//! A press that never travels far enough is released without any drag
//! event and the following `click` is reported normally. A completed drag
//! sets a one-shot flag that swallows the `click` the browser sends after
//! the release; the next press clears it in case that click never arrives.
//! A `pointercancel` ends a drag like a release would, minus the swallowed
//! click, and leaves any hover.

use crate::events::{GraphEvent, Target};
use crate::input::InputEvent;
use crate::sync::GraphMutation;
use glam::Vec3;
use indexmap::IndexMap;
use ng_core::{EntityKinds, EntityRegistry, GraphConfig, NodeId, NodePosition, PickableEntity, Scene};
use ng_render::{CanvasBounds, Hit, PerspectiveCamera, Plane, Ray, nearest_eligible, pick_at};

/// Read-only view of everything picking needs.
pub struct PickContext<'a> {
    pub registry: &'a EntityRegistry,
    pub scene: &'a Scene,
    pub camera: &'a PerspectiveCamera,
    pub canvas: &'a CanvasBounds,
    pub config: &'a GraphConfig,
}

impl PickContext<'_> {
    /// World ray under a client point; `None` for a zero-area canvas.
    pub fn ray(&self, x: f64, y: f64) -> Option<Ray> {
        let ndc = self.canvas.to_ndc(x, y)?;
        Some(self.camera.ray_from_ndc(ndc))
    }

    pub fn hits(&self, x: f64, y: f64) -> Vec<Hit> {
        match self.ray(x, y) {
            Some(ray) => pick_at(
                self.scene,
                self.registry,
                &ray,
                self.config.interaction.line_pick_threshold,
            ),
            None => Vec::new(),
        }
    }

    /// External-facing payload for an entity, if it still exists.
    pub fn target(&self, entity: PickableEntity) -> Option<Target> {
        match entity {
            PickableEntity::Node(id) => self.registry.node(id).map(|n| Target::Node(n.to_data())),
            PickableEntity::StraightEdge(id) | PickableEntity::CurveEdge(id) => {
                self.registry.edge(id).map(|e| Target::Edge(e.to_data()))
            }
        }
    }

    /// Nearest eligible entity under the point, or the stage.
    fn classify(&self, x: f64, y: f64, kinds: EntityKinds) -> Target {
        nearest_eligible(&self.hits(x, y), kinds)
            .and_then(|hit| self.target(hit.entity))
            .unwrap_or(Target::Stage)
    }
}

/// Cursor affordance for the host to apply to the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cursor {
    #[default]
    Auto,
    Pointer,
    Move,
    Crosshair,
}

impl Cursor {
    pub fn as_css(&self) -> &'static str {
        match self {
            Cursor::Auto => "auto",
            Cursor::Pointer => "pointer",
            Cursor::Move => "move",
            Cursor::Crosshair => "crosshair",
        }
    }
}

/// What one input event produced.
#[derive(Debug, Default)]
pub struct Reaction {
    pub mutations: Vec<GraphMutation>,
    pub events: Vec<GraphEvent>,
}

/// Where a node was grabbed: a camera-facing plane through the node, and
/// the world offset from the node origin to the grab point.
#[derive(Debug, Clone, Copy)]
struct Grab {
    node: NodeId,
    plane: Plane,
    offset: Vec3,
}

#[derive(Debug, Clone)]
enum Session {
    Idle,
    Hovering(PickableEntity),
    Pressing {
        grab: Grab,
        origin: (f64, f64),
        hovered: Option<PickableEntity>,
    },
    Dragging {
        grab: Grab,
        /// Every node that moves with the grabbed one, and where it is now.
        positions: IndexMap<NodeId, Vec3>,
    },
}

pub struct InteractionController {
    session: Session,
    suppress_click: bool,
    cursor: Cursor,
    /// Most recent input, carried by events raised outside of `handle`.
    last_input: Option<InputEvent>,
}

impl Default for InteractionController {
    fn default() -> Self {
        Self::new()
    }
}

impl InteractionController {
    pub fn new() -> Self {
        Self {
            session: Session::Idle,
            suppress_click: false,
            cursor: Cursor::Auto,
            last_input: None,
        }
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn hovered(&self) -> Option<PickableEntity> {
        match &self.session {
            Session::Hovering(entity) => Some(*entity),
            Session::Pressing { hovered, .. } => *hovered,
            _ => None,
        }
    }

    /// The node being dragged, once the drag has started.
    pub fn dragging(&self) -> Option<NodeId> {
        match &self.session {
            Session::Dragging { grab, .. } => Some(grab.node),
            _ => None,
        }
    }

    /// Whether a press or drag is in progress.
    pub fn is_busy(&self) -> bool {
        matches!(self.session, Session::Pressing { .. } | Session::Dragging { .. })
    }

    /// Swallow the next click. Used when another gesture (box select) ends
    /// on a release that the host will also report as a click.
    pub fn suppress_next_click(&mut self) {
        self.suppress_click = true;
    }

    /// Abandon the current session and return to `Idle`. A pending press is
    /// dropped without a drag; a hovered entity gets its `hoveroff*`.
    pub fn reset(&mut self, ctx: &PickContext<'_>) -> Vec<GraphEvent> {
        let mut events = Vec::new();
        if let (Some(target), Some(input)) = (self.hovered().and_then(|e| ctx.target(e)), self.last_input) {
            events.push(GraphEvent::HoverOff { target, input });
        }
        if !matches!(self.session, Session::Idle) {
            log::debug!("interaction session reset");
        }
        self.session = Session::Idle;
        self.cursor = Cursor::Auto;
        events
    }

    /// Forget entities that no longer exist.
    pub fn prune(&mut self, registry: &EntityRegistry) {
        let gone = match &self.session {
            Session::Idle => false,
            Session::Hovering(entity) => !registry.is_visible(*entity),
            Session::Pressing { grab, .. } | Session::Dragging { grab, .. } => {
                registry.node(grab.node).is_none()
            }
        };
        if gone {
            log::debug!("interaction session dropped: entity removed");
            self.session = Session::Idle;
            self.cursor = Cursor::Auto;
        }
    }

    pub fn handle(&mut self, input: &InputEvent, ctx: &PickContext<'_>) -> Reaction {
        let mut out = Reaction::default();
        self.last_input = Some(*input);
        match *input {
            InputEvent::PointerDown { x, y, .. } if input.is_primary() => {
                self.suppress_click = false;
                self.press(x, y, ctx);
            }
            InputEvent::PointerMove { x, y, .. } => self.pointer_move(x, y, input, ctx, &mut out),
            InputEvent::PointerUp { .. } if input.is_primary() => self.release(input, &mut out),
            InputEvent::PointerCancel { .. } => {
                if self.dragging().is_some() {
                    self.release(input, &mut out);
                    self.suppress_click = false;
                }
                out.events.extend(self.reset(ctx));
            }
            InputEvent::Click { x, y, .. } => {
                if self.suppress_click {
                    self.suppress_click = false;
                    log::trace!("click swallowed after gesture");
                } else if ctx.config.interaction.single_selection && self.dragging().is_none() {
                    let target = ctx.classify(x, y, ctx.config.interaction.single_selection_enable_types);
                    out.events.push(GraphEvent::Click {
                        target,
                        input: *input,
                    });
                }
            }
            InputEvent::DoubleClick { x, y, .. } => {
                if self.dragging().is_none() {
                    let target = ctx.classify(x, y, ctx.config.interaction.single_selection_enable_types);
                    out.events.push(GraphEvent::DoubleClick {
                        target,
                        input: *input,
                    });
                }
            }
            InputEvent::ContextMenu { x, y, .. } => {
                if ctx.config.interaction.context_menu && self.dragging().is_none() {
                    let target = ctx.classify(x, y, ctx.config.interaction.context_menu_enable_types);
                    out.events.push(GraphEvent::RightClick {
                        target,
                        input: *input,
                    });
                }
            }
            _ => {}
        }
        out
    }

    // ─── Press / drag ────────────────────────────────────────────────────

    fn press(&mut self, x: f64, y: f64, ctx: &PickContext<'_>) {
        let Some(ray) = ctx.ray(x, y) else {
            return;
        };
        let hits = pick_at(
            ctx.scene,
            ctx.registry,
            &ray,
            ctx.config.interaction.line_pick_threshold,
        );
        // Only the front-most hit can be grabbed, and only if it is a node.
        let Some(node) = hits.first().and_then(|hit| hit.entity.node_id()) else {
            return;
        };
        let Some(position) = ctx.registry.node(node).map(|n| n.position) else {
            return;
        };

        let origin_world = ctx.scene.to_world(position);
        let plane = Plane::from_normal_and_point(ctx.camera.world_direction(), origin_world);
        let offset = plane
            .intersect_ray(&ray)
            .map(|p| p - origin_world)
            .unwrap_or(Vec3::ZERO);

        self.session = Session::Pressing {
            grab: Grab {
                node,
                plane,
                offset,
            },
            origin: (x, y),
            hovered: self.hovered(),
        };
        self.cursor = Cursor::Move;
    }

    fn pointer_move(
        &mut self,
        x: f64,
        y: f64,
        input: &InputEvent,
        ctx: &PickContext<'_>,
        out: &mut Reaction,
    ) {
        if let Session::Pressing {
            grab,
            origin,
            hovered,
        } = &self.session
        {
            let travel = (x - origin.0).hypot(y - origin.1);
            if travel <= f64::from(ctx.config.interaction.drag_threshold) {
                return;
            }
            let (grab, hovered) = (*grab, *hovered);
            self.begin_drag(grab, hovered, input, ctx, out);
        }

        match &self.session {
            Session::Dragging { .. } => self.drag_to(x, y, input, ctx, out),
            Session::Idle | Session::Hovering(_) => self.update_hover(x, y, input, ctx, out),
            Session::Pressing { .. } => {}
        }
    }

    fn begin_drag(
        &mut self,
        grab: Grab,
        hovered: Option<PickableEntity>,
        input: &InputEvent,
        ctx: &PickContext<'_>,
        out: &mut Reaction,
    ) {
        if let Some(target) = hovered.and_then(|entity| ctx.target(entity)) {
            out.events.push(GraphEvent::HoverOff {
                target,
                input: *input,
            });
        }

        let grabbed_selected = ctx.registry.node(grab.node).is_some_and(|n| n.selected);
        let group = if grabbed_selected {
            ctx.registry.selected_node_ids()
        } else {
            vec![grab.node]
        };
        let positions: IndexMap<NodeId, Vec3> = group
            .into_iter()
            .filter_map(|id| ctx.registry.node(id).map(|n| (id, n.position)))
            .collect();

        log::debug!("drag start on {} ({} node(s))", grab.node, positions.len());
        out.events.push(GraphEvent::DragStart {
            node: grab.node,
            input: *input,
        });
        self.session = Session::Dragging { grab, positions };
        self.cursor = Cursor::Move;
    }

    fn drag_to(&mut self, x: f64, y: f64, input: &InputEvent, ctx: &PickContext<'_>, out: &mut Reaction) {
        let Session::Dragging { grab, positions } = &mut self.session else {
            return;
        };
        let Some(hit) = ctx.ray(x, y).and_then(|ray| grab.plane.intersect_ray(&ray)) else {
            return;
        };
        let Some(current) = positions.get(&grab.node).copied() else {
            return;
        };
        let target = ctx.scene.to_graph(hit - grab.offset);
        let delta = target - current;
        if delta == Vec3::ZERO {
            return;
        }
        for position in positions.values_mut() {
            *position += delta;
        }
        log::trace!("drag {} by {delta}", grab.node);
        out.mutations.push(GraphMutation::TranslateNodes {
            ids: positions.keys().copied().collect(),
            delta,
        });
        out.events.push(GraphEvent::Drag {
            node: grab.node,
            delta,
            input: *input,
        });
    }

    fn release(&mut self, input: &InputEvent, out: &mut Reaction) {
        match std::mem::replace(&mut self.session, Session::Idle) {
            Session::Dragging { grab, positions } => {
                let nodes: Vec<NodePosition> = positions
                    .into_iter()
                    .map(|(id, position)| NodePosition { id, position })
                    .collect();
                log::debug!("drag end on {} ({} node(s))", grab.node, nodes.len());
                out.events.push(GraphEvent::DragEnd {
                    nodes: nodes.clone(),
                    input: *input,
                });
                out.events.push(GraphEvent::NodesPositionChanged {
                    nodes_position: nodes,
                });
                self.suppress_click = true;
                self.cursor = Cursor::Auto;
            }
            Session::Pressing { hovered, .. } => {
                self.cursor = if hovered.is_some() {
                    Cursor::Pointer
                } else {
                    Cursor::Auto
                };
                if let Some(entity) = hovered {
                    self.session = Session::Hovering(entity);
                }
            }
            other => self.session = other,
        }
    }

    // ─── Hover ───────────────────────────────────────────────────────────

    fn update_hover(&mut self, x: f64, y: f64, input: &InputEvent, ctx: &PickContext<'_>, out: &mut Reaction) {
        let next = nearest_eligible(&ctx.hits(x, y), ctx.config.interaction.hover_enable_types)
            .map(|hit| hit.entity);
        let current = self.hovered();
        if next == current {
            return;
        }

        if let Some(target) = current.and_then(|entity| ctx.target(entity)) {
            out.events.push(GraphEvent::HoverOff {
                target,
                input: *input,
            });
        }
        if let Some(target) = next.and_then(|entity| ctx.target(entity)) {
            out.events.push(GraphEvent::HoverOn {
                target,
                input: *input,
            });
        }

        match next {
            Some(entity) => {
                self.session = Session::Hovering(entity);
                self.cursor = Cursor::Pointer;
            }
            None => {
                self.session = Session::Idle;
                self.cursor = Cursor::Auto;
            }
        }
    }
}
