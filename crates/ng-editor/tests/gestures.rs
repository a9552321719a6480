//! Integration tests: pointer gestures through the `NetworkGraph` facade.
//!
//! The camera sits on +Z looking at the origin over a 400×400 canvas, so
//! the graph's XY plane faces the viewer and the origin projects to the
//! canvas center.

use kurbo::{Point, Rect};
use ng_core::glam::Vec3;
use ng_core::*;
use ng_editor::*;
use ng_render::{CanvasBounds, PerspectiveCamera};
use pretty_assertions::assert_eq;

fn n(id: &str) -> NodeId {
    NodeId::intern(id)
}

fn e(id: &str) -> EdgeId {
    EdgeId::intern(id)
}

fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn graph_with(config: GraphConfig) -> NetworkGraph {
    init_logs();
    let mut camera = PerspectiveCamera::from_config(&config.camera, &config.view_port);
    camera.position = Vec3::new(0.0, 0.0, 100.0);
    camera.look_at(Vec3::ZERO);
    NetworkGraph::builder()
        .scene(Scene::new())
        .camera(camera)
        .canvas(CanvasBounds::new(0.0, 0.0, 400.0, 400.0))
        .config(config)
        .build()
        .unwrap()
}

fn graph() -> NetworkGraph {
    graph_with(GraphConfig::default())
}

/// Client pixel where a graph-space point is drawn.
fn client(graph: &NetworkGraph, world: Vec3) -> Point {
    let ndc = graph.camera().project(world).truncate();
    graph.canvas_bounds().from_ndc(ndc)
}

fn names(events: &[GraphEvent]) -> Vec<String> {
    events.iter().map(|e| e.name()).collect()
}

fn send(graph: &mut NetworkGraph, input: InputEvent) -> Vec<GraphEvent> {
    graph.handle_input(&input)
}

// ─── Hover ───────────────────────────────────────────────────────────────

#[test]
fn hover_enters_and_leaves_a_node() {
    let mut g = graph();
    g.add_nodes(vec![NodeSpec::new("gh_a").at(Vec3::ZERO)]).unwrap();
    let p = client(&g, Vec3::ZERO);

    let events = send(&mut g, InputEvent::pointer_move(p.x, p.y));
    assert_eq!(names(&events), vec!["hoveronNode"]);
    assert_eq!(g.cursor(), Cursor::Pointer);
    match &events[0] {
        GraphEvent::HoverOn {
            target: Target::Node(data),
            ..
        } => assert_eq!(data.id, n("gh_a")),
        other => panic!("unexpected {other:?}"),
    }

    let events = send(&mut g, InputEvent::pointer_move(5.0, 5.0));
    assert_eq!(names(&events), vec!["hoveroffNode"]);
    assert_eq!(g.cursor(), Cursor::Auto);
}

#[test]
fn hover_reports_edges() {
    let mut g = graph();
    g.add_nodes(vec![
        NodeSpec::new("ghe_a").at(Vec3::new(-30.0, 0.0, 0.0)),
        NodeSpec::new("ghe_b").at(Vec3::new(30.0, 0.0, 0.0)),
    ])
    .unwrap();
    g.add_edges(vec![EdgeSpec::new("ghe_e", "ghe_a", "ghe_b")], EdgeVariant::Straight)
        .unwrap();

    let p = client(&g, Vec3::ZERO);
    let events = send(&mut g, InputEvent::pointer_move(p.x, p.y));
    assert_eq!(names(&events), vec!["hoveronEdge"]);
}

#[test]
fn deleting_the_hovered_node_forgets_it() {
    let mut g = graph();
    g.add_nodes(vec![NodeSpec::new("gd_a").at(Vec3::ZERO)]).unwrap();
    let p = client(&g, Vec3::ZERO);
    send(&mut g, InputEvent::pointer_move(p.x, p.y));

    g.delete_nodes(vec![n("gd_a")]).unwrap();
    assert_eq!(g.cursor(), Cursor::Auto);
    let events = send(&mut g, InputEvent::pointer_move(5.0, 5.0));
    assert!(events.is_empty(), "no hover-off for a deleted node: {events:?}");
}

// ─── Clicks ──────────────────────────────────────────────────────────────

#[test]
fn clicks_classify_by_kind() {
    let mut g = graph();
    g.add_nodes(vec![NodeSpec::new("gc_a").at(Vec3::ZERO)]).unwrap();
    let p = client(&g, Vec3::ZERO);

    assert_eq!(names(&send(&mut g, InputEvent::click(p.x, p.y))), vec!["clickNode"]);
    assert_eq!(names(&send(&mut g, InputEvent::click(5.0, 5.0))), vec!["clickStage"]);
    assert_eq!(
        names(&send(&mut g, InputEvent::double_click(p.x, p.y))),
        vec!["dblclickNode"]
    );
    assert_eq!(
        names(&send(&mut g, InputEvent::context_menu(5.0, 5.0))),
        vec!["rightClickStage"]
    );
}

#[test]
fn disabled_kinds_fall_through_to_stage() {
    let mut config = GraphConfig::default();
    config.interaction.single_selection_enable_types = EntityKinds::EDGES;
    config.interaction.context_menu = false;
    let mut g = graph_with(config);
    g.add_nodes(vec![NodeSpec::new("gk_a").at(Vec3::ZERO)]).unwrap();
    let p = client(&g, Vec3::ZERO);

    assert_eq!(names(&send(&mut g, InputEvent::click(p.x, p.y))), vec!["clickStage"]);
    assert!(send(&mut g, InputEvent::context_menu(p.x, p.y)).is_empty());
}

#[test]
fn press_and_release_in_place_is_a_click() {
    let mut g = graph();
    g.add_nodes(vec![NodeSpec::new("gp_a").at(Vec3::ZERO)]).unwrap();
    let p = client(&g, Vec3::ZERO);

    assert!(send(&mut g, InputEvent::pointer_down(p.x, p.y)).is_empty());
    assert!(send(&mut g, InputEvent::pointer_move(p.x + 1.0, p.y)).is_empty());
    assert!(send(&mut g, InputEvent::pointer_up(p.x + 1.0, p.y)).is_empty());
    assert_eq!(
        names(&send(&mut g, InputEvent::click(p.x + 1.0, p.y))),
        vec!["clickNode"]
    );
    assert_eq!(g.node_data(n("gp_a")).unwrap().position, Vec3::ZERO);
}

// ─── Drag ────────────────────────────────────────────────────────────────

#[test]
fn drag_moves_node_and_swallows_the_following_click() {
    let mut g = graph();
    g.add_nodes(vec![
        NodeSpec::new("gm_a").at(Vec3::ZERO),
        NodeSpec::new("gm_b").at(Vec3::new(30.0, 30.0, 0.0)),
    ])
    .unwrap();
    g.add_edges(vec![EdgeSpec::new("gm_e", "gm_a", "gm_b")], EdgeVariant::Curved)
        .unwrap();
    let p = client(&g, Vec3::ZERO);

    send(&mut g, InputEvent::pointer_down(p.x, p.y));
    let events = send(&mut g, InputEvent::pointer_move(p.x + 40.0, p.y));
    assert_eq!(names(&events), vec!["dragStart", "drag"]);
    assert_eq!(g.cursor(), Cursor::Move);

    let moved = g.node_data(n("gm_a")).unwrap().position;
    let on_screen = g.camera().project(moved).truncate();
    let expected = g.canvas_bounds().to_ndc(p.x + 40.0, p.y).unwrap();
    assert!(
        on_screen.abs_diff_eq(expected, 1e-3),
        "node should stay under the cursor: {on_screen} vs {expected}"
    );
    assert!(moved.z.abs() < 1e-3, "drag plane faces the camera: {moved}");

    let edge = g.registry().edge(e("gm_e")).unwrap();
    assert_eq!(edge.source_pos, moved);

    let events = send(&mut g, InputEvent::pointer_up(p.x + 40.0, p.y));
    assert_eq!(names(&events), vec!["dragEnd", "nodesPositionChanged"]);
    match &events[1] {
        GraphEvent::NodesPositionChanged { nodes_position } => {
            assert_eq!(nodes_position.len(), 1);
            assert_eq!(nodes_position[0].id, n("gm_a"));
            assert_eq!(nodes_position[0].position, moved);
        }
        other => panic!("unexpected {other:?}"),
    }

    // The browser's click after the release is not a click on the node.
    assert!(send(&mut g, InputEvent::click(p.x + 40.0, p.y)).is_empty());
    assert_eq!(
        names(&send(&mut g, InputEvent::click(p.x + 40.0, p.y))),
        vec!["clickNode"]
    );
}

#[test]
fn drag_leaves_hover_first() {
    let mut g = graph();
    g.add_nodes(vec![NodeSpec::new("gl_a").at(Vec3::ZERO)]).unwrap();
    let p = client(&g, Vec3::ZERO);

    assert_eq!(names(&send(&mut g, InputEvent::pointer_move(p.x, p.y))), vec!["hoveronNode"]);
    send(&mut g, InputEvent::pointer_down(p.x, p.y));
    let events = send(&mut g, InputEvent::pointer_move(p.x, p.y + 30.0));
    assert_eq!(names(&events), vec!["hoveroffNode", "dragStart", "drag"]);
}

#[test]
fn selected_nodes_move_as_a_group() {
    let mut g = graph();
    g.add_nodes(vec![
        NodeSpec::new("gg_a").at(Vec3::ZERO),
        NodeSpec::new("gg_b").at(Vec3::new(20.0, 0.0, 0.0)),
        NodeSpec::new("gg_c").at(Vec3::new(-20.0, 0.0, 0.0)),
    ])
    .unwrap();
    g.select_nodes_by_ids(vec![n("gg_a"), n("gg_b")]).unwrap();
    let p = client(&g, Vec3::ZERO);

    send(&mut g, InputEvent::pointer_down(p.x, p.y));
    send(&mut g, InputEvent::pointer_move(p.x, p.y - 25.0));
    send(&mut g, InputEvent::pointer_move(p.x + 10.0, p.y - 50.0));
    let events = send(&mut g, InputEvent::pointer_up(p.x + 10.0, p.y - 50.0));

    let a = g.node_data(n("gg_a")).unwrap().position;
    let b = g.node_data(n("gg_b")).unwrap().position;
    assert!(a.y > 1.0, "dragged upwards: {a}");
    assert!((b - a).abs_diff_eq(Vec3::new(20.0, 0.0, 0.0), 1e-3));
    assert_eq!(g.node_data(n("gg_c")).unwrap().position, Vec3::new(-20.0, 0.0, 0.0));

    match &events[0] {
        GraphEvent::DragEnd { nodes, .. } => {
            let ids: Vec<NodeId> = nodes.iter().map(|p| p.id).collect();
            assert_eq!(ids, vec![n("gg_a"), n("gg_b")]);
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn unselected_node_drags_alone() {
    let mut g = graph();
    g.add_nodes(vec![
        NodeSpec::new("gu_a").at(Vec3::ZERO),
        NodeSpec::new("gu_b").at(Vec3::new(20.0, 0.0, 0.0)),
    ])
    .unwrap();
    g.select_nodes_by_ids(vec![n("gu_b")]).unwrap();
    let p = client(&g, Vec3::ZERO);

    send(&mut g, InputEvent::pointer_down(p.x, p.y));
    send(&mut g, InputEvent::pointer_move(p.x, p.y + 30.0));
    send(&mut g, InputEvent::pointer_up(p.x, p.y + 30.0));

    assert_eq!(g.node_data(n("gu_b")).unwrap().position, Vec3::new(20.0, 0.0, 0.0));
}

// ─── Box selection ───────────────────────────────────────────────────────

#[test]
fn box_sweep_reports_each_entity_once() {
    let mut g = graph();
    g.add_nodes(vec![
        NodeSpec::new("gb_x").at(Vec3::ZERO),
        NodeSpec::new("gb_far").at(Vec3::new(35.0, 35.0, 0.0)),
    ])
    .unwrap();
    let c = client(&g, Vec3::ZERO);

    assert_eq!(g.enable_box_select(), Some(vec![]));
    assert_eq!(g.cursor(), Cursor::Crosshair);

    let (x0, y0) = (c.x - 20.0, c.y - 20.0);
    assert!(send(&mut g, InputEvent::pointer_down(x0, y0)).is_empty());
    // Over X, off it, and back over it.
    assert!(send(&mut g, InputEvent::pointer_move(c.x + 20.0, c.y + 20.0)).is_empty());
    assert!(send(&mut g, InputEvent::pointer_move(x0 + 5.0, y0 + 5.0)).is_empty());
    assert!(send(&mut g, InputEvent::pointer_move(c.x + 20.0, c.y + 20.0)).is_empty());
    assert_eq!(
        g.selection_rect(),
        Some(Rect::new(x0, y0, c.x + 20.0, c.y + 20.0))
    );

    let events = send(&mut g, InputEvent::pointer_up(c.x + 20.0, c.y + 20.0));
    assert_eq!(
        events,
        vec![GraphEvent::BoxSelect {
            node_ids: vec![n("gb_x")],
            edge_ids: vec![],
        }]
    );

    // One gesture only; selection flags are the host's business.
    assert_eq!(g.selection_rect(), None);
    assert!(g.selected_node_ids().is_empty());

    // The release's click is swallowed, later ones are not.
    assert!(send(&mut g, InputEvent::click(c.x + 20.0, c.y + 20.0)).is_empty());
    assert_eq!(names(&send(&mut g, InputEvent::click(c.x, c.y))), vec!["clickNode"]);
}

#[test]
fn box_select_blocks_hover_and_drag() {
    let mut g = graph();
    g.add_nodes(vec![NodeSpec::new("gx_a").at(Vec3::ZERO)]).unwrap();
    let c = client(&g, Vec3::ZERO);

    assert!(g.enable_box_select().is_some());
    assert!(send(&mut g, InputEvent::pointer_move(c.x, c.y)).is_empty());
    send(&mut g, InputEvent::pointer_down(c.x, c.y));
    send(&mut g, InputEvent::pointer_move(c.x + 40.0, c.y + 40.0));
    send(&mut g, InputEvent::pointer_up(c.x + 40.0, c.y + 40.0));
    assert_eq!(g.node_data(n("gx_a")).unwrap().position, Vec3::ZERO);
}

#[test]
fn box_select_is_refused_mid_drag() {
    let mut g = graph();
    g.add_nodes(vec![NodeSpec::new("gr_a").at(Vec3::ZERO)]).unwrap();
    let c = client(&g, Vec3::ZERO);

    send(&mut g, InputEvent::pointer_down(c.x, c.y));
    send(&mut g, InputEvent::pointer_move(c.x + 30.0, c.y));
    assert_eq!(g.enable_box_select(), None);
    assert_eq!(names(&send(&mut g, InputEvent::pointer_up(c.x + 30.0, c.y)))[0], "dragEnd");
}

/// Drive an empty box gesture in the top-left corner of the canvas.
fn empty_box_gesture(g: &mut NetworkGraph) {
    assert!(send(g, InputEvent::pointer_down(5.0, 5.0)).is_empty());
    assert!(send(g, InputEvent::pointer_move(20.0, 20.0)).is_empty());
    let events = send(g, InputEvent::pointer_up(20.0, 20.0));
    assert_eq!(
        events,
        vec![GraphEvent::BoxSelect {
            node_ids: vec![],
            edge_ids: vec![],
        }]
    );
}

#[test]
fn arming_box_select_leaves_the_hover() {
    let mut g = graph();
    g.add_nodes(vec![NodeSpec::new("gv_a").at(Vec3::ZERO)]).unwrap();
    let c = client(&g, Vec3::ZERO);

    assert_eq!(names(&send(&mut g, InputEvent::pointer_move(c.x, c.y))), vec!["hoveronNode"]);
    let events = g.enable_box_select().unwrap();
    assert_eq!(names(&events), vec!["hoveroffNode"]);
    assert_eq!(g.cursor(), Cursor::Crosshair);

    empty_box_gesture(&mut g);
    assert_eq!(g.cursor(), Cursor::Auto);

    // Hover tracking starts over, so the node is entered again.
    assert_eq!(names(&send(&mut g, InputEvent::pointer_move(c.x, c.y))), vec!["hoveronNode"]);
}

#[test]
fn arming_box_select_mid_press_drops_the_press() {
    let mut g = graph();
    g.add_nodes(vec![NodeSpec::new("gp_a").at(Vec3::ZERO)]).unwrap();
    let c = client(&g, Vec3::ZERO);

    send(&mut g, InputEvent::pointer_move(c.x, c.y));
    assert!(send(&mut g, InputEvent::pointer_down(c.x, c.y)).is_empty());
    let events = g.enable_box_select().unwrap();
    assert_eq!(names(&events), vec!["hoveroffNode"]);

    // The release of the dropped press belongs to nobody.
    assert!(send(&mut g, InputEvent::pointer_up(c.x, c.y)).is_empty());
    empty_box_gesture(&mut g);

    // No button is held: moving away must not start a drag.
    let later = names(&send(&mut g, InputEvent::pointer_move(c.x + 40.0, c.y + 40.0)));
    assert!(later.iter().all(|name| name.starts_with("hover")), "{later:?}");
    let later = names(&send(&mut g, InputEvent::pointer_up(c.x + 40.0, c.y + 40.0)));
    assert!(later.is_empty(), "{later:?}");
    assert_eq!(g.node_data(n("gp_a")).unwrap().position, Vec3::ZERO);
}

#[test]
fn cancelled_pointer_ends_box_and_drag() {
    let mut g = graph();
    g.add_nodes(vec![NodeSpec::new("gc_a").at(Vec3::ZERO)]).unwrap();
    let c = client(&g, Vec3::ZERO);

    assert!(g.enable_box_select().is_some());
    send(&mut g, InputEvent::pointer_down(5.0, 5.0));
    send(&mut g, InputEvent::pointer_move(60.0, 60.0));
    assert!(g.selection_rect().is_some());
    assert!(send(&mut g, InputEvent::pointer_cancel(60.0, 60.0)).is_empty());
    assert_eq!(g.selection_rect(), None);
    assert_eq!(g.cursor(), Cursor::Auto);

    send(&mut g, InputEvent::pointer_down(c.x, c.y));
    send(&mut g, InputEvent::pointer_move(c.x + 30.0, c.y));
    let events = send(&mut g, InputEvent::pointer_cancel(c.x + 30.0, c.y));
    assert_eq!(names(&events), vec!["dragEnd", "nodesPositionChanged"]);
    assert_eq!(g.cursor(), Cursor::Auto);

    // Nothing follows the pointer once the gesture is cancelled.
    let moved = g.node_data(n("gc_a")).unwrap().position;
    let later = names(&send(&mut g, InputEvent::pointer_move(c.x + 60.0, c.y)));
    assert!(later.iter().all(|name| name.starts_with("hover")), "{later:?}");
    assert_eq!(g.node_data(n("gc_a")).unwrap().position, moved);
    assert!(g.enable_box_select().is_some());
}

// ─── End to end ──────────────────────────────────────────────────────────

#[test]
fn move_then_pick_in_rect() {
    let mut g = graph();
    g.add_nodes(vec![
        NodeSpec::new("ee_a").at(Vec3::ZERO),
        NodeSpec::new("ee_b").at(Vec3::new(10.0, 0.0, 0.0)),
    ])
    .unwrap();
    g.add_edges(vec![EdgeSpec::new("ee_e1", "ee_a", "ee_b")], EdgeVariant::Straight)
        .unwrap();

    g.update_nodes_position(vec![NodePosition {
        id: n("ee_a"),
        position: Vec3::new(0.0, 5.0, 0.0),
    }])
    .unwrap();

    let edge = g.registry().edge(e("ee_e1")).unwrap();
    let start = edge.geometry.line_points()[0];
    assert!(
        (start.distance(Vec3::new(0.0, 5.0, 0.0)) - 3.0).abs() < 1e-4,
        "edge start sits 3 units from the moved node: {start}"
    );

    let b = client(&g, Vec3::new(10.0, 0.0, 0.0));
    let rect = Rect::new(b.x - 8.0, b.y - 8.0, b.x + 8.0, b.y + 8.0);
    assert_eq!(g.pick_in_rect(rect), vec![PickableEntity::Node(n("ee_b"))]);
}

#[test]
fn picking_is_deterministic() {
    let mut g = graph();
    g.add_nodes(vec![
        NodeSpec::new("gt_a").at(Vec3::ZERO),
        NodeSpec::new("gt_b").at(Vec3::new(0.0, 0.0, 20.0)),
    ])
    .unwrap();
    let c = client(&g, Vec3::ZERO);

    let first: Vec<PickableEntity> = g.pick_at(c.x, c.y).iter().map(|h| h.entity).collect();
    let again: Vec<PickableEntity> = g.pick_at(c.x, c.y).iter().map(|h| h.entity).collect();
    assert_eq!(first, again);
    assert_eq!(first.first(), Some(&PickableEntity::Node(n("gt_b"))));
}

#[test]
fn zero_area_canvas_picks_nothing() {
    let mut g = graph();
    g.add_nodes(vec![NodeSpec::new("gz_a").at(Vec3::ZERO)]).unwrap();
    g.set_canvas_bounds(CanvasBounds::new(0.0, 0.0, 0.0, 0.0));
    assert!(g.pick_at(0.0, 0.0).is_empty());
    assert!(send(&mut g, InputEvent::pointer_move(0.0, 0.0)).is_empty());
    assert_eq!(
        names(&send(&mut g, InputEvent::click(0.0, 0.0))),
        vec!["clickStage"]
    );
}
