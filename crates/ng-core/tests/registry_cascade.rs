//! Integration tests: registry bookkeeping across batches.
//!
//! Exercises cascade deletion, the reverse index, selection replacement and
//! edge geometry refresh through the public `ng-core` API.

use ng_core::glam::Vec3;
use ng_core::*;
use pretty_assertions::assert_eq;
use std::collections::HashSet;

fn n(id: &str) -> NodeId {
    NodeId::intern(id)
}

fn e(id: &str) -> EdgeId {
    EdgeId::intern(id)
}

/// Star around `hub` plus one edge between two leaves.
fn star() -> (EntityRegistry, Scene) {
    let mut reg = EntityRegistry::new(&GraphConfig::default());
    let mut scene = Scene::new();
    reg.add_nodes(
        &mut scene,
        &[
            NodeSpec::new("hub").at(Vec3::ZERO),
            NodeSpec::new("leaf_1").at(Vec3::new(20.0, 0.0, 0.0)),
            NodeSpec::new("leaf_2").at(Vec3::new(0.0, 20.0, 0.0)),
            NodeSpec::new("leaf_3").at(Vec3::new(-20.0, 0.0, 0.0)),
        ],
    )
    .unwrap();
    reg.add_edges(
        &mut scene,
        &[
            EdgeSpec::new("hub_1", "hub", "leaf_1"),
            EdgeSpec::new("hub_2", "leaf_2", "hub"),
            EdgeSpec::new("leaf_12", "leaf_1", "leaf_2"),
        ],
        EdgeVariant::Straight,
    )
    .unwrap();
    reg.add_edges(
        &mut scene,
        &[EdgeSpec::new("hub_3", "hub", "leaf_3")],
        EdgeVariant::Curved,
    )
    .unwrap();
    (reg, scene)
}

// ─── Cascade deletion ────────────────────────────────────────────────────

#[test]
fn deleting_a_node_removes_incident_edges_everywhere() {
    let (mut reg, mut scene) = star();
    assert_eq!(reg.incident_edges(n("hub")).len(), 3);

    let removed: HashSet<EdgeId> = reg
        .delete_nodes(&mut scene, &[n("hub")])
        .unwrap()
        .into_iter()
        .collect();
    assert_eq!(
        removed,
        [e("hub_1"), e("hub_2"), e("hub_3")].into_iter().collect()
    );

    assert!(reg.node(n("hub")).is_none());
    assert!(reg.incident_edges(n("hub")).is_empty());
    assert!(reg.edges().all(|edge| edge.source != n("hub") && edge.target != n("hub")));

    // Surviving leaves only keep the edge between them.
    let leaf_1: Vec<EdgeId> = reg.incident_edges(n("leaf_1")).iter().map(|ie| ie.edge).collect();
    assert_eq!(leaf_1, vec![e("leaf_12")]);
    assert!(reg.incident_edges(n("leaf_3")).is_empty());
}

#[test]
fn unknown_id_in_delete_batch_changes_nothing() {
    let (mut reg, mut scene) = star();
    let primitives = scene.len();
    let err = reg
        .delete_nodes(&mut scene, &[n("leaf_1"), n("nowhere")])
        .unwrap_err();
    assert_eq!(err, GraphError::UnknownNode(n("nowhere")));
    assert_eq!(reg.node_count(), 4);
    assert_eq!(reg.edge_count(), 4);
    assert_eq!(scene.len(), primitives);
}

#[test]
fn deleted_edges_leave_the_scene() {
    let (mut reg, mut scene) = star();
    let before = scene.len();
    let line_and_arrow = reg.primitives_of(reg.edge(e("hub_3")).unwrap().entity()).len();
    assert_eq!(line_and_arrow, 2);

    reg.delete_edges(&mut scene, &[e("hub_3")]).unwrap();
    assert_eq!(scene.len(), before - 2);
}

// ─── Selection ───────────────────────────────────────────────────────────

#[test]
fn selection_replaces_previous_selection() {
    let (mut reg, mut scene) = star();
    reg.select_nodes(&mut scene, &[n("hub"), n("leaf_1")]).unwrap();
    reg.select_nodes(&mut scene, &[n("leaf_2")]).unwrap();
    assert_eq!(reg.selected_node_ids(), vec![n("leaf_2")]);

    reg.select_edges(&mut scene, &[e("hub_1"), e("hub_3")]).unwrap();
    let selected: HashSet<EdgeId> = reg.selected_edge_ids().into_iter().collect();
    assert_eq!(selected, [e("hub_1"), e("hub_3")].into_iter().collect());

    // Edge and node selection are independent.
    assert_eq!(reg.selected_node_ids(), vec![n("leaf_2")]);
}

#[test]
fn selected_edge_keeps_selected_color_after_recolor() {
    let (mut reg, mut scene) = star();
    let red = Color::from_hex("#ff0000").unwrap();
    let green = Color::from_hex("#00ff00").unwrap();

    reg.select_edges(&mut scene, &[e("hub_1")]).unwrap();
    reg.update_edges_color(&mut scene, &[(e("hub_1"), green)]).unwrap();
    let edge = reg.edge(e("hub_1")).unwrap();
    assert_eq!(edge.line_color(), red);

    reg.select_edges(&mut scene, &[]).unwrap();
    assert_eq!(reg.edge(e("hub_1")).unwrap().line_color(), green);
}

// ─── Geometry refresh ────────────────────────────────────────────────────

#[test]
fn moving_the_hub_recomputes_every_incident_edge() {
    let (mut reg, mut scene) = star();
    let untouched = reg.edge(e("leaf_12")).unwrap().geometry.clone();

    reg.set_node_positions(&mut scene, &[(n("hub"), Vec3::new(5.0, 5.0, 0.0))])
        .unwrap();

    for id in ["hub_1", "hub_3"] {
        assert_eq!(reg.edge(e(id)).unwrap().source_pos, Vec3::new(5.0, 5.0, 0.0));
    }
    assert_eq!(reg.edge(e("hub_2")).unwrap().target_pos, Vec3::new(5.0, 5.0, 0.0));
    assert_eq!(reg.edge(e("leaf_12")).unwrap().geometry, untouched);
}

#[test]
fn update_position_is_idempotent() {
    let (reg, _scene) = star();
    let mut edge = reg.edge(e("hub_3")).unwrap().clone();
    let (s, t) = (Vec3::new(1.0, 2.0, 3.0), Vec3::new(-7.0, 4.0, 0.0));
    edge.update_position(s, t, None);
    let once = edge.geometry.clone();
    edge.update_position(s, t, None);
    assert_eq!(edge.geometry, once);
}

#[test]
fn hidden_edges_stay_registered() {
    let (mut reg, mut scene) = star();
    reg.update_edges_visibility(&mut scene, &[e("hub_1")], false).unwrap();
    let entity = reg.edge(e("hub_1")).unwrap().entity();
    assert!(!reg.is_visible(entity));
    for (_, id) in reg.primitives_of(entity) {
        assert!(!scene.get(*id).unwrap().visible);
    }
}
