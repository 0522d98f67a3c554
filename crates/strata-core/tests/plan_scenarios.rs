//! End-to-end planning scenarios through the public API.

use std::collections::BTreeSet;

use strata_core::codec::{self, CodecError};
use strata_core::fs::{FileSystem, OsFileSystem};
use strata_core::graph::DepGraph;
use strata_core::node::{Node, Project};
use strata_core::plan::{BuildPlan, PlanError};

fn n(name: &str) -> Node {
    Node::new(name, "p")
}

fn set(names: &[&str]) -> BTreeSet<Node> {
    names.iter().map(|name| n(name)).collect()
}

fn graph(vertices: &[&str], edges: &[(&str, &str)]) -> DepGraph {
    DepGraph::from_parts(
        vertices.iter().map(|v| n(v)),
        edges.iter().map(|(a, b)| (n(a), n(b))),
    )
}

#[test]
fn chain_plans_three_phases() {
    let plan = BuildPlan::compile(&graph(&["a", "b", "c"], &[("a", "b"), ("b", "c")]))
        .expect("plan");

    assert_eq!(plan.num_phases(), 3);
    let phases: Vec<(usize, BTreeSet<Node>)> =
        plan.iter().map(|(i, nodes)| (i, nodes.clone())).collect();
    assert_eq!(
        phases,
        vec![(0, set(&["c"])), (1, set(&["b"])), (2, set(&["a"]))]
    );
}

#[test]
fn fan_out_plans_two_phases() {
    let plan = BuildPlan::compile(&graph(&["a", "b", "c"], &[("a", "b"), ("a", "c")]))
        .expect("plan");

    assert_eq!(plan.num_phases(), 2);
    assert_eq!(plan.phase(0), Some(&set(&["b", "c"])));
    assert_eq!(plan.phase(1), Some(&set(&["a"])));
}

#[test]
fn diamond_schedules_root_last() {
    let g = graph(&[], &[("a", "b"), ("a", "c"), ("b", "d"), ("c", "d")]);
    let plan = BuildPlan::compile(&g).expect("plan");

    assert_eq!(plan.phase_of(&n("d")), Some(0));
    assert_eq!(plan.phase_of(&n("b")), Some(1));
    assert_eq!(plan.phase_of(&n("c")), Some(1));
    assert_eq!(plan.phase_of(&n("a")), Some(2));
    plan.check_ordering(&g).expect("ordered");
}

#[test]
fn isolated_vertex_is_built_first() {
    let g = graph(&["lonely"], &[("a", "b")]);
    let plan = BuildPlan::compile(&g).expect("plan");

    assert_eq!(plan.phase(0), Some(&set(&["b", "lonely"])));
    assert_eq!(plan.phase(1), Some(&set(&["a"])));
}

#[test]
fn uneven_branches_follow_the_longest() {
    // a -> b -> c -> d and a -> e (leaf); a must wait for d's chain.
    let g = graph(&[], &[("a", "b"), ("b", "c"), ("c", "d"), ("a", "e")]);
    let plan = BuildPlan::compile(&g).expect("plan");

    assert_eq!(plan.phase(0), Some(&set(&["d", "e"])));
    assert_eq!(plan.phase_of(&n("a")), Some(3));
    assert_eq!(plan.num_phases(), 4);
}

#[test]
fn three_node_cycle_is_rejected() {
    let g = graph(&["ok"], &[("a", "b"), ("b", "c"), ("c", "a")]);
    match BuildPlan::compile(&g) {
        Err(PlanError::Cycle(err)) => {
            assert_eq!(err.cycles, vec![vec![n("a"), n("b"), n("c")]]);
        }
        other => panic!("expected cycle error, got {other:?}"),
    }
}

#[test]
fn namespaced_packages_plan_independently() {
    let app = Project::new("app", ["http", "tls"]);
    let g = DepGraph::from_project(&app)
        .extend(&Node::new("http", "app"), &[Project::new("http", ["tls"])])
        .extend(&Node::new("tls", "http"), &[Project::new("tls", ["crypto"])]);

    let plan = BuildPlan::compile(&g).expect("plan");
    // tls@app has no resolved deps; tls@http sits above crypto@tls.
    assert_eq!(plan.phase_of(&Node::new("tls", "app")), Some(0));
    assert_eq!(plan.phase_of(&Node::new("crypto", "tls")), Some(0));
    assert_eq!(plan.phase_of(&Node::new("tls", "http")), Some(1));
    assert_eq!(plan.phase_of(&Node::new("http", "app")), Some(2));
}

#[test]
fn persisted_graph_round_trips_through_disk() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join(".strata/graph.json");
    let g = graph(&["solo"], &[("a", "b"), ("b", "c"), ("a", "c")]);

    codec::save(&OsFileSystem, &path, &g).expect("save");
    let loaded = codec::load(&OsFileSystem, &path).expect("load");

    assert_eq!(loaded, g);
    assert_eq!(
        BuildPlan::compile(&loaded).expect("plan"),
        BuildPlan::compile(&g).expect("plan")
    );
}

#[test]
fn document_without_edges_is_a_parse_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("graph.json");
    OsFileSystem
        .write_bytes(
            &path,
            br#"{"vertices": [{"package": "a", "project": "p"}]}"#,
        )
        .expect("write");

    let err = codec::load(&OsFileSystem, &path).expect_err("edges missing");
    assert!(matches!(err, CodecError::Parse(_)), "got {err:?}");
}
