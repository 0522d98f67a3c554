use proptest::prelude::*;
use std::collections::BTreeSet;

use strata_core::codec;
use strata_core::graph::DepGraph;
use strata_core::node::{Node, Project};
use strata_core::plan::BuildPlan;

fn node(i: usize) -> Node {
    Node::new(format!("pkg{i}"), format!("proj{}", i % 3))
}

/// Random DAG: an edge i -> j is only kept when i > j, so no cycles.
fn arb_dag() -> impl Strategy<Value = DepGraph> {
    (1usize..24).prop_flat_map(|size| {
        prop::collection::vec((0..size, 0..size), 0..(size * 3)).prop_map(move |pairs| {
            DepGraph::from_parts(
                (0..size).map(node),
                pairs
                    .into_iter()
                    .filter(|(a, b)| a > b)
                    .map(|(a, b)| (node(a), node(b))),
            )
        })
    })
}

/// Random resolution trace: a top-level project, then a sequence of
/// (center, sub-project) extensions.
fn arb_extended() -> impl Strategy<Value = DepGraph> {
    let names = prop::collection::vec("[a-e]", 0..4);
    let step = ("[a-e]", "[a-e]", prop::collection::vec("[a-e]", 0..4));
    (names, prop::collection::vec(step, 0..12)).prop_map(|(top, steps)| {
        steps.into_iter().fold(
            DepGraph::from_project(&Project::new("top", top)),
            |g, (package, project, deps)| {
                let center = Node::new(package.clone(), project);
                g.extend(&center, &[Project::new(package, deps)])
            },
        )
    })
}

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(256))]

    #[test]
    fn dependencies_precede_dependents(g in arb_dag()) {
        let plan = BuildPlan::compile(&g).expect("dag");
        for (a, b) in g.edges() {
            let pa = plan.phase_of(a).expect("a scheduled");
            let pb = plan.phase_of(b).expect("b scheduled");
            prop_assert!(pb < pa, "{b} (phase {pb}) must precede {a} (phase {pa})");
        }
        prop_assert!(plan.check_ordering(&g).is_ok());
    }

    #[test]
    fn every_vertex_in_exactly_one_phase(g in arb_dag()) {
        let plan = BuildPlan::compile(&g).expect("dag");
        prop_assert_eq!(plan.node_count(), g.node_count());
        let mut seen = BTreeSet::new();
        for (_, nodes) in plan.iter() {
            for n in nodes {
                prop_assert!(seen.insert(n.clone()), "{} scheduled twice", n);
            }
        }
    }

    #[test]
    fn phases_are_contiguous(g in arb_dag()) {
        let plan = BuildPlan::compile(&g).expect("dag");
        let indices: Vec<usize> = plan.iter().map(|(i, _)| i).collect();
        let expected: Vec<usize> = (0..plan.num_phases()).collect();
        prop_assert_eq!(indices, expected);
    }

    #[test]
    fn leaves_are_phase_zero(g in arb_dag()) {
        let plan = BuildPlan::compile(&g).expect("dag");
        for leaf in g.leaf_nodes() {
            prop_assert_eq!(plan.phase_of(&leaf), Some(0));
        }
    }

    #[test]
    fn compile_is_deterministic(g in arb_dag()) {
        prop_assert_eq!(BuildPlan::compile(&g), BuildPlan::compile(&g));
    }

    #[test]
    fn persisted_round_trip_is_exact(g in arb_dag()) {
        let restored = codec::from_persisted(codec::to_persisted(&g));
        prop_assert_eq!(&restored, &g);
        let decoded = codec::decode(&codec::encode(&g).expect("encode")).expect("decode");
        prop_assert_eq!(decoded, g);
    }

    #[test]
    fn extended_graphs_have_no_dangling_edges(g in arb_extended()) {
        for (from, to) in g.edges() {
            prop_assert!(g.contains_vertex(from));
            prop_assert!(g.contains_vertex(to));
        }
        let simplified = g.simplify();
        prop_assert_eq!(simplified.edge_count(), g.edge_count());
    }
}
