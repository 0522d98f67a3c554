//! Cycle detection for dependency graphs.
//!
//! # Edge Direction
//!
//! Edges run `dependent → dependency`. Adding `from → to` closes a cycle
//! when `from` is already reachable from `to`.
//!
//! Level analysis cannot order a cycle, so [`find_all_cycles`] runs as a
//! pre-pass before any traversal. [`would_create_cycle`] lets resolution
//! warn at the moment a declared dependency closes a loop.

use petgraph::algo::{astar, tarjan_scc};

use super::store::DepGraph;
use crate::node::Node;

/// Find all cycles currently present in `graph`.
///
/// Each entry is the sorted member list of one strongly connected
/// component. Self-loops are reported as a one-element cycle. The outer
/// list is sorted.
#[must_use]
pub fn find_all_cycles(graph: &DepGraph) -> Vec<Vec<Node>> {
    let inner = graph.inner();
    let mut cycles: Vec<Vec<Node>> = tarjan_scc(inner)
        .into_iter()
        .filter(|component| {
            component.len() > 1
                || component
                    .first()
                    .is_some_and(|&idx| inner.find_edge(idx, idx).is_some())
        })
        .map(|component| {
            let mut members: Vec<Node> =
                component.into_iter().map(|idx| inner[idx].clone()).collect();
            members.sort_unstable();
            members
        })
        .collect();

    cycles.sort_unstable();
    cycles
}

/// Check whether adding `from → to` would introduce a cycle.
///
/// Returns the cycle path `from → to → … → from` when it would. Returns
/// `None` when either endpoint is absent or the edge already exists.
#[must_use]
pub fn would_create_cycle(graph: &DepGraph, from: &Node, to: &Node) -> Option<Vec<Node>> {
    if from == to {
        return Some(vec![from.clone(), from.clone()]);
    }

    let (Some(from_idx), Some(to_idx)) = (graph.index_of(from), graph.index_of(to)) else {
        return None;
    };
    let inner = graph.inner();
    if inner.contains_edge(from_idx, to_idx) {
        return None;
    }

    // Shortest dependency chain leading from `to` back to `from`.
    let (_, chain) = astar(inner, to_idx, |idx| idx == from_idx, |_| 1usize, |_| 0)?;
    Some(
        std::iter::once(from_idx)
            .chain(chain)
            .map(|idx| inner[idx].clone())
            .collect(),
    )
}
