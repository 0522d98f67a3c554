//! Level analysis: the depth of every node above the leaves.
//!
//! # Definitions
//!
//! | Term    | Definition |
//! |---------|------------|
//! | leaf    | Node with no outgoing (dependency) edges. |
//! | depth   | Longest edge-hop count from any leaf up to the node. |
//!
//! # Algorithm
//!
//! 1. Reject cycles with an SCC pre-pass ([`find_all_cycles`]).
//! 2. Transpose the graph so edges point from a dependency to its
//!    dependents.
//! 3. From every leaf, walk the transposed graph depth-first starting at
//!    depth 0; each step adds 1. Every visit is recorded into one
//!    [`DepthMap`], which keeps the **maximum** depth per node.
//! 4. A branch is only descended when it raises the recorded depth of the
//!    node it enters. Anything it would record below that node is already
//!    dominated by the earlier, deeper visit.
//!
//! The maximum matters: a node must sit above its *furthest* dependency
//! chain, otherwise it would be scheduled before one of its dependencies.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use petgraph::graph::NodeIndex;
use tracing::{debug, trace};

use super::cycles::find_all_cycles;
use super::store::DepGraph;
use crate::node::Node;

// ---------------------------------------------------------------------------
// DepthMap
// ---------------------------------------------------------------------------

/// Node → maximum depth observed across every traversal that reached it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DepthMap {
    depths: BTreeMap<Node, usize>,
}

impl DepthMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `depth` for `node`, keeping the larger of the old and new
    /// values. Returns `true` if the stored depth was raised or created.
    pub fn record(&mut self, node: &Node, depth: usize) -> bool {
        match self.depths.get_mut(node) {
            Some(existing) if *existing >= depth => false,
            Some(existing) => {
                *existing = depth;
                true
            }
            None => {
                self.depths.insert(node.clone(), depth);
                true
            }
        }
    }

    /// Fold `other` into `self` by per-node maximum.
    pub fn merge(&mut self, other: &Self) {
        for (node, &depth) in &other.depths {
            self.record(node, depth);
        }
    }

    #[must_use]
    pub fn get(&self, node: &Node) -> Option<usize> {
        self.depths.get(node).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.depths.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.depths.is_empty()
    }

    /// Iterate in node order.
    pub fn iter(&self) -> impl Iterator<Item = (&Node, usize)> {
        self.depths.iter().map(|(node, &depth)| (node, depth))
    }
}

// ---------------------------------------------------------------------------
// CycleError
// ---------------------------------------------------------------------------

/// The graph contains at least one dependency cycle and cannot be levelled.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub struct CycleError {
    /// Sorted members of each strongly connected component that forms a
    /// cycle (self-loops appear as one-element entries).
    pub cycles: Vec<Vec<Node>>,
}

impl fmt::Display for CycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cyclic dependency")?;
        for (i, members) in self.cycles.iter().enumerate() {
            let joined = members
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            let sep = if i == 0 { ": " } else { "; " };
            write!(f, "{sep}[{joined}]")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Analysis
// ---------------------------------------------------------------------------

/// Compute the depth of every node reachable from a leaf of `graph`.
///
/// # Errors
///
/// Returns [`CycleError`] if `graph` contains a cycle.
pub fn compute_depths(graph: &DepGraph) -> Result<DepthMap, CycleError> {
    depths_from(graph, &graph.leaf_nodes())
}

/// Compute depths seeded from an explicit set of leaves.
///
/// Seeds that are not vertices of `graph` are ignored. Nodes unreachable
/// from every seed are absent from the result.
///
/// # Errors
///
/// Returns [`CycleError`] if `graph` contains a cycle.
pub fn depths_from(graph: &DepGraph, leaves: &BTreeSet<Node>) -> Result<DepthMap, CycleError> {
    let cycles = find_all_cycles(graph);
    if !cycles.is_empty() {
        return Err(CycleError { cycles });
    }

    let transposed = graph.transpose();
    let upward = transposed.inner();
    let mut best: HashMap<NodeIndex, usize> = HashMap::with_capacity(graph.node_count());

    for leaf in leaves {
        let Some(start) = transposed.index_of(leaf) else {
            trace!(%leaf, "seed is not a vertex; skipping");
            continue;
        };

        let mut stack: Vec<(NodeIndex, usize)> = vec![(start, 0)];
        while let Some((idx, depth)) = stack.pop() {
            if best.get(&idx).is_some_and(|&seen| seen >= depth) {
                continue;
            }
            best.insert(idx, depth);
            stack.extend(upward.neighbors(idx).map(|next| (next, depth + 1)));
        }
    }

    let mut depths = DepthMap::new();
    for (idx, depth) in best {
        depths.record(&upward[idx], depth);
    }

    debug!(
        seeds = leaves.len(),
        levelled = depths.len(),
        nodes = graph.node_count(),
        "level analysis complete"
    );
    Ok(depths)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n(name: &str) -> Node {
        Node::new(name, "p")
    }

    fn graph(vertices: &[&str], edges: &[(&str, &str)]) -> DepGraph {
        DepGraph::from_parts(
            vertices.iter().map(|v| n(v)),
            edges.iter().map(|(a, b)| (n(a), n(b))),
        )
    }

    #[test]
    fn record_keeps_maximum() {
        let mut depths = DepthMap::new();
        assert!(depths.record(&n("a"), 1));
        assert!(depths.record(&n("a"), 3));
        assert!(!depths.record(&n("a"), 2));
        assert_eq!(depths.get(&n("a")), Some(3));
    }

    #[test]
    fn merge_is_per_node_maximum() {
        let mut left = DepthMap::new();
        left.record(&n("a"), 2);
        left.record(&n("b"), 0);
        let mut right = DepthMap::new();
        right.record(&n("a"), 1);
        right.record(&n("c"), 4);

        left.merge(&right);
        assert_eq!(left.get(&n("a")), Some(2));
        assert_eq!(left.get(&n("b")), Some(0));
        assert_eq!(left.get(&n("c")), Some(4));
    }

    #[test]
    fn chain_depths_increase_towards_root() {
        let g = graph(&[], &[("a", "b"), ("b", "c")]);
        let depths = compute_depths(&g).expect("acyclic");
        assert_eq!(depths.get(&n("c")), Some(0));
        assert_eq!(depths.get(&n("b")), Some(1));
        assert_eq!(depths.get(&n("a")), Some(2));
    }

    #[test]
    fn longest_chain_wins_over_shortcut() {
        // a depends on d directly and through b -> c -> d.
        let g = graph(&[], &[("a", "b"), ("b", "c"), ("c", "d"), ("a", "d")]);
        let depths = compute_depths(&g).expect("acyclic");
        assert_eq!(depths.get(&n("a")), Some(3));
    }

    #[test]
    fn deeper_leaf_dominates_shallow_leaf() {
        // a has a one-hop leaf `x` and a two-hop chain to leaf `c`.
        let g = graph(&[], &[("a", "x"), ("a", "b"), ("b", "c")]);
        let depths = compute_depths(&g).expect("acyclic");
        assert_eq!(depths.get(&n("x")), Some(0));
        assert_eq!(depths.get(&n("a")), Some(2));
    }

    #[test]
    fn isolated_vertex_has_depth_zero() {
        let g = graph(&["solo"], &[]);
        let depths = compute_depths(&g).expect("acyclic");
        assert_eq!(depths.get(&n("solo")), Some(0));
        assert_eq!(depths.len(), 1);
    }

    #[test]
    fn unseeded_nodes_are_absent() {
        let g = graph(&[], &[("a", "b"), ("c", "d")]);
        let depths = depths_from(&g, &BTreeSet::from([n("b")])).expect("acyclic");
        assert_eq!(depths.get(&n("a")), Some(1));
        assert_eq!(depths.get(&n("c")), None);
        assert_eq!(depths.get(&n("d")), None);
    }

    #[test]
    fn cycle_is_rejected_before_traversal() {
        let g = graph(&[], &[("a", "b"), ("b", "a"), ("b", "c")]);
        let err = compute_depths(&g).expect_err("cycle must be rejected");
        assert_eq!(err.cycles, vec![vec![n("a"), n("b")]]);
        assert_eq!(err.to_string(), "cyclic dependency: [a@p, b@p]");
    }
}
