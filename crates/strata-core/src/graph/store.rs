//! The dependency graph value and its construction primitives.
//!
//! ## Edge Direction
//!
//! An edge `A → B` means "A **depends on** B": B must be built before A.
//! Leaves (no outgoing edges) are the packages that can be built first.
//!
//! ## Value Semantics
//!
//! Every operation takes `&self` and returns a fresh [`DepGraph`]. A graph
//! handed to a phase executor is never mutated behind its back; extending
//! the graph during resolution produces a new value that replaces the old
//! one.
//!
//! ## Parallel Edges
//!
//! [`DepGraph::overlay`] keeps parallel edges so that merging two graphs
//! never loses information; [`DepGraph::simplify`] collapses them and
//! rebuilds the graph in sorted order so node indices are deterministic.

#![allow(clippy::module_name_repetitions)]

use std::collections::{BTreeSet, HashMap};

use petgraph::{
    Direction,
    graph::{DiGraph, NodeIndex},
    visit::{Dfs, EdgeRef},
};

use crate::node::{Node, Project};

// ---------------------------------------------------------------------------
// DepGraph
// ---------------------------------------------------------------------------

/// A directed "must-build-before" graph over [`Node`]s.
///
/// Vertices are unique by node identity. Edges may be parallel until the
/// graph is simplified.
#[derive(Debug, Clone, Default)]
pub struct DepGraph {
    graph: DiGraph<Node, ()>,
    node_map: HashMap<Node, NodeIndex>,
}

impl DepGraph {
    /// An empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A graph holding a single vertex and no edges.
    #[must_use]
    pub fn vertex(node: Node) -> Self {
        let mut g = Self::new();
        g.insert_vertex(node);
        g
    }

    /// Seed a graph from the top-level project: one node per declared
    /// dependency, labeled with the project's own name, and no edges.
    #[must_use]
    pub fn from_project(project: &Project) -> Self {
        let mut g = Self::new();
        for node in project.dependency_nodes() {
            g.insert_vertex(node);
        }
        g
    }

    /// Build from explicit vertex and edge lists.
    ///
    /// Edge endpoints missing from `vertices` are added as vertices.
    #[must_use]
    pub fn from_parts<V, E>(vertices: V, edges: E) -> Self
    where
        V: IntoIterator<Item = Node>,
        E: IntoIterator<Item = (Node, Node)>,
    {
        let mut g = Self::new();
        for node in vertices {
            g.insert_vertex(node);
        }
        for (from, to) in edges {
            let from_idx = g.insert_vertex(from);
            let to_idx = g.insert_vertex(to);
            g.graph.add_edge(from_idx, to_idx, ());
        }
        g
    }

    /// One `center` vertex with an edge to each of `leaves`.
    #[must_use]
    pub fn star<I>(center: &Node, leaves: I) -> Self
    where
        I: IntoIterator<Item = Node>,
    {
        let mut g = Self::vertex(center.clone());
        let center_idx = g.node_map[center];
        for leaf in leaves {
            let leaf_idx = g.insert_vertex(leaf);
            g.graph.add_edge(center_idx, leaf_idx, ());
        }
        g
    }

    /// Union of `self` and `other`.
    ///
    /// Vertices are merged by identity. Every edge of both graphs is kept,
    /// including parallel ones; no new edges are introduced.
    #[must_use]
    pub fn overlay(&self, other: &Self) -> Self {
        let mut g = self.clone();
        for node in other.vertices() {
            g.insert_vertex(node.clone());
        }
        for (from, to) in other.edges() {
            let from_idx = g.node_map[from];
            let to_idx = g.node_map[to];
            g.graph.add_edge(from_idx, to_idx, ());
        }
        g
    }

    /// Collapse parallel edges and rebuild with vertices and edges in
    /// sorted order.
    #[must_use]
    pub fn simplify(&self) -> Self {
        let vertices: BTreeSet<Node> = self.vertices().cloned().collect();
        let edges: BTreeSet<(Node, Node)> = self
            .edges()
            .map(|(from, to)| (from.clone(), to.clone()))
            .collect();
        Self::from_parts(vertices, edges)
    }

    /// The same graph with every edge reversed.
    #[must_use]
    pub fn transpose(&self) -> Self {
        let mut g = self.clone();
        g.graph.reverse();
        g
    }

    /// Connect `center` to the dependencies declared by each of
    /// `sub_projects`, merge into `self`, and simplify.
    ///
    /// Dependency nodes are labeled with the declaring sub-project's name.
    #[must_use]
    pub fn extend(&self, center: &Node, sub_projects: &[Project]) -> Self {
        let resolved = sub_projects
            .iter()
            .map(|p| Self::star(center, p.dependency_nodes()))
            .fold(Self::vertex(center.clone()), |acc, star| acc.overlay(&star));
        self.overlay(&resolved).simplify()
    }

    /// The subgraph of vertices reachable from `roots` along dependency
    /// edges, roots included. Roots that are not vertices are ignored.
    #[must_use]
    pub fn reachable_from(&self, roots: &BTreeSet<Node>) -> Self {
        let mut seen: BTreeSet<NodeIndex> = BTreeSet::new();
        for root in roots {
            let Some(start) = self.index_of(root) else {
                continue;
            };
            let mut dfs = Dfs::new(&self.graph, start);
            while let Some(idx) = dfs.next(&self.graph) {
                seen.insert(idx);
            }
        }

        let edges = self
            .graph
            .edge_references()
            .filter(|e| seen.contains(&e.source()))
            .map(|e| (self.graph[e.source()].clone(), self.graph[e.target()].clone()));
        Self::from_parts(seen.iter().map(|&idx| self.graph[idx].clone()), edges)
    }

    /// Every node with no outgoing edges, isolated vertices included.
    #[must_use]
    pub fn leaf_nodes(&self) -> BTreeSet<Node> {
        self.graph
            .node_indices()
            .filter(|&idx| {
                self.graph
                    .neighbors_directed(idx, Direction::Outgoing)
                    .next()
                    .is_none()
            })
            .map(|idx| self.graph[idx].clone())
            .collect()
    }

    /// Iterate over vertices in index order.
    pub fn vertices(&self) -> impl Iterator<Item = &Node> {
        self.graph.node_weights()
    }

    /// Iterate over edges as `(dependent, dependency)` pairs.
    pub fn edges(&self) -> impl Iterator<Item = (&Node, &Node)> {
        self.graph
            .edge_references()
            .map(|e| (&self.graph[e.source()], &self.graph[e.target()]))
    }

    /// Direct dependencies of `node`, sorted. Empty if `node` is absent.
    #[must_use]
    pub fn dependencies_of(&self, node: &Node) -> Vec<&Node> {
        self.neighbors_sorted(node, Direction::Outgoing)
    }

    /// Direct dependents of `node`, sorted. Empty if `node` is absent.
    #[must_use]
    pub fn dependents_of(&self, node: &Node) -> Vec<&Node> {
        self.neighbors_sorted(node, Direction::Incoming)
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    #[must_use]
    pub fn contains_vertex(&self, node: &Node) -> bool {
        self.node_map.contains_key(node)
    }

    #[must_use]
    pub fn contains_edge(&self, from: &Node, to: &Node) -> bool {
        match (self.node_map.get(from), self.node_map.get(to)) {
            (Some(&a), Some(&b)) => self.graph.contains_edge(a, b),
            _ => false,
        }
    }

    /// BLAKE3 hash of the sorted vertex and edge sets.
    ///
    /// Equal graphs hash equally regardless of construction order or
    /// parallel edges.
    #[must_use]
    pub fn content_hash(&self) -> String {
        let simplified = self.simplify();
        let mut hasher = blake3::Hasher::new();
        for node in simplified.vertices() {
            hash_node(&mut hasher, node);
        }
        hasher.update(b"\x01");
        for (from, to) in simplified.edges() {
            hash_node(&mut hasher, from);
            hash_node(&mut hasher, to);
        }
        format!("blake3:{}", hasher.finalize())
    }

    pub(crate) const fn inner(&self) -> &DiGraph<Node, ()> {
        &self.graph
    }

    pub(crate) fn index_of(&self, node: &Node) -> Option<NodeIndex> {
        self.node_map.get(node).copied()
    }

    fn insert_vertex(&mut self, node: Node) -> NodeIndex {
        if let Some(&idx) = self.node_map.get(&node) {
            return idx;
        }
        let idx = self.graph.add_node(node.clone());
        self.node_map.insert(node, idx);
        idx
    }

    fn neighbors_sorted(&self, node: &Node, dir: Direction) -> Vec<&Node> {
        let Some(idx) = self.index_of(node) else {
            return Vec::new();
        };
        let mut out: Vec<&Node> = self
            .graph
            .neighbors_directed(idx, dir)
            .map(|n| &self.graph[n])
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }
}

impl PartialEq for DepGraph {
    /// Graphs are equal when their vertex and edge sets are equal.
    fn eq(&self, other: &Self) -> bool {
        vertex_set(self) == vertex_set(other) && edge_set(self) == edge_set(other)
    }
}

fn vertex_set(g: &DepGraph) -> BTreeSet<&Node> {
    g.vertices().collect()
}

fn edge_set(g: &DepGraph) -> BTreeSet<(&Node, &Node)> {
    g.edges().collect()
}

impl Eq for DepGraph {}

fn hash_node(hasher: &mut blake3::Hasher, node: &Node) {
    hasher.update(node.package.as_bytes());
    hasher.update(b"\x00");
    hasher.update(node.project.as_bytes());
    hasher.update(b"\x00");
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn n(package: &str, project: &str) -> Node {
        Node::new(package, project)
    }

    #[test]
    fn from_project_creates_vertices_without_edges() {
        let g = DepGraph::from_project(&Project::new("app", ["http", "json"]));
        assert_eq!(g.node_count(), 2);
        assert_eq!(g.edge_count(), 0);
        assert!(g.contains_vertex(&n("http", "app")));
        assert!(g.contains_vertex(&n("json", "app")));
    }

    #[test]
    fn from_project_with_no_dependencies_is_empty() {
        let g = DepGraph::from_project(&Project::new("app", Vec::<String>::new()));
        assert!(g.is_empty());
    }

    #[test]
    fn extend_labels_nodes_with_sub_project_name() {
        let seed = DepGraph::from_project(&Project::new("app", ["http"]));
        let center = n("http", "app");
        let g = seed.extend(&center, &[Project::new("http", ["base", "url"])]);

        assert_eq!(g.node_count(), 3);
        assert!(g.contains_edge(&center, &n("base", "http")));
        assert!(g.contains_edge(&center, &n("url", "http")));
        assert!(!g.contains_vertex(&n("base", "app")));
    }

    #[test]
    fn extend_does_not_mutate_input() {
        let seed = DepGraph::from_project(&Project::new("app", ["http"]));
        let _ = seed.extend(&n("http", "app"), &[Project::new("http", ["base"])]);
        assert_eq!(seed.node_count(), 1);
        assert_eq!(seed.edge_count(), 0);
    }

    #[test]
    fn repeated_extend_is_deduplicated() {
        let center = n("http", "app");
        let sub = [Project::new("http", ["base"])];
        let once = DepGraph::vertex(center.clone()).extend(&center, &sub);
        let twice = once.extend(&center, &sub);

        assert_eq!(twice.node_count(), 2);
        assert_eq!(twice.edge_count(), 1);
        assert_eq!(once, twice);
    }

    #[test]
    fn extend_with_dependency_free_project_keeps_center() {
        let center = n("base", "http");
        let g = DepGraph::new().extend(&center, &[Project::new("base", Vec::<String>::new())]);
        assert_eq!(g.node_count(), 1);
        assert_eq!(g.edge_count(), 0);
        assert!(g.leaf_nodes().contains(&center));
    }

    #[test]
    fn overlay_keeps_parallel_edges_until_simplified() {
        let a = n("a", "p");
        let b = n("b", "p");
        let left = DepGraph::star(&a, [b.clone()]);
        let right = DepGraph::star(&a, [b.clone()]);

        let merged = left.overlay(&right);
        assert_eq!(merged.node_count(), 2);
        assert_eq!(merged.edge_count(), 2);

        let simple = merged.simplify();
        assert_eq!(simple.edge_count(), 1);
        assert!(simple.contains_edge(&a, &b));
    }

    #[test]
    fn transpose_reverses_every_edge() {
        let a = n("a", "p");
        let b = n("b", "p");
        let c = n("c", "p");
        let g = DepGraph::from_parts([], [(a.clone(), b.clone()), (b.clone(), c.clone())]);
        let t = g.transpose();

        assert!(t.contains_edge(&b, &a));
        assert!(t.contains_edge(&c, &b));
        assert!(!t.contains_edge(&a, &b));
        assert_eq!(t.node_count(), 3);
    }

    #[test]
    fn leaf_nodes_include_isolated_vertices() {
        let a = n("a", "p");
        let b = n("b", "p");
        let lonely = n("lonely", "p");
        let g = DepGraph::from_parts([lonely.clone()], [(a, b.clone())]);

        let leaves = g.leaf_nodes();
        assert_eq!(leaves, BTreeSet::from([b, lonely]));
    }

    #[test]
    fn reachable_from_drops_stale_subgraph() {
        let a = n("a", "p");
        let b = n("b", "p");
        let old = n("old", "p");
        let gone = n("gone", "p");
        let g = DepGraph::from_parts([], [(a.clone(), b.clone()), (old.clone(), gone.clone())]);

        let kept = g.reachable_from(&BTreeSet::from([a.clone(), n("missing", "p")]));
        assert_eq!(kept.node_count(), 2);
        assert!(kept.contains_edge(&a, &b));
        assert!(!kept.contains_vertex(&old));
        assert!(!kept.contains_vertex(&gone));
    }

    #[test]
    fn dependencies_and_dependents_are_sorted() {
        let a = n("a", "p");
        let b = n("b", "p");
        let c = n("c", "p");
        let g = DepGraph::from_parts([], [(a.clone(), c.clone()), (a.clone(), b.clone())]);

        assert_eq!(g.dependencies_of(&a), vec![&b, &c]);
        assert_eq!(g.dependents_of(&c), vec![&a]);
        assert!(g.dependencies_of(&n("missing", "p")).is_empty());
    }

    #[test]
    fn content_hash_ignores_construction_order() {
        let a = n("a", "p");
        let b = n("b", "p");
        let c = n("c", "p");
        let g1 = DepGraph::from_parts([], [(a.clone(), b.clone()), (b.clone(), c.clone())]);
        let g2 = DepGraph::from_parts([c.clone()], [(b.clone(), c), (a, b)]);

        assert!(g1.content_hash().starts_with("blake3:"));
        assert_eq!(g1.content_hash(), g2.content_hash());
    }

    #[test]
    fn content_hash_changes_with_edges() {
        let a = n("a", "p");
        let b = n("b", "p");
        let without = DepGraph::from_parts([a.clone(), b.clone()], []);
        let with = DepGraph::from_parts([], [(a, b)]);
        assert_ne!(without.content_hash(), with.content_hash());
    }
}
