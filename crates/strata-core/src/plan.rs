//! Build phases derived from the frozen dependency graph.
//!
//! A [`BuildPlan`] groups nodes by depth: phase `n` holds every node whose
//! longest dependency chain down to a leaf is `n` edges long. Every
//! dependency of a node therefore lives in a strictly earlier phase, and
//! all nodes inside one phase can be built concurrently once the earlier
//! phases have finished.
//!
//! Phase numbers are contiguous from 0 because depths are produced by
//! successive increments during traversal.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Serialize;
use tracing::{info, instrument};

use crate::error::ErrorCode;
use crate::graph::{CycleError, DepGraph, DepthMap, depths_from};
use crate::node::Node;

/// Errors produced while compiling or checking a [`BuildPlan`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlanError {
    /// The graph contains a dependency cycle.
    #[error(transparent)]
    Cycle(#[from] CycleError),

    /// Graph vertices that no leaf-rooted traversal reached.
    #[error(
        "incomplete build plan: {} node(s) missing from every phase: {}",
        .missing.len(),
        join_nodes(.missing)
    )]
    Incomplete { missing: Vec<Node> },

    /// An edge whose dependency is not scheduled strictly earlier.
    #[error(
        "phase order violated: {dependent} (phase {dependent_phase}) depends on {dependency} (phase {dependency_phase})"
    )]
    OutOfOrder {
        dependent: Node,
        dependent_phase: usize,
        dependency: Node,
        dependency_phase: usize,
    },
}

impl PlanError {
    /// Stable machine-readable code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Cycle(_) => ErrorCode::CyclicDependency,
            Self::Incomplete { .. } => ErrorCode::IncompletePlan,
            Self::OutOfOrder { .. } => ErrorCode::PhaseOrderViolation,
        }
    }
}

fn join_nodes(nodes: &[Node]) -> String {
    nodes
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

// ---------------------------------------------------------------------------
// BuildPlan
// ---------------------------------------------------------------------------

/// Ordered build phases plus the phase count.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildPlan {
    phases: BTreeMap<usize, BTreeSet<Node>>,
    num_phases: usize,
}

impl BuildPlan {
    /// Compile the build plan for `graph`.
    ///
    /// # Errors
    ///
    /// - [`PlanError::Cycle`] if the graph has a dependency cycle.
    /// - [`PlanError::Incomplete`] if a vertex ends up in no phase.
    #[instrument(skip(graph), fields(nodes = graph.node_count(), edges = graph.edge_count()))]
    pub fn compile(graph: &DepGraph) -> Result<Self, PlanError> {
        let leaves = graph.leaf_nodes();
        let depths = depths_from(graph, &leaves)?;
        let plan = Self::from_depths(&depths);
        plan.ensure_covers(graph)?;

        info!(
            phases = plan.num_phases,
            leaves = leaves.len(),
            "build plan compiled"
        );
        Ok(plan)
    }

    /// Bucket nodes by depth; the phase number is the depth value.
    #[must_use]
    pub fn from_depths(depths: &DepthMap) -> Self {
        let mut phases: BTreeMap<usize, BTreeSet<Node>> = BTreeMap::new();
        for (node, depth) in depths.iter() {
            phases.entry(depth).or_default().insert(node.clone());
        }
        let num_phases = phases.len();
        Self { phases, num_phases }
    }

    /// Fail unless every vertex of `graph` is scheduled in some phase.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::Incomplete`] listing the unscheduled vertices.
    pub fn ensure_covers(&self, graph: &DepGraph) -> Result<(), PlanError> {
        let scheduled: BTreeSet<&Node> = self.phases.values().flatten().collect();
        let mut missing: Vec<Node> = graph
            .vertices()
            .filter(|node| !scheduled.contains(node))
            .cloned()
            .collect();
        if missing.is_empty() {
            return Ok(());
        }
        missing.sort_unstable();
        Err(PlanError::Incomplete { missing })
    }

    /// Verify that every edge of `graph` points to a strictly earlier
    /// phase.
    ///
    /// # Errors
    ///
    /// - [`PlanError::Incomplete`] if an edge endpoint is unscheduled.
    /// - [`PlanError::OutOfOrder`] for the first offending edge.
    pub fn check_ordering(&self, graph: &DepGraph) -> Result<(), PlanError> {
        self.ensure_covers(graph)?;

        let phase_index: HashMap<&Node, usize> = self
            .iter()
            .flat_map(|(phase, nodes)| nodes.iter().map(move |node| (node, phase)))
            .collect();

        let mut edges: Vec<(&Node, &Node)> = graph.edges().collect();
        edges.sort_unstable();
        for (dependent, dependency) in edges {
            let (Some(&dependent_phase), Some(&dependency_phase)) =
                (phase_index.get(dependent), phase_index.get(dependency))
            else {
                continue;
            };
            if dependency_phase >= dependent_phase {
                return Err(PlanError::OutOfOrder {
                    dependent: dependent.clone(),
                    dependent_phase,
                    dependency: dependency.clone(),
                    dependency_phase,
                });
            }
        }
        Ok(())
    }

    /// Number of distinct phases.
    #[must_use]
    pub const fn num_phases(&self) -> usize {
        self.num_phases
    }

    /// Nodes scheduled in phase `index`.
    #[must_use]
    pub fn phase(&self, index: usize) -> Option<&BTreeSet<Node>> {
        self.phases.get(&index)
    }

    /// The phase `node` is scheduled in.
    #[must_use]
    pub fn phase_of(&self, node: &Node) -> Option<usize> {
        self.iter()
            .find_map(|(phase, nodes)| nodes.contains(node).then_some(phase))
    }

    /// Iterate phases in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &BTreeSet<Node>)> {
        self.phases.iter().map(|(&phase, nodes)| (phase, nodes))
    }

    /// Number of phases; same as [`Self::num_phases`].
    #[must_use]
    pub const fn len(&self) -> usize {
        self.num_phases
    }

    /// Total number of scheduled nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.phases.values().map(BTreeSet::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }
}
