//! Dependency graph construction and level analysis.
//!
//! # Overview
//!
//! This module holds the petgraph-backed [`DepGraph`] value that grows as
//! package dependencies are resolved, plus the analyses that run over the
//! frozen graph before planning.
//!
//! ## Pipeline
//!
//! ```text
//! Project (top level)
//!        ↓  store::DepGraph::from_project()
//! DepGraph (vertices only)
//!        ↓  store::DepGraph::extend()   (once per resolved package)
//! DepGraph (fixed point)
//!        ↓  cycles::find_all_cycles()  (reject)
//!        ↓  levels::compute_depths()
//! DepthMap (node → max depth above leaves)
//!        ↓  crate::plan::BuildPlan::compile()
//! BuildPlan
//! ```
//!
//! ## Typical Usage
//!
//! ```rust
//! use strata_core::graph::{DepGraph, compute_depths};
//! use strata_core::node::{Node, Project};
//!
//! let app = Project::new("app", ["http"]);
//! let graph = DepGraph::from_project(&app)
//!     .extend(&Node::new("http", "app"), &[Project::new("http", ["base"])]);
//!
//! let depths = compute_depths(&graph).expect("acyclic");
//! assert_eq!(depths.get(&Node::new("base", "http")), Some(0));
//! assert_eq!(depths.get(&Node::new("http", "app")), Some(1));
//! ```

pub mod cycles;
pub mod levels;
pub mod store;

pub use cycles::{find_all_cycles, would_create_cycle};
pub use levels::{CycleError, DepthMap, compute_depths, depths_from};
pub use store::DepGraph;
