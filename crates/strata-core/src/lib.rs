#![forbid(unsafe_code)]
//! strata-core library.
//!
//! Dependency graph construction, level analysis, build-phase planning, and
//! graph persistence for multi-package builds.
//!
//! # Conventions
//!
//! - **Errors**: Each module returns its own `thiserror` enum; every error
//!   maps to a stable [`error::ErrorCode`] via `code()`.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).
//! - **Values**: Graphs and plans are immutable once built; every graph
//!   operation returns a new value.
//!
//! # Typical Usage
//!
//! ```rust
//! use strata_core::graph::DepGraph;
//! use strata_core::node::{Node, Project};
//! use strata_core::plan::BuildPlan;
//!
//! let app = Project::new("app", ["http", "json"]);
//! let graph = DepGraph::from_project(&app)
//!     .extend(&Node::new("http", "app"), &[Project::new("http", ["base"])])
//!     .extend(&Node::new("json", "app"), &[Project::new("json", Vec::<String>::new())]);
//!
//! let plan = BuildPlan::compile(&graph).expect("acyclic");
//! assert_eq!(plan.num_phases(), 2);
//! assert_eq!(plan.phase_of(&Node::new("http", "app")), Some(1));
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod fs;
pub mod graph;
pub mod node;
pub mod plan;
pub mod resolve;

pub use codec::CodecError;
pub use error::ErrorCode;
pub use graph::DepGraph;
pub use node::{Node, Project};
pub use plan::{BuildPlan, PlanError};
pub use resolve::{ProjectSource, Resolution, ResolveError, Resolver};
