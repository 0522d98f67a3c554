//! Incremental dependency resolution to a fixed point.
//!
//! # Overview
//!
//! Resolution starts from the top-level project's declared dependencies and
//! repeatedly asks a [`ProjectSource`] for the sub-projects describing one
//! unresolved package. Each answer is folded into the graph with
//! [`DepGraph::extend`]; any dependency not seen before joins the worklist.
//! Resolution ends when the worklist is empty.
//!
//! ## Cache
//!
//! When a cache path is configured, the graph persisted by the previous run
//! is loaded first and every vertex it contains counts as resolved, so only
//! packages new to the project are fetched. A cache that fails to parse is
//! logged and ignored; a cache that does not exist yet is silently ignored.
//! After the fixed point, vertices no longer reachable from the top-level
//! project are dropped and the result is written back.
//!
//! ## Cycles
//!
//! Cycles are not rejected here; they are rejected when a plan is compiled.
//! A dependency that closes a cycle is logged at `warn` level with the loop.

use std::collections::BTreeSet;
use std::error::Error as StdError;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};

use crate::codec::{self, CodecError};
use crate::config::StrataConfig;
use crate::error::ErrorCode;
use crate::fs::FileSystem;
use crate::graph::{DepGraph, would_create_cycle};
use crate::node::{Node, Project};

/// Boxed error returned by a [`ProjectSource`].
pub type SourceError = Box<dyn StdError + Send + Sync + 'static>;

/// Supplies the sub-projects declaring one package's direct dependencies.
///
/// Usually a package resolves to a single project named after the package;
/// an empty list means the package has no dependencies.
pub trait ProjectSource {
    /// Fetch the projects describing `node`'s dependencies.
    ///
    /// # Errors
    ///
    /// Any failure to locate or load the package description.
    fn fetch(&self, node: &Node) -> Result<Vec<Project>, SourceError>;
}

impl<F> ProjectSource for F
where
    F: Fn(&Node) -> Result<Vec<Project>, SourceError>,
{
    fn fetch(&self, node: &Node) -> Result<Vec<Project>, SourceError> {
        self(node)
    }
}

/// Errors that abort resolution.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("failed to fetch dependencies of {node}: {source}")]
    Fetch { node: Node, source: SourceError },

    #[error("resolution exceeded the limit of {limit} nodes ({found} discovered)")]
    TooManyNodes { limit: usize, found: usize },

    #[error(transparent)]
    Cache(#[from] CodecError),
}

impl ResolveError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Fetch { .. } => ErrorCode::SourceFetchFailed,
            Self::TooManyNodes { .. } => ErrorCode::ResolutionLimit,
            Self::Cache(e) => e.code(),
        }
    }
}

/// Outcome of a completed resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// The frozen graph.
    pub graph: DepGraph,
    /// Packages fetched from the source during this run.
    pub fetched: usize,
    /// Vertices taken from the cache without fetching that remain in
    /// the final graph.
    pub cached: usize,
}

/// Drives resolution for one top-level project.
pub struct Resolver<'a, S> {
    source: S,
    cache: Option<(&'a dyn FileSystem, PathBuf)>,
    max_nodes: usize,
}

impl<'a, S: ProjectSource> Resolver<'a, S> {
    /// A resolver without a cache and with the default node limit.
    #[must_use]
    pub fn new(source: S) -> Self {
        Self {
            source,
            cache: None,
            max_nodes: StrataConfig::default().resolve.max_nodes,
        }
    }

    /// A resolver configured from `config`; the cache lives under
    /// `project_root` when enabled.
    #[must_use]
    pub fn from_config(
        source: S,
        fs: &'a dyn FileSystem,
        config: &StrataConfig,
        project_root: &Path,
    ) -> Self {
        let resolver = Self::new(source).max_nodes(config.resolve.max_nodes);
        if config.cache.enabled {
            resolver.with_cache(fs, config.cache_path(project_root))
        } else {
            resolver
        }
    }

    /// Read and write the persisted graph at `path` through `fs`.
    #[must_use]
    pub fn with_cache(mut self, fs: &'a dyn FileSystem, path: impl Into<PathBuf>) -> Self {
        self.cache = Some((fs, path.into()));
        self
    }

    /// Abort once the graph holds more than `limit` vertices.
    #[must_use]
    pub const fn max_nodes(mut self, limit: usize) -> Self {
        self.max_nodes = limit;
        self
    }

    /// Resolve `top` to a fixed point.
    ///
    /// # Errors
    ///
    /// - [`ResolveError::Fetch`] if the source fails for any package.
    /// - [`ResolveError::TooManyNodes`] if the node limit is exceeded.
    /// - [`ResolveError::Cache`] if the cache cannot be read (other than
    ///   not existing or failing to parse) or cannot be written.
    #[instrument(skip_all, fields(project = %top.name))]
    pub fn resolve(&self, top: &Project) -> Result<Resolution, ResolveError> {
        let roots: BTreeSet<Node> = top.dependency_nodes().collect();
        let mut graph = DepGraph::from_project(top);
        let mut from_cache: BTreeSet<Node> = BTreeSet::new();

        if let Some(cached) = self.load_cache()? {
            from_cache.extend(cached.vertices().cloned());
            graph = graph.overlay(&cached).simplify();
        }
        self.check_limit(&graph)?;
        let mut resolved = from_cache.clone();

        let mut pending: BTreeSet<Node> = graph
            .vertices()
            .filter(|node| !resolved.contains(*node))
            .cloned()
            .collect();
        let mut fetched = 0usize;

        while let Some(node) = pending.pop_first() {
            let sub_projects = self
                .source
                .fetch(&node)
                .map_err(|source| ResolveError::Fetch {
                    node: node.clone(),
                    source,
                })?;
            fetched += 1;

            for dep in sub_projects.iter().flat_map(Project::dependency_nodes) {
                if let Some(path) = would_create_cycle(&graph, &node, &dep) {
                    let loop_text = path
                        .iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                        .join(" -> ");
                    warn!(package = %node, cycle = %loop_text, "dependency closes a cycle");
                }
                if !resolved.contains(&dep) && dep != node {
                    pending.insert(dep);
                }
            }

            graph = graph.extend(&node, &sub_projects);
            debug!(package = %node, deps = graph.dependencies_of(&node).len(), "resolved");
            resolved.insert(node);
            self.check_limit(&graph)?;
        }

        let before = graph.node_count();
        let graph = graph.reachable_from(&roots);
        if graph.node_count() < before {
            debug!(
                dropped = before - graph.node_count(),
                "dropped packages no longer reachable from the project"
            );
        }

        let cached = from_cache
            .iter()
            .filter(|node| graph.contains_vertex(node))
            .count();

        if let Some((fs, path)) = &self.cache {
            codec::save(*fs, path, &graph)?;
        }

        info!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            fetched,
            cached,
            "resolution complete"
        );
        Ok(Resolution {
            graph,
            fetched,
            cached,
        })
    }

    fn check_limit(&self, graph: &DepGraph) -> Result<(), ResolveError> {
        if graph.node_count() > self.max_nodes {
            return Err(ResolveError::TooManyNodes {
                limit: self.max_nodes,
                found: graph.node_count(),
            });
        }
        Ok(())
    }

    fn load_cache(&self) -> Result<Option<DepGraph>, ResolveError> {
        let Some((fs, path)) = &self.cache else {
            return Ok(None);
        };
        match codec::load(*fs, path) {
            Ok(graph) => Ok(Some(graph)),
            Err(e) if e.is_not_found() => {
                debug!(path = %path.display(), "no graph cache yet");
                Ok(None)
            }
            Err(CodecError::Parse(msg)) => {
                warn!(
                    code = %ErrorCode::GraphParse,
                    error = %msg,
                    "ignoring unreadable graph cache; resolving from scratch"
                );
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}
