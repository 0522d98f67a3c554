pub mod graph;
pub mod plan;

use std::path::Path;

use anyhow::Context;
use strata_core::DepGraph;
use strata_core::codec;
use strata_core::fs::OsFileSystem;

/// Load the persisted graph at `path`.
pub fn load_graph(path: &Path) -> anyhow::Result<DepGraph> {
    codec::load(&OsFileSystem, path)
        .with_context(|| format!("failed to load dependency graph from {}", path.display()))
}
