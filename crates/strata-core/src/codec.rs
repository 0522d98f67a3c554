//! Persisted graph format.
//!
//! The graph is stored as a JSON document with two required fields:
//!
//! ```json
//! {
//!   "vertices": [{ "package": "base", "project": "http" }],
//!   "edges": [
//!     { "source": { "package": "http", "project": "app" },
//!       "target": { "package": "base", "project": "http" } }
//!   ]
//! }
//! ```
//!
//! Vertices and edges are written sorted so the same graph always produces
//! the same bytes. Decoding is strict about the shape: a missing field is a
//! [`CodecError::Parse`], never a silently empty default. Unknown extra
//! fields are ignored.

use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::ErrorCode;
use crate::fs::FileSystem;
use crate::graph::DepGraph;
use crate::node::Node;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors returned by graph encoding, decoding, and persistence.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The document is not a well-formed persisted graph.
    #[error("graph parse error: {0}")]
    Parse(String),

    /// Reading or writing the graph file failed.
    #[error("graph file {op} failed for {}: {source}", .path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        source: io::Error,
    },

    /// The graph could not be serialized.
    #[error("graph encode error: {0}")]
    Encode(String),
}

impl CodecError {
    /// Stable machine-readable code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Parse(_) => ErrorCode::GraphParse,
            Self::Io { .. } => ErrorCode::FileSystem,
            Self::Encode(_) => ErrorCode::InternalUnexpected,
        }
    }

    /// `true` if this is a read of a file that does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Io { source, .. } if source.kind() == io::ErrorKind::NotFound)
    }
}

// ---------------------------------------------------------------------------
// Persisted representation
// ---------------------------------------------------------------------------

/// Structural snapshot of a [`DepGraph`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedGraph {
    pub vertices: Vec<Node>,
    pub edges: Vec<PersistedEdge>,
}

/// One directed edge: `source` depends on `target`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PersistedEdge {
    pub source: Node,
    pub target: Node,
}

/// Snapshot `graph` with vertices and edges in sorted order.
///
/// Parallel edges are written once.
#[must_use]
pub fn to_persisted(graph: &DepGraph) -> PersistedGraph {
    let mut vertices: Vec<Node> = graph.vertices().cloned().collect();
    vertices.sort_unstable();

    let mut edges: Vec<PersistedEdge> = graph
        .edges()
        .map(|(source, target)| PersistedEdge {
            source: source.clone(),
            target: target.clone(),
        })
        .collect();
    edges.sort_unstable();
    edges.dedup();

    PersistedGraph { vertices, edges }
}

/// Rebuild a graph by declaring every persisted vertex and edge.
#[must_use]
pub fn from_persisted(persisted: PersistedGraph) -> DepGraph {
    DepGraph::from_parts(
        persisted.vertices,
        persisted.edges.into_iter().map(|e| (e.source, e.target)),
    )
}

/// Serialize `graph` to pretty-printed JSON bytes.
///
/// # Errors
///
/// Returns [`CodecError::Encode`] if serialization fails.
pub fn encode(graph: &DepGraph) -> Result<Vec<u8>, CodecError> {
    let mut bytes = serde_json::to_vec_pretty(&to_persisted(graph))
        .map_err(|e| CodecError::Encode(e.to_string()))?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Parse JSON bytes into a graph.
///
/// # Errors
///
/// Returns [`CodecError::Parse`] with serde's diagnostic (including line and
/// column) if the bytes are not a valid persisted graph.
pub fn decode(bytes: &[u8]) -> Result<DepGraph, CodecError> {
    let persisted: PersistedGraph =
        serde_json::from_slice(bytes).map_err(|e| CodecError::Parse(e.to_string()))?;
    Ok(from_persisted(persisted))
}

/// Write `graph` to `path` through `fs`.
///
/// # Errors
///
/// - [`CodecError::Io`] if the write fails.
/// - [`CodecError::Encode`] if serialization fails.
#[instrument(skip(fs, graph), fields(path = %path.display()))]
pub fn save<F: FileSystem + ?Sized>(
    fs: &F,
    path: &Path,
    graph: &DepGraph,
) -> Result<(), CodecError> {
    let bytes = encode(graph)?;
    fs.write_bytes(path, &bytes).map_err(|source| CodecError::Io {
        op: "write",
        path: path.to_path_buf(),
        source,
    })?;
    debug!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        hash = %graph.content_hash(),
        "graph saved"
    );
    Ok(())
}

/// Read and decode the graph stored at `path` through `fs`.
///
/// # Errors
///
/// - [`CodecError::Io`] if the read fails.
/// - [`CodecError::Parse`] if the content is malformed; the diagnostic is
///   prefixed with the path.
#[instrument(skip(fs), fields(path = %path.display()))]
pub fn load<F: FileSystem + ?Sized>(fs: &F, path: &Path) -> Result<DepGraph, CodecError> {
    let bytes = fs.read_bytes(path).map_err(|source| CodecError::Io {
        op: "read",
        path: path.to_path_buf(),
        source,
    })?;
    let graph = decode(&bytes).map_err(|e| match e {
        CodecError::Parse(msg) => CodecError::Parse(format!("{}: {msg}", path.display())),
        other => other,
    })?;
    debug!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "graph loaded"
    );
    Ok(graph)
}
