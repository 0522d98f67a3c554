//! `strata graph show` and `strata graph check`.

use std::io::Write;
use std::path::Path;

use anyhow::Context;
use serde::Serialize;
use strata_core::{BuildPlan, DepGraph};

use crate::output::{OutputMode, kv, render, section};

#[derive(Debug, Serialize)]
struct GraphSummary {
    path: String,
    vertices: usize,
    edges: usize,
    content_hash: String,
    leaves: Vec<String>,
    edge_list: Vec<EdgeEntry>,
}

#[derive(Debug, Serialize)]
struct EdgeEntry {
    source: String,
    target: String,
}

impl GraphSummary {
    fn new(path: &Path, graph: &DepGraph) -> Self {
        let simplified = graph.simplify();
        Self {
            path: path.display().to_string(),
            vertices: simplified.node_count(),
            edges: simplified.edge_count(),
            content_hash: simplified.content_hash(),
            leaves: simplified
                .leaf_nodes()
                .iter()
                .map(ToString::to_string)
                .collect(),
            edge_list: simplified
                .edges()
                .map(|(from, to)| EdgeEntry {
                    source: from.to_string(),
                    target: to.to_string(),
                })
                .collect(),
        }
    }
}

/// Execute `strata graph show`.
pub fn run_show(graph_path: &Path, output: OutputMode) -> anyhow::Result<()> {
    let graph = super::load_graph(graph_path)?;
    render(output, &GraphSummary::new(graph_path, &graph), render_summary_human)
}

fn render_summary_human(summary: &GraphSummary, w: &mut dyn Write) -> std::io::Result<()> {
    section(w, "Dependency graph")?;
    kv(w, "path", &summary.path)?;
    kv(w, "vertices", summary.vertices.to_string())?;
    kv(w, "edges", summary.edges.to_string())?;
    kv(w, "hash", &summary.content_hash)?;

    writeln!(w)?;
    writeln!(w, "Leaves:")?;
    for leaf in &summary.leaves {
        writeln!(w, "  {leaf}")?;
    }

    if !summary.edge_list.is_empty() {
        writeln!(w)?;
        writeln!(w, "Edges:")?;
        for edge in &summary.edge_list {
            writeln!(w, "  {} -> {}", edge.source, edge.target)?;
        }
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct CheckOutput {
    ok: bool,
    vertices: usize,
    num_phases: usize,
}

/// Execute `strata graph check`.
///
/// Fails with the cycle or incompleteness error when no valid plan exists.
pub fn run_check(graph_path: &Path, output: OutputMode) -> anyhow::Result<()> {
    let graph = super::load_graph(graph_path)?;
    let plan = BuildPlan::compile(&graph).context("dependency graph cannot be planned")?;
    plan.check_ordering(&graph)
        .context("dependency graph cannot be planned")?;

    let payload = CheckOutput {
        ok: true,
        vertices: graph.node_count(),
        num_phases: plan.num_phases(),
    };
    render(output, &payload, |p, w| {
        writeln!(
            w,
            "ok: {} package(s) in {} phase(s)",
            p.vertices, p.num_phases
        )
    })
}
