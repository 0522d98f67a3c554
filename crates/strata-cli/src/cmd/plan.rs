//! `strata plan` — build phases for the persisted graph.

use std::io::Write;
use std::path::Path;

use anyhow::Context;
use serde::Serialize;
use strata_core::BuildPlan;

use crate::output::{OutputMode, render};

#[derive(Debug, Serialize)]
struct PlanOutput {
    num_phases: usize,
    phases: Vec<Vec<String>>,
}

impl PlanOutput {
    fn from_plan(plan: &BuildPlan) -> Self {
        Self {
            num_phases: plan.num_phases(),
            phases: plan
                .iter()
                .map(|(_, nodes)| nodes.iter().map(ToString::to_string).collect())
                .collect(),
        }
    }
}

/// Execute `strata plan`.
pub fn run_plan(graph_path: &Path, output: OutputMode) -> anyhow::Result<()> {
    let graph = super::load_graph(graph_path)?;
    let plan = BuildPlan::compile(&graph).context("failed to compile build plan")?;
    render(output, &PlanOutput::from_plan(&plan), render_plan_human)
}

fn render_plan_human(payload: &PlanOutput, w: &mut dyn Write) -> std::io::Result<()> {
    if payload.phases.is_empty() {
        writeln!(w, "No packages to build.")?;
        return Ok(());
    }

    for (index, phase) in payload.phases.iter().enumerate() {
        let noun = if phase.len() == 1 { "package" } else { "packages" };
        writeln!(w, "Phase {index} ({} {noun}):", phase.len())?;
        for node in phase {
            writeln!(w, "  {node}")?;
        }
    }
    Ok(())
}
