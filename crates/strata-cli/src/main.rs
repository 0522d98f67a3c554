#![forbid(unsafe_code)]

mod cmd;
mod output;

use clap::{Parser, Subcommand};
use output::{CliError, OutputMode, render_error};
use std::env;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "strata: phased build planning over package dependency graphs",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Persisted graph to read (overrides config and STRATA_GRAPH).
    #[arg(long, global = true, value_name = "PATH")]
    graph: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn output_mode(&self) -> OutputMode {
        if self.json {
            OutputMode::Json
        } else {
            OutputMode::Human
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        about = "Print the build phases for the persisted graph",
        after_help = "EXAMPLES:\n    strata plan\n    strata plan --graph target/graph.json --json"
    )]
    Plan,

    #[command(subcommand, about = "Inspect the persisted dependency graph")]
    Graph(GraphCommand),
}

#[derive(Subcommand, Debug)]
enum GraphCommand {
    /// Show vertex/edge counts, content hash, leaves, and edges.
    Show,
    /// Fail if the graph cannot be planned.
    Check,
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("STRATA_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "strata=debug,info"
        } else {
            "strata=info,warn"
        })
    });

    let format = env::var("STRATA_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

/// Graph path for this invocation: `--graph`, else config plus env.
fn graph_path(flag: Option<&Path>, project_root: &Path) -> anyhow::Result<PathBuf> {
    if let Some(path) = flag {
        return Ok(path.to_path_buf());
    }
    let config = strata_core::config::load_project_config(project_root)?;
    Ok(config.cache_path(project_root))
}

fn run(cli: &Cli, output: OutputMode) -> anyhow::Result<()> {
    let project_root = env::current_dir()?;
    let path = graph_path(cli.graph.as_deref(), &project_root)?;
    debug!(path = %path.display(), "using graph file");

    match cli.command {
        Commands::Plan => cmd::plan::run_plan(&path, output),
        Commands::Graph(GraphCommand::Show) => cmd::graph::run_show(&path, output),
        Commands::Graph(GraphCommand::Check) => cmd::graph::run_check(&path, output),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let output = cli.output_mode();
    match run(&cli, output) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            // Best effort: stderr may already be closed.
            let _ = render_error(output, &CliError::from_anyhow(&err));
            ExitCode::FAILURE
        }
    }
}
