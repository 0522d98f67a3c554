//! Shared output layer for human/JSON parity across CLI commands.
//!
//! Every command handler receives an [`OutputMode`] and either writes a
//! human-readable report or a stable JSON document to stdout. Errors go to
//! stderr in the same mode.

use serde::Serialize;
use std::io::{self, Write};

use strata_core::ErrorCode;
use strata_core::codec::CodecError;
use strata_core::config::ConfigError;
use strata_core::plan::PlanError;

/// Shared width for human separators.
pub const RULE_WIDTH: usize = 72;

/// Write a section heading followed by a separator.
pub fn section(w: &mut dyn Write, heading: &str) -> io::Result<()> {
    writeln!(w, "{heading}")?;
    writeln!(w, "{:-<width$}", "", width = RULE_WIDTH)
}

/// Render a left-aligned key/value line in human output.
pub fn kv(w: &mut dyn Write, key: &str, value: impl AsRef<str>) -> io::Result<()> {
    writeln!(w, "{:<12} {}", format!("{key}:"), value.as_ref())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
}

/// A user-facing error with its machine-readable code.
#[derive(Debug, Clone, Serialize)]
pub struct CliError {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

impl CliError {
    /// Build from an `anyhow` chain, recovering the library error code
    /// when a graph, plan, or config error is in the chain.
    pub fn from_anyhow(err: &anyhow::Error) -> Self {
        let code = error_code(err);
        Self {
            message: format!("{err:#}"),
            suggestion: code.and_then(ErrorCode::hint).map(str::to_string),
            error_code: code.map(|c| c.code().to_string()),
        }
    }
}

fn error_code(err: &anyhow::Error) -> Option<ErrorCode> {
    err.chain().find_map(|cause| {
        if let Some(e) = cause.downcast_ref::<PlanError>() {
            Some(e.code())
        } else if let Some(e) = cause.downcast_ref::<CodecError>() {
            Some(e.code())
        } else {
            cause.downcast_ref::<ConfigError>().map(ConfigError::code)
        }
    })
}

/// Write `value` to stdout as pretty JSON or through `human_fn`.
pub fn render<T: Serialize>(
    mode: OutputMode,
    value: &T,
    human_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match mode {
        OutputMode::Json => {
            serde_json::to_writer_pretty(&mut out, value)?;
            writeln!(out)?;
        }
        OutputMode::Human => human_fn(value, &mut out)?,
    }
    Ok(())
}

/// Write an error to stderr in the requested format.
pub fn render_error(mode: OutputMode, error: &CliError) -> anyhow::Result<()> {
    let stderr = io::stderr();
    let mut out = stderr.lock();
    match mode {
        OutputMode::Json => {
            let wrapper = serde_json::json!({ "error": error });
            serde_json::to_writer_pretty(&mut out, &wrapper)?;
            writeln!(out)?;
        }
        OutputMode::Human => {
            match &error.error_code {
                Some(code) => writeln!(out, "error[{code}]: {}", error.message)?,
                None => writeln!(out, "error: {}", error.message)?,
            }
            if let Some(suggestion) = &error.suggestion {
                writeln!(out, "  suggestion: {suggestion}")?;
            }
        }
    }
    Ok(())
}
