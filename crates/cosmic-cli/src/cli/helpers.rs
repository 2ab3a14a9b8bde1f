use super::CliError;
use anyhow::Context;
use cosmic_core::common::config::{SweepConfig, load_sweep_config};
use cosmic_core::domain::{CosmicError, ModelParameters};
use cosmic_core::modules::serialization::OutputFormat;
use cosmic_core::modules::{GridAxis, GridShape, SweepSummary};
use serde::Serialize;
use std::fs;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use tracing_subscriber::{EnvFilter, Registry, layer::SubscriberExt, util::SubscriberInitExt};

const OUTPUT_STEM: &str = "results";

/// Installs the stderr subscriber; `RUST_LOG` overrides the `-v` count.
pub(super) fn init_tracing(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_ansi(std::io::stderr().is_terminal());

    // An already installed global subscriber stays in place.
    let _ = Registry::default().with(filter).with(fmt_layer).try_init();
}

pub(super) fn load_config_layer(path: Option<&Path>) -> Result<SweepConfig, CliError> {
    match path {
        Some(path) => load_sweep_config(path).map_err(CliError::compute),
        None => Ok(SweepConfig::default()),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum OutputDestination {
    Stdout,
    File(PathBuf),
}

impl OutputDestination {
    pub(super) fn path(&self) -> Option<&Path> {
        match self {
            Self::Stdout => None,
            Self::File(path) => Some(path),
        }
    }
}

pub(super) fn resolve_output_destination(
    output: Option<&Path>,
    output_dir: Option<&Path>,
    format: OutputFormat,
) -> Result<OutputDestination, CliError> {
    if let Some(path) = output {
        return Ok(OutputDestination::File(path.to_path_buf()));
    }
    let Some(directory) = output_dir else {
        return Ok(OutputDestination::Stdout);
    };

    fs::create_dir_all(directory).map_err(|source| {
        CliError::Compute(CosmicError::io_system(
            "IO.OUTPUT_DIRECTORY",
            format!(
                "failed to create output directory '{}': {}",
                directory.display(),
                source
            ),
        ))
    })?;
    Ok(OutputDestination::File(unique_output_path(
        directory,
        OUTPUT_STEM,
        format.extension(),
    )))
}

/// First of `<stem>.<ext>`, `<stem>_1.<ext>`, `<stem>_2.<ext>`, ... that does not exist yet.
pub(super) fn unique_output_path(directory: &Path, stem: &str, extension: &str) -> PathBuf {
    let candidate = directory.join(format!("{stem}.{extension}"));
    if !candidate.exists() {
        return candidate;
    }

    (1_u64..)
        .map(|suffix| directory.join(format!("{stem}_{suffix}.{extension}")))
        .find(|candidate| !candidate.exists())
        .unwrap_or(candidate)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct RunReport {
    pub(super) parameters: ModelParameters,
    pub(super) omega: GridAxis,
    pub(super) r: GridAxis,
    pub(super) shape: GridShape,
    pub(super) format: OutputFormat,
    pub(super) output: Option<String>,
    pub(super) summary: SweepSummary,
}

pub(super) fn write_run_report(path: &Path, report: &RunReport) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(report).map_err(|source| {
        CliError::Compute(CosmicError::internal(
            "INTERNAL.REPORT",
            format!("failed to serialize run report: {source}"),
        ))
    })?;
    fs::write(path, format!("{rendered}\n"))
        .with_context(|| format!("failed to write run report '{}'", path.display()))?;
    Ok(())
}
