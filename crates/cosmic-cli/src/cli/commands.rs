use super::CliError;
use super::helpers::{
    OutputDestination, RunReport, load_config_layer, resolve_output_destination, write_run_report,
};
use anyhow::Context;
use cosmic_core::common::config::{AxisConfig, SweepConfig};
use cosmic_core::modules::serialization::{OutputFormat, format_scientific_e6, write_records};
use cosmic_core::modules::{SweepDriver, combine_transition_probabilities};
use cosmic_core::numerics::ClosedFormKernel;
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(clap::Args)]
pub(super) struct ModelArgs {
    /// JSON configuration file; command-line values override its entries
    #[arg(long)]
    config: Option<PathBuf>,

    /// Topological charge N of the first string
    #[arg(short = 'n', long, allow_hyphen_values = true)]
    n: Option<i64>,

    /// Topological charge M of the second string
    #[arg(short = 'm', long, allow_hyphen_values = true)]
    m: Option<i64>,

    /// Switching time T (> 0)
    #[arg(short = 't', long, allow_hyphen_values = true)]
    switching_time: Option<f64>,

    /// Coupling constant lambda^4 [default: 1.0]
    #[arg(long, allow_hyphen_values = true)]
    coupling: Option<f64>,
}

impl ModelArgs {
    fn overrides(&self) -> SweepConfig {
        SweepConfig {
            n: self.n,
            m: self.m,
            switching_time: self.switching_time,
            coupling: self.coupling,
            ..SweepConfig::default()
        }
    }

    fn resolve(&self, extra: SweepConfig) -> Result<SweepConfig, CliError> {
        let file = load_config_layer(self.config.as_deref())?;
        let flags = SweepConfig {
            omega: extra.omega,
            r: extra.r,
            format: extra.format,
            ..self.overrides()
        };
        Ok(file.merge(flags))
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
pub(super) enum FormatArg {
    /// Comma separated values with an `Omega,r,PQ,PC` header
    Csv,
    /// One JSON object per line
    Jsonl,
}

impl From<FormatArg> for OutputFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Csv => OutputFormat::Csv,
            FormatArg::Jsonl => OutputFormat::JsonLines,
        }
    }
}

#[derive(clap::Args)]
pub(super) struct SweepArgs {
    #[command(flatten)]
    model: ModelArgs,

    /// First Omega sample [default: 0.1]
    #[arg(long, allow_hyphen_values = true)]
    omega_start: Option<f64>,

    /// Last Omega sample, inclusive [default: 5.0]
    #[arg(long, allow_hyphen_values = true)]
    omega_end: Option<f64>,

    /// Omega increment [default: 0.1]
    #[arg(long)]
    omega_step: Option<f64>,

    /// First r sample [default: 0.1]
    #[arg(long, allow_hyphen_values = true)]
    r_start: Option<f64>,

    /// Last r sample, inclusive [default: 5.0]
    #[arg(long, allow_hyphen_values = true)]
    r_end: Option<f64>,

    /// r increment [default: 0.1]
    #[arg(long)]
    r_step: Option<f64>,

    /// Record format [default: csv]
    #[arg(long, value_enum)]
    format: Option<FormatArg>,

    /// Write records to this file instead of stdout
    #[arg(long, conflicts_with = "output_dir")]
    output: Option<PathBuf>,

    /// Write records to a fresh `results[_k].<ext>` file in this directory
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Write a JSON run report (parameters, grid, failed cell count)
    #[arg(long)]
    report: Option<PathBuf>,
}

impl SweepArgs {
    fn grid_overrides(&self) -> SweepConfig {
        SweepConfig {
            omega: AxisConfig {
                start: self.omega_start,
                end: self.omega_end,
                step: self.omega_step,
            },
            r: AxisConfig {
                start: self.r_start,
                end: self.r_end,
                step: self.r_step,
            },
            format: self.format.map(Into::into),
            ..SweepConfig::default()
        }
    }
}

#[derive(clap::Args)]
pub(super) struct PointArgs {
    #[command(flatten)]
    model: ModelArgs,

    /// Energy gap Omega of the cell
    #[arg(long, allow_hyphen_values = true)]
    omega: f64,

    /// Radial separation r of the cell (non-zero)
    #[arg(short = 'r', long, allow_hyphen_values = true)]
    r: f64,

    /// Print the estimate as a JSON object
    #[arg(long)]
    json: bool,
}

pub(super) fn run_sweep_command(args: SweepArgs) -> Result<i32, CliError> {
    let config = args.model.resolve(args.grid_overrides())?;
    let params = config.model_parameters().map_err(CliError::compute)?;
    let grid = config.grid().map_err(CliError::compute)?;
    let format = config.output_format();

    let driver = SweepDriver::new(params, grid);
    let destination =
        resolve_output_destination(args.output.as_deref(), args.output_dir.as_deref(), format)?;

    let summary = match &destination {
        OutputDestination::File(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create output file '{}'", path.display()))?;
            let mut writer = BufWriter::new(file);
            write_records(format, &mut writer, driver.samples())
                .with_context(|| format!("failed to write records to '{}'", path.display()))?
        }
        OutputDestination::Stdout => {
            let mut writer = BufWriter::new(io::stdout().lock());
            write_records(format, &mut writer, driver.samples())
                .context("failed to write records to stdout")?
        }
    };

    info!(
        cells = summary.cells,
        succeeded = summary.succeeded,
        failed = summary.failed,
        "sweep complete"
    );
    if summary.failed > 0 {
        warn!(
            failed = summary.failed,
            cells = summary.cells,
            "some grid cells failed and were written as error records"
        );
    }

    if let OutputDestination::File(path) = &destination {
        println!("Results written to {}", path.display());
    }

    if let Some(report_path) = args.report.as_deref() {
        let report = RunReport {
            parameters: params,
            omega: *grid.omega(),
            r: *grid.radius(),
            shape: grid.shape(),
            format,
            output: destination.path().map(|path| path.display().to_string()),
            summary,
        };
        write_run_report(report_path, &report)?;
    }

    Ok(0)
}

pub(super) fn run_point_command(args: PointArgs) -> Result<i32, CliError> {
    let config = args.model.resolve(SweepConfig::default())?;
    let params = config.model_parameters().map_err(CliError::compute)?;
    params.warn_unconventional_charges();

    let estimate =
        combine_transition_probabilities(&ClosedFormKernel::default(), &params, args.omega, args.r)
            .map_err(CliError::compute)?;

    if args.json {
        let rendered = serde_json::to_string_pretty(&estimate)
            .context("failed to serialize point estimate")?;
        println!("{rendered}");
        return Ok(0);
    }

    println!("Omega = {:.4}, r = {:.4}", args.omega, args.r);
    for (label, value) in [
        ("P_A", estimate.response_n),
        ("P_B", estimate.response_m),
        ("L_AB", estimate.cross_term),
        ("P_C", estimate.classical),
        ("P_Q", estimate.quantum),
    ] {
        println!("{label:<4} = {}", format_scientific_e6(value));
    }
    Ok(0)
}
