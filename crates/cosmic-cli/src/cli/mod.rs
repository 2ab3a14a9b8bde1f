mod commands;
mod helpers;

use clap::Parser;
use cosmic_core::domain::CosmicError;

pub fn run_from_env() -> i32 {
    let args: Vec<String> = std::env::args().collect();

    match parse_and_dispatch(args) {
        Ok(code) => code,
        Err(error) => {
            let diagnostic = error.as_cosmic_error();
            eprintln!("{}", diagnostic.diagnostic_line());
            eprintln!("{}", diagnostic.fatal_exit_line());
            diagnostic.exit_code()
        }
    }
}

fn parse_and_dispatch(args: Vec<String>) -> Result<i32, CliError> {
    match Cli::try_parse_from(&args) {
        Ok(cli) => {
            helpers::init_tracing(cli.verbose);
            dispatch_parsed(cli.command)
        }
        Err(err) => match err.kind() {
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                print!("{}", err);
                Ok(0)
            }
            _ => Err(CliError::Usage(err.to_string())),
        },
    }
}

#[derive(Parser)]
#[command(
    name = "cosmic-strings",
    version,
    about = "Classical vs. quantum transition probabilities for superposed cosmic strings"
)]
struct Cli {
    /// Raise log verbosity on stderr (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(clap::Subcommand)]
enum CliCommand {
    /// Sweep the (Omega, r) grid and write one record per cell
    Sweep(commands::SweepArgs),
    /// Evaluate a single (Omega, r) cell and print every intermediate response
    Point(commands::PointArgs),
}

fn dispatch_parsed(command: CliCommand) -> Result<i32, CliError> {
    match command {
        CliCommand::Sweep(args) => commands::run_sweep_command(args),
        CliCommand::Point(args) => commands::run_point_command(args),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("{0}")]
    Compute(CosmicError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl CliError {
    fn compute(error: impl Into<CosmicError>) -> Self {
        Self::Compute(error.into())
    }

    fn as_cosmic_error(&self) -> CosmicError {
        match self {
            Self::Usage(message) => {
                CosmicError::input_validation("INPUT.CLI_USAGE", message.trim_end().to_string())
            }
            Self::Compute(error) => error.clone(),
            Self::Internal(error) => CosmicError::io_system("IO.CLI", format!("{error:#}")),
        }
    }
}
