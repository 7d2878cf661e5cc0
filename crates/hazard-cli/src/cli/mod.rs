mod commands;
mod helpers;

use clap::Parser;
use hazard_core::domain::HazardError;

pub fn run_from_env() -> i32 {
    let args: Vec<String> = std::env::args().collect();
    match parse_and_dispatch(args) {
        Ok(code) => code,
        Err(error) => {
            let error = error.as_hazard_error();
            eprintln!("{}", error.diagnostic_line());
            if let Some(summary_line) = error.fatal_exit_line() {
                eprintln!("{}", summary_line);
            }
            error.exit_code()
        }
    }
}

fn parse_and_dispatch(args: Vec<String>) -> Result<i32, CliError> {
    match Cli::try_parse_from(&args) {
        Ok(cli) => {
            helpers::init_logging(cli.verbose);
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
    name = "hazardlib-rs",
    version,
    about = "Classical probabilistic seismic hazard calculator"
)]
struct Cli {
    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(clap::Subcommand)]
enum CliCommand {
    /// Compute hazard curves for a job file and export them
    Classical(commands::ClassicalArgs),
    /// Check a job file without computing anything
    Validate(commands::ValidateArgs),
    /// List the available ground shaking intensity models
    Gsims,
}

fn dispatch_parsed(command: CliCommand) -> Result<i32, CliError> {
    match command {
        CliCommand::Classical(args) => commands::run_classical_command(args),
        CliCommand::Validate(args) => commands::run_validate_command(args),
        CliCommand::Gsims => commands::run_gsims_command(),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("{0}")]
    Compute(HazardError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<HazardError> for CliError {
    fn from(error: HazardError) -> Self {
        Self::Compute(error)
    }
}

impl CliError {
    fn as_hazard_error(&self) -> HazardError {
        match self {
            Self::Usage(message) => {
                HazardError::configuration("CONFIG.CLI_USAGE", message.trim_end().to_string())
            }
            Self::Compute(error) => error.clone(),
            Self::Internal(error) => HazardError::io_system("IO.CLI", format!("{error:#}")),
        }
    }
}
