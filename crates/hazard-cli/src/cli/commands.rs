use super::CliError;
use super::helpers::{load_calculation, write_lines};
use hazard_core::export::{ExportFormat, export_classical};
use hazard_core::gsim::GsimRegistry;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub(super) enum OutputFormat {
    Csv,
    Json,
}

impl From<OutputFormat> for ExportFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Csv => ExportFormat::Csv,
            OutputFormat::Json => ExportFormat::Json,
        }
    }
}

#[derive(clap::Args)]
pub(super) struct ClassicalArgs {
    /// Job configuration file (JSON)
    #[arg(long)]
    job: PathBuf,

    /// Directory the hazard outputs are written to
    #[arg(long, default_value = "output")]
    output_dir: PathBuf,

    /// Export format
    #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
    format: OutputFormat,
}

#[derive(clap::Args)]
pub(super) struct ValidateArgs {
    /// Job configuration file (JSON)
    #[arg(long)]
    job: PathBuf,
}

pub(super) fn run_classical_command(args: ClassicalArgs) -> Result<i32, CliError> {
    let registry = GsimRegistry::builtin();
    let calculation = load_calculation(&args.job, &registry)?;
    let output = calculation.run()?;
    let written = export_classical(
        &output,
        calculation.sites(),
        &args.output_dir,
        args.format.into(),
    )?;
    info!(
        job = %args.job.display(),
        num_realizations = output.realizations.len(),
        "classical calculation finished"
    );
    write_lines(
        written
            .iter()
            .map(|path| format!("wrote {}", path.display())),
    )?;
    Ok(0)
}

pub(super) fn run_validate_command(args: ValidateArgs) -> Result<i32, CliError> {
    let registry = GsimRegistry::builtin();
    let calculation = load_calculation(&args.job, &registry)?;
    let trts = calculation.tectonic_region_types();
    write_lines([format!(
        "job '{}' is valid: {} sites, {} source groups, {} tectonic region types, {} intensity levels",
        args.job.display(),
        calculation.sites().len(),
        calculation.groups().len(),
        trts.len(),
        calculation.imtls().num_levels()
    )])?;
    Ok(0)
}

pub(super) fn run_gsims_command() -> Result<i32, CliError> {
    let registry = GsimRegistry::builtin();
    write_lines(registry.names().map(str::to_string))?;
    Ok(0)
}
