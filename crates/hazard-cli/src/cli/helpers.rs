use super::CliError;
use anyhow::Context;
use hazard_core::calc::ClassicalCalculation;
use hazard_core::common::config::load_job_config;
use hazard_core::domain::HazardError;
use hazard_core::gsim::GsimRegistry;
use std::io::Write;
use std::path::Path;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Logs go to stderr so that stdout only carries command output.
pub(super) fn init_logging(verbose: bool) {
    let filter = if verbose { "debug" } else { "info" };
    // a subscriber may already be installed when running in-process
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .try_init();
}

pub(super) fn load_calculation(
    job_path: &Path,
    registry: &GsimRegistry,
) -> Result<ClassicalCalculation, CliError> {
    let config = load_job_config(job_path).map_err(HazardError::from)?;
    info!(
        job = %job_path.display(),
        description = config.description.as_str(),
        "loaded job configuration"
    );
    Ok(config.resolve(registry)?)
}

pub(super) fn write_lines(lines: impl IntoIterator<Item = String>) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    for line in lines {
        writeln!(stdout, "{line}").context("failed to write to stdout")?;
    }
    stdout.flush().context("failed to flush stdout")?;
    Ok(())
}
