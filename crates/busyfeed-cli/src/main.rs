//! busyfeed CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use tracing::warn;

use busyfeed_core::{OutputCalendar, QueryWindow, TracingConfig, init_tracing};
use busyfeed_providers::{CalendarSelector, ErrorSource, SourceError};
use busyfeed_providers::caldav::CalDavSource;

use busyfeed_cli::artifact::write_artifact;
use busyfeed_cli::cli::Cli;
use busyfeed_cli::config::Config;
use busyfeed_cli::error::CliResult;
use busyfeed_cli::run::{ResourceUnit, RunContext, execute};
use busyfeed_cli::upload::upload_artifact;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let tracing_config = if cli.debug {
        TracingConfig::debug()
    } else {
        TracingConfig::default()
    };
    if let Err(e) = init_tracing(tracing_config) {
        eprintln!("error: {}", e);
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> CliResult<()> {
    let config = if let Some(ref path) = cli.config {
        Config::load_from(path)?
    } else {
        Config::load()?
    };

    let zone = config.output.reference_zone()?;
    let window = QueryWindow::resolve(config.output.start_hours, config.output.end_hours);
    let ctx = RunContext::new(window, zone, config.output.summary.clone());

    let units = build_units(&config);
    let (busy, _report) = execute(&ctx, &units).await;

    let calendar = OutputCalendar::new(busy, zone);
    let path = write_artifact(
        &config.output.directory,
        &config.output.filename,
        &calendar.to_bytes(),
    )?;

    if let Some(ref upload) = config.upload {
        if cli.no_upload {
            warn!("Upload configured but skipped (--no-upload)");
        } else if let Err(e) = upload_artifact(upload, &path) {
            // The artifact exists locally; a failed upload is not fatal.
            warn!(error = %e, "Upload failed");
        }
    }

    Ok(())
}

/// Turns the configured resources into processable units.
///
/// A resource whose configuration cannot even produce a client becomes an
/// always-failing unit, so it is counted and logged like any other skipped
/// resource.
fn build_units(config: &Config) -> Vec<ResourceUnit> {
    config
        .resources
        .iter()
        .map(|resource| {
            let selector = match resource.selector() {
                Ok(selector) => selector,
                Err(message) => {
                    return ResourceUnit::new(
                        CalendarSelector::All,
                        Box::new(ErrorSource::new(
                            resource.url.clone(),
                            SourceError::configuration(message),
                        )),
                    );
                }
            };

            let source = resource
                .to_source_config()
                .map_err(SourceError::configuration)
                .and_then(CalDavSource::new);

            match source {
                Ok(source) => ResourceUnit::new(selector, Box::new(source)),
                Err(e) => ResourceUnit::new(
                    selector,
                    Box::new(ErrorSource::new(resource.url.clone(), e)),
                ),
            }
        })
        .collect()
}
