//! CLI error types.
//!
//! Only errors surfaced here terminate the run with a failure status.
//! Resource and record failures are handled inside the run loop and never
//! reach this type.

use thiserror::Error;

use crate::artifact::ArtifactError;
use crate::config::ConfigError;

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

/// Errors that abort the run.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration could not be loaded or is invalid.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The reference timezone is not in the zone table.
    #[error("timezone error: {0}")]
    Zone(#[from] busyfeed_core::ZoneError),

    /// The output artifact could not be written.
    #[error("artifact error: {0}")]
    Artifact(#[from] ArtifactError),

    /// Tracing initialization failed.
    #[error("tracing error: {0}")]
    Tracing(#[from] busyfeed_core::TracingError),
}
