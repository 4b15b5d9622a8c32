//! Command-line interface definition.

use std::path::PathBuf;

use clap::Parser;

/// busyfeed - Publish a privacy-stripped busy/free calendar feed
#[derive(Debug, Parser)]
#[command(name = "busyfeed")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "BUSYFEED_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v')]
    pub debug: bool,

    /// Skip the upload step even if one is configured
    #[arg(long)]
    pub no_upload: bool,
}
