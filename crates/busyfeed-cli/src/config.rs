//! Configuration.
//!
//! All settings live in a single `config.toml` at
//! `~/.config/busyfeed/config.toml` by default:
//!
//! ```toml
//! [output]
//! directory = "/var/www/feeds"
//! filename = "busy.ics"
//! summary = "Busy"
//! start_hours = 0
//! end_hours = 1440
//! timezone = "Europe/Berlin"
//!
//! [[resource]]
//! url = "https://caldav.example.com/calendars/user/"
//! username = "user"
//! password = "secret"
//! calendar_name = "Work"
//!
//! [upload]
//! method = "sftp"
//! host = "feeds.example.com"
//! username = "publisher"
//! private_key = "/home/user/.ssh/id_ed25519"
//! remote_path = "/srv/feeds/busy.ics"
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use busyfeed_core::{ReferenceZone, ZoneError};
use busyfeed_providers::CalendarSelector;
use busyfeed_providers::caldav::CalDavConfig;

/// Errors raised while loading or interpreting the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid TOML.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Output artifact settings.
    pub output: OutputSettings,

    /// Remote resources to aggregate.
    #[serde(rename = "resource")]
    pub resources: Vec<ResourceSettings>,

    /// Optional upload step after the artifact is written.
    pub upload: Option<UploadSettings>,
}

/// Output artifact settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Directory the artifact is written into.
    pub directory: PathBuf,

    /// Artifact file name.
    pub filename: String,

    /// Display label applied to every interval.
    pub summary: String,

    /// Window start, in hours relative to now.
    pub start_hours: i64,

    /// Window end, in hours relative to now.
    pub end_hours: i64,

    /// Reference timezone name; empty or absent means UTC.
    pub timezone: Option<String>,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            filename: "busy.ics".to_string(),
            summary: "Busy".to_string(),
            start_hours: 0,
            end_hours: 1440,
            timezone: None,
        }
    }
}

impl OutputSettings {
    /// Resolves the configured timezone against the zone table.
    pub fn reference_zone(&self) -> Result<ReferenceZone, ZoneError> {
        ReferenceZone::parse(self.timezone.as_deref().unwrap_or(""))
    }

    /// Returns the full artifact path.
    pub fn artifact_path(&self) -> PathBuf {
        self.directory.join(&self.filename)
    }
}

/// One remote resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceSettings {
    /// Base URL of the resource (principal or calendar collection).
    pub url: String,

    /// Username for authentication.
    pub username: Option<String>,

    /// Password for authentication.
    pub password: Option<String>,

    /// Select the calendar with this display name.
    pub calendar_name: Option<String>,

    /// Select the calendar with this address.
    pub calendar_address: Option<String>,

    /// Process every discovered calendar instead of selecting one.
    #[serde(default)]
    pub scan_all: bool,

    /// Whether to verify TLS certificates.
    #[serde(default = "default_verify_tls")]
    pub verify_tls: bool,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_verify_tls() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    CalDavConfig::DEFAULT_TIMEOUT_SECS
}

impl ResourceSettings {
    /// Derives the calendar selector for this resource.
    ///
    /// Exactly one of `calendar_name`, `calendar_address` or `scan_all`
    /// must identify what to query. Setting both explicit fields is
    /// ambiguous and rejected; setting none without `scan_all` leaves the
    /// resource unselectable and is rejected too.
    pub fn selector(&self) -> Result<CalendarSelector, String> {
        match (&self.calendar_name, &self.calendar_address) {
            (Some(_), Some(_)) => Err(format!(
                "resource {}: calendar_name and calendar_address are mutually exclusive",
                self.url
            )),
            (Some(name), None) => Ok(CalendarSelector::ByName(name.clone())),
            (None, Some(address)) => Ok(CalendarSelector::ByAddress(address.clone())),
            (None, None) if self.scan_all => Ok(CalendarSelector::All),
            (None, None) => Err(format!(
                "resource {}: set calendar_name, calendar_address or scan_all",
                self.url
            )),
        }
    }

    /// Builds the CalDAV source configuration.
    pub fn to_source_config(&self) -> Result<CalDavConfig, String> {
        let mut config = CalDavConfig::new(&self.url)
            .map_err(|e| format!("resource {}: invalid url: {}", self.url, e))?
            .with_timeout(Duration::from_secs(self.timeout_secs));

        if let (Some(username), Some(password)) = (&self.username, &self.password) {
            config = config.with_credentials(username, password);
        }

        if !self.verify_tls {
            config = config.with_insecure_tls();
        }

        Ok(config)
    }
}

/// Upload transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadMethod {
    /// Plain FTP. Credentials travel unencrypted.
    Ftp,
    /// SFTP over SSH.
    Sftp,
}

/// Upload settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadSettings {
    /// Transport to use.
    pub method: UploadMethod,

    /// Remote host.
    pub host: String,

    /// Remote port; defaults to 21 for FTP and 22 for SFTP.
    pub port: Option<u16>,

    /// Username for the remote host.
    pub username: Option<String>,

    /// Password for the remote host.
    pub password: Option<String>,

    /// Private key file for SFTP public-key authentication.
    pub private_key: Option<PathBuf>,

    /// Passphrase for the private key.
    pub passphrase: Option<String>,

    /// Full remote path the artifact is uploaded to.
    pub remote_path: String,
}

impl UploadSettings {
    /// Returns the effective port for the configured method.
    pub fn effective_port(&self) -> u16 {
        self.port.unwrap_or(match self.method {
            UploadMethod::Ftp => 21,
            UploadMethod::Sftp => 22,
        })
    }
}

impl Config {
    /// Loads configuration from the default path.
    ///
    /// A missing file yields the defaults; nothing to aggregate, but a valid
    /// run.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &PathBuf) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.clone(),
            source: e,
        })?;
        Ok(toml::from_str(&content)?)
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("busyfeed")
            .join("config.toml")
    }
}
