//! Configuration management for athena-fetch.
//!
//! Handles loading client configuration from TOML files and environment
//! variables. Everything is instance-scoped; nothing is read at first use.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AthenaError, Result};
use crate::location::OutputLocation;
use crate::service::SubmitOptions;

/// Environment variable supplying the default output location.
pub const OUTPUT_LOCATION_ENV: &str = "ATHENA_OUTPUT_LOCATION";

/// Older name for [`OUTPUT_LOCATION_ENV`], read when that one is unset.
pub const LEGACY_OUTPUT_LOCATION_ENV: &str = "PYTHENA_OUTPUTLOCATION";

/// Environment variable supplying the default region.
pub const REGION_ENV: &str = "ATHENA_REGION";

/// Client configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ClientConfig {
    /// Where results are written: `s3://bucket/prefix/`, `bucket/prefix` or `bucket`.
    pub output_location: Option<String>,

    /// AWS region. When unset the ambient AWS configuration decides.
    pub region: Option<String>,

    /// Status polling behaviour.
    #[serde(default)]
    pub poll: PollConfig,

    /// Submission options applied to every query.
    #[serde(default)]
    pub submit: SubmitOptions,
}

/// Status polling configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollConfig {
    /// Delay between status checks, in milliseconds.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Give up after this many milliseconds. Unset waits forever.
    pub timeout_ms: Option<u64>,

    /// Ask the service to stop the query when a wait times out or is aborted.
    #[serde(default = "default_cancel_remote")]
    pub cancel_remote_on_abort: bool,
}

fn default_interval_ms() -> u64 {
    1000
}

fn default_cancel_remote() -> bool {
    true
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            timeout_ms: None,
            cancel_remote_on_abort: default_cancel_remote(),
        }
    }
}

impl PollConfig {
    /// Returns the delay between status checks.
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Returns the wait deadline, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

impl ClientConfig {
    /// Creates an empty configuration with default polling.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a configuration from environment variables only.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_defaults();
        config
    }

    /// Sets the output location.
    pub fn with_output_location(mut self, location: impl Into<String>) -> Self {
        self.output_location = Some(location.into());
        self
    }

    /// Sets the region.
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Sets the delay between status checks.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll.interval_ms = interval.as_millis() as u64;
        self
    }

    /// Sets the wait deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.poll.timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    /// Sets the submission options.
    pub fn with_submit_options(mut self, options: SubmitOptions) -> Self {
        self.submit = options;
        self
    }

    /// Returns the default config file path for the current platform.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("athena-fetch")
            .join("config.toml")
    }

    /// Loads configuration from a TOML file. A missing file yields defaults.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| AthenaError::config(format!("Failed to read config file: {e}")))?;

        Self::parse_toml(&content, path)
    }

    /// Parses configuration from a TOML string.
    fn parse_toml(content: &str, path: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|e| {
            AthenaError::config(format!(
                "Configuration error in {}:\n  {}",
                path.display(),
                e
            ))
        })
    }

    /// Applies `ATHENA_OUTPUT_LOCATION` (or `PYTHENA_OUTPUTLOCATION`) and
    /// `ATHENA_REGION` where unset.
    pub fn apply_env_defaults(&mut self) {
        self.apply_defaults_from(|name| std::env::var(name).ok());
    }

    fn apply_defaults_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if self.output_location.is_none() {
            self.output_location = [OUTPUT_LOCATION_ENV, LEGACY_OUTPUT_LOCATION_ENV]
                .into_iter()
                .find_map(|name| lookup(name).filter(|v| !v.trim().is_empty()));
        }
        if self.region.is_none() {
            self.region = lookup(REGION_ENV).filter(|v| !v.trim().is_empty());
        }
    }

    /// Returns the parsed output location.
    ///
    /// Fails with a configuration error when none was given, so queries are
    /// never submitted without a destination.
    pub fn resolve_output_location(&self) -> Result<OutputLocation> {
        let raw = self.output_location.as_deref().ok_or_else(|| {
            AthenaError::config(format!(
                "No output location configured. Pass one explicitly or set {OUTPUT_LOCATION_ENV}"
            ))
        })?;
        OutputLocation::parse(raw)
    }
}
