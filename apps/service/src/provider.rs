//! Persisted probe configuration.
//!
//! The file and the HTTP API share one JSON shape:
//!
//! ```json
//! { "host": "8.8.8.8", "cycle_time_milliseconds": 5000, "ping_timeout_milliseconds": 1000 }
//! ```
//!
//! Milliseconds are canonical. Older documents using `cycle_time_seconds`
//! (whole seconds) or `ping_timeout` (milliseconds) are still accepted on
//! input and converted here; output always uses the canonical names.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ConfigError;
use crate::monitoring::types::ProbeConfig;

/// Canonical serialized form of a [`ProbeConfig`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigDocument {
    pub host: String,
    pub cycle_time_milliseconds: u64,
    pub ping_timeout_milliseconds: u64,
}

impl From<&ProbeConfig> for ConfigDocument {
    fn from(config: &ProbeConfig) -> Self {
        Self {
            host: config.host().to_string(),
            cycle_time_milliseconds: config.interval().as_millis() as u64,
            ping_timeout_milliseconds: config.timeout().as_millis() as u64,
        }
    }
}

/// Incoming configuration, as read from the file or a request body.
///
/// Numbers are signed so that negative values are reported against their
/// field instead of as a generic parse error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigPayload {
    pub host: Option<String>,
    pub cycle_time_milliseconds: Option<i64>,
    pub cycle_time_seconds: Option<i64>,
    pub ping_timeout_milliseconds: Option<i64>,
    #[serde(rename = "ping_timeout")]
    pub ping_timeout_legacy: Option<i64>,
}

fn positive(field: &'static str, value: i64) -> Result<u64, ConfigError> {
    if value <= 0 {
        return Err(ConfigError::invalid(field, "must be greater than 0"));
    }
    Ok(value as u64)
}

impl ConfigPayload {
    /// Resolve units and validate into a [`ProbeConfig`]
    pub fn into_config(self) -> Result<ProbeConfig, ConfigError> {
        let host = self.host.ok_or(ConfigError::Missing("host"))?;

        let interval_ms = match (self.cycle_time_milliseconds, self.cycle_time_seconds) {
            (Some(_), Some(_)) => {
                return Err(ConfigError::Ambiguous("cycle_time_milliseconds", "cycle_time_seconds"));
            }
            (Some(ms), None) => positive("cycle_time_milliseconds", ms)?,
            (None, Some(secs)) => positive("cycle_time_seconds", secs)?
                .checked_mul(1000)
                .ok_or_else(|| ConfigError::invalid("cycle_time_seconds", "too large"))?,
            (None, None) => return Err(ConfigError::Missing("cycle_time_milliseconds")),
        };

        let timeout_ms = match (self.ping_timeout_milliseconds, self.ping_timeout_legacy) {
            (Some(_), Some(_)) => {
                return Err(ConfigError::Ambiguous("ping_timeout_milliseconds", "ping_timeout"));
            }
            (Some(ms), None) => positive("ping_timeout_milliseconds", ms)?,
            (None, Some(ms)) => positive("ping_timeout", ms)?,
            (None, None) => return Err(ConfigError::Missing("ping_timeout_milliseconds")),
        };

        ProbeConfig::new(host, Duration::from_millis(interval_ms), Duration::from_millis(timeout_ms))
    }
}

/// JSON file backed configuration provider
pub struct FileConfigProvider {
    path: PathBuf,
}

impl FileConfigProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the configuration, writing the defaults first if the file does
    /// not exist yet.
    pub fn load_or_create(&self) -> Result<ProbeConfig, ConfigError> {
        if !self.path.exists() {
            tracing::info!("Config file {} not found, creating default config", self.path.display());
            let config = ProbeConfig::default();
            self.save(&config)?;
            return Ok(config);
        }

        self.load()
    }

    /// Load and validate the configuration file
    pub fn load(&self) -> Result<ProbeConfig, ConfigError> {
        let raw = fs::read_to_string(&self.path)
            .map_err(|source| ConfigError::Read { path: self.path.clone(), source })?;
        let payload: ConfigPayload = serde_json::from_str(&raw)?;
        let config = payload.into_config()?;

        tracing::info!(
            "Loaded config: host={} cycle_time={} ms ping_timeout={} ms",
            config.host(),
            config.interval().as_millis(),
            config.timeout().as_millis()
        );
        Ok(config)
    }

    /// Write the configuration in canonical form.
    ///
    /// The document goes to a sibling temp file first and is renamed over
    /// the target, so readers never see a partial file.
    pub fn save(&self, config: &ProbeConfig) -> Result<(), ConfigError> {
        let write_err = |source| ConfigError::Write { path: self.path.clone(), source };

        let body = serde_json::to_string_pretty(&ConfigDocument::from(config))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(write_err)?;
            }
        }

        let mut tmp_name = self.path.file_name().unwrap_or_default().to_os_string();
        tmp_name.push(format!(".{}.tmp", Uuid::new_v4().simple()));
        let tmp_path = self.path.with_file_name(tmp_name);

        fs::write(&tmp_path, body).map_err(write_err)?;
        if let Err(e) = fs::rename(&tmp_path, &self.path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(write_err(e));
        }

        Ok(())
    }
}
