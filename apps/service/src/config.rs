use std::{env, fmt, fs, path, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::monitoring::ProbeExecutor;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read {0}: {1}")]
    ReadFailed(path::PathBuf, #[source] std::io::Error),
    #[error("failed to write {0}: {1}")]
    WriteFailed(path::PathBuf, #[source] std::io::Error),
    #[error("failed to parse settings: {0}")]
    ParseFailed(#[from] toml::de::Error),
    #[error("failed to serialize settings: {0}")]
    SerializeFailed(#[from] toml::ser::Error),
    #[error("neither XDG_CONFIG_HOME nor HOME is set")]
    ConfigPathUnavailable,
}

/// Service settings, read from `settings.toml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: Server,
    pub database: Database,
    pub probe: Probe,
    pub retention: Retention,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Server {
    pub bind: String,
    pub port: u16,
    /// Upper bound on outcomes returned by one results query
    pub max_query_results: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Database {
    pub path: path::PathBuf,
    pub write_timeout_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeMethod {
    Icmp,
    Tcp,
}

impl fmt::Display for ProbeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeMethod::Icmp => write!(f, "icmp"),
            ProbeMethod::Tcp => write!(f, "tcp"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Probe {
    pub method: ProbeMethod,
    /// Port used by the `tcp` method
    pub tcp_port: u16,
    /// JSON file holding host, cycle time and ping timeout
    pub config_path: path::PathBuf,
    /// Start probing as soon as the service is up
    pub autostart: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Retention {
    pub enabled: bool,
    pub result_days: i64,
    pub cleanup_interval_minutes: u64,
}

impl Default for Server {
    fn default() -> Self {
        Self { bind: "0.0.0.0".into(), port: 8080, max_query_results: 10_000 }
    }
}

impl Default for Database {
    fn default() -> Self {
        Self { path: "hostping.db".into(), write_timeout_ms: 5_000 }
    }
}

impl Default for Probe {
    fn default() -> Self {
        Self {
            method: ProbeMethod::Icmp,
            tcp_port: 80,
            config_path: "config.json".into(),
            autostart: false,
        }
    }
}

impl Default for Retention {
    fn default() -> Self {
        Self { enabled: false, result_days: 30, cleanup_interval_minutes: 60 }
    }
}

impl Database {
    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms.max(1))
    }
}

impl Probe {
    /// Build the executor for the configured probe method
    pub fn executor(&self) -> ProbeExecutor {
        match self.method {
            ProbeMethod::Icmp => ProbeExecutor::icmp(),
            ProbeMethod::Tcp => ProbeExecutor::tcp(self.tcp_port),
        }
    }
}

impl Retention {
    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_minutes.max(1) * 60)
    }
}

/// Used to ensure we are actually reading a toml file
fn normalize_toml_path(path: &path::Path) -> path::PathBuf {
    let mut path = path.to_path_buf();
    if path.extension().map(|ext| ext != "toml").unwrap_or(true) {
        path.set_extension("toml");
    }
    path
}

/// Get default settings path ($XDG_CONFIG_HOME/hostping/settings.toml or
/// $HOME/.config/...)
fn default_config_path() -> Result<path::PathBuf, Error> {
    let path = if let Ok(config_home) = env::var("XDG_CONFIG_HOME") {
        path::PathBuf::from(config_home)
    } else if let Ok(home_dir) = env::var("HOME") {
        path::PathBuf::from(home_dir).join(".config")
    } else {
        return Err(Error::ConfigPathUnavailable);
    };

    Ok(path.join("hostping/settings.toml"))
}

impl fmt::Display for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let write_indented = |level: usize| {
            move |f: &mut fmt::Formatter<'_>, label: &str, value: &dyn fmt::Display| {
                writeln!(f, "  {:indent$}{}: {}", "", label, value, indent = level * 2)
            }
        };
        let write_title_indented = |level: usize| {
            move |f: &mut fmt::Formatter<'_>, label: &str| {
                writeln!(f, "{:indent$}{}", "", label, indent = level * 2)
            }
        };

        let write_title_1 = write_title_indented(1);
        let write_1 = write_indented(1);

        writeln!(f, "Current Service Settings:")?;
        write_title_1(f, "Server")?;
        write_1(f, "Bind Address", &self.server.bind)?;
        write_1(f, "Port", &self.server.port)?;
        write_1(f, "Max Query Results", &self.server.max_query_results)?;
        write_title_1(f, "Database")?;
        write_1(f, "Path", &self.database.path.display())?;
        write_1(f, "Write Timeout (ms)", &self.database.write_timeout_ms)?;
        write_title_1(f, "Probe")?;
        write_1(f, "Method", &self.probe.method)?;
        write_1(f, "TCP Port", &self.probe.tcp_port)?;
        write_1(f, "Config File", &self.probe.config_path.display())?;
        write_1(f, "Autostart", &self.probe.autostart)?;
        write_title_1(f, "Retention")?;
        write_1(f, "Enabled", &self.retention.enabled)?;
        write_1(f, "Result Days", &self.retention.result_days)?;

        Ok(())
    }
}

impl Settings {
    /// Load settings from file
    ///
    /// Writes the defaults to ~/.config/hostping/settings.toml, or to the
    /// given path with a `.toml` extension, if no file exists yet.
    ///
    /// ```rust,no_run
    /// # use hostping_service::config::Settings;
    /// let settings = Settings::from_config(None::<&std::path::Path>)?;
    /// println!("{}", settings);
    /// # Ok::<(), hostping_service::config::Error>(())
    /// ```
    pub fn from_config(optional_path: Option<impl AsRef<path::Path>>) -> Result<Self, Error> {
        let config_path: path::PathBuf = if let Some(path) = optional_path {
            normalize_toml_path(path.as_ref())
        } else {
            default_config_path()?
        };

        if config_path.exists() {
            let raw_string = fs::read_to_string(&config_path)
                .map_err(|err| Error::ReadFailed(config_path.clone(), err))?;
            Ok(toml::from_str(raw_string.as_str())?)
        } else {
            tracing::info!("Settings file {} not found, writing defaults", config_path.display());
            let settings = Self::default();
            settings.write_config(&config_path)?;
            Ok(settings)
        }
    }

    /// Serialize and write settings to a file
    pub fn write_config(&self, path: &path::Path) -> Result<(), Error> {
        let config_str: String = toml::to_string_pretty(self)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| Error::WriteFailed(parent.to_path_buf(), err))?;
        }

        fs::write(path, config_str).map_err(|err| Error::WriteFailed(path.to_path_buf(), err))
    }
}
