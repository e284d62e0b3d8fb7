use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::validation::{validate_host, validate_interval, validate_timeout};

/// Immutable probing parameters for one host.
///
/// Only constructible through [`ProbeConfig::new`], so every value in
/// circulation has been validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeConfig {
    host: String,
    interval: Duration,
    timeout: Duration,
}

impl ProbeConfig {
    /// Create a validated configuration snapshot.
    pub fn new(
        host: impl Into<String>,
        interval: Duration,
        timeout: Duration,
    ) -> Result<Self, ConfigError> {
        let host = host.into();
        validate_host(&host)?;
        validate_interval(interval)?;
        validate_timeout(timeout)?;

        if timeout >= interval {
            tracing::warn!(
                "Ping timeout ({} ms) is not shorter than the cycle time ({} ms); cycles will run back to back when probes time out",
                timeout.as_millis(),
                interval.as_millis()
            );
        }

        Ok(Self { host, interval, timeout })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            host: "8.8.8.8".into(),
            interval: Duration::from_secs(5),
            timeout: Duration::from_millis(1000),
        }
    }
}

/// Why a probe did not succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeErrorKind {
    Timeout,
    Unreachable,
    ResolutionFailure,
    PermissionDenied,
    Unknown,
}

impl ProbeErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProbeErrorKind::Timeout => "timeout",
            ProbeErrorKind::Unreachable => "unreachable",
            ProbeErrorKind::ResolutionFailure => "resolution_failure",
            ProbeErrorKind::PermissionDenied => "permission_denied",
            ProbeErrorKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ProbeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProbeErrorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "timeout" => Ok(ProbeErrorKind::Timeout),
            "unreachable" => Ok(ProbeErrorKind::Unreachable),
            "resolution_failure" => Ok(ProbeErrorKind::ResolutionFailure),
            "permission_denied" => Ok(ProbeErrorKind::PermissionDenied),
            "unknown" => Ok(ProbeErrorKind::Unknown),
            other => Err(format!("unknown probe error kind `{other}`")),
        }
    }
}

/// Result of one probe cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeOutcome {
    /// When the probe started (UTC)
    pub timestamp: DateTime<Utc>,

    /// Host that was probed
    pub host: String,

    pub success: bool,

    /// Round-trip time, only present on success (milliseconds on the wire)
    #[serde(rename = "latency_ms", default, with = "latency_millis")]
    pub latency: Option<Duration>,

    /// Failure classification, only present on failure
    pub error_kind: Option<ProbeErrorKind>,

    /// Human readable failure detail
    pub error_message: Option<String>,
}

impl ProbeOutcome {
    /// A successful probe
    pub fn success(timestamp: DateTime<Utc>, host: impl Into<String>, latency: Duration) -> Self {
        Self {
            timestamp,
            host: host.into(),
            success: true,
            latency: Some(latency),
            error_kind: None,
            error_message: None,
        }
    }

    /// A failed probe
    pub fn failure(
        timestamp: DateTime<Utc>,
        host: impl Into<String>,
        kind: ProbeErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            host: host.into(),
            success: false,
            latency: None,
            error_kind: Some(kind),
            error_message: Some(message.into()),
        }
    }
}

/// Latency goes over the wire as fractional milliseconds.
mod latency_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(latency) => serializer.serialize_some(&(latency.as_nanos() as f64 / 1_000_000.0)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Duration>, D::Error> {
        let millis = Option::<f64>::deserialize(deserializer)?;
        match millis {
            Some(ms) if ms.is_finite() && ms >= 0.0 => Ok(Some(Duration::from_nanos((ms * 1_000_000.0).round() as u64))),
            Some(ms) => Err(serde::de::Error::custom(format!("invalid latency {ms}"))),
            None => Ok(None),
        }
    }
}

/// Lifecycle state of a [`ProbeScheduler`](super::ProbeScheduler).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum SchedulerState {
    Idle = 0,
    Running = 1,
    Stopping = 2,
}

impl SchedulerState {
    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            1 => SchedulerState::Running,
            2 => SchedulerState::Stopping,
            _ => SchedulerState::Idle,
        }
    }
}

impl fmt::Display for SchedulerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchedulerState::Idle => write!(f, "idle"),
            SchedulerState::Running => write!(f, "running"),
            SchedulerState::Stopping => write!(f, "stopping"),
        }
    }
}
