use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::{Instant, timeout_at};

use super::prober::{IcmpProber, ProbeFailure, Prober, TcpProber};
use super::types::{ProbeErrorKind, ProbeOutcome};
use crate::error::ConfigError;

/// Probe executor - performs one bounded reachability measurement
///
/// Resolution and the probe itself share a single deadline, so a call never
/// outlives `timeout` by more than the runtime's scheduling slack.
pub struct ProbeExecutor {
    prober: Arc<dyn Prober>,
}

impl ProbeExecutor {
    /// Create an executor around any prober
    pub fn new(prober: Arc<dyn Prober>) -> Self {
        Self { prober }
    }

    /// ICMP echo executor
    pub fn icmp() -> Self {
        Self::new(Arc::new(IcmpProber::new()))
    }

    /// TCP connect executor
    pub fn tcp(port: u16) -> Self {
        Self::new(Arc::new(TcpProber::new(port)))
    }

    pub fn method(&self) -> &'static str {
        self.prober.name()
    }

    /// Probe `host` once.
    ///
    /// Network failures are returned as a failed [`ProbeOutcome`]; only an
    /// empty host is rejected as an error.
    pub async fn run(&self, host: &str, timeout: Duration) -> Result<ProbeOutcome, ConfigError> {
        if host.is_empty() {
            return Err(ConfigError::invalid("host", "must not be empty"));
        }

        let timestamp = Utc::now();
        let deadline = Instant::now() + timeout;

        let attempt = async {
            let addr = resolve(host).await?;
            let remaining = deadline.saturating_duration_since(Instant::now());
            self.prober.probe(addr, remaining).await
        };

        let result = match timeout_at(deadline, attempt).await {
            Ok(result) => result,
            Err(_) => Err(ProbeFailure::new(
                ProbeErrorKind::Timeout,
                format!("no reply from {host} within {} ms", timeout.as_millis()),
            )),
        };

        let outcome = match result {
            Ok(latency) => ProbeOutcome::success(timestamp, host, latency),
            Err(failure) => {
                tracing::debug!("Probe of {} failed: {}", host, failure);
                ProbeOutcome::failure(timestamp, host, failure.kind, failure.message)
            }
        };

        Ok(outcome)
    }
}

/// Resolve a host to the first address the system resolver returns.
async fn resolve(host: &str) -> Result<IpAddr, ProbeFailure> {
    let literal = host.trim_start_matches('[').trim_end_matches(']');
    if let Ok(ip) = literal.parse::<IpAddr>() {
        return Ok(ip);
    }

    let mut addrs = tokio::net::lookup_host((host, 0)).await.map_err(|e| {
        ProbeFailure::new(ProbeErrorKind::ResolutionFailure, format!("failed to resolve {host}: {e}"))
    })?;

    addrs.next().map(|addr| addr.ip()).ok_or_else(|| {
        ProbeFailure::new(ProbeErrorKind::ResolutionFailure, format!("{host} has no addresses"))
    })
}
