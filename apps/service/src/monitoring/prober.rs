use std::io;
use std::net::{IpAddr, SocketAddr};
use std::time::{Duration, Instant};

use surge_ping::{Client, Config, ICMP, PingIdentifier, PingSequence, SurgeError};
use thiserror::Error;
use tokio::time::timeout;

use super::types::ProbeErrorKind;

/// Standard ICMP echo payload size
const ICMP_PAYLOAD_LEN: usize = 56;

/// A failed probe, classified for recording.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct ProbeFailure {
    pub kind: ProbeErrorKind,
    pub message: String,
}

impl ProbeFailure {
    pub fn new(kind: ProbeErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into() }
    }
}

/// Map a socket error onto the probe error taxonomy.
pub fn classify_io_error(err: &io::Error) -> ProbeErrorKind {
    match err.kind() {
        io::ErrorKind::PermissionDenied => ProbeErrorKind::PermissionDenied,
        io::ErrorKind::TimedOut => ProbeErrorKind::Timeout,
        io::ErrorKind::ConnectionRefused
        | io::ErrorKind::ConnectionReset
        | io::ErrorKind::HostUnreachable
        | io::ErrorKind::NetworkUnreachable
        | io::ErrorKind::AddrNotAvailable => ProbeErrorKind::Unreachable,
        _ => ProbeErrorKind::Unknown,
    }
}

impl From<io::Error> for ProbeFailure {
    fn from(err: io::Error) -> Self {
        Self::new(classify_io_error(&err), err.to_string())
    }
}

/// A reachability check against an already resolved address.
#[async_trait::async_trait]
pub trait Prober: Send + Sync {
    /// Probe `addr`, waiting at most `timeout`, and return the round-trip latency.
    async fn probe(&self, addr: IpAddr, timeout: Duration) -> Result<Duration, ProbeFailure>;

    /// Short name used in logs
    fn name(&self) -> &'static str;
}

/// ICMP echo prober.
///
/// Uses an unprivileged datagram socket where the kernel allows it and a
/// raw socket otherwise; without either the probe fails with
/// [`ProbeErrorKind::PermissionDenied`].
pub struct IcmpProber {
    payload: [u8; ICMP_PAYLOAD_LEN],
}

impl IcmpProber {
    pub fn new() -> Self {
        Self { payload: [0; ICMP_PAYLOAD_LEN] }
    }
}

impl Default for IcmpProber {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Prober for IcmpProber {
    async fn probe(&self, addr: IpAddr, timeout: Duration) -> Result<Duration, ProbeFailure> {
        let config = match addr {
            IpAddr::V4(_) => Config::default(),
            IpAddr::V6(_) => Config::builder().kind(ICMP::V6).build(),
        };

        let client = Client::new(&config)?;
        let mut pinger = client.pinger(addr, PingIdentifier(rand::random())).await;
        pinger.timeout(timeout);

        match pinger.ping(PingSequence(0), &self.payload).await {
            Ok((_packet, rtt)) => Ok(rtt),
            Err(SurgeError::Timeout { .. }) => Err(ProbeFailure::new(
                ProbeErrorKind::Timeout,
                format!("no echo reply from {addr} within {} ms", timeout.as_millis()),
            )),
            Err(SurgeError::IOError(e)) => Err(e.into()),
            Err(e) => Err(ProbeFailure::new(ProbeErrorKind::Unknown, e.to_string())),
        }
    }

    fn name(&self) -> &'static str {
        "icmp"
    }
}

/// TCP port prober: the host counts as reachable when a connection to
/// `port` is accepted. Latency is the connect time.
pub struct TcpProber {
    port: u16,
}

impl TcpProber {
    pub fn new(port: u16) -> Self {
        Self { port }
    }
}

#[async_trait::async_trait]
impl Prober for TcpProber {
    async fn probe(&self, addr: IpAddr, timeout_duration: Duration) -> Result<Duration, ProbeFailure> {
        let target = SocketAddr::new(addr, self.port);
        let start = Instant::now();

        let connect = tokio::net::TcpStream::connect(target);

        timeout(timeout_duration, connect)
            .await
            .map_err(|_| {
                ProbeFailure::new(
                    ProbeErrorKind::Timeout,
                    format!("TCP connection to {target} timed out"),
                )
            })?
            .map_err(|e| ProbeFailure::new(classify_io_error(&e), format!("TCP connection to {target} failed: {e}")))?;

        Ok(start.elapsed())
    }

    fn name(&self) -> &'static str {
        "tcp"
    }
}
