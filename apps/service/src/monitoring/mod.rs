//! Probing engine
//!
//! This module is responsible for:
//! - Running bounded ICMP/TCP reachability probes
//! - Driving the cyclic probe loop with start/stop/reconfigure controls
//! - Handing each outcome to the result store

pub mod executor;
pub mod prober;
pub mod scheduler;
pub mod types;

pub use executor::ProbeExecutor;
pub use prober::{IcmpProber, ProbeFailure, Prober, TcpProber};
pub use scheduler::{ProbeScheduler, SchedulerStatus};
pub use types::{ProbeConfig, ProbeErrorKind, ProbeOutcome, SchedulerState};
