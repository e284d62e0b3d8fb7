//! Cyclic host probing engine.
//!
//! A [`ProbeScheduler`] runs one bounded reachability probe per cycle
//! through a [`ProbeExecutor`] and appends every [`ProbeOutcome`] to a
//! [`ResultStore`]. Configuration is persisted as JSON by a
//! [`FileConfigProvider`]; service settings live in a TOML file
//! ([`config::Settings`]).

pub mod config;
pub mod database;
pub mod error;
pub mod monitoring;
pub mod pool;
pub mod provider;
pub mod retention;
pub mod validation;

pub use database::{LibsqlResultStore, MemoryResultStore, ResultStore};
pub use error::{ConfigError, SchedulerError, StorageError};
pub use monitoring::{
    ProbeConfig, ProbeErrorKind, ProbeExecutor, ProbeOutcome, ProbeScheduler, SchedulerState,
    SchedulerStatus,
};
pub use provider::{ConfigDocument, ConfigPayload, FileConfigProvider};
pub use retention::{RetentionCleanup, RetentionPolicy};
