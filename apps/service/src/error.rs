use std::io::Error as IoError;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Problems with a probe configuration or the file holding it.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("`{0}` and `{1}` are both set, only one may be given")]
    Ambiguous(&'static str, &'static str),

    #[error("missing `{0}`")]
    Missing(&'static str),

    #[error("failed to read {path}: {source}")]
    Read { path: PathBuf, source: IoError },

    #[error("failed to write {path}: {source}")]
    Write { path: PathBuf, source: IoError },

    #[error("malformed configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid { field, reason: reason.into() }
    }

    /// Name of the offending field, when the error is about a single field.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::Invalid { field, .. } | Self::Missing(field) => Some(field),
            Self::Ambiguous(field, _) => Some(field),
            _ => None,
        }
    }
}

/// Rejected scheduler transitions. These are signals, not failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SchedulerError {
    #[error("probing is already running")]
    AlreadyRunning,

    #[error("probing is not running")]
    NotRunning,
}

/// Failures of the result store.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("connection pool error: {0}")]
    Pool(String),

    #[error("database error: {0}")]
    Database(#[from] libsql::Error),

    #[error("write did not complete within {0:?}")]
    WriteTimeout(Duration),

    #[error("value out of storable range: {0}")]
    OutOfRange(&'static str),

    #[error("corrupt row: {0}")]
    Corrupt(String),
}

impl<E: std::fmt::Display> From<deadpool::managed::PoolError<E>> for StorageError {
    fn from(err: deadpool::managed::PoolError<E>) -> Self {
        Self::Pool(err.to_string())
    }
}
