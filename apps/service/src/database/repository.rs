use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::params;

use super::initialize_database;
use super::models::{
    OUTCOME_COLUMNS, bound_to_nanos, latency_to_nanos, outcome_from_row, timestamp_to_nanos,
};
use crate::error::StorageError;
use crate::monitoring::types::ProbeOutcome;
use crate::pool::{LibsqlManager, LibsqlPool, is_busy};

/// Default bound on a single append
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(5);

/// Append-only store of probe outcomes
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Persist one outcome. Once this returns `Ok` the outcome is durable.
    async fn append(&self, outcome: &ProbeOutcome) -> Result<(), StorageError>;

    /// Outcomes with `from <= timestamp <= to`, optionally for one host,
    /// ascending by timestamp (ties in append order).
    async fn query(
        &self,
        host: Option<&str>,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<ProbeOutcome>, StorageError>;

    /// The newest `limit` outcomes with `from <= timestamp <= to`, ascending.
    ///
    /// Stores that can sort on their side should override this so only
    /// `limit` rows are ever read.
    async fn query_latest(
        &self,
        host: Option<&str>,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<ProbeOutcome>, StorageError> {
        let mut outcomes = self.query(host, from, to).await?;
        if outcomes.len() > limit {
            outcomes.drain(..outcomes.len() - limit);
        }
        Ok(outcomes)
    }

    /// Delete outcomes older than `cutoff`, returning how many were removed.
    ///
    /// Only the retention policy calls this; the probe loop never deletes.
    async fn prune_before(&self, cutoff: DateTime<Utc>) -> Result<u64, StorageError>;
}

/// LibSQL (SQLite file) result store
///
/// Every append is one autocommit `INSERT`; nothing is buffered in process.
pub struct LibsqlResultStore {
    pool: LibsqlPool,
    write_timeout: Duration,
}

impl LibsqlResultStore {
    /// Open (or create) the database at `path` and bring its schema up to date
    pub async fn open(path: impl AsRef<Path>, write_timeout: Duration) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let database = libsql::Builder::new_local(path).build().await?;
        // A locked database must fail inside the write timeout rather than
        // block the calling thread past it
        let pool: LibsqlPool =
            deadpool::managed::Pool::builder(LibsqlManager::new(database, write_timeout)).build()?;

        let conn = pool.get().await?;
        initialize_database(&*conn).await?;
        drop(conn);

        tracing::info!("Result store opened at {}", path.display());
        Ok(Self::new_from_pool(pool, write_timeout))
    }

    /// Create a store from an already migrated pool
    pub fn new_from_pool(pool: LibsqlPool, write_timeout: Duration) -> Self {
        Self { pool, write_timeout }
    }

    /// Get a connection from the pool
    async fn get_conn(&self) -> Result<deadpool::managed::Object<LibsqlManager>, StorageError> {
        Ok(self.pool.get().await?)
    }

    async fn insert(&self, outcome: &ProbeOutcome) -> Result<(), StorageError> {
        let timestamp = timestamp_to_nanos(outcome.timestamp)?;
        let latency = outcome.latency.map(latency_to_nanos).transpose()?;

        let conn = self.get_conn().await?;
        let inserted = conn.execute(
            "INSERT INTO probe_outcomes (timestamp_ns, host, success, latency_ns, error_kind, error_message) VALUES (?, ?, ?, ?, ?, ?)",
            params![
                timestamp,
                outcome.host.clone(),
                if outcome.success { 1 } else { 0 },
                latency,
                outcome.error_kind.map(|kind| kind.as_str().to_string()),
                outcome.error_message.clone()
            ],
        )
        .await;

        match inserted {
            Ok(_) => Ok(()),
            Err(e) if is_busy(&e) => Err(StorageError::WriteTimeout(self.write_timeout)),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl ResultStore for LibsqlResultStore {
    async fn append(&self, outcome: &ProbeOutcome) -> Result<(), StorageError> {
        tokio::time::timeout(self.write_timeout, self.insert(outcome))
            .await
            .map_err(|_| StorageError::WriteTimeout(self.write_timeout))?
    }

    async fn query(
        &self,
        host: Option<&str>,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<ProbeOutcome>, StorageError> {
        if from > to {
            return Ok(Vec::new());
        }

        let from = bound_to_nanos(from);
        let to = bound_to_nanos(to);
        let conn = self.get_conn().await?;

        let mut rows = match host {
            Some(host) => {
                let sql = format!(
                    "SELECT {OUTCOME_COLUMNS} FROM probe_outcomes WHERE host = ? AND timestamp_ns >= ? AND timestamp_ns <= ? ORDER BY timestamp_ns ASC, id ASC"
                );
                conn.query(&sql, params![host.to_string(), from, to]).await?
            }
            None => {
                let sql = format!(
                    "SELECT {OUTCOME_COLUMNS} FROM probe_outcomes WHERE timestamp_ns >= ? AND timestamp_ns <= ? ORDER BY timestamp_ns ASC, id ASC"
                );
                conn.query(&sql, params![from, to]).await?
            }
        };

        let mut outcomes = Vec::new();
        while let Some(row) = rows.next().await? {
            outcomes.push(outcome_from_row(&row)?);
        }

        Ok(outcomes)
    }

    async fn query_latest(
        &self,
        host: Option<&str>,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<ProbeOutcome>, StorageError> {
        if from > to || limit == 0 {
            return Ok(Vec::new());
        }

        let from = bound_to_nanos(from);
        let to = bound_to_nanos(to);
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let conn = self.get_conn().await?;

        let mut rows = match host {
            Some(host) => {
                let sql = format!(
                    "SELECT {OUTCOME_COLUMNS} FROM probe_outcomes WHERE host = ? AND timestamp_ns >= ? AND timestamp_ns <= ? ORDER BY timestamp_ns DESC, id DESC LIMIT ?"
                );
                conn.query(&sql, params![host.to_string(), from, to, limit]).await?
            }
            None => {
                let sql = format!(
                    "SELECT {OUTCOME_COLUMNS} FROM probe_outcomes WHERE timestamp_ns >= ? AND timestamp_ns <= ? ORDER BY timestamp_ns DESC, id DESC LIMIT ?"
                );
                conn.query(&sql, params![from, to, limit]).await?
            }
        };

        let mut outcomes = Vec::new();
        while let Some(row) = rows.next().await? {
            outcomes.push(outcome_from_row(&row)?);
        }
        outcomes.reverse();

        Ok(outcomes)
    }

    async fn prune_before(&self, cutoff: DateTime<Utc>) -> Result<u64, StorageError> {
        let conn = self.get_conn().await?;
        let deleted = conn
            .execute(
                "DELETE FROM probe_outcomes WHERE timestamp_ns < ?",
                params![bound_to_nanos(cutoff)],
            )
            .await?;
        Ok(deleted)
    }
}
