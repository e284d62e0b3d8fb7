//! Retention of recorded probe outcomes.
//!
//! The probe loop never deletes anything. When enabled, this background
//! task removes outcomes older than the configured number of days.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use tracing::{debug, info, warn};

use crate::database::ResultStore;
use crate::error::StorageError;

/// Retention policy for recorded outcomes
#[derive(Debug, Clone)]
pub struct RetentionPolicy {
    /// Days to keep outcomes
    pub result_days: i64,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self { result_days: 30 }
    }
}

impl RetentionPolicy {
    /// Oldest timestamp that is kept at `now`
    pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let keep = TimeDelta::try_days(self.result_days.max(0)).unwrap_or(TimeDelta::MAX);
        now.checked_sub_signed(keep).unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

/// Cleanup manager for expired outcomes
pub struct RetentionCleanup {
    store: Arc<dyn ResultStore>,
    policy: RetentionPolicy,
}

impl RetentionCleanup {
    pub fn new(store: Arc<dyn ResultStore>, policy: RetentionPolicy) -> Self {
        Self { store, policy }
    }

    /// Delete everything older than the policy allows
    pub async fn cleanup_expired_results(&self) -> Result<u64, StorageError> {
        let cutoff = self.policy.cutoff(Utc::now());
        debug!("Deleting outcomes recorded before {}", cutoff);

        let deleted = self.store.prune_before(cutoff).await?;
        info!("Retention cleanup completed: {} outcomes deleted", deleted);
        Ok(deleted)
    }

    /// Start the background cleanup task
    pub fn start_periodic_cleanup(self, every: Duration) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);

            loop {
                interval.tick().await;

                if let Err(e) = self.cleanup_expired_results().await {
                    warn!("Periodic retention cleanup failed: {}", e);
                }
            }
        })
    }
}
