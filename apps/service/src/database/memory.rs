use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::repository::ResultStore;
use crate::error::StorageError;
use crate::monitoring::types::ProbeOutcome;

/// In-process result store.
///
/// Same ordering semantics as the database store but nothing survives a
/// restart. Used for ephemeral runs and tests.
#[derive(Default)]
pub struct MemoryResultStore {
    outcomes: RwLock<Vec<ProbeOutcome>>,
}

impl MemoryResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.outcomes.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.outcomes.read().await.is_empty()
    }
}

#[async_trait]
impl ResultStore for MemoryResultStore {
    async fn append(&self, outcome: &ProbeOutcome) -> Result<(), StorageError> {
        self.outcomes.write().await.push(outcome.clone());
        Ok(())
    }

    async fn query(
        &self,
        host: Option<&str>,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<ProbeOutcome>, StorageError> {
        let mut matching: Vec<ProbeOutcome> = self
            .outcomes
            .read()
            .await
            .iter()
            .filter(|o| host.is_none_or(|h| o.host == h))
            .filter(|o| o.timestamp >= from && o.timestamp <= to)
            .cloned()
            .collect();

        // Stable, so equal timestamps keep append order
        matching.sort_by_key(|o| o.timestamp);
        Ok(matching)
    }

    async fn prune_before(&self, cutoff: DateTime<Utc>) -> Result<u64, StorageError> {
        let mut outcomes = self.outcomes.write().await;
        let before = outcomes.len();
        outcomes.retain(|o| o.timestamp >= cutoff);
        Ok((before - outcomes.len()) as u64)
    }
}
