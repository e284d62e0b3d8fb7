use std::sync::Arc;

use hostping_service::{FileConfigProvider, ProbeScheduler, ResultStore};
use tokio::sync::Mutex;

/// Shared handler state
pub struct AppState {
    pub scheduler: Arc<ProbeScheduler>,
    pub store: Arc<dyn ResultStore>,
    pub provider: FileConfigProvider,
    /// Keeps the persisted file and the live snapshot in the same order
    pub config_lock: Mutex<()>,
    pub max_query_results: usize,
}

impl AppState {
    pub fn new(
        scheduler: Arc<ProbeScheduler>,
        store: Arc<dyn ResultStore>,
        provider: FileConfigProvider,
        max_query_results: usize,
    ) -> Self {
        Self { scheduler, store, provider, config_lock: Mutex::new(()), max_query_results }
    }
}
