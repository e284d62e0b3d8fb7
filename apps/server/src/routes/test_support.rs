use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use actix_web::web;
use async_trait::async_trait;
use hostping_service::monitoring::{ProbeFailure, Prober};
use hostping_service::{
    FileConfigProvider, MemoryResultStore, ProbeConfig, ProbeExecutor, ProbeScheduler,
};
use tempfile::TempDir;

use crate::state::AppState;

/// Answers every probe after one millisecond
pub struct InstantProber;

#[async_trait]
impl Prober for InstantProber {
    async fn probe(&self, _addr: IpAddr, _timeout: Duration) -> Result<Duration, ProbeFailure> {
        tokio::time::sleep(Duration::from_millis(1)).await;
        Ok(Duration::from_millis(1))
    }

    fn name(&self) -> &'static str {
        "instant"
    }
}

pub struct TestContext {
    pub state: web::Data<AppState>,
    pub store: Arc<MemoryResultStore>,
    pub dir: TempDir,
}

/// Handler state backed by a memory store and a temp config file
pub fn test_state(max_query_results: usize) -> TestContext {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(MemoryResultStore::new());
    let executor = Arc::new(ProbeExecutor::new(Arc::new(InstantProber)));
    let config = ProbeConfig::new("8.8.8.8", Duration::from_secs(60), Duration::from_millis(500)).unwrap();
    let scheduler = Arc::new(ProbeScheduler::new(executor, store.clone(), config));
    let provider = FileConfigProvider::new(dir.path().join("config.json"));

    let state = web::Data::new(AppState::new(scheduler, store.clone(), provider, max_query_results));
    TestContext { state, store, dir }
}
