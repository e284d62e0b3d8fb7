use std::sync::Arc;
use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};

use serde::Serialize;
use tokio::runtime::Handle;
use tokio::sync::{Mutex, RwLock, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};
use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;

use super::executor::ProbeExecutor;
use super::types::{ProbeConfig, ProbeOutcome, SchedulerState};
use crate::database::ResultStore;
use crate::error::SchedulerError;

/// Point-in-time view of the scheduler for the control surface
#[derive(Debug, Clone, Serialize)]
pub struct SchedulerStatus {
    pub state: SchedulerState,
    /// Cycles completed since the scheduler was created
    pub cycles_completed: u64,
    /// Appends that failed in a row; non-zero means results are being lost
    pub consecutive_store_failures: u64,
    pub last_outcome: Option<ProbeOutcome>,
}

impl SchedulerStatus {
    pub fn is_degraded(&self) -> bool {
        self.consecutive_store_failures > 0
    }
}

/// The active run, if any. Only touched with the control lock held.
#[derive(Default)]
struct Control {
    run_id: Option<Uuid>,
    stop_tx: Option<watch::Sender<bool>>,
    handle: Option<JoinHandle<()>>,
}

struct Shared {
    /// Mirrors the state for lock-free reads; written only under `control`
    state: AtomicU8,
    control: Mutex<Control>,
    config_tx: watch::Sender<Arc<ProbeConfig>>,
    executor: Arc<ProbeExecutor>,
    store: Arc<dyn ResultStore>,
    cycles_completed: AtomicU64,
    consecutive_store_failures: AtomicU64,
    last_outcome: RwLock<Option<ProbeOutcome>>,
}

impl Shared {
    fn state(&self) -> SchedulerState {
        SchedulerState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn set_state(&self, state: SchedulerState) {
        self.state.store(state as u8, Ordering::Release);
    }

    /// One cycle: probe with the given snapshot, then record the outcome.
    async fn run_cycle(&self, config: &ProbeConfig) {
        let outcome = match self.executor.run(config.host(), config.timeout()).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Skipping probe cycle: {}", e);
                return;
            }
        };

        if outcome.success {
            debug!(
                "Probe of {} succeeded in {:.3} ms",
                outcome.host,
                outcome.latency.unwrap_or_default().as_secs_f64() * 1000.0
            );
        } else {
            debug!(
                "Probe of {} failed ({})",
                outcome.host,
                outcome.error_kind.map(|kind| kind.as_str()).unwrap_or("unknown")
            );
        }

        match self.store.append(&outcome).await {
            Ok(()) => {
                let failed = self.consecutive_store_failures.swap(0, Ordering::AcqRel);
                if failed > 0 {
                    info!("Result store recovered after {} failed appends", failed);
                }
            }
            Err(e) => {
                let failed = self.consecutive_store_failures.fetch_add(1, Ordering::AcqRel) + 1;
                warn!(
                    consecutive_failures = failed,
                    "Failed to record probe outcome, continuing: {}", e
                );
            }
        }

        self.cycles_completed.fetch_add(1, Ordering::AcqRel);
        *self.last_outcome.write().await = Some(outcome);
    }

    /// Transition to `Idle` once the loop of `run_id` has exited.
    async fn finish(&self, run_id: Uuid) {
        let mut control = self.control.lock().await;
        if control.run_id == Some(run_id) {
            control.run_id = None;
            control.stop_tx = None;
            self.set_state(SchedulerState::Idle);
            info!("Probing stopped");
        }
    }
}

/// Cyclic probe scheduler for a single host.
///
/// One background task runs at most one cycle at a time. Cycles start
/// `interval` after the start of the previous one, or immediately if the
/// previous cycle overran. `start`, `stop` and the loop's own transition
/// back to `Idle` are serialized by one lock; the configuration is an
/// immutable snapshot swapped through a watch channel and read once per
/// cycle.
pub struct ProbeScheduler {
    shared: Arc<Shared>,
    /// Runtime the loop is spawned on, independent of the caller's
    runtime: Handle,
}

impl ProbeScheduler {
    /// Create an idle scheduler holding `config` for a future `start`.
    ///
    /// Probe loops are spawned on the runtime this is called from.
    ///
    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime.
    pub fn new(executor: Arc<ProbeExecutor>, store: Arc<dyn ResultStore>, config: ProbeConfig) -> Self {
        let (config_tx, _) = watch::channel(Arc::new(config));

        Self {
            shared: Arc::new(Shared {
                state: AtomicU8::new(SchedulerState::Idle as u8),
                control: Mutex::new(Control::default()),
                config_tx,
                executor,
                store,
                cycles_completed: AtomicU64::new(0),
                consecutive_store_failures: AtomicU64::new(0),
                last_outcome: RwLock::new(None),
            }),
            runtime: Handle::current(),
        }
    }

    /// Current state, without taking any lock
    pub fn state(&self) -> SchedulerState {
        self.shared.state()
    }

    /// Current configuration snapshot
    pub fn config(&self) -> Arc<ProbeConfig> {
        Arc::clone(&self.shared.config_tx.borrow())
    }

    pub async fn status(&self) -> SchedulerStatus {
        SchedulerStatus {
            state: self.state(),
            cycles_completed: self.shared.cycles_completed.load(Ordering::Acquire),
            consecutive_store_failures: self.shared.consecutive_store_failures.load(Ordering::Acquire),
            last_outcome: self.shared.last_outcome.read().await.clone(),
        }
    }

    /// Install `config` and start probing. The scheduler is `Running` when
    /// this returns.
    pub async fn start(&self, config: ProbeConfig) -> Result<(), SchedulerError> {
        let mut control = self.shared.control.lock().await;
        if self.state() != SchedulerState::Idle {
            return Err(SchedulerError::AlreadyRunning);
        }

        self.shared.config_tx.send_replace(Arc::new(config));
        self.spawn_loop(&mut control);
        Ok(())
    }

    /// Start probing with the configuration already held
    pub async fn start_current(&self) -> Result<(), SchedulerError> {
        let mut control = self.shared.control.lock().await;
        if self.state() != SchedulerState::Idle {
            return Err(SchedulerError::AlreadyRunning);
        }

        self.spawn_loop(&mut control);
        Ok(())
    }

    fn spawn_loop(&self, control: &mut Control) {
        let run_id = Uuid::new_v4();
        let (stop_tx, stop_rx) = watch::channel(false);
        let config = self.config();

        self.shared.set_state(SchedulerState::Running);
        info!(
            %run_id,
            "Probing {} every {} ms (timeout {} ms)",
            config.host(),
            config.interval().as_millis(),
            config.timeout().as_millis()
        );

        let span = info_span!("probe_loop", %run_id, host = %config.host());
        let shared = Arc::clone(&self.shared);
        let cycles = self.runtime.spawn(run_loop(Arc::clone(&shared), stop_rx).instrument(span.clone()));

        let handle = self.runtime.spawn(
            async move {
                if let Err(e) = cycles.await {
                    error!("Probe loop aborted: {}", e);
                }
                shared.finish(run_id).await;
            }
            .instrument(span),
        );

        control.run_id = Some(run_id);
        control.stop_tx = Some(stop_tx);
        control.handle = Some(handle);
    }

    /// Request a stop. The in-flight probe, if any, finishes and is
    /// recorded; the scheduler reaches `Idle` after that.
    pub async fn stop(&self) -> Result<(), SchedulerError> {
        let control = self.shared.control.lock().await;
        if self.state() != SchedulerState::Running {
            return Err(SchedulerError::NotRunning);
        }

        self.shared.set_state(SchedulerState::Stopping);
        if let Some(stop_tx) = &control.stop_tx {
            stop_tx.send_replace(true);
        }
        info!("Stop requested, waiting for the current cycle to finish");
        Ok(())
    }

    /// Replace the configuration. Takes effect from the next cycle; valid
    /// in every state.
    pub fn reconfigure(&self, config: ProbeConfig) {
        info!(
            "Reconfigured: host={} cycle_time={} ms timeout={} ms",
            config.host(),
            config.interval().as_millis(),
            config.timeout().as_millis()
        );
        self.shared.config_tx.send_replace(Arc::new(config));
    }

    /// Stop if running and wait until the loop has exited.
    pub async fn shutdown(&self) {
        let handle = {
            let mut control = self.shared.control.lock().await;
            if self.state() == SchedulerState::Running {
                self.shared.set_state(SchedulerState::Stopping);
                if let Some(stop_tx) = &control.stop_tx {
                    stop_tx.send_replace(true);
                }
            }
            control.handle.take()
        };

        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                error!("Probe loop supervisor failed: {}", e);
            }
        }
    }
}

impl Drop for ProbeScheduler {
    fn drop(&mut self) {
        // Nobody is left to call `stop`; let the loop wind down on its own
        if let Ok(control) = self.shared.control.try_lock() {
            if let Some(stop_tx) = &control.stop_tx {
                stop_tx.send_replace(true);
            }
        }
    }
}

/// The cyclic loop. Exits once a stop has been signalled, never in the
/// middle of a cycle.
async fn run_loop(shared: Arc<Shared>, mut stop_rx: watch::Receiver<bool>) {
    let mut config_rx = shared.config_tx.subscribe();

    loop {
        // A stop accepted before this cycle began means it never begins
        if *stop_rx.borrow_and_update() {
            return;
        }

        let cycle_start = Instant::now();
        let config = Arc::clone(&config_rx.borrow_and_update());

        shared.run_cycle(&config).await;

        if *stop_rx.borrow() {
            return;
        }

        let mut next = cycle_start + config_rx.borrow().interval();
        loop {
            tokio::select! {
                _ = sleep_until(next) => break,
                _ = stop_rx.changed() => return,
                Ok(()) = config_rx.changed() => {
                    next = cycle_start + config_rx.borrow().interval();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryResultStore;
    use crate::error::StorageError;
    use crate::monitoring::prober::{ProbeFailure, Prober};
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use std::net::IpAddr;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    /// Prober with a fixed delay that tracks overlapping calls
    struct FakeProber {
        delay: Duration,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        calls: AtomicUsize,
    }

    impl FakeProber {
        fn new(delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                delay,
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl Prober for FakeProber {
        async fn probe(&self, _addr: IpAddr, _timeout: Duration) -> Result<Duration, ProbeFailure> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(self.delay)
        }

        fn name(&self) -> &'static str {
            "fake"
        }
    }

    /// Store whose appends always fail
    struct BrokenStore;

    #[async_trait]
    impl ResultStore for BrokenStore {
        async fn append(&self, _outcome: &ProbeOutcome) -> Result<(), StorageError> {
            Err(StorageError::Pool("disk on fire".into()))
        }

        async fn query(
            &self,
            _host: Option<&str>,
            _from: DateTime<Utc>,
            _to: DateTime<Utc>,
        ) -> Result<Vec<ProbeOutcome>, StorageError> {
            Ok(Vec::new())
        }

        async fn prune_before(&self, _cutoff: DateTime<Utc>) -> Result<u64, StorageError> {
            Ok(0)
        }
    }

    /// Store that fails its first `failures` appends, then works
    struct FlakyStore {
        failures: AtomicUsize,
        inner: MemoryResultStore,
    }

    #[async_trait]
    impl ResultStore for FlakyStore {
        async fn append(&self, outcome: &ProbeOutcome) -> Result<(), StorageError> {
            let remaining = self.failures.load(Ordering::SeqCst);
            if remaining > 0 {
                self.failures.store(remaining - 1, Ordering::SeqCst);
                return Err(StorageError::WriteTimeout(Duration::from_millis(200)));
            }
            self.inner.append(outcome).await
        }

        async fn query(
            &self,
            host: Option<&str>,
            from: DateTime<Utc>,
            to: DateTime<Utc>,
        ) -> Result<Vec<ProbeOutcome>, StorageError> {
            self.inner.query(host, from, to).await
        }

        async fn prune_before(&self, cutoff: DateTime<Utc>) -> Result<u64, StorageError> {
            self.inner.prune_before(cutoff).await
        }
    }

    fn config(host: &str, interval_ms: u64, timeout_ms: u64) -> ProbeConfig {
        ProbeConfig::new(host, Duration::from_millis(interval_ms), Duration::from_millis(timeout_ms)).unwrap()
    }

    fn scheduler_with(
        prober: Arc<FakeProber>,
        initial: ProbeConfig,
    ) -> (ProbeScheduler, Arc<MemoryResultStore>) {
        let store = Arc::new(MemoryResultStore::new());
        let executor = Arc::new(ProbeExecutor::new(prober));
        let scheduler = ProbeScheduler::new(executor, store.clone(), initial);
        (scheduler, store)
    }

    async fn all_outcomes(store: &MemoryResultStore) -> Vec<ProbeOutcome> {
        store.query(None, DateTime::<Utc>::MIN_UTC, DateTime::<Utc>::MAX_UTC).await.unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_enters_running_before_returning() {
        let (scheduler, _store) = scheduler_with(FakeProber::new(Duration::from_millis(10)), ProbeConfig::default());
        assert_eq!(scheduler.state(), SchedulerState::Idle);

        scheduler.start(config("8.8.8.8", 100, 50)).await.unwrap();
        assert_eq!(scheduler.state(), SchedulerState::Running);
        assert_eq!(scheduler.config().host(), "8.8.8.8");

        scheduler.shutdown().await;
        assert_eq!(scheduler.state(), SchedulerState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_while_running_is_rejected() {
        let prober = FakeProber::new(Duration::from_millis(10));
        let (scheduler, store) = scheduler_with(prober.clone(), ProbeConfig::default());

        scheduler.start(config("8.8.8.8", 100, 50)).await.unwrap();
        assert_eq!(
            scheduler.start(config("1.1.1.1", 100, 50)).await,
            Err(SchedulerError::AlreadyRunning)
        );
        assert_eq!(scheduler.start_current().await, Err(SchedulerError::AlreadyRunning));
        assert_eq!(scheduler.config().host(), "8.8.8.8");

        tokio::time::sleep(Duration::from_millis(450)).await;
        scheduler.shutdown().await;

        // One loop: cycles at 0, 100, 200, 300, 400
        assert_eq!(store.len().await, 5);
        assert_eq!(prober.max_in_flight.load(Ordering::SeqCst), 1);
        assert!(all_outcomes(&store).await.iter().all(|o| o.host == "8.8.8.8"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_when_idle_is_rejected() {
        let (scheduler, store) = scheduler_with(FakeProber::new(Duration::from_millis(10)), ProbeConfig::default());

        assert_eq!(scheduler.stop().await, Err(SchedulerError::NotRunning));
        assert_eq!(scheduler.state(), SchedulerState::Idle);
        assert!(store.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cycle_count_over_one_second() {
        let prober = FakeProber::new(Duration::from_millis(10));
        let (scheduler, store) = scheduler_with(prober.clone(), ProbeConfig::default());

        scheduler.start(config("8.8.8.8", 100, 50)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(995)).await;
        scheduler.stop().await.unwrap();
        scheduler.shutdown().await;

        let count = store.len().await;
        assert!((9..=10).contains(&count), "recorded {count} outcomes");
        assert_eq!(prober.max_in_flight.load(Ordering::SeqCst), 1);

        let outcomes = all_outcomes(&store).await;
        assert!(outcomes.iter().all(|o| o.success));
        assert!(outcomes.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }

    #[tokio::test(start_paused = true)]
    async fn test_overrunning_probes_never_overlap() {
        // Probe takes 150 ms longer than the interval
        let prober = FakeProber::new(Duration::from_millis(250));
        let (scheduler, store) = scheduler_with(prober.clone(), ProbeConfig::default());

        scheduler.start(config("8.8.8.8", 100, 1000)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(1100)).await;
        scheduler.shutdown().await;

        assert_eq!(prober.max_in_flight.load(Ordering::SeqCst), 1);
        // Back to back: 0-250, 250-500, 500-750, 750-1000, 1000-1250
        assert_eq!(prober.calls.load(Ordering::SeqCst), 5);
        assert_eq!(store.len().await, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconfigure_applies_from_next_cycle() {
        let prober = FakeProber::new(Duration::from_millis(200));
        let (scheduler, store) = scheduler_with(prober, ProbeConfig::default());

        scheduler.start(config("8.8.8.8", 1000, 500)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        // First probe is in flight
        scheduler.reconfigure(config("1.1.1.1", 1000, 500));
        assert_eq!(scheduler.config().host(), "1.1.1.1");
        assert_eq!(scheduler.state(), SchedulerState::Running);

        tokio::time::sleep(Duration::from_millis(1500)).await;
        scheduler.shutdown().await;

        let hosts: Vec<_> = all_outcomes(&store).await.into_iter().map(|o| o.host).collect();
        assert_eq!(hosts, vec!["8.8.8.8".to_string(), "1.1.1.1".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconfigure_interval_while_waiting() {
        let (scheduler, store) = scheduler_with(FakeProber::new(Duration::from_millis(10)), ProbeConfig::default());

        scheduler.start(config("8.8.8.8", 10_000, 500)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(store.len().await, 1);

        // Shorter interval shortens the pending wait
        scheduler.reconfigure(config("8.8.8.8", 200, 100));
        tokio::time::sleep(Duration::from_millis(150)).await;
        scheduler.shutdown().await;

        assert_eq!(store.len().await, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconfigure_while_idle_updates_snapshot() {
        let (scheduler, store) = scheduler_with(FakeProber::new(Duration::from_millis(10)), ProbeConfig::default());

        scheduler.reconfigure(config("1.1.1.1", 100, 50));
        assert_eq!(scheduler.state(), SchedulerState::Idle);
        assert!(store.is_empty().await);

        scheduler.start_current().await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        scheduler.shutdown().await;

        assert_eq!(all_outcomes(&store).await[0].host, "1.1.1.1");
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_lets_in_flight_probe_finish() {
        let prober = FakeProber::new(Duration::from_millis(300));
        let (scheduler, store) = scheduler_with(prober.clone(), ProbeConfig::default());

        scheduler.start(config("8.8.8.8", 1000, 500)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        scheduler.stop().await.unwrap();
        assert_eq!(scheduler.state(), SchedulerState::Stopping);
        assert_eq!(scheduler.stop().await, Err(SchedulerError::NotRunning));
        assert_eq!(
            scheduler.start(config("8.8.8.8", 1000, 500)).await,
            Err(SchedulerError::AlreadyRunning)
        );

        tokio::time::sleep(Duration::from_millis(250)).await;
        assert_eq!(scheduler.state(), SchedulerState::Idle);
        assert_eq!(store.len().await, 1);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(store.len().await, 1);
        assert_eq!(prober.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_before_first_cycle_runs_nothing() {
        let prober = FakeProber::new(Duration::from_millis(10));
        let (scheduler, store) = scheduler_with(prober.clone(), ProbeConfig::default());

        scheduler.start(config("8.8.8.8", 100, 50)).await.unwrap();
        scheduler.stop().await.unwrap();
        assert_eq!(scheduler.state(), SchedulerState::Stopping);

        scheduler.shutdown().await;
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert_eq!(scheduler.state(), SchedulerState::Idle);
        assert_eq!(prober.calls.load(Ordering::SeqCst), 0);
        assert!(store.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_after_stop() {
        let (scheduler, store) = scheduler_with(FakeProber::new(Duration::from_millis(10)), ProbeConfig::default());

        scheduler.start(config("8.8.8.8", 100, 50)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        scheduler.stop().await.unwrap();
        scheduler.shutdown().await;
        assert_eq!(scheduler.state(), SchedulerState::Idle);

        scheduler.start(config("1.1.1.1", 100, 50)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        scheduler.shutdown().await;

        let hosts: Vec<_> = all_outcomes(&store).await.into_iter().map(|o| o.host).collect();
        assert_eq!(hosts, vec!["8.8.8.8".to_string(), "1.1.1.1".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_failures_do_not_stop_the_loop() {
        let executor = Arc::new(ProbeExecutor::new(FakeProber::new(Duration::from_millis(10))));
        let scheduler = ProbeScheduler::new(executor, Arc::new(BrokenStore), ProbeConfig::default());

        scheduler.start(config("8.8.8.8", 100, 50)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(350)).await;

        let status = scheduler.status().await;
        assert_eq!(status.state, SchedulerState::Running);
        assert_eq!(status.cycles_completed, 4);
        assert_eq!(status.consecutive_store_failures, 4);
        assert!(status.is_degraded());
        assert!(status.last_outcome.is_some_and(|o| o.success));

        scheduler.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_degraded_clears_once_store_recovers() {
        let store = Arc::new(FlakyStore { failures: AtomicUsize::new(2), inner: MemoryResultStore::new() });
        let executor = Arc::new(ProbeExecutor::new(FakeProber::new(Duration::from_millis(10))));
        let scheduler = ProbeScheduler::new(executor, store.clone(), ProbeConfig::default());

        scheduler.start(config("8.8.8.8", 100, 50)).await.unwrap();

        // Cycles at 0 and 100 both fail to record
        tokio::time::sleep(Duration::from_millis(150)).await;
        let status = scheduler.status().await;
        assert_eq!(status.consecutive_store_failures, 2);
        assert!(status.is_degraded());

        // The cycle at 200 records again
        tokio::time::sleep(Duration::from_millis(100)).await;
        let status = scheduler.status().await;
        assert_eq!(status.state, SchedulerState::Running);
        assert_eq!(status.cycles_completed, 3);
        assert_eq!(status.consecutive_store_failures, 0);
        assert!(!status.is_degraded());
        assert_eq!(store.inner.len().await, 1);

        scheduler.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_five_second_cycle_scenario() {
        let (scheduler, store) = scheduler_with(FakeProber::new(Duration::from_millis(20)), ProbeConfig::default());

        scheduler.start(config("8.8.8.8", 5000, 1000)).await.unwrap();
        tokio::time::sleep(Duration::from_secs(12)).await;

        let count = store.query(Some("8.8.8.8"), DateTime::<Utc>::MIN_UTC, Utc::now()).await.unwrap().len();
        assert!((2..=3).contains(&count), "recorded {count} outcomes");

        scheduler.stop().await.unwrap();
        scheduler.shutdown().await;
        assert_eq!(scheduler.state(), SchedulerState::Idle);

        let settled = store.len().await;
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(store.len().await, settled);
    }
}
