use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::{Mutex, watch};
use tokio::time::{MissedTickBehavior, interval};

use super::cycle::CheckCycleRunner;

/// Default seconds between check cycles.
pub const DEFAULT_CHECK_INTERVAL_SECONDS: u64 = 30;

/// Drives the cycle runner on a fixed period.
///
/// Constructed once at the composition root and handed around by `Arc`;
/// `start` is idempotent (compare-and-set on the running flag) so repeated
/// trigger calls never spawn a second loop. Overlap policy: if a cycle is
/// still in flight when the next tick fires, the tick is skipped with a
/// warning rather than run concurrently.
pub struct Scheduler {
    runner: Arc<CheckCycleRunner>,
    period: Duration,
    running: AtomicBool,
    cycle_in_flight: Arc<AtomicBool>,
    stop_tx: Mutex<Option<watch::Sender<bool>>>,
}

impl Scheduler {
    pub fn new(runner: Arc<CheckCycleRunner>, period: Duration) -> Self {
        Self {
            runner,
            period,
            running: AtomicBool::new(false),
            cycle_in_flight: Arc::new(AtomicBool::new(false)),
            stop_tx: Mutex::new(None),
        }
    }

    /// Start the periodic loop. Returns false if it was already running.
    pub async fn start(&self) -> bool {
        if self.running.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst).is_err() {
            tracing::debug!("scheduler start ignored: already running");
            return false;
        }

        let (tx, mut rx) = watch::channel(false);
        *self.stop_tx.lock().await = Some(tx);

        let runner = Arc::clone(&self.runner);
        let in_flight = Arc::clone(&self.cycle_in_flight);
        let period = self.period;

        tokio::spawn(async move {
            let mut timer = interval(period);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
            tracing::info!("scheduler started (period {period:?})");

            loop {
                tokio::select! {
                    _ = timer.tick() => spawn_cycle(&runner, &in_flight),
                    _ = rx.changed() => {
                        tracing::info!("scheduler stopped, no further cycles will start");
                        break;
                    }
                }
            }
        });

        true
    }

    /// Cancel future ticks without interrupting an in-flight cycle.
    /// Returns false if the scheduler was not running.
    pub async fn stop(&self) -> bool {
        if !self.running.swap(false, Ordering::SeqCst) {
            return false;
        }

        if let Some(tx) = self.stop_tx.lock().await.take() {
            let _ = tx.send(true);
        }
        true
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

fn spawn_cycle(runner: &Arc<CheckCycleRunner>, in_flight: &Arc<AtomicBool>) {
    if in_flight.swap(true, Ordering::SeqCst) {
        tracing::warn!("previous check cycle still running, skipping this tick");
        return;
    }

    let runner = Arc::clone(runner);
    let in_flight = Arc::clone(in_flight);
    tokio::spawn(async move {
        match runner.run_once().await {
            Ok(summary) => tracing::info!(
                checked = summary.checked,
                up = summary.up,
                down = summary.down,
                errors = summary.errors.len(),
                "check cycle complete"
            ),
            Err(error) => tracing::error!("check cycle failed: {error:#}"),
        }
        in_flight.store(false, Ordering::SeqCst);
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::alerts::LogSink;
    use crate::database::Store;
    use crate::monitoring::prober::{Probe, ProbeOutcome};
    use crate::monitoring::types::{CheckRecord, CheckStatus};

    struct AlwaysUpProbe;

    #[async_trait::async_trait]
    impl Probe for AlwaysUpProbe {
        async fn check(&self, _url: &str) -> ProbeOutcome {
            ProbeOutcome {
                status: CheckStatus::Up,
                status_code: Some(200),
                response_time_ms: 10,
                error_message: None,
            }
        }
    }

    struct EmptyStore;

    #[async_trait::async_trait]
    impl Store for EmptyStore {
        async fn list_endpoints(&self) -> anyhow::Result<Vec<crate::database::models::Endpoint>> {
            Ok(Vec::new())
        }

        async fn get_endpoint(
            &self,
            _uuid: uuid::Uuid,
        ) -> anyhow::Result<Option<crate::database::models::Endpoint>> {
            Ok(None)
        }

        async fn create_endpoint(
            &self,
            _endpoint: &crate::database::models::Endpoint,
        ) -> anyhow::Result<i64> {
            Ok(0)
        }

        async fn delete_endpoint(&self, _uuid: uuid::Uuid) -> anyhow::Result<()> {
            Ok(())
        }

        async fn append_check(&self, _record: &CheckRecord) -> anyhow::Result<i64> {
            Ok(0)
        }

        async fn checks_in_range(
            &self,
            _endpoint_uuid: uuid::Uuid,
            _from: chrono::DateTime<chrono::Utc>,
            _to: chrono::DateTime<chrono::Utc>,
        ) -> anyhow::Result<Vec<CheckRecord>> {
            Ok(Vec::new())
        }

        async fn latest_check(
            &self,
            _endpoint_uuid: uuid::Uuid,
        ) -> anyhow::Result<Option<CheckRecord>> {
            Ok(None)
        }
    }

    fn test_scheduler() -> Scheduler {
        let runner = Arc::new(CheckCycleRunner::new(
            Arc::new(EmptyStore),
            Arc::new(AlwaysUpProbe),
            Arc::new(LogSink),
            3,
            4,
        ));
        Scheduler::new(runner, Duration::from_secs(30))
    }

    #[tokio::test]
    async fn start_is_idempotent() {
        let scheduler = test_scheduler();

        assert!(scheduler.start().await);
        assert!(!scheduler.start().await);
        assert!(scheduler.is_running());

        assert!(scheduler.stop().await);
        assert!(!scheduler.is_running());
    }

    #[tokio::test]
    async fn stop_without_start_reports_not_running() {
        let scheduler = test_scheduler();
        assert!(!scheduler.stop().await);
    }

    #[tokio::test]
    async fn scheduler_can_restart_after_stop() {
        let scheduler = test_scheduler();

        assert!(scheduler.start().await);
        assert!(scheduler.stop().await);
        assert!(scheduler.start().await);
        assert!(scheduler.is_running());
        scheduler.stop().await;
    }
}
