use std::sync::Arc;

use anyhow::Result;
use futures::StreamExt;
use tokio::sync::Mutex;

use super::prober::{Probe, ProbeOutcome};
use super::tracker::DowntimeTracker;
use super::types::{CheckRecord, CheckStatus, CycleSummary};
use crate::alerts::{AlertSink, format_alert};
use crate::database::Store;
use crate::database::models::Endpoint;

/// Check cycle runner: one `run_once` probes every registered endpoint,
/// persists the results, feeds the downtime tracker, and dispatches alerts.
///
/// The tracker map lives behind a mutex that only this runner locks; the
/// scheduler's no-overlap rule means there is never lock contention between
/// cycles, only between probes within one.
pub struct CheckCycleRunner {
    store: Arc<dyn Store>,
    prober: Arc<dyn Probe>,
    sink: Arc<dyn AlertSink>,
    tracker: Mutex<DowntimeTracker>,
    probe_concurrency: usize,
}

impl CheckCycleRunner {
    pub fn new(
        store: Arc<dyn Store>,
        prober: Arc<dyn Probe>,
        sink: Arc<dyn AlertSink>,
        alert_threshold: u32,
        probe_concurrency: usize,
    ) -> Self {
        Self {
            store,
            prober,
            sink,
            tracker: Mutex::new(DowntimeTracker::new(alert_threshold)),
            probe_concurrency: probe_concurrency.max(1),
        }
    }

    /// Run one full cycle over the current endpoint list.
    ///
    /// Probes run with bounded concurrency; each endpoint's persist → track →
    /// alert sequence runs as its probe completes, so a single endpoint's
    /// records are never reordered. A failure on one endpoint is recorded in
    /// the summary and does not abort the rest.
    pub async fn run_once(&self) -> Result<CycleSummary> {
        let endpoints = self.store.list_endpoints().await?;

        let mut summary = CycleSummary { checked: endpoints.len(), ..Default::default() };
        if endpoints.is_empty() {
            tracing::debug!("no endpoints registered, cycle is a no-op");
            return Ok(summary);
        }

        let mut probes = futures::stream::iter(endpoints.into_iter().map(|endpoint| {
            let prober = self.prober.clone();
            async move {
                let outcome = prober.check(&endpoint.url).await;
                (endpoint, outcome)
            }
        }))
        .buffer_unordered(self.probe_concurrency);

        while let Some((endpoint, outcome)) = probes.next().await {
            match self.process_outcome(&endpoint, outcome).await {
                Ok(CheckStatus::Up) => summary.up += 1,
                Ok(CheckStatus::Down) => summary.down += 1,
                Err(error) => {
                    tracing::error!("failed to process check for {}: {error:#}", endpoint.name);
                    summary.errors.push(format!("{}: {error:#}", endpoint.name));
                }
            }
        }

        Ok(summary)
    }

    async fn process_outcome(
        &self,
        endpoint: &Endpoint,
        outcome: ProbeOutcome,
    ) -> Result<CheckStatus> {
        let record = CheckRecord::new(endpoint.uuid, outcome.status)
            .with_status_code(outcome.status_code)
            .with_response_time(outcome.response_time_ms)
            .with_error(outcome.error_message);

        self.store.append_check(&record).await?;

        let event = self.tracker.lock().await.observe(endpoint, &record);

        if let Some(event) = event {
            let text = format_alert(&event);
            // At most one delivery attempt; failures never touch tracker state.
            if let Err(error) = self.sink.deliver(&text).await {
                tracing::warn!("alert delivery failed for {}: {error:#}", endpoint.name);
            }
        }

        Ok(record.status)
    }
}
