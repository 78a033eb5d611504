use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use super::types::{CheckRecord, CheckStatus};
use crate::database::models::Endpoint;

/// Default consecutive-failure count at which a downtime alert fires.
pub const DEFAULT_ALERT_THRESHOLD: u32 = 3;

/// Alert emitted by the tracker when an endpoint crosses the failure
/// threshold or recovers from an alerted outage.
#[derive(Debug, Clone, PartialEq)]
pub enum AlertEvent {
    Down {
        endpoint_name: String,
        endpoint_url: String,
        elapsed_minutes: i64,
        first_failure_at: DateTime<Utc>,
        status_code: Option<u16>,
        error_message: Option<String>,
    },
    Recovered {
        endpoint_name: String,
        endpoint_url: String,
        downtime: Duration,
    },
}

#[derive(Debug, Default)]
struct EndpointState {
    consecutive_failures: u32,
    first_failure_at: Option<DateTime<Utc>>,
    alert_sent: bool,
    last_status: Option<CheckStatus>,
}

/// Per-endpoint downtime state machine.
///
/// State is in-process only and owned exclusively by the cycle runner; a
/// restart resets every streak to zero, so an outage spanning a restart
/// re-counts from the first post-restart failure. Known limitation.
pub struct DowntimeTracker {
    states: HashMap<Uuid, EndpointState>,
    threshold: u32,
}

impl DowntimeTracker {
    pub fn new(threshold: u32) -> Self {
        Self { states: HashMap::new(), threshold: threshold.max(1) }
    }

    /// Feed one check result through the state machine, returning at most one
    /// alert event per transition.
    pub fn observe(&mut self, endpoint: &Endpoint, record: &CheckRecord) -> Option<AlertEvent> {
        let state = self.states.entry(endpoint.uuid).or_default();

        let event = match record.status {
            CheckStatus::Down => {
                state.consecutive_failures += 1;
                let first_failure_at = *state.first_failure_at.get_or_insert(record.timestamp);

                if state.consecutive_failures >= self.threshold && !state.alert_sent {
                    state.alert_sent = true;
                    let elapsed = record.timestamp - first_failure_at;
                    Some(AlertEvent::Down {
                        endpoint_name: endpoint.name.clone(),
                        endpoint_url: endpoint.url.clone(),
                        elapsed_minutes: round_to_minutes(elapsed),
                        first_failure_at,
                        status_code: record.status_code,
                        error_message: record.error_message.clone(),
                    })
                } else {
                    None
                }
            }
            CheckStatus::Up => {
                let event = if state.last_status == Some(CheckStatus::Down) && state.alert_sent {
                    let downtime = state
                        .first_failure_at
                        .map(|first| record.timestamp - first)
                        .unwrap_or_else(Duration::zero);
                    Some(AlertEvent::Recovered {
                        endpoint_name: endpoint.name.clone(),
                        endpoint_url: endpoint.url.clone(),
                        downtime,
                    })
                } else {
                    None
                };

                state.consecutive_failures = 0;
                state.first_failure_at = None;
                state.alert_sent = false;
                event
            }
        };

        state.last_status = Some(record.status);
        event
    }

    #[cfg(test)]
    fn streak(&self, endpoint_id: Uuid) -> u32 {
        self.states.get(&endpoint_id).map_or(0, |s| s.consecutive_failures)
    }
}

fn round_to_minutes(elapsed: Duration) -> i64 {
    (elapsed.num_seconds() as f64 / 60.0).round() as i64
}
