use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Outcome of a single probe, as recorded in the check store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CheckStatus {
    Up,
    Down,
}

impl CheckStatus {
    pub fn is_up(self) -> bool {
        matches!(self, CheckStatus::Up)
    }
}

impl std::fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckStatus::Up => write!(f, "UP"),
            CheckStatus::Down => write!(f, "DOWN"),
        }
    }
}

/// One immutable probe result for one endpoint at one instant.
///
/// Append-only: records are never updated, and are deleted only when their
/// endpoint is deleted (cascade).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckRecord {
    pub endpoint_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub status: CheckStatus,

    /// HTTP status code; absent on transport-level failures.
    pub status_code: Option<u16>,

    /// Wall-clock milliseconds from request start to response or failure.
    pub response_time_ms: Option<u64>,

    /// Present only when the check classified as DOWN.
    pub error_message: Option<String>,
}

impl CheckRecord {
    pub fn new(endpoint_id: Uuid, status: CheckStatus) -> Self {
        Self {
            endpoint_id,
            timestamp: Utc::now(),
            status,
            status_code: None,
            response_time_ms: None,
            error_message: None,
        }
    }

    pub fn with_status_code(mut self, code: Option<u16>) -> Self {
        self.status_code = code;
        self
    }

    pub fn with_response_time(mut self, millis: u64) -> Self {
        self.response_time_ms = Some(millis);
        self
    }

    pub fn with_error(mut self, error: Option<String>) -> Self {
        self.error_message = error;
        self
    }
}

/// Summary of one full pass over the registered endpoints.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CycleSummary {
    pub checked: usize,
    pub up: usize,
    pub down: usize,

    /// Per-endpoint processing failures (store writes etc.), isolated so the
    /// rest of the cycle still runs.
    pub errors: Vec<String>,
}
