use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Response-time spread over one day, computed over checks that carried a
/// response time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ResponseTimeStats {
    pub min_ms: u64,
    pub avg_ms: f64,
    pub max_ms: u64,
}

/// One reporting-timezone hour of a day. Only hours with at least one check
/// are emitted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlyBucket {
    /// Hour of day in the reporting timezone, 0-23.
    pub hour: u32,
    pub total: u64,
    pub up: u64,
    pub down: u64,
    pub uptime_percent: f64,
    pub avg_response_time_ms: Option<f64>,
}

/// One DOWN record plus its computed recovery duration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Incident {
    pub timestamp: DateTime<Utc>,
    pub error_message: Option<String>,
    pub status_code: Option<u16>,
    pub response_time_ms: Option<u64>,

    /// "Xm Ys", "Ongoing" for a trailing outage, "~1m" when the window ends
    /// or checking gapped before a recovery was observed.
    pub duration: String,
}

/// Full detail for one (endpoint, reporting-timezone date) pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayDetail {
    pub endpoint_id: Uuid,
    pub date: NaiveDate,
    pub total: u64,
    pub up: u64,
    pub down: u64,
    pub uptime_percent: f64,
    pub response_time: Option<ResponseTimeStats>,
    pub hourly: Vec<HourlyBucket>,
    pub incidents: Vec<Incident>,
}

/// One calendar day of a multi-day rollup. `uptime_percent` is None on days
/// with no checks; a no-data day is never conflated with a 0% day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub total: u64,
    pub up: u64,
    pub down: u64,
    pub uptime_percent: Option<f64>,
    pub avg_response_time_ms: Option<f64>,
    pub first_error_message: Option<String>,
    pub first_error_code: Option<u16>,
}

/// Per-endpoint daily series over a date range.
#[derive(Debug, Clone, Serialize)]
pub struct EndpointDailySeries {
    pub endpoint_id: Uuid,
    pub endpoint_name: String,
    pub endpoint_url: String,
    pub days: Vec<DailySummary>,

    /// sum(up)/sum(total) over the whole range, never an average of the
    /// per-day percentages. None when the range holds no checks at all.
    pub overall_uptime_percent: Option<f64>,
}
