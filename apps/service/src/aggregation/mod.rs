/// Aggregation queries: day detail, hourly buckets, incident lists, and
/// multi-day status rollups over the raw check records.
///
/// "Calendar day" always means a day in the fixed reporting timezone, both
/// for day detail and for the multi-day rollup. The offset is applied
/// explicitly (it is non-integer-hour in the +5:30 default), never taken
/// from the server's ambient timezone.
pub mod types;

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, TimeZone, Timelike, Utc};
use uuid::Uuid;

use crate::alerts::format_duration;
use crate::database::Store;
use crate::monitoring::types::CheckRecord;

pub use types::{
    DailySummary, DayDetail, EndpointDailySeries, HourlyBucket, Incident, ResponseTimeStats,
};

/// Default reporting timezone offset in minutes east of UTC (+5:30).
pub const DEFAULT_REPORTING_OFFSET_MINUTES: i32 = 330;

pub struct Aggregator {
    store: Arc<dyn Store>,
    reporting_offset: FixedOffset,
}

impl Aggregator {
    pub fn new(store: Arc<dyn Store>, offset_minutes: i32) -> Result<Self> {
        let reporting_offset = FixedOffset::east_opt(offset_minutes * 60)
            .context("reporting timezone offset out of range")?;
        Ok(Self { store, reporting_offset })
    }

    /// Today's calendar date in the reporting timezone.
    pub fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.reporting_offset).date_naive()
    }

    /// Full detail for one endpoint on one reporting-timezone date. `None`
    /// when the window holds no checks; callers surface that as an explicit
    /// no-data result, never as zero uptime.
    pub async fn day_detail(&self, endpoint_id: Uuid, date: NaiveDate) -> Result<Option<DayDetail>> {
        let (from, to) = day_window_utc(self.reporting_offset, date);
        let checks = self.store.checks_in_range(endpoint_id, from, to).await?;

        if checks.is_empty() {
            return Ok(None);
        }

        Ok(Some(build_day_detail(endpoint_id, date, self.reporting_offset, &checks)))
    }

    /// Per-endpoint daily series for the `days` reporting-timezone calendar
    /// days ending at `end_date` inclusive.
    pub async fn status_rollup(
        &self,
        end_date: NaiveDate,
        days: u32,
    ) -> Result<Vec<EndpointDailySeries>> {
        let days = days.max(1);
        let start_date = end_date - Duration::days(i64::from(days) - 1);
        let (from, _) = day_window_utc(self.reporting_offset, start_date);
        let (_, to) = day_window_utc(self.reporting_offset, end_date);

        let endpoints = self.store.list_endpoints().await?;
        let mut series = Vec::with_capacity(endpoints.len());

        for endpoint in endpoints {
            let checks = self.store.checks_in_range(endpoint.uuid, from, to).await?;
            series.push(EndpointDailySeries {
                endpoint_id: endpoint.uuid,
                endpoint_name: endpoint.name,
                endpoint_url: endpoint.url,
                days: build_daily_series(self.reporting_offset, start_date, days, &checks),
                overall_uptime_percent: overall_uptime(&checks),
            });
        }

        Ok(series)
    }
}

/// The UTC half-open window `[D 00:00 tz, D+1 00:00 tz)` for a reporting-tz
/// calendar date.
fn day_window_utc(offset: FixedOffset, date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let midnight = date.and_hms_opt(0, 0, 0).unwrap_or_default();
    // A fixed offset has no DST gaps, so local midnight always exists once.
    let start = match offset.from_local_datetime(&midnight) {
        chrono::LocalResult::Single(start) => start.with_timezone(&Utc),
        _ => Utc.from_utc_datetime(&midnight) - offset_duration(offset),
    };
    (start, start + Duration::days(1))
}

fn offset_duration(offset: FixedOffset) -> Duration {
    Duration::seconds(i64::from(offset.local_minus_utc()))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn build_day_detail(
    endpoint_id: Uuid,
    date: NaiveDate,
    offset: FixedOffset,
    checks: &[CheckRecord],
) -> DayDetail {
    let total = checks.len() as u64;
    let up = checks.iter().filter(|c| c.status.is_up()).count() as u64;
    let down = total - up;

    DayDetail {
        endpoint_id,
        date,
        total,
        up,
        down,
        uptime_percent: round2(up as f64 / total as f64 * 100.0),
        response_time: response_time_stats(checks),
        hourly: build_hourly_buckets(offset, checks),
        incidents: build_incidents(checks),
    }
}

fn response_time_stats(checks: &[CheckRecord]) -> Option<ResponseTimeStats> {
    let times: Vec<u64> = checks.iter().filter_map(|c| c.response_time_ms).collect();
    if times.is_empty() {
        return None;
    }

    let min_ms = *times.iter().min()?;
    let max_ms = *times.iter().max()?;
    let avg_ms = round2(times.iter().sum::<u64>() as f64 / times.len() as f64);
    Some(ResponseTimeStats { min_ms, avg_ms, max_ms })
}

/// 24 candidate buckets, sparse output: hours with no checks are omitted
/// entirely rather than emitted as zero rows.
fn build_hourly_buckets(offset: FixedOffset, checks: &[CheckRecord]) -> Vec<HourlyBucket> {
    struct Accum {
        total: u64,
        up: u64,
        time_sum: u64,
        time_count: u64,
    }

    let mut hours: [Option<Accum>; 24] = std::array::from_fn(|_| None);

    for check in checks {
        let hour = check.timestamp.with_timezone(&offset).hour() as usize;
        let accum = hours[hour].get_or_insert(Accum { total: 0, up: 0, time_sum: 0, time_count: 0 });
        accum.total += 1;
        if check.status.is_up() {
            accum.up += 1;
        }
        if let Some(ms) = check.response_time_ms {
            accum.time_sum += ms;
            accum.time_count += 1;
        }
    }

    hours
        .into_iter()
        .enumerate()
        .filter_map(|(hour, accum)| {
            let accum = accum?;
            Some(HourlyBucket {
                hour: hour as u32,
                total: accum.total,
                up: accum.up,
                down: accum.total - accum.up,
                uptime_percent: round2(accum.up as f64 / accum.total as f64 * 100.0),
                avg_response_time_ms: (accum.time_count > 0)
                    .then(|| round2(accum.time_sum as f64 / accum.time_count as f64)),
            })
        })
        .collect()
}

/// Every DOWN record becomes an incident. Duration is the gap to the next UP
/// in the ordered window; a trailing DOWN is "Ongoing"; a DOWN followed only
/// by more DOWNs (gap in checking or window ended mid-outage) is "~1m" — an
/// admission of incomplete information rather than false precision.
fn build_incidents(checks: &[CheckRecord]) -> Vec<Incident> {
    let mut incidents = Vec::new();

    for (index, check) in checks.iter().enumerate() {
        if check.status.is_up() {
            continue;
        }

        let next_up = checks[index + 1..].iter().find(|c| c.status.is_up());
        let duration = match next_up {
            Some(recovery) => format_duration(recovery.timestamp - check.timestamp),
            None if index == checks.len() - 1 => "Ongoing".to_string(),
            None => "~1m".to_string(),
        };

        incidents.push(Incident {
            timestamp: check.timestamp,
            error_message: check.error_message.clone(),
            status_code: check.status_code,
            response_time_ms: check.response_time_ms,
            duration,
        });
    }

    incidents
}

/// One summary per calendar day in the range, including empty days (with
/// `uptime_percent: None` so "no data" stays distinct from "0% up").
fn build_daily_series(
    offset: FixedOffset,
    start_date: NaiveDate,
    days: u32,
    checks: &[CheckRecord],
) -> Vec<DailySummary> {
    (0..days)
        .map(|offset_days| {
            let date = start_date + Duration::days(i64::from(offset_days));
            build_daily_summary(offset, date, checks)
        })
        .collect()
}

fn build_daily_summary(offset: FixedOffset, date: NaiveDate, checks: &[CheckRecord]) -> DailySummary {
    let day_checks: Vec<&CheckRecord> = checks
        .iter()
        .filter(|c| c.timestamp.with_timezone(&offset).date_naive() == date)
        .collect();

    let total = day_checks.len() as u64;
    let up = day_checks.iter().filter(|c| c.status.is_up()).count() as u64;

    let times: Vec<u64> = day_checks.iter().filter_map(|c| c.response_time_ms).collect();
    let avg_response_time_ms = (!times.is_empty())
        .then(|| round2(times.iter().sum::<u64>() as f64 / times.len() as f64));

    // Earliest DOWN of the day that carries an error; records arrive sorted.
    let first_error = day_checks
        .iter()
        .find(|c| !c.status.is_up() && c.error_message.is_some());

    DailySummary {
        date,
        total,
        up,
        down: total - up,
        uptime_percent: (total > 0).then(|| round2(up as f64 / total as f64 * 100.0)),
        avg_response_time_ms,
        first_error_message: first_error.and_then(|c| c.error_message.clone()),
        first_error_code: first_error.and_then(|c| c.status_code),
    }
}

/// sum(up)/sum(total) over the whole range; weighting by check count avoids
/// the bias an average of per-day percentages would pick up from low-traffic
/// days.
fn overall_uptime(checks: &[CheckRecord]) -> Option<f64> {
    if checks.is_empty() {
        return None;
    }

    let up = checks.iter().filter(|c| c.status.is_up()).count();
    Some(round2(up as f64 / checks.len() as f64 * 100.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    use crate::monitoring::types::CheckStatus;

    fn ist() -> FixedOffset {
        FixedOffset::east_opt(DEFAULT_REPORTING_OFFSET_MINUTES * 60).unwrap()
    }

    fn check_at(
        timestamp: DateTime<Utc>,
        status: CheckStatus,
        response_time_ms: Option<u64>,
    ) -> CheckRecord {
        CheckRecord {
            endpoint_id: Uuid::nil(),
            timestamp,
            status,
            status_code: match status {
                CheckStatus::Up => Some(200),
                CheckStatus::Down => Some(503),
            },
            response_time_ms,
            error_message: match status {
                CheckStatus::Up => None,
                CheckStatus::Down => Some("HTTP 503 server error".to_string()),
            },
        }
    }

    #[test]
    fn day_window_converts_ist_midnight_to_utc() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();
        let (from, to) = day_window_utc(ist(), date);

        // 2025-06-15 00:00 +05:30 == 2025-06-14 18:30 UTC.
        assert_eq!(from, Utc.with_ymd_and_hms(2025, 6, 14, 18, 30, 0).unwrap());
        assert_eq!(to, Utc.with_ymd_and_hms(2025, 6, 15, 18, 30, 0).unwrap());
    }

    #[test]
    fn boundary_checks_bucket_into_correct_ist_hours() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();
        let (from, to) = day_window_utc(ist(), date);

        // First and last minute of the IST day; both land on a different UTC
        // calendar day than part of the window.
        let checks = vec![
            check_at(from + Duration::seconds(30), CheckStatus::Up, Some(100)),
            check_at(to - Duration::seconds(30), CheckStatus::Up, Some(100)),
        ];

        let buckets = build_hourly_buckets(ist(), &checks);
        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].hour, 0);
        assert_eq!(buckets[1].hour, 23);
        assert_eq!(buckets[0].total, 1);
        assert_eq!(buckets[1].total, 1);
    }

    #[test]
    fn empty_hours_are_omitted_not_zero_filled() {
        let base = Utc.with_ymd_and_hms(2025, 6, 15, 6, 0, 0).unwrap();
        let checks = vec![
            check_at(base, CheckStatus::Up, Some(100)),
            check_at(base + Duration::minutes(5), CheckStatus::Down, Some(900)),
        ];

        let buckets = build_hourly_buckets(ist(), &checks);
        assert_eq!(buckets.len(), 1);
        // 06:00 UTC is 11:30 IST.
        assert_eq!(buckets[0].hour, 11);
        assert_eq!(buckets[0].total, 2);
        assert_eq!(buckets[0].up, 1);
        assert_eq!(buckets[0].uptime_percent, 50.0);
    }

    #[test]
    fn all_up_day_has_full_uptime_and_no_incidents() {
        let base = Utc.with_ymd_and_hms(2025, 6, 15, 6, 0, 0).unwrap();
        let checks: Vec<CheckRecord> = (0..10)
            .map(|i| check_at(base + Duration::minutes(i * 5), CheckStatus::Up, Some(100 + i as u64)))
            .collect();

        let date = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();
        let detail = build_day_detail(Uuid::nil(), date, ist(), &checks);

        assert_eq!(detail.uptime_percent, 100.0);
        assert_eq!(detail.down, 0);
        assert!(detail.incidents.is_empty());
        let stats = detail.response_time.unwrap();
        assert_eq!(stats.min_ms, 100);
        assert_eq!(stats.max_ms, 109);
    }

    #[test]
    fn day_detail_is_deterministic_for_identical_input() {
        let base = Utc.with_ymd_and_hms(2025, 6, 15, 6, 0, 0).unwrap();
        let checks = vec![
            check_at(base, CheckStatus::Up, Some(100)),
            check_at(base + Duration::minutes(1), CheckStatus::Down, Some(800)),
            check_at(base + Duration::minutes(2), CheckStatus::Up, Some(110)),
        ];

        let date = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();
        let a = build_day_detail(Uuid::nil(), date, ist(), &checks);
        let b = build_day_detail(Uuid::nil(), date, ist(), &checks);
        assert_eq!(a, b);
    }

    #[test]
    fn incident_duration_measures_gap_to_next_up() {
        let base = Utc.with_ymd_and_hms(2025, 6, 15, 6, 0, 0).unwrap();
        let checks = vec![
            check_at(base, CheckStatus::Down, Some(900)),
            check_at(base + Duration::seconds(30), CheckStatus::Down, Some(900)),
            check_at(base + Duration::seconds(105), CheckStatus::Up, Some(100)),
        ];

        let incidents = build_incidents(&checks);
        assert_eq!(incidents.len(), 2);
        assert_eq!(incidents[0].duration, "1m 45s");
        assert_eq!(incidents[1].duration, "1m 15s");
    }

    #[test]
    fn sub_minute_incident_duration_omits_minutes() {
        let base = Utc.with_ymd_and_hms(2025, 6, 15, 6, 0, 0).unwrap();
        let checks = vec![
            check_at(base, CheckStatus::Down, Some(900)),
            check_at(base + Duration::seconds(45), CheckStatus::Up, Some(100)),
        ];

        let incidents = build_incidents(&checks);
        assert_eq!(incidents[0].duration, "45s");
    }

    #[test]
    fn trailing_down_is_ongoing_and_gapped_down_is_approximate() {
        let base = Utc.with_ymd_and_hms(2025, 6, 15, 6, 0, 0).unwrap();
        let checks = vec![
            check_at(base, CheckStatus::Down, Some(900)),
            check_at(base + Duration::seconds(30), CheckStatus::Down, Some(900)),
        ];

        let incidents = build_incidents(&checks);
        assert_eq!(incidents.len(), 2);
        // No later UP and not the last check: incomplete information.
        assert_eq!(incidents[0].duration, "~1m");
        // The chronologically last check of the window is still failing.
        assert_eq!(incidents[1].duration, "Ongoing");
    }

    #[test]
    fn overall_uptime_weights_by_check_count_not_day_average() {
        let day1 = Utc.with_ymd_and_hms(2025, 6, 14, 6, 0, 0).unwrap();
        let day2 = Utc.with_ymd_and_hms(2025, 6, 15, 6, 0, 0).unwrap();

        // Day 1: 1 check, down. Day 2: 9 checks, all up.
        let mut checks = vec![check_at(day1, CheckStatus::Down, Some(900))];
        for i in 0..9 {
            checks.push(check_at(day2 + Duration::minutes(i * 5), CheckStatus::Up, Some(100)));
        }

        let overall = overall_uptime(&checks).unwrap();
        assert_eq!(overall, 90.0);

        // The naive average of daily percentages (0% and 100%) would be 50.
        let start = NaiveDate::from_ymd_opt(2025, 6, 14).unwrap();
        let series = build_daily_series(ist(), start, 2, &checks);
        let naive_average: f64 =
            series.iter().filter_map(|d| d.uptime_percent).sum::<f64>() / 2.0;
        assert_eq!(naive_average, 50.0);
        assert_ne!(overall, naive_average);

        // And sum(up)/sum(total) over the series matches the overall figure.
        let up: u64 = series.iter().map(|d| d.up).sum();
        let total: u64 = series.iter().map(|d| d.total).sum();
        assert_eq!(round2(up as f64 / total as f64 * 100.0), overall);
    }

    #[test]
    fn empty_days_report_no_data_not_zero_uptime() {
        let day2 = Utc.with_ymd_and_hms(2025, 6, 15, 6, 0, 0).unwrap();
        let checks = vec![check_at(day2, CheckStatus::Up, Some(100))];

        let start = NaiveDate::from_ymd_opt(2025, 6, 14).unwrap();
        let series = build_daily_series(ist(), start, 2, &checks);

        assert_eq!(series[0].total, 0);
        assert_eq!(series[0].uptime_percent, None);
        assert_eq!(series[1].uptime_percent, Some(100.0));
    }

    #[test]
    fn daily_summary_reports_first_error_of_the_day() {
        let base = Utc.with_ymd_and_hms(2025, 6, 15, 6, 0, 0).unwrap();
        let mut first_down = check_at(base + Duration::minutes(10), CheckStatus::Down, Some(900));
        first_down.error_message = Some("Connection refused".to_string());
        first_down.status_code = None;
        let later_down = check_at(base + Duration::minutes(20), CheckStatus::Down, Some(900));

        let checks = vec![
            check_at(base, CheckStatus::Up, Some(100)),
            first_down,
            later_down,
        ];

        let date = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();
        let summary = build_daily_summary(ist(), date, &checks);

        assert_eq!(summary.first_error_message.as_deref(), Some("Connection refused"));
        assert_eq!(summary.first_error_code, None);
    }
}
