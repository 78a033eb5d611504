use chrono::Duration;

use crate::monitoring::tracker::AlertEvent;

/// Render a tracker event into the notification text posted to the webhook.
pub fn format_alert(event: &AlertEvent) -> String {
    match event {
        AlertEvent::Down {
            endpoint_name,
            endpoint_url,
            elapsed_minutes,
            first_failure_at,
            status_code,
            error_message,
        } => {
            let mut text = format!(
                "🔴 {endpoint_name} is DOWN ({endpoint_url})\nFailing for ~{elapsed_minutes} min (since {})",
                first_failure_at.format("%Y-%m-%d %H:%M:%S UTC")
            );
            if let Some(code) = status_code {
                text.push_str(&format!("\nHTTP status: {code}"));
            }
            if let Some(error) = error_message {
                text.push_str(&format!("\nError: {error}"));
            }
            text
        }
        AlertEvent::Recovered { endpoint_name, endpoint_url, downtime } => {
            format!(
                "🟢 {endpoint_name} has RECOVERED ({endpoint_url})\nDowntime: {}",
                format_duration(*downtime)
            )
        }
    }
}

/// "Xm Ys" with the minutes component omitted when zero, e.g. "45s".
pub fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.num_seconds().max(0);
    let minutes = total_seconds / 60;
    let seconds = total_seconds % 60;

    if minutes == 0 { format!("{seconds}s") } else { format!("{minutes}m {seconds}s") }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn duration_under_a_minute_drops_minutes() {
        assert_eq!(format_duration(Duration::seconds(45)), "45s");
        assert_eq!(format_duration(Duration::seconds(0)), "0s");
    }

    #[test]
    fn duration_over_a_minute_keeps_both_parts() {
        assert_eq!(format_duration(Duration::seconds(125)), "2m 5s");
        assert_eq!(format_duration(Duration::seconds(60)), "1m 0s");
    }

    #[test]
    fn downtime_alert_mentions_endpoint_and_error() {
        let event = AlertEvent::Down {
            endpoint_name: "api".to_string(),
            endpoint_url: "https://api.example.com".to_string(),
            elapsed_minutes: 2,
            first_failure_at: Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
            status_code: Some(503),
            error_message: Some("HTTP 503 server error".to_string()),
        };

        let text = format_alert(&event);
        assert!(text.contains("api"));
        assert!(text.contains("https://api.example.com"));
        assert!(text.contains("503"));
        assert!(text.contains("DOWN"));
    }

    #[test]
    fn recovery_alert_mentions_downtime_duration() {
        let event = AlertEvent::Recovered {
            endpoint_name: "api".to_string(),
            endpoint_url: "https://api.example.com".to_string(),
            downtime: Duration::seconds(95),
        };

        let text = format_alert(&event);
        assert!(text.contains("RECOVERED"));
        assert!(text.contains("1m 35s"));
    }

    #[test]
    fn transport_failure_alert_omits_http_status_line() {
        let event = AlertEvent::Down {
            endpoint_name: "api".to_string(),
            endpoint_url: "https://api.example.com".to_string(),
            elapsed_minutes: 1,
            first_failure_at: Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
            status_code: None,
            error_message: Some("Connection refused".to_string()),
        };

        let text = format_alert(&event);
        assert!(!text.contains("HTTP status"));
        assert!(text.contains("Connection refused"));
    }
}
