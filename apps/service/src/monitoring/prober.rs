use std::error::Error as StdError;
use std::fmt;
use std::io;
use std::time::{Duration, Instant};

use anyhow::Result;

use super::types::CheckStatus;

/// Default probe timeout in seconds.
pub const PROBE_TIMEOUT_SECONDS: u64 = 30;

/// Transport-level probe failure, classified into a tagged variant so the
/// operator-facing message is decided in exactly one place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeFailure {
    Timeout,
    Dns,
    ConnectionRefused,
    Tls,
    Unreachable,
    Other(String),
}

impl fmt::Display for ProbeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeFailure::Timeout => write!(f, "Request timed out"),
            ProbeFailure::Dns => write!(f, "DNS resolution failed"),
            ProbeFailure::ConnectionRefused => write!(f, "Connection refused"),
            ProbeFailure::Tls => write!(f, "TLS handshake or certificate error"),
            ProbeFailure::Unreachable => write!(f, "Network unreachable"),
            ProbeFailure::Other(message) => write!(f, "Request failed: {message}"),
        }
    }
}

/// Result of probing one URL once. Probes never error: transport failures are
/// classified outcomes, not propagated errors.
#[derive(Debug, Clone)]
pub struct ProbeOutcome {
    pub status: CheckStatus,
    pub status_code: Option<u16>,
    pub response_time_ms: u64,
    pub error_message: Option<String>,
}

/// Probe trait so the cycle runner can be exercised without the network.
#[async_trait::async_trait]
pub trait Probe: Send + Sync {
    async fn check(&self, url: &str) -> ProbeOutcome;
}

/// HTTP prober: one GET per check, fixed timeout.
pub struct HttpProber {
    client: reqwest::Client,
}

impl HttpProber {
    pub fn new(timeout_seconds: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl Probe for HttpProber {
    async fn check(&self, url: &str) -> ProbeOutcome {
        let start = Instant::now();

        match self.client.get(url).send().await {
            Ok(response) => {
                let response_time_ms = start.elapsed().as_millis() as u64;
                let code = response.status().as_u16();
                let status = classify_status_code(code);
                let error_message = status_error_message(code);

                ProbeOutcome {
                    status,
                    status_code: Some(code),
                    response_time_ms,
                    error_message,
                }
            }
            Err(error) => {
                // Time-to-failure still counts as the response time.
                let response_time_ms = start.elapsed().as_millis() as u64;
                let failure = classify_transport_error(&error);

                ProbeOutcome {
                    status: CheckStatus::Down,
                    status_code: None,
                    response_time_ms,
                    error_message: Some(failure.to_string()),
                }
            }
        }
    }
}

/// 2xx/3xx/4xx count as the service answering; only 5xx is downtime.
pub fn classify_status_code(code: u16) -> CheckStatus {
    if (200..500).contains(&code) { CheckStatus::Up } else { CheckStatus::Down }
}

/// Error text for a DOWN classification that still carried an HTTP response.
/// Sub-200 codes are not server errors, they just fail the UP range.
fn status_error_message(code: u16) -> Option<String> {
    match classify_status_code(code) {
        CheckStatus::Up => None,
        CheckStatus::Down if code >= 500 => Some(format!("HTTP {code} server error")),
        CheckStatus::Down => Some(format!("HTTP {code} response")),
    }
}

/// Map a reqwest transport error onto a [`ProbeFailure`] variant by walking
/// the source chain for io-level error kinds, with a string fallback for the
/// resolver and TLS layers which surface no typed cause.
pub fn classify_transport_error(error: &reqwest::Error) -> ProbeFailure {
    if error.is_timeout() {
        return ProbeFailure::Timeout;
    }

    let mut source: Option<&(dyn StdError + 'static)> = error.source();
    while let Some(cause) = source {
        if let Some(io_error) = cause.downcast_ref::<io::Error>() {
            match io_error.kind() {
                io::ErrorKind::ConnectionRefused => return ProbeFailure::ConnectionRefused,
                io::ErrorKind::TimedOut => return ProbeFailure::Timeout,
                io::ErrorKind::HostUnreachable | io::ErrorKind::NetworkUnreachable => {
                    return ProbeFailure::Unreachable;
                }
                _ => {}
            }
        }

        let text = cause.to_string();
        if text.contains("dns error") || text.contains("failed to lookup address") {
            return ProbeFailure::Dns;
        }
        if text.contains("certificate") || text.contains("tls") || text.contains("handshake") {
            return ProbeFailure::Tls;
        }

        source = cause.source();
    }

    ProbeFailure::Other(error.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_below_500_are_up() {
        assert_eq!(classify_status_code(200), CheckStatus::Up);
        assert_eq!(classify_status_code(204), CheckStatus::Up);
        assert_eq!(classify_status_code(301), CheckStatus::Up);
        assert_eq!(classify_status_code(404), CheckStatus::Up);
        assert_eq!(classify_status_code(499), CheckStatus::Up);
    }

    #[test]
    fn server_errors_are_down() {
        assert_eq!(classify_status_code(500), CheckStatus::Down);
        assert_eq!(classify_status_code(503), CheckStatus::Down);
        assert_eq!(classify_status_code(599), CheckStatus::Down);
    }

    #[test]
    fn error_message_wording_matches_the_status_class() {
        assert_eq!(status_error_message(200), None);
        assert_eq!(status_error_message(404), None);
        assert_eq!(status_error_message(503).as_deref(), Some("HTTP 503 server error"));
        // 1xx classifies DOWN but is not a server error.
        assert_eq!(status_error_message(103).as_deref(), Some("HTTP 103 response"));
    }

    #[test]
    fn failure_messages_are_distinct() {
        let variants = [
            ProbeFailure::Timeout,
            ProbeFailure::Dns,
            ProbeFailure::ConnectionRefused,
            ProbeFailure::Tls,
            ProbeFailure::Unreachable,
            ProbeFailure::Other("boom".to_string()),
        ];

        let messages: Vec<String> = variants.iter().map(ToString::to_string).collect();
        for (i, a) in messages.iter().enumerate() {
            for b in messages.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }
}
