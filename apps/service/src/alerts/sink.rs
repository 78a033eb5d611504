use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::json;
use url::Url;

const DELIVERY_TIMEOUT_SECONDS: u64 = 10;

/// Outbound alert channel. Delivery is at-most-once: callers log failures
/// and move on, there is no retry.
#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn deliver(&self, text: &str) -> Result<()>;
}

/// Posts alerts to a chat-webhook-style endpoint as `{"text": ...}`.
pub struct WebhookSink {
    client: reqwest::Client,
    webhook_url: Url,
}

impl WebhookSink {
    pub fn new(webhook_url: &str) -> Result<Self> {
        let webhook_url = Url::parse(webhook_url).context("invalid alert webhook URL")?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DELIVERY_TIMEOUT_SECONDS))
            .build()?;

        Ok(Self { client, webhook_url })
    }
}

#[async_trait]
impl AlertSink for WebhookSink {
    async fn deliver(&self, text: &str) -> Result<()> {
        self.client
            .post(self.webhook_url.clone())
            .json(&json!({ "text": text }))
            .send()
            .await
            .context("alert webhook request failed")?
            .error_for_status()
            .context("alert webhook rejected the notification")?;

        Ok(())
    }
}

/// Fallback sink when no webhook is configured: alerts only reach the logs.
pub struct LogSink;

#[async_trait]
impl AlertSink for LogSink {
    async fn deliver(&self, text: &str) -> Result<()> {
        tracing::info!("alert (no webhook configured): {text}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn webhook_sink_rejects_malformed_urls() {
        assert!(WebhookSink::new("not a url").is_err());
        assert!(WebhookSink::new("https://hooks.example.com/T000/B000").is_ok());
    }
}
