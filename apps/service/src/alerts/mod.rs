/// Outbound notifications: rendering tracker events into text and delivering
/// them to the webhook channel, fire-and-forget.
pub mod format;
pub mod sink;

pub use format::{format_alert, format_duration};
pub use sink::{AlertSink, LogSink, WebhookSink};
