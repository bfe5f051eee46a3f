/// Operator notifications.
///
/// Every state change the operator cares about (server down, host
/// unreachable, restart succeeded/failed) is pushed to a webhook as an
/// embed. Notifications are strictly fire-and-forget: delivery failures
/// are logged and never influence the monitoring loop, and an unset
/// webhook silently disables the sink.
use crate::error::{Error, Result};
use async_trait::async_trait;
use serde_json::json;

/// Embed color for alarms and failures.
pub const COLOR_ALERT: u32 = 0xFF0000;
/// Embed color for successful restarts.
pub const COLOR_SUCCESS: u32 = 0x00FF00;

/// Fire-and-forget operator notification sink.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Delivers one notification. Implementations absorb their own
    /// failures; callers never react to the outcome.
    async fn notify(&self, title: &str, body: &str, color: u32);
}

/// Discord-compatible webhook sink.
///
/// Posts `{"embeds": [{"title", "description", "color"}]}` to the
/// configured URL. Constructed with `None` it is a no-op.
pub struct WebhookNotifier {
    http: reqwest::Client,
    url: Option<String>,
}

impl WebhookNotifier {
    /// Creates a notifier for `url`; `None` or an empty string disables
    /// delivery.
    pub fn new(url: Option<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| Error::Other(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            http,
            url: url.filter(|u| !u.is_empty()),
        })
    }

    async fn deliver(&self, url: &str, title: &str, body: &str, color: u32) -> Result<()> {
        let payload = json!({
            "embeds": [{
                "title": title,
                "description": body,
                "color": color,
            }]
        });

        let response = self
            .http
            .post(url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| Error::Notification(format!("webhook request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::Notification(format!(
                "webhook returned status {}",
                response.status()
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl NotificationSink for WebhookNotifier {
    async fn notify(&self, title: &str, body: &str, color: u32) {
        let Some(url) = self.url.as_deref() else {
            tracing::debug!(title, "No webhook configured, dropping notification");
            return;
        };

        if let Err(e) = self.deliver(url, title, body, color).await {
            tracing::warn!(title, error = %e, "Failed to deliver notification");
        }
    }
}
