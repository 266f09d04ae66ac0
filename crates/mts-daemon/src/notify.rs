//! Operator notifications.
//!
//! A single webhook receives `{level, source, message}` JSON. Delivery is
//! best-effort: failures are logged at WARN and never surface to callers.

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, warn};

#[derive(Debug, Serialize)]
struct NotifyPayload<'a> {
    level: &'a str,
    source: &'a str,
    message: &'a str,
}

#[derive(Clone)]
pub struct Notifier {
    http: reqwest::Client,
    url: String,
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier").field("url", &"<REDACTED>").finish()
    }
}

impl Notifier {
    pub fn new(url: impl Into<String>) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()?;
        Ok(Self {
            http,
            url: url.into(),
        })
    }

    pub async fn send(&self, level: &str, source: &str, message: &str) {
        let payload = NotifyPayload {
            level,
            source,
            message,
        };
        match self.http.post(&self.url).json(&payload).send().await {
            Ok(resp) if resp.status().is_success() => {
                debug!(level, source, "notification delivered");
            }
            Ok(resp) => {
                warn!(level, source, status = %resp.status(), "notification rejected");
            }
            Err(err) => {
                warn!(level, source, error = %err, "notification delivery failed");
            }
        }
    }
}
