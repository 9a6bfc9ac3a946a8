//! Best-effort webhook forwarding.
//!
//! # Responsibilities
//! - Deliver one event payload to the configured destination
//! - Swallow every failure: network errors and non-success statuses are
//!   logged and discarded, never retried, never surfaced to the relay
//!
//! Forwarding is a no-op when no destination is configured.

use chrono::{DateTime, Utc};
use serde::Serialize;
use url::Url;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WebhookDelivery<'a> {
    event: &'a str,
    connection_id: &'a str,
    task_id: &'a str,
    forwarded_at: DateTime<Utc>,
}

/// Fire-and-forget delivery of relayed events to an external sink.
#[derive(Debug, Clone)]
pub struct WebhookForwarder {
    client: reqwest::Client,
    destination: Option<Url>,
}

impl WebhookForwarder {
    pub fn new(client: reqwest::Client, destination: Option<Url>) -> Self {
        Self { client, destination }
    }

    pub fn is_enabled(&self) -> bool {
        self.destination.is_some()
    }

    /// Deliver one event. Callers get no outcome: delivery is best-effort
    /// and failures must not affect the relay's own forwarding.
    pub async fn forward(&self, event: &str, connection_id: &str, task_id: &str) {
        let Some(destination) = &self.destination else {
            return;
        };

        let body = WebhookDelivery {
            event,
            connection_id,
            task_id,
            forwarded_at: Utc::now(),
        };

        match self.client.post(destination.clone()).json(&body).send().await {
            Ok(response) if !response.status().is_success() => {
                tracing::warn!(
                    connection_id = %connection_id,
                    task_id = %task_id,
                    status = %response.status(),
                    "webhook delivery rejected"
                );
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(
                    connection_id = %connection_id,
                    task_id = %task_id,
                    error = %e,
                    "webhook delivery failed"
                );
            }
        }
    }
}
