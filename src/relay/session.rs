//! Per-task relay sessions.
//!
//! A session moves through `CONNECTING → STREAMING → {CLOSED, FAILED}`.
//! `open_session` performs the CONNECTING step and surfaces its failure to
//! the caller; the STREAMING pump then runs as its own task. The registry
//! entry is guard-scoped: it exists only between a successful stream-open
//! and the pump's exit, whichever way that exit happens.

use std::sync::Arc;

use futures_util::StreamExt;
use reqwest::header::ACCEPT;
use serde_json::Value;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::config::UpstreamConfig;
use crate::error::GatewayError;
use crate::relay::decoder::FrameDecoder;
use crate::relay::registry::{Connection, ConnectionGuard, ConnectionRegistry};
use crate::relay::webhook::WebhookForwarder;
use crate::tasks::correlator::{TaskCorrelator, TaskResult};

/// Downstream sink depth. Writes apply backpressure to the upstream read
/// once a subscriber falls this far behind.
const SINK_BUFFER: usize = 64;

/// A successfully opened session, handed to the subscriber.
pub struct SessionHandle {
    pub connection_id: String,
    /// Relayed payloads in upstream arrival order. The stream ends when the
    /// session closes.
    pub events: mpsc::Receiver<String>,
}

/// Opens and runs relay sessions against the upstream event stream.
#[derive(Clone)]
pub struct RelayService {
    client: reqwest::Client,
    upstream: UpstreamConfig,
    registry: Arc<ConnectionRegistry>,
    correlator: Arc<TaskCorrelator>,
    webhook: Arc<WebhookForwarder>,
}

impl RelayService {
    pub fn new(
        client: reqwest::Client,
        upstream: UpstreamConfig,
        registry: Arc<ConnectionRegistry>,
        correlator: Arc<TaskCorrelator>,
        webhook: Arc<WebhookForwarder>,
    ) -> Self {
        Self {
            client,
            upstream,
            registry,
            correlator,
            webhook,
        }
    }

    /// Open one relay session for `task_id`.
    ///
    /// Returns once the upstream stream is established; the relay pump then
    /// runs in the background until end-of-stream, a read error, or the
    /// subscriber going away. A connect failure or non-success status fails
    /// here, before any registry entry exists.
    pub async fn open_session(&self, task_id: &str) -> Result<SessionHandle, GatewayError> {
        let stream_url = self.upstream.stream_url();
        let response = self
            .client
            .get(&stream_url)
            .header(ACCEPT, "text/event-stream")
            .send()
            .await
            .map_err(|e| GatewayError::UpstreamConnectionFailure(e.to_string()))?;

        if !response.status().is_success() {
            return Err(GatewayError::UpstreamConnectionFailure(format!(
                "upstream stream returned {}",
                response.status()
            )));
        }

        let connection_id = Uuid::new_v4().to_string();
        let (sink, events) = mpsc::channel(SINK_BUFFER);
        let guard = self.registry.register(
            connection_id.clone(),
            Connection {
                task_id: task_id.to_string(),
                sink: sink.clone(),
            },
        );

        tracing::info!(
            connection_id = %connection_id,
            task_id = %task_id,
            "relay session streaming"
        );

        let pump = SessionPump {
            task_id: task_id.to_string(),
            correlator: self.correlator.clone(),
            webhook: self.webhook.clone(),
            sink,
        };
        tokio::spawn(pump.run(response, guard));

        Ok(SessionHandle {
            connection_id,
            events,
        })
    }

    /// Dispatch the actual task request to the backend.
    pub async fn dispatch(&self, task_id: &str, message: &str) -> Result<(), GatewayError> {
        let dispatch_url = self.upstream.dispatch_url();
        let body = serde_json::json!({ "taskId": task_id, "message": message });
        let response = self
            .client
            .post(&dispatch_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| GatewayError::UpstreamDispatchFailure(e.to_string()))?;

        if !response.status().is_success() {
            return Err(GatewayError::UpstreamDispatchFailure(format!(
                "backend rejected dispatch with {}",
                response.status()
            )));
        }
        Ok(())
    }
}

/// The STREAMING half of one session. Owns the guard, so the registry entry
/// is released however `run` exits.
struct SessionPump {
    task_id: String,
    correlator: Arc<TaskCorrelator>,
    webhook: Arc<WebhookForwarder>,
    sink: mpsc::Sender<String>,
}

impl SessionPump {
    async fn run(self, response: reqwest::Response, guard: ConnectionGuard) {
        let connection_id = guard.id().to_string();
        let mut decoder = FrameDecoder::new();
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    tracing::warn!(
                        connection_id = %connection_id,
                        task_id = %self.task_id,
                        error = %e,
                        "upstream read failed, session failed"
                    );
                    return;
                }
            };

            for payload in decoder.push(&chunk) {
                if !self.relay_event(&connection_id, payload).await {
                    tracing::debug!(
                        connection_id = %connection_id,
                        task_id = %self.task_id,
                        "subscriber gone, session closed"
                    );
                    return;
                }
            }
        }

        tracing::info!(
            connection_id = %connection_id,
            task_id = %self.task_id,
            "upstream end-of-stream, session closed"
        );
    }

    /// Handle one decoded payload: webhook fan-out, completion probe, and
    /// the order-preserving downstream write. Returns `false` once the
    /// subscriber is gone.
    async fn relay_event(&self, connection_id: &str, payload: String) -> bool {
        // outward delivery never blocks the relay on webhook latency
        if self.webhook.is_enabled() {
            let webhook = self.webhook.clone();
            let event = payload.clone();
            let connection_id = connection_id.to_string();
            let task_id = self.task_id.clone();
            tokio::spawn(async move {
                webhook.forward(&event, &connection_id, &task_id).await;
            });
        }

        match serde_json::from_str::<Value>(&payload) {
            Ok(event) => {
                if let Some(result) = completion_result(&event) {
                    self.correlator
                        .record(TaskResult::completed(self.task_id.clone(), result));
                }
            }
            Err(e) => {
                tracing::warn!(
                    connection_id = %connection_id,
                    task_id = %self.task_id,
                    error = %e,
                    "dropping malformed event payload"
                );
                return true;
            }
        }

        self.sink.send(payload).await.is_ok()
    }
}

/// Match the completion-signal shape: a notification of kind "message"
/// whose nested result carries `done = true`. Returns the result payload
/// with the marker stripped.
fn completion_result(event: &Value) -> Option<Value> {
    if event.get("kind").and_then(Value::as_str) != Some("message") {
        return None;
    }
    let result = event.get("result")?.as_object()?;
    if result.get("done").and_then(Value::as_bool) != Some(true) {
        return None;
    }
    let mut payload = result.clone();
    payload.remove("done");
    Some(Value::Object(payload))
}
