//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the relay gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Upstream computation backend.
    pub upstream: UpstreamConfig,

    /// Outbound webhook forwarding.
    pub webhook: WebhookConfig,

    /// Completion-wait protocol settings.
    pub wait: WaitConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
        }
    }
}

/// Upstream backend configuration.
///
/// The backend exposes two endpoints: a server-push event stream and a
/// companion task-submission endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL of the backend (e.g., "http://127.0.0.1:3001").
    pub base_url: String,

    /// Path of the server-push event stream endpoint.
    pub stream_path: String,

    /// Path of the task-submission endpoint.
    pub dispatch_path: String,

    /// Connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:3001".to_string(),
            stream_path: "/events".to_string(),
            dispatch_path: "/perform".to_string(),
            connect_timeout_secs: 5,
        }
    }
}

impl UpstreamConfig {
    /// Full URL of the event stream endpoint.
    pub fn stream_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), self.stream_path)
    }

    /// Full URL of the task-submission endpoint.
    pub fn dispatch_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), self.dispatch_path)
    }
}

/// Webhook forwarding configuration.
///
/// Forwarding is disabled entirely when no URL is configured.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct WebhookConfig {
    /// Destination URL for best-effort event delivery.
    pub url: Option<String>,
}

/// Completion-wait protocol configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WaitConfig {
    /// Fallback re-check interval while waiting, in milliseconds.
    pub poll_interval_ms: u64,

    /// Overall deadline for a submitted task, in milliseconds.
    pub deadline_ms: u64,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1_000,
            deadline_ms: 300_000,
        }
    }
}

impl WaitConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn deadline(&self) -> Duration {
        Duration::from_millis(self.deadline_ms)
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
