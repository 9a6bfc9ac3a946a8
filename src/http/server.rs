//! HTTP server setup and request handling.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, request ID)
//! - Bind server to listener, serve with graceful shutdown
//! - Run the task submission protocol (`POST /api/perform`)
//! - Expose the subscriber stream (`GET /sse`) and health (`GET /health`)

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::sse::{Event, Sse},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use url::Url;
use uuid::Uuid;

use crate::config::{GatewayConfig, WaitConfig};
use crate::error::GatewayError;
use crate::health::HealthReporter;
use crate::relay::registry::ConnectionRegistry;
use crate::relay::session::{RelayService, SessionHandle};
use crate::relay::webhook::WebhookForwarder;
use crate::tasks::correlator::TaskCorrelator;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub relay: RelayService,
    pub correlator: Arc<TaskCorrelator>,
    pub health: HealthReporter,
    pub wait: WaitConfig,
}

/// HTTP server for the relay gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: GatewayConfig) -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.upstream.connect_timeout_secs))
            .build()
            .expect("failed to build HTTP client");

        let webhook_url = config.webhook.url.as_deref().and_then(|raw| match Url::parse(raw) {
            Ok(url) => Some(url),
            Err(e) => {
                tracing::warn!(url = %raw, error = %e, "ignoring invalid webhook URL");
                None
            }
        });

        let registry = Arc::new(ConnectionRegistry::new());
        let correlator = Arc::new(TaskCorrelator::new(config.wait.deadline()));
        let webhook = Arc::new(WebhookForwarder::new(client.clone(), webhook_url));
        let relay = RelayService::new(
            client,
            config.upstream.clone(),
            registry.clone(),
            correlator.clone(),
            webhook,
        );
        let health = HealthReporter::new(registry, correlator.clone());

        let state = AppState {
            relay,
            correlator,
            health,
            wait: config.wait.clone(),
        };

        let router = Self::build_router(state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/api/perform", post(perform_handler))
            .route("/sse", get(sse_handler))
            .route("/health", get(health_handler))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(TraceLayer::new_for_http()),
            )
    }

    /// Run the server until the shutdown signal fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}

#[derive(Debug, Deserialize)]
struct PerformRequest {
    #[serde(default)]
    message: Option<String>,
}

/// Task submission protocol: validate, open a relay session in-process,
/// dispatch to the backend, then wait for completion or deadline.
async fn perform_handler(
    State(state): State<AppState>,
    Json(request): Json<PerformRequest>,
) -> Response {
    // fail fast, before any task id exists or any upstream call is made
    let message = match request.message.as_deref().map(str::trim).filter(|m| !m.is_empty()) {
        Some(message) => message.to_string(),
        None => return GatewayError::MissingParameter("message").into_response(),
    };

    let task_id = Uuid::new_v4().to_string();
    tracing::info!(task_id = %task_id, "task submitted");

    let mut session = match state.relay.open_session(&task_id).await {
        Ok(session) => session,
        Err(e) => {
            tracing::error!(task_id = %task_id, error = %e, "failed to open relay session");
            return e.into_response();
        }
    };

    // no subscriber for this session; drain so the relay never backs up
    tokio::spawn(async move { while session.events.recv().await.is_some() {} });

    if let Err(e) = state.relay.dispatch(&task_id, &message).await {
        tracing::error!(task_id = %task_id, error = %e, "task dispatch failed");
        return e.into_response();
    }

    match state
        .correlator
        .await_result(&task_id, state.wait.deadline(), state.wait.poll_interval())
        .await
    {
        Some(result) => {
            tracing::info!(task_id = %task_id, "task completed");
            (StatusCode::OK, Json(result)).into_response()
        }
        None => {
            tracing::warn!(
                task_id = %task_id,
                deadline_ms = state.wait.deadline_ms,
                "task timed out"
            );
            GatewayError::TaskTimeout.into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
struct SseParams {
    #[serde(rename = "taskId")]
    task_id: Option<String>,
}

/// Subscriber stream: relays upstream events verbatim as SSE frames.
async fn sse_handler(State(state): State<AppState>, Query(params): Query<SseParams>) -> Response {
    let Some(task_id) = params.task_id.filter(|t| !t.is_empty()) else {
        return GatewayError::MissingParameter("taskId").into_response();
    };

    match state.relay.open_session(&task_id).await {
        Ok(SessionHandle { connection_id, events }) => {
            tracing::debug!(connection_id = %connection_id, task_id = %task_id, "subscriber attached");
            let stream = futures_util::stream::unfold(events, |mut events| async move {
                events
                    .recv()
                    .await
                    .map(|payload| (Ok::<_, Infallible>(Event::default().data(payload)), events))
            });
            Sse::new(stream).into_response()
        }
        Err(e) => {
            tracing::error!(task_id = %task_id, error = %e, "failed to open subscriber stream");
            e.into_response()
        }
    }
}

async fn health_handler(State(state): State<AppState>) -> Response {
    Json(state.health.snapshot()).into_response()
}
