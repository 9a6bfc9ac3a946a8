//! Task Relay Gateway
//!
//! Bridges a synchronous request/response client to an asynchronous,
//! streaming computation backend.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────────────────────────────┐
//!                    │                  RELAY GATEWAY                    │
//!   POST /api/perform│  ┌──────────┐   ┌───────────────┐                │
//!   ─────────────────┼─▶│   http   │──▶│ relay session │──▶ upstream    │
//!                    │  │  server  │   │ (per task)    │◀── event stream│
//!   GET /sse         │  └────┬─────┘   └───┬───────┬───┘                │
//!   ─────────────────┼───────┘             │       │                    │
//!                    │            ┌────────▼──┐ ┌──▼────────┐           │
//!   TaskResult JSON  │            │   tasks   │ │  webhook  │──▶ sink   │
//!   ◀────────────────┼────────────│correlator │ │ forwarder │           │
//!                    │            └───────────┘ └───────────┘           │
//!                    │  ┌────────────────────────────────────────────┐  │
//!                    │  │ config · health · observability · lifecycle│  │
//!                    │  └────────────────────────────────────────────┘  │
//!                    └──────────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;

use relay_gateway::config::{self, GatewayConfig};
use relay_gateway::http::HttpServer;
use relay_gateway::lifecycle::{shutdown, Shutdown};
use relay_gateway::observability::logging;

#[derive(Debug, Parser)]
#[command(name = "relay-gateway", about = "Sync-to-streaming task relay gateway")]
struct Cli {
    /// Path to a TOML configuration file. Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => GatewayConfig::default(),
    };

    logging::init(&config.observability.log_level);

    tracing::info!("relay-gateway v0.1.0 starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.base_url,
        webhook_enabled = config.webhook.url.is_some(),
        deadline_ms = config.wait.deadline_ms,
        "Configuration loaded"
    );

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let coordinator = Shutdown::new();
    let server_shutdown = coordinator.subscribe();
    tokio::spawn(shutdown::listen_for_ctrl_c(coordinator));

    let server = HttpServer::new(config);
    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
