//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use relay_gateway::config::GatewayConfig;
use relay_gateway::http::HttpServer;
use relay_gateway::lifecycle::Shutdown;

/// Behavior knobs for the mock computation backend.
pub struct MockUpstreamOptions {
    /// Raw `data:`-framed chunks written to the event stream, in order.
    pub frames: Vec<String>,
    /// Pause before each frame.
    pub frame_delay: Duration,
    /// Status answered on `GET /events` (stream body only written on 200).
    pub stream_status: u16,
    /// Status answered on `POST /perform`.
    pub dispatch_status: u16,
}

impl Default for MockUpstreamOptions {
    fn default() -> Self {
        Self {
            frames: Vec::new(),
            frame_delay: Duration::from_millis(30),
            stream_status: 200,
            dispatch_status: 200,
        }
    }
}

/// A running mock backend plus its observed hit counters.
pub struct MockUpstream {
    pub addr: SocketAddr,
    pub stream_hits: Arc<AtomicU32>,
    pub dispatch_hits: Arc<AtomicU32>,
}

/// Start a mock computation backend serving the event stream and the
/// task-submission endpoint. The stream body is EOF-terminated: frames are
/// written with a delay between them, then the socket closes.
pub async fn start_mock_upstream(options: MockUpstreamOptions) -> MockUpstream {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let stream_hits = Arc::new(AtomicU32::new(0));
    let dispatch_hits = Arc::new(AtomicU32::new(0));

    let frames = Arc::new(options.frames);
    let frame_delay = options.frame_delay;
    let stream_status = options.stream_status;
    let dispatch_status = options.dispatch_status;
    let stream_counter = stream_hits.clone();
    let dispatch_counter = dispatch_hits.clone();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let frames = frames.clone();
                    let stream_counter = stream_counter.clone();
                    let dispatch_counter = dispatch_counter.clone();
                    tokio::spawn(async move {
                        let mut buf = vec![0u8; 4096];
                        let n = socket.read(&mut buf).await.unwrap_or(0);
                        let request = String::from_utf8_lossy(&buf[..n]).to_string();

                        if request.starts_with("GET /events") {
                            stream_counter.fetch_add(1, Ordering::SeqCst);
                            if stream_status != 200 {
                                let response = format!(
                                    "HTTP/1.1 {} Error\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
                                    stream_status
                                );
                                let _ = socket.write_all(response.as_bytes()).await;
                            } else {
                                let head = "HTTP/1.1 200 OK\r\nContent-Type: text/event-stream\r\nCache-Control: no-cache\r\nConnection: close\r\n\r\n";
                                let _ = socket.write_all(head.as_bytes()).await;
                                for frame in frames.iter() {
                                    tokio::time::sleep(frame_delay).await;
                                    if socket.write_all(frame.as_bytes()).await.is_err() {
                                        break;
                                    }
                                    let _ = socket.flush().await;
                                }
                            }
                            let _ = socket.shutdown().await;
                        } else if request.starts_with("POST /perform") {
                            dispatch_counter.fetch_add(1, Ordering::SeqCst);
                            let (status_line, body) = if dispatch_status == 200 {
                                ("200 OK", "{\"status\":\"accepted\"}")
                            } else {
                                ("503 Service Unavailable", "{\"error\":\"busy\"}")
                            };
                            let response = format!(
                                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                                status_line,
                                body.len(),
                                body
                            );
                            let _ = socket.write_all(response.as_bytes()).await;
                            let _ = socket.shutdown().await;
                        } else {
                            let response =
                                "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n";
                            let _ = socket.write_all(response.as_bytes()).await;
                            let _ = socket.shutdown().await;
                        }
                    });
                }
                Err(_) => break,
            }
        }
    });

    MockUpstream {
        addr,
        stream_hits,
        dispatch_hits,
    }
}

/// Gateway config pointed at a mock upstream, with test-friendly waits.
pub fn gateway_config(upstream_addr: SocketAddr) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.upstream.base_url = format!("http://{}", upstream_addr);
    config.wait.poll_interval_ms = 100;
    config.wait.deadline_ms = 10_000;
    config
}

/// Spawn the gateway on an ephemeral port; returns its address and the
/// shutdown coordinator keeping it alive.
pub async fn start_gateway(config: GatewayConfig) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let server = HttpServer::new(config);

    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });
    tokio::time::sleep(Duration::from_millis(100)).await;

    (addr, shutdown)
}

/// HTTP client for talking to the gateway under test.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .build()
        .expect("test client")
}

/// Fetch the gateway health snapshot.
#[allow(dead_code)]
pub async fn health_snapshot(client: &reqwest::Client, gateway: SocketAddr) -> serde_json::Value {
    client
        .get(format!("http://{}/health", gateway))
        .send()
        .await
        .expect("health reachable")
        .json()
        .await
        .expect("health is JSON")
}
