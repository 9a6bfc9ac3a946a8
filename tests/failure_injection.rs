//! Failure injection tests for the relay gateway.

use std::sync::atomic::Ordering;
use std::time::Duration;

use serde_json::json;

mod common;
use common::{gateway_config, health_snapshot, start_gateway, start_mock_upstream, MockUpstreamOptions};

fn frame(payload: &str) -> String {
    format!("data: {}\n\n", payload)
}

#[tokio::test]
async fn perform_times_out_when_no_completion_arrives() {
    let upstream = start_mock_upstream(MockUpstreamOptions {
        frames: vec![frame(r#"{"kind":"progress","step":1}"#)],
        ..MockUpstreamOptions::default()
    })
    .await;

    let mut config = gateway_config(upstream.addr);
    config.wait.poll_interval_ms = 100;
    config.wait.deadline_ms = 1_000;
    let (gateway, shutdown) = start_gateway(config).await;

    let client = common::client();
    let response = client
        .post(format!("http://{}/api/perform", gateway))
        .json(&json!({ "message": "never finishes" }))
        .send()
        .await
        .expect("gateway reachable");

    assert_eq!(response.status(), 408);
    let body: serde_json::Value = response.json().await.expect("error is JSON");
    assert_eq!(body["error"], "Task timeout");

    // the timed-out task leaves nothing retrievable behind
    tokio::time::sleep(Duration::from_millis(300)).await;
    let health = health_snapshot(&client, gateway).await;
    assert_eq!(health["pendingTasks"], 0);
    assert_eq!(health["connections"], 0);

    shutdown.trigger();
}

#[tokio::test]
async fn perform_fails_when_the_upstream_is_unreachable() {
    // nothing listens on the upstream address
    let mut config = gateway_config("127.0.0.1:1".parse().unwrap());
    config.upstream.connect_timeout_secs = 1;
    let (gateway, shutdown) = start_gateway(config).await;

    let client = common::client();
    let response = client
        .post(format!("http://{}/api/perform", gateway))
        .json(&json!({ "message": "nobody home" }))
        .send()
        .await
        .expect("gateway reachable");

    assert_eq!(response.status(), 500);
    let body: serde_json::Value = response.json().await.expect("error is JSON");
    assert_eq!(body["error"], "Failed to perform action");

    // the session never registered, so nothing leaked
    let health = health_snapshot(&client, gateway).await;
    assert_eq!(health["connections"], 0);

    shutdown.trigger();
}

#[tokio::test]
async fn perform_fails_on_a_non_success_stream_status() {
    let upstream = start_mock_upstream(MockUpstreamOptions {
        stream_status: 500,
        ..MockUpstreamOptions::default()
    })
    .await;
    let (gateway, shutdown) = start_gateway(gateway_config(upstream.addr)).await;

    let client = common::client();
    let response = client
        .post(format!("http://{}/api/perform", gateway))
        .json(&json!({ "message": "bad stream" }))
        .send()
        .await
        .expect("gateway reachable");

    assert_eq!(response.status(), 500);
    let body: serde_json::Value = response.json().await.expect("error is JSON");
    assert_eq!(body["error"], "Failed to perform action");

    // connection failure precedes dispatch
    assert_eq!(upstream.stream_hits.load(Ordering::SeqCst), 1);
    assert_eq!(upstream.dispatch_hits.load(Ordering::SeqCst), 0);

    let health = health_snapshot(&client, gateway).await;
    assert_eq!(health["connections"], 0);

    shutdown.trigger();
}

#[tokio::test]
async fn perform_fails_when_dispatch_is_rejected() {
    let upstream = start_mock_upstream(MockUpstreamOptions {
        dispatch_status: 503,
        ..MockUpstreamOptions::default()
    })
    .await;
    let (gateway, shutdown) = start_gateway(gateway_config(upstream.addr)).await;

    let client = common::client();
    let response = client
        .post(format!("http://{}/api/perform", gateway))
        .json(&json!({ "message": "rejected" }))
        .send()
        .await
        .expect("gateway reachable");

    assert_eq!(response.status(), 500);
    let body: serde_json::Value = response.json().await.expect("error is JSON");
    assert_eq!(body["error"], "Failed to perform action");
    assert_eq!(upstream.dispatch_hits.load(Ordering::SeqCst), 1);

    shutdown.trigger();
}

#[tokio::test]
async fn an_unreachable_webhook_leaves_the_relay_unaffected() {
    let upstream = start_mock_upstream(MockUpstreamOptions {
        frames: vec![
            frame(r#"{"kind":"progress","step":1}"#),
            frame(r#"{"kind":"message","result":{"done":true,"answer":42}}"#),
        ],
        ..MockUpstreamOptions::default()
    })
    .await;

    let mut config = gateway_config(upstream.addr);
    // nothing listens here; every delivery fails and is swallowed
    config.webhook.url = Some("http://127.0.0.1:9/hook".to_string());
    let (gateway, shutdown) = start_gateway(config).await;

    let client = common::client();
    let response = client
        .post(format!("http://{}/api/perform", gateway))
        .json(&json!({ "message": "find docs" }))
        .send()
        .await
        .expect("gateway reachable");

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.expect("result is JSON");
    assert_eq!(body["status"], "completed");
    assert_eq!(body["result"], json!({"answer": 42}));

    shutdown.trigger();
}
