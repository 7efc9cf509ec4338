//! Tests for the webhook HTTP server
//!
//! Each test binds its own high port and talks to it with reqwest.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::*;
use crate::server::health::ReadinessState;
use crate::server::metrics::create_metrics;
use crate::server::shutdown::shutdown_channel;
use serde_json::{json, Value};
use std::time::Duration;

/// Wait for server to be ready with retry logic
///
/// Retries connection up to max_retries times with exponential backoff.
async fn wait_for_server(port: u16, max_retries: u32) -> reqwest::Client {
    let client = reqwest::Client::new();
    let mut delay = Duration::from_millis(10);

    for attempt in 1..=max_retries {
        match client
            .get(format!("http://127.0.0.1:{}/healthz", port))
            .timeout(Duration::from_millis(100))
            .send()
            .await
        {
            Ok(_) => return client,
            Err(_) if attempt < max_retries => {
                tokio::time::sleep(delay).await;
                delay = std::cmp::min(delay * 2, Duration::from_millis(200));
            }
            Err(e) => panic!("Server not ready after {} attempts: {}", max_retries, e),
        }
    }
    client
}

fn test_state(readiness: ReadinessState) -> ServerState {
    ServerState::new(readiness, create_metrics().unwrap())
}

#[tokio::test]
async fn test_healthz_returns_200() {
    let port = 18480;
    let (_controller, signal) = shutdown_channel();
    let state = test_state(ReadinessState::new());
    let server = tokio::spawn(async move { run_webhook_server(port, state, signal).await });

    let client = wait_for_server(port, 10).await;
    let response = client
        .get(format!("http://127.0.0.1:{}/healthz", port))
        .timeout(Duration::from_secs(5))
        .send()
        .await
        .expect("Failed to connect to server");

    assert_eq!(response.status(), 200, "Liveness probe should return 200");

    server.abort();
}

#[tokio::test]
async fn test_readyz_follows_readiness_state() {
    let port = 18481;
    let readiness = ReadinessState::new();
    let (_controller, signal) = shutdown_channel();
    let state = test_state(readiness.clone());
    let server = tokio::spawn(async move { run_webhook_server(port, state, signal).await });

    let client = wait_for_server(port, 10).await;
    let url = format!("http://127.0.0.1:{}/readyz", port);

    let response = client.get(&url).send().await.unwrap();
    assert_eq!(response.status(), 200, "Should be ready once the listener is bound");
    assert!(readiness.is_ready());

    readiness.set_not_ready();
    let response = client.get(&url).send().await.unwrap();
    assert_eq!(response.status(), 503, "Should be 503 after set_not_ready()");

    readiness.set_ready();
    let response = client.get(&url).send().await.unwrap();
    assert_eq!(response.status(), 200, "Should be 200 again after set_ready()");

    server.abort();
}

#[tokio::test]
async fn test_bind_failure_returns_error_and_stays_not_ready() {
    let port = 18484;
    // Hold the port so the server cannot bind it
    let _occupied = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .expect("port should be free for the test");

    let readiness = ReadinessState::new();
    let (_controller, signal) = shutdown_channel();
    let state = test_state(readiness.clone());

    let result = tokio::time::timeout(
        Duration::from_secs(5),
        run_webhook_server(port, state, signal),
    )
    .await
    .expect("bind failure should return promptly");

    assert!(result.is_err(), "bind on a taken port should fail");
    assert!(!readiness.is_ready(), "should not report ready without a listener");
}

#[tokio::test]
async fn test_convert_endpoint_round_trip() {
    let port = 18482;
    let (_controller, signal) = shutdown_channel();
    let state = test_state(ReadinessState::new());
    let server = tokio::spawn(async move { run_webhook_server(port, state, signal).await });

    let client = wait_for_server(port, 10).await;

    let review = json!({
        "apiVersion": "apiextensions.k8s.io/v1",
        "kind": "ConversionReview",
        "request": {
            "uid": "705ab4f5-6393-11e8-b7cc-42010a800002",
            "desiredAPIVersion": "rabbitmq.com/v1beta1",
            "objects": [{
                "apiVersion": "rabbitmq.com/v2",
                "kind": "RabbitmqCluster",
                "metadata": {"name": "hello-world", "namespace": "default"},
                "spec": {
                    "clientService": {"type": "LoadBalancer", "annotations": {"a": "b"}}
                }
            }]
        }
    });

    let response = client
        .post(format!("http://127.0.0.1:{}/convert", port))
        .json(&review)
        .timeout(Duration::from_secs(5))
        .send()
        .await
        .expect("Failed to call /convert");
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["apiVersion"], "apiextensions.k8s.io/v1");
    assert_eq!(body["kind"], "ConversionReview");
    assert_eq!(
        body["response"]["uid"],
        "705ab4f5-6393-11e8-b7cc-42010a800002"
    );
    assert_eq!(body["response"]["result"]["status"], "Success");
    let converted = &body["response"]["convertedObjects"][0];
    assert_eq!(converted["apiVersion"], "rabbitmq.com/v1beta1");
    assert_eq!(converted["spec"]["service"]["type"], "LoadBalancer");

    let metrics = client
        .get(format!("http://127.0.0.1:{}/metrics", port))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(metrics.contains(r#"rabbitmq_conversion_reviews_total{result="success"} 1"#));

    server.abort();
}

#[tokio::test]
async fn test_server_stops_on_shutdown_signal() {
    let port = 18483;
    let (controller, signal) = shutdown_channel();
    let state = test_state(ReadinessState::new());
    let server = tokio::spawn(async move { run_webhook_server(port, state, signal).await });

    wait_for_server(port, 10).await;
    controller.shutdown();

    let result = tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .expect("server should stop after shutdown")
        .expect("server task should not panic");
    assert!(result.is_ok());
}

#[test]
fn test_readiness_state_transitions() {
    let state = ReadinessState::new();
    assert!(!state.is_ready());

    state.set_ready();
    assert!(state.is_ready());

    // Clone should share state
    let cloned = state.clone();
    assert!(cloned.is_ready());

    cloned.set_not_ready();
    assert!(!state.is_ready());
}
