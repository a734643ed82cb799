//! Tests for health check and metrics endpoints.
//!
//! Health and metrics are process-wide registries shared by every test in
//! this binary, so assertions stick to structure and monotonic counters.

use axum::http::StatusCode;
use integration_tests::{fixtures, setup::TestContext};

/// Test /health endpoint returns proper structure
#[tokio::test]
async fn test_health_endpoint_structure() {
    let ctx = TestContext::new().await;
    let server = ctx.server();

    let response = server.get("/health").await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();

    let status = body["status"].as_str().unwrap_or("");
    assert!(
        status == "healthy" || status == "degraded" || status == "unhealthy",
        "Status should be 'healthy', 'degraded', or 'unhealthy', got '{}'",
        status
    );
    assert!(body["webhook_healthy"].is_boolean());
    assert!(body["pending_cache_writable"].is_boolean());
    assert_eq!(body["stored_events"], 0);

    let names: Vec<&str> = body["components"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["webhook", "pending_cache"]);
}

/// Test /health reports the store size
#[tokio::test]
async fn test_health_counts_stored_events() {
    let ctx = TestContext::new().await;
    let server = ctx.server();

    server
        .post("/tracking")
        .json(&fixtures::tracking_event("page_view"))
        .await
        .assert_status_ok();

    let body: serde_json::Value = server.get("/health").await.json();
    assert_eq!(body["stored_events"], 1);
}

/// Test /health/ready endpoint
#[tokio::test]
async fn test_ready_endpoint() {
    let ctx = TestContext::new().await;
    let server = ctx.server();

    let response = server.get("/health/ready").await;

    // Ready endpoint returns 200 if ready, 503 if not
    let status = response.status_code();
    assert!(
        status == StatusCode::OK || status == StatusCode::SERVICE_UNAVAILABLE,
        "Ready endpoint should return 200 or 503, got {}",
        status
    );
}

/// Test /health/live endpoint always returns 200 when service is running
#[tokio::test]
async fn test_live_endpoint() {
    let ctx = TestContext::new().await;
    let server = ctx.server();

    server.get("/health/live").await.assert_status_ok();
}

/// Test /metrics exposes counters that move with traffic
#[tokio::test]
async fn test_metrics_snapshot() {
    let ctx = TestContext::new().await;
    let server = ctx.server();

    let before: serde_json::Value = server.get("/metrics").await.json();

    server
        .post("/tracking")
        .json(&fixtures::tracking_event("page_view"))
        .await
        .assert_status_ok();
    server
        .post("/leads")
        .json(&fixtures::invalid_lead())
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let after: serde_json::Value = server.get("/metrics").await.json();
    for counter in ["tracking_received", "leads_received", "leads_rejected"] {
        assert!(
            after[counter].as_u64().unwrap() > before[counter].as_u64().unwrap(),
            "{} should have increased",
            counter
        );
    }
    assert!(after["timestamp"].is_string());

    let buckets = after["delivery_latency_buckets"].as_array().unwrap();
    assert_eq!(buckets.len(), 11);
    assert_eq!(buckets[0]["le_ms"], 1);
    assert_eq!(buckets[10]["le_ms"], 10000);
}
