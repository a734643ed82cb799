//! Tests for the tracking endpoints.
//!
//! POST /tracking → TrackingStore → GET /tracking/analytics, DELETE /tracking

use api::TrackingConfig;
use axum::http::StatusCode;
use chrono::{Duration, Utc};
use integration_tests::{fixtures, setup::TestContext};
use studio_core::TrackingPayload;

#[tokio::test]
async fn test_record_returns_generated_id() {
    let ctx = TestContext::new().await;
    let server = ctx.server();

    let response = server.post("/tracking").json(&fixtures::tracking_event("page_view")).await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Tracking data received successfully");
    let id = body["id"].as_str().unwrap();
    assert!(id.starts_with("track_"), "unexpected id {}", id);
    assert_eq!(ctx.store.len(), 1);
}

#[tokio::test]
async fn test_same_event_twice_is_stored_twice() {
    let ctx = TestContext::new().await;
    let server = ctx.server();
    let event = fixtures::tracking_event("page_view");

    let first: serde_json::Value = server.post("/tracking").json(&event).await.json();
    let second: serde_json::Value = server.post("/tracking").json(&event).await.json();

    assert_ne!(first["id"], second["id"]);
    assert_eq!(ctx.store.len(), 2);
}

#[tokio::test]
async fn test_every_missing_field_is_reported() {
    let ctx = TestContext::new().await;
    let server = ctx.server();

    let response = server
        .post("/tracking")
        .json(&serde_json::json!({ "utm_source": 42 }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Invalid tracking data");

    let details = body["details"].as_array().unwrap();
    let fields: Vec<&str> = details.iter().map(|d| d["field"].as_str().unwrap()).collect();
    for field in ["event_type", "timestamp", "page_url", "referrer", "user_agent", "session_id", "utm_source"] {
        assert!(fields.contains(&field), "missing issue for {}", field);
    }
    let utm = details.iter().find(|d| d["field"] == "utm_source").unwrap();
    assert_eq!(utm["message"], "Expected string, received number");
    assert!(ctx.store.is_empty());
}

#[tokio::test]
async fn test_empty_referrer_is_allowed_but_empty_session_is_not() {
    let ctx = TestContext::new().await;
    let server = ctx.server();

    let mut event = fixtures::tracking_event("page_view");
    event["session_id"] = "".into();

    let response = server.post("/tracking").json(&event).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    let details = body["details"].as_array().unwrap();
    assert_eq!(details.len(), 1);
    assert_eq!(details[0]["field"], "session_id");
}

#[tokio::test]
async fn test_malformed_json_is_rejected() {
    let ctx = TestContext::new().await;
    let server = ctx.server();

    let response = server
        .post("/tracking")
        .content_type("application/json")
        .bytes("{not json".into())
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "VALID_001");
    assert_eq!(body["details"][0]["field"], "body");
}

#[tokio::test]
async fn test_oversized_payload_is_rejected() {
    let ctx = TestContext::new().await;
    let server = ctx.server();

    let response = server.post("/tracking").json(&fixtures::oversized_event()).await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "VALID_003");
}

#[tokio::test]
async fn test_client_ip_is_recorded() {
    let ctx = TestContext::new().await;
    let server = ctx.server();

    server
        .post("/tracking")
        .add_header("X-Forwarded-For", "203.0.113.7, 10.0.0.1")
        .json(&fixtures::tracking_event("page_view"))
        .await
        .assert_status_ok();
    server
        .post("/tracking")
        .json(&fixtures::tracking_event("page_view"))
        .await
        .assert_status_ok();

    let ips: Vec<String> = ctx.store.snapshot().into_iter().map(|e| e.ip_address).collect();
    assert_eq!(ips, vec!["203.0.113.7".to_string(), "unknown".to_string()]);
}

#[tokio::test]
async fn test_analytics_groups_by_campaign() {
    let ctx = TestContext::new().await;
    let server = ctx.server();

    for event in [
        fixtures::campaign_event("google", "cpc", "ritmos"),
        fixtures::campaign_event("google", "cpc", "ritmos"),
        fixtures::campaign_event("instagram", "social", "verao"),
        fixtures::campaign_event("facebook", "cpc", "verao"),
        fixtures::google_ads_click(),
        fixtures::tracking_event("page_view"),
        fixtures::tracking_event("conversion"),
    ] {
        server.post("/tracking").json(&event).await.assert_status_ok();
    }

    let response = server.get("/tracking/analytics").await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["date_range"]["days"], 7);

    let analytics = &body["analytics"];
    assert_eq!(analytics["total_events"], 7);
    assert_eq!(analytics["unique_sessions"], 7);
    assert_eq!(analytics["utm_sources"]["google"], 2);
    assert_eq!(analytics["utm_sources"]["direct"], 3);
    assert_eq!(analytics["campaigns"]["verao"], 2);
    assert_eq!(analytics["campaigns"]["none"], 3);
    assert_eq!(analytics["event_types"]["conversion"], 1);
    assert_eq!(analytics["google_ads_clicks"], 3);
    assert_eq!(analytics["facebook_ads_clicks"], 1);
    assert_eq!(analytics["paid_clicks"], 4);
    assert_eq!(analytics["conversions"], 1);
    assert_eq!(analytics["top_sources"][0]["key"], "direct");
    assert_eq!(analytics["recent_events"].as_array().unwrap().len(), 7);

    let source_total: u64 = analytics["utm_sources"]
        .as_object()
        .unwrap()
        .values()
        .map(|v| v.as_u64().unwrap())
        .sum();
    assert_eq!(source_total, 7);
}

#[tokio::test]
async fn test_analytics_window_and_event_type_filter() {
    let ctx = TestContext::new().await;
    let server = ctx.server();
    let now = Utc::now();

    let payload = |event_type: &str| {
        TrackingPayload::from_value(fixtures::tracking_event(event_type)).unwrap()
    };
    ctx.store.record_at(payload("page_view"), None, now - Duration::days(10));
    ctx.store.record_at(payload("page_view"), None, now - Duration::days(1));
    ctx.store.record_at(payload("conversion"), None, now - Duration::hours(2));

    let body: serde_json::Value = server
        .get("/tracking/analytics")
        .add_query_param("days", "7")
        .await
        .json();
    assert_eq!(body["analytics"]["total_events"], 2);

    let body: serde_json::Value = server
        .get("/tracking/analytics")
        .add_query_param("days", "30")
        .add_query_param("event_type", "page_view")
        .await
        .json();
    assert_eq!(body["analytics"]["total_events"], 2);
    assert_eq!(body["date_range"]["days"], 30);
}

#[tokio::test]
async fn test_analytics_rejects_bad_days() {
    let ctx = TestContext::new().await;
    let server = ctx.server();

    for days in ["0", "-3", "abc", "366"] {
        let response = server.get("/tracking/analytics").add_query_param("days", days).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        assert_eq!(body["success"], false, "days={}", days);
    }
}

#[tokio::test]
async fn test_clear_reports_prior_count() {
    let ctx = TestContext::new().await;
    let server = ctx.server();

    for _ in 0..3 {
        server
            .post("/tracking")
            .json(&fixtures::tracking_event("page_view"))
            .await
            .assert_status_ok();
    }

    let response = server.delete("/tracking").await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["cleared"], 3);
    assert_eq!(body["message"], "Cleared 3 tracking events");

    let body: serde_json::Value = server.get("/tracking/analytics").await.json();
    assert_eq!(body["analytics"]["total_events"], 0);

    let body: serde_json::Value = server.delete("/tracking").await.json();
    assert_eq!(body["cleared"], 0);
}

#[tokio::test]
async fn test_clear_can_be_disabled() {
    let ctx = TestContext::with_tracking(TrackingConfig {
        allow_clear: false,
        ..Default::default()
    })
    .await;
    let server = ctx.server();

    server
        .post("/tracking")
        .json(&fixtures::tracking_event("page_view"))
        .await
        .assert_status_ok();

    let response = server.delete("/tracking").await;
    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(ctx.store.len(), 1);
}
