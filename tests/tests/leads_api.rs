//! Tests for the lead endpoints.
//!
//! POST /leads → validation → LeadDispatcher (mock strategies) → pending cache

use std::future::IntoFuture;

use axum::http::StatusCode;
use delivery::LAST_SUBMISSION;
use integration_tests::{fixtures, mocks::MockMode, setup::TestContext};

#[tokio::test]
async fn test_valid_lead_is_formatted_and_delivered() {
    let ctx = TestContext::new().await;
    let server = ctx.server();

    let response = server.post("/leads").json(&fixtures::valid_lead()).await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["delivered"], true);
    assert_eq!(body["confirmed"], true);
    assert_eq!(body["strategy"], "mock-json");
    assert_eq!(body["attempts"].as_array().unwrap().len(), 1);
    assert_eq!(body["attempts"][0]["outcome"], "delivered");
    assert!(body.get("warning").is_none());

    let captured = ctx.strategies[0].captured();
    assert_eq!(captured.len(), 1);
    let payload = &captured[0];
    assert_eq!(payload.full_name, "Maria Silva");
    assert_eq!(payload.email, "maria.silva@example.com");
    assert_eq!(payload.phone, "45999998888");
    assert_eq!(payload.birth_date, "04/03/1990");
    assert_eq!(payload.experience_level, "returning");
    assert_eq!(payload.experience_label, "Danced before, currently not dancing");

    let last = ctx.dispatcher.pending().load(LAST_SUBMISSION).await.unwrap();
    assert_eq!(last.unwrap().payload, *payload);
}

#[tokio::test]
async fn test_invalid_lead_reports_every_field() {
    let ctx = TestContext::new().await;
    let server = ctx.server();

    let response = server.post("/leads").json(&fixtures::invalid_lead()).await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Invalid form data");

    let fields = body["fields"].as_object().unwrap();
    for field in ["full_name", "email", "phone", "birth_date", "experience_level"] {
        assert!(fields.contains_key(field), "missing error for {}", field);
    }
    assert_eq!(fields["birth_date"], "This date does not exist");

    // Rejected leads have no side effects
    assert_eq!(ctx.total_attempts(), 0);
    assert!(ctx.store.is_empty());
    assert!(ctx.pending_payloads().await.is_empty());
}

#[tokio::test]
async fn test_phone_digit_bounds() {
    let ctx = TestContext::new().await;
    let server = ctx.server();

    for (phone, accepted) in [
        ("119876543", false),
        ("1198765432", true),
        ("551198765432", true),
        ("551198765432123", true),
        ("5511987654321234", false),
    ] {
        let mut lead = fixtures::valid_lead();
        lead["phone"] = phone.into();
        let status = server.post("/leads").json(&lead).await.status_code();
        let expected = if accepted { StatusCode::OK } else { StatusCode::BAD_REQUEST };
        assert_eq!(status, expected, "phone {}", phone);
    }
}

#[tokio::test]
async fn test_legacy_experience_alias_is_accepted() {
    let ctx = TestContext::new().await;
    let server = ctx.server();

    let mut lead = fixtures::valid_lead();
    lead["experience_level"] = "primeira-vez".into();
    server.post("/leads").json(&lead).await.assert_status_ok();

    assert_eq!(ctx.strategies[0].captured()[0].experience_level, "first-time");
}

#[tokio::test]
async fn test_malformed_lead_json_is_rejected() {
    let ctx = TestContext::new().await;
    let server = ctx.server();

    let response = server
        .post("/leads")
        .content_type("application/json")
        .bytes("[1, 2".into())
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "VALID_001");
    assert_eq!(ctx.total_attempts(), 0);
}

#[tokio::test]
async fn test_falls_back_to_next_strategy() {
    let ctx = TestContext::with_modes(MockMode::Fail, MockMode::Assume, MockMode::Confirm).await;
    let server = ctx.server();

    let body: serde_json::Value = server.post("/leads").json(&fixtures::valid_lead()).await.json();

    assert_eq!(body["delivered"], true);
    assert_eq!(body["confirmed"], false);
    assert_eq!(body["strategy"], "mock-opaque");
    assert!(body["warning"].is_string());
    assert_eq!(body["attempts"][0]["outcome"], "failed");
    assert_eq!(body["attempts"][1]["outcome"], "assumed");
    assert_eq!(ctx.strategies[2].attempts(), 0);
}

#[tokio::test]
async fn test_total_failure_is_cached_and_retried() {
    let ctx = TestContext::with_modes(MockMode::Fail, MockMode::Fail, MockMode::Fail).await;
    let server = ctx.server();

    let response = server.post("/leads").json(&fixtures::valid_lead()).await;

    // The visitor still gets a confirmation
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["delivered"], false);
    assert!(body["strategy"].is_null());
    assert_eq!(body["attempts"].as_array().unwrap().len(), 3);
    assert!(body["warning"].is_string());

    let pending = ctx.pending_payloads().await;
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].phone, "45999998888");

    let body: serde_json::Value = server.post("/leads/retry").await.json();
    assert_eq!(body["retried"], 1);
    assert_eq!(body["delivered"], 0);
    assert_eq!(body["remaining"], 1);
    assert_eq!(body["results"][0]["delivered"], false);

    ctx.strategies[2].set_mode(MockMode::Confirm);
    let body: serde_json::Value = server.post("/leads/retry").await.json();
    assert_eq!(body["delivered"], 1);
    assert_eq!(body["remaining"], 0);
    assert_eq!(body["results"][0]["strategy"], "mock-form");
    assert!(ctx.pending_payloads().await.is_empty());

    let body: serde_json::Value = server.post("/leads/retry").await.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["retried"], 0);
    assert_eq!(body["message"], "No pending submission");
}

#[tokio::test]
async fn test_every_failed_lead_survives_until_retried() {
    let ctx = TestContext::with_modes(MockMode::Fail, MockMode::Fail, MockMode::Fail).await;
    let server = ctx.server();

    let mut second = fixtures::valid_lead();
    second["full_name"] = "Beatriz Souza".into();
    second["email"] = "bia@example.com".into();

    let (first_response, second_response) = tokio::join!(
        server.post("/leads").json(&fixtures::valid_lead()).into_future(),
        server.post("/leads").json(&second).into_future(),
    );
    first_response.assert_status_ok();
    second_response.assert_status_ok();

    let mut names: Vec<_> = ctx.pending_payloads().await.into_iter().map(|p| p.full_name).collect();
    names.sort();
    assert_eq!(names, vec!["Beatriz Souza", "Maria Silva"]);

    ctx.strategies[0].set_mode(MockMode::Confirm);
    let earlier_attempts = ctx.strategies[0].attempts();
    let body: serde_json::Value = server.post("/leads/retry").await.json();
    assert_eq!(body["retried"], 2);
    assert_eq!(body["delivered"], 2);
    assert_eq!(body["remaining"], 0);

    let mut delivered: Vec<_> = ctx.strategies[0].captured()[earlier_attempts..]
        .iter()
        .map(|p| p.full_name.clone())
        .collect();
    delivered.sort();
    assert_eq!(delivered, vec!["Beatriz Souza", "Maria Silva"]);
    assert!(ctx.pending_payloads().await.is_empty());
}

#[tokio::test]
async fn test_readiness_recovers_after_failed_cache_write() {
    let ctx = TestContext::with_modes(MockMode::Fail, MockMode::Fail, MockMode::Fail).await;
    let server = ctx.server();

    std::fs::remove_dir_all(ctx.pending_dir()).unwrap();
    let body: serde_json::Value = server.post("/leads").json(&fixtures::valid_lead()).await.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["delivered"], false);
    assert!(body["warning"].as_str().unwrap().contains("try again"));

    std::fs::create_dir_all(ctx.pending_dir()).unwrap();
    server.post("/leads").json(&fixtures::valid_lead()).await.assert_status_ok();
    assert_eq!(ctx.pending_payloads().await.len(), 1);

    server.get("/health/ready").await.assert_status_ok();
}

#[tokio::test]
async fn test_attributed_lead_records_conversion() {
    let ctx = TestContext::new().await;
    let server = ctx.server();

    server
        .post("/leads")
        .add_header("X-Forwarded-For", "198.51.100.4")
        .json(&fixtures::attributed_lead("sess-42"))
        .await
        .assert_status_ok();

    let payload = &ctx.strategies[0].captured()[0];
    assert_eq!(payload.attribution.utm_campaign.as_deref(), Some("ritmos"));
    assert_eq!(payload.attribution.gclid.as_deref(), Some("abc123"));

    let events = ctx.store.snapshot();
    assert_eq!(events.len(), 1);
    let event = &events[0];
    assert_eq!(event.payload.event_type, "conversion");
    assert_eq!(event.payload.event_name.as_deref(), Some("form_submission"));
    assert_eq!(event.payload.form_name.as_deref(), Some("lead_form"));
    assert_eq!(event.payload.session_id, "sess-42");
    assert_eq!(event.payload.page_url, "https://studio.example/matricula");
    assert_eq!(event.ip_address, "198.51.100.4");

    let body: serde_json::Value = server.get("/tracking/analytics").await.json();
    assert_eq!(body["analytics"]["conversions"], 1);
    assert_eq!(body["analytics"]["form_submissions"], 1);
    assert_eq!(body["analytics"]["google_ads_clicks"], 1);
}

#[tokio::test]
async fn test_lead_without_session_records_nothing() {
    let ctx = TestContext::new().await;
    let server = ctx.server();

    server.post("/leads").json(&fixtures::valid_lead()).await.assert_status_ok();

    assert!(ctx.store.is_empty());
}
