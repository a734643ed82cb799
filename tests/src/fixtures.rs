//! Test fixtures and payload generators.

use chrono::Utc;
use uuid::Uuid;

/// A valid tracking payload with a fresh session.
pub fn tracking_event(event_type: &str) -> serde_json::Value {
    tracking_event_with_session(event_type, &Uuid::new_v4().to_string())
}

/// A valid tracking payload for a specific session.
pub fn tracking_event_with_session(event_type: &str, session_id: &str) -> serde_json::Value {
    serde_json::json!({
        "event_type": event_type,
        "timestamp": Utc::now().to_rfc3339(),
        "page_url": "https://studio.example/aulas",
        "referrer": "",
        "user_agent": "Mozilla/5.0 (Test)",
        "session_id": session_id
    })
}

/// A tracking payload attributed to a campaign.
pub fn campaign_event(source: &str, medium: &str, campaign: &str) -> serde_json::Value {
    let mut event = tracking_event("page_view");
    event["utm_source"] = source.into();
    event["utm_medium"] = medium.into();
    event["utm_campaign"] = campaign.into();
    event
}

/// A Google Ads click, identified by its gclid only.
pub fn google_ads_click() -> serde_json::Value {
    let mut event = tracking_event("page_view");
    event["gclid"] = "Cj0KCQjw-test".into();
    event
}

/// A lead form that passes validation.
pub fn valid_lead() -> serde_json::Value {
    serde_json::json!({
        "full_name": "  Maria Silva ",
        "email": "Maria.Silva@Example.com",
        "phone": "(45) 99999-8888",
        "birth_day": "4",
        "birth_month": "3",
        "birth_year": "1990",
        "experience_level": "returning"
    })
}

/// A lead form carrying attribution for the visitor's session.
pub fn attributed_lead(session_id: &str) -> serde_json::Value {
    let mut lead = valid_lead();
    lead["session_id"] = session_id.into();
    lead["landing_url"] =
        "https://studio.example/?utm_source=google&utm_medium=cpc&utm_campaign=ritmos&gclid=abc123".into();
    lead["page_url"] = "https://studio.example/matricula".into();
    lead
}

/// A lead form where every field is wrong.
pub fn invalid_lead() -> serde_json::Value {
    serde_json::json!({
        "full_name": "   ",
        "email": "a@b",
        "phone": "123456789",
        "birth_day": "29",
        "birth_month": "2",
        "birth_year": "2001",
        "experience_level": "expert"
    })
}

/// A payload larger than the tracking size limit.
pub fn oversized_event() -> serde_json::Value {
    let mut event = tracking_event("page_view");
    // 70KB of data exceeds the 64KB limit
    event["page_name"] = serde_json::Value::String("x".repeat(70_000));
    event
}
