//! Lead form endpoints.

use axum::{
    body::Bytes,
    extract::State,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{SecondsFormat, Utc};
use serde_json::json;
use studio_core::{
    error::ValidationErrorCode,
    event_names, event_types,
    limits::MAX_LEAD_PAYLOAD_BYTES,
    validate_lead, Error, RawLeadForm, TrackingPayload, UtmParams,
};
use telemetry::metrics;
use tracing::{debug, info, warn};

use crate::extractors::{ClientIp, UserAgent};
use crate::response::{ApiError, LeadResponse, NothingPendingResponse, RetryResponse};
use crate::state::AppState;

/// Form name recorded on lead conversions.
pub const LEAD_FORM_NAME: &str = "lead_form";

/// POST /leads - Validate a lead and deliver it to the webhook.
///
/// A valid lead is always confirmed, even when delivery failed and the
/// payload was cached for retry; the report says which.
pub async fn submit_handler(
    State(state): State<AppState>,
    ClientIp(client_ip): ClientIp,
    UserAgent(user_agent): UserAgent,
    body: Bytes,
) -> Result<Json<LeadResponse>, ApiError> {
    metrics().leads_received.inc();

    if body.len() > MAX_LEAD_PAYLOAD_BYTES {
        metrics().leads_rejected.inc();
        return Err(Error::validation_code(
            ValidationErrorCode::PayloadTooLarge,
            format!(
                "Payload size {}KB exceeds {}KB limit",
                body.len() / 1024,
                MAX_LEAD_PAYLOAD_BYTES / 1024
            ),
        )
        .into());
    }

    let raw: RawLeadForm = serde_json::from_slice(&body).map_err(|e| {
        metrics().leads_rejected.inc();
        ApiError::bad_request(format!("invalid JSON: {}", e))
    })?;

    let lead = validate_lead(&raw).map_err(|fields| {
        metrics().leads_rejected.inc();
        debug!(errors = %fields, "Lead form rejected");
        ApiError::invalid_form(fields)
    })?;

    let attribution = raw
        .landing_url
        .as_deref()
        .map(UtmParams::from_url)
        .unwrap_or_default();

    let report = state.dispatcher.submit(&lead, &attribution).await;

    info!(
        delivered = report.delivered,
        confirmed = report.confirmed,
        strategy = report.strategy.as_deref().unwrap_or("none"),
        experience_level = lead.experience_level.as_str(),
        "Lead submitted"
    );

    if let Some(session_id) = raw.session_id.as_deref().filter(|s| !s.trim().is_empty()) {
        record_conversion(&state, &raw, session_id, &attribution, client_ip, user_agent);
    }

    Ok(Json(LeadResponse::from(report)))
}

/// POST /leads/retry - Re-send every cached pending lead.
pub async fn retry_handler(State(state): State<AppState>) -> Result<Response, ApiError> {
    match state.dispatcher.retry_pending().await? {
        Some(report) => {
            info!(
                retried = report.retried,
                delivered = report.delivered,
                remaining = report.remaining,
                "Pending leads retried"
            );
            Ok(Json(RetryResponse::from(report)).into_response())
        }
        None => Ok(Json(NothingPendingResponse::default()).into_response()),
    }
}

/// Log a conversion for the visitor's tracking session.
///
/// Failures here never affect the lead response.
fn record_conversion(
    state: &AppState,
    raw: &RawLeadForm,
    session_id: &str,
    attribution: &UtmParams,
    client_ip: Option<String>,
    header_user_agent: Option<String>,
) {
    let page_url = raw
        .page_url
        .as_deref()
        .or(raw.landing_url.as_deref())
        .filter(|u| !u.trim().is_empty())
        .unwrap_or("unknown");
    let user_agent = raw
        .user_agent
        .clone()
        .or(header_user_agent)
        .filter(|ua| !ua.trim().is_empty())
        .unwrap_or_else(|| "unknown".to_string());

    let mut value = json!({
        "event_type": event_types::CONVERSION,
        "event_name": event_names::FORM_SUBMISSION,
        "form_name": LEAD_FORM_NAME,
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        "page_url": page_url,
        "referrer": raw.referrer.as_deref().unwrap_or_default(),
        "user_agent": user_agent,
        "session_id": session_id,
    });
    if let Some(obj) = value.as_object_mut() {
        for (key, v) in attribution.iter() {
            obj.insert(key.to_string(), json!(v));
        }
    }

    match TrackingPayload::from_value(value) {
        Ok(payload) => {
            let event = state.store.record(payload, client_ip);
            metrics().stored_events.inc();
            debug!(id = %event.id, session_id = session_id, "Lead conversion recorded");
        }
        Err(e) => warn!(error = %e, "Skipped lead conversion event"),
    }
}
