//! Tracking endpoints: record, analytics and clear.

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use std::time::Instant;
use studio_core::{
    error::ValidationErrorCode, limits::MAX_TRACKING_PAYLOAD_BYTES, AnalyticsParams,
    AnalyticsQuery, Error, TrackingPayload,
};
use telemetry::metrics;
use tracing::{debug, info, warn};

use crate::extractors::ClientIp;
use crate::response::{AnalyticsResponse, ApiError, ClearResponse, ErrorResponse, TrackingResponse};
use crate::state::AppState;

/// POST /tracking - Record one page-view or interaction event.
///
/// Every offending field is reported, not just the first.
pub async fn record_handler(
    State(state): State<AppState>,
    ClientIp(client_ip): ClientIp,
    body: Bytes,
) -> Result<Json<TrackingResponse>, ApiError> {
    let start = Instant::now();
    metrics().tracking_received.inc();

    // Check payload size before parsing
    if body.len() > MAX_TRACKING_PAYLOAD_BYTES {
        metrics().tracking_rejected.inc();
        return Err(ApiError::invalid_tracking(Error::validation_code(
            ValidationErrorCode::PayloadTooLarge,
            format!(
                "Payload size {}KB exceeds {}KB limit",
                body.len() / 1024,
                MAX_TRACKING_PAYLOAD_BYTES / 1024
            ),
        )));
    }

    let payload = TrackingPayload::parse(&body).map_err(|e| {
        metrics().tracking_rejected.inc();
        warn!(error = %e, "Rejected tracking event");
        ApiError::invalid_tracking(e)
    })?;

    let event = state.store.record(payload, client_ip);
    metrics().stored_events.inc();

    let latency_ms = start.elapsed().as_millis() as u64;
    metrics().ingest_latency_ms.observe(latency_ms);

    debug!(
        id = %event.id,
        event_type = %event.payload.event_type,
        session_id = %event.payload.session_id,
        utm_source = event.payload.utm_source.as_deref().unwrap_or("direct"),
        latency_ms = latency_ms,
        "Tracking event recorded"
    );

    Ok(Json(TrackingResponse::recorded(event.id)))
}

/// GET /tracking/analytics - Aggregate recent events.
pub async fn analytics_handler(
    State(state): State<AppState>,
    Query(params): Query<AnalyticsParams>,
) -> Result<Json<AnalyticsResponse>, ApiError> {
    metrics().analytics_queries.inc();

    let query = AnalyticsQuery::from_params(&params, state.tracking.default_days)?;
    let report = state.store.analytics(&query);

    debug!(
        days = query.days,
        event_type = query.event_type.as_deref().unwrap_or("*"),
        total_events = report.analytics.total_events,
        "Analytics computed"
    );

    Ok(Json(AnalyticsResponse {
        success: true,
        report,
    }))
}

/// DELETE /tracking - Drop every stored event.
pub async fn clear_handler(State(state): State<AppState>) -> Json<ClearResponse> {
    let cleared = state.store.clear();
    metrics().tracking_clears.inc();
    metrics().stored_events.sub(cleared as u64);

    info!(cleared = cleared, "Tracking events cleared");

    Json(ClearResponse::cleared(cleared))
}

/// DELETE /tracking when clearing is turned off.
pub async fn clear_disabled_handler() -> (StatusCode, Json<ErrorResponse>) {
    (StatusCode::NOT_FOUND, Json(ErrorResponse::new("Not found")))
}
