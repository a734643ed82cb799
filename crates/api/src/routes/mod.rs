//! API routes.

pub mod health;
pub mod leads;
pub mod tracking;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::state::AppState;

/// Creates the API router.
///
/// `DELETE /tracking` answers 404 unless clearing is allowed.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let tracking_route = if state.tracking.allow_clear {
        post(tracking::record_handler).delete(tracking::clear_handler)
    } else {
        post(tracking::record_handler).delete(tracking::clear_disabled_handler)
    };

    Router::new()
        .route("/tracking", tracking_route)
        .route("/tracking/analytics", get(tracking::analytics_handler))
        .route("/leads", post(leads::submit_handler))
        .route("/leads/retry", post(leads::retry_handler))
        .route("/health", get(health::health_handler))
        .route("/health/ready", get(health::ready_handler))
        .route("/health/live", get(health::live_handler))
        .route("/metrics", get(health::metrics_handler))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
