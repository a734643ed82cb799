//! HTTP API layer for lead capture and campaign tracking.

pub mod extractors;
pub mod response;
pub mod routes;
pub mod state;

pub use routes::router;
pub use state::{AppState, TrackingConfig};
