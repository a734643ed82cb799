//! Process-local telemetry for the lead service.
//!
//! Counters and component health live in global registries read by the
//! `/metrics` and `/health` endpoints.

pub mod health;
pub mod metrics;
pub mod tracing_setup;

pub use health::*;
pub use metrics::*;
pub use tracing_setup::*;
