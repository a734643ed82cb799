//! Application state shared across handlers.

use std::sync::Arc;

use delivery::LeadDispatcher;
use serde::{Deserialize, Serialize};
use studio_core::limits::DEFAULT_ANALYTICS_DAYS;
use studio_core::TrackingStore;

/// Tracking endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingConfig {
    /// Analytics window when `days` is not given
    #[serde(default = "default_days")]
    pub default_days: u32,
    /// Mount `DELETE /tracking`
    #[serde(default = "default_allow_clear")]
    pub allow_clear: bool,
}

fn default_days() -> u32 {
    DEFAULT_ANALYTICS_DAYS
}

fn default_allow_clear() -> bool {
    true
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            default_days: default_days(),
            allow_clear: default_allow_clear(),
        }
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Process-lifetime tracking log
    pub store: Arc<TrackingStore>,
    /// Lead delivery (real webhook in production, mock strategies in tests)
    pub dispatcher: Arc<LeadDispatcher>,
    pub tracking: TrackingConfig,
}

impl AppState {
    pub fn new(store: Arc<TrackingStore>, dispatcher: Arc<LeadDispatcher>) -> Self {
        Self {
            store,
            dispatcher,
            tracking: TrackingConfig::default(),
        }
    }

    /// Create with custom tracking settings.
    pub fn with_tracking(mut self, tracking: TrackingConfig) -> Self {
        self.tracking = tracking;
        self
    }
}
