//! Delivery configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Outbound webhook configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// Webhook receiving lead submissions
    #[serde(default = "default_url")]
    pub url: String,
    /// Upper bound for a single delivery attempt, in seconds
    #[serde(default = "default_attempt_timeout_secs")]
    pub attempt_timeout_secs: u64,
    /// Prefix string fields with U+FEFF for the receiving system
    #[serde(default = "default_bom_prefix")]
    pub bom_prefix: bool,
}

fn default_url() -> String {
    "http://localhost:5678/webhook/leads".to_string()
}

fn default_attempt_timeout_secs() -> u64 {
    10
}

fn default_bom_prefix() -> bool {
    true
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            attempt_timeout_secs: default_attempt_timeout_secs(),
            bom_prefix: default_bom_prefix(),
        }
    }
}

impl WebhookConfig {
    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_secs(self.attempt_timeout_secs.max(1))
    }
}

/// Local cache for undelivered submissions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingConfig {
    #[serde(default = "default_pending_dir")]
    pub dir: PathBuf,
}

fn default_pending_dir() -> PathBuf {
    PathBuf::from("./data/pending")
}

impl Default for PendingConfig {
    fn default() -> Self {
        Self {
            dir: default_pending_dir(),
        }
    }
}
