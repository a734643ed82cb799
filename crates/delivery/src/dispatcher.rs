//! Sequential fallback delivery of lead payloads.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use studio_core::{FormSubmission, Result, UtmParams};
use telemetry::{health, metrics};
use tracing::{error, info, warn};

use crate::config::WebhookConfig;
use crate::payload::LeadPayload;
use crate::pending::{pending_key, PendingCache, LAST_SUBMISSION, PENDING_SUBMISSION};
use crate::strategy::{webhook_strategies, Acknowledgement, DeliveryStrategy};

/// Warning attached when every strategy failed.
pub const UNDELIVERED_WARNING: &str =
    "We could not confirm your submission. Your details were saved and will be sent again.";

/// Warning attached when every strategy failed and the payload could not be cached.
pub const UNCACHED_WARNING: &str =
    "We could not confirm your submission. Please try again later.";

/// Warning attached when delivery could not be verified.
pub const ASSUMED_WARNING: &str = "Submission sent without confirmation from the receiver.";

/// Result of a single strategy attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptOutcome {
    Delivered,
    Assumed,
    Failed,
    TimedOut,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub strategy: String,
    pub outcome: AttemptOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// What happened to a lead on its way to the webhook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryReport {
    /// Some strategy succeeded, confirmed or assumed
    pub delivered: bool,
    /// The receiver acknowledged the payload
    pub confirmed: bool,
    /// Strategy that ended the sequence
    pub strategy: Option<String>,
    pub attempts: Vec<AttemptRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// Outcome of re-sending every pending submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryReport {
    /// Pending entries attempted
    pub retried: usize,
    /// Entries delivered and removed from the cache
    pub delivered: usize,
    /// Entries still pending
    pub remaining: usize,
    pub results: Vec<DeliveryReport>,
}

/// Runs delivery strategies in order and parks failures in the pending cache.
pub struct LeadDispatcher {
    strategies: Vec<Arc<dyn DeliveryStrategy>>,
    attempt_timeout: Duration,
    bom_prefix: bool,
    pending: PendingCache,
}

impl LeadDispatcher {
    pub fn new(
        strategies: Vec<Arc<dyn DeliveryStrategy>>,
        attempt_timeout: Duration,
        bom_prefix: bool,
        pending: PendingCache,
    ) -> Self {
        Self {
            strategies,
            attempt_timeout,
            bom_prefix,
            pending,
        }
    }

    /// Dispatcher with the standard webhook strategies.
    pub fn from_config(config: &WebhookConfig, pending: PendingCache) -> Result<Self> {
        Ok(Self::new(
            webhook_strategies(config)?,
            config.attempt_timeout(),
            config.bom_prefix,
            pending,
        ))
    }

    pub fn pending(&self) -> &PendingCache {
        &self.pending
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Format a validated lead and deliver it.
    pub async fn submit(&self, lead: &FormSubmission, attribution: &UtmParams) -> DeliveryReport {
        let payload = LeadPayload::format(lead, attribution, Utc::now(), self.bom_prefix);
        self.deliver(&payload).await
    }

    /// Deliver a formatted payload, caching it if every strategy fails.
    pub async fn deliver(&self, payload: &LeadPayload) -> DeliveryReport {
        let mut report = self.run_strategies(payload).await;

        if report.delivered {
            self.remember_delivered(payload).await;
        } else if !self.park(payload).await {
            report.warning = Some(UNCACHED_WARNING.to_string());
        }

        report
    }

    /// Re-send every pending payload, oldest first.
    ///
    /// Each entry is removed once some strategy succeeds for it. Returns
    /// `None` when nothing is pending.
    pub async fn retry_pending(&self) -> Result<Option<RetryReport>> {
        let keys = self.pending.keys(PENDING_SUBMISSION).await?;
        if keys.is_empty() {
            return Ok(None);
        }

        info!(pending = keys.len(), "Retrying pending submissions");

        let mut results = Vec::with_capacity(keys.len());
        let mut delivered = 0;
        for key in keys {
            // Another retry may have delivered it already
            let Some(stored) = self.pending.load(&key).await? else {
                continue;
            };

            let report = self.run_strategies(&stored.payload).await;
            if report.delivered {
                self.pending.remove(&key).await?;
                self.remember_delivered(&stored.payload).await;
                delivered += 1;
            } else {
                metrics().leads_still_pending.inc();
                warn!(key = %key, stored_at = %stored.stored_at, "Pending submission still undelivered");
            }
            results.push(report);
        }

        let retried = results.len();
        Ok(Some(RetryReport {
            retried,
            delivered,
            remaining: retried - delivered,
            results,
        }))
    }

    async fn remember_delivered(&self, payload: &LeadPayload) {
        match self.pending.save(LAST_SUBMISSION, payload).await {
            Ok(()) => health().pending_cache.set_healthy(),
            Err(e) => {
                warn!(error = %e, "Failed to cache last submission");
                health().pending_cache.set_unhealthy(e.to_string());
            }
        }
    }

    /// Cache an undelivered payload under its own key.
    async fn park(&self, payload: &LeadPayload) -> bool {
        let key = pending_key(Utc::now());
        match self.pending.save(&key, payload).await {
            Ok(()) => {
                metrics().leads_cached_pending.inc();
                health().pending_cache.set_healthy();
                warn!(key = %key, dir = %self.pending.dir().display(), "Lead delivery failed, payload cached for retry");
                true
            }
            Err(e) => {
                error!(error = %e, "Lead delivery failed and payload could not be cached");
                health().pending_cache.set_unhealthy(e.to_string());
                false
            }
        }
    }

    async fn run_strategies(&self, payload: &LeadPayload) -> DeliveryReport {
        let start = Instant::now();
        let mut attempts = Vec::with_capacity(self.strategies.len());

        for strategy in &self.strategies {
            let name = strategy.name();
            let result = tokio::time::timeout(self.attempt_timeout, strategy.attempt(payload)).await;

            let (outcome, err) = match result {
                Ok(Ok(Acknowledgement::Confirmed)) => (AttemptOutcome::Delivered, None),
                Ok(Ok(Acknowledgement::Assumed)) => (AttemptOutcome::Assumed, None),
                Ok(Err(e)) => (AttemptOutcome::Failed, Some(e.to_string())),
                Err(_) => (
                    AttemptOutcome::TimedOut,
                    Some(format!("timed out after {}s", self.attempt_timeout.as_secs())),
                ),
            };

            if let Some(err) = &err {
                metrics().delivery_attempt_failures.inc();
                warn!(strategy = name, error = %err, "Delivery attempt failed");
            }

            let done = matches!(outcome, AttemptOutcome::Delivered | AttemptOutcome::Assumed);
            attempts.push(AttemptRecord {
                strategy: name.to_string(),
                outcome: outcome.clone(),
                error: err,
            });

            if done {
                let confirmed = outcome == AttemptOutcome::Delivered;
                metrics().delivery_latency_ms.observe(start.elapsed().as_millis() as u64);
                if confirmed {
                    metrics().deliveries_confirmed.inc();
                    health().webhook.set_healthy();
                } else {
                    metrics().deliveries_assumed.inc();
                }
                info!(strategy = name, confirmed = confirmed, attempts = attempts.len(), "Lead delivered");

                return DeliveryReport {
                    delivered: true,
                    confirmed,
                    strategy: Some(name.to_string()),
                    attempts,
                    warning: (!confirmed).then(|| ASSUMED_WARNING.to_string()),
                };
            }
        }

        metrics().deliveries_failed.inc();
        metrics().delivery_latency_ms.observe(start.elapsed().as_millis() as u64);
        health().webhook.set_unhealthy("All delivery strategies failed");
        error!(attempts = attempts.len(), "All delivery strategies failed");

        DeliveryReport {
            delivered: false,
            confirmed: false,
            strategy: None,
            attempts,
            warning: Some(UNDELIVERED_WARNING.to_string()),
        }
    }
}
