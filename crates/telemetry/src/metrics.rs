//! In-process metrics collection.
//!
//! Counters are process-lifetime totals, exposed as a JSON snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// A counter metric.
#[derive(Debug, Default)]
pub struct Counter(AtomicU64);

impl Counter {
    pub fn inc(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// A gauge metric (can go up or down, never below zero).
#[derive(Debug, Default)]
pub struct Gauge(AtomicU64);

impl Gauge {
    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }

    pub fn inc(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn sub(&self, n: u64) {
        let _ = self
            .0
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |v| Some(v.saturating_sub(n)));
    }
}

/// One histogram bucket in a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatencyBucket {
    pub le_ms: u64,
    pub count: u64,
}

/// Histogram for latency tracking.
#[derive(Debug)]
pub struct Histogram {
    /// Buckets: 1ms, 5ms, 10ms, 25ms, 50ms, 100ms, 250ms, 500ms, 1s, 5s, 10s
    buckets: [AtomicU64; 11],
    sum: AtomicU64,
    count: AtomicU64,
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new()
    }
}

impl Histogram {
    const BUCKET_BOUNDS: [u64; 11] = [1, 5, 10, 25, 50, 100, 250, 500, 1000, 5000, 10000];

    pub fn new() -> Self {
        Self {
            buckets: Default::default(),
            sum: AtomicU64::new(0),
            count: AtomicU64::new(0),
        }
    }

    /// Records a value in milliseconds.
    pub fn observe(&self, ms: u64) {
        self.sum.fetch_add(ms, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);

        for (i, &bound) in Self::BUCKET_BOUNDS.iter().enumerate() {
            if ms <= bound {
                self.buckets[i].fetch_add(1, Ordering::Relaxed);
                return;
            }
        }
        // Value exceeds all buckets, add to last
        self.buckets[10].fetch_add(1, Ordering::Relaxed);
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn sum(&self) -> u64 {
        self.sum.load(Ordering::Relaxed)
    }

    pub fn mean(&self) -> f64 {
        let count = self.count();
        if count == 0 {
            0.0
        } else {
            self.sum() as f64 / count as f64
        }
    }

    /// Per-bucket counts, keyed by upper bound.
    pub fn buckets(&self) -> Vec<LatencyBucket> {
        Self::BUCKET_BOUNDS
            .iter()
            .zip(self.buckets.iter())
            .map(|(&le_ms, count)| LatencyBucket {
                le_ms,
                count: count.load(Ordering::Relaxed),
            })
            .collect()
    }
}

/// Collected metrics for the lead service.
#[derive(Debug, Default)]
pub struct Metrics {
    // Tracking metrics
    pub tracking_received: Counter,
    pub tracking_rejected: Counter,
    pub analytics_queries: Counter,
    pub tracking_clears: Counter,

    // Lead metrics
    pub leads_received: Counter,
    pub leads_rejected: Counter,

    // Delivery metrics
    pub deliveries_confirmed: Counter,
    pub deliveries_assumed: Counter,
    pub deliveries_failed: Counter,
    pub delivery_attempt_failures: Counter,
    pub leads_cached_pending: Counter,
    pub leads_still_pending: Counter,

    // Latency histograms
    pub ingest_latency_ms: Histogram,
    pub delivery_latency_ms: Histogram,

    // Gauges
    pub stored_events: Gauge,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }
}

/// A snapshot of metrics at a point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub timestamp: DateTime<Utc>,
    pub tracking_received: u64,
    pub tracking_rejected: u64,
    pub analytics_queries: u64,
    pub tracking_clears: u64,
    pub leads_received: u64,
    pub leads_rejected: u64,
    pub deliveries_confirmed: u64,
    pub deliveries_assumed: u64,
    pub deliveries_failed: u64,
    pub delivery_attempt_failures: u64,
    pub leads_cached_pending: u64,
    pub leads_still_pending: u64,
    pub ingest_latency_mean_ms: f64,
    pub delivery_latency_mean_ms: f64,
    pub delivery_latency_buckets: Vec<LatencyBucket>,
    pub stored_events: u64,
}

impl Metrics {
    /// Takes a snapshot of current metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            timestamp: Utc::now(),
            tracking_received: self.tracking_received.get(),
            tracking_rejected: self.tracking_rejected.get(),
            analytics_queries: self.analytics_queries.get(),
            tracking_clears: self.tracking_clears.get(),
            leads_received: self.leads_received.get(),
            leads_rejected: self.leads_rejected.get(),
            deliveries_confirmed: self.deliveries_confirmed.get(),
            deliveries_assumed: self.deliveries_assumed.get(),
            deliveries_failed: self.deliveries_failed.get(),
            delivery_attempt_failures: self.delivery_attempt_failures.get(),
            leads_cached_pending: self.leads_cached_pending.get(),
            leads_still_pending: self.leads_still_pending.get(),
            ingest_latency_mean_ms: self.ingest_latency_ms.mean(),
            delivery_latency_mean_ms: self.delivery_latency_ms.mean(),
            delivery_latency_buckets: self.delivery_latency_ms.buckets(),
            stored_events: self.stored_events.get(),
        }
    }
}

/// Global metrics registry.
pub static METRICS: std::sync::LazyLock<Metrics> = std::sync::LazyLock::new(Metrics::new);

/// Get the global metrics instance.
pub fn metrics() -> &'static Metrics {
    &METRICS
}
