//! In-memory tracking event log.
//!
//! The store is constructed once at startup and shared by reference with the
//! handlers. Entries live only as long as the process.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tracing::debug;

use crate::analytics::{summarize, AnalyticsQuery, AnalyticsReport};
use crate::tracking::{TrackingEvent, TrackingPayload};

/// Append-only event log with an explicit clear.
#[derive(Debug, Default)]
pub struct TrackingStore {
    events: RwLock<Vec<TrackingEvent>>,
}

impl TrackingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a validated payload, stamping it with the current time.
    pub fn record(&self, payload: TrackingPayload, ip_address: Option<String>) -> TrackingEvent {
        self.record_at(payload, ip_address, Utc::now())
    }

    /// Store a validated payload with an explicit server timestamp.
    pub fn record_at(
        &self,
        payload: TrackingPayload,
        ip_address: Option<String>,
        created_at: DateTime<Utc>,
    ) -> TrackingEvent {
        let event = TrackingEvent::new(payload, ip_address, created_at);
        let mut events = self.events.write();
        events.push(event.clone());
        debug!(id = %event.id, stored = events.len(), "Tracking event stored");
        event
    }

    /// Aggregate the events inside the query window ending now.
    pub fn analytics(&self, query: &AnalyticsQuery) -> AnalyticsReport {
        self.analytics_at(query, Utc::now())
    }

    pub fn analytics_at(&self, query: &AnalyticsQuery, now: DateTime<Utc>) -> AnalyticsReport {
        let events = self.events.read();
        summarize(&events, query, now)
    }

    /// Remove every event, returning how many were removed.
    pub fn clear(&self) -> usize {
        let mut events = self.events.write();
        let removed = events.len();
        events.clear();
        removed
    }

    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }

    /// Copy of the log in insertion order.
    pub fn snapshot(&self) -> Vec<TrackingEvent> {
        self.events.read().clone()
    }
}
