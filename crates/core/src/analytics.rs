//! Analytics aggregation over stored tracking events.
//!
//! Summaries are derived per query and never stored.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::attribution::{PaidChannel, DIRECT_SOURCE, NO_VALUE};
use crate::error::{Error, Result, ValidationErrorCode};
use crate::limits::{DEFAULT_ANALYTICS_DAYS, MAX_ANALYTICS_DAYS, RECENT_EVENTS_LIMIT, TOP_GROUPS_LIMIT};
use crate::tracking::{event_names, event_types, TrackingEvent};

/// Query parameters as received on the wire.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalyticsParams {
    pub days: Option<String>,
    pub event_type: Option<String>,
}

/// A validated analytics query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyticsQuery {
    /// Lookback window in days
    pub days: u32,
    /// Only count events of this type
    pub event_type: Option<String>,
}

impl Default for AnalyticsQuery {
    fn default() -> Self {
        Self {
            days: DEFAULT_ANALYTICS_DAYS,
            event_type: None,
        }
    }
}

impl AnalyticsQuery {
    pub fn new(days: u32) -> Self {
        Self {
            days,
            event_type: None,
        }
    }

    pub fn with_event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = Some(event_type.into());
        self
    }

    /// Build a query from wire parameters, falling back to `default_days`.
    pub fn from_params(params: &AnalyticsParams, default_days: u32) -> Result<Self> {
        let days = match params.days.as_deref().map(str::trim) {
            None | Some("") => default_days,
            Some(raw) => raw.parse::<u32>().map_err(|_| {
                Error::validation_code(
                    ValidationErrorCode::InvalidFormat,
                    format!("days must be an integer between 1 and {}", MAX_ANALYTICS_DAYS),
                )
            })?,
        };

        if !(1..=MAX_ANALYTICS_DAYS).contains(&days) {
            return Err(Error::validation_code(
                ValidationErrorCode::InvalidFormat,
                format!("days must be an integer between 1 and {}", MAX_ANALYTICS_DAYS),
            ));
        }

        let event_type = params
            .event_type
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string);

        Ok(Self { days, event_type })
    }

    /// Earliest `created_at` included in the window ending at `now`.
    pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::days(i64::from(self.days))
    }

    fn matches(&self, event: &TrackingEvent, cutoff: DateTime<Utc>) -> bool {
        event.created_at >= cutoff
            && self
                .event_type
                .as_deref()
                .map_or(true, |t| event.payload.event_type == t)
    }
}

/// Resolved window of an analytics query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub days: u32,
}

/// Reduced projection of an event for the recent list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentEvent {
    pub id: String,
    pub event_type: String,
    pub utm_source: Option<String>,
    pub utm_campaign: Option<String>,
    pub page_url: String,
    pub timestamp: String,
}

impl From<&TrackingEvent> for RecentEvent {
    fn from(event: &TrackingEvent) -> Self {
        Self {
            id: event.id.clone(),
            event_type: event.payload.event_type.clone(),
            utm_source: event.payload.utm_source.clone(),
            utm_campaign: event.payload.utm_campaign.clone(),
            page_url: event.payload.page_url.clone(),
            timestamp: event.payload.timestamp.clone(),
        }
    }
}

/// A bucket in a top-N grouping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupCount {
    pub key: String,
    pub count: u64,
}

/// Aggregated view over the events in a window.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyticsSummary {
    pub total_events: u64,
    pub unique_sessions: u64,
    /// Events per UTM source, `direct` when absent
    pub utm_sources: BTreeMap<String, u64>,
    /// Events per campaign, `none` when absent
    pub campaigns: BTreeMap<String, u64>,
    pub event_types: BTreeMap<String, u64>,
    /// Paid search plus paid social
    pub paid_clicks: u64,
    pub google_ads_clicks: u64,
    pub facebook_ads_clicks: u64,
    pub conversions: u64,
    pub form_submissions: u64,
    pub top_sources: Vec<GroupCount>,
    pub top_campaigns: Vec<GroupCount>,
    pub recent_events: Vec<RecentEvent>,
}

/// Summary plus the window it covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyticsReport {
    pub analytics: AnalyticsSummary,
    pub date_range: DateRange,
}

fn bucket(value: Option<&str>, fallback: &str) -> String {
    match value {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => fallback.to_string(),
    }
}

/// Largest buckets first, ties broken by key.
pub fn top_groups(counts: &BTreeMap<String, u64>, limit: usize) -> Vec<GroupCount> {
    let mut groups: Vec<GroupCount> = counts
        .iter()
        .map(|(key, count)| GroupCount {
            key: key.clone(),
            count: *count,
        })
        .collect();
    // BTreeMap order gives key-ascending ties under a stable sort
    groups.sort_by(|a, b| b.count.cmp(&a.count));
    groups.truncate(limit);
    groups
}

/// Compute the analytics report for `events` as of `now`.
///
/// `events` is expected in insertion order.
pub fn summarize(events: &[TrackingEvent], query: &AnalyticsQuery, now: DateTime<Utc>) -> AnalyticsReport {
    let cutoff = query.cutoff(now);
    let selected: Vec<&TrackingEvent> = events.iter().filter(|e| query.matches(e, cutoff)).collect();

    let mut summary = AnalyticsSummary {
        total_events: selected.len() as u64,
        ..Default::default()
    };

    let mut sessions = HashSet::new();

    for event in &selected {
        let p = &event.payload;
        sessions.insert(p.session_id.as_str());

        *summary
            .utm_sources
            .entry(bucket(p.utm_source.as_deref(), DIRECT_SOURCE))
            .or_insert(0) += 1;
        *summary
            .campaigns
            .entry(bucket(p.utm_campaign.as_deref(), NO_VALUE))
            .or_insert(0) += 1;
        *summary.event_types.entry(p.event_type.clone()).or_insert(0) += 1;

        match p.paid_channel() {
            Some(PaidChannel::GoogleAds) => summary.google_ads_clicks += 1,
            Some(PaidChannel::FacebookAds) => summary.facebook_ads_clicks += 1,
            None => {}
        }

        if p.event_type == event_types::CONVERSION {
            summary.conversions += 1;
        }
        if p.event_name.as_deref() == Some(event_names::FORM_SUBMISSION) {
            summary.form_submissions += 1;
        }
    }

    summary.unique_sessions = sessions.len() as u64;
    summary.paid_clicks = summary.google_ads_clicks + summary.facebook_ads_clicks;
    summary.top_sources = top_groups(&summary.utm_sources, TOP_GROUPS_LIMIT);
    summary.top_campaigns = top_groups(&summary.campaigns, TOP_GROUPS_LIMIT);

    // Newest first; on equal timestamps the later insertion wins
    let mut recent: Vec<&TrackingEvent> = selected.into_iter().rev().collect();
    recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    summary.recent_events = recent
        .into_iter()
        .take(RECENT_EVENTS_LIMIT)
        .map(RecentEvent::from)
        .collect();

    AnalyticsReport {
        analytics: summary,
        date_range: DateRange {
            from: cutoff,
            to: now,
            days: query.days,
        },
    }
}
