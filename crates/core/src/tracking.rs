//! Tracking event types and payload validation.
//!
//! The site's tracking client posts flat snake_case JSON. Required fields are
//! checked by hand first so that every offending field is reported, then the
//! typed payload runs through the `validator` length rules.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;
use validator::Validate;

use crate::attribution::{paid_channel, PaidChannel, UtmParams};
use crate::error::{Error, FieldIssue, Result, ValidationErrorCode};

/// Fields that must be present as strings.
pub const REQUIRED_FIELDS: [&str; 6] = [
    "event_type",
    "timestamp",
    "page_url",
    "referrer",
    "user_agent",
    "session_id",
];

/// Fields that, when present and non-null, must be strings.
pub const OPTIONAL_FIELDS: [&str; 11] = [
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_content",
    "utm_term",
    "gclid",
    "fbclid",
    "page_name",
    "event_name",
    "form_name",
    "button_name",
];

/// Well known event types emitted by the site.
pub mod event_types {
    pub const PAGE_VIEW: &str = "page_view";
    pub const CONVERSION: &str = "conversion";
}

/// Well known conversion names.
pub mod event_names {
    pub const FORM_SUBMISSION: &str = "form_submission";
    pub const BUTTON_CLICK: &str = "button_click";
}

/// Tracking payload as received from the site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct TrackingPayload {
    #[validate(length(min = 1, max = 64, message = "must be 1-64 characters"))]
    pub event_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 256, message = "must be at most 256 characters"))]
    pub utm_source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 256, message = "must be at most 256 characters"))]
    pub utm_medium: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 256, message = "must be at most 256 characters"))]
    pub utm_campaign: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 256, message = "must be at most 256 characters"))]
    pub utm_content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 256, message = "must be at most 256 characters"))]
    pub utm_term: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 256, message = "must be at most 256 characters"))]
    pub gclid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 256, message = "must be at most 256 characters"))]
    pub fbclid: Option<String>,

    /// Client-side ISO timestamp
    #[validate(length(min = 1, max = 64, message = "must be 1-64 characters"))]
    pub timestamp: String,
    #[validate(length(min = 1, max = 2048, message = "must be 1-2048 characters"))]
    pub page_url: String,
    /// May be empty for direct visits
    #[validate(length(max = 2048, message = "must be at most 2048 characters"))]
    pub referrer: String,
    #[validate(length(min = 1, max = 512, message = "must be 1-512 characters"))]
    pub user_agent: String,
    #[validate(length(min = 1, max = 128, message = "must be 1-128 characters"))]
    pub session_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 256, message = "must be at most 256 characters"))]
    pub page_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 64, message = "must be at most 64 characters"))]
    pub event_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 256, message = "must be at most 256 characters"))]
    pub form_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 256, message = "must be at most 256 characters"))]
    pub button_name: Option<String>,
}

impl TrackingPayload {
    /// Parse and validate a tracking payload from JSON bytes.
    ///
    /// Unknown fields are ignored.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let value: Value = serde_json::from_slice(bytes).map_err(|e| {
            Error::validation_code(ValidationErrorCode::InvalidFormat, format!("invalid JSON: {}", e))
        })?;
        Self::from_value(value)
    }

    /// Validate an already decoded JSON value.
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(obj) = &value else {
            return Err(Error::validation_code(
                ValidationErrorCode::InvalidFormat,
                "request body must be a JSON object",
            ));
        };

        let mut issues = Vec::new();

        for field in REQUIRED_FIELDS {
            match obj.get(field) {
                None | Some(Value::Null) => issues.push(FieldIssue::new(field, "Required")),
                Some(Value::String(s)) if s.trim().is_empty() && field != "referrer" => {
                    issues.push(FieldIssue::new(field, "Must not be empty"))
                }
                Some(Value::String(_)) => {}
                Some(other) => issues.push(type_issue(field, other)),
            }
        }

        for field in OPTIONAL_FIELDS {
            match obj.get(field) {
                None | Some(Value::Null) | Some(Value::String(_)) => {}
                Some(other) => issues.push(type_issue(field, other)),
            }
        }

        if !issues.is_empty() {
            return Err(Error::invalid_fields(issues));
        }

        let payload: TrackingPayload = serde_json::from_value(value)?;

        if let Err(errors) = payload.validate() {
            let mut issues: Vec<FieldIssue> = errors
                .field_errors()
                .into_iter()
                .flat_map(|(field, errs)| {
                    let field = field.to_string();
                    errs.iter().map(move |e| {
                        let message = e
                            .message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| format!("failed '{}' check", e.code));
                        FieldIssue::new(field.clone(), message)
                    })
                })
                .collect();
            issues.sort_by(|a, b| a.field.cmp(&b.field));
            return Err(Error::invalid_fields(issues));
        }

        Ok(payload)
    }

    /// UTM parameters and click identifiers carried by this payload.
    pub fn utm_params(&self) -> UtmParams {
        UtmParams {
            utm_source: self.utm_source.clone(),
            utm_medium: self.utm_medium.clone(),
            utm_campaign: self.utm_campaign.clone(),
            utm_content: self.utm_content.clone(),
            utm_term: self.utm_term.clone(),
            gclid: self.gclid.clone(),
            fbclid: self.fbclid.clone(),
        }
    }

    pub fn paid_channel(&self) -> Option<PaidChannel> {
        paid_channel(
            self.gclid.as_deref(),
            self.fbclid.as_deref(),
            self.utm_source.as_deref(),
            self.utm_medium.as_deref(),
        )
    }
}

fn type_issue(field: &str, value: &Value) -> FieldIssue {
    let received = match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    };
    FieldIssue::new(field, format!("Expected string, received {}", received))
}

/// A stored tracking event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingEvent {
    /// Unique event ID
    pub id: String,
    #[serde(flatten)]
    pub payload: TrackingPayload,
    /// Client IP, "unknown" when not forwarded
    pub ip_address: String,
    /// Server receive timestamp
    pub created_at: DateTime<Utc>,
}

impl TrackingEvent {
    /// Creates an event with a fresh ID.
    pub fn new(payload: TrackingPayload, ip_address: Option<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: generate_event_id(created_at),
            payload,
            ip_address: ip_address.unwrap_or_else(|| "unknown".to_string()),
            created_at,
        }
    }
}

/// Generate an event ID of the form `track_<unix-ms>_<9 chars>`.
pub fn generate_event_id(at: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("track_{}_{}", at.timestamp_millis(), &suffix[..9])
}
