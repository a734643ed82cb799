//! Standardized API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use delivery::{DeliveryReport, RetryReport};
use serde::{Deserialize, Serialize};
use studio_core::{AnalyticsReport, FieldErrors, FieldIssue};
use telemetry::{ComponentHealthReport, HealthStatus};
use tracing::error;

/// Success response for a recorded tracking event.
#[derive(Debug, Serialize, Deserialize)]
pub struct TrackingResponse {
    pub success: bool,
    pub id: String,
    pub message: String,
}

impl TrackingResponse {
    pub fn recorded(id: impl Into<String>) -> Self {
        Self {
            success: true,
            id: id.into(),
            message: "Tracking data received successfully".to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AnalyticsResponse {
    pub success: bool,
    #[serde(flatten)]
    pub report: AnalyticsReport,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ClearResponse {
    pub success: bool,
    pub message: String,
    pub cleared: usize,
}

impl ClearResponse {
    pub fn cleared(count: usize) -> Self {
        Self {
            success: true,
            message: format!("Cleared {} tracking events", count),
            cleared: count,
        }
    }
}

/// Confirmation for a submitted lead, including delivery details.
#[derive(Debug, Serialize, Deserialize)]
pub struct LeadResponse {
    pub success: bool,
    #[serde(flatten)]
    pub report: DeliveryReport,
}

impl From<DeliveryReport> for LeadResponse {
    fn from(report: DeliveryReport) -> Self {
        Self {
            success: true,
            report,
        }
    }
}

/// Outcome of re-sending the cached leads.
#[derive(Debug, Serialize, Deserialize)]
pub struct RetryResponse {
    pub success: bool,
    #[serde(flatten)]
    pub report: RetryReport,
}

impl From<RetryReport> for RetryResponse {
    fn from(report: RetryReport) -> Self {
        Self {
            success: true,
            report,
        }
    }
}

/// Retry requested with nothing cached.
#[derive(Debug, Serialize, Deserialize)]
pub struct NothingPendingResponse {
    pub success: bool,
    pub retried: usize,
    pub remaining: usize,
    pub message: String,
}

impl Default for NothingPendingResponse {
    fn default() -> Self {
        Self {
            success: true,
            retried: 0,
            remaining: 0,
            message: "No pending submission".to_string(),
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub webhook_healthy: bool,
    pub pending_cache_writable: bool,
    pub stored_events: usize,
    pub components: Vec<ComponentHealthReport>,
}

/// Error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldIssue>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<FieldErrors>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            code: None,
            details: None,
            fields: None,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_details(mut self, details: Vec<FieldIssue>) -> Self {
        self.details = Some(details);
        self
    }

    pub fn with_fields(mut self, fields: FieldErrors) -> Self {
        self.fields = Some(fields);
        self
    }
}

/// API error type with error codes.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub response: ErrorResponse,
}

impl ApiError {
    pub fn with_code(status: StatusCode, code: impl Into<String>, msg: impl Into<String>) -> Self {
        Self {
            status,
            response: ErrorResponse::new(msg).with_code(code),
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::with_code(StatusCode::BAD_REQUEST, "VALID_001", msg)
    }

    /// Generic 500; the cause is logged, never returned.
    pub fn internal(cause: impl std::fmt::Display) -> Self {
        error!(error = %cause, "Request failed");
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            response: ErrorResponse::new("Internal server error"),
        }
    }

    /// Lead form rejected with a per-field message map.
    pub fn invalid_form(fields: FieldErrors) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            response: ErrorResponse::new("Invalid form data")
                .with_code("VALID_002")
                .with_fields(fields),
        }
    }

    /// Tracking payload rejected; every problem is listed in `details`.
    pub fn invalid_tracking(err: studio_core::Error) -> Self {
        let code = err.error_code().unwrap_or("VALID_001");
        let details = match err {
            studio_core::Error::InvalidFields(issues) => issues,
            studio_core::Error::ValidationWithCode { message, .. } => {
                vec![FieldIssue::new("body", message)]
            }
            studio_core::Error::Validation(msg) => vec![FieldIssue::new("body", msg)],
            studio_core::Error::Serialization(e) => vec![FieldIssue::new("body", e.to_string())],
            other => return Self::internal(other),
        };

        Self {
            status: StatusCode::BAD_REQUEST,
            response: ErrorResponse::new("Invalid tracking data")
                .with_code(code)
                .with_details(details),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.response)).into_response()
    }
}

impl From<studio_core::Error> for ApiError {
    fn from(err: studio_core::Error) -> Self {
        match err {
            studio_core::Error::ValidationWithCode { code, message, http_status } => {
                let status = StatusCode::from_u16(http_status).unwrap_or(StatusCode::BAD_REQUEST);
                ApiError::with_code(status, code, message)
            }
            studio_core::Error::InvalidFields(issues) => Self {
                status: StatusCode::BAD_REQUEST,
                response: ErrorResponse::new("Validation failed")
                    .with_code("VALID_002")
                    .with_details(issues),
            },
            studio_core::Error::Validation(msg) => ApiError::bad_request(msg),
            studio_core::Error::Serialization(e) => ApiError::bad_request(e.to_string()),
            other => ApiError::internal(other),
        }
    }
}
