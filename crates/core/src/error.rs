//! Unified error types for the studio service.
//!
//! Error codes:
//! - VALID_001-003: Validation errors
//! - STORE_001: Local storage errors
//! - DELIVERY_001: Webhook delivery errors

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Validation error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorCode {
    /// VALID_001: Invalid JSON / Invalid format
    InvalidFormat,
    /// VALID_002: One or more fields failed validation
    InvalidFields,
    /// VALID_003: Payload exceeds size limit
    PayloadTooLarge,
}

impl ValidationErrorCode {
    /// Get the error code string.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidFormat => "VALID_001",
            Self::InvalidFields => "VALID_002",
            Self::PayloadTooLarge => "VALID_003",
        }
    }

    /// Get the HTTP status code.
    pub fn http_status(&self) -> u16 {
        400
    }
}

/// Storage error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorCode {
    /// STORE_001: Failed to read or write local storage
    StoreFailed,
}

impl StoreErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            Self::StoreFailed => "STORE_001",
        }
    }

    pub fn http_status(&self) -> u16 {
        500
    }
}

/// Delivery error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryErrorCode {
    /// DELIVERY_001: Webhook attempt failed
    AttemptFailed,
}

impl DeliveryErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            Self::AttemptFailed => "DELIVERY_001",
        }
    }

    pub fn http_status(&self) -> u16 {
        502
    }
}

/// A single offending field in a rejected payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldIssue {
    pub field: String,
    pub message: String,
}

impl FieldIssue {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Unified error type for the studio service.
#[derive(Debug, Error)]
pub enum Error {
    /// Validation error with code.
    #[error("[{code}] {message}")]
    ValidationWithCode {
        code: &'static str,
        message: String,
        http_status: u16,
    },

    /// Payload rejected with per-field details.
    #[error("invalid fields: {}", format_issues(.0))]
    InvalidFields(Vec<FieldIssue>),

    /// Storage error with code.
    #[error("[{code}] {message}")]
    Store {
        code: &'static str,
        message: String,
        http_status: u16,
    },

    /// Delivery error with code.
    #[error("[{code}] {message}")]
    Delivery {
        code: &'static str,
        message: String,
        http_status: u16,
    },

    #[error("validation error: {0}")]
    Validation(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

fn format_issues(issues: &[FieldIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl Error {
    /// Create a validation error with code.
    pub fn validation_code(code: ValidationErrorCode, msg: impl Into<String>) -> Self {
        Self::ValidationWithCode {
            code: code.code(),
            message: msg.into(),
            http_status: code.http_status(),
        }
    }

    /// Create a storage error.
    pub fn store(code: StoreErrorCode, msg: impl Into<String>) -> Self {
        Self::Store {
            code: code.code(),
            message: msg.into(),
            http_status: code.http_status(),
        }
    }

    /// Create a delivery error.
    pub fn delivery(code: DeliveryErrorCode, msg: impl Into<String>) -> Self {
        Self::Delivery {
            code: code.code(),
            message: msg.into(),
            http_status: code.http_status(),
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_fields(issues: Vec<FieldIssue>) -> Self {
        Self::InvalidFields(issues)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Get the HTTP status code for this error.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::ValidationWithCode { http_status, .. } => *http_status,
            Self::Store { http_status, .. } => *http_status,
            Self::Delivery { http_status, .. } => *http_status,
            Self::InvalidFields(_) => 400,
            Self::Validation(_) => 400,
            Self::Serialization(_) => 400,
            Self::Io(_) => 500,
            Self::Internal(_) => 500,
        }
    }

    /// Get the error code if this is a coded error.
    pub fn error_code(&self) -> Option<&'static str> {
        match self {
            Self::ValidationWithCode { code, .. } => Some(code),
            Self::Store { code, .. } => Some(code),
            Self::Delivery { code, .. } => Some(code),
            Self::InvalidFields(_) => Some(ValidationErrorCode::InvalidFields.code()),
            _ => None,
        }
    }
}
