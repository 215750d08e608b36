//! Error types for the PULSE API layer.
//!
//! [`ApiError`] is the wire shape every endpoint returns on failure:
//! an [`ErrorCode`] categorizing the fault, a message, and optional
//! details, serialized as JSON with the matching HTTP status. Conversions
//! from the core taxonomy keep the mapping in one place so handlers just
//! use `?`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use pulse_core::{DataSourceError, ModelError, PulseError, ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// ERROR CODE ENUM
// ============================================================================

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Request validation failed (caller-fixable, never retried)
    ValidationFailed,

    /// Field value is out of valid range
    InvalidRange,

    /// Request contains invalid input data
    InvalidInput,

    /// Source-of-truth query failed (retryable)
    DataSourceError,

    /// Prediction model not provisioned (retry after training)
    ModelUnavailable,

    /// Operation timed out
    Timeout,

    /// Requested resource does not exist
    NotFound,

    /// Internal server error
    InternalError,
}

impl ErrorCode {
    /// Get the HTTP status code for this error code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::ValidationFailed | ErrorCode::InvalidRange | ErrorCode::InvalidInput => {
                StatusCode::BAD_REQUEST
            }
            ErrorCode::DataSourceError | ErrorCode::InternalError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ErrorCode::ModelUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorCode::Timeout => StatusCode::GATEWAY_TIMEOUT,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
        }
    }

    /// Whether a caller may retry the same request unchanged.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            ErrorCode::ValidationFailed
                | ErrorCode::InvalidRange
                | ErrorCode::InvalidInput
                | ErrorCode::NotFound
        )
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

// ============================================================================
// API ERROR STRUCT
// ============================================================================

/// Structured error response for API operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code categorizing the error
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,

    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn status_code(&self) -> StatusCode {
        self.code.status_code()
    }

    pub fn validation_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationFailed, message)
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    pub fn data_source_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DataSourceError, message)
    }

    pub fn model_unavailable() -> Self {
        Self::new(
            ErrorCode::ModelUnavailable,
            "Prediction model not available. Please train the model first.",
        )
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Timeout, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

// ============================================================================
// AXUM INTEGRATION
// ============================================================================

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(self)).into_response()
    }
}

// ============================================================================
// CONVERSIONS FROM THE CORE TAXONOMY
// ============================================================================

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        match &err {
            ValidationError::OutOfRange { .. } => Self::new(ErrorCode::InvalidRange, err.to_string()),
            _ => Self::validation_failed(err.to_string()),
        }
    }
}

impl From<DataSourceError> for ApiError {
    fn from(err: DataSourceError) -> Self {
        tracing::error!(error = %err, "source-of-truth failure");
        match err {
            DataSourceError::Timeout { .. } => Self::timeout(err.to_string()),
            // Generic message on the wire: internal query details stay in
            // the logs.
            _ => Self::data_source_error("Failed to query sensor data"),
        }
    }
}

impl From<ModelError> for ApiError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::Unavailable => Self::model_unavailable(),
            ModelError::Timeout { .. } => Self::timeout(err.to_string()),
            other => {
                tracing::error!(error = %other, "model failure");
                Self::internal_error("Error generating predictions")
            }
        }
    }
}

impl From<PulseError> for ApiError {
    fn from(err: PulseError) -> Self {
        match err {
            PulseError::Validation(e) => e.into(),
            PulseError::DataSource(e) => e.into(),
            PulseError::Model(e) => e.into(),
        }
    }
}

impl From<deadpool_postgres::PoolError> for ApiError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        tracing::error!(error = ?err, "connection pool error");
        Self::data_source_error("Failed to acquire database connection")
    }
}

// ============================================================================
// RESULT TYPE ALIAS
// ============================================================================

/// Result alias for API operations.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_taxonomy() {
        assert_eq!(
            ApiError::from(ValidationError::OutOfRange {
                field: "limit",
                value: 0,
                min: 1,
                max: 5000,
            })
            .status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(DataSourceError::Query {
                reason: "boom".to_string()
            })
            .status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::from(ModelError::Unavailable).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ApiError::from(DataSourceError::Timeout {
                timeout: std::time::Duration::from_secs(10)
            })
            .status_code(),
            StatusCode::GATEWAY_TIMEOUT
        );
    }

    #[test]
    fn retryability_split() {
        assert!(!ErrorCode::ValidationFailed.is_retryable());
        assert!(!ErrorCode::InvalidRange.is_retryable());
        assert!(ErrorCode::DataSourceError.is_retryable());
        assert!(ErrorCode::ModelUnavailable.is_retryable());
        assert!(ErrorCode::Timeout.is_retryable());
    }

    #[test]
    fn query_details_stay_out_of_the_response() {
        let err = ApiError::from(DataSourceError::Query {
            reason: "password authentication failed for user".to_string(),
        });
        assert!(!err.message.contains("password"));
    }
}
