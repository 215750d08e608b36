//! Error types for PULSE operations.
//!
//! The taxonomy separates faults by who can act on them:
//!
//! - [`ValidationError`]: caller-fixable input errors, never retried.
//! - [`CacheError`]: cache backend faults. These never reach the end
//!   caller - the cache store logs them and degrades to a miss.
//! - [`DataSourceError`]: source-of-truth failures, retryable server-side.
//! - [`ModelError`]: prediction model failures, a "service not ready"
//!   condition retryable after the model is provisioned.

use crate::records::Timestamp;
use std::time::Duration;
use thiserror::Error;

/// Caller-fixable input errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field} out of range: {value} (allowed {min}..={max})")]
    OutOfRange {
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },

    #[error("invalid time range: start {start} is after end {end}")]
    InvalidTimeRange { start: Timestamp, end: Timestamp },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Cache backend faults.
///
/// Internal to the cache layer: the store absorbs these, logs them, and
/// reports a miss. They exist as a type so backends stay honest about
/// failure instead of silently returning `None`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("cache backend unreachable: {reason}")]
    Unavailable { reason: String },

    #[error("cached payload for {key} failed to decode: {reason}")]
    Decode { key: String, reason: String },

    #[error("payload failed to encode: {reason}")]
    Encode { reason: String },
}

/// Source-of-truth query failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DataSourceError {
    #[error("connection pool error: {reason}")]
    Pool { reason: String },

    #[error("query failed: {reason}")]
    Query { reason: String },

    #[error("row decode failed: {reason}")]
    Decode { reason: String },

    #[error("source-of-truth query timed out after {timeout:?}")]
    Timeout { timeout: Duration },
}

/// Prediction model failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("prediction model not available; train and provision the model first")]
    Unavailable,

    #[error("model artifact invalid: {reason}")]
    Artifact { reason: String },

    #[error("inference failed: {reason}")]
    Inference { reason: String },

    #[error("model inference timed out after {timeout:?}")]
    Timeout { timeout: Duration },
}

/// Aggregate error for operations that can fail in more than one layer.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PulseError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    DataSource(#[from] DataSourceError),

    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Result alias used across PULSE crates.
pub type PulseResult<T> = Result<T, PulseError>;

impl PulseError {
    /// Whether a caller may retry the same request unchanged and expect it
    /// to eventually succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            PulseError::Validation(_) => false,
            PulseError::DataSource(_) => true,
            PulseError::Model(_) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryability_follows_taxonomy() {
        let validation: PulseError = ValidationError::OutOfRange {
            field: "limit",
            value: 0,
            min: 1,
            max: 5000,
        }
        .into();
        assert!(!validation.is_retryable());

        let source: PulseError = DataSourceError::Query {
            reason: "connection reset".to_string(),
        }
        .into();
        assert!(source.is_retryable());

        let model: PulseError = ModelError::Unavailable.into();
        assert!(model.is_retryable());
    }

    #[test]
    fn display_includes_bounds() {
        let err = ValidationError::OutOfRange {
            field: "limit",
            value: 9999,
            min: 1,
            max: 5000,
        };
        let msg = err.to_string();
        assert!(msg.contains("limit"));
        assert!(msg.contains("9999"));
        assert!(msg.contains("5000"));
    }
}
