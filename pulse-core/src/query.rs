//! Query parameter tuple for sensor-data reads.
//!
//! [`QueryParams`] can only be built through the validating constructor, so
//! a value that exists is a value within bounds. Fields are private: the
//! tuple is immutable once constructed and is never mutated after a cache
//! lookup has been derived from it.

use crate::error::ValidationError;
use crate::records::Timestamp;

/// Smallest accepted page size.
pub const MIN_LIMIT: i64 = 1;
/// Largest accepted page size.
pub const MAX_LIMIT: i64 = 5000;

/// Validated query parameters for a sensor-data fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryParams {
    start_time: Option<Timestamp>,
    end_time: Option<Timestamp>,
    limit: i64,
    offset: i64,
}

impl QueryParams {
    /// Validate and construct a parameter tuple.
    ///
    /// `limit` must be in `[MIN_LIMIT, MAX_LIMIT]`, `offset` non-negative,
    /// and `start_time <= end_time` when both bounds are given.
    pub fn new(
        start_time: Option<Timestamp>,
        end_time: Option<Timestamp>,
        limit: i64,
        offset: i64,
    ) -> Result<Self, ValidationError> {
        if !(MIN_LIMIT..=MAX_LIMIT).contains(&limit) {
            return Err(ValidationError::OutOfRange {
                field: "limit",
                value: limit,
                min: MIN_LIMIT,
                max: MAX_LIMIT,
            });
        }
        if offset < 0 {
            return Err(ValidationError::OutOfRange {
                field: "offset",
                value: offset,
                min: 0,
                max: i64::MAX,
            });
        }
        if let (Some(start), Some(end)) = (start_time, end_time) {
            if start > end {
                return Err(ValidationError::InvalidTimeRange { start, end });
            }
        }
        Ok(Self {
            start_time,
            end_time,
            limit,
            offset,
        })
    }

    /// Default page: latest 1000 readings, no time bounds.
    pub fn latest() -> Self {
        Self {
            start_time: None,
            end_time: None,
            limit: 1000,
            offset: 0,
        }
    }

    pub fn start_time(&self) -> Option<Timestamp> {
        self.start_time
    }

    pub fn end_time(&self) -> Option<Timestamp> {
        self.end_time
    }

    pub fn limit(&self) -> i64 {
        self.limit
    }

    pub fn offset(&self) -> i64 {
        self.offset
    }
}
