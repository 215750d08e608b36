//! Source-of-truth seam.
//!
//! The cache layer never talks to a database directly; it goes through
//! [`SensorSource`], which the API crate implements over PostgreSQL and
//! tests implement with in-memory fixtures.

use async_trait::async_trait;
use pulse_core::{DataSourceError, QueryParams, SensorRecord};
use std::time::Duration;

/// The durable store holding sensor readings, authoritative over cache
/// contents.
#[async_trait]
pub trait SensorSource: Send + Sync {
    /// Records matching the parameter tuple, newest first, with offset and
    /// limit already applied.
    async fn query_records(
        &self,
        params: &QueryParams,
    ) -> Result<Vec<SensorRecord>, DataSourceError>;

    /// All records with `timestamp >= now - window`, newest first.
    async fn query_recent_window(
        &self,
        window: Duration,
    ) -> Result<Vec<SensorRecord>, DataSourceError>;

    /// Append records. Returns the number of rows written.
    async fn insert_records(&self, records: &[SensorRecord]) -> Result<u64, DataSourceError>;
}
