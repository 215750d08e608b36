//! PULSE Core - Entity Types
//!
//! Pure data structures for the PULSE sensor telemetry service. All other
//! crates depend on this. This crate contains ONLY data types, the threshold
//! table, and the error taxonomy - no I/O, no async, no business logic.

pub mod error;
pub mod prediction;
pub mod query;
pub mod records;
pub mod thresholds;

pub use error::{
    CacheError, DataSourceError, ModelError, PulseError, PulseResult, ValidationError,
};
pub use prediction::{AverageReadings, GroupPrediction, PredictionBundle, TimelinePoint};
pub use query::{QueryParams, MAX_LIMIT, MIN_LIMIT};
pub use records::{SensorMetadata, SensorRecord, Timestamp};
pub use thresholds::Thresholds;
