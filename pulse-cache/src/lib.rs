//! PULSE Cache - Read-Through Caching Layer
//!
//! This crate implements the caching core of PULSE:
//!
//! - **Fingerprint**: deterministic cache keys derived from query parameters
//!   (`fingerprint.rs`)
//! - **Cache backends**: pluggable key/value stores with per-entry TTL -
//!   Redis for deployments, in-memory for tests and single-node use
//!   (`backend.rs`)
//! - **Cache store**: the degradation boundary - backend faults are logged
//!   and reported as misses, never escalated to the request path
//!   (`store.rs`)
//! - **Query cache**: read-through cache over the sensor source-of-truth
//!   with a 60-second TTL (`read_through.rs`)
//! - **Prediction cache**: day-bucketed cache over the maintenance forecast
//!   with a 24-hour TTL and a single-flight recompute guard
//!   (`predictions.rs`, `singleflight.rs`, `forecast.rs`)
//!
//! # Degradation contract
//!
//! Cache faults never abort a request: a dead backend turns every read into
//! a miss and every write into a logged no-op, and callers fall through to
//! the source-of-truth. Source-of-truth and model faults DO abort, with
//! typed errors the caller can branch on.

pub mod backend;
pub mod fingerprint;
pub mod forecast;
pub mod model;
pub mod predictions;
pub mod read_through;
pub mod settings;
pub mod singleflight;
pub mod source;
pub mod store;

pub use backend::{CacheBackend, MemoryBackend, RedisBackend};
pub use fingerprint::Fingerprint;
pub use forecast::ForecastEngine;
pub use model::{MaintenanceModel, FEATURE_LEN, OUTPUT_LEN};
pub use predictions::PredictionCache;
pub use read_through::QueryCache;
pub use settings::CacheSettings;
pub use singleflight::FlightDeck;
pub use source::SensorSource;
pub use store::CacheStore;
