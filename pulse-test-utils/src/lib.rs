//! PULSE Test Utilities
//!
//! Centralized test infrastructure for the PULSE workspace:
//! - Mock sensor source with call counters and scriptable failures
//! - Mock maintenance model with scripted outputs
//! - Always-failing cache backend for degradation tests
//! - Record fixtures for common scenarios

use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::RwLock;
use std::time::Duration;

use pulse_cache::{CacheBackend, MaintenanceModel, SensorSource};
use pulse_core::{
    CacheError, DataSourceError, ModelError, QueryParams, SensorMetadata, SensorRecord, Timestamp,
};

// ============================================================================
// FIXTURES
// ============================================================================

/// A pressing-line reading on Metal, all channels populated.
pub fn metal_pressing_record(machine_id: i64, timestamp: Timestamp) -> SensorRecord {
    SensorRecord {
        machine_id,
        timestamp,
        temperature: Some(95.0),
        vibration: Some(0.4),
        energy_consumption: Some(82.0),
        data_type: "pressing".to_string(),
        metadata: SensorMetadata {
            material_type: Some("Metal".to_string()),
            pressure_range: Some("High".to_string()),
            ..Default::default()
        },
    }
}

/// A machining reading with no vibration channel (sparse).
pub fn sparse_machining_record(machine_id: i64, timestamp: Timestamp) -> SensorRecord {
    SensorRecord {
        machine_id,
        timestamp,
        temperature: Some(72.0),
        vibration: None,
        energy_consumption: Some(64.0),
        data_type: "machining".to_string(),
        metadata: SensorMetadata {
            material_type: Some("Steel".to_string()),
            coolant_type: Some("Oil-based".to_string()),
            ..Default::default()
        },
    }
}

// ============================================================================
// MOCK SENSOR SOURCE
// ============================================================================

/// In-memory sensor source with per-operation call counters.
///
/// Serves whatever records were inserted, newest first. Flip
/// [`fail`](MockSensorSource::fail) to make every query return a
/// `DataSourceError`.
#[derive(Default)]
pub struct MockSensorSource {
    records: RwLock<Vec<SensorRecord>>,
    failing: AtomicBool,
    record_queries: AtomicUsize,
    window_queries: AtomicUsize,
}

impl MockSensorSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<SensorRecord>) -> Self {
        let source = Self::new();
        source.insert(records);
        source
    }

    pub fn insert(&self, mut records: Vec<SensorRecord>) {
        let mut stored = self.records.write().unwrap();
        stored.append(&mut records);
        stored.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    }

    /// Make subsequent queries fail.
    pub fn fail(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn record_query_count(&self) -> usize {
        self.record_queries.load(Ordering::SeqCst)
    }

    pub fn window_query_count(&self) -> usize {
        self.window_queries.load(Ordering::SeqCst)
    }

    fn check_failing(&self) -> Result<(), DataSourceError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(DataSourceError::Query {
                reason: "mock source failing".to_string(),
            })
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl SensorSource for MockSensorSource {
    async fn query_records(
        &self,
        params: &QueryParams,
    ) -> Result<Vec<SensorRecord>, DataSourceError> {
        self.record_queries.fetch_add(1, Ordering::SeqCst);
        self.check_failing()?;
        let records = self.records.read().unwrap();
        Ok(records
            .iter()
            .filter(|r| params.start_time().map_or(true, |s| r.timestamp >= s))
            .filter(|r| params.end_time().map_or(true, |e| r.timestamp <= e))
            .skip(params.offset() as usize)
            .take(params.limit() as usize)
            .cloned()
            .collect())
    }

    async fn query_recent_window(
        &self,
        window: Duration,
    ) -> Result<Vec<SensorRecord>, DataSourceError> {
        self.window_queries.fetch_add(1, Ordering::SeqCst);
        self.check_failing()?;
        let cutoff = Utc::now() - chrono::Duration::seconds(window.as_secs() as i64);
        let records = self.records.read().unwrap();
        Ok(records
            .iter()
            .filter(|r| r.timestamp >= cutoff)
            .cloned()
            .collect())
    }

    async fn insert_records(&self, records: &[SensorRecord]) -> Result<u64, DataSourceError> {
        self.check_failing()?;
        self.insert(records.to_vec());
        Ok(records.len() as u64)
    }
}

// ============================================================================
// MOCK MODEL
// ============================================================================

/// Maintenance model with scripted outputs and a call counter.
pub struct MockModel {
    outputs: Vec<f64>,
    available: AtomicBool,
    calls: AtomicUsize,
}

impl MockModel {
    /// Model returning the same `[temperature, vibration, energy]` for
    /// every feature vector.
    pub fn returning(outputs: [f64; 3]) -> Self {
        Self {
            outputs: outputs.to_vec(),
            available: AtomicBool::new(true),
            calls: AtomicUsize::new(0),
        }
    }

    /// Model whose artifacts were never loaded.
    pub fn unavailable() -> Self {
        let model = Self::returning([0.0, 0.0, 0.0]);
        model.available.store(false, Ordering::SeqCst);
        model
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MaintenanceModel for MockModel {
    async fn predict(&self, _features: &[f64]) -> Result<Vec<f64>, ModelError> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(ModelError::Unavailable);
        }
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.outputs.clone())
    }
}

// ============================================================================
// FAILING CACHE BACKEND
// ============================================================================

/// Cache backend where every operation reports the backend unreachable.
pub struct UnreachableBackend;

#[async_trait]
impl CacheBackend for UnreachableBackend {
    async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
        Err(CacheError::Unavailable {
            reason: "connection refused".to_string(),
        })
    }

    async fn set(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<(), CacheError> {
        Err(CacheError::Unavailable {
            reason: "connection refused".to_string(),
        })
    }

    async fn ping(&self) -> Result<(), CacheError> {
        Err(CacheError::Unavailable {
            reason: "connection refused".to_string(),
        })
    }
}
