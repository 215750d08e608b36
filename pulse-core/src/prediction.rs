//! Maintenance prediction bundle.
//!
//! A [`PredictionBundle`] is created at most once per calendar-day bucket,
//! cached for the bucket's TTL, and superseded by the next bucket's entry
//! at rollover. It is never mutated in place.

use crate::records::{SensorMetadata, Timestamp};
use serde::{Deserialize, Serialize};

/// One forecast point on a group's predicted timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelinePoint {
    pub timestamp: Timestamp,
    pub temperature: f64,
    pub vibration: f64,
    pub energy: f64,
}

/// Mean sensor readings the forecast was seeded with.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AverageReadings {
    pub temperature: f64,
    pub vibration: f64,
    pub energy: f64,
}

/// Maintenance prediction for one `(data_type, metadata)` group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupPrediction {
    pub data_type: String,
    pub metadata: SensorMetadata,
    pub maintenance_needed: bool,
    /// In `[0, 1]`, capped at 0.95 so the feed never claims certainty.
    pub probability: f64,
    pub estimated_time_to_maintenance: String,
    pub issues: Vec<String>,
    pub average_readings: AverageReadings,
    pub timeline: Vec<TimelinePoint>,
}

/// The daily maintenance-prediction feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionBundle {
    pub last_updated: Timestamp,
    pub groups: Vec<GroupPrediction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl PredictionBundle {
    /// Bundle for a bucket with no recent readings: empty groups plus a
    /// descriptive message. Not an error condition.
    pub fn empty(last_updated: Timestamp, message: impl Into<String>) -> Self {
        Self {
            last_updated,
            groups: Vec::new(),
            message: Some(message.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn empty_bundle_carries_message() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        let bundle = PredictionBundle::empty(now, "No sensor data available for predictions");
        assert!(bundle.groups.is_empty());
        assert!(!bundle.message.as_deref().unwrap().is_empty());
    }

    #[test]
    fn message_is_omitted_when_absent() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        let bundle = PredictionBundle {
            last_updated: now,
            groups: Vec::new(),
            message: None,
        };
        let encoded = serde_json::to_value(&bundle).unwrap();
        assert!(!encoded.as_object().unwrap().contains_key("message"));
    }
}
