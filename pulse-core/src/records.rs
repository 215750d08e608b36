//! Sensor reading structures.
//!
//! A [`SensorRecord`] is one row from the source-of-truth: immutable once
//! written, and serialized sparsely - fields that were not recorded are
//! omitted from the encoded output rather than emitted as explicit nulls.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Process metadata attached to a sensor reading.
///
/// The field set is fixed by the source-of-truth schema; every field is
/// optional because each manufacturing process populates its own subset
/// (pressing lines carry material/pressure fields, machining centers carry
/// cutting-speed/coolant fields, and so on).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SensorMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub material_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pressure_range: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub material_thickness: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cutting_speed: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coolant_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_speed: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<i64>,
}

impl SensorMetadata {
    /// Canonical string over populated fields, used to group readings that
    /// came from the same process configuration.
    ///
    /// Field order is fixed, so two metadata values with the same populated
    /// fields always produce the same key. Floats are rendered with their
    /// full `Display` form; the values originate from the same rows, so
    /// equal configurations render identically.
    pub fn group_key(&self) -> String {
        let mut key = String::new();
        let mut push = |name: &str, value: Option<String>| {
            if let Some(v) = value {
                if !key.is_empty() {
                    key.push('|');
                }
                let _ = write!(key, "{}={}", name, v);
            }
        };
        push("material_type", self.material_type.clone());
        push("pressure_range", self.pressure_range.clone());
        push("material_thickness", self.material_thickness.map(|v| v.to_string()));
        push("cutting_speed", self.cutting_speed.clone());
        push("coolant_type", self.coolant_type.clone());
        push("product_type", self.product_type.clone());
        push("line_speed", self.line_speed.map(|v| v.to_string()));
        push("batch_size", self.batch_size.map(|v| v.to_string()));
        key
    }

    /// True when no metadata field is populated.
    pub fn is_empty(&self) -> bool {
        self.material_type.is_none()
            && self.pressure_range.is_none()
            && self.material_thickness.is_none()
            && self.cutting_speed.is_none()
            && self.coolant_type.is_none()
            && self.product_type.is_none()
            && self.line_speed.is_none()
            && self.batch_size.is_none()
    }
}

/// One time-series reading from an industrial machine.
///
/// Immutable once written to the source-of-truth; the cache only ever holds
/// copies. Sensor channels are optional: a machine that does not report a
/// channel simply omits it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorRecord {
    pub machine_id: i64,
    pub timestamp: Timestamp,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vibration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub energy_consumption: Option<f64>,
    pub data_type: String,
    #[serde(default, skip_serializing_if = "SensorMetadata::is_empty")]
    pub metadata: SensorMetadata,
}
