//! Maintenance threshold table.
//!
//! Thresholds are conditioned on the data type and, within a data type, on
//! process metadata: material overrides first, then speed overrides, then
//! the data-type default. The numbers are design constants carried over
//! from the maintenance engineering review, not derived at runtime.

use crate::records::SensorMetadata;

/// Cutting-speed label that triggers the high-speed machining thresholds.
pub const HIGH_CUTTING_SPEED: &str = "High (15000+)";

/// Per-channel alert thresholds for one process configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub temperature: f64,
    pub vibration: f64,
    pub energy: f64,
}

impl Thresholds {
    const fn new(temperature: f64, vibration: f64, energy: f64) -> Self {
        Self {
            temperature,
            vibration,
            energy,
        }
    }

    /// Resolve the thresholds for a `(data_type, metadata)` group.
    ///
    /// Precedence: material override, then cutting-speed override, then the
    /// data-type default; unknown data types fall back to the global
    /// default.
    pub fn for_group(data_type: &str, metadata: &SensorMetadata) -> Self {
        match data_type {
            "pressing" => match metadata.material_type.as_deref() {
                Some("Metal") => Self::new(100.0, 80.0, 95.0),
                Some("Plastic") => Self::new(60.0, 50.0, 70.0),
                _ => Self::new(80.0, 70.0, 90.0),
            },
            "machining" => {
                if metadata.material_type.as_deref() == Some("Titanium") {
                    Self::new(120.0, 90.0, 95.0)
                } else if metadata.cutting_speed.as_deref() == Some(HIGH_CUTTING_SPEED) {
                    Self::new(100.0, 85.0, 90.0)
                } else {
                    Self::new(80.0, 70.0, 85.0)
                }
            }
            _ => Self::new(80.0, 70.0, 90.0),
        }
    }
}
