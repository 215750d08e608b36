//! Maintenance forecast engine.
//!
//! Turns a window of raw readings into a [`PredictionBundle`]: group by
//! process configuration, seed the model with each group's mean readings,
//! walk the forecast grid, and score threshold violations into issues and
//! a maintenance probability.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Datelike, Timelike};
use pulse_core::{
    AverageReadings, GroupPrediction, ModelError, PredictionBundle, SensorMetadata, SensorRecord,
    Thresholds, TimelinePoint, Timestamp,
};

use crate::model::{MaintenanceModel, OUTPUT_LEN};
use crate::settings::CacheSettings;

/// Probability cap: the feed never claims certainty.
const MAX_PROBABILITY: f64 = 0.95;

/// Forecast engine over a prediction model.
pub struct ForecastEngine<M: MaintenanceModel> {
    model: Arc<M>,
    settings: CacheSettings,
}

/// Per-group accumulator for channel means.
#[derive(Default)]
struct GroupAccum {
    data_type: String,
    metadata: SensorMetadata,
    temperature: ChannelMean,
    vibration: ChannelMean,
    energy: ChannelMean,
}

#[derive(Default)]
struct ChannelMean {
    sum: f64,
    count: u32,
}

impl ChannelMean {
    fn push(&mut self, value: Option<f64>) {
        if let Some(v) = value {
            self.sum += v;
            self.count += 1;
        }
    }

    /// Mean over populated readings; zero when the channel never reported.
    fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }
}

impl<M: MaintenanceModel> ForecastEngine<M> {
    pub fn new(model: Arc<M>, settings: CacheSettings) -> Self {
        Self { model, settings }
    }

    pub fn model(&self) -> &Arc<M> {
        &self.model
    }

    /// Compute the bundle for a window of readings.
    ///
    /// An empty window is not an error: the result is a bundle with empty
    /// groups and a descriptive message. Model faults abort the whole
    /// computation - a partially scored bundle is never returned.
    pub async fn forecast(
        &self,
        readings: &[SensorRecord],
        now: Timestamp,
    ) -> Result<PredictionBundle, ModelError> {
        if readings.is_empty() {
            return Ok(PredictionBundle::empty(
                now,
                "No sensor data available for predictions",
            ));
        }

        let grid = self.forecast_grid(now);
        let mut groups = Vec::new();
        for accum in group_readings(readings).into_values() {
            groups.push(self.forecast_group(accum, &grid).await?);
        }

        Ok(PredictionBundle {
            last_updated: now,
            groups,
            message: None,
        })
    }

    /// Forecast timestamps: `forecast_points` steps from the bucket day's
    /// midnight UTC.
    fn forecast_grid(&self, now: Timestamp) -> Vec<Timestamp> {
        let midnight = now
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .expect("midnight is always a valid time")
            .and_utc();
        let step = chrono::Duration::seconds(self.settings.forecast_step.as_secs() as i64);
        (0..self.settings.forecast_points)
            .map(|i| midnight + step * i as i32)
            .collect()
    }

    async fn forecast_group(
        &self,
        accum: GroupAccum,
        grid: &[Timestamp],
    ) -> Result<GroupPrediction, ModelError> {
        let averages = AverageReadings {
            temperature: accum.temperature.mean(),
            vibration: accum.vibration.mean(),
            energy: accum.energy.mean(),
        };

        let mut timeline = Vec::with_capacity(grid.len());
        for point in grid {
            let features = [
                averages.temperature,
                averages.vibration,
                averages.energy,
                point.hour() as f64,
                point.weekday().num_days_from_monday() as f64,
                point.month() as f64,
            ];
            let outputs = self.model.predict(&features).await?;
            if outputs.len() < OUTPUT_LEN {
                return Err(ModelError::Inference {
                    reason: format!(
                        "expected {} outputs, model returned {}",
                        OUTPUT_LEN,
                        outputs.len()
                    ),
                });
            }
            timeline.push(TimelinePoint {
                timestamp: *point,
                temperature: outputs[0],
                vibration: outputs[1],
                energy: outputs[2],
            });
        }

        Ok(score_group(
            accum,
            averages,
            timeline,
            self.settings.timeline_len,
        ))
    }
}

/// Group readings by `(data_type, metadata)`; BTreeMap keeps the output
/// order deterministic across recomputations.
fn group_readings(readings: &[SensorRecord]) -> BTreeMap<(String, String), GroupAccum> {
    let mut groups: BTreeMap<(String, String), GroupAccum> = BTreeMap::new();
    for record in readings {
        let key = (record.data_type.clone(), record.metadata.group_key());
        let accum = groups.entry(key).or_insert_with(|| GroupAccum {
            data_type: record.data_type.clone(),
            metadata: record.metadata.clone(),
            ..Default::default()
        });
        accum.temperature.push(record.temperature);
        accum.vibration.push(record.vibration);
        accum.energy.push(record.energy_consumption);
    }
    groups
}

/// Score one group's predicted timeline against its thresholds.
fn score_group(
    accum: GroupAccum,
    averages: AverageReadings,
    timeline: Vec<TimelinePoint>,
    timeline_len: usize,
) -> GroupPrediction {
    let thresholds = Thresholds::for_group(&accum.data_type, &accum.metadata);

    let high_temp = timeline
        .iter()
        .filter(|p| p.temperature > thresholds.temperature)
        .count();
    let high_vibration = timeline
        .iter()
        .filter(|p| p.vibration > thresholds.vibration)
        .count();
    let high_energy = timeline
        .iter()
        .filter(|p| p.energy > thresholds.energy)
        .count();

    let total_violations = high_temp + high_vibration + high_energy;
    let max_possible = timeline.len() * 3;
    let probability = if max_possible == 0 {
        0.0
    } else {
        (total_violations as f64 / max_possible as f64).min(MAX_PROBABILITY)
    };

    let issues = describe_issues(
        &accum.data_type,
        &accum.metadata,
        high_temp,
        high_vibration,
        high_energy,
    );

    let maintenance_needed = probability > 0.5;
    let estimated_time_to_maintenance = if probability > 0.8 {
        "1 hour".to_string()
    } else {
        "24 hours".to_string()
    };

    let mut timeline = timeline;
    timeline.truncate(timeline_len);

    GroupPrediction {
        data_type: accum.data_type,
        metadata: accum.metadata,
        maintenance_needed,
        probability,
        estimated_time_to_maintenance,
        issues,
        average_readings: averages,
        timeline,
    }
}

/// Context-aware issue strings, worded per data type.
fn describe_issues(
    data_type: &str,
    metadata: &SensorMetadata,
    high_temp: usize,
    high_vibration: usize,
    high_energy: usize,
) -> Vec<String> {
    let mut issues = Vec::new();

    if high_temp > 0 {
        issues.push(match data_type {
            "pressing" => format!(
                "High temperature detected for {} pressing in {} forecast points",
                metadata.material_type.as_deref().unwrap_or("material"),
                high_temp
            ),
            "machining" => format!(
                "High temperature detected while machining {} at {} speed in {} forecast points",
                metadata.material_type.as_deref().unwrap_or("material"),
                metadata.cutting_speed.as_deref().unwrap_or("normal"),
                high_temp
            ),
            _ => format!("High temperature predicted in {} forecast points", high_temp),
        });
    }

    if high_vibration > 0 {
        issues.push(match data_type {
            "pressing" => format!(
                "High vibration levels for {} pressing in {} forecast points",
                metadata.pressure_range.as_deref().unwrap_or("normal pressure"),
                high_vibration
            ),
            "machining" => format!(
                "High vibration levels with {} in {} forecast points",
                metadata.coolant_type.as_deref().unwrap_or("coolant"),
                high_vibration
            ),
            _ => format!(
                "High vibration levels predicted in {} forecast points",
                high_vibration
            ),
        });
    }

    if high_energy > 0 {
        issues.push(format!(
            "High energy consumption predicted in {} forecast points",
            high_energy
        ));
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Model returning a fixed output vector.
    struct FixedModel {
        outputs: Vec<f64>,
        calls: AtomicUsize,
    }

    impl FixedModel {
        fn new(outputs: [f64; 3]) -> Self {
            Self {
                outputs: outputs.to_vec(),
                calls: AtomicUsize::new(0),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl MaintenanceModel for FixedModel {
        async fn predict(&self, _features: &[f64]) -> Result<Vec<f64>, ModelError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.outputs.clone())
        }
    }

    fn reading(data_type: &str, metadata: SensorMetadata, temp: f64) -> SensorRecord {
        SensorRecord {
            machine_id: 1,
            timestamp: Utc.with_ymd_and_hms(2025, 3, 1, 11, 30, 0).unwrap(),
            temperature: Some(temp),
            vibration: Some(0.4),
            energy_consumption: Some(80.0),
            data_type: data_type.to_string(),
            metadata,
        }
    }

    fn metal() -> SensorMetadata {
        SensorMetadata {
            material_type: Some("Metal".to_string()),
            ..Default::default()
        }
    }

    fn now() -> Timestamp {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn empty_window_yields_message_not_error() {
        let engine = ForecastEngine::new(
            Arc::new(FixedModel::new([0.0, 0.0, 0.0])),
            CacheSettings::default(),
        );
        let bundle = engine.forecast(&[], now()).await.unwrap();
        assert!(bundle.groups.is_empty());
        assert!(!bundle.message.as_deref().unwrap().is_empty());
        // The model was never consulted.
        assert_eq!(engine.model().call_count(), 0);
    }

    #[tokio::test]
    async fn hot_metal_pressing_raises_temperature_issue() {
        // Metal pressing threshold is 100; predicted 105 violates it at
        // every forecast point.
        let engine = ForecastEngine::new(
            Arc::new(FixedModel::new([105.0, 10.0, 10.0])),
            CacheSettings::default(),
        );
        let readings = vec![reading("pressing", metal(), 95.0)];
        let bundle = engine.forecast(&readings, now()).await.unwrap();

        assert_eq!(bundle.groups.len(), 1);
        let group = &bundle.groups[0];
        assert!(group
            .issues
            .iter()
            .any(|issue| issue.contains("High temperature")));
        assert!(group.probability > 0.0);
        // 24 temperature violations out of 72 possible.
        assert!((group.probability - 24.0 / 72.0).abs() < 1e-9);
        assert!(!group.maintenance_needed);
    }

    #[tokio::test]
    async fn all_channels_violating_caps_probability() {
        let engine = ForecastEngine::new(
            Arc::new(FixedModel::new([200.0, 200.0, 200.0])),
            CacheSettings::default(),
        );
        let bundle = engine
            .forecast(&[reading("pressing", metal(), 95.0)], now())
            .await
            .unwrap();
        let group = &bundle.groups[0];
        // 72/72 violations, capped at 0.95.
        assert!((group.probability - MAX_PROBABILITY).abs() < 1e-9);
        assert!(group.maintenance_needed);
        assert_eq!(group.estimated_time_to_maintenance, "1 hour");
        assert_eq!(group.issues.len(), 3);
    }

    #[tokio::test]
    async fn groups_split_by_metadata_and_sorted() {
        let plastic = SensorMetadata {
            material_type: Some("Plastic".to_string()),
            ..Default::default()
        };
        let readings = vec![
            reading("pressing", metal(), 90.0),
            reading("pressing", plastic.clone(), 55.0),
            reading("pressing", metal(), 100.0),
        ];
        let engine = ForecastEngine::new(
            Arc::new(FixedModel::new([10.0, 10.0, 10.0])),
            CacheSettings::default(),
        );
        let bundle = engine.forecast(&readings, now()).await.unwrap();

        assert_eq!(bundle.groups.len(), 2);
        // BTreeMap order: "Metal" before "Plastic".
        assert_eq!(bundle.groups[0].metadata, metal());
        assert_eq!(bundle.groups[1].metadata, plastic);
        // Two metal readings averaged.
        assert!((bundle.groups[0].average_readings.temperature - 95.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn means_skip_unreported_channels() {
        let mut sparse = reading("machining", SensorMetadata::default(), 60.0);
        sparse.vibration = None;
        let full = reading("machining", SensorMetadata::default(), 80.0);

        let engine = ForecastEngine::new(
            Arc::new(FixedModel::new([10.0, 10.0, 10.0])),
            CacheSettings::default(),
        );
        let bundle = engine
            .forecast(&[sparse, full], now())
            .await
            .unwrap();
        let averages = bundle.groups[0].average_readings;
        assert!((averages.temperature - 70.0).abs() < 1e-9);
        // Only one reading reported vibration.
        assert!((averages.vibration - 0.4).abs() < 1e-9);
    }

    #[tokio::test]
    async fn timeline_is_truncated_and_anchored_at_midnight() {
        let settings = CacheSettings::default();
        let timeline_len = settings.timeline_len;
        let engine = ForecastEngine::new(Arc::new(FixedModel::new([10.0, 10.0, 10.0])), settings);
        let bundle = engine
            .forecast(&[reading("pressing", metal(), 90.0)], now())
            .await
            .unwrap();
        let timeline = &bundle.groups[0].timeline;
        assert_eq!(timeline.len(), timeline_len);
        assert_eq!(
            timeline[0].timestamp,
            Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap()
        );
        assert_eq!(
            timeline[1].timestamp,
            Utc.with_ymd_and_hms(2025, 3, 1, 1, 0, 0).unwrap()
        );
        // One model call per forecast point, for one group.
        assert_eq!(engine.model().call_count(), 24);
    }

    #[tokio::test]
    async fn short_output_vector_is_an_inference_error() {
        struct ShortModel;

        #[async_trait]
        impl MaintenanceModel for ShortModel {
            async fn predict(&self, _features: &[f64]) -> Result<Vec<f64>, ModelError> {
                Ok(vec![1.0])
            }
        }

        let engine = ForecastEngine::new(Arc::new(ShortModel), CacheSettings::default());
        let err = engine
            .forecast(&[reading("pressing", metal(), 90.0)], now())
            .await
            .unwrap_err();
        assert!(matches!(err, ModelError::Inference { .. }));
    }
}
