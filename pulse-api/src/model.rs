//! Maintenance model loading and inference.
//!
//! The trained model ships as a JSON artifact: a standard scaler
//! (per-feature means and standard deviations) plus one linear head per
//! output channel. [`ModelHandle`] loads the artifact at startup and
//! implements the [`MaintenanceModel`] seam; when no artifact is present
//! the handle stays in service and reports [`ModelError::Unavailable`]
//! on every inference, so prediction endpoints degrade to 503 instead of
//! the process failing to boot.

use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;

use pulse_cache::{MaintenanceModel, FEATURE_LEN, OUTPUT_LEN};
use pulse_core::ModelError;

// ============================================================================
// ARTIFACT FORMAT
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
struct ScalerArtifact {
    means: Vec<f64>,
    stds: Vec<f64>,
}

#[derive(Debug, Clone, Deserialize)]
struct OutputHead {
    name: String,
    weights: Vec<f64>,
    intercept: f64,
}

#[derive(Debug, Clone, Deserialize)]
struct ModelArtifact {
    scaler: ScalerArtifact,
    outputs: Vec<OutputHead>,
}

// ============================================================================
// LINEAR MODEL
// ============================================================================

/// Standard-scaled multi-output linear regressor.
#[derive(Debug, Clone)]
pub struct LinearModel {
    means: Vec<f64>,
    stds: Vec<f64>,
    heads: Vec<OutputHead>,
}

impl LinearModel {
    fn from_artifact(artifact: ModelArtifact) -> Result<Self, ModelError> {
        let bad = |reason: String| ModelError::Artifact { reason };

        if artifact.scaler.means.len() != FEATURE_LEN {
            return Err(bad(format!(
                "scaler means: expected {} entries, got {}",
                FEATURE_LEN,
                artifact.scaler.means.len()
            )));
        }
        if artifact.scaler.stds.len() != FEATURE_LEN {
            return Err(bad(format!(
                "scaler stds: expected {} entries, got {}",
                FEATURE_LEN,
                artifact.scaler.stds.len()
            )));
        }
        if artifact.scaler.stds.iter().any(|s| *s == 0.0 || !s.is_finite()) {
            return Err(bad("scaler stds must be finite and non-zero".to_string()));
        }
        if artifact.outputs.len() != OUTPUT_LEN {
            return Err(bad(format!(
                "expected {} output heads, got {}",
                OUTPUT_LEN,
                artifact.outputs.len()
            )));
        }
        for head in &artifact.outputs {
            if head.weights.len() != FEATURE_LEN {
                return Err(bad(format!(
                    "output '{}': expected {} weights, got {}",
                    head.name,
                    FEATURE_LEN,
                    head.weights.len()
                )));
            }
        }

        Ok(Self {
            means: artifact.scaler.means,
            stds: artifact.scaler.stds,
            heads: artifact.outputs,
        })
    }

    /// Load and validate an artifact from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let raw = std::fs::read_to_string(path.as_ref()).map_err(|e| ModelError::Artifact {
            reason: format!("read {}: {}", path.as_ref().display(), e),
        })?;
        let artifact: ModelArtifact =
            serde_json::from_str(&raw).map_err(|e| ModelError::Artifact {
                reason: format!("parse {}: {}", path.as_ref().display(), e),
            })?;
        Self::from_artifact(artifact)
    }

    /// Run inference on one feature vector.
    pub fn predict(&self, features: &[f64]) -> Result<Vec<f64>, ModelError> {
        if features.len() != FEATURE_LEN {
            return Err(ModelError::Inference {
                reason: format!(
                    "expected {} features, got {}",
                    FEATURE_LEN,
                    features.len()
                ),
            });
        }
        let scaled: Vec<f64> = features
            .iter()
            .zip(self.means.iter().zip(self.stds.iter()))
            .map(|(x, (mean, std))| (x - mean) / std)
            .collect();
        Ok(self
            .heads
            .iter()
            .map(|head| {
                head.intercept
                    + head
                        .weights
                        .iter()
                        .zip(scaled.iter())
                        .map(|(w, z)| w * z)
                        .sum::<f64>()
            })
            .collect())
    }
}

// ============================================================================
// MODEL HANDLE
// ============================================================================

/// Inference seam backed by an optional loaded model.
pub struct ModelHandle {
    model: Option<LinearModel>,
}

impl ModelHandle {
    /// Load the artifact at `path` if it exists.
    ///
    /// A missing file yields an empty handle; a present but malformed
    /// artifact is a hard error so a bad deploy fails loudly.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::warn!(path = %path.display(), "model artifact missing, predictions disabled");
            return Ok(Self { model: None });
        }
        let model = LinearModel::load(path)?;
        tracing::info!(path = %path.display(), "model artifact loaded");
        Ok(Self { model: Some(model) })
    }

    /// Handle with no model loaded.
    pub fn empty() -> Self {
        Self { model: None }
    }

    pub fn is_loaded(&self) -> bool {
        self.model.is_some()
    }
}

#[async_trait]
impl MaintenanceModel for ModelHandle {
    async fn predict(&self, features: &[f64]) -> Result<Vec<f64>, ModelError> {
        match &self.model {
            Some(model) => model.predict(features),
            None => Err(ModelError::Unavailable),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn artifact_json() -> String {
        serde_json::json!({
            "scaler": {
                "means": [70.0, 0.3, 60.0, 12.0, 3.0, 6.0],
                "stds": [10.0, 0.1, 20.0, 6.0, 2.0, 3.0],
            },
            "outputs": [
                {"name": "temperature", "weights": [10.0, 0.0, 0.0, 0.0, 0.0, 0.0], "intercept": 70.0},
                {"name": "vibration", "weights": [0.0, 0.1, 0.0, 0.0, 0.0, 0.0], "intercept": 0.3},
                {"name": "energy", "weights": [0.0, 0.0, 20.0, 0.0, 0.0, 0.0], "intercept": 60.0},
            ],
        })
        .to_string()
    }

    fn write_artifact(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn loaded_model_applies_scaler_and_heads() {
        let file = write_artifact(&artifact_json());
        let handle = ModelHandle::load(file.path()).unwrap();
        assert!(handle.is_loaded());

        // Identity features: each head recovers its own channel.
        let outputs = handle
            .predict(&[90.0, 0.5, 100.0, 12.0, 3.0, 6.0])
            .await
            .unwrap();
        assert_eq!(outputs.len(), 3);
        assert!((outputs[0] - 90.0).abs() < 1e-9);
        assert!((outputs[1] - 0.5).abs() < 1e-9);
        assert!((outputs[2] - 100.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn missing_artifact_degrades_to_unavailable() {
        let handle = ModelHandle::load("/nonexistent/model.json").unwrap();
        assert!(!handle.is_loaded());
        let err = handle
            .predict(&[0.0, 0.0, 0.0, 0.0, 0.0, 0.0])
            .await
            .unwrap_err();
        assert!(matches!(err, ModelError::Unavailable));
    }

    #[test]
    fn malformed_artifact_is_a_hard_error() {
        let file = write_artifact("{\"scaler\": {}}");
        assert!(matches!(
            ModelHandle::load(file.path()),
            Err(ModelError::Artifact { .. })
        ));
    }

    #[test]
    fn dimension_mismatch_is_rejected_at_load() {
        let mut artifact: serde_json::Value = serde_json::from_str(&artifact_json()).unwrap();
        artifact["outputs"][0]["weights"] = serde_json::json!([1.0, 2.0]);
        let file = write_artifact(&artifact.to_string());
        assert!(matches!(
            ModelHandle::load(file.path()),
            Err(ModelError::Artifact { .. })
        ));
    }

    #[test]
    fn zero_std_is_rejected() {
        let mut artifact: serde_json::Value = serde_json::from_str(&artifact_json()).unwrap();
        artifact["scaler"]["stds"][1] = serde_json::json!(0.0);
        let file = write_artifact(&artifact.to_string());
        assert!(matches!(
            ModelHandle::load(file.path()),
            Err(ModelError::Artifact { .. })
        ));
    }

    #[test]
    fn wrong_feature_count_is_an_inference_error() {
        let file = write_artifact(&artifact_json());
        let model = LinearModel::load(file.path()).unwrap();
        assert!(matches!(
            model.predict(&[1.0, 2.0]),
            Err(ModelError::Inference { .. })
        ));
    }
}
