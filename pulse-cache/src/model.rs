//! Prediction model seam.

use async_trait::async_trait;
use pulse_core::ModelError;

/// Number of input features: mean temperature, mean vibration, mean energy,
/// forecast hour, forecast weekday, forecast month. The order matches the
/// order the model was trained with.
pub const FEATURE_LEN: usize = 6;

/// Number of outputs: predicted temperature, vibration, energy.
pub const OUTPUT_LEN: usize = 3;

/// The maintenance-prediction model collaborator.
///
/// Fails with [`ModelError::Unavailable`] when the model or scaler
/// artifacts are not loaded; the forecast engine surfaces that as a
/// service-not-ready condition rather than an empty bundle.
#[async_trait]
pub trait MaintenanceModel: Send + Sync {
    /// Predict `[temperature, vibration, energy]` for one feature vector.
    async fn predict(&self, features: &[f64]) -> Result<Vec<f64>, ModelError>;
}
