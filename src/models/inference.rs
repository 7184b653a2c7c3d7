//! Inference service for churn prediction

use crate::config::ValidationMode;
use crate::error::PredictionError;
use crate::feature_extractor::FeatureExtractor;
use crate::models::classifier::ModelHandle;
use crate::types::prediction::{ChurnLabel, PredictionResult};
use crate::types::record::FeatureRecord;
use tracing::{debug, error, warn};

/// Allowed deviation of the probability sum from 1
pub const PROBABILITY_TOLERANCE: f64 = 1e-6;

/// Runs the loaded classifier on single customer records.
///
/// Holds no mutable state; one service can serve any number of calls,
/// from any number of threads, against the same [`ModelHandle`].
pub struct InferenceService {
    extractor: FeatureExtractor,
    validation: ValidationMode,
}

impl InferenceService {
    pub fn new(validation: ValidationMode) -> Self {
        Self {
            extractor: FeatureExtractor::new(),
            validation,
        }
    }

    pub fn validation(&self) -> ValidationMode {
        self.validation
    }

    /// Predict churn for a field mapping keyed by column name
    pub fn predict_fields(
        &self,
        handle: &ModelHandle,
        fields: serde_json::Value,
    ) -> Result<PredictionResult, PredictionError> {
        let record = FeatureRecord::from_fields(fields).map_err(|e| {
            warn!(error = %e, "Rejected feature mapping");
            e
        })?;
        self.predict(handle, &record)
    }

    /// Predict churn for one record.
    ///
    /// The label always comes from the model's predict output. Probabilities
    /// are returned only when the model was loaded with a probability output.
    pub fn predict(
        &self,
        handle: &ModelHandle,
        record: &FeatureRecord,
    ) -> Result<PredictionResult, PredictionError> {
        if self.validation == ValidationMode::Strict {
            record.validate().map_err(|e| {
                warn!(error = %e, "Rejected feature record");
                e
            })?;
        }

        let row = self.extractor.extract(record);
        let classifier = handle.classifier();

        let (class, probs) = classifier
            .predict_with_proba(&row, handle.supports_probability())
            .map_err(|e| {
                error!(model = %handle.name(), error = %e, "Inference failed");
                PredictionError::Model(format!("{:#}", e))
            })?;

        let label = ChurnLabel::from_class(class).ok_or_else(|| {
            PredictionError::InvalidOutput(format!("label {} is not a churn class", class))
        })?;

        let probability = probs.as_deref().map(check_probabilities).transpose()?;

        debug!(
            model = %handle.name(),
            label = %label,
            probability = ?probability,
            "Prediction complete"
        );

        Ok(PredictionResult::new(label, probability))
    }
}

impl Default for InferenceService {
    fn default() -> Self {
        Self::new(ValidationMode::default())
    }
}

/// Accept only a two-class distribution
fn check_probabilities(probs: &[f64]) -> Result<[f64; 2], PredictionError> {
    let [p0, p1] = probs else {
        return Err(PredictionError::InvalidOutput(format!(
            "expected 2 class probabilities, got {}",
            probs.len()
        )));
    };

    if !(0.0..=1.0).contains(p0) || !(0.0..=1.0).contains(p1) {
        return Err(PredictionError::InvalidOutput(format!(
            "probabilities [{}, {}] outside [0, 1]",
            p0, p1
        )));
    }

    let sum = p0 + p1;
    if (sum - 1.0).abs() > PROBABILITY_TOLERANCE {
        return Err(PredictionError::InvalidOutput(format!(
            "probabilities sum to {}",
            sum
        )));
    }

    Ok([*p0, *p1])
}
