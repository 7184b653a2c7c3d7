//! Error types surfaced to callers of the prediction core

use std::path::PathBuf;
use thiserror::Error;

/// The model artifact could not be loaded.
///
/// Fatal for the rest of the process: the cached load outcome is never retried.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("Model unavailable at {}: {reason}", path.display())]
pub struct ModelUnavailable {
    /// Artifact location that was requested
    pub path: PathBuf,
    /// Why the artifact could not be used
    pub reason: String,
}

impl ModelUnavailable {
    pub fn new(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// A single prediction request failed. The loaded model stays usable.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PredictionError {
    /// Missing, extra, mistyped or out-of-domain fields
    #[error("Invalid feature record: {0}")]
    InvalidRecord(String),
    /// The classifier rejected the input or failed internally
    #[error("Model inference failed: {0}")]
    Model(String),
    /// The classifier returned a label or probabilities outside their domain
    #[error("Invalid model output: {0}")]
    InvalidOutput(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ModelUnavailable::new("models/modele.onnx", "file not found");
        assert_eq!(
            err.to_string(),
            "Model unavailable at models/modele.onnx: file not found"
        );

        let err = PredictionError::InvalidRecord("missing field `REGION`".to_string());
        assert!(err.to_string().contains("REGION"));
    }
}
