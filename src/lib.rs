//! Customer churn prediction library
//!
//! Loads a pre-trained binary churn classifier once per process and runs it
//! on single customer feature records.

pub mod config;
pub mod error;
pub mod feature_extractor;
pub mod metrics;
pub mod models;
pub mod types;

pub use crate::config::{AppConfig, ValidationMode};
pub use error::{ModelUnavailable, PredictionError};
pub use feature_extractor::{FeatureExtractor, FEATURE_NAMES};
pub use models::{load, InferenceService, ModelHandle, ModelLoader};
pub use types::{ChurnAssessment, ChurnLabel, FeatureRecord, PredictionResult};
