//! Type definitions for the churn prediction core

pub mod assessment;
pub mod prediction;
pub mod record;

pub use assessment::{ChurnAssessment, Recommendation, RiskLevel, RiskLevelThresholds};
pub use prediction::{ChurnLabel, PredictionResult};
pub use record::FeatureRecord;
