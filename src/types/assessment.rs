//! Interpreted churn assessment returned to the presentation layer

use crate::types::prediction::{ChurnLabel, PredictionResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Churn risk band derived from the churn probability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// Determine risk level from churn probability and thresholds
    pub fn from_probability(probability: f64, thresholds: &RiskLevelThresholds) -> Self {
        if probability >= thresholds.critical {
            RiskLevel::Critical
        } else if probability >= thresholds.high {
            RiskLevel::High
        } else if probability >= thresholds.medium {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

/// Lower bounds of each band above `Low`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskLevelThresholds {
    pub medium: f64,
    pub high: f64,
    pub critical: f64,
}

impl Default for RiskLevelThresholds {
    fn default() -> Self {
        Self {
            medium: 0.25,
            high: 0.50,
            critical: 0.75,
        }
    }
}

/// Suggested follow-up for the customer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    /// Customer is likely to leave
    UrgentRetention,
    /// Customer is likely to stay
    Upselling,
}

impl From<ChurnLabel> for Recommendation {
    fn from(label: ChurnLabel) -> Self {
        match label {
            ChurnLabel::Churns => Recommendation::UrgentRetention,
            ChurnLabel::Retained => Recommendation::Upselling,
        }
    }
}

/// A prediction together with its interpretation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChurnAssessment {
    /// Unique assessment identifier
    pub assessment_id: String,

    /// Predicted outcome
    pub label: ChurnLabel,

    /// Class probabilities [P(retained), P(churns)], when available
    pub probability: Option<[f64; 2]>,

    /// Risk band, only when probabilities are available
    pub risk_level: Option<RiskLevel>,

    pub recommendation: Recommendation,

    /// Assessment timestamp
    pub timestamp: DateTime<Utc>,
}

impl ChurnAssessment {
    pub fn from_prediction(result: &PredictionResult, thresholds: &RiskLevelThresholds) -> Self {
        Self {
            assessment_id: uuid::Uuid::new_v4().to_string(),
            label: result.label(),
            probability: result.probability(),
            risk_level: result
                .churn_probability()
                .map(|p| RiskLevel::from_probability(p, thresholds)),
            recommendation: result.label().into(),
            timestamp: Utc::now(),
        }
    }

    /// Churn probability as a percentage
    pub fn churn_percent(&self) -> Option<f64> {
        self.probability.map(|p| p[1] * 100.0)
    }
}
