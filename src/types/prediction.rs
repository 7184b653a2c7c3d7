//! Prediction output of the inference service

use serde::{Deserialize, Serialize};
use std::fmt;

/// Binary churn outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum ChurnLabel {
    /// Class 0: the customer stays
    Retained,
    /// Class 1: the customer leaves
    Churns,
}

impl ChurnLabel {
    /// Map a raw model class onto the label, `None` outside {0, 1}
    pub fn from_class(class: i64) -> Option<Self> {
        match class {
            0 => Some(ChurnLabel::Retained),
            1 => Some(ChurnLabel::Churns),
            _ => None,
        }
    }

    /// Class index in the model's ordering
    pub fn class(self) -> u8 {
        match self {
            ChurnLabel::Retained => 0,
            ChurnLabel::Churns => 1,
        }
    }
}

impl From<ChurnLabel> for u8 {
    fn from(label: ChurnLabel) -> u8 {
        label.class()
    }
}

impl TryFrom<u8> for ChurnLabel {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        ChurnLabel::from_class(value as i64).ok_or_else(|| format!("invalid churn class {value}"))
    }
}

impl fmt::Display for ChurnLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChurnLabel::Retained => write!(f, "retained"),
            ChurnLabel::Churns => write!(f, "churns"),
        }
    }
}

/// Result of one inference call.
///
/// `probability[i]` is P(class i). It is absent when the loaded model has no
/// probability output; it is never filled with a placeholder.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    label: ChurnLabel,
    probability: Option<[f64; 2]>,
}

impl PredictionResult {
    pub(crate) fn new(label: ChurnLabel, probability: Option<[f64; 2]>) -> Self {
        Self { label, probability }
    }

    pub fn label(&self) -> ChurnLabel {
        self.label
    }

    pub fn probability(&self) -> Option<[f64; 2]> {
        self.probability
    }

    /// P(churn), when the model reports probabilities
    pub fn churn_probability(&self) -> Option<f64> {
        self.probability.map(|p| p[1])
    }
}
