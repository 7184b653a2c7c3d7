//! Customer feature record consumed by the churn model

use crate::error::PredictionError;
use serde::{Deserialize, Serialize};

/// One customer profile, the 15 inputs the churn model was trained on.
///
/// Deserialization rejects missing and unknown fields, so a record that
/// exists is always complete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", deny_unknown_fields)]
pub struct FeatureRecord {
    /// Region code (1..=14)
    pub region: i64,
    /// Months on the network
    pub tenure: i64,
    /// Top-up amount
    pub montant: f64,
    /// Number of top-ups
    pub frequence_rech: f64,
    /// Monthly income generated by the customer
    pub revenue: f64,
    /// Income over 90 days / 3
    pub arpu_segment: f64,
    /// Number of times the customer generated income
    pub frequence: f64,
    /// Data usage
    pub data_volume: f64,
    /// Calls inside the network
    pub on_net: f64,
    /// Calls to the Orange network
    pub orange: f64,
    /// Calls to the Tigo network
    pub tigo: f64,
    /// MRG flag (0/1)
    pub mrg: i64,
    /// Regular activity flag (0/1)
    pub regularity: i64,
    /// Subscribed to a top pack (0/1)
    pub top_pack: i64,
    /// Activations of the top pack
    pub freq_top_pack: f64,
}

impl FeatureRecord {
    /// Build a record from a field mapping keyed by the upper-case column names.
    ///
    /// Only JSON objects are accepted; positional arrays carry no column names.
    pub fn from_fields(fields: serde_json::Value) -> Result<Self, PredictionError> {
        if !fields.is_object() {
            return Err(PredictionError::InvalidRecord(
                "expected an object keyed by column name".to_string(),
            ));
        }
        serde_json::from_value(fields).map_err(|e| PredictionError::InvalidRecord(e.to_string()))
    }

    /// Check every field against its declared domain.
    ///
    /// All violations are reported together.
    pub fn validate(&self) -> Result<(), PredictionError> {
        let mut violations = Vec::new();

        if !(1..=14).contains(&self.region) {
            violations.push(format!("REGION must be in 1..=14, got {}", self.region));
        }
        if self.tenure < 0 {
            violations.push(format!("TENURE must be >= 0, got {}", self.tenure));
        }

        for (name, value) in [
            ("MRG", self.mrg),
            ("REGULARITY", self.regularity),
            ("TOP_PACK", self.top_pack),
        ] {
            if value != 0 && value != 1 {
                violations.push(format!("{name} must be 0 or 1, got {value}"));
            }
        }

        for (name, value) in [
            ("MONTANT", self.montant),
            ("FREQUENCE_RECH", self.frequence_rech),
            ("REVENUE", self.revenue),
            ("ARPU_SEGMENT", self.arpu_segment),
            ("FREQUENCE", self.frequence),
            ("DATA_VOLUME", self.data_volume),
            ("ON_NET", self.on_net),
            ("ORANGE", self.orange),
            ("TIGO", self.tigo),
            ("FREQ_TOP_PACK", self.freq_top_pack),
        ] {
            if !value.is_finite() || value < 0.0 {
                violations.push(format!("{name} must be a finite value >= 0, got {value}"));
            }
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(PredictionError::InvalidRecord(violations.join("; ")))
        }
    }
}

impl Default for FeatureRecord {
    /// Initial values of the customer input form
    fn default() -> Self {
        Self {
            region: 1,
            tenure: 12,
            montant: 1000.0,
            frequence_rech: 5.0,
            revenue: 500.0,
            arpu_segment: 100.0,
            frequence: 10.0,
            data_volume: 1000.0,
            on_net: 50.0,
            orange: 30.0,
            tigo: 20.0,
            mrg: 0,
            regularity: 1,
            top_pack: 0,
            freq_top_pack: 2.0,
        }
    }
}
