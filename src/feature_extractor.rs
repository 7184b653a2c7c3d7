//! Feature extraction for churn model inference.
//!
//! Turns a customer record into the single model input row. Columns are
//! passed through unchanged, in the order the model was trained on.

use crate::types::record::FeatureRecord;

/// Number of model input columns
pub const FEATURE_COUNT: usize = 15;

/// Column names in training order
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "REGION",
    "TENURE",
    "MONTANT",
    "FREQUENCE_RECH",
    "REVENUE",
    "ARPU_SEGMENT",
    "FREQUENCE",
    "DATA_VOLUME",
    "ON_NET",
    "ORANGE",
    "TIGO",
    "MRG",
    "REGULARITY",
    "TOP_PACK",
    "FREQ_TOP_PACK",
];

/// Feature extractor that transforms customer records into model input rows.
pub struct FeatureExtractor;

impl FeatureExtractor {
    /// Create a new feature extractor.
    pub fn new() -> Self {
        Self
    }

    /// Extract the input row for a record, ordered as [`FEATURE_NAMES`].
    pub fn extract(&self, record: &FeatureRecord) -> [f32; FEATURE_COUNT] {
        [
            record.region as f32,
            record.tenure as f32,
            record.montant as f32,
            record.frequence_rech as f32,
            record.revenue as f32,
            record.arpu_segment as f32,
            record.frequence as f32,
            record.data_volume as f32,
            record.on_net as f32,
            record.orange as f32,
            record.tigo as f32,
            record.mrg as f32,
            record.regularity as f32,
            record.top_pack as f32,
            record.freq_top_pack as f32,
        ]
    }

    /// Get the number of features produced.
    pub fn feature_count(&self) -> usize {
        FEATURE_COUNT
    }

    /// Get feature names (matching training order).
    pub fn feature_names(&self) -> &'static [&'static str] {
        &FEATURE_NAMES
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new()
    }
}
