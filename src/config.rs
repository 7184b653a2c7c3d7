//! Configuration management for the churn predictor

use crate::models::loader::ModelLoader;
use crate::types::assessment::RiskLevelThresholds;
use anyhow::{Context, Result};
use config::{Config, File};
use serde::Deserialize;
use std::path::Path;

/// Default configuration file location
pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";

/// How records are checked before they reach the model
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ValidationMode {
    /// Reject out-of-domain values with an invalid record error
    #[default]
    Strict,
    /// Trust the model with any well-formed record
    Passthrough,
}

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub model: ModelConfig,
    #[serde(default)]
    pub validation: ValidationConfig,
    #[serde(default)]
    pub risk_levels: RiskLevelThresholds,
    pub logging: LoggingConfig,
}

/// Model artifact configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    /// Path to the ONNX model file
    pub path: String,
    /// Column schema sidecar; `feature_info.json` beside the model when unset
    #[serde(default)]
    pub feature_info: Option<String>,
    /// Number of threads for ONNX inference (default: 1)
    #[serde(default = "default_onnx_threads")]
    pub onnx_threads: usize,
}

fn default_onnx_threads() -> usize {
    1
}

/// Input validation configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ValidationConfig {
    #[serde(default)]
    pub mode: ValidationMode,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl AppConfig {
    /// Load configuration from file
    pub fn load() -> Result<Self> {
        Self::load_from_path(DEFAULT_CONFIG_PATH)
    }

    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Model loader configured from the `[model]` section
    pub fn model_loader(&self) -> ModelLoader {
        let loader = ModelLoader::with_threads(self.model.onnx_threads);
        match &self.model.feature_info {
            Some(path) => loader.with_feature_info(path),
            None => loader,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model: ModelConfig {
                path: "models/modele.onnx".to_string(),
                feature_info: None,
                onnx_threads: 1,
            },
            validation: ValidationConfig::default(),
            risk_levels: RiskLevelThresholds::default(),
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(body: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(body.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.model.path, "models/modele.onnx");
        assert_eq!(config.model.onnx_threads, 1);
        assert_eq!(config.validation.mode, ValidationMode::Strict);
        assert_eq!(config.risk_levels.high, 0.50);
    }

    #[test]
    fn test_load_full_config() {
        let file = write_config(
            r#"
            [model]
            path = "artifacts/churn.onnx"
            feature_info = "artifacts/columns.json"
            onnx_threads = 2

            [validation]
            mode = "passthrough"

            [risk_levels]
            medium = 0.2
            high = 0.4
            critical = 0.8

            [logging]
            level = "debug"
            format = "json"
            "#,
        );

        let config = AppConfig::load_from_path(file.path()).unwrap();
        assert_eq!(config.model.path, "artifacts/churn.onnx");
        assert_eq!(config.model.feature_info.as_deref(), Some("artifacts/columns.json"));
        assert_eq!(config.model.onnx_threads, 2);
        assert_eq!(config.validation.mode, ValidationMode::Passthrough);
        assert_eq!(config.risk_levels.critical, 0.8);
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn test_optional_sections_default() {
        let file = write_config(
            r#"
            [model]
            path = "modele.onnx"

            [logging]
            level = "info"
            format = "pretty"
            "#,
        );

        let config = AppConfig::load_from_path(file.path()).unwrap();
        assert_eq!(config.model.onnx_threads, 1);
        assert_eq!(config.model.feature_info, None);
        assert_eq!(config.validation.mode, ValidationMode::Strict);
        assert_eq!(config.risk_levels.medium, 0.25);
    }

    #[test]
    fn test_unknown_validation_mode_rejected() {
        let file = write_config(
            r#"
            [model]
            path = "modele.onnx"

            [validation]
            mode = "lenient"

            [logging]
            level = "info"
            format = "pretty"
            "#,
        );

        assert!(AppConfig::load_from_path(file.path()).is_err());
    }

    #[test]
    fn test_shipped_config_parses() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join(DEFAULT_CONFIG_PATH);
        let config = AppConfig::load_from_path(path).unwrap();
        assert_eq!(config.model.path, AppConfig::default().model.path);
    }
}
