//! Churn Predictor - Main Entry Point
//!
//! Loads the churn model, then answers one JSON feature mapping per stdin
//! line with one JSON assessment per stdout line.

use anyhow::{Context, Result};
use churn_predictor::{
    config::{AppConfig, LoggingConfig, DEFAULT_CONFIG_PATH},
    metrics::SessionMetrics,
    models::{load_with, InferenceService},
    types::ChurnAssessment,
    PredictionError,
};
use serde_json::json;
use std::io::{self, BufRead, Write};
use std::time::Instant;
use tracing::{debug, info, warn};

fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

    // Load configuration
    let config = AppConfig::load_from_path(&config_path)
        .with_context(|| format!("Failed to load configuration from {}", config_path))?;

    init_logging(&config.logging)?;
    info!(config = %config_path, "Starting Churn Predictor");
    info!(
        "Risk levels: medium>={:.2}, high>={:.2}, critical>={:.2}",
        config.risk_levels.medium, config.risk_levels.high, config.risk_levels.critical
    );

    let loader = config.model_loader();
    let handle = load_with(&loader, &config.model.path)
        .context("Cannot serve predictions without the churn model")?;
    info!(
        model = %handle.name(),
        probabilities = handle.supports_probability(),
        "Model ready"
    );

    let service = InferenceService::new(config.validation.mode);
    info!(validation = ?service.validation(), "Reading feature records from stdin");

    let metrics = SessionMetrics::new();
    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();

    for line in stdin.lock().lines() {
        let line = line.context("Failed to read stdin")?;
        if line.trim().is_empty() {
            continue;
        }

        let start_time = Instant::now();
        let outcome = serde_json::from_str::<serde_json::Value>(&line)
            .map_err(|e| PredictionError::InvalidRecord(e.to_string()))
            .and_then(|fields| service.predict_fields(&handle, fields));

        let response = match outcome {
            Ok(prediction) => {
                metrics.record_prediction(start_time.elapsed(), &prediction);
                let assessment = ChurnAssessment::from_prediction(&prediction, &config.risk_levels);
                debug!(
                    assessment_id = %assessment.assessment_id,
                    label = %assessment.label,
                    risk_level = ?assessment.risk_level,
                    "Assessment produced"
                );
                serde_json::to_value(&assessment)?
            }
            Err(e) => {
                metrics.record_failure();
                warn!(error = %e, "Prediction failed");
                json!({ "error": e.to_string() })
            }
        };

        writeln!(stdout, "{}", response)?;
        stdout.flush()?;
    }

    info!("Input closed, shutting down");
    metrics.print_summary();

    Ok(())
}

/// Logs go to stderr so stdout carries only responses
fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(format!("churn_predictor={}", logging.level).parse()?);

    match logging.format.as_str() {
        "json" => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .init(),
        _ => tracing_subscriber::fmt()
            .pretty()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .init(),
    }

    Ok(())
}
