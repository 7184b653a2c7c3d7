//! ONNX model loader and the process-wide model cache

use crate::error::ModelUnavailable;
use crate::feature_extractor::FEATURE_NAMES;
use crate::models::classifier::ModelHandle;
use crate::models::onnx::OnnxClassifier;
use anyhow::{Context, Result};
use ort::session::{builder::GraphOptimizationLevel, Session};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use tracing::{error, info, warn};

/// Name of the schema sidecar looked up next to the artifact
pub const FEATURE_INFO_FILE: &str = "feature_info.json";

/// Column schema exported alongside the model at training time
#[derive(Debug, Deserialize)]
pub struct FeatureInfo {
    pub feature_names: Vec<String>,
}

impl FeatureInfo {
    pub fn read(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Fail unless the training columns are exactly the record columns, in order
    pub fn check_order(&self) -> Result<()> {
        if self.feature_names.len() != FEATURE_NAMES.len() {
            anyhow::bail!(
                "model was trained on {} columns, records have {}",
                self.feature_names.len(),
                FEATURE_NAMES.len()
            );
        }
        for (i, (trained, expected)) in self.feature_names.iter().zip(FEATURE_NAMES).enumerate() {
            if trained != expected {
                anyhow::bail!(
                    "column {} is '{}' in the model but '{}' in records",
                    i,
                    trained,
                    expected
                );
            }
        }
        Ok(())
    }
}

/// Loader for the churn ONNX model
pub struct ModelLoader {
    /// Number of threads for ONNX inference
    onnx_threads: usize,
    /// Explicit schema sidecar; defaults to `feature_info.json` beside the model
    feature_info: Option<PathBuf>,
}

impl ModelLoader {
    /// Create a new model loader with default settings (1 thread)
    pub fn new() -> Self {
        Self::with_threads(1)
    }

    /// Create a new model loader with specified number of threads
    pub fn with_threads(onnx_threads: usize) -> Self {
        Self {
            onnx_threads,
            feature_info: None,
        }
    }

    /// Use an explicit schema sidecar instead of the default location
    pub fn with_feature_info(mut self, path: impl Into<PathBuf>) -> Self {
        self.feature_info = Some(path.into());
        self
    }

    /// Load the classifier from `path`.
    ///
    /// Any failure (missing file, unreadable graph, schema mismatch) is
    /// reported as [`ModelUnavailable`].
    pub fn load_model<P: AsRef<Path>>(&self, path: P) -> Result<ModelHandle, ModelUnavailable> {
        let path = path.as_ref();

        if !path.is_file() {
            error!(path = %path.display(), "Model file not found");
            return Err(ModelUnavailable::new(path, "model file not found"));
        }

        self.check_feature_info(path)
            .map_err(|e| ModelUnavailable::new(path, format!("{:#}", e)))?;

        let classifier = self
            .build_classifier(path)
            .map_err(|e| ModelUnavailable::new(path, format!("{:#}", e)))?;

        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "model".to_string());

        info!(
            model = %name,
            input = %classifier.input_name(),
            label_output = %classifier.label_output(),
            probability_output = ?classifier.probability_output(),
            "Model loaded successfully"
        );

        Ok(ModelHandle::new(name, path, Box::new(classifier)))
    }

    fn build_classifier(&self, path: &Path) -> Result<OnnxClassifier> {
        info!(path = %path.display(), threads = self.onnx_threads, "Loading ONNX model");

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(self.onnx_threads)?
            .commit_from_file(path)
            .context(format!("Failed to load model from {:?}", path))?;

        OnnxClassifier::from_session(session)
    }

    fn check_feature_info(&self, model_path: &Path) -> Result<()> {
        let sidecar = match &self.feature_info {
            Some(explicit) => explicit.clone(),
            None => {
                let beside = model_path.with_file_name(FEATURE_INFO_FILE);
                if !beside.is_file() {
                    warn!(
                        model = %model_path.display(),
                        "No feature_info.json next to model, column order not verified"
                    );
                    return Ok(());
                }
                beside
            }
        };

        FeatureInfo::read(&sidecar)?.check_order()
    }
}

impl Default for ModelLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of the one load attempt
type LoadOutcome = Result<Arc<ModelHandle>, ModelUnavailable>;

/// Write-once holder of a load outcome.
///
/// The first `get_or_load` runs the loader; every later call, from any
/// thread, gets the same handle or the same error.
pub struct ModelCache {
    slot: OnceLock<(PathBuf, LoadOutcome)>,
}

impl ModelCache {
    pub const fn new() -> Self {
        Self {
            slot: OnceLock::new(),
        }
    }

    pub fn get_or_load<F>(&self, path: &Path, load: F) -> LoadOutcome
    where
        F: FnOnce(&Path) -> Result<ModelHandle, ModelUnavailable>,
    {
        let (loaded_from, outcome) = self
            .slot
            .get_or_init(|| (path.to_path_buf(), load(path).map(Arc::new)));

        if loaded_from != path {
            warn!(
                requested = %path.display(),
                loaded = %loaded_from.display(),
                "Model already loaded from another path, returning cached model"
            );
        }

        outcome.clone()
    }

    /// The cached handle, if a load has succeeded
    pub fn get(&self) -> Option<Arc<ModelHandle>> {
        match self.slot.get() {
            Some((_, Ok(handle))) => Some(handle.clone()),
            _ => None,
        }
    }
}

impl Default for ModelCache {
    fn default() -> Self {
        Self::new()
    }
}

static MODEL: ModelCache = ModelCache::new();

/// Load the churn model at most once per process with the given loader.
pub fn load_with(loader: &ModelLoader, path: impl AsRef<Path>) -> LoadOutcome {
    MODEL.get_or_load(path.as_ref(), |p| loader.load_model(p))
}

/// Load the churn model at most once per process.
pub fn load(path: impl AsRef<Path>) -> LoadOutcome {
    load_with(&ModelLoader::default(), path)
}
