//! Classifier abstraction and the shared model handle

use anyhow::Result;
use std::fmt;
use std::path::{Path, PathBuf};

/// A trained binary classifier over one input row.
///
/// Implementations must be safe for concurrent read-only use.
pub trait Classifier: Send + Sync {
    /// Predict the raw class of the row
    fn predict(&self, row: &[f32]) -> Result<i64>;

    /// Predict per-class probabilities, index i = P(class i)
    fn predict_proba(&self, row: &[f32]) -> Result<Vec<f64>> {
        let _ = row;
        anyhow::bail!("classifier has no probability output")
    }

    /// Whether `predict_proba` is backed by the model
    fn supports_probability(&self) -> bool {
        false
    }

    /// Class and, when `with_proba` is set, probabilities for the same row.
    ///
    /// Backends that produce both in one evaluation should override this.
    fn predict_with_proba(&self, row: &[f32], with_proba: bool) -> Result<(i64, Option<Vec<f64>>)> {
        let class = self.predict(row)?;
        let probs = if with_proba {
            Some(self.predict_proba(row)?)
        } else {
            None
        };
        Ok((class, probs))
    }
}

/// Loaded classifier, shared read-only for the life of the process.
///
/// The probability capability is captured once at construction.
pub struct ModelHandle {
    name: String,
    path: PathBuf,
    classifier: Box<dyn Classifier>,
    supports_probability: bool,
}

impl ModelHandle {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>, classifier: Box<dyn Classifier>) -> Self {
        let supports_probability = classifier.supports_probability();
        Self {
            name: name.into(),
            path: path.into(),
            classifier,
            supports_probability,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn supports_probability(&self) -> bool {
        self.supports_probability
    }

    pub(crate) fn classifier(&self) -> &dyn Classifier {
        self.classifier.as_ref()
    }
}

impl fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelHandle")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("supports_probability", &self.supports_probability)
            .finish()
    }
}
