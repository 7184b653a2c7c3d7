//! ML model loading and inference components

pub mod classifier;
pub mod inference;
pub mod loader;
pub mod onnx;

pub use classifier::{Classifier, ModelHandle};
pub use inference::InferenceService;
pub use loader::{load, load_with, ModelCache, ModelLoader};
pub use onnx::OnnxClassifier;
