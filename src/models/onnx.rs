//! ONNX Runtime backed churn classifier

use crate::feature_extractor::FEATURE_COUNT;
use crate::models::classifier::Classifier;
use anyhow::{Context, Result};
use ort::memory::Allocator;
use ort::session::{Session, SessionOutputs};
use ort::value::{DowncastableTarget, DynMapValueType, DynSequenceValueType, DynValue, ValueType};
use std::sync::Mutex;
use tracing::debug;

/// Classifier running an exported ONNX graph.
///
/// `Session::run` needs exclusive access, so calls are serialized.
pub struct OnnxClassifier {
    session: Mutex<Session>,
    input_name: String,
    label_output: String,
    probability_output: Option<String>,
}

impl OnnxClassifier {
    /// Wrap a session, resolving input and output names from its metadata.
    pub fn from_session(session: Session) -> Result<Self> {
        let input = session
            .inputs
            .first()
            .context("model declares no inputs")?;

        if let ValueType::Tensor { shape, .. } = &input.input_type {
            if let Some(&width) = shape.last() {
                // Negative dimensions are symbolic
                if width >= 0 && width as usize != FEATURE_COUNT {
                    anyhow::bail!(
                        "model input '{}' expects {} columns, records have {}",
                        input.name,
                        width,
                        FEATURE_COUNT
                    );
                }
            }
        }
        let input_name = input.name.clone();

        let output_names: Vec<String> = session.outputs.iter().map(|o| o.name.clone()).collect();
        let (label_output, probability_output) = resolve_outputs(&output_names)?;

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            label_output,
            probability_output,
        })
    }

    pub fn input_name(&self) -> &str {
        &self.input_name
    }

    pub fn label_output(&self) -> &str {
        &self.label_output
    }

    pub fn probability_output(&self) -> Option<&str> {
        self.probability_output.as_deref()
    }

    /// Run the graph on one row and hand the outputs to `extract`
    fn run<T>(&self, row: &[f32], extract: impl FnOnce(&SessionOutputs) -> Result<T>) -> Result<T> {
        use ort::value::Tensor;

        // Prepare input tensor - shape [1, num_features]
        let shape = vec![1_i64, row.len() as i64];
        let input_tensor =
            Tensor::from_array((shape, row.to_vec())).context("Failed to create input tensor")?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| anyhow::anyhow!("Lock error: {}", e))?;

        let outputs = session.run(ort::inputs![self.input_name.as_str() => input_tensor])?;
        extract(&outputs)
    }
}

impl Classifier for OnnxClassifier {
    fn predict(&self, row: &[f32]) -> Result<i64> {
        Ok(self.predict_with_proba(row, false)?.0)
    }

    fn predict_proba(&self, row: &[f32]) -> Result<Vec<f64>> {
        self.predict_with_proba(row, true)?
            .1
            .context("model has no probability output")
    }

    fn supports_probability(&self) -> bool {
        self.probability_output.is_some()
    }

    /// One graph evaluation yields both outputs
    fn predict_with_proba(&self, row: &[f32], with_proba: bool) -> Result<(i64, Option<Vec<f64>>)> {
        let probability_output = match (with_proba, self.probability_output.as_deref()) {
            (true, None) => anyhow::bail!("model has no probability output"),
            (true, Some(name)) => Some(name),
            (false, _) => None,
        };

        self.run(row, |outputs| {
            let label = outputs
                .get(self.label_output.as_str())
                .with_context(|| format!("output '{}' missing", self.label_output))?;
            let class = extract_label(label)?;

            let probs = match probability_output {
                Some(name) => {
                    let output = outputs
                        .get(name)
                        .with_context(|| format!("output '{}' missing", name))?;
                    Some(extract_probabilities(output)?)
                }
                None => None,
            };

            Ok((class, probs))
        })
    }
}

/// Pick the label output and, if any, the probability output.
///
/// skl2onnx names them `output_label` and `output_probability`; other
/// exporters use `label` and `probabilities`.
pub(crate) fn resolve_outputs(names: &[String]) -> Result<(String, Option<String>)> {
    let label = names
        .iter()
        .find(|n| n.contains("label"))
        .or_else(|| names.first())
        .cloned()
        .context("model declares no outputs")?;

    let probability = names
        .iter()
        .find(|n| *n != &label && n.contains("prob"))
        .cloned();

    Ok((label, probability))
}

/// Extract the predicted class from an int64 or float label tensor
fn extract_label(output: &DynValue) -> Result<i64> {
    if let Ok((_, data)) = output.try_extract_tensor::<i64>() {
        return data.first().copied().context("empty label tensor");
    }

    let (_, data) = output
        .try_extract_tensor::<f32>()
        .context("label output is neither int64 nor float")?;
    let value = data.first().copied().context("empty label tensor")?;
    if value.fract() != 0.0 {
        anyhow::bail!("label output {} is not a class index", value);
    }
    Ok(value as i64)
}

/// Extract class probabilities for the single row.
/// Handles both tensor outputs and seq(map) outputs (ZipMap)
fn extract_probabilities(output: &DynValue) -> Result<Vec<f64>> {
    if let Ok((shape, data)) = output.try_extract_tensor::<f32>() {
        // [batch, num_classes] or [num_classes]
        let num_classes = shape.last().copied().unwrap_or(0).max(0) as usize;
        if num_classes == 0 || data.len() < num_classes {
            anyhow::bail!("probability tensor has shape {:?}", shape);
        }
        let probs: Vec<f64> = data[..num_classes].iter().map(|&p| p as f64).collect();
        debug!(probs = ?probs, "Extracted from tensor");
        return Ok(probs);
    }

    if DynSequenceValueType::can_downcast(&output.dtype()) {
        return extract_from_sequence_map(output);
    }

    anyhow::bail!("unsupported probability output type {:?}", output.dtype())
}

/// Extract probabilities from seq(map(int64, float)) format
fn extract_from_sequence_map(output: &DynValue) -> Result<Vec<f64>> {
    let allocator = Allocator::default();

    let sequence = output
        .downcast_ref::<DynSequenceValueType>()
        .map_err(|e| anyhow::anyhow!("Failed to downcast to sequence: {}", e))?;

    let maps = sequence.try_extract_sequence::<DynMapValueType>(&allocator)?;

    // batch_size is 1
    let map_value = maps.first().context("Empty sequence")?;
    let kv_pairs = map_value.try_extract_key_values::<i64, f32>()?;

    let probs = probabilities_by_class(kv_pairs)?;
    debug!(probs = ?probs, "Extracted from seq(map)");
    Ok(probs)
}

/// Order (class id, probability) pairs so that index i is P(class i).
/// Class ids must be exactly 0..n.
fn probabilities_by_class(mut kv_pairs: Vec<(i64, f32)>) -> Result<Vec<f64>> {
    kv_pairs.sort_by_key(|(class_id, _)| *class_id);

    for (i, (class_id, _)) in kv_pairs.iter().enumerate() {
        if *class_id != i as i64 {
            anyhow::bail!("unexpected class id {} in probability map", class_id);
        }
    }

    Ok(kv_pairs.into_iter().map(|(_, p)| p as f64).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature_extractor::FeatureExtractor;
    use crate::models::classifier::ModelHandle;
    use crate::models::loader::ModelLoader;
    use crate::types::record::FeatureRecord;
    use ort::value::Tensor;
    use std::path::{Path, PathBuf};

    /// P(churn) at TENURE 12 and TENURE 2 for the logistic fixtures
    const CHURN_P_TENURE_12: f64 = 0.047_425_87;
    const CHURN_P_TENURE_2: f64 = 0.880_797_1;

    fn fixture(name: &str) -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("testdata").join(name)
    }

    fn load_fixture(name: &str) -> ModelHandle {
        ModelLoader::new().load_model(fixture(name)).unwrap()
    }

    fn row(tenure: i64) -> [f32; 15] {
        FeatureExtractor::new().extract(&FeatureRecord { tenure, ..FeatureRecord::default() })
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn assert_logistic(handle: &ModelHandle) {
        assert!(handle.supports_probability());
        let classifier = handle.classifier();

        let (class, probs) = classifier.predict_with_proba(&row(12), true).unwrap();
        let probs = probs.unwrap();
        assert_eq!(class, 0);
        assert_eq!(probs.len(), 2);
        assert!((probs[1] - CHURN_P_TENURE_12).abs() < 1e-5, "{:?}", probs);
        assert!((probs[0] + probs[1] - 1.0).abs() < 1e-6);

        let (class, probs) = classifier.predict_with_proba(&row(2), true).unwrap();
        assert_eq!(class, 1);
        assert!((probs.unwrap()[1] - CHURN_P_TENURE_2).abs() < 1e-5);

        assert_eq!(classifier.predict(&row(2)).unwrap(), 1);
    }

    #[test]
    fn test_tensor_probability_model() {
        let handle = load_fixture("logistic.onnx");
        assert_logistic(&handle);
    }

    #[test]
    fn test_zipmap_probability_model() {
        let handle = load_fixture("logistic_zipmap.onnx");
        assert_logistic(&handle);
    }

    #[test]
    fn test_float_label_model_without_probabilities() {
        let handle = load_fixture("label_only.onnx");
        let classifier = handle.classifier();

        assert!(!handle.supports_probability());
        assert_eq!(classifier.predict(&row(12)).unwrap(), 0);
        assert_eq!(classifier.predict(&row(2)).unwrap(), 1);

        let (class, probs) = classifier.predict_with_proba(&row(2), false).unwrap();
        assert_eq!((class, probs), (1, None));
        assert!(classifier.predict_with_proba(&row(2), true).is_err());
    }

    #[test]
    fn test_extract_int64_label() {
        let value = Tensor::from_array((vec![1_i64], vec![1_i64])).unwrap().into_dyn();
        assert_eq!(extract_label(&value).unwrap(), 1);
    }

    #[test]
    fn test_extract_float_label() {
        let whole = Tensor::from_array((vec![1_i64], vec![0.0_f32])).unwrap().into_dyn();
        assert_eq!(extract_label(&whole).unwrap(), 0);

        let fractional = Tensor::from_array((vec![1_i64], vec![0.5_f32])).unwrap().into_dyn();
        assert!(extract_label(&fractional).is_err());
    }

    #[test]
    fn test_extract_tensor_probabilities() {
        let batched = Tensor::from_array((vec![1_i64, 2], vec![0.25_f32, 0.75])).unwrap().into_dyn();
        assert_eq!(extract_probabilities(&batched).unwrap(), vec![0.25, 0.75]);

        let flat = Tensor::from_array((vec![2_i64], vec![0.5_f32, 0.5])).unwrap().into_dyn();
        assert_eq!(extract_probabilities(&flat).unwrap(), vec![0.5, 0.5]);
    }

    #[test]
    fn test_probabilities_ordered_by_class() {
        let probs = probabilities_by_class(vec![(1, 0.75), (0, 0.25)]).unwrap();
        assert_eq!(probs, vec![0.25, 0.75]);
    }

    #[test]
    fn test_probability_map_with_gap_rejected() {
        assert!(probabilities_by_class(vec![(0, 0.4), (2, 0.6)]).is_err());
        assert!(probabilities_by_class(vec![(1, 0.4), (2, 0.6)]).is_err());
    }

    #[test]
    fn test_resolve_sklearn_outputs() {
        let (label, prob) =
            resolve_outputs(&names(&["output_label", "output_probability"])).unwrap();
        assert_eq!(label, "output_label");
        assert_eq!(prob.as_deref(), Some("output_probability"));
    }

    #[test]
    fn test_resolve_label_only() {
        let (label, prob) = resolve_outputs(&names(&["label"])).unwrap();
        assert_eq!(label, "label");
        assert_eq!(prob, None);
    }

    #[test]
    fn test_resolve_unnamed_single_output() {
        let (label, prob) = resolve_outputs(&names(&["variable"])).unwrap();
        assert_eq!(label, "variable");
        assert_eq!(prob, None);
    }

    #[test]
    fn test_resolve_no_outputs() {
        assert!(resolve_outputs(&[]).is_err());
    }
}
