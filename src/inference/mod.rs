//! Inference Adapter and model backends
//!
//! The rest of the crate only sees [`TraitModel`]: text in, five raw floats
//! out. Two backends implement it, both fed by the same [`TextEncoder`]:
//! a candle port of `BertForSequenceClassification` and an ONNX Runtime
//! session over an exported graph.

pub mod candle_bert;
pub mod encoder;
pub mod estimator;
pub mod loader;
pub mod onnx;

pub use candle_bert::CandleBertModel;
pub use encoder::{EncodedBatch, TextEncoder};
pub use estimator::PersonalityEstimator;
pub use loader::{load_model, ModelFiles};
pub use onnx::OnnxModel;

use crate::error::{EstimatorError, Result};
use crate::personality::{RawScores, TRAIT_COUNT};

/// Opaque text -> five raw scores capability.
///
/// Implementations are built once at startup and shared read-only across
/// requests; `infer_batch` must return one row per input, in input order.
pub trait TraitModel: Send + Sync {
    fn infer_batch(&self, texts: &[&str]) -> Result<Vec<RawScores>>;

    fn infer(&self, text: &str) -> Result<RawScores> {
        let mut rows = self.infer_batch(&[text])?;
        rows.pop().ok_or(EstimatorError::LabelCount {
            expected: TRAIT_COUNT,
            found: 0,
        })
    }

    /// Short label for logs.
    fn name(&self) -> &str;
}

/// Converts rows of logits into [`RawScores`], checking the head width.
pub(crate) fn rows_to_raw_scores(rows: Vec<Vec<f32>>) -> Result<Vec<RawScores>> {
    rows.into_iter()
        .map(|row| RawScores::try_from_vec(row.into_iter().map(f64::from).collect()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::personality::Trait;

    struct Fixed;

    impl TraitModel for Fixed {
        fn infer_batch(&self, texts: &[&str]) -> Result<Vec<RawScores>> {
            Ok(texts.iter().map(|_| RawScores::new([0.1, 0.2, 0.3, 0.4, 0.5])).collect())
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    #[test]
    fn test_default_infer_uses_batch() {
        let raw = Fixed.infer("hello").unwrap();
        assert_eq!(raw[Trait::Neuroticism], 0.5);
    }

    #[test]
    fn test_rows_to_raw_scores() {
        let rows = vec![vec![0.25f32, 0.5, 0.75, 1.0, 0.0]];
        let raw = rows_to_raw_scores(rows).unwrap();
        assert_eq!(raw[0][Trait::Conscientiousness], 0.75);

        let err = rows_to_raw_scores(vec![vec![0.1f32; 4]]).unwrap_err();
        assert!(matches!(err, EstimatorError::LabelCount { found: 4, .. }));
    }
}
