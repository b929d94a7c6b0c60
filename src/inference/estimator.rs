//! Inference Adapter
//!
//! Front door of the pipeline: guards against blank input, calls the model
//! and hands the raw scores to the post-processing in
//! [`crate::personality`].

use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

use super::TraitModel;
use crate::config::DEFAULT_BATCH_SIZE;
use crate::error::{EstimatorError, Result};
use crate::personality::PersonalityProfile;
use crate::utils::preview;

pub struct PersonalityEstimator {
    model: Arc<dyn TraitModel>,
    batch_size: usize,
}

impl PersonalityEstimator {
    pub fn new(model: Arc<dyn TraitModel>) -> Self {
        Self {
            model,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Caps how many texts [`predict_batch`](Self::predict_batch) sends to
    /// the model in one call. Zero is treated as one.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    /// Scores, levels and summary for `text`.
    ///
    /// Blank or whitespace-only text returns `Ok(None)` without touching the
    /// model. Model failures are returned unchanged.
    pub fn predict(&self, text: &str) -> Result<Option<PersonalityProfile>> {
        if text.trim().is_empty() {
            debug!("Blank input, skipping inference");
            return Ok(None);
        }

        let request_id = Uuid::new_v4();
        let started = Instant::now();
        debug!(%request_id, text = %preview(text, 60), "Running inference");

        let raw = self.model.infer(text)?;
        let profile = PersonalityProfile::from_raw(&raw);

        info!(
            %request_id,
            model = self.model.name(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Prediction complete"
        );
        Ok(Some(profile))
    }

    /// Like [`predict`](Self::predict) for many texts. Non-blank entries go
    /// to the model in chunks of at most `batch_size`; output order follows
    /// input order.
    pub fn predict_batch<S: AsRef<str>>(&self, texts: &[S]) -> Result<Vec<Option<PersonalityProfile>>> {
        let live: Vec<(usize, &str)> = texts
            .iter()
            .enumerate()
            .map(|(i, t)| (i, t.as_ref()))
            .filter(|(_, t)| !t.trim().is_empty())
            .collect();

        let mut results: Vec<Option<PersonalityProfile>> = vec![None; texts.len()];
        if live.is_empty() {
            return Ok(results);
        }

        let started = Instant::now();
        for chunk in live.chunks(self.batch_size) {
            let inputs: Vec<&str> = chunk.iter().map(|(_, t)| *t).collect();
            let raw_rows = self.model.infer_batch(&inputs)?;
            if raw_rows.len() != chunk.len() {
                return Err(EstimatorError::RowCount {
                    expected: chunk.len(),
                    found: raw_rows.len(),
                });
            }

            for ((index, _), raw) in chunk.iter().zip(raw_rows.iter()) {
                results[*index] = Some(PersonalityProfile::from_raw(raw));
            }
        }

        info!(
            model = self.model.name(),
            total = texts.len(),
            inferred = live.len(),
            chunks = live.len().div_ceil(self.batch_size),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Batch prediction complete"
        );
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EstimatorError;
    use crate::personality::{normalize, Level, RawScores, Trait};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct CountingModel {
        calls: AtomicUsize,
        raw: RawScores,
    }

    impl CountingModel {
        fn new(raw: [f64; 5]) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                raw: RawScores::new(raw),
            }
        }
    }

    impl TraitModel for CountingModel {
        fn infer_batch(&self, texts: &[&str]) -> Result<Vec<RawScores>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(texts.iter().map(|_| self.raw).collect())
        }

        fn name(&self) -> &str {
            "counting"
        }
    }

    /// Returns a single row no matter how many texts it gets.
    struct SingleRowModel;

    impl TraitModel for SingleRowModel {
        fn infer_batch(&self, _texts: &[&str]) -> Result<Vec<RawScores>> {
            Ok(vec![RawScores::new([0.5; 5])])
        }

        fn name(&self) -> &str {
            "single-row"
        }
    }

    /// Records every batch it receives; agreeableness encodes the text's number.
    struct RecordingModel {
        batches: Mutex<Vec<Vec<String>>>,
    }

    impl TraitModel for RecordingModel {
        fn infer_batch(&self, texts: &[&str]) -> Result<Vec<RawScores>> {
            self.batches
                .lock()
                .unwrap()
                .push(texts.iter().map(|t| t.to_string()).collect());
            Ok(texts
                .iter()
                .map(|t| {
                    let n: f64 = t.trim_start_matches("text ").parse().unwrap();
                    RawScores::new([n / 100.0, 0.0, 0.0, 0.0, 0.0])
                })
                .collect())
        }

        fn name(&self) -> &str {
            "recording"
        }
    }

    struct FailingModel;

    impl TraitModel for FailingModel {
        fn infer_batch(&self, _texts: &[&str]) -> Result<Vec<RawScores>> {
            Err(EstimatorError::Onnx("device lost".to_string()))
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    #[test]
    fn test_blank_input_skips_model() {
        let model = Arc::new(CountingModel::new([0.5; 5]));
        let estimator = PersonalityEstimator::new(model.clone());
        assert!(estimator.predict("").unwrap().is_none());
        assert!(estimator.predict("  \n\t ").unwrap().is_none());
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_predict_runs_full_pipeline() {
        let model = Arc::new(CountingModel::new([0.2, 0.3, 0.9, 0.4, 0.1]));
        let estimator = PersonalityEstimator::new(model.clone());
        let profile = estimator.predict("I plan everything ahead.").unwrap().unwrap();

        assert_eq!(profile.scores[Trait::Conscientiousness], 88.3);
        assert_eq!(profile.levels[Trait::Conscientiousness], Level::High);
        assert_eq!(profile.levels[Trait::Neuroticism], Level::Low);
        assert!(profile.summary.starts_with("Your strongest trait here is conscientiousness (88.3)"));
        assert_eq!(model.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_model_failure_propagates() {
        let estimator = PersonalityEstimator::new(Arc::new(FailingModel));
        let err = estimator.predict("hello").unwrap_err();
        assert!(matches!(err, EstimatorError::Onnx(ref m) if m == "device lost"));
    }

    #[test]
    fn test_batch_keeps_positions_and_calls_once() {
        let model = Arc::new(CountingModel::new([0.5; 5]));
        let estimator = PersonalityEstimator::new(model.clone());
        let results = estimator
            .predict_batch(&["first", "   ", "third", ""])
            .unwrap();

        assert_eq!(results.len(), 4);
        assert!(results[0].is_some());
        assert!(results[1].is_none());
        assert!(results[2].is_some());
        assert!(results[3].is_none());
        assert_eq!(model.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_batch_of_blanks_skips_model() {
        let model = Arc::new(CountingModel::new([0.5; 5]));
        let estimator = PersonalityEstimator::new(model.clone());
        let results = estimator.predict_batch(&[String::new(), " ".to_string()]).unwrap();
        assert_eq!(results, vec![None, None]);
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_batch_short_rows_are_an_error() {
        let estimator = PersonalityEstimator::new(Arc::new(SingleRowModel));
        let err = estimator
            .predict_batch(&["alpha", "beta", "gamma"])
            .unwrap_err();
        assert!(matches!(
            err,
            EstimatorError::RowCount {
                expected: 3,
                found: 1
            }
        ));
    }

    #[test]
    fn test_batch_is_split_into_chunks_in_order() {
        let model = Arc::new(RecordingModel {
            batches: Mutex::new(Vec::new()),
        });
        let estimator = PersonalityEstimator::new(model.clone()).with_batch_size(32);
        let texts: Vec<String> = (0..100).map(|i| format!("text {i}")).collect();
        let results = estimator.predict_batch(&texts).unwrap();

        let batches = model.batches.lock().unwrap();
        let sizes: Vec<usize> = batches.iter().map(|b| b.len()).collect();
        assert_eq!(sizes, vec![32, 32, 32, 4]);
        let seen: Vec<String> = batches.iter().flatten().cloned().collect();
        assert_eq!(seen, texts);

        assert_eq!(results.len(), 100);
        for (i, profile) in results.iter().enumerate() {
            let expected = normalize(Trait::Agreeableness, i as f64 / 100.0);
            assert_eq!(profile.as_ref().unwrap().scores[Trait::Agreeableness], expected);
        }
    }

    #[test]
    fn test_zero_batch_size_is_clamped() {
        let estimator =
            PersonalityEstimator::new(Arc::new(CountingModel::new([0.5; 5]))).with_batch_size(0);
        assert_eq!(estimator.batch_size(), 1);
    }
}
