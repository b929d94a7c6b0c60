//! ONNX Runtime backend for an exported `BertForSequenceClassification`.
//!
//! Uses the dynamically loaded runtime (`ORT_DYLIB_PATH` or a library next
//! to the binary), so nothing is linked at build time.

use ort::session::{builder::GraphOptimizationLevel, Session, SessionInputValue};
use ort::value::Tensor;
use std::sync::Mutex;
use tracing::info;

use super::encoder::{EncodedBatch, TextEncoder};
use super::loader::{ModelFiles, WeightsFile};
use super::{rows_to_raw_scores, TraitModel};
use crate::error::{EstimatorError, Result};
use crate::personality::{RawScores, TRAIT_COUNT};

const INPUT_IDS: &str = "input_ids";
const ATTENTION_MASK: &str = "attention_mask";
const TOKEN_TYPE_IDS: &str = "token_type_ids";
const LOGITS: &str = "logits";

pub struct OnnxModel {
    session: Mutex<Session>,
    encoder: TextEncoder,
    wants_token_types: bool,
    output_name: String,
}

fn onnx_err(e: impl std::fmt::Display) -> EstimatorError {
    EstimatorError::Onnx(e.to_string())
}

impl OnnxModel {
    pub fn load(files: &ModelFiles, max_length: usize) -> Result<Self> {
        let WeightsFile::Onnx(path) = &files.weights else {
            return Err(EstimatorError::Config(format!(
                "onnx backend needs a .onnx export, found {}",
                files.weights.path().display()
            )));
        };

        let session = Session::builder()
            .map_err(onnx_err)?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(onnx_err)?
            .commit_from_file(path)
            .map_err(onnx_err)?;

        let input_names: Vec<String> = session.inputs().iter().map(|i| i.name().to_string()).collect();
        for required in [INPUT_IDS, ATTENTION_MASK] {
            if !input_names.iter().any(|n| n == required) {
                return Err(EstimatorError::Onnx(format!(
                    "graph has no '{required}' input (inputs: {input_names:?})"
                )));
            }
        }
        let wants_token_types = input_names.iter().any(|n| n == TOKEN_TYPE_IDS);

        let output_names: Vec<String> = session.outputs().iter().map(|o| o.name().to_string()).collect();
        let output_name = output_names
            .iter()
            .find(|n| *n == LOGITS)
            .or_else(|| output_names.first())
            .cloned()
            .ok_or_else(|| EstimatorError::Onnx("graph has no outputs".to_string()))?;

        let encoder = TextEncoder::from_file(&files.tokenizer, max_length)?;

        info!(
            "🧠 ONNX classifier loaded from {} (inputs={:?}, output={})",
            path.display(),
            input_names,
            output_name
        );

        Ok(Self {
            session: Mutex::new(session),
            encoder,
            wants_token_types,
            output_name,
        })
    }

    fn run(&self, batch: &EncodedBatch) -> Result<Vec<Vec<f32>>> {
        let shape = vec![batch.batch_size as i64, batch.seq_len as i64];

        let mut inputs: Vec<(&str, SessionInputValue<'static>)> = vec![
            (
                INPUT_IDS,
                Tensor::from_array((shape.clone(), batch.input_ids_i64()))
                    .map_err(onnx_err)?
                    .into(),
            ),
            (
                ATTENTION_MASK,
                Tensor::from_array((shape.clone(), batch.attention_mask_i64()))
                    .map_err(onnx_err)?
                    .into(),
            ),
        ];
        if self.wants_token_types {
            inputs.push((
                TOKEN_TYPE_IDS,
                Tensor::from_array((shape, batch.token_type_ids_i64()))
                    .map_err(onnx_err)?
                    .into(),
            ));
        }

        let mut session = self
            .session
            .lock()
            .map_err(|_| EstimatorError::Onnx("session mutex poisoned".to_string()))?;
        let outputs = session.run(inputs).map_err(onnx_err)?;
        let (dims, data) = outputs[self.output_name.as_str()]
            .try_extract_tensor::<f32>()
            .map_err(onnx_err)?;

        let width = dims.last().copied().unwrap_or(0) as usize;
        if width != TRAIT_COUNT {
            return Err(EstimatorError::LabelCount {
                expected: TRAIT_COUNT,
                found: width,
            });
        }
        let rows = dims.first().copied().unwrap_or(0) as usize;
        if dims.len() != 2 || rows != batch.batch_size {
            return Err(EstimatorError::RowCount {
                expected: batch.batch_size,
                found: rows,
            });
        }
        Ok(data.chunks(width).map(|row| row.to_vec()).collect())
    }
}

impl TraitModel for OnnxModel {
    fn infer_batch(&self, texts: &[&str]) -> Result<Vec<RawScores>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let batch = self.encoder.encode(texts)?;
        let rows = self.run(&batch)?;
        rows_to_raw_scores(rows)
    }

    fn name(&self) -> &str {
        "onnx"
    }
}
