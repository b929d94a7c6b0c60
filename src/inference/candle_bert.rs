//! BERT sequence classifier on candle.
//!
//! Mirrors the Hugging Face `BertForSequenceClassification` layout: the
//! encoder under `bert.*`, a pooler (`bert.pooler.dense`, tanh over the
//! `[CLS]` hidden state) and a linear `classifier` head. The head's logits
//! are returned as-is; the model was trained to emit [0,1] targets directly.

use candle_core::{DType, Device, IndexOp, Module, Tensor};
use candle_nn::{Linear, VarBuilder};
use candle_transformers::models::bert::{BertModel, Config as BertConfig, DTYPE};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

use super::encoder::{EncodedBatch, TextEncoder};
use super::loader::{ModelFiles, WeightsFile};
use super::{rows_to_raw_scores, TraitModel};
use crate::error::{EstimatorError, Result};
use crate::personality::{RawScores, TRAIT_COUNT};

/// The part of `config.json` the classification head needs.
#[derive(Debug, Clone, Deserialize)]
pub struct HeadConfig {
    pub hidden_size: usize,
    #[serde(default)]
    pub num_labels: Option<usize>,
    #[serde(default)]
    pub id2label: Option<HashMap<String, String>>,
}

impl HeadConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Explicit `num_labels` wins, then `id2label`, then the transformers default of 2.
    pub fn label_count(&self) -> usize {
        self.num_labels
            .or_else(|| self.id2label.as_ref().map(|m| m.len()))
            .unwrap_or(2)
    }
}

pub struct CandleBertModel {
    bert: BertModel,
    pooler: Linear,
    classifier: Linear,
    encoder: TextEncoder,
    device: Device,
}

impl CandleBertModel {
    pub fn load(files: &ModelFiles, max_length: usize) -> Result<Self> {
        let device = Device::Cpu;

        let config_path = files.config.as_deref().ok_or_else(|| {
            EstimatorError::ModelFiles(vec![files.root.join("config.json")])
        })?;
        let raw_config = std::fs::read_to_string(config_path)?;
        let bert_config: BertConfig = serde_json::from_str(&raw_config)?;
        let head: HeadConfig = serde_json::from_str(&raw_config)?;

        let labels = head.label_count();
        if labels != TRAIT_COUNT {
            return Err(EstimatorError::LabelCount {
                expected: TRAIT_COUNT,
                found: labels,
            });
        }

        let vb = match &files.weights {
            WeightsFile::Safetensors(path) => unsafe {
                VarBuilder::from_mmaped_safetensors(&[path], DTYPE, &device)?
            },
            WeightsFile::Pytorch(path) => VarBuilder::from_pth(path, DTYPE, &device)?,
            WeightsFile::Onnx(path) => {
                return Err(EstimatorError::Config(format!(
                    "candle backend cannot load {}, use BIG5_BACKEND=onnx",
                    path.display()
                )))
            }
        };

        let bert = BertModel::load(vb.pp("bert"), &bert_config)?;
        let pooler = candle_nn::linear(head.hidden_size, head.hidden_size, vb.pp("bert.pooler.dense"))?;
        let classifier = candle_nn::linear(head.hidden_size, labels, vb.pp("classifier"))?;
        let encoder = TextEncoder::from_file(&files.tokenizer, max_length)?;

        info!(
            "🧠 Candle BERT classifier loaded from {:?} (hidden={}, labels={})",
            files.root, head.hidden_size, labels
        );

        Ok(Self {
            bert,
            pooler,
            classifier,
            encoder,
            device,
        })
    }

    fn forward(&self, batch: &EncodedBatch) -> Result<Tensor> {
        let shape = (batch.batch_size, batch.seq_len);
        let input_ids = Tensor::from_vec(batch.input_ids.clone(), shape, &self.device)?;
        let token_type_ids = Tensor::from_vec(batch.token_type_ids.clone(), shape, &self.device)?;
        let attention_mask = Tensor::from_vec(batch.attention_mask.clone(), shape, &self.device)?;

        let hidden = self
            .bert
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))?;
        let cls = hidden.i((.., 0))?;
        let pooled = self.pooler.forward(&cls)?.tanh()?;
        Ok(self.classifier.forward(&pooled)?)
    }
}

impl TraitModel for CandleBertModel {
    fn infer_batch(&self, texts: &[&str]) -> Result<Vec<RawScores>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let batch = self.encoder.encode(texts)?;
        let logits = self.forward(&batch)?;
        let rows = logits.to_dtype(DType::F32)?.to_vec2::<f32>()?;
        rows_to_raw_scores(rows)
    }

    fn name(&self) -> &str {
        "candle-bert"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Backend;
    use candle_nn::VarMap;
    use tokenizers::models::wordlevel::WordLevel;
    use tokenizers::pre_tokenizers::whitespace::Whitespace;
    use tokenizers::Tokenizer;

    const TINY_CONFIG: &str = r#"{
        "vocab_size": 8,
        "hidden_size": 8,
        "num_hidden_layers": 1,
        "num_attention_heads": 2,
        "intermediate_size": 16,
        "hidden_act": "gelu",
        "hidden_dropout_prob": 0.0,
        "max_position_embeddings": 32,
        "type_vocab_size": 2,
        "initializer_range": 0.02,
        "layer_norm_eps": 1e-12,
        "pad_token_id": 0,
        "classifier_dropout": null,
        "model_type": "bert",
        "num_labels": 5
    }"#;

    /// Writes a randomly initialised 1-layer classifier in the Hugging Face
    /// layout, plus a word-level tokenizer, into `dir`.
    fn write_tiny_model(dir: &Path) {
        std::fs::write(dir.join("config.json"), TINY_CONFIG).unwrap();
        let config: BertConfig = serde_json::from_str(TINY_CONFIG).unwrap();

        let vm = VarMap::new();
        let vb = VarBuilder::from_varmap(&vm, DTYPE, &Device::Cpu);
        BertModel::load(vb.pp("bert"), &config).unwrap();
        candle_nn::linear(8, 8, vb.pp("bert.pooler.dense")).unwrap();
        candle_nn::linear(8, TRAIT_COUNT, vb.pp("classifier")).unwrap();
        vm.save(dir.join("model.safetensors")).unwrap();

        let vocab: HashMap<String, u32> = [
            ("[PAD]", 0),
            ("[UNK]", 1),
            ("i", 2),
            ("love", 3),
            ("quiet", 4),
            ("evenings", 5),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
        let model = WordLevel::builder()
            .vocab(vocab)
            .unk_token("[UNK]".to_string())
            .build()
            .unwrap();
        let mut tokenizer = Tokenizer::new(model);
        tokenizer.with_pre_tokenizer(Some(Whitespace {}));
        tokenizer.save(dir.join("tokenizer.json"), false).unwrap();
    }

    #[test]
    fn test_load_and_infer_tiny_model() {
        let dir = tempfile::tempdir().unwrap();
        write_tiny_model(dir.path());

        let files = ModelFiles::discover(dir.path(), Backend::Candle).unwrap();
        let model = CandleBertModel::load(&files, 16).unwrap();
        assert_eq!(model.name(), "candle-bert");

        let rows = model.infer_batch(&["i", "i love quiet evenings"]).unwrap();
        assert_eq!(rows.len(), 2);
        for row in &rows {
            assert_eq!(row.values().len(), TRAIT_COUNT);
            assert!(row.values().iter().all(|v| v.is_finite()));
        }

        // Padding the short text up to the long one must not move its scores.
        let single = model.infer("i").unwrap();
        for (a, b) in single.values().iter().zip(rows[0].values()) {
            assert!((a - b).abs() < 1e-5, "{a} vs {b}");
        }
    }

    #[test]
    fn test_load_rejects_wrong_label_count() {
        let dir = tempfile::tempdir().unwrap();
        write_tiny_model(dir.path());
        std::fs::write(
            dir.path().join("config.json"),
            TINY_CONFIG.replace(r#""num_labels": 5"#, r#""num_labels": 3"#),
        )
        .unwrap();

        let files = ModelFiles::discover(dir.path(), Backend::Candle).unwrap();
        let err = CandleBertModel::load(&files, 16).err().unwrap();
        assert!(matches!(err, EstimatorError::LabelCount { expected: 5, found: 3 }));
    }

    #[test]
    fn test_label_count_precedence() {
        let head: HeadConfig = serde_json::from_str(
            r#"{"hidden_size": 768, "num_labels": 5, "id2label": {"0": "a", "1": "b"}}"#,
        )
        .unwrap();
        assert_eq!(head.label_count(), 5);

        let head: HeadConfig = serde_json::from_str(
            r#"{"hidden_size": 768, "id2label": {"0":"LABEL_0","1":"LABEL_1","2":"LABEL_2","3":"LABEL_3","4":"LABEL_4"}}"#,
        )
        .unwrap();
        assert_eq!(head.label_count(), 5);

        let head: HeadConfig = serde_json::from_str(r#"{"hidden_size": 768}"#).unwrap();
        assert_eq!(head.label_count(), 2);
    }

    #[test]
    fn test_head_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"hidden_size": 312, "num_labels": 5, "model_type": "bert"}"#).unwrap();
        let head = HeadConfig::from_file(&path).unwrap();
        assert_eq!(head.hidden_size, 312);
        assert_eq!(head.label_count(), 5);
    }
}
