//! Tokenization shared by every backend.
//!
//! Truncates each text to `max_length` tokens and pads a batch to its
//! longest member, producing flat row-major id/mask buffers that both candle
//! and ONNX Runtime accept.

use std::path::Path;
use tokenizers::{PaddingParams, PaddingStrategy, Tokenizer, TruncationParams};

use crate::error::{EstimatorError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedBatch {
    pub batch_size: usize,
    pub seq_len: usize,
    pub input_ids: Vec<u32>,
    pub attention_mask: Vec<u32>,
    pub token_type_ids: Vec<u32>,
}

impl EncodedBatch {
    pub fn input_ids_i64(&self) -> Vec<i64> {
        self.input_ids.iter().map(|&v| i64::from(v)).collect()
    }

    pub fn attention_mask_i64(&self) -> Vec<i64> {
        self.attention_mask.iter().map(|&v| i64::from(v)).collect()
    }

    pub fn token_type_ids_i64(&self) -> Vec<i64> {
        self.token_type_ids.iter().map(|&v| i64::from(v)).collect()
    }
}

pub struct TextEncoder {
    tokenizer: Tokenizer,
    max_length: usize,
}

impl TextEncoder {
    pub fn from_file(path: impl AsRef<Path>, max_length: usize) -> Result<Self> {
        let tokenizer = Tokenizer::from_file(path.as_ref())
            .map_err(|e| EstimatorError::Tokenizer(e.to_string()))?;
        Self::new(tokenizer, max_length)
    }

    pub fn new(mut tokenizer: Tokenizer, max_length: usize) -> Result<Self> {
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length,
                ..Default::default()
            }))
            .map_err(|e| EstimatorError::Tokenizer(e.to_string()))?;

        // Keep the pad token the tokenizer was saved with, if any.
        let padding = match tokenizer.get_padding() {
            Some(existing) => PaddingParams {
                strategy: PaddingStrategy::BatchLongest,
                ..existing.clone()
            },
            None => PaddingParams {
                strategy: PaddingStrategy::BatchLongest,
                ..Default::default()
            },
        };
        tokenizer.with_padding(Some(padding));

        Ok(Self {
            tokenizer,
            max_length,
        })
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    pub fn encode(&self, texts: &[&str]) -> Result<EncodedBatch> {
        let inputs: Vec<String> = texts.iter().map(|t| t.to_string()).collect();
        let encodings = self
            .tokenizer
            .encode_batch(inputs, true)
            .map_err(|e| EstimatorError::Tokenizer(e.to_string()))?;

        let batch_size = encodings.len();
        let seq_len = encodings.first().map(|e| e.get_ids().len()).unwrap_or(0);

        let mut batch = EncodedBatch {
            batch_size,
            seq_len,
            input_ids: Vec::with_capacity(batch_size * seq_len),
            attention_mask: Vec::with_capacity(batch_size * seq_len),
            token_type_ids: Vec::with_capacity(batch_size * seq_len),
        };

        for encoding in &encodings {
            if encoding.get_ids().len() != seq_len {
                return Err(EstimatorError::Tokenizer(format!(
                    "ragged batch: expected {} tokens, got {}",
                    seq_len,
                    encoding.get_ids().len()
                )));
            }
            batch.input_ids.extend_from_slice(encoding.get_ids());
            batch.attention_mask.extend_from_slice(encoding.get_attention_mask());
            batch.token_type_ids.extend_from_slice(encoding.get_type_ids());
        }

        Ok(batch)
    }
}
