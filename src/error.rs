//! Error types for the estimator library.
//!
//! Binaries and the HTTP layer wrap these in `anyhow::Error`; the library
//! itself keeps them typed so callers can tell a missing model file from a
//! failed forward pass.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EstimatorError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("model files missing: {}", format_paths(.0))]
    ModelFiles(Vec<PathBuf>),

    #[error("tokenizer error: {0}")]
    Tokenizer(String),

    #[error("candle error: {0}")]
    Candle(#[from] candle_core::Error),

    #[error("onnx runtime error: {0}")]
    Onnx(String),

    #[error("model produced {found} labels per text, expected {expected}")]
    LabelCount { expected: usize, found: usize },

    #[error("model returned {found} rows for {expected} texts")]
    RowCount { expected: usize, found: usize },

    #[error("hugging face hub error: {0}")]
    Hub(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, EstimatorError>;

fn format_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_files_lists_every_path() {
        let err = EstimatorError::ModelFiles(vec![
            PathBuf::from("model/config.json"),
            PathBuf::from("model/tokenizer.json"),
        ]);
        assert_eq!(
            err.to_string(),
            "model files missing: model/config.json, model/tokenizer.json"
        );
    }

    #[test]
    fn test_label_count_message() {
        let err = EstimatorError::LabelCount { expected: 5, found: 3 };
        assert_eq!(err.to_string(), "model produced 3 labels per text, expected 5");
    }

    #[test]
    fn test_row_count_message() {
        let err = EstimatorError::RowCount { expected: 3, found: 1 };
        assert_eq!(err.to_string(), "model returned 1 rows for 3 texts");
    }
}
