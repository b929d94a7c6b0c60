//! Runtime configuration, read from the environment (and `.env` via dotenv).

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{EstimatorError, Result};

pub const DEFAULT_MODEL_DIR: &str = "./big5-bert-normalized-model";
pub const DEFAULT_MAX_LENGTH: usize = 256;
pub const DEFAULT_BATCH_SIZE: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// safetensors / pytorch weights run through candle
    Candle,
    /// `model.onnx` run through ONNX Runtime
    Onnx,
}

impl FromStr for Backend {
    type Err = EstimatorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "candle" => Ok(Backend::Candle),
            "onnx" | "ort" => Ok(Backend::Onnx),
            other => Err(EstimatorError::Config(format!(
                "unknown backend '{other}', expected 'candle' or 'onnx'"
            ))),
        }
    }
}

/// Where the model files come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelSource {
    Local(PathBuf),
    Hub { repo: String, revision: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EstimatorConfig {
    pub source: ModelSource,
    pub backend: Backend,
    /// Token budget per text; longer inputs are truncated.
    pub max_length: usize,
    /// Upper bound on texts per forward pass in batch prediction.
    pub batch_size: usize,
    pub host: String,
    pub port: u16,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            source: ModelSource::Local(PathBuf::from(DEFAULT_MODEL_DIR)),
            backend: Backend::Candle,
            max_length: DEFAULT_MAX_LENGTH,
            batch_size: DEFAULT_BATCH_SIZE,
            host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

impl EstimatorConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup. Unset keys fall back to
    /// the defaults; set but unparsable keys are errors.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let source = match get("BIG5_MODEL_REPO") {
            Some(repo) => ModelSource::Hub {
                repo: repo.trim().to_string(),
                revision: get("BIG5_MODEL_REVISION").unwrap_or_else(|| "main".to_string()),
            },
            None => get("BIG5_MODEL_DIR")
                .map(|dir| ModelSource::Local(PathBuf::from(dir)))
                .unwrap_or(defaults.source),
        };

        let backend = match get("BIG5_BACKEND") {
            Some(v) => v.parse()?,
            None => defaults.backend,
        };

        let max_length = match get("BIG5_MAX_LENGTH") {
            Some(v) => parse_number::<usize>("BIG5_MAX_LENGTH", &v)?,
            None => defaults.max_length,
        };
        if max_length == 0 {
            return Err(EstimatorError::Config(
                "BIG5_MAX_LENGTH must be greater than zero".to_string(),
            ));
        }

        let batch_size = match get("BIG5_BATCH_SIZE") {
            Some(v) => parse_number::<usize>("BIG5_BATCH_SIZE", &v)?,
            None => defaults.batch_size,
        };
        if batch_size == 0 {
            return Err(EstimatorError::Config(
                "BIG5_BATCH_SIZE must be greater than zero".to_string(),
            ));
        }

        let port = match get("BIG5_PORT") {
            Some(v) => parse_number::<u16>("BIG5_PORT", &v)?,
            None => defaults.port,
        };

        Ok(Self {
            source,
            backend,
            max_length,
            batch_size,
            host: get("BIG5_HOST").unwrap_or(defaults.host),
            port,
        })
    }

    pub fn bind_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| EstimatorError::Config(format!("invalid bind address: {e}")))
    }
}

fn parse_number<T: FromStr>(key: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| EstimatorError::Config(format!("{key}='{value}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = EstimatorConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, EstimatorConfig::default());
        assert_eq!(config.max_length, 256);
        assert_eq!(config.batch_size, 32);
        assert_eq!(
            config.source,
            ModelSource::Local(PathBuf::from("./big5-bert-normalized-model"))
        );
    }

    #[test]
    fn test_repo_overrides_dir() {
        let config = EstimatorConfig::from_lookup(lookup(&[
            ("BIG5_MODEL_DIR", "/models/local"),
            ("BIG5_MODEL_REPO", "someone/big5-bert"),
        ]))
        .unwrap();
        assert_eq!(
            config.source,
            ModelSource::Hub {
                repo: "someone/big5-bert".to_string(),
                revision: "main".to_string()
            }
        );
    }

    #[test]
    fn test_parses_backend_and_numbers() {
        let config = EstimatorConfig::from_lookup(lookup(&[
            ("BIG5_BACKEND", "ONNX"),
            ("BIG5_MAX_LENGTH", "128"),
            ("BIG5_BATCH_SIZE", "8"),
            ("BIG5_PORT", "8080"),
            ("BIG5_HOST", "127.0.0.1"),
        ]))
        .unwrap();
        assert_eq!(config.backend, Backend::Onnx);
        assert_eq!(config.max_length, 128);
        assert_eq!(config.batch_size, 8);
        assert_eq!(config.bind_addr().unwrap().to_string(), "127.0.0.1:8080");
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(EstimatorConfig::from_lookup(lookup(&[("BIG5_BACKEND", "tch")])).is_err());
        assert!(EstimatorConfig::from_lookup(lookup(&[("BIG5_PORT", "http")])).is_err());
        assert!(EstimatorConfig::from_lookup(lookup(&[("BIG5_MAX_LENGTH", "0")])).is_err());
        assert!(EstimatorConfig::from_lookup(lookup(&[("BIG5_BATCH_SIZE", "0")])).is_err());
    }

    #[test]
    fn test_blank_values_use_defaults() {
        let config =
            EstimatorConfig::from_lookup(lookup(&[("BIG5_PORT", "  "), ("BIG5_MODEL_REPO", "")]))
                .unwrap();
        assert_eq!(config.port, 5000);
        assert!(matches!(config.source, ModelSource::Local(_)));
    }
}
