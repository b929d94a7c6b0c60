//! Model file discovery and backend construction.

use hf_hub::{api::sync::Api, Repo, RepoType};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use super::{CandleBertModel, OnnxModel, TraitModel};
use crate::config::{Backend, EstimatorConfig, ModelSource};
use crate::error::{EstimatorError, Result};

const CONFIG_FILE: &str = "config.json";
const TOKENIZER_FILE: &str = "tokenizer.json";
const SAFETENSORS_FILE: &str = "model.safetensors";
const PYTORCH_FILE: &str = "pytorch_model.bin";
const ONNX_FILES: [&str; 2] = ["model.onnx", "onnx/model.onnx"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WeightsFile {
    Safetensors(PathBuf),
    Pytorch(PathBuf),
    Onnx(PathBuf),
}

impl WeightsFile {
    pub fn path(&self) -> &Path {
        match self {
            WeightsFile::Safetensors(p) | WeightsFile::Pytorch(p) | WeightsFile::Onnx(p) => p,
        }
    }
}

/// Resolved on-disk paths of one model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelFiles {
    pub root: PathBuf,
    pub config: Option<PathBuf>,
    pub tokenizer: PathBuf,
    pub weights: WeightsFile,
}

impl ModelFiles {
    pub fn resolve(config: &EstimatorConfig) -> Result<Self> {
        match &config.source {
            ModelSource::Local(dir) => Self::discover(dir, config.backend),
            ModelSource::Hub { repo, revision } => Self::fetch(repo, revision, config.backend),
        }
    }

    /// Looks for the files `backend` needs under `dir`. Reports every missing
    /// file at once rather than stopping at the first.
    pub fn discover(dir: &Path, backend: Backend) -> Result<Self> {
        let mut missing = Vec::new();

        if !dir.is_dir() {
            return Err(EstimatorError::ModelFiles(vec![dir.to_path_buf()]));
        }

        let tokenizer = dir.join(TOKENIZER_FILE);
        if !tokenizer.is_file() {
            missing.push(tokenizer.clone());
        }

        let config = Some(dir.join(CONFIG_FILE)).filter(|p| p.is_file());

        let weights = match backend {
            Backend::Candle => {
                if config.is_none() {
                    missing.push(dir.join(CONFIG_FILE));
                }
                let safetensors = dir.join(SAFETENSORS_FILE);
                let pytorch = dir.join(PYTORCH_FILE);
                if safetensors.is_file() {
                    Some(WeightsFile::Safetensors(safetensors))
                } else if pytorch.is_file() {
                    Some(WeightsFile::Pytorch(pytorch))
                } else {
                    missing.push(safetensors);
                    None
                }
            }
            Backend::Onnx => {
                let found = ONNX_FILES.iter().map(|f| dir.join(f)).find(|p| p.is_file());
                if found.is_none() {
                    missing.push(dir.join(ONNX_FILES[0]));
                }
                found.map(WeightsFile::Onnx)
            }
        };

        match weights {
            Some(weights) if missing.is_empty() => Ok(Self {
                root: dir.to_path_buf(),
                config,
                tokenizer,
                weights,
            }),
            _ => Err(EstimatorError::ModelFiles(missing)),
        }
    }

    /// Downloads (or reuses the cache of) a Hub repository.
    pub fn fetch(repo_id: &str, revision: &str, backend: Backend) -> Result<Self> {
        info!("📦 Fetching model {}@{} from the Hugging Face Hub...", repo_id, revision);
        let api = Api::new().map_err(|e| EstimatorError::Hub(e.to_string()))?;
        let repo = api.repo(Repo::with_revision(
            repo_id.to_string(),
            RepoType::Model,
            revision.to_string(),
        ));
        let get = |name: &str| {
            repo.get(name).map_err(|e| {
                debug!("Hub file {} unavailable: {}", name, e);
                EstimatorError::Hub(format!("{repo_id}: {name}: {e}"))
            })
        };

        let tokenizer = get(TOKENIZER_FILE)?;
        let config = get(CONFIG_FILE).ok();

        let weights = match backend {
            Backend::Candle => match get(SAFETENSORS_FILE) {
                Ok(path) => WeightsFile::Safetensors(path),
                Err(_) => WeightsFile::Pytorch(get(PYTORCH_FILE)?),
            },
            Backend::Onnx => {
                let mut found = None;
                for name in ONNX_FILES {
                    if let Ok(path) = get(name) {
                        found = Some(path);
                        break;
                    }
                }
                WeightsFile::Onnx(found.ok_or_else(|| {
                    EstimatorError::Hub(format!("{repo_id}: no ONNX export found"))
                })?)
            }
        };
        if backend == Backend::Candle && config.is_none() {
            return Err(EstimatorError::Hub(format!("{repo_id}: {CONFIG_FILE} missing")));
        }

        let root = tokenizer
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Ok(Self {
            root,
            config,
            tokenizer,
            weights,
        })
    }
}

/// Builds the backend named in `config`. Called once at startup; the
/// returned handle is shared by every request.
pub fn load_model(config: &EstimatorConfig) -> Result<Arc<dyn TraitModel>> {
    let files = ModelFiles::resolve(config)?;
    debug!("Model files: {:?}", files);

    let model: Arc<dyn TraitModel> = match config.backend {
        Backend::Candle => Arc::new(CandleBertModel::load(&files, config.max_length)?),
        Backend::Onnx => Arc::new(OnnxModel::load(&files, config.max_length)?),
    };
    info!("✅ Model ready ({}, max_length={})", model.name(), config.max_length);
    Ok(model)
}
