//! Startup checks
//!
//! Runs before the model is loaded so a missing file is reported with its
//! path instead of surfacing as an opaque loader error.

use std::path::Path;
use tracing::{info, warn};

use crate::config::{Backend, EstimatorConfig, ModelSource};
use crate::error::Result;
use crate::inference::ModelFiles;

pub struct ModelPreflight;

impl ModelPreflight {
    /// Errs if a required model file is missing. Runtime library problems
    /// are only warned about.
    pub fn verify(config: &EstimatorConfig) -> Result<()> {
        info!("🛡️  Preflight: Verifying model files...");

        match &config.source {
            ModelSource::Local(dir) => {
                let files = ModelFiles::discover(dir, config.backend)?;
                info!("✅ Preflight: Weights found at {}", files.weights.path().display());
            }
            ModelSource::Hub { repo, revision } => {
                info!("Preflight: Model comes from the Hub ({}@{}), skipping local file checks.", repo, revision);
            }
        }

        if config.backend == Backend::Onnx {
            Self::check_onnx_library();
        }

        Ok(())
    }

    fn check_onnx_library() {
        let env_path = std::env::var("ORT_DYLIB_PATH").ok();
        let local = ["libonnxruntime.so", "libonnxruntime.dylib", "onnxruntime.dll"]
            .into_iter()
            .find(|name| Path::new(name).exists());

        if let Some(p) = env_path {
            if Path::new(&p).exists() {
                info!("✅ Preflight: Found ONNX Runtime via ORT_DYLIB_PATH.");
            } else {
                warn!("⚠️  Preflight: ORT_DYLIB_PATH set but file missing: {}", p);
            }
        } else if let Some(name) = local {
            info!("✅ Preflight: Found local ONNX Runtime library ({}).", name);
        } else {
            warn!("⚠️  Preflight: ONNX Runtime library not found. Loading the ONNX backend will fall back to the system search path.");
        }
    }
}
