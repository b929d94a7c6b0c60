use anyhow::{bail, Result};
use ort::session::{builder::GraphOptimizationLevel, Session};
use std::path::Path;

use big5_estimator::config::{Backend, DEFAULT_MODEL_DIR};
use big5_estimator::inference::candle_bert::HeadConfig;
use big5_estimator::inference::ModelFiles;
use big5_estimator::personality::TRAIT_COUNT;

fn inspect_onnx(path: &Path) -> Result<()> {
    let session = Session::builder()
        .map_err(|e| anyhow::anyhow!("{e}"))?
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .map_err(|e| anyhow::anyhow!("{e}"))?
        .commit_from_file(path)
        .map_err(|e| anyhow::anyhow!("{e}"))?;

    println!("Inputs:");
    for input in session.inputs() {
        println!("  - Name: {}", input.name());
    }

    println!("Outputs:");
    for output in session.outputs() {
        println!("  - Name: {}", output.name());
    }

    for required in ["input_ids", "attention_mask"] {
        if !session.inputs().iter().any(|i| i.name() == required) {
            println!("❌ Missing required input '{}'", required);
        }
    }
    Ok(())
}

fn inspect_dir(dir: &Path) -> Result<()> {
    println!("Model directory: {}", dir.display());
    for backend in [Backend::Candle, Backend::Onnx] {
        match ModelFiles::discover(dir, backend) {
            Ok(files) => println!("  {:?}: ✅ {}", backend, files.weights.path().display()),
            Err(e) => println!("  {:?}: ❌ {}", backend, e),
        }
    }

    let config_path = dir.join("config.json");
    if config_path.is_file() {
        let head = HeadConfig::from_file(&config_path)?;
        let labels = head.label_count();
        let mark = if labels == TRAIT_COUNT { "✅" } else { "❌" };
        println!("Head: hidden_size={}, labels={} {}", head.hidden_size, labels, mark);
    }

    if let Ok(files) = ModelFiles::discover(dir, Backend::Onnx) {
        inspect_onnx(files.weights.path())?;
    }
    Ok(())
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let target = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("BIG5_MODEL_DIR").ok())
        .unwrap_or_else(|| DEFAULT_MODEL_DIR.to_string());
    let path = Path::new(&target);

    if path.is_dir() {
        inspect_dir(path)
    } else if path.extension().is_some_and(|ext| ext == "onnx") {
        inspect_onnx(path)
    } else {
        bail!("{} is neither a model directory nor an .onnx file", path.display())
    }
}
