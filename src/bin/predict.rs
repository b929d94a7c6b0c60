use anyhow::{Context, Result};
use std::io::{self, BufRead, Write};

use big5_estimator::server::PredictResponse;
use big5_estimator::utils::preflight::ModelPreflight;
use big5_estimator::utils::telemetry::init_cli_logging;
use big5_estimator::{load_model, EstimatorConfig, PersonalityEstimator};

fn print_usage() {
    println!("Usage:");
    println!("  predict [TEXT]...      Predict each TEXT argument");
    println!("  predict < posts.txt    Predict each line of stdin\n");
    println!("Output is one JSON object per input: {{\"scores\", \"levels\", \"summary\"}}.");
    println!("Model and backend come from BIG5_MODEL_DIR / BIG5_MODEL_REPO / BIG5_BACKEND.");
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    init_cli_logging()?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        print_usage();
        return Ok(());
    }

    let texts: Vec<String> = if args.is_empty() {
        io::stdin().lock().lines().collect::<io::Result<_>>()?
    } else {
        args
    };

    let config = EstimatorConfig::from_env().context("Failed to read configuration")?;
    ModelPreflight::verify(&config)?;
    let estimator = PersonalityEstimator::new(load_model(&config)?).with_batch_size(config.batch_size);

    let profiles = estimator.predict_batch(&texts)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for profile in profiles {
        let line = serde_json::to_string(&PredictResponse::from(profile))?;
        writeln!(out, "{}", line)?;
    }
    Ok(())
}
