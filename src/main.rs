//! Big Five Personality Estimator server
//!
//! Loads the model once, then serves the HTML form and the JSON API.

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

use big5_estimator::utils::preflight::ModelPreflight;
use big5_estimator::utils::telemetry::init_telemetry;
use big5_estimator::{load_model, server, EstimatorConfig, PersonalityEstimator};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    let _telemetry = init_telemetry("big5_estimator")?;

    println!("\n{}", "═".repeat(60));
    println!("🧭 Big Five Personality Estimator v{}", env!("CARGO_PKG_VERSION"));
    println!("{}\n", "═".repeat(60));

    let config = EstimatorConfig::from_env().context("Failed to read configuration")?;
    info!("Configuration: {:?}", config);

    ModelPreflight::verify(&config)?;

    // Model loading is blocking and can take a while for large checkpoints.
    let load_config = config.clone();
    let model = tokio::task::spawn_blocking(move || load_model(&load_config))
        .await?
        .context("Failed to load model")?;

    let estimator = Arc::new(PersonalityEstimator::new(model).with_batch_size(config.batch_size));
    server::run_server(&config, estimator).await
}
