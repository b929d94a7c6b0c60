//! Big Five Personality Estimator
//!
//! Wraps a fine-tuned BERT regression model and turns its output into
//! something a person can read:
//! - Five 0-100 trait scores (de-normalized per trait)
//! - A Low / Medium / High level per trait
//! - A two-sentence summary of the most prominent traits
//!
//! The model is an injected [`inference::TraitModel`]; candle and ONNX
//! Runtime backends are provided, and [`server`] exposes the pipeline over HTTP.

pub mod config;
pub mod error;
pub mod inference;
pub mod personality;
pub mod server;
pub mod utils;

// Re-exports for convenience
pub use config::{Backend, EstimatorConfig, ModelSource};
pub use error::{EstimatorError, Result};
pub use inference::{load_model, PersonalityEstimator, TraitModel};
pub use personality::{Level, PersonalityProfile, Trait};
