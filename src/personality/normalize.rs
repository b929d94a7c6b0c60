//! Score Normalizer
//!
//! Maps the model's [0,1] outputs back onto each trait's human scale.

use super::registry::{Trait, TraitMap};

pub type RawScores = TraitMap<f64>;
pub type Scores = TraitMap<f64>;

/// Affine rescale of `raw` into `trait_`'s bounds, rounded to two decimals.
///
/// Neither the input nor the output is clamped: a raw value outside [0,1]
/// extrapolates past the bounds.
pub fn normalize(trait_: Trait, raw: f64) -> f64 {
    let bounds = trait_.bounds();
    round2(raw * bounds.span() + bounds.min)
}

pub fn normalize_all(raw: &RawScores) -> Scores {
    raw.map(|t, &value| {
        if !(0.0..=1.0).contains(&value) {
            tracing::debug!(trait_name = %t, raw = value, "Raw score outside [0,1], extrapolating");
        }
        normalize(t, value)
    })
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
