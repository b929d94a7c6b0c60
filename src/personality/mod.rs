//! Personality post-processing
//!
//! Turns the five raw model outputs into the artifacts a caller shows:
//! human-scale scores, Low/Medium/High levels and a two-sentence summary.
//!
//! ```text
//! RawScores ──normalize_all──▶ Scores ──┬─classify_all─▶ Levels
//!                                       └─summarize────▶ String
//! ```

pub mod level;
pub mod normalize;
pub mod registry;
pub mod summary;

pub use level::{classify, classify_all, Level, Levels};
pub use normalize::{normalize, normalize_all, RawScores, Scores};
pub use registry::{Trait, TraitBounds, TraitMap, TRAIT_COUNT};
pub use summary::{rank, summarize};

use serde::Serialize;

/// Everything derived from one non-blank text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersonalityProfile {
    pub scores: Scores,
    pub levels: Levels,
    pub summary: String,
}

impl PersonalityProfile {
    pub fn from_raw(raw: &RawScores) -> Self {
        let scores = normalize_all(raw);
        let levels = classify_all(&scores);
        let summary = summarize(&scores);
        Self {
            scores,
            levels,
            summary,
        }
    }
}
