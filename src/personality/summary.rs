//! Summary Generator
//!
//! Picks the two highest-scoring traits and renders one of two sentence
//! templates. Neuroticism gets its own wording when it dominates; every
//! other trait is reported with its score.

use super::normalize::Scores;
use super::registry::{Trait, TRAIT_COUNT};

/// Traits sorted by score, highest first. Equal scores keep registry order.
pub fn rank(scores: &Scores) -> [(Trait, f64); TRAIT_COUNT] {
    let mut ranked = Trait::ALL.map(|t| (t, scores[t]));
    // slice::sort_by is stable
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked
}

pub fn summarize(scores: &Scores) -> String {
    let ranked = rank(scores);
    let (top, top_score) = ranked[0];
    let (second, _) = ranked[1];

    match top {
        Trait::Neuroticism => format!(
            "You seem emotionally sensitive and may experience feelings quite deeply. \
             You also show relatively higher {}, which suggests you might be {} in many situations.",
            second,
            second.phrase()
        ),
        _ => format!(
            "Your strongest trait here is {} ({:.1}), suggesting you tend to be {}. \
             You also show noticeable {}, which adds a mix of {} to your personality.",
            top,
            top_score,
            top.phrase(),
            second,
            second.phrase()
        ),
    }
}
