//! Level Classifier

use serde::{Deserialize, Serialize};
use std::fmt;

use super::normalize::Scores;
use super::registry::TraitMap;

/// Scores below this are `Low`.
pub const MEDIUM_THRESHOLD: f64 = 40.0;
/// Scores at or above this are `High`.
pub const HIGH_THRESHOLD: f64 = 60.0;

pub type Levels = TraitMap<Level>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Level {
    Low,
    Medium,
    High,
}

impl Level {
    /// Buckets a score read on a 0-100 scale. Total over `f64`; NaN fails
    /// both comparisons and lands in `High`.
    pub fn classify(score: f64) -> Self {
        if score < MEDIUM_THRESHOLD {
            Level::Low
        } else if score < HIGH_THRESHOLD {
            Level::Medium
        } else {
            Level::High
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Low => "Low",
            Level::Medium => "Medium",
            Level::High => "High",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn classify(score: f64) -> Level {
    Level::classify(score)
}

pub fn classify_all(scores: &Scores) -> Levels {
    scores.map(|_, &score| Level::classify(score))
}
