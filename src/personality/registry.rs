//! Trait Registry
//!
//! The five Big Five dimensions, their de-normalization bounds and the
//! phrases the summary uses to describe them. Everything here is a
//! compiled-in constant.

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde::Deserialize;
use std::fmt;
use std::ops::{Index, IndexMut};

use crate::error::{EstimatorError, Result};

/// Number of personality dimensions the model predicts.
pub const TRAIT_COUNT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trait {
    Agreeableness,
    Openness,
    Conscientiousness,
    Extraversion,
    Neuroticism,
}

impl Trait {
    /// Registry order. This is also the column order of the model head.
    pub const ALL: [Trait; TRAIT_COUNT] = [
        Trait::Agreeableness,
        Trait::Openness,
        Trait::Conscientiousness,
        Trait::Extraversion,
        Trait::Neuroticism,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Trait::Agreeableness => "agreeableness",
            Trait::Openness => "openness",
            Trait::Conscientiousness => "conscientiousness",
            Trait::Extraversion => "extraversion",
            Trait::Neuroticism => "neuroticism",
        }
    }

    /// Short description used in the generated summary.
    pub fn phrase(&self) -> &'static str {
        match self {
            Trait::Agreeableness => "kind and cooperative",
            Trait::Openness => "curious and imaginative",
            Trait::Conscientiousness => "organized and responsible",
            Trait::Extraversion => "outgoing and energetic",
            Trait::Neuroticism => "emotionally sensitive",
        }
    }

    pub fn bounds(&self) -> TraitBounds {
        match self {
            Trait::Agreeableness => TraitBounds::new(0.0, 99.0),
            Trait::Openness => TraitBounds::new(9.0, 98.0),
            Trait::Conscientiousness => TraitBounds::new(1.0, 98.0),
            Trait::Extraversion => TraitBounds::new(0.0, 99.0),
            Trait::Neuroticism => TraitBounds::new(0.0, 99.0),
        }
    }

    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for Trait {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// De-normalization range of one trait. `min < max` for every registry entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraitBounds {
    pub min: f64,
    pub max: f64,
}

impl TraitBounds {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }
}

/// One value per trait, stored in registry order.
///
/// The fixed arity means a record can never be missing a trait; the only
/// fallible constructor is [`TraitMap::try_from_vec`], used at the model
/// boundary where the output width is not known statically.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraitMap<T> {
    values: [T; TRAIT_COUNT],
}

impl<T> TraitMap<T> {
    pub const fn new(values: [T; TRAIT_COUNT]) -> Self {
        Self { values }
    }

    pub fn from_fn(mut f: impl FnMut(Trait) -> T) -> Self {
        Self {
            values: Trait::ALL.map(&mut f),
        }
    }

    pub fn try_from_vec(values: Vec<T>) -> Result<Self> {
        let found = values.len();
        let values: [T; TRAIT_COUNT] = values
            .try_into()
            .map_err(|_| EstimatorError::LabelCount {
                expected: TRAIT_COUNT,
                found,
            })?;
        Ok(Self { values })
    }

    pub fn get(&self, t: Trait) -> &T {
        &self.values[t.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (Trait, &T)> + '_ {
        Trait::ALL.into_iter().zip(self.values.iter())
    }

    pub fn map<U>(&self, mut f: impl FnMut(Trait, &T) -> U) -> TraitMap<U> {
        TraitMap::from_fn(|t| f(t, self.get(t)))
    }

    pub fn values(&self) -> &[T; TRAIT_COUNT] {
        &self.values
    }
}

impl<T> Index<Trait> for TraitMap<T> {
    type Output = T;

    fn index(&self, t: Trait) -> &T {
        &self.values[t.index()]
    }
}

impl<T> IndexMut<Trait> for TraitMap<T> {
    fn index_mut(&mut self, t: Trait) -> &mut T {
        &mut self.values[t.index()]
    }
}

impl<T: Serialize> Serialize for TraitMap<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(TRAIT_COUNT))?;
        for (t, value) in self.iter() {
            map.serialize_entry(t.as_str(), value)?;
        }
        map.end()
    }
}
