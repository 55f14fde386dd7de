//! Cosine, Jaccard and Dice similarity over TF-IDF weight vectors.
//!
//! All three measures share the weight-magnitude convention: with
//! `dot = Σ q_i·d_i`, `q_sq = Σ q_i²` and `d_sq = Σ d_i²`,
//!
//! - cosine  = dot / (√q_sq · √d_sq)
//! - dice    = 2·dot / (q_sq + d_sq)
//! - jaccard = dot / (q_sq + d_sq − dot)
//!
//! A zero denominator scores 0. Inputs are non-negative, so every score lies in [0, 1].

use crate::error::Error;
use crate::index::{DocumentRow, QueryVector};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Measure {
    #[default]
    Cosine,
    Jaccard,
    Dice,
}

impl Measure {
    pub const ALL: [Measure; 3] = [Measure::Cosine, Measure::Jaccard, Measure::Dice];

    pub fn as_str(self) -> &'static str {
        match self {
            Measure::Cosine => "cosine",
            Measure::Jaccard => "jaccard",
            Measure::Dice => "dice",
        }
    }
}

impl FromStr for Measure {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cosine" => Ok(Measure::Cosine),
            "jaccard" => Ok(Measure::Jaccard),
            "dice" => Ok(Measure::Dice),
            _ => Err(Error::UnknownMeasure(s.to_string())),
        }
    }
}

impl fmt::Display for Measure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every measure for one (query, document) pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MeasureScores {
    pub cosine: f64,
    pub jaccard: f64,
    pub dice: f64,
}

impl MeasureScores {
    pub fn from_components(dot: f64, q_sq: f64, d_sq: f64) -> Self {
        Self { cosine: cosine(dot, q_sq, d_sq), jaccard: jaccard(dot, q_sq, d_sq), dice: dice(dot, q_sq, d_sq) }
    }

    pub fn get(&self, measure: Measure) -> f64 {
        match measure {
            Measure::Cosine => self.cosine,
            Measure::Jaccard => self.jaccard,
            Measure::Dice => self.dice,
        }
    }
}

fn ratio(num: f64, den: f64) -> f64 {
    if den > 0.0 && num > 0.0 {
        (num / den).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

pub fn cosine(dot: f64, q_sq: f64, d_sq: f64) -> f64 {
    ratio(dot, q_sq.sqrt() * d_sq.sqrt())
}

pub fn dice(dot: f64, q_sq: f64, d_sq: f64) -> f64 {
    ratio(2.0 * dot, q_sq + d_sq)
}

pub fn jaccard(dot: f64, q_sq: f64, d_sq: f64) -> f64 {
    ratio(dot, q_sq + d_sq - dot)
}

/// Inner product of two term-sorted sparse vectors.
pub fn dot(query: &QueryVector, doc: &DocumentRow) -> f64 {
    let (q, d) = (&query.weights, &doc.weights);
    let (mut i, mut j, mut sum) = (0, 0, 0.0);
    while i < q.len() && j < d.len() {
        match q[i].0.cmp(&d[j].0) {
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
            Ordering::Equal => {
                sum += q[i].1 * d[j].1;
                i += 1;
                j += 1;
            }
        }
    }
    sum
}

pub fn scores(query: &QueryVector, doc: &DocumentRow) -> MeasureScores {
    MeasureScores::from_components(dot(query, doc), query.sq_norm, doc.sq_norm)
}

pub fn score(query: &QueryVector, doc: &DocumentRow, measure: Measure) -> f64 {
    scores(query, doc).get(measure)
}
