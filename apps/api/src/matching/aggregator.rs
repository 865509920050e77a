//! Aggregation: weighted sum of sub-scores, scaled to 0–100, plus a short rationale.

use serde::Serialize;

use crate::matching::error::MatchError;
use crate::matching::scorer::{Dimension, SubScores, NEUTRAL_SCORE};
use crate::matching::weights::MatchWeights;

const RATIONALE_FACTORS: usize = 2;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Aggregate {
    /// 0 – 100, one decimal place.
    pub score: f64,
    pub rationale: String,
}

/// Holds a weighting that was validated at construction.
#[derive(Debug, Clone)]
pub struct Aggregator {
    weights: MatchWeights,
}

impl Aggregator {
    pub fn new(weights: MatchWeights) -> Result<Self, MatchError> {
        weights.validate()?;
        Ok(Self { weights })
    }

    pub fn weights(&self) -> &MatchWeights {
        &self.weights
    }

    pub fn aggregate(&self, sub_scores: &SubScores) -> Result<Aggregate, MatchError> {
        aggregate(sub_scores, &self.weights)
    }
}

/// Combines sub-scores with `weights`.
///
/// A weighted dimension missing from `sub_scores` counts as neutral; sub-scores
/// are clamped to [0, 1] so the aggregate always lands in [0, 100].
pub fn aggregate(sub_scores: &SubScores, weights: &MatchWeights) -> Result<Aggregate, MatchError> {
    weights.validate()?;

    let contributions: Vec<(Dimension, f64, f64)> = Dimension::ALL
        .iter()
        .map(|&dimension| {
            let sub_score = sub_scores
                .get(&dimension)
                .copied()
                .unwrap_or(NEUTRAL_SCORE)
                .clamp(0.0, 1.0);
            (dimension, sub_score, weights.get(dimension) * sub_score * 100.0)
        })
        .collect();

    let total: f64 = contributions.iter().map(|(_, _, points)| points).sum();
    let score = round_one_decimal(total.clamp(0.0, 100.0));

    Ok(Aggregate {
        score,
        rationale: build_rationale(score, contributions),
    })
}

pub fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Names the top contributing dimensions. Ties keep `Dimension::ALL` order.
fn build_rationale(score: f64, mut contributions: Vec<(Dimension, f64, f64)>) -> String {
    contributions.sort_by(|a, b| b.2.total_cmp(&a.2));

    let top: Vec<String> = contributions
        .iter()
        .filter(|(_, _, points)| *points > 0.0)
        .take(RATIONALE_FACTORS)
        .map(|(dimension, sub_score, points)| {
            format!("{dimension} ({sub_score:.2} fit, +{points:.1} pts)")
        })
        .collect();

    if top.is_empty() {
        format!("Match {score:.1}/100. No dimension contributed to this match.")
    } else {
        format!("Match {score:.1}/100. Top factors: {}.", top.join(", "))
    }
}
