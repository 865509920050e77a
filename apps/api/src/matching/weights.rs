use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::matching::error::MatchError;
use crate::matching::scorer::Dimension;

/// Allowed deviation of the weight sum from 1.0.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Dimension → weight. Dimensions absent from the map carry weight 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchWeights(BTreeMap<Dimension, f64>);

impl Default for MatchWeights {
    fn default() -> Self {
        Self(BTreeMap::from([
            (Dimension::Skill, 0.4),
            (Dimension::Experience, 0.3),
            (Dimension::Location, 0.15),
            (Dimension::Language, 0.15),
        ]))
    }
}

impl MatchWeights {
    /// Builds a validated weighting.
    pub fn new(weights: BTreeMap<Dimension, f64>) -> Result<Self, MatchError> {
        let weights = Self(weights);
        weights.validate()?;
        Ok(weights)
    }

    /// Parses `{"skill": 0.5, "experience": 0.3, ...}` and validates it.
    pub fn from_json(raw: &str) -> Result<Self, MatchError> {
        let weights: BTreeMap<Dimension, f64> = serde_json::from_str(raw)
            .map_err(|e| MatchError::Configuration(format!("weights are not valid JSON: {e}")))?;
        Self::new(weights)
    }

    pub fn get(&self, dimension: Dimension) -> f64 {
        self.0.get(&dimension).copied().unwrap_or(0.0)
    }

    pub fn sum(&self) -> f64 {
        self.0.values().sum()
    }

    pub fn validate(&self) -> Result<(), MatchError> {
        for (dimension, weight) in &self.0 {
            if !weight.is_finite() || *weight < 0.0 {
                return Err(MatchError::Configuration(format!(
                    "weight for '{dimension}' must be a non-negative number, got {weight}"
                )));
            }
        }
        let sum = self.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(MatchError::Configuration(format!(
                "weights must sum to 1.0, got {sum}"
            )));
        }
        Ok(())
    }
}
