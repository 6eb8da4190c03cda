use std::collections::BTreeMap;

use serde::Serialize;

use super::availability::Availability;
use super::config::ConfigurationError;
use super::personas::WeightProfile;
use super::variables::VariableKey;

/// Weights restricted to the available variables, re-summing to 1.0.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AdjustedWeights {
    weights: BTreeMap<VariableKey, f64>,
}

impl AdjustedWeights {
    pub fn get(&self, key: VariableKey) -> Option<f64> {
        self.weights.get(&key).copied()
    }

    /// Adjusted weight, or 0 for a variable that was dropped.
    pub fn weight(&self, key: VariableKey) -> f64 {
        self.get(key).unwrap_or(0.0)
    }

    pub fn contains(&self, key: VariableKey) -> bool {
        self.weights.contains_key(&key)
    }

    /// Variables and weights in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = (VariableKey, f64)> + '_ {
        self.weights.iter().map(|(key, weight)| (*key, *weight))
    }

    pub fn keys(&self) -> impl Iterator<Item = VariableKey> + '_ {
        self.weights.keys().copied()
    }

    pub fn total(&self) -> f64 {
        self.weights.values().sum()
    }

    pub fn as_map(&self) -> &BTreeMap<VariableKey, f64> {
        &self.weights
    }
}

/// Rescales the base profile onto the available variables.
///
/// Every available variable gets `base / S`, where `S` is the base mass that
/// sits on available variables, so pairwise ratios are preserved exactly.
/// Unavailable variables are left out entirely.
pub fn allocate(
    profile: &WeightProfile,
    availability: &Availability,
) -> Result<AdjustedWeights, ConfigurationError> {
    let available: Vec<VariableKey> = availability.available().collect();
    let mass: f64 = available.iter().map(|key| profile.weight(*key)).sum();

    if mass <= 0.0 || !mass.is_finite() {
        return Err(ConfigurationError::NoAvailableWeight);
    }

    let weights = available
        .into_iter()
        .map(|key| (key, profile.weight(key) / mass))
        .collect();

    Ok(AdjustedWeights { weights })
}
