use std::collections::BTreeMap;
use std::io::Read;

use serde::{Deserialize, Serialize};

use super::config::{ConfigurationError, DEFAULT_WEIGHT_TOLERANCE};
use super::variables::VariableKey::*;
use super::variables::{VariableKey, WeightBucket};

/// Named per-variable weights. Only the total is a hard invariant; the
/// core/optional split is a convention reported for inspection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightProfile {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub weights: BTreeMap<VariableKey, f64>,
}

impl WeightProfile {
    pub fn new<I>(name: impl Into<String>, weights: I) -> Self
    where
        I: IntoIterator<Item = (VariableKey, f64)>,
    {
        Self {
            name: name.into(),
            description: String::new(),
            weights: weights.into_iter().collect(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Base weight of `key`; variables the profile omits weigh nothing.
    pub fn weight(&self, key: VariableKey) -> f64 {
        self.weights.get(&key).copied().unwrap_or(0.0)
    }

    pub fn total(&self) -> f64 {
        self.weights.values().sum()
    }

    pub fn core_mass(&self) -> f64 {
        self.bucket_mass(WeightBucket::Core)
    }

    pub fn optional_mass(&self) -> f64 {
        self.bucket_mass(WeightBucket::Optional)
    }

    fn bucket_mass(&self, bucket: WeightBucket) -> f64 {
        self.weights
            .iter()
            .filter(|(key, _)| key.spec().bucket == bucket)
            .map(|(_, weight)| weight)
            .sum()
    }

    pub fn validate(&self, tolerance: f64) -> Result<(), ProfileViolation> {
        for (&variable, &weight) in &self.weights {
            if !weight.is_finite() || weight > 1.0 {
                return Err(ProfileViolation::WeightOutOfRange { variable, weight });
            }
            if weight < 0.0 {
                return Err(ProfileViolation::NegativeWeight { variable, weight });
            }
        }

        if let Some(missing) = VariableKey::CORE
            .into_iter()
            .find(|key| !self.weights.contains_key(key))
        {
            return Err(ProfileViolation::MissingCoreWeight(missing));
        }

        let sum = self.total();
        if (sum - 1.0).abs() > tolerance {
            return Err(ProfileViolation::SumMismatch { sum, tolerance });
        }

        Ok(())
    }
}

/// Reason a weight profile fails validation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProfileViolation {
    #[error("weights sum to {sum:.4}, expected 1.0 within {tolerance}")]
    SumMismatch { sum: f64, tolerance: f64 },
    #[error("core variable {0} has no weight")]
    MissingCoreWeight(VariableKey),
    #[error("{variable} has negative weight {weight}")]
    NegativeWeight { variable: VariableKey, weight: f64 },
    #[error("{variable} weight {weight} is outside [0, 1]")]
    WeightOutOfRange { variable: VariableKey, weight: f64 },
}

/// Read-only table of validated personas, built by the caller and passed in.
#[derive(Debug, Clone)]
pub struct PersonaStore {
    profiles: BTreeMap<String, WeightProfile>,
    tolerance: f64,
}

impl Default for PersonaStore {
    fn default() -> Self {
        Self::builtin()
    }
}

impl PersonaStore {
    /// An empty store; every inserted profile is validated against `tolerance`.
    pub fn empty(tolerance: f64) -> Self {
        Self {
            profiles: BTreeMap::new(),
            tolerance,
        }
    }

    pub fn builtin() -> Self {
        Self::with_builtins(DEFAULT_WEIGHT_TOLERANCE)
    }

    pub fn with_builtins(tolerance: f64) -> Self {
        let profiles = builtin_profiles()
            .into_iter()
            .map(|profile| (profile.name.clone(), profile))
            .collect();
        Self {
            profiles,
            tolerance,
        }
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    pub fn insert(&mut self, profile: WeightProfile) -> Result<(), ConfigurationError> {
        self.validate(&profile)?;
        self.profiles.insert(profile.name.clone(), profile);
        Ok(())
    }

    /// Merges a JSON array of profiles, returning how many were added.
    ///
    /// The batch is all or nothing: one invalid profile leaves the store
    /// untouched.
    pub fn extend_from_json_reader<R: Read>(&mut self, reader: R) -> Result<usize, ConfigurationError> {
        let profiles: Vec<WeightProfile> = serde_json::from_reader(reader)?;
        for profile in &profiles {
            self.validate(profile)?;
        }

        let count = profiles.len();
        self.profiles.extend(
            profiles
                .into_iter()
                .map(|profile| (profile.name.clone(), profile)),
        );
        Ok(count)
    }

    pub fn load(&self, name: &str) -> Result<&WeightProfile, ConfigurationError> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigurationError::UnknownPersona(name.to_string()))
    }

    pub fn list(&self) -> Vec<&str> {
        self.profiles.keys().map(String::as_str).collect()
    }

    pub fn profiles(&self) -> impl Iterator<Item = &WeightProfile> {
        self.profiles.values()
    }

    pub fn validate(&self, profile: &WeightProfile) -> Result<(), ConfigurationError> {
        profile
            .validate(self.tolerance)
            .map_err(|violation| ConfigurationError::InvalidProfile {
                profile: profile.name.clone(),
                violation,
            })
    }
}

const BALANCED: [(VariableKey, f64); 25] = [
    (BuildingAge, 0.06),
    (ClearHeightFt, 0.09),
    (OfficePct, 0.05),
    (ParkingRatio, 0.05),
    (DistanceKm, 0.08),
    (NetRent, 0.16),
    (Tmi, 0.08),
    (BuildingClass, 0.04),
    (AreaDifference, 0.04),
    (BayDepthFt, 0.03),
    (ColumnSpacingFt, 0.02),
    (LotSizeAcres, 0.02),
    (PowerAmps, 0.03),
    (TruckLevelDoors, 0.03),
    (DriveInDoors, 0.02),
    (RailAccess, 0.01),
    (Crane, 0.01),
    (SecureShipping, 0.02),
    (ExcessLand, 0.02),
    (TrailerParking, 0.03),
    (FencedYard, 0.02),
    (HvacCoverage, 0.02),
    (SprinklerSystem, 0.03),
    (OccupancyStatus, 0.02),
    (BuildingCondition, 0.02),
];

const DISTRIBUTION: [(VariableKey, f64); 25] = [
    (BuildingAge, 0.05),
    (ClearHeightFt, 0.12),
    (OfficePct, 0.03),
    (ParkingRatio, 0.03),
    (DistanceKm, 0.10),
    (NetRent, 0.15),
    (Tmi, 0.08),
    (BuildingClass, 0.03),
    (AreaDifference, 0.06),
    (BayDepthFt, 0.04),
    (ColumnSpacingFt, 0.03),
    (LotSizeAcres, 0.02),
    (PowerAmps, 0.01),
    (TruckLevelDoors, 0.06),
    (DriveInDoors, 0.02),
    (RailAccess, 0.0),
    (Crane, 0.0),
    (SecureShipping, 0.03),
    (ExcessLand, 0.02),
    (TrailerParking, 0.05),
    (FencedYard, 0.02),
    (HvacCoverage, 0.0),
    (SprinklerSystem, 0.03),
    (OccupancyStatus, 0.01),
    (BuildingCondition, 0.01),
];

const MANUFACTURING: [(VariableKey, f64); 25] = [
    (BuildingAge, 0.05),
    (ClearHeightFt, 0.07),
    (OfficePct, 0.04),
    (ParkingRatio, 0.07),
    (DistanceKm, 0.06),
    (NetRent, 0.14),
    (Tmi, 0.07),
    (BuildingClass, 0.04),
    (AreaDifference, 0.06),
    (BayDepthFt, 0.02),
    (ColumnSpacingFt, 0.03),
    (LotSizeAcres, 0.02),
    (PowerAmps, 0.08),
    (TruckLevelDoors, 0.02),
    (DriveInDoors, 0.03),
    (RailAccess, 0.03),
    (Crane, 0.06),
    (SecureShipping, 0.01),
    (ExcessLand, 0.02),
    (TrailerParking, 0.01),
    (FencedYard, 0.01),
    (HvacCoverage, 0.01),
    (SprinklerSystem, 0.02),
    (OccupancyStatus, 0.02),
    (BuildingCondition, 0.01),
];

const FLEX_OFFICE: [(VariableKey, f64); 25] = [
    (BuildingAge, 0.08),
    (ClearHeightFt, 0.03),
    (OfficePct, 0.02),
    (ParkingRatio, 0.12),
    (DistanceKm, 0.08),
    (NetRent, 0.18),
    (Tmi, 0.09),
    (BuildingClass, 0.07),
    (AreaDifference, 0.03),
    (BayDepthFt, 0.01),
    (ColumnSpacingFt, 0.01),
    (LotSizeAcres, 0.01),
    (PowerAmps, 0.02),
    (TruckLevelDoors, 0.01),
    (DriveInDoors, 0.01),
    (RailAccess, 0.0),
    (Crane, 0.0),
    (SecureShipping, 0.02),
    (ExcessLand, 0.01),
    (TrailerParking, 0.01),
    (FencedYard, 0.01),
    (HvacCoverage, 0.10),
    (SprinklerSystem, 0.02),
    (OccupancyStatus, 0.03),
    (BuildingCondition, 0.03),
];

fn builtin_profiles() -> Vec<WeightProfile> {
    vec![
        WeightProfile::new("balanced", BALANCED)
            .with_description("General-purpose industrial tenant"),
        WeightProfile::new("distribution", DISTRIBUTION)
            .with_description("Warehouse and logistics users; height, doors and trailer parking"),
        WeightProfile::new("manufacturing", MANUFACTURING)
            .with_description("Production users; power, cranes and rail"),
        WeightProfile::new("flex_office", FLEX_OFFICE)
            .with_description("Showroom and office-heavy users; parking, class and HVAC"),
    ]
}
