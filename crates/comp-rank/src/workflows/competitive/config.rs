use serde::{Deserialize, Serialize};

use super::personas::ProfileViolation;
use super::variables::VariableKey;

pub const DEFAULT_PERSONA: &str = "balanced";
pub const DEFAULT_WEIGHT_TOLERANCE: f64 = 0.001;
pub const DEFAULT_AVAILABILITY_THRESHOLD: f64 = 0.5;

/// Tuning knobs for one analysis engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Persona applied when a request carries no weights.
    pub default_persona: String,
    /// Allowed distance of a profile's total weight from 1.0.
    pub weight_tolerance: f64,
    /// Share of candidates that must carry a numeric/ordinal optional variable.
    pub availability_threshold: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            default_persona: DEFAULT_PERSONA.to_string(),
            weight_tolerance: DEFAULT_WEIGHT_TOLERANCE,
            availability_threshold: DEFAULT_AVAILABILITY_THRESHOLD,
        }
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if !self.weight_tolerance.is_finite() || self.weight_tolerance <= 0.0 {
            return Err(ConfigurationError::InvalidTolerance(self.weight_tolerance));
        }
        if !self.availability_threshold.is_finite()
            || self.availability_threshold <= 0.0
            || self.availability_threshold > 1.0
        {
            return Err(ConfigurationError::InvalidAvailabilityThreshold(
                self.availability_threshold,
            ));
        }
        Ok(())
    }
}

/// Fatal problems with weights, personas, filters or engine settings.
///
/// Raised before any ranking happens so no score is ever computed on an
/// invalid configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("weight profile '{profile}' is invalid: {violation}")]
    InvalidProfile {
        profile: String,
        violation: ProfileViolation,
    },
    #[error("unknown persona '{0}'")]
    UnknownPersona(String),
    #[error("no weight remains on the available variables")]
    NoAvailableWeight,
    #[error("filter operator '{operator}' cannot apply to {kind} variable {variable}")]
    FilterTypeMismatch {
        variable: VariableKey,
        operator: &'static str,
        kind: &'static str,
    },
    #[error("filter threshold for {variable} must be finite")]
    InvalidFilterThreshold { variable: VariableKey },
    #[error("weight tolerance must be a positive number (found {0})")]
    InvalidTolerance(f64),
    #[error("availability threshold must be within (0, 1] (found {0})")]
    InvalidAvailabilityThreshold(f64),
    #[error("persona file is malformed: {0}")]
    MalformedPersonas(#[from] serde_json::Error),
}
