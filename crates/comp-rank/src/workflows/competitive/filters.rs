use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::config::ConfigurationError;
use super::dataset::Candidate;
use super::variables::{VariableKey, VariableKind};

/// Hard eligibility requirement evaluated before ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MustHaveFilter {
    pub variable: VariableKey,
    #[serde(flatten)]
    pub condition: FilterCondition,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "operator", rename_all = "snake_case")]
pub enum FilterCondition {
    Gte { threshold: f64 },
    Gt { threshold: f64 },
    Lte { threshold: f64 },
    Lt { threshold: f64 },
    Eq { threshold: f64 },
    Is { value: bool },
}

impl FilterCondition {
    pub const fn operator(self) -> &'static str {
        match self {
            FilterCondition::Gte { .. } => ">=",
            FilterCondition::Gt { .. } => ">",
            FilterCondition::Lte { .. } => "<=",
            FilterCondition::Lt { .. } => "<",
            FilterCondition::Eq { .. } => "==",
            FilterCondition::Is { .. } => "is",
        }
    }

    fn threshold(self) -> Option<f64> {
        match self {
            FilterCondition::Gte { threshold }
            | FilterCondition::Gt { threshold }
            | FilterCondition::Lte { threshold }
            | FilterCondition::Lt { threshold }
            | FilterCondition::Eq { threshold } => Some(threshold),
            FilterCondition::Is { .. } => None,
        }
    }
}

impl MustHaveFilter {
    pub fn new(variable: VariableKey, condition: FilterCondition) -> Self {
        Self {
            variable,
            condition,
        }
    }

    /// Rejects operator/variable combinations that can never be evaluated.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let kind = self.variable.kind();
        let boolean_variable = matches!(kind, VariableKind::Boolean);
        let boolean_condition = matches!(self.condition, FilterCondition::Is { .. });

        if boolean_variable != boolean_condition {
            return Err(ConfigurationError::FilterTypeMismatch {
                variable: self.variable,
                operator: self.condition.operator(),
                kind: kind.label(),
            });
        }

        if let Some(threshold) = self.condition.threshold() {
            if !threshold.is_finite() {
                return Err(ConfigurationError::InvalidFilterThreshold {
                    variable: self.variable,
                });
            }
        }

        Ok(())
    }

    /// A property lacking the value cannot demonstrate the requirement and fails.
    pub fn admits(&self, candidate: &Candidate) -> bool {
        let Some(value) = candidate.value(self.variable) else {
            return false;
        };

        match self.condition {
            FilterCondition::Is { value: expected } => value.as_flag() == Some(expected),
            condition => {
                let (Some(actual), Some(threshold)) = (value.as_number(), condition.threshold())
                else {
                    return false;
                };
                match condition {
                    FilterCondition::Gte { .. } => actual >= threshold,
                    FilterCondition::Gt { .. } => actual > threshold,
                    FilterCondition::Lte { .. } => actual <= threshold,
                    FilterCondition::Lt { .. } => actual < threshold,
                    FilterCondition::Eq { .. } => actual == threshold,
                    FilterCondition::Is { .. } => false,
                }
            }
        }
    }
}

impl fmt::Display for MustHaveFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.condition {
            FilterCondition::Is { value } => write!(f, "{} is {}", self.variable, value),
            condition => write!(
                f,
                "{} {} {}",
                self.variable,
                condition.operator(),
                condition.threshold().unwrap_or_default()
            ),
        }
    }
}

/// A comparable removed by the must-have filters, with the requirements it missed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExcludedProperty {
    pub address: String,
    pub unit: String,
    pub failed: Vec<MustHaveFilter>,
}

#[derive(Debug)]
pub struct FilterOutcome<'a> {
    /// Surviving candidates; the subject is always first.
    pub retained: Vec<&'a Candidate>,
    pub excluded: Vec<ExcludedProperty>,
    /// Requirements the subject itself misses, signalling an infeasible brief.
    pub subject_failures: Vec<MustHaveFilter>,
}

impl FilterOutcome<'_> {
    pub fn comparable_count(&self) -> usize {
        self.retained.iter().filter(|candidate| !candidate.is_subject()).count()
    }
}

fn failures(candidate: &Candidate, filters: &[MustHaveFilter]) -> Vec<MustHaveFilter> {
    filters
        .iter()
        .filter(|filter| !filter.admits(candidate))
        .cloned()
        .collect()
}

/// Keeps the candidates that satisfy every filter. The subject is the
/// reference point and is never removed, only flagged.
pub fn apply<'a>(candidates: &'a [Candidate], filters: &[MustHaveFilter]) -> FilterOutcome<'a> {
    let mut outcome = FilterOutcome {
        retained: Vec::with_capacity(candidates.len()),
        excluded: Vec::new(),
        subject_failures: Vec::new(),
    };

    for candidate in candidates {
        let failed = failures(candidate, filters);
        if candidate.is_subject() {
            if !failed.is_empty() {
                warn!(
                    property = %candidate.property.label(),
                    failed = failed.len(),
                    "subject fails its own must-have filters"
                );
            }
            outcome.subject_failures = failed;
            outcome.retained.insert(0, candidate);
        } else if failed.is_empty() {
            outcome.retained.push(candidate);
        } else {
            outcome.excluded.push(ExcludedProperty {
                address: candidate.property.address.clone(),
                unit: candidate.property.unit.clone(),
                failed,
            });
        }
    }

    outcome
}
