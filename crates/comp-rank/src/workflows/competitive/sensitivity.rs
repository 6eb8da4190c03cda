//! Inverse scoring: how far must the subject's price terms move for it to
//! reach a target competitor's score.

use std::fmt;

use serde::{Serialize, Serializer};

use super::allocation::AdjustedWeights;
use super::dataset::Candidate;
use super::ranking::VariableRank;
use super::scoring::ScoredProperty;
use super::variables::{Direction, VariableKey};

/// Absorbs rounding in `rank - gap / weight` when the result should be exactly 1.
const RANK_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensitivityReport {
    pub target_rank: u32,
    #[serde(flatten)]
    pub status: SensitivityStatus,
    pub subject_score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gap: Option<f64>,
    pub adjustments: Vec<VariableSolution>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub split: Option<SplitScenario>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SensitivityStatus {
    /// The subject already scores at or below the target.
    AlreadyMeetsTarget,
    AdjustmentRequired,
    /// The target rank does not name a ranked comparable.
    TargetOutOfRange { comparables: usize },
}

/// Outcome of solving one price variable on its own.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum VariableSolution {
    Feasible(PriceAdjustment),
    Infeasible {
        variable: VariableKey,
        reason: Infeasibility,
    },
}

impl VariableSolution {
    pub fn variable(&self) -> VariableKey {
        match self {
            VariableSolution::Feasible(adjustment) => adjustment.variable,
            VariableSolution::Infeasible { variable, .. } => *variable,
        }
    }

    pub fn adjustment(&self) -> Option<&PriceAdjustment> {
        match self {
            VariableSolution::Feasible(adjustment) => Some(adjustment),
            VariableSolution::Infeasible { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceAdjustment {
    pub variable: VariableKey,
    pub weight: f64,
    pub current_value: f64,
    pub current_rank: u32,
    /// `rank - gap / weight`, before flooring to a reachable rank.
    pub target_rank_exact: f64,
    pub required_rank: u32,
    /// Competitor value at `required_rank`; matching it guarantees the rank.
    pub required_value: f64,
    /// Linear interpolation at `target_rank_exact`, for reference only.
    pub interpolated_value: f64,
    /// Change to apply, positive meaning "reduce" for ascending variables.
    pub adjustment: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Infeasibility {
    /// The variable was dropped by availability or carries no weight.
    VariableUnavailable,
    /// The subject has no value to move.
    SubjectValueMissing,
    /// Even rank 1 on this variable does not close the gap.
    InsufficientWeight { max_reduction: f64, gap: f64 },
}

impl fmt::Display for Infeasibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Infeasibility::VariableUnavailable => {
                f.write_str("variable is not ranked in this dataset")
            }
            Infeasibility::SubjectValueMissing => f.write_str("subject has no value to adjust"),
            Infeasibility::InsufficientWeight { .. } => f.write_str(
                "single-variable adjustment insufficient; structural change or multi-variable reduction required",
            ),
        }
    }
}

impl Serialize for Infeasibility {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;

        let (kind, amounts) = match self {
            Infeasibility::VariableUnavailable => ("variable_unavailable", None),
            Infeasibility::SubjectValueMissing => ("subject_value_missing", None),
            Infeasibility::InsufficientWeight { max_reduction, gap } => {
                ("insufficient_weight", Some((*max_reduction, *gap)))
            }
        };

        let mut state = serializer.serialize_struct("Infeasibility", 4)?;
        state.serialize_field("kind", kind)?;
        state.serialize_field("message", &self.to_string())?;
        if let Some((max_reduction, gap)) = amounts {
            state.serialize_field("max_score_reduction", &max_reduction)?;
            state.serialize_field("gap", &gap)?;
        }
        state.end()
    }
}

/// The gap shared across both price variables in proportion to their weights.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SplitScenario {
    Feasible {
        rank_reduction: f64,
        adjustments: Vec<PriceAdjustment>,
    },
    Infeasible {
        message: String,
    },
}

/// Inputs for moving one variable: the subject's standing plus the values
/// of competitors strictly better than it, best first.
#[derive(Debug, Clone)]
struct PriceTerm {
    variable: VariableKey,
    weight: f64,
    current_value: f64,
    current_rank: u32,
    direction: Direction,
    better_values: Vec<f64>,
}

impl PriceTerm {
    fn resolve(
        variable: VariableKey,
        candidates: &[&Candidate],
        subject: &ScoredProperty,
        weights: &AdjustedWeights,
    ) -> Result<Self, Infeasibility> {
        let weight = weights
            .get(variable)
            .filter(|weight| *weight > 0.0)
            .ok_or(Infeasibility::VariableUnavailable)?;

        let current_rank = match subject.ranks.get(&variable) {
            Some(VariableRank::Ranked(rank)) => *rank,
            _ => return Err(Infeasibility::SubjectValueMissing),
        };
        let current_value = candidates
            .first()
            .and_then(|candidate| candidate.value(variable))
            .and_then(|value| value.as_number())
            .ok_or(Infeasibility::SubjectValueMissing)?;

        let direction = variable.kind().direction();
        let mut better_values: Vec<f64> = candidates
            .iter()
            .skip(1)
            .filter_map(|candidate| candidate.value(variable).and_then(|value| value.as_number()))
            .filter(|value| match direction {
                Direction::Ascending => *value < current_value,
                Direction::Descending => *value > current_value,
            })
            .collect();
        better_values.sort_by(|left, right| match direction {
            Direction::Ascending => left.total_cmp(right),
            Direction::Descending => right.total_cmp(left),
        });

        Ok(Self {
            variable,
            weight,
            current_value,
            current_rank,
            direction,
            better_values,
        })
    }

    /// Solves `r* = rank - gap / weight` and maps `r*` back to a value.
    fn solve(&self, gap: f64) -> Result<PriceAdjustment, Infeasibility> {
        let exact = f64::from(self.current_rank) - gap / self.weight;
        if exact < 1.0 - RANK_EPSILON {
            return Err(Infeasibility::InsufficientWeight {
                max_reduction: f64::from(self.current_rank.saturating_sub(1)) * self.weight,
                gap,
            });
        }

        let required_rank = (exact.floor().max(1.0) as u32).min(self.current_rank);
        let ladder_value = |rank: u32| -> f64 {
            self.better_values
                .get(rank as usize - 1)
                .copied()
                .unwrap_or(self.current_value)
        };

        let required_value = ladder_value(required_rank);
        let interpolated_value = if required_rank < self.current_rank {
            let lower = ladder_value(required_rank);
            let upper = ladder_value(required_rank + 1);
            let fraction = (exact - f64::from(required_rank)).clamp(0.0, 1.0);
            lower + fraction * (upper - lower)
        } else {
            required_value
        };

        let adjustment = match self.direction {
            Direction::Ascending => self.current_value - required_value,
            Direction::Descending => required_value - self.current_value,
        };

        Ok(PriceAdjustment {
            variable: self.variable,
            weight: self.weight,
            current_value: self.current_value,
            current_rank: self.current_rank,
            target_rank_exact: exact,
            required_rank,
            required_value,
            interpolated_value,
            adjustment,
        })
    }
}

/// Runs the solver for the subject (row 0 of `candidates` and `scored`).
pub fn solve(
    target_rank: u32,
    candidates: &[&Candidate],
    scored: &[ScoredProperty],
    weights: &AdjustedWeights,
) -> Option<SensitivityReport> {
    let subject = scored.first()?;

    let mut competitor_scores: Vec<f64> = scored.iter().skip(1).map(|s| s.score).collect();
    competitor_scores.sort_by(f64::total_cmp);

    let mut report = SensitivityReport {
        target_rank,
        status: SensitivityStatus::AdjustmentRequired,
        subject_score: subject.score,
        target_score: None,
        gap: None,
        adjustments: Vec::new(),
        split: None,
    };

    let target_score = match (target_rank as usize)
        .checked_sub(1)
        .and_then(|index| competitor_scores.get(index))
    {
        Some(score) => *score,
        None => {
            report.status = SensitivityStatus::TargetOutOfRange {
                comparables: competitor_scores.len(),
            };
            return Some(report);
        }
    };

    let gap = subject.score - target_score;
    report.target_score = Some(target_score);
    report.gap = Some(gap);
    if gap <= 0.0 {
        report.status = SensitivityStatus::AlreadyMeetsTarget;
        return Some(report);
    }

    let terms: Vec<Result<PriceTerm, Infeasibility>> = VariableKey::PRICE
        .into_iter()
        .map(|variable| PriceTerm::resolve(variable, candidates, subject, weights))
        .collect();

    report.adjustments = VariableKey::PRICE
        .into_iter()
        .zip(&terms)
        .map(|(variable, term)| {
            match term.as_ref().map_err(|reason| *reason).and_then(|term| term.solve(gap)) {
                Ok(adjustment) => VariableSolution::Feasible(adjustment),
                Err(reason) => VariableSolution::Infeasible { variable, reason },
            }
        })
        .collect();

    report.split = Some(split(&terms, gap));
    Some(report)
}

fn split(terms: &[Result<PriceTerm, Infeasibility>], gap: f64) -> SplitScenario {
    let ready: Vec<&PriceTerm> = terms.iter().filter_map(|term| term.as_ref().ok()).collect();
    if ready.len() < 2 {
        return SplitScenario::Infeasible {
            message: "split requires both price variables to be ranked for the subject"
                .to_string(),
        };
    }

    let combined: f64 = ready.iter().map(|term| term.weight).sum();
    let rank_reduction = gap / combined;

    let mut adjustments = Vec::with_capacity(ready.len());
    for term in ready {
        match term.solve(rank_reduction * term.weight) {
            Ok(adjustment) => adjustments.push(adjustment),
            Err(_) => {
                return SplitScenario::Infeasible {
                    message: format!(
                        "split needs {rank_reduction:.2} ranks on each price variable but {} is at rank {}",
                        term.variable, term.current_rank
                    ),
                }
            }
        }
    }

    SplitScenario::Feasible {
        rank_reduction,
        adjustments,
    }
}
