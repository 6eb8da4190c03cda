//! Competitive ranking of a subject property against its comparables.
//!
//! A run detects which optional variables carry enough data, rescales the
//! selected weight profile onto them, removes comparables failing the
//! must-have filters, competition-ranks every variable, sums the weighted
//! ranks into a score and optionally solves for the price change the subject
//! needs to reach a target rank.

pub mod allocation;
pub mod availability;
pub mod config;
pub mod dataset;
pub mod domain;
pub mod engine;
pub mod filters;
pub mod personas;
pub mod ranking;
pub mod report;
pub mod router;
pub mod scoring;
pub mod sensitivity;
pub mod variables;

#[cfg(test)]
mod tests;

pub use allocation::{allocate, AdjustedWeights};
pub use availability::{detect, Availability};
pub use config::{AnalysisConfig, ConfigurationError};
pub use dataset::{Candidate, DataError, Dataset, PropertyWarning};
pub use domain::{
    BuildingClass, BuildingCondition, HvacCoverage, OccupancyStatus, OptionalFeatures, Property,
    SprinklerSystem,
};
pub use engine::{AnalysisEngine, AnalysisError, AnalysisRequest, WeightSelection};
pub use filters::{ExcludedProperty, FilterCondition, FilterOutcome, MustHaveFilter};
pub use personas::{PersonaStore, ProfileViolation, WeightProfile};
pub use ranking::{competition_ranks, RankTable, VariableRank};
pub use report::{
    AnalysisReport, AnalysisStatus, CompetitiveTier, PropertyResult, SubjectSummary,
};
pub use router::analysis_router;
pub use scoring::ScoredProperty;
pub use sensitivity::{
    Infeasibility, PriceAdjustment, SensitivityReport, SensitivityStatus, SplitScenario,
    VariableSolution,
};
pub use variables::{Direction, RawValue, VariableKey, VariableKind};
