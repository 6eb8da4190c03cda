//! Competitive ranking of commercial real-estate comparables with dynamic
//! weighting, must-have filtering and price sensitivity analysis.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
