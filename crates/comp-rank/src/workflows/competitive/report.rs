use std::collections::BTreeMap;

use serde::Serialize;

use super::allocation::AdjustedWeights;
use super::availability::Availability;
use super::dataset::PropertyWarning;
use super::domain::Property;
use super::filters::{ExcludedProperty, MustHaveFilter};
use super::ranking::VariableRank;
use super::sensitivity::SensitivityReport;
use super::variables::VariableKey;

/// Fixed bands over the final rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CompetitiveTier {
    /// Ranks 1 to 3.
    Leading,
    /// Ranks 4 to 10.
    Competitive,
    /// Rank 11 and beyond.
    Trailing,
}

impl CompetitiveTier {
    pub const fn from_rank(rank: u32) -> Self {
        match rank {
            0..=3 => CompetitiveTier::Leading,
            4..=10 => CompetitiveTier::Competitive,
            _ => CompetitiveTier::Trailing,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            CompetitiveTier::Leading => "leading",
            CompetitiveTier::Competitive => "competitive",
            CompetitiveTier::Trailing => "trailing",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStatus {
    Ranked,
    /// Must-have filters removed every comparable; the subject rank is undefined.
    NoCompetitiveComparables,
}

/// Output row for one property: attribute echo, per-variable ranks and standing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyResult {
    #[serde(flatten)]
    pub property: Property,
    pub area_difference: Option<f64>,
    pub variable_ranks: BTreeMap<VariableKey, VariableRank>,
    pub weighted_score: f64,
    pub final_rank: Option<u32>,
    pub tier: Option<CompetitiveTier>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<PropertyWarning>,
}

impl PropertyResult {
    pub fn is_subject(&self) -> bool {
        self.property.is_subject
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubjectSummary {
    pub address: String,
    pub weighted_score: f64,
    pub final_rank: Option<u32>,
    pub tier: Option<CompetitiveTier>,
    /// Comparables sharing the subject's final rank.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tied_with: Vec<String>,
    /// Must-have filters the subject itself fails.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub filter_failures: Vec<MustHaveFilter>,
}

/// The full output record of one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub persona: String,
    pub status: AnalysisStatus,
    pub availability: Availability,
    pub availability_degenerate: bool,
    pub weights: AdjustedWeights,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<MustHaveFilter>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub excluded: Vec<ExcludedProperty>,
    pub subject: SubjectSummary,
    /// Retained properties ordered by final rank, then input order.
    pub properties: Vec<PropertyResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sensitivity: Option<SensitivityReport>,
}

impl AnalysisReport {
    pub fn subject_result(&self) -> Option<&PropertyResult> {
        self.properties.iter().find(|result| result.is_subject())
    }

    pub fn property(&self, address: &str) -> Option<&PropertyResult> {
        self.properties
            .iter()
            .find(|result| result.property.address == address)
    }

    /// Adjusted weight of every ranked variable. Dropped variables are absent.
    pub fn weight(&self, key: VariableKey) -> f64 {
        self.weights.weight(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiers_follow_fixed_rank_bands() {
        let tiers: Vec<&str> = [1, 3, 4, 10, 11, 40]
            .into_iter()
            .map(|rank| CompetitiveTier::from_rank(rank).label())
            .collect();
        assert_eq!(
            tiers,
            vec!["leading", "leading", "competitive", "competitive", "trailing", "trailing"]
        );
    }

    #[test]
    fn property_result_echoes_attributes_inline() {
        let result = PropertyResult {
            property: Property {
                address: "12 Dock Rd".to_string(),
                net_rent: Some(9.25),
                ..Property::default()
            },
            area_difference: Some(1_500.0),
            variable_ranks: BTreeMap::from([
                (VariableKey::NetRent, VariableRank::Ranked(2)),
                (VariableKey::PowerAmps, VariableRank::Excluded),
            ]),
            weighted_score: 3.4,
            final_rank: Some(2),
            tier: Some(CompetitiveTier::Leading),
            warnings: Vec::new(),
        };

        let json = serde_json::to_value(&result).expect("result serializes");

        assert_eq!(json["address"], "12 Dock Rd");
        assert_eq!(json["net_rent"], 9.25);
        assert_eq!(json["variable_ranks"]["net_rent"], 2);
        assert_eq!(json["variable_ranks"]["power_amps"], "excluded");
        assert_eq!(json["tier"], "leading");
        assert!(json.get("warnings").is_none());
    }
}
