use std::borrow::Cow;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::allocation::allocate;
use super::availability::detect;
use super::config::{AnalysisConfig, ConfigurationError};
use super::dataset::{DataError, Dataset};
use super::domain::Property;
use super::filters::{self, MustHaveFilter};
use super::personas::{PersonaStore, WeightProfile};
use super::ranking::rank_all;
use super::report::{
    AnalysisReport, AnalysisStatus, CompetitiveTier, PropertyResult, SubjectSummary,
};
use super::scoring::score_all;
use super::sensitivity;
use super::variables::VariableKey;

/// One analysis request: the subject, its comparables and how to weigh them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub subject_property: Property,
    #[serde(default)]
    pub comparables: Vec<Property>,
    /// Omitted weights fall back to the engine's default persona.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weights: Option<WeightSelection>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub must_have_filters: Vec<MustHaveFilter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_rank: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WeightSelection {
    /// A persona name looked up in the store.
    Persona(String),
    Profile(WeightProfile),
    /// A bare `variable -> weight` map.
    Weights(BTreeMap<VariableKey, f64>),
}

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Data(#[from] DataError),
}

/// Runs the full ranking pipeline against an injected persona store.
#[derive(Debug, Clone)]
pub struct AnalysisEngine {
    personas: PersonaStore,
    config: AnalysisConfig,
}

impl Default for AnalysisEngine {
    fn default() -> Self {
        Self {
            personas: PersonaStore::builtin(),
            config: AnalysisConfig::default(),
        }
    }
}

impl AnalysisEngine {
    pub fn new(personas: PersonaStore, config: AnalysisConfig) -> Result<Self, ConfigurationError> {
        config.validate()?;
        personas.load(&config.default_persona)?;
        Ok(Self { personas, config })
    }

    pub fn personas(&self) -> &PersonaStore {
        &self.personas
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Resolves the request's weight selection into a validated profile.
    pub fn resolve_weights<'a>(
        &'a self,
        selection: Option<&'a WeightSelection>,
    ) -> Result<Cow<'a, WeightProfile>, ConfigurationError> {
        let profile = match selection {
            None => Cow::Borrowed(self.personas.load(&self.config.default_persona)?),
            Some(WeightSelection::Persona(name)) => Cow::Borrowed(self.personas.load(name)?),
            Some(WeightSelection::Profile(profile)) => {
                let mut profile = profile.clone();
                if profile.name.trim().is_empty() {
                    profile.name = "custom".to_string();
                }
                Cow::Owned(profile)
            }
            Some(WeightSelection::Weights(weights)) => Cow::Owned(WeightProfile::new(
                "custom",
                weights.iter().map(|(key, weight)| (*key, *weight)),
            )),
        };

        profile
            .validate(self.config.weight_tolerance)
            .map_err(|violation| ConfigurationError::InvalidProfile {
                profile: profile.name.clone(),
                violation,
            })?;

        Ok(profile)
    }

    pub fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisReport, AnalysisError> {
        let profile = self.resolve_weights(request.weights.as_ref())?;
        for filter in &request.must_have_filters {
            filter.validate()?;
        }

        let dataset = Dataset::load(
            request.subject_property.clone(),
            request.comparables.clone(),
        )?;
        info!(
            persona = %profile.name,
            comparables = dataset.comparables().len(),
            filters = request.must_have_filters.len(),
            "running competitive analysis"
        );

        let availability = detect(
            dataset.candidates(),
            &VariableKey::OPTIONAL,
            self.config.availability_threshold,
        );
        let availability_degenerate = availability.is_degenerate();
        if availability_degenerate {
            info!("no optional variable has enough coverage; ranking on core variables only");
        }

        let weights = allocate(&profile, &availability)?;
        debug!(variables = weights.as_map().len(), "weights allocated");

        let outcome = filters::apply(dataset.candidates(), &request.must_have_filters);
        let has_comparables = outcome.comparable_count() > 0;
        let status = if has_comparables {
            AnalysisStatus::Ranked
        } else {
            info!(
                excluded = outcome.excluded.len(),
                "no competitive comparables remain after filtering"
            );
            AnalysisStatus::NoCompetitiveComparables
        };

        let table = rank_all(&weights, &outcome.retained);
        let scored = score_all(&weights, &table);
        debug!(rows = scored.len(), "properties scored");

        let sensitivity = request
            .target_rank
            .and_then(|target| sensitivity::solve(target, &outcome.retained, &scored, &weights));

        let mut properties: Vec<PropertyResult> = scored
            .iter()
            .zip(&outcome.retained)
            .map(|(scored, candidate)| {
                let final_rank = has_comparables.then_some(scored.final_rank);
                PropertyResult {
                    property: candidate.property.clone(),
                    area_difference: candidate.area_difference,
                    variable_ranks: scored.ranks.clone(),
                    weighted_score: scored.score,
                    final_rank,
                    tier: final_rank.map(CompetitiveTier::from_rank),
                    warnings: candidate.warnings.clone(),
                }
            })
            .collect();

        let subject = match properties.first() {
            Some(result) => SubjectSummary {
                address: result.property.label(),
                weighted_score: result.weighted_score,
                final_rank: result.final_rank,
                tier: result.tier,
                tied_with: properties
                    .iter()
                    .skip(1)
                    .filter(|other| other.final_rank.is_some() && other.final_rank == result.final_rank)
                    .map(|other| other.property.label())
                    .collect(),
                filter_failures: outcome.subject_failures.clone(),
            },
            None => return Err(DataError::MissingSubject.into()),
        };

        properties.sort_by_key(|result| result.final_rank);

        info!(
            subject_rank = ?subject.final_rank,
            subject_score = subject.weighted_score,
            "competitive analysis complete"
        );

        Ok(AnalysisReport {
            persona: profile.name.clone(),
            status,
            availability,
            availability_degenerate,
            weights,
            filters: request.must_have_filters.clone(),
            excluded: outcome.excluded,
            subject,
            properties,
            sensitivity,
        })
    }
}
