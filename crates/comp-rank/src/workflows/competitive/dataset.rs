use serde::Serialize;
use tracing::warn;

use super::domain::Property;
use super::variables::{PresenceRule, RawValue, VariableKey};

/// Input records that cannot form a dataset. Reported before ranking.
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("no property is flagged as the subject")]
    MissingSubject,
    #[error("{count} properties are flagged as the subject; exactly one is required")]
    MultipleSubjects { count: usize },
    #[error("subject distance must be 0 (found {distance})")]
    SubjectDistance { distance: f64 },
    #[error("distance for {property} must not be negative (found {distance})")]
    NegativeDistance { property: String, distance: f64 },
}

/// Degradations attached to a single property's result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "variable", rename_all = "snake_case")]
pub enum PropertyWarning {
    /// A core value is absent; the property takes the worst rank for it.
    MissingCoreValue(VariableKey),
    /// A supplied number was NaN or infinite and is treated as absent.
    NonFiniteValue(VariableKey),
}

/// A loaded property with its derived attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub property: Property,
    pub area_difference: Option<f64>,
    pub warnings: Vec<PropertyWarning>,
}

impl Candidate {
    fn new(property: Property, subject_area: Option<f64>) -> Self {
        let area_difference = match (property.area_sqft, subject_area) {
            (Some(area), Some(subject)) if area.is_finite() && subject.is_finite() => {
                Some((area - subject).abs())
            }
            _ => None,
        };

        let mut candidate = Self {
            property,
            area_difference,
            warnings: Vec::new(),
        };
        candidate.warnings = candidate.collect_warnings();
        candidate
    }

    pub fn is_subject(&self) -> bool {
        self.property.is_subject
    }

    /// The value that takes part in ranking, after presence rules are applied.
    pub fn value(&self, key: VariableKey) -> Option<RawValue> {
        let raw = match key {
            VariableKey::AreaDifference => self.area_difference.map(RawValue::Number),
            other => self.property.raw_value(other),
        }?;

        match raw {
            RawValue::Number(number) if !number.is_finite() => None,
            RawValue::Number(number)
                if number == 0.0 && key.spec().presence == PresenceRule::ZeroMeansAbsent =>
            {
                None
            }
            value => Some(value),
        }
    }

    fn collect_warnings(&self) -> Vec<PropertyWarning> {
        let mut warnings = Vec::new();
        for key in VariableKey::all() {
            if let Some(RawValue::Number(number)) = self.property.raw_value(key) {
                if !number.is_finite() {
                    warnings.push(PropertyWarning::NonFiniteValue(key));
                }
            }
        }

        for key in VariableKey::CORE {
            if self.value(key).is_none() {
                warn!(
                    property = %self.property.label(),
                    variable = %key,
                    "core value missing; property takes the worst rank for it"
                );
                warnings.push(PropertyWarning::MissingCoreValue(key));
            }
        }

        warnings
    }
}

/// The subject plus its comparables for one analysis run. The subject is
/// always the first candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    candidates: Vec<Candidate>,
}

impl Dataset {
    pub fn load(mut subject: Property, comparables: Vec<Property>) -> Result<Self, DataError> {
        let flagged = usize::from(subject.is_subject)
            + comparables
                .iter()
                .filter(|property| property.is_subject)
                .count();
        match flagged {
            0 => return Err(DataError::MissingSubject),
            1 if subject.is_subject => {}
            1 => return Err(DataError::MissingSubject),
            count => return Err(DataError::MultipleSubjects { count }),
        }

        match subject.distance_km {
            None => subject.distance_km = Some(0.0),
            Some(distance) if distance == 0.0 => {}
            Some(distance) => return Err(DataError::SubjectDistance { distance }),
        }

        for property in &comparables {
            if let Some(distance) = property.distance_km {
                if distance.is_finite() && distance < 0.0 {
                    return Err(DataError::NegativeDistance {
                        property: property.label(),
                        distance,
                    });
                }
            }
        }

        let subject_area = subject.area_sqft;
        let candidates = std::iter::once(subject)
            .chain(comparables)
            .map(|property| Candidate::new(property, subject_area))
            .collect();

        Ok(Self { candidates })
    }

    pub fn subject(&self) -> &Candidate {
        &self.candidates[0]
    }

    pub fn comparables(&self) -> &[Candidate] {
        &self.candidates[1..]
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::competitive::domain::OptionalFeatures;

    fn subject() -> Property {
        Property {
            address: "100 Subject Way".to_string(),
            is_subject: true,
            area_sqft: Some(50_000.0),
            net_rent: Some(9.5),
            ..Property::default()
        }
    }

    fn comparable(address: &str, area: f64) -> Property {
        Property {
            address: address.to_string(),
            area_sqft: Some(area),
            distance_km: Some(2.0),
            ..Property::default()
        }
    }

    #[test]
    fn derives_area_difference_against_subject() {
        let dataset = Dataset::load(
            subject(),
            vec![comparable("1 A St", 42_000.0), comparable("2 B St", 61_500.0)],
        )
        .expect("dataset loads");

        assert_eq!(dataset.subject().area_difference, Some(0.0));
        assert_eq!(dataset.comparables()[0].area_difference, Some(8_000.0));
        assert_eq!(dataset.comparables()[1].area_difference, Some(11_500.0));
    }

    #[test]
    fn subject_distance_defaults_to_zero() {
        let dataset = Dataset::load(subject(), Vec::new()).expect("dataset loads");
        assert_eq!(dataset.subject().property.distance_km, Some(0.0));
    }

    #[test]
    fn rejects_missing_and_duplicate_subjects() {
        let mut unflagged = subject();
        unflagged.is_subject = false;
        assert!(matches!(
            Dataset::load(unflagged, vec![comparable("1 A St", 1.0)]),
            Err(DataError::MissingSubject)
        ));

        let mut second = comparable("1 A St", 1.0);
        second.is_subject = true;
        assert!(matches!(
            Dataset::load(subject(), vec![second]),
            Err(DataError::MultipleSubjects { count: 2 })
        ));
    }

    #[test]
    fn rejects_non_zero_subject_distance() {
        let mut far = subject();
        far.distance_km = Some(1.2);
        assert!(matches!(
            Dataset::load(far, Vec::new()),
            Err(DataError::SubjectDistance { .. })
        ));
    }

    #[test]
    fn rejects_negative_comparable_distance() {
        let mut bad = comparable("1 A St", 1.0);
        bad.distance_km = Some(-0.5);
        assert!(matches!(
            Dataset::load(subject(), vec![bad]),
            Err(DataError::NegativeDistance { .. })
        ));
    }

    #[test]
    fn zero_placeholders_are_absent_only_where_declared() {
        let mut property = comparable("1 A St", 1.0);
        property.features = OptionalFeatures {
            power_amps: Some(0.0),
            truck_level_doors: Some(0),
            ..OptionalFeatures::default()
        };
        let dataset = Dataset::load(subject(), vec![property]).expect("dataset loads");
        let candidate = &dataset.comparables()[0];

        assert_eq!(candidate.value(VariableKey::PowerAmps), None);
        assert_eq!(
            candidate.value(VariableKey::TruckLevelDoors),
            Some(RawValue::Number(0.0))
        );
    }

    #[test]
    fn flags_missing_core_and_non_finite_values() {
        let mut property = comparable("1 A St", 1.0);
        property.net_rent = Some(f64::NAN);
        let dataset = Dataset::load(subject(), vec![property]).expect("dataset loads");
        let warnings = &dataset.comparables()[0].warnings;

        assert!(warnings.contains(&PropertyWarning::NonFiniteValue(VariableKey::NetRent)));
        assert!(warnings.contains(&PropertyWarning::MissingCoreValue(VariableKey::NetRent)));
        assert!(warnings.contains(&PropertyWarning::MissingCoreValue(VariableKey::Tmi)));
        assert!(!warnings.contains(&PropertyWarning::MissingCoreValue(VariableKey::DistanceKm)));
    }
}
