use std::collections::BTreeMap;

use serde::Serialize;

use super::dataset::Candidate;
use super::variables::{RawValue, VariableKey, VariableKind};

/// Which variables carry enough data to be ranked in this dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Availability {
    variables: BTreeMap<VariableKey, bool>,
}

impl Availability {
    pub fn is_available(&self, key: VariableKey) -> bool {
        self.variables.get(&key).copied().unwrap_or(false)
    }

    pub fn available(&self) -> impl Iterator<Item = VariableKey> + '_ {
        self.variables
            .iter()
            .filter(|(_, available)| **available)
            .map(|(key, _)| *key)
    }

    /// True when every optional variable dropped out and ranking runs on core only.
    pub fn is_degenerate(&self) -> bool {
        self.variables
            .iter()
            .filter(|(key, _)| !key.is_core())
            .all(|(_, available)| !available)
    }

    pub fn as_map(&self) -> &BTreeMap<VariableKey, bool> {
        &self.variables
    }
}

/// Decides availability over the full candidate set.
///
/// Core variables are always available. A numeric or ordinal optional variable
/// needs real values on at least `threshold` of the candidates; a boolean one
/// needs at least one `true`, since a universally false flag cannot
/// discriminate between properties.
pub fn detect(candidates: &[Candidate], optional: &[VariableKey], threshold: f64) -> Availability {
    let mut variables: BTreeMap<VariableKey, bool> =
        VariableKey::CORE.into_iter().map(|key| (key, true)).collect();

    let total = candidates.len();
    for &key in optional {
        if key.is_core() {
            continue;
        }

        let available = match key.kind() {
            VariableKind::Boolean => candidates
                .iter()
                .any(|candidate| candidate.value(key) == Some(RawValue::Flag(true))),
            VariableKind::Numeric(_) | VariableKind::Ordinal => {
                let present = candidates
                    .iter()
                    .filter(|candidate| candidate.value(key).is_some())
                    .count();
                total > 0 && present as f64 >= threshold * total as f64
            }
        };

        variables.insert(key, available);
    }

    Availability { variables }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::competitive::dataset::Dataset;
    use crate::workflows::competitive::domain::{OptionalFeatures, Property};

    fn property(address: &str, features: OptionalFeatures) -> Property {
        Property {
            address: address.to_string(),
            distance_km: Some(1.0),
            features,
            ..Property::default()
        }
    }

    fn dataset(features: Vec<OptionalFeatures>) -> Dataset {
        let mut properties = features
            .into_iter()
            .enumerate()
            .map(|(index, features)| property(&format!("{index} Main St"), features));
        let mut subject = properties.next().expect("at least one property");
        subject.is_subject = true;
        subject.distance_km = Some(0.0);
        Dataset::load(subject, properties.collect()).expect("dataset loads")
    }

    #[test]
    fn numeric_needs_half_coverage() {
        let with_bay = || OptionalFeatures {
            bay_depth_ft: Some(50.0),
            ..OptionalFeatures::default()
        };
        let covered = dataset(vec![with_bay(), with_bay(), OptionalFeatures::default(), OptionalFeatures::default()]);
        let sparse = dataset(vec![with_bay(), OptionalFeatures::default(), OptionalFeatures::default()]);

        let optional = [VariableKey::BayDepthFt];
        assert!(detect(covered.candidates(), &optional, 0.5).is_available(VariableKey::BayDepthFt));
        assert!(!detect(sparse.candidates(), &optional, 0.5).is_available(VariableKey::BayDepthFt));
    }

    #[test]
    fn placeholder_zeros_do_not_count_as_coverage() {
        let zero_power = || OptionalFeatures {
            power_amps: Some(0.0),
            ..OptionalFeatures::default()
        };
        let data = dataset(vec![zero_power(), zero_power(), zero_power()]);

        let availability = detect(data.candidates(), &[VariableKey::PowerAmps], 0.5);

        assert!(!availability.is_available(VariableKey::PowerAmps));
    }

    #[test]
    fn boolean_needs_one_true() {
        let rail = |flag| OptionalFeatures {
            rail_access: Some(flag),
            ..OptionalFeatures::default()
        };
        let none_true = dataset(vec![rail(false), rail(false), rail(false)]);
        let one_true = dataset(vec![rail(false), rail(true), OptionalFeatures::default()]);

        let optional = [VariableKey::RailAccess];
        assert!(!detect(none_true.candidates(), &optional, 0.5).is_available(VariableKey::RailAccess));
        assert!(detect(one_true.candidates(), &optional, 0.5).is_available(VariableKey::RailAccess));
    }

    #[test]
    fn core_variables_are_always_available() {
        let data = dataset(vec![OptionalFeatures::default(), OptionalFeatures::default()]);

        let availability = detect(data.candidates(), &VariableKey::OPTIONAL, 0.5);

        assert!(VariableKey::CORE
            .iter()
            .all(|key| availability.is_available(*key)));
        assert!(availability.is_degenerate());
        assert_eq!(availability.available().count(), VariableKey::CORE.len());
    }
}
