use super::common::*;

use crate::workflows::competitive::{
    AnalysisError, AnalysisStatus, CompetitiveTier, ConfigurationError, DataError,
    FilterCondition, MustHaveFilter, OptionalFeatures, PropertyWarning, VariableKey,
    VariableRank, WeightSelection,
};

#[test]
fn ranks_subject_against_market() {
    let report = engine().analyze(&request()).expect("analysis runs");

    assert_eq!(report.status, AnalysisStatus::Ranked);
    assert_eq!(report.persona, "custom");
    assert!((report.subject.weighted_score - 3.5).abs() < 1e-9);
    assert_eq!(report.subject.final_rank, Some(5));
    assert_eq!(report.subject.tier, Some(CompetitiveTier::Competitive));

    let order: Vec<&str> = report
        .properties
        .iter()
        .map(|result| result.property.address.as_str())
        .collect();
    assert_eq!(
        order,
        vec![
            "1 Harbour Rd",
            "2 Harbour Rd",
            "3 Harbour Rd",
            "4 Harbour Rd",
            "100 Subject Way",
            "5 Harbour Rd",
        ]
    );

    let first = report.property("1 Harbour Rd").expect("first comparable");
    assert!((first.weighted_score - 1.15).abs() < 1e-9);
    assert_eq!(first.area_difference, Some(1_000.0));
}

#[test]
fn adjusted_weights_conserve_mass_and_ratios() {
    let request = request();
    let report = engine().analyze(&request).expect("analysis runs");

    assert!((report.weights.total() - 1.0).abs() < 1e-6);
    let rent = report.weight(VariableKey::NetRent);
    let tmi = report.weight(VariableKey::Tmi);
    assert!((rent / tmi - 5.0).abs() < 1e-6);
    assert!(report.availability_degenerate);
}

#[test]
fn persona_weights_rescale_onto_available_variables() {
    let mut request = request();
    request.weights = Some(WeightSelection::Persona("distribution".to_string()));
    request.comparables = request
        .comparables
        .into_iter()
        .map(|property| {
            with_features(
                property,
                OptionalFeatures {
                    truck_level_doors: Some(4),
                    ..OptionalFeatures::default()
                },
            )
        })
        .collect();

    let report = engine().analyze(&request).expect("analysis runs");
    let profile = engine()
        .personas()
        .load("distribution")
        .expect("distribution persona")
        .clone();

    assert!(!report.availability_degenerate);
    assert!(report.weights.contains(VariableKey::TruckLevelDoors));
    assert!(!report.weights.contains(VariableKey::PowerAmps));
    assert!((report.weights.total() - 1.0).abs() < 1e-6);
    let expected = profile.weight(VariableKey::TruckLevelDoors) / profile.weight(VariableKey::NetRent);
    let actual = report.weight(VariableKey::TruckLevelDoors) / report.weight(VariableKey::NetRent);
    assert!((expected - actual).abs() < 1e-6);
}

#[test]
fn rent_ranks_use_competition_ties() {
    let mut request = request();
    request.subject_property.net_rent = Some(8.50);
    let rents = [10.00, 12.00, 10.00, 15.00];
    request.comparables.truncate(rents.len());
    for (property, rent) in request.comparables.iter_mut().zip(rents) {
        property.net_rent = Some(rent);
    }

    let report = engine().analyze(&request).expect("analysis runs");

    let rent_ranks: Vec<VariableRank> = ["100 Subject Way", "1 Harbour Rd", "2 Harbour Rd", "3 Harbour Rd", "4 Harbour Rd"]
        .into_iter()
        .map(|address| {
            report.property(address).expect("property in report").variable_ranks[&VariableKey::NetRent]
        })
        .collect();
    assert_eq!(
        rent_ranks,
        vec![
            VariableRank::Ranked(1),
            VariableRank::Ranked(2),
            VariableRank::Ranked(4),
            VariableRank::Ranked(2),
            VariableRank::Ranked(5),
        ]
    );
}

#[test]
fn identical_properties_share_final_rank() {
    let mut request = request();
    request.comparables = (1..=4)
        .map(|index| property(&format!("{index} Twin Ct"), 10.0, 2.0, 48_000.0))
        .collect();

    let report = engine().analyze(&request).expect("analysis runs");

    let comparables: Vec<_> = report
        .properties
        .iter()
        .filter(|result| !result.is_subject())
        .collect();
    assert!(comparables
        .iter()
        .all(|result| result.weighted_score == comparables[0].weighted_score));
    assert!(comparables.iter().all(|result| result.final_rank == Some(1)));
    assert_eq!(report.subject.final_rank, Some(5));
}

#[test]
fn universally_false_flags_never_score() {
    let mut request = request();
    let no_rail = OptionalFeatures {
        rail_access: Some(false),
        ..OptionalFeatures::default()
    };
    request.subject_property = with_features(request.subject_property, no_rail.clone());
    request.comparables = request
        .comparables
        .into_iter()
        .map(|property| with_features(property, no_rail.clone()))
        .collect();
    request.weights = Some(WeightSelection::Persona("manufacturing".to_string()));

    let report = engine().analyze(&request).expect("analysis runs");

    assert!(!report.availability.is_available(VariableKey::RailAccess));
    assert!(!report.weights.contains(VariableKey::RailAccess));
    assert!(report
        .properties
        .iter()
        .all(|result| !result.variable_ranks.contains_key(&VariableKey::RailAccess)));
}

#[test]
fn runs_are_byte_identical() {
    let mut request = request();
    request.target_rank = Some(2);

    let first = serde_json::to_vec(&engine().analyze(&request).expect("first run")).expect("json");
    let second = serde_json::to_vec(&engine().analyze(&request).expect("second run")).expect("json");

    assert_eq!(first, second);
}

#[test]
fn filters_remove_comparables_before_ranking() {
    let mut request = request();
    request.must_have_filters = vec![MustHaveFilter::new(
        VariableKey::DistanceKm,
        FilterCondition::Lte { threshold: 3.0 },
    )];

    let report = engine().analyze(&request).expect("analysis runs");

    assert_eq!(report.excluded.len(), 2);
    assert_eq!(report.properties.len(), 4);
    assert!(report.subject.filter_failures.is_empty());
    let worst_distance = report
        .properties
        .iter()
        .filter_map(|result| result.variable_ranks[&VariableKey::DistanceKm].value())
        .max();
    assert_eq!(worst_distance, Some(4));
}

#[test]
fn subject_failing_its_own_filter_is_flagged() {
    let mut request = request();
    request.must_have_filters = vec![MustHaveFilter::new(
        VariableKey::NetRent,
        FilterCondition::Lt { threshold: 11.75 },
    )];

    let report = engine().analyze(&request).expect("analysis runs");

    assert_eq!(report.subject.filter_failures, request.must_have_filters);
    assert!(report.subject_result().is_some());
    assert_eq!(report.excluded.len(), 0);
}

#[test]
fn empty_filtered_set_reports_no_competitive_comparables() {
    let mut request = request();
    request.must_have_filters = vec![MustHaveFilter::new(
        VariableKey::Crane,
        FilterCondition::Is { value: true },
    )];

    let report = engine().analyze(&request).expect("analysis runs");

    assert_eq!(report.status, AnalysisStatus::NoCompetitiveComparables);
    assert_eq!(report.properties.len(), 1);
    assert_eq!(report.subject.final_rank, None);
    assert_eq!(report.subject.tier, None);
    assert_eq!(report.excluded.len(), 5);
}

#[test]
fn missing_core_value_takes_worst_rank_with_warning() {
    let mut request = request();
    request.comparables[0].net_rent = None;

    let report = engine().analyze(&request).expect("analysis runs");

    let degraded = report.property("1 Harbour Rd").expect("property kept");
    assert_eq!(
        degraded.variable_ranks[&VariableKey::NetRent],
        VariableRank::Penalized(6)
    );
    assert!(degraded
        .warnings
        .contains(&PropertyWarning::MissingCoreValue(VariableKey::NetRent)));
    assert_eq!(report.properties.len(), 6);
}

#[test]
fn invalid_weights_abort_before_ranking() {
    let mut request = request();
    request.weights = Some(WeightSelection::Weights(
        [(VariableKey::NetRent, 0.7), (VariableKey::Tmi, 0.7)]
            .into_iter()
            .collect(),
    ));

    let result = engine().analyze(&request);

    assert!(matches!(
        result,
        Err(AnalysisError::Configuration(ConfigurationError::InvalidProfile { .. }))
    ));
}

#[test]
fn unknown_persona_is_a_configuration_error() {
    let mut request = request();
    request.weights = Some(WeightSelection::Persona("retail".to_string()));

    assert!(matches!(
        engine().analyze(&request),
        Err(AnalysisError::Configuration(ConfigurationError::UnknownPersona(_)))
    ));
}

#[test]
fn omitted_weights_use_default_persona() {
    let mut request = request();
    request.weights = None;

    let report = engine().analyze(&request).expect("analysis runs");

    assert_eq!(report.persona, "balanced");
}

#[test]
fn malformed_subject_is_a_data_error() {
    let mut request = request();
    request.comparables[2].is_subject = true;

    assert!(matches!(
        engine().analyze(&request),
        Err(AnalysisError::Data(DataError::MultipleSubjects { count: 2 }))
    ));

    let mut request = super::common::request();
    request.subject_property.distance_km = Some(0.4);
    assert!(matches!(
        engine().analyze(&request),
        Err(AnalysisError::Data(DataError::SubjectDistance { .. }))
    ));
}

#[test]
fn type_mismatched_filter_is_rejected() {
    let mut request = request();
    request.must_have_filters = vec![MustHaveFilter::new(
        VariableKey::ClearHeightFt,
        FilterCondition::Is { value: true },
    )];

    assert!(matches!(
        engine().analyze(&request),
        Err(AnalysisError::Configuration(ConfigurationError::FilterTypeMismatch { .. }))
    ));
}
