use std::sync::Arc;

use axum::response::Response;
use serde_json::Value;

use crate::workflows::competitive::{
    analysis_router, AnalysisEngine, AnalysisRequest, BuildingClass, OptionalFeatures, Property,
    VariableKey, WeightSelection,
};

/// Rent-heavy weights over the core variables only.
pub(super) fn rent_heavy_weights() -> WeightSelection {
    WeightSelection::Weights(
        [
            (VariableKey::BuildingAge, 0.05),
            (VariableKey::ClearHeightFt, 0.05),
            (VariableKey::OfficePct, 0.05),
            (VariableKey::ParkingRatio, 0.05),
            (VariableKey::DistanceKm, 0.05),
            (VariableKey::NetRent, 0.5),
            (VariableKey::Tmi, 0.1),
            (VariableKey::BuildingClass, 0.05),
            (VariableKey::AreaDifference, 0.1),
        ]
        .into_iter()
        .collect(),
    )
}

pub(super) fn property(address: &str, net_rent: f64, distance_km: f64, area_sqft: f64) -> Property {
    Property {
        address: address.to_string(),
        area_sqft: Some(area_sqft),
        building_age: Some(12),
        clear_height_ft: Some(32.0),
        office_pct: Some(0.08),
        parking_ratio: Some(1.2),
        distance_km: Some(distance_km),
        net_rent: Some(net_rent),
        tmi: Some(3.0),
        building_class: Some(BuildingClass::B),
        ..Property::default()
    }
}

pub(super) fn subject() -> Property {
    Property {
        is_subject: true,
        ..property("100 Subject Way", 12.0, 0.0, 50_000.0)
    }
}

/// Five comparables, each one step further and one step bigger than the last,
/// all cheaper than the subject.
///
/// Scores under [`rent_heavy_weights`]: comparables `0.5 + 0.65 * i` for
/// `i = 1..=5`, subject `3.5`, so the subject ranks 5th.
pub(super) fn market() -> Vec<Property> {
    vec![
        property("1 Harbour Rd", 8.0, 1.0, 51_000.0),
        property("2 Harbour Rd", 9.0, 2.0, 52_000.0),
        property("3 Harbour Rd", 10.0, 3.0, 53_000.0),
        property("4 Harbour Rd", 11.0, 4.0, 54_000.0),
        property("5 Harbour Rd", 11.5, 5.0, 55_000.0),
    ]
}

pub(super) fn request() -> AnalysisRequest {
    AnalysisRequest {
        subject_property: subject(),
        comparables: market(),
        weights: Some(rent_heavy_weights()),
        must_have_filters: Vec::new(),
        target_rank: None,
    }
}

pub(super) fn with_features(mut property: Property, features: OptionalFeatures) -> Property {
    property.features = features;
    property
}

pub(super) fn engine() -> AnalysisEngine {
    AnalysisEngine::default()
}

pub(super) fn router() -> axum::Router {
    analysis_router(Arc::new(engine()))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json body")
}
