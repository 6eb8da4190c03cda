use crate::infra::{deserialize_optional_date, AppState};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::extract::State;
use axum::Extension;
use axum::Json;
use chrono::{Local, NaiveDate};
use comp_rank::error::AppError;
use comp_rank::workflows::comparables::ComparablesImporter;
use comp_rank::workflows::competitive::{
    analysis_router, AnalysisEngine, AnalysisError, AnalysisReport, AnalysisRequest, DataError,
    MustHaveFilter, WeightSelection,
};
use serde::Deserialize;
use serde_json::json;
use std::io::Cursor;
use std::sync::Arc;

/// A market export posted as raw CSV text instead of structured properties.
#[derive(Debug, Deserialize)]
pub(crate) struct CsvAnalysisRequest {
    pub(crate) comparables_csv: String,
    /// Reference date for turning `year_built` into a building age.
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub(crate) as_of: Option<NaiveDate>,
    #[serde(default)]
    pub(crate) weights: Option<WeightSelection>,
    #[serde(default)]
    pub(crate) must_have_filters: Vec<MustHaveFilter>,
    #[serde(default)]
    pub(crate) target_rank: Option<u32>,
}

pub(crate) fn with_analysis_routes(engine: Arc<AnalysisEngine>) -> axum::Router {
    let csv_routes = axum::Router::new()
        .route(
            "/api/v1/analysis/csv",
            axum::routing::post(csv_analysis_endpoint),
        )
        .with_state(engine.clone());

    analysis_router(engine)
        .merge(csv_routes)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn csv_analysis_endpoint(
    State(engine): State<Arc<AnalysisEngine>>,
    Json(payload): Json<CsvAnalysisRequest>,
) -> Result<Json<AnalysisReport>, AppError> {
    let CsvAnalysisRequest {
        comparables_csv,
        as_of,
        weights,
        must_have_filters,
        target_rank,
    } = payload;

    let as_of = as_of.unwrap_or_else(|| Local::now().date_naive());
    let reader = Cursor::new(comparables_csv.into_bytes());
    let imported = ComparablesImporter::from_reader(reader, as_of)?;
    let subject_property = imported
        .subject
        .ok_or(AnalysisError::Data(DataError::MissingSubject))?;

    let request = AnalysisRequest {
        subject_property,
        comparables: imported.comparables,
        weights,
        must_have_filters,
        target_rank,
    };

    Ok(Json(engine.analyze(&request)?))
}
