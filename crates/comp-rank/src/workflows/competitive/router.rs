use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::json;

use super::config::ConfigurationError;
use super::engine::{AnalysisEngine, AnalysisError, AnalysisRequest};

/// Router builder exposing the analysis pipeline and persona store over HTTP.
pub fn analysis_router(engine: Arc<AnalysisEngine>) -> Router {
    Router::new()
        .route("/api/v1/analysis", post(analyze_handler))
        .route("/api/v1/personas", get(list_personas_handler))
        .route("/api/v1/personas/:name", get(persona_handler))
        .with_state(engine)
}

pub(crate) async fn analyze_handler(
    State(engine): State<Arc<AnalysisEngine>>,
    axum::Json(request): axum::Json<AnalysisRequest>,
) -> Response {
    match engine.analyze(&request) {
        Ok(report) => (StatusCode::OK, axum::Json(report)).into_response(),
        Err(AnalysisError::Configuration(ConfigurationError::UnknownPersona(name))) => {
            let payload = json!({
                "error": format!("unknown persona '{name}'"),
                "personas": engine.personas().list(),
            });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        Err(error) => {
            let kind = match error {
                AnalysisError::Configuration(_) => "configuration",
                AnalysisError::Data(_) => "data",
            };
            let payload = json!({
                "error": error.to_string(),
                "kind": kind,
            });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
    }
}

pub(crate) async fn list_personas_handler(
    State(engine): State<Arc<AnalysisEngine>>,
) -> Response {
    let personas: Vec<_> = engine
        .personas()
        .profiles()
        .map(|profile| {
            json!({
                "name": profile.name,
                "description": profile.description,
                "core_weight": profile.core_mass(),
                "optional_weight": profile.optional_mass(),
            })
        })
        .collect();
    let payload = json!({
        "default": engine.config().default_persona,
        "personas": personas,
    });
    (StatusCode::OK, axum::Json(payload)).into_response()
}

pub(crate) async fn persona_handler(
    State(engine): State<Arc<AnalysisEngine>>,
    Path(name): Path<String>,
) -> Response {
    match engine.personas().load(&name) {
        Ok(profile) => (StatusCode::OK, axum::Json(profile.clone())).into_response(),
        Err(error) => {
            let payload = json!({
                "error": error.to_string(),
            });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
    }
}
