use chrono::NaiveDate;
use comp_rank::config::AppConfig;
use comp_rank::error::AppError;
use comp_rank::workflows::competitive::{AnalysisEngine, PersonaStore};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Built-in personas plus any profiles from `RANK_PERSONA_FILE`, wrapped in
/// an engine tuned by the analysis settings.
pub(crate) fn build_engine(config: &AppConfig) -> Result<AnalysisEngine, AppError> {
    let mut personas = PersonaStore::with_builtins(config.analysis.weight_tolerance);

    if let Some(path) = &config.persona_file {
        let reader = BufReader::new(File::open(path)?);
        let added = personas.extend_from_json_reader(reader)?;
        info!(path = %path.display(), added, "loaded custom personas");
    }

    Ok(AnalysisEngine::new(personas, config.analysis.clone())?)
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

pub(crate) fn deserialize_optional_date<'de, D>(
    deserializer: D,
) -> Result<Option<NaiveDate>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    opt.map(|value| parse_date(&value).map_err(serde::de::Error::custom))
        .transpose()
}
