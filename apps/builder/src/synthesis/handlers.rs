use std::collections::HashMap;

use axum::{extract::State, Json};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::downloads::manager::DownloadTask;
use crate::errors::AppError;
use crate::models::artifact::{CollectionStats, TemplateArtifact};
use crate::state::AppState;
use crate::synthesis::orchestrator::{GenerationOutcome, SubmissionMode};

#[derive(Debug, Default, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub mode: SubmissionMode,
}

#[derive(Serialize)]
pub struct DateGroup {
    pub date: NaiveDate,
    pub artifact_ids: Vec<String>,
}

#[derive(Serialize)]
pub struct CollectionResponse {
    pub artifacts: Vec<TemplateArtifact>,
    pub stats: CollectionStats,
    pub groups: Vec<DateGroup>,
    /// Only artifacts with a non-idle task appear here.
    pub tasks: HashMap<String, DownloadTask>,
}

/// POST /api/v1/templates/generate
/// Body is optional; `mode` defaults to `store_and_generate`.
pub async fn handle_generate(
    State(state): State<AppState>,
    req: Option<Json<GenerateRequest>>,
) -> Result<Json<GenerationOutcome>, AppError> {
    let mode = req.map(|Json(r)| r.mode).unwrap_or_default();
    let snapshot = state.session.document().await?;
    let outcome = state.orchestrator.submit(&snapshot.document, mode).await?;
    Ok(Json(outcome))
}

/// POST /api/v1/templates/legacy
pub async fn handle_generate_legacy(
    State(state): State<AppState>,
) -> Result<Json<Vec<TemplateArtifact>>, AppError> {
    let snapshot = state.session.document().await?;
    let artifacts = state.orchestrator.submit_legacy(&snapshot.document).await?;
    Ok(Json(artifacts))
}

/// POST /api/v1/templates/refresh
pub async fn handle_refresh(
    State(state): State<AppState>,
) -> Result<Json<Vec<TemplateArtifact>>, AppError> {
    Ok(Json(state.orchestrator.refresh().await?))
}

/// GET /api/v1/templates
pub async fn handle_list_templates(State(state): State<AppState>) -> Json<CollectionResponse> {
    let (artifacts, stats, groups) = {
        let collection = state.downloads.artifacts().read().await;
        let groups = collection
            .grouped_by_date()
            .into_iter()
            .map(|(date, items)| DateGroup {
                date,
                artifact_ids: items.into_iter().map(|a| a.id.clone()).collect(),
            })
            .collect();
        (collection.list().to_vec(), collection.stats(), groups)
    };
    let tasks = state.downloads.tasks().await;

    Json(CollectionResponse {
        artifacts,
        stats,
        groups,
        tasks,
    })
}
