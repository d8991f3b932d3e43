use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::downloads::manager::{DownloadReceipt, DownloadTask};
use crate::errors::AppError;
use crate::models::artifact::TemplateArtifact;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct DeleteQuery {
    #[serde(default)]
    pub confirm: bool,
}

/// POST /api/v1/templates/:id/download
pub async fn handle_download(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DownloadReceipt>, AppError> {
    // Legacy artifacts are re-rendered from whatever the form holds now.
    let document = state.session.document().await.ok().map(|s| s.document);
    let receipt = state.downloads.download(&id, document.as_ref()).await?;
    Ok(Json(receipt))
}

/// GET /api/v1/templates/:id/download
pub async fn handle_download_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DownloadTask>, AppError> {
    if state.downloads.artifacts().read().await.get(&id).is_none() {
        return Err(AppError::NotFound(format!("Artifact {id} not found")));
    }
    Ok(Json(state.downloads.task(&id).await))
}

/// DELETE /api/v1/templates/:id/download
pub async fn handle_dismiss_download(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.downloads.dismiss(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/templates/:id?confirm=true
pub async fn handle_delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<DeleteQuery>,
) -> Result<Json<TemplateArtifact>, AppError> {
    Ok(Json(state.downloads.delete(&id, query.confirm).await?))
}
