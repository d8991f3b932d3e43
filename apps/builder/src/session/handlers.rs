use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::models::analysis::AnalysisPayload;
use crate::session::DocumentSnapshot;
use crate::state::AppState;

#[derive(Serialize)]
pub struct AnalysisResponse {
    /// `null` until an analysis result has been set.
    pub analysis: Option<AnalysisPayload>,
    pub ats_score: Option<f64>,
}

/// POST /api/v1/session/analysis
pub async fn handle_set_analysis(
    State(state): State<AppState>,
    Json(payload): Json<AnalysisPayload>,
) -> Json<DocumentSnapshot> {
    Json(state.session.set_analysis_result(payload).await)
}

/// GET /api/v1/session/analysis
pub async fn handle_get_analysis(State(state): State<AppState>) -> Json<AnalysisResponse> {
    let analysis = state.session.get_analysis_result().await;
    let ats_score = analysis.as_ref().and_then(AnalysisPayload::ats_score);
    Json(AnalysisResponse {
        analysis,
        ats_score,
    })
}

/// DELETE /api/v1/session
/// Clears the analysis result, the document, all artifacts and download tasks.
pub async fn handle_reset(State(state): State<AppState>) -> StatusCode {
    state.session.reset().await;
    state.downloads.clear().await;
    StatusCode::NO_CONTENT
}
