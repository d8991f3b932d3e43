use axum::{
    extract::State,
    http::{header, HeaderMap},
    Json,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use serde::Deserialize;

use crate::document::editor::FormEdit;
use crate::errors::AppError;
use crate::session::DocumentSnapshot;
use crate::state::AppState;

/// Accepts a single edit object or an array of edits.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum EditRequest {
    Many(Vec<FormEdit>),
    One(FormEdit),
}

impl EditRequest {
    fn into_edits(self) -> Vec<FormEdit> {
        match self {
            EditRequest::Many(edits) => edits,
            EditRequest::One(edit) => vec![edit],
        }
    }
}

/// GET /api/v1/session/document
pub async fn handle_get_document(
    State(state): State<AppState>,
) -> Result<Json<DocumentSnapshot>, AppError> {
    Ok(Json(state.session.document().await?))
}

/// POST /api/v1/session/document/edits
pub async fn handle_apply_edits(
    State(state): State<AppState>,
    Json(req): Json<EditRequest>,
) -> Result<Json<DocumentSnapshot>, AppError> {
    let edits = req.into_edits();
    Ok(Json(state.session.apply_edits(&edits).await?))
}

/// POST /api/v1/session/document/profile-picture
/// Body is the raw image; `Content-Type` must be an `image/*` type.
pub async fn handle_upload_profile_picture(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<DocumentSnapshot>, AppError> {
    let mime = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    let data_url = picture_data_url(mime, &body)?;
    Ok(Json(state.session.set_profile_picture(data_url).await?))
}

fn picture_data_url(mime: &str, bytes: &[u8]) -> Result<String, AppError> {
    let mime = mime.split(';').next().unwrap_or_default().trim();
    if !mime.starts_with("image/") {
        return Err(AppError::BadRequest(format!(
            "Profile picture must be an image, got '{mime}'"
        )));
    }
    if bytes.is_empty() {
        return Err(AppError::BadRequest("Profile picture is empty".to_string()));
    }
    Ok(format!("data:{mime};base64,{}", STANDARD.encode(bytes)))
}
