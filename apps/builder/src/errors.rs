use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::document::editor::EditError;
use crate::document::validation::ValidationError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Edit error: {0}")]
    Edit(#[from] EditError),

    #[error("No analysis result in the current session")]
    NoActiveSession,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Confirmation required: {0}")]
    ConfirmationRequired(String),

    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    #[error("Template generation failed: {0}")]
    Generation(String),

    #[error("Generation service error: {0}")]
    Upstream(String),

    #[error("Download of artifact {artifact_id} failed: {message}")]
    Download { artifact_id: String, message: String },

    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(e) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", e.to_string()),
            AppError::Edit(e) => (StatusCode::UNPROCESSABLE_ENTITY, "EDIT_ERROR", e.to_string()),
            AppError::NoActiveSession => (
                StatusCode::CONFLICT,
                "NO_ACTIVE_SESSION",
                "Upload and analyze a resume first".to_string(),
            ),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
            AppError::ConfirmationRequired(msg) => (
                StatusCode::PRECONDITION_REQUIRED,
                "CONFIRMATION_REQUIRED",
                msg.clone(),
            ),
            AppError::Unsupported(msg) => (
                StatusCode::METHOD_NOT_ALLOWED,
                "UNSUPPORTED_OPERATION",
                msg.clone(),
            ),
            AppError::Generation(msg) => {
                tracing::error!("Generation failure: {msg}");
                (StatusCode::BAD_GATEWAY, "GENERATION_FAILED", msg.clone())
            }
            AppError::Upstream(msg) => {
                tracing::error!("Generation service error: {msg}");
                (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR", msg.clone())
            }
            AppError::Download { message, .. } => {
                (StatusCode::BAD_GATEWAY, "DOWNLOAD_FAILED", message.clone())
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
        };

        let mut error = json!({
            "code": code,
            "message": message
        });
        match &self {
            AppError::Validation(e) => error["fields"] = json!(e.missing),
            AppError::Download { artifact_id, .. } => error["artifact_id"] = json!(artifact_id),
            _ => {}
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}
