pub mod health;

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::document::handlers as document;
use crate::downloads::handlers as downloads;
use crate::session::handlers as session;
use crate::state::AppState;
use crate::synthesis::handlers as templates;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Session
        .route(
            "/api/v1/session/analysis",
            post(session::handle_set_analysis).get(session::handle_get_analysis),
        )
        .route("/api/v1/session", delete(session::handle_reset))
        // Document editing
        .route(
            "/api/v1/session/document",
            get(document::handle_get_document),
        )
        .route(
            "/api/v1/session/document/edits",
            post(document::handle_apply_edits),
        )
        .route(
            "/api/v1/session/document/profile-picture",
            post(document::handle_upload_profile_picture),
        )
        // Template synthesis
        .route("/api/v1/templates", get(templates::handle_list_templates))
        .route(
            "/api/v1/templates/generate",
            post(templates::handle_generate),
        )
        .route(
            "/api/v1/templates/legacy",
            post(templates::handle_generate_legacy),
        )
        .route(
            "/api/v1/templates/refresh",
            post(templates::handle_refresh),
        )
        // Downloads
        .route("/api/v1/templates/:id", delete(downloads::handle_delete))
        .route(
            "/api/v1/templates/:id/download",
            post(downloads::handle_download)
                .get(downloads::handle_download_status)
                .delete(downloads::handle_dismiss_download),
        )
        .with_state(state)
}
