//! Session context: the latest analysis result and the document derived from it.
//!
//! Lifecycle is `empty -> populated -> (edited)* -> reset -> empty`. The store
//! is created once at startup and handed to consumers through `AppState`;
//! nothing is persisted across restarts.

pub mod handlers;

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::document::editor::{apply_all, FormEdit, Section};
use crate::document::normalize::normalize;
use crate::errors::AppError;
use crate::models::analysis::AnalysisPayload;
use crate::models::resume::CanonicalResumeDocument;

/// The current document together with its position in the edit history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentSnapshot {
    pub session_id: Uuid,
    /// Starts at 0 when the analysis result is set, +1 per applied edit batch.
    pub revision: u64,
    pub document: CanonicalResumeDocument,
}

#[derive(Debug)]
struct Session {
    id: Uuid,
    payload: AnalysisPayload,
    document: CanonicalResumeDocument,
    revision: u64,
}

impl Session {
    fn snapshot(&self) -> DocumentSnapshot {
        DocumentSnapshot {
            session_id: self.id,
            revision: self.revision,
            document: self.document.clone(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<Option<Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces any previous result. The document is re-derived from scratch,
    /// so edits made against the previous result are discarded.
    pub async fn set_analysis_result(&self, payload: AnalysisPayload) -> DocumentSnapshot {
        let session = Session {
            id: Uuid::new_v4(),
            document: normalize(&payload),
            payload,
            revision: 0,
        };
        let snapshot = session.snapshot();
        *self.inner.write().await = Some(session);
        info!("Analysis result set for session {}", snapshot.session_id);
        snapshot
    }

    /// The last value passed to `set_analysis_result`, or `None` before any.
    pub async fn get_analysis_result(&self) -> Option<AnalysisPayload> {
        self.inner.read().await.as_ref().map(|s| s.payload.clone())
    }

    pub async fn document(&self) -> Result<DocumentSnapshot, AppError> {
        self.inner
            .read()
            .await
            .as_ref()
            .map(Session::snapshot)
            .ok_or(AppError::NoActiveSession)
    }

    /// Applies the edits in order under one write lock. On the first failing
    /// edit nothing is committed.
    pub async fn apply_edits(&self, edits: &[FormEdit]) -> Result<DocumentSnapshot, AppError> {
        let mut guard = self.inner.write().await;
        let session = guard.as_mut().ok_or(AppError::NoActiveSession)?;

        session.document = apply_all(&session.document, edits)?;
        session.revision += 1;
        debug!(
            "Applied {} edit(s), session {} now at revision {}",
            edits.len(),
            session.id,
            session.revision
        );
        Ok(session.snapshot())
    }

    pub async fn set_profile_picture(&self, data_url: String) -> Result<DocumentSnapshot, AppError> {
        self.apply_edits(&[FormEdit::SetField {
            section: Section::ProfilePicture,
            index: None,
            field: "value".to_string(),
            value: data_url,
        }])
        .await
    }

    pub async fn reset(&self) {
        if let Some(session) = self.inner.write().await.take() {
            info!("Session {} reset", session.id);
        }
    }
}
