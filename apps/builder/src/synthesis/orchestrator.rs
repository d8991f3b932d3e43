//! Template synthesis: submits the canonical document for rendering and
//! materializes the returned artifacts.
//!
//! Flow: validate → (store resume) → generate → convert → check ids → commit.
//! Nothing is committed to the artifact collection unless the whole batch
//! converted cleanly, so a failed submission leaves existing artifacts as
//! they were. Committing drops the download tasks of replaced artifacts.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, MutexGuard};
use tracing::{info, warn};

use crate::document::flatten::flatten_document;
use crate::document::record::ResumeRecord;
use crate::document::validation::validate_for_submission;
use crate::downloads::manager::SharedTasks;
use crate::errors::AppError;
use crate::models::artifact::{ArtifactKind, SharedArtifacts, TemplateArtifact};
use crate::models::resume::CanonicalResumeDocument;
use crate::synthesis::catalog::template_info;
use crate::synthesis::client::{
    GenerationRequest, LegacyTemplate, ServiceError, StoredTemplate, TemplateService,
};

/// Whether the document is persisted server-side before generation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionMode {
    #[default]
    StoreAndGenerate,
    GenerateOnly,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerationOutcome {
    pub artifacts: Vec<TemplateArtifact>,
    pub resume_id: Option<String>,
}

#[derive(Clone)]
pub struct TemplateOrchestrator {
    service: Arc<dyn TemplateService>,
    artifacts: SharedArtifacts,
    tasks: SharedTasks,
    in_flight: Arc<Mutex<()>>,
}

impl TemplateOrchestrator {
    pub fn new(
        service: Arc<dyn TemplateService>,
        artifacts: SharedArtifacts,
        tasks: SharedTasks,
    ) -> Self {
        Self {
            service,
            artifacts,
            tasks,
            in_flight: Arc::new(Mutex::new(())),
        }
    }

    fn begin(&self) -> Result<MutexGuard<'_, ()>, AppError> {
        self.in_flight.try_lock().map_err(|_| {
            AppError::Conflict("A template generation is already in progress".to_string())
        })
    }

    /// Replaces the collection and keeps only tasks of artifacts still in it.
    async fn commit_replace(&self, batch: Vec<TemplateArtifact>) {
        let mut artifacts = self.artifacts.write().await;
        artifacts.replace_all(batch);
        self.tasks
            .lock()
            .await
            .retain(|id, _| artifacts.get(id).is_some());
    }

    /// Appends the batch. Entries it replaces by id lose their tasks.
    async fn commit_append(&self, batch: Vec<TemplateArtifact>) {
        let mut artifacts = self.artifacts.write().await;
        let mut tasks = self.tasks.lock().await;
        for artifact in &batch {
            tasks.remove(&artifact.id);
        }
        artifacts.append(batch);
    }

    /// Generates the full artifact set and replaces the current collection.
    pub async fn submit(
        &self,
        document: &CanonicalResumeDocument,
        mode: SubmissionMode,
    ) -> Result<GenerationOutcome, AppError> {
        validate_for_submission(document)?;
        let _guard = self.begin()?;

        info!("Submitting document for generation ({mode:?})");

        let resume_id = match mode {
            SubmissionMode::StoreAndGenerate => Some(
                self.service
                    .store_resume(&ResumeRecord::from(document))
                    .await
                    .map_err(generation_failure)?,
            ),
            SubmissionMode::GenerateOnly => None,
        };

        let request = GenerationRequest {
            document,
            resume_id: resume_id.as_deref(),
        };
        let templates = self
            .service
            .generate(&request)
            .await
            .map_err(generation_failure)?;

        let batch = stored_artifacts(templates)?;
        self.commit_replace(batch.clone()).await;
        info!("Generated {} templates", batch.len());

        Ok(GenerationOutcome {
            artifacts: batch,
            resume_id,
        })
    }

    /// Runs the legacy contract and appends its artifacts to the collection.
    pub async fn submit_legacy(
        &self,
        document: &CanonicalResumeDocument,
    ) -> Result<Vec<TemplateArtifact>, AppError> {
        validate_for_submission(document)?;
        let _guard = self.begin()?;

        info!("Submitting document for legacy generation");
        let flat = flatten_document(document);
        let templates = self
            .service
            .generate_legacy(&flat)
            .await
            .map_err(generation_failure)?;

        let batch = legacy_artifacts(templates)?;
        self.commit_append(batch.clone()).await;
        info!("Generated {} legacy templates", batch.len());

        Ok(batch)
    }

    /// Reloads stored artifacts from the service, e.g. when a page is re-entered.
    /// Rejected while a generation runs, so a stale list cannot replace its batch.
    pub async fn refresh(&self) -> Result<Vec<TemplateArtifact>, AppError> {
        let _guard = self.begin()?;
        let templates = self.service.list_stored().await.map_err(|e| {
            warn!("Loading generated templates failed: {e}");
            AppError::Upstream(format!("Failed to load generated templates: {e}"))
        })?;
        let batch = stored_artifacts(templates)?;
        self.commit_replace(batch.clone()).await;
        Ok(batch)
    }
}

fn generation_failure(e: ServiceError) -> AppError {
    warn!("Template generation failed: {e}");
    AppError::Generation(e.to_string())
}

fn stored_artifacts(templates: Vec<StoredTemplate>) -> Result<Vec<TemplateArtifact>, AppError> {
    let batch: Vec<TemplateArtifact> = templates.into_iter().map(stored_artifact).collect();
    ensure_unique_ids(&batch)?;
    Ok(batch)
}

fn stored_artifact(template: StoredTemplate) -> TemplateArtifact {
    let info = template
        .template_info
        .unwrap_or_else(|| template_info(&template.template_name));
    TemplateArtifact {
        id: template.id,
        info,
        thumbnail: template.thumbnail_base64,
        created_at: template.created_at.unwrap_or_else(Utc::now),
        download_count: template.download_count,
        kind: ArtifactKind::Stored,
        template_name: template.template_name,
    }
}

fn legacy_artifacts(templates: Vec<LegacyTemplate>) -> Result<Vec<TemplateArtifact>, AppError> {
    let created_at = Utc::now();
    let batch: Vec<TemplateArtifact> = templates
        .into_iter()
        .map(|t| TemplateArtifact {
            id: format!("legacy_{}", t.template_name),
            info: template_info(&t.template_name),
            thumbnail: None,
            created_at,
            download_count: 0,
            kind: ArtifactKind::Legacy {
                download_url: t.download_url,
            },
            template_name: t.template_name,
        })
        .collect();
    ensure_unique_ids(&batch)?;
    Ok(batch)
}

fn ensure_unique_ids(batch: &[TemplateArtifact]) -> Result<(), AppError> {
    let mut seen = HashSet::new();
    for artifact in batch {
        if !seen.insert(artifact.id.as_str()) {
            return Err(AppError::Generation(format!(
                "Service returned duplicate artifact id '{}'",
                artifact.id
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::downloads::manager::DownloadTask;
    use crate::testing::{complete_document, stored, FakeTemplateService};
    use std::path::PathBuf;

    fn orchestrator(fake: Arc<FakeTemplateService>) -> (TemplateOrchestrator, SharedArtifacts) {
        let artifacts = SharedArtifacts::default();
        let tasks = SharedTasks::default();
        (
            TemplateOrchestrator::new(fake, artifacts.clone(), tasks),
            artifacts,
        )
    }

    fn finished() -> DownloadTask {
        DownloadTask::Success {
            saved_to: PathBuf::from("modern_resume.pdf"),
        }
    }

    #[tokio::test]
    async fn test_submit_replaces_collection() {
        let fake = Arc::new(FakeTemplateService::with_stored(vec![
            stored("1", "modern"),
            stored("2", "classic"),
            stored("3", "minimalist"),
        ]));
        let (orch, artifacts) = orchestrator(fake.clone());

        let outcome = orch
            .submit(&complete_document(), SubmissionMode::StoreAndGenerate)
            .await
            .unwrap();

        assert_eq!(outcome.artifacts.len(), 3);
        assert_eq!(outcome.resume_id.as_deref(), Some("resume-1"));
        assert_eq!(artifacts.read().await.len(), 3);
        assert_eq!(fake.calls(), vec!["store_resume", "generate"]);
        assert_eq!(outcome.artifacts[1].info.title, "Classic Traditional");
    }

    #[tokio::test]
    async fn test_generate_only_skips_store() {
        let fake = Arc::new(FakeTemplateService::with_stored(vec![stored("1", "modern")]));
        let (orch, _) = orchestrator(fake.clone());
        let outcome = orch
            .submit(&complete_document(), SubmissionMode::GenerateOnly)
            .await
            .unwrap();
        assert_eq!(outcome.resume_id, None);
        assert_eq!(fake.calls(), vec!["generate"]);
    }

    #[tokio::test]
    async fn test_validation_failure_makes_no_network_call() {
        let fake = Arc::new(FakeTemplateService::with_stored(vec![stored("1", "modern")]));
        let (orch, _) = orchestrator(fake.clone());
        let mut doc = complete_document();
        doc.personal.full_name.clear();
        doc.personal.email.clear();

        let err = orch
            .submit(&doc, SubmissionMode::StoreAndGenerate)
            .await
            .unwrap_err();

        match err {
            AppError::Validation(v) => assert_eq!(v.missing, vec!["fullName", "email"]),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn test_failure_leaves_existing_artifacts_untouched() {
        let fake = Arc::new(FakeTemplateService::with_stored(vec![stored("1", "modern")]));
        let (orch, artifacts) = orchestrator(fake.clone());
        orch.submit(&complete_document(), SubmissionMode::GenerateOnly)
            .await
            .unwrap();

        fake.fail_generation("renderer offline");
        let err = orch
            .submit(&complete_document(), SubmissionMode::GenerateOnly)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Generation(ref m) if m.contains("renderer offline")));
        let current = artifacts.read().await;
        assert_eq!(current.len(), 1);
        assert_eq!(current.list()[0].id, "1");
    }

    #[tokio::test]
    async fn test_duplicate_ids_commit_nothing() {
        let fake = Arc::new(FakeTemplateService::with_stored(vec![
            stored("1", "modern"),
            stored("1", "classic"),
        ]));
        let (orch, artifacts) = orchestrator(fake);
        let err = orch
            .submit(&complete_document(), SubmissionMode::GenerateOnly)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Generation(_)));
        assert!(artifacts.read().await.is_empty());
    }

    #[tokio::test]
    async fn test_legacy_appends_tagged_artifacts() {
        let fake = Arc::new(FakeTemplateService::with_stored(vec![stored("1", "modern")]));
        fake.set_legacy(&["modern", "classic"]);
        let (orch, artifacts) = orchestrator(fake);

        orch.submit(&complete_document(), SubmissionMode::GenerateOnly)
            .await
            .unwrap();
        let legacy = orch.submit_legacy(&complete_document()).await.unwrap();

        assert_eq!(legacy.len(), 2);
        assert_eq!(legacy[0].id, "legacy_modern");
        assert!(legacy.iter().all(|a| a.is_legacy() && a.thumbnail.is_none()));
        assert!(legacy.iter().all(|a| a.download_count == 0));
        assert_eq!(artifacts.read().await.len(), 3);

        orch.submit_legacy(&complete_document()).await.unwrap();
        assert_eq!(artifacts.read().await.len(), 3, "re-running legacy keeps ids unique");
    }

    #[tokio::test]
    async fn test_refresh_loads_stored_artifacts() {
        let fake = Arc::new(FakeTemplateService::with_stored(vec![
            stored("1", "modern"),
            stored("2", "classic"),
        ]));
        let (orch, artifacts) = orchestrator(fake.clone());
        let loaded = orch.refresh().await.unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(artifacts.read().await.len(), 2);
        assert_eq!(fake.calls(), vec!["list_stored"]);
    }

    #[tokio::test]
    async fn test_concurrent_submission_is_rejected() {
        let fake = Arc::new(FakeTemplateService::with_stored(vec![stored("1", "modern")]));
        let (orch, _) = orchestrator(fake);
        let _held = orch.in_flight.try_lock().unwrap();
        let err = orch
            .submit(&complete_document(), SubmissionMode::GenerateOnly)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_new_batch_drops_tasks_of_replaced_artifacts() {
        let fake = Arc::new(FakeTemplateService::with_stored(vec![
            stored("1", "modern"),
            stored("2", "classic"),
        ]));
        let (orch, artifacts) = orchestrator(fake.clone());
        orch.submit(&complete_document(), SubmissionMode::GenerateOnly)
            .await
            .unwrap();
        orch.tasks.lock().await.insert("1".to_string(), finished());
        orch.tasks.lock().await.insert("2".to_string(), finished());

        fake.set_stored(vec![stored("2", "classic"), stored("9", "modern")]);
        orch.refresh().await.unwrap();
        let kept: Vec<String> = orch.tasks.lock().await.keys().cloned().collect();
        assert_eq!(kept, vec!["2".to_string()]);

        fake.set_stored(vec![stored("9", "modern")]);
        orch.submit(&complete_document(), SubmissionMode::GenerateOnly)
            .await
            .unwrap();
        let ids: Vec<String> = artifacts.read().await.list().iter().map(|a| a.id.clone()).collect();
        assert_eq!(ids, vec!["9"]);
        assert!(orch.tasks.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_legacy_rerun_drops_task_of_replaced_entry() {
        let fake = Arc::new(FakeTemplateService::with_stored(vec![stored("1", "modern")]));
        fake.set_legacy(&["modern"]);
        let (orch, _) = orchestrator(fake);
        orch.submit(&complete_document(), SubmissionMode::GenerateOnly)
            .await
            .unwrap();
        orch.submit_legacy(&complete_document()).await.unwrap();
        orch.tasks.lock().await.insert("1".to_string(), finished());
        orch.tasks.lock().await.insert("legacy_modern".to_string(), finished());

        orch.submit_legacy(&complete_document()).await.unwrap();

        let tasks = orch.tasks.lock().await;
        assert!(tasks.contains_key("1"));
        assert!(!tasks.contains_key("legacy_modern"));
    }

    #[tokio::test]
    async fn test_refresh_rejected_while_generation_runs() {
        let fake = Arc::new(FakeTemplateService::with_stored(vec![stored("1", "modern")]));
        let (orch, artifacts) = orchestrator(fake.clone());
        let _held = orch.in_flight.try_lock().unwrap();

        let err = orch.refresh().await.unwrap_err();

        assert!(matches!(err, AppError::Conflict(_)));
        assert!(fake.calls().is_empty());
        assert!(artifacts.read().await.is_empty());
    }
}
