//! Per-artifact download tracking.
//!
//! Each artifact owns its own `DownloadTask`; downloads of different artifacts
//! run concurrently and never touch each other's task or counter. A failure is
//! recorded on the failing artifact only.
//!
//! Tasks exist only for artifacts in the current collection. Replacing,
//! deleting or clearing artifacts drops their tasks, and a download whose
//! artifact left the collection meanwhile records nothing when it ends.
//!
//! Known limitation: `downloadCount` is incremented locally after a confirmed
//! download rather than re-read from the service. Two overlapping downloads of
//! the same artifact each add one.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::document::flatten::flatten_document;
use crate::downloads::export::Exporter;
use crate::errors::AppError;
use crate::models::artifact::{ArtifactKind, SharedArtifacts, TemplateArtifact};
use crate::models::resume::CanonicalResumeDocument;
use crate::synthesis::client::{ServiceError, TemplateService};

/// Download state per artifact id. Shared with the orchestrator, which prunes
/// it whenever it replaces artifacts.
pub type SharedTasks = Arc<Mutex<HashMap<String, DownloadTask>>>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DownloadTask {
    Idle,
    InFlight,
    Success { saved_to: PathBuf },
    Failed { error: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct DownloadReceipt {
    pub artifact_id: String,
    pub file_name: String,
    pub saved_to: PathBuf,
    /// `None` if the artifact left the collection while the download ran.
    pub download_count: Option<u32>,
}

#[derive(Debug, Error)]
enum DownloadError {
    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("no resume document in session to render the legacy template from")]
    NoDocument,

    #[error("{0:#}")]
    Export(anyhow::Error),
}

impl TemplateArtifact {
    /// Retrieves the rendered PDF. Stored artifacts are fetched by id; legacy
    /// ones are re-rendered from the flattened document.
    async fn fetch_binary(
        &self,
        service: &dyn TemplateService,
        document: Option<&CanonicalResumeDocument>,
    ) -> Result<Bytes, DownloadError> {
        match &self.kind {
            ArtifactKind::Stored => Ok(service.fetch_stored(&self.id).await?),
            ArtifactKind::Legacy { .. } => {
                let document = document.ok_or(DownloadError::NoDocument)?;
                let flat = flatten_document(document);
                Ok(service.fetch_legacy(&self.template_name, &flat).await?)
            }
        }
    }
}

#[derive(Clone)]
pub struct DownloadManager {
    service: Arc<dyn TemplateService>,
    artifacts: SharedArtifacts,
    tasks: SharedTasks,
    exporter: Exporter,
}

impl DownloadManager {
    pub fn new(
        service: Arc<dyn TemplateService>,
        artifacts: SharedArtifacts,
        tasks: SharedTasks,
        exporter: Exporter,
    ) -> Self {
        Self {
            service,
            artifacts,
            tasks,
            exporter,
        }
    }

    pub fn artifacts(&self) -> &SharedArtifacts {
        &self.artifacts
    }

    /// Downloads one artifact and saves it as `{templateName}_resume.pdf`.
    ///
    /// `document` is only needed for legacy artifacts.
    pub async fn download(
        &self,
        artifact_id: &str,
        document: Option<&CanonicalResumeDocument>,
    ) -> Result<DownloadReceipt, AppError> {
        let artifact = {
            let artifacts = self.artifacts.read().await;
            let artifact = artifacts
                .get(artifact_id)
                .cloned()
                .ok_or_else(|| AppError::NotFound(format!("Artifact {artifact_id} not found")))?;
            self.tasks
                .lock()
                .await
                .insert(artifact_id.to_string(), DownloadTask::InFlight);
            artifact
        };
        info!("Downloading artifact {} ({})", artifact.id, artifact.display_name());

        match self.fetch_and_save(&artifact, document).await {
            Ok(saved_to) => {
                let download_count = self
                    .finish(
                        &artifact,
                        DownloadTask::Success {
                            saved_to: saved_to.clone(),
                        },
                    )
                    .await;
                info!("Artifact {artifact_id} downloaded to {}", saved_to.display());
                Ok(DownloadReceipt {
                    artifact_id: artifact.id.clone(),
                    file_name: artifact.file_name(),
                    saved_to,
                    download_count,
                })
            }
            Err(e) => {
                let message = e.to_string();
                warn!("Download of artifact {artifact_id} failed: {message}");
                self.finish(
                    &artifact,
                    DownloadTask::Failed {
                        error: message.clone(),
                    },
                )
                .await;
                Err(AppError::Download {
                    artifact_id: artifact_id.to_string(),
                    message,
                })
            }
        }
    }

    /// Records the terminal state and counts a success. Returns the new count.
    /// Does nothing if the artifact was deleted, replaced or cleared meanwhile.
    async fn finish(&self, artifact: &TemplateArtifact, task: DownloadTask) -> Option<u32> {
        let mut artifacts = self.artifacts.write().await;
        let still_current = artifacts
            .get(&artifact.id)
            .is_some_and(|current| current.created_at == artifact.created_at);
        if !still_current {
            debug!("Artifact {} left the collection during its download", artifact.id);
            return None;
        }

        let download_count = match task {
            DownloadTask::Success { .. } => artifacts.increment_download(&artifact.id),
            _ => None,
        };
        self.tasks.lock().await.insert(artifact.id.clone(), task);
        download_count
    }

    async fn fetch_and_save(
        &self,
        artifact: &TemplateArtifact,
        document: Option<&CanonicalResumeDocument>,
    ) -> Result<PathBuf, DownloadError> {
        let bytes = artifact
            .fetch_binary(self.service.as_ref(), document)
            .await?;
        self.exporter
            .save(&artifact.file_name(), &bytes)
            .await
            .map_err(DownloadError::Export)
    }

    pub async fn task(&self, artifact_id: &str) -> DownloadTask {
        self.tasks
            .lock()
            .await
            .get(artifact_id)
            .cloned()
            .unwrap_or(DownloadTask::Idle)
    }

    pub async fn tasks(&self) -> HashMap<String, DownloadTask> {
        self.tasks.lock().await.clone()
    }

    /// Clears a finished task back to idle. In-flight tasks cannot be dismissed.
    pub async fn dismiss(&self, artifact_id: &str) -> Result<(), AppError> {
        let mut tasks = self.tasks.lock().await;
        if matches!(tasks.get(artifact_id), Some(DownloadTask::InFlight)) {
            return Err(AppError::Conflict(format!(
                "Download of artifact {artifact_id} is still in progress"
            )));
        }
        tasks.remove(artifact_id);
        Ok(())
    }

    /// Removes a stored artifact from the collection. Requires confirmation.
    pub async fn delete(
        &self,
        artifact_id: &str,
        confirmed: bool,
    ) -> Result<TemplateArtifact, AppError> {
        if !confirmed {
            return Err(AppError::ConfirmationRequired(
                "Deleting a resume template cannot be undone; confirm to proceed".to_string(),
            ));
        }

        let mut artifacts = self.artifacts.write().await;
        let artifact = artifacts
            .get(artifact_id)
            .ok_or_else(|| AppError::NotFound(format!("Artifact {artifact_id} not found")))?;
        if !artifact.supports_delete() {
            return Err(AppError::Unsupported(format!(
                "Artifact {artifact_id} is a legacy template and cannot be deleted"
            )));
        }
        let removed = artifacts
            .remove(artifact_id)
            .ok_or_else(|| AppError::NotFound(format!("Artifact {artifact_id} not found")))?;
        self.tasks.lock().await.remove(artifact_id);
        info!("Deleted artifact {artifact_id}");
        Ok(removed)
    }

    /// Drops every artifact and task, for an explicit session reset.
    pub async fn clear(&self) {
        let mut artifacts = self.artifacts.write().await;
        artifacts.clear();
        self.tasks.lock().await.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::artifact::{ArtifactCollection, TemplateInfo};
    use crate::testing::{complete_document, FakeTemplateService};
    use chrono::Utc;
    use tempfile::TempDir;

    fn artifact(id: &str, name: &str, kind: ArtifactKind) -> TemplateArtifact {
        TemplateArtifact {
            id: id.to_string(),
            template_name: name.to_string(),
            info: TemplateInfo {
                title: name.to_string(),
                description: String::new(),
            },
            thumbnail: None,
            created_at: Utc::now(),
            download_count: 0,
            kind,
        }
    }

    async fn setup(
        batch: Vec<TemplateArtifact>,
    ) -> (DownloadManager, Arc<FakeTemplateService>, TempDir) {
        let fake = Arc::new(FakeTemplateService::default());
        let tmp = tempfile::tempdir().unwrap();
        let mut collection = ArtifactCollection::default();
        collection.replace_all(batch);
        let artifacts = SharedArtifacts::new(collection.into());
        let manager = DownloadManager::new(
            fake.clone(),
            artifacts,
            SharedTasks::default(),
            Exporter::new(tmp.path()),
        );
        (manager, fake, tmp)
    }

    fn three_stored() -> Vec<TemplateArtifact> {
        vec![
            artifact("1", "modern", ArtifactKind::Stored),
            artifact("2", "classic", ArtifactKind::Stored),
            artifact("3", "minimalist", ArtifactKind::Stored),
        ]
    }

    async fn count(manager: &DownloadManager, id: &str) -> u32 {
        manager.artifacts().read().await.get(id).unwrap().download_count
    }

    #[tokio::test]
    async fn test_successful_download_saves_and_counts() {
        let (manager, fake, tmp) = setup(three_stored()).await;

        let receipt = manager.download("1", None).await.unwrap();

        assert_eq!(receipt.file_name, "modern_resume.pdf");
        assert_eq!(receipt.saved_to, tmp.path().join("modern_resume.pdf"));
        assert_eq!(receipt.download_count, Some(1));
        assert_eq!(
            tokio::fs::read(&receipt.saved_to).await.unwrap(),
            b"%PDF-1.4 1"
        );
        assert_eq!(
            manager.task("1").await,
            DownloadTask::Success {
                saved_to: receipt.saved_to.clone()
            }
        );
        assert_eq!(count(&manager, "1").await, 1);
        assert_eq!(fake.calls(), vec!["fetch_stored"]);
    }

    #[tokio::test]
    async fn test_same_template_name_artifacts_keep_their_own_files() {
        let (manager, _fake, tmp) = setup(vec![
            artifact("1", "modern", ArtifactKind::Stored),
            artifact("2", "modern", ArtifactKind::Stored),
        ])
        .await;

        let first = manager.download("1", None).await.unwrap();
        let second = manager.download("2", None).await.unwrap();

        assert_ne!(first.saved_to, second.saved_to);
        assert_eq!(second.saved_to, tmp.path().join("modern_resume (1).pdf"));
        assert_eq!(tokio::fs::read(&first.saved_to).await.unwrap(), b"%PDF-1.4 1");
        assert_eq!(tokio::fs::read(&second.saved_to).await.unwrap(), b"%PDF-1.4 2");
        assert_eq!(
            manager.task("1").await,
            DownloadTask::Success {
                saved_to: first.saved_to
            }
        );
    }

    #[tokio::test]
    async fn test_delete_during_download_leaves_no_task() {
        let (manager, fake, _tmp) = setup(three_stored()).await;
        let gate = fake.gate_downloads();
        let pending = tokio::spawn({
            let m = manager.clone();
            async move { m.download("1", None).await }
        });
        while fake.calls().is_empty() {
            tokio::task::yield_now().await;
        }

        manager.delete("1", true).await.unwrap();
        gate.add_permits(1);
        let receipt = pending.await.unwrap().unwrap();

        assert_eq!(receipt.download_count, None);
        assert_eq!(manager.task("1").await, DownloadTask::Idle);
        assert!(manager.tasks().await.is_empty());
    }

    #[tokio::test]
    async fn test_clear_during_failing_download_leaves_no_task() {
        let (manager, fake, _tmp) = setup(three_stored()).await;
        let gate = fake.gate_downloads();
        fake.fail_download("2");
        let pending = tokio::spawn({
            let m = manager.clone();
            async move { m.download("2", None).await }
        });
        while fake.calls().is_empty() {
            tokio::task::yield_now().await;
        }

        manager.clear().await;
        gate.add_permits(1);

        assert!(pending.await.unwrap().is_err());
        assert!(manager.tasks().await.is_empty());
    }

    #[tokio::test]
    async fn test_replaced_artifact_with_same_id_is_not_counted() {
        let (manager, fake, _tmp) = setup(vec![artifact(
            "legacy_modern",
            "modern",
            ArtifactKind::Legacy { download_url: None },
        )])
        .await;
        let gate = fake.gate_downloads();
        let pending = tokio::spawn({
            let m = manager.clone();
            async move { m.download("legacy_modern", Some(&complete_document())).await }
        });
        while fake.calls().is_empty() {
            tokio::task::yield_now().await;
        }

        let mut rerun = artifact("legacy_modern", "modern", ArtifactKind::Legacy { download_url: None });
        rerun.created_at += chrono::Duration::seconds(1);
        {
            let mut artifacts = manager.artifacts().write().await;
            artifacts.append(vec![rerun]);
            manager.tasks.lock().await.remove("legacy_modern");
        }
        gate.add_permits(1);
        pending.await.unwrap().unwrap();

        assert_eq!(count(&manager, "legacy_modern").await, 0);
        assert_eq!(manager.task("legacy_modern").await, DownloadTask::Idle);
    }

    #[tokio::test]
    async fn test_failed_download_is_scoped_to_its_artifact() {
        let (manager, fake, _tmp) = setup(three_stored()).await;
        fake.fail_download("2");

        manager.download("1", None).await.unwrap();
        let err = manager.download("2", None).await.unwrap_err();
        match err {
            AppError::Download {
                artifact_id,
                message,
            } => {
                assert_eq!(artifact_id, "2");
                assert!(message.contains("connection reset"));
            }
            other => panic!("unexpected error: {other:?}"),
        }

        assert!(matches!(manager.task("2").await, DownloadTask::Failed { .. }));
        assert_eq!(count(&manager, "2").await, 0);
        assert!(matches!(manager.task("1").await, DownloadTask::Success { .. }));
        assert_eq!(count(&manager, "1").await, 1);
        assert_eq!(manager.task("3").await, DownloadTask::Idle);

        manager.download("3", None).await.unwrap();
        manager.download("1", None).await.unwrap();
        assert_eq!(count(&manager, "3").await, 1);
        assert_eq!(count(&manager, "1").await, 2);
        assert!(matches!(manager.task("2").await, DownloadTask::Failed { .. }));
    }

    #[tokio::test]
    async fn test_retry_after_failure() {
        let (manager, fake, _tmp) = setup(three_stored()).await;
        fake.fail_download("2");
        assert!(manager.download("2", None).await.is_err());
        fake.heal_download("2");
        let receipt = manager.download("2", None).await.unwrap();
        assert_eq!(receipt.download_count, Some(1));
    }

    #[tokio::test]
    async fn test_concurrent_downloads_have_independent_tasks() {
        let (manager, fake, _tmp) = setup(three_stored()).await;
        let gate = fake.gate_downloads();
        fake.fail_download("1");

        let a = tokio::spawn({
            let m = manager.clone();
            async move { m.download("1", None).await }
        });
        let b = tokio::spawn({
            let m = manager.clone();
            async move { m.download("3", None).await }
        });

        while fake.calls().len() < 2 {
            tokio::task::yield_now().await;
        }
        assert_eq!(manager.task("1").await, DownloadTask::InFlight);
        assert_eq!(manager.task("3").await, DownloadTask::InFlight);
        assert_eq!(manager.task("2").await, DownloadTask::Idle);

        gate.add_permits(2);
        assert!(a.await.unwrap().is_err());
        assert!(b.await.unwrap().is_ok());
        assert!(matches!(manager.task("1").await, DownloadTask::Failed { .. }));
        assert!(matches!(manager.task("3").await, DownloadTask::Success { .. }));
        assert_eq!(count(&manager, "1").await, 0);
        assert_eq!(count(&manager, "3").await, 1);
    }

    #[tokio::test]
    async fn test_overlapping_downloads_of_same_artifact_both_count() {
        let (manager, fake, _tmp) = setup(three_stored()).await;
        let gate = fake.gate_downloads();
        let first = tokio::spawn({
            let m = manager.clone();
            async move { m.download("1", None).await }
        });
        let second = tokio::spawn({
            let m = manager.clone();
            async move { m.download("1", None).await }
        });
        while fake.calls().len() < 2 {
            tokio::task::yield_now().await;
        }
        gate.add_permits(2);
        first.await.unwrap().unwrap();
        second.await.unwrap().unwrap();
        assert_eq!(count(&manager, "1").await, 2);
    }

    #[tokio::test]
    async fn test_legacy_download_rerenders_from_document() {
        let legacy = artifact(
            "legacy_classic",
            "classic",
            ArtifactKind::Legacy { download_url: None },
        );
        let (manager, fake, tmp) = setup(vec![legacy]).await;

        let err = manager.download("legacy_classic", None).await.unwrap_err();
        assert!(matches!(err, AppError::Download { .. }));
        assert!(fake.calls().is_empty());

        let receipt = manager
            .download("legacy_classic", Some(&complete_document()))
            .await
            .unwrap();
        assert_eq!(fake.calls(), vec!["fetch_legacy"]);
        assert_eq!(receipt.saved_to, tmp.path().join("classic_resume.pdf"));
        assert_eq!(receipt.download_count, Some(1));
    }

    #[tokio::test]
    async fn test_unknown_artifact_is_not_found() {
        let (manager, _fake, _tmp) = setup(three_stored()).await;
        assert!(matches!(
            manager.download("nope", None).await,
            Err(AppError::NotFound(_))
        ));
        assert_eq!(manager.task("nope").await, DownloadTask::Idle);
    }

    #[tokio::test]
    async fn test_delete_requires_confirmation_and_stored_kind() {
        let mut batch = three_stored();
        batch.push(artifact(
            "legacy_modern",
            "modern",
            ArtifactKind::Legacy { download_url: None },
        ));
        let (manager, fake, _tmp) = setup(batch).await;
        fake.fail_download("3");
        let _ = manager.download("3", None).await;

        assert!(matches!(
            manager.delete("1", false).await,
            Err(AppError::ConfirmationRequired(_))
        ));
        assert!(matches!(
            manager.delete("legacy_modern", true).await,
            Err(AppError::Unsupported(_))
        ));
        assert!(matches!(
            manager.delete("missing", true).await,
            Err(AppError::NotFound(_))
        ));

        let removed = manager.delete("1", true).await.unwrap();
        assert_eq!(removed.id, "1");
        let remaining = manager.artifacts().read().await.len();
        assert_eq!(remaining, 3);
        assert!(matches!(manager.task("3").await, DownloadTask::Failed { .. }));
    }

    #[tokio::test]
    async fn test_dismiss_and_clear() {
        let (manager, fake, _tmp) = setup(three_stored()).await;
        fake.fail_download("2");
        let _ = manager.download("2", None).await;
        manager.dismiss("2").await.unwrap();
        assert_eq!(manager.task("2").await, DownloadTask::Idle);

        manager.download("1", None).await.unwrap();
        manager.clear().await;
        assert!(manager.tasks().await.is_empty());
        assert!(manager.artifacts().read().await.is_empty());
    }
}
