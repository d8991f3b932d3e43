use std::sync::Arc;

use crate::config::Config;
use crate::downloads::export::Exporter;
use crate::downloads::manager::{DownloadManager, SharedTasks};
use crate::models::artifact::SharedArtifacts;
use crate::session::SessionStore;
use crate::synthesis::client::TemplateService;
use crate::synthesis::orchestrator::TemplateOrchestrator;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub session: SessionStore,
    pub orchestrator: TemplateOrchestrator,
    /// Also owns the artifact collection the orchestrator writes into.
    pub downloads: DownloadManager,
}

impl AppState {
    /// Wires the orchestrator and download manager to one artifact collection
    /// and one task map.
    pub fn new(config: Config, service: Arc<dyn TemplateService>) -> Self {
        let artifacts = SharedArtifacts::default();
        let tasks = SharedTasks::default();
        let exporter = Exporter::new(config.export_dir.clone());
        Self {
            session: SessionStore::new(),
            orchestrator: TemplateOrchestrator::new(
                service.clone(),
                artifacts.clone(),
                tasks.clone(),
            ),
            downloads: DownloadManager::new(service, artifacts, tasks, exporter),
            config,
        }
    }
}
