//! In-memory test doubles shared by unit tests across modules.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{TimeZone, Utc};
use tokio::sync::Semaphore;

use crate::document::flatten::FlatDocument;
use crate::document::record::ResumeRecord;
use crate::models::resume::CanonicalResumeDocument;
use crate::synthesis::client::{
    GenerationRequest, LegacyTemplate, ServiceError, StoredTemplate, TemplateService,
};

pub fn complete_document() -> CanonicalResumeDocument {
    let mut doc = CanonicalResumeDocument::default();
    doc.personal.full_name = "Ada Lovelace".to_string();
    doc.personal.email = "ada@example.com".to_string();
    doc.personal.phone = "555-0100".to_string();
    doc
}

pub fn stored(id: &str, template_name: &str) -> StoredTemplate {
    StoredTemplate {
        id: id.to_string(),
        template_name: template_name.to_string(),
        template_info: None,
        thumbnail_base64: None,
        created_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).single(),
        download_count: 0,
    }
}

/// A scriptable `TemplateService`. Records every call by method name.
#[derive(Default)]
pub struct FakeTemplateService {
    stored: Mutex<Vec<StoredTemplate>>,
    legacy: Mutex<Vec<LegacyTemplate>>,
    generation_error: Mutex<Option<String>>,
    failing_downloads: Mutex<HashSet<String>>,
    download_gate: Mutex<Option<Arc<Semaphore>>>,
    calls: Mutex<Vec<&'static str>>,
}

impl FakeTemplateService {
    pub fn with_stored(templates: Vec<StoredTemplate>) -> Self {
        let fake = Self::default();
        *fake.stored.lock().unwrap() = templates;
        fake
    }

    pub fn set_stored(&self, templates: Vec<StoredTemplate>) {
        *self.stored.lock().unwrap() = templates;
    }

    pub fn set_legacy(&self, names: &[&str]) {
        *self.legacy.lock().unwrap() = names
            .iter()
            .map(|name| LegacyTemplate {
                template_name: name.to_string(),
                download_url: Some(format!("/api/resumes/download-post/{name}/")),
            })
            .collect();
    }

    pub fn fail_generation(&self, message: &str) {
        *self.generation_error.lock().unwrap() = Some(message.to_string());
    }

    /// Makes downloads of this artifact id (or legacy template name) fail.
    pub fn fail_download(&self, key: &str) {
        self.failing_downloads.lock().unwrap().insert(key.to_string());
    }

    pub fn heal_download(&self, key: &str) {
        self.failing_downloads.lock().unwrap().remove(key);
    }

    /// Blocks every binary fetch until the returned semaphore gets a permit.
    pub fn gate_downloads(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.download_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: &'static str) {
        self.calls.lock().unwrap().push(call);
    }

    async fn fetch(&self, key: &str) -> Result<Bytes, ServiceError> {
        let gate = self.download_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }
        if self.failing_downloads.lock().unwrap().contains(key) {
            return Err(ServiceError::Api {
                status: 502,
                message: "connection reset by peer".to_string(),
            });
        }
        Ok(Bytes::from(format!("%PDF-1.4 {key}")))
    }
}

#[async_trait]
impl TemplateService for FakeTemplateService {
    async fn store_resume(&self, _record: &ResumeRecord) -> Result<String, ServiceError> {
        self.record("store_resume");
        Ok("resume-1".to_string())
    }

    async fn generate(
        &self,
        _request: &GenerationRequest<'_>,
    ) -> Result<Vec<StoredTemplate>, ServiceError> {
        self.record("generate");
        if let Some(message) = self.generation_error.lock().unwrap().clone() {
            return Err(ServiceError::Rejected(message));
        }
        Ok(self.stored.lock().unwrap().clone())
    }

    async fn generate_legacy(
        &self,
        _flat: &FlatDocument,
    ) -> Result<Vec<LegacyTemplate>, ServiceError> {
        self.record("generate_legacy");
        if let Some(message) = self.generation_error.lock().unwrap().clone() {
            return Err(ServiceError::Rejected(message));
        }
        Ok(self.legacy.lock().unwrap().clone())
    }

    async fn list_stored(&self) -> Result<Vec<StoredTemplate>, ServiceError> {
        self.record("list_stored");
        Ok(self.stored.lock().unwrap().clone())
    }

    async fn fetch_stored(&self, id: &str) -> Result<Bytes, ServiceError> {
        self.record("fetch_stored");
        self.fetch(id).await
    }

    async fn fetch_legacy(
        &self,
        template_name: &str,
        _flat: &FlatDocument,
    ) -> Result<Bytes, ServiceError> {
        self.record("fetch_legacy");
        self.fetch(template_name).await
    }
}

pub fn test_config(export_dir: &std::path::Path) -> crate::config::Config {
    crate::config::Config {
        generation_service_url: "http://generation.invalid".to_string(),
        generation_service_token: None,
        export_dir: export_dir.to_path_buf(),
        request_timeout: std::time::Duration::from_secs(5),
        port: 0,
        rust_log: "debug".to_string(),
    }
}
