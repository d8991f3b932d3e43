//! Remote generation service client.
//!
//! All calls to the generation/storage API go through [`TemplateService`].
//! [`HttpTemplateService`] is the production implementation; tests swap in
//! in-memory fakes. No automatic retries: a failed call is reported and the
//! user decides whether to try again.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::document::flatten::FlatDocument;
use crate::document::record::ResumeRecord;
use crate::models::artifact::TemplateInfo;
use crate::models::resume::CanonicalResumeDocument;

const STORE_RESUME_PATH: &str = "/api/resumes/";
const GENERATE_PATH: &str = "/api/resumes/generate-and-store/";
const LEGACY_GENERATE_PATH: &str = "/api/resumes/generate/";
const LIST_GENERATED_PATH: &str = "/api/resumes/generated/";
const DOWNLOAD_SEGMENTS: &[&str] = &["api", "resumes", "download"];
const LEGACY_DOWNLOAD_SEGMENTS: &[&str] = &["api", "resumes", "download-post"];

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("service error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("{0}")]
    Rejected(String),

    #[error("invalid response from service: {0}")]
    MalformedResponse(String),

    #[error("invalid service URL: {0}")]
    InvalidUrl(String),
}

// ────────────────────────────────────────────────────────────────────────────
// Wire types
// ────────────────────────────────────────────────────────────────────────────

/// Body of a generation request: the nested canonical document plus the id
/// of the stored resume when the document was persisted first.
#[derive(Debug, Serialize)]
pub struct GenerationRequest<'a> {
    #[serde(flatten)]
    pub document: &'a CanonicalResumeDocument,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume_id: Option<&'a str>,
}

/// A stored artifact as the service reports it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StoredTemplate {
    #[serde(deserialize_with = "id_as_string")]
    pub id: String,
    pub template_name: String,
    #[serde(default)]
    pub template_info: Option<TemplateInfo>,
    #[serde(default, alias = "thumbnail")]
    pub thumbnail_base64: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub download_count: u32,
}

/// A template produced by the legacy contract. It has no persistent id.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LegacyTemplate {
    pub template_name: String,
    #[serde(default)]
    pub download_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TemplatesEnvelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    templates: Option<Vec<StoredTemplate>>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LegacyEnvelope {
    #[serde(default)]
    templates: Option<Vec<LegacyTemplate>>,
}

#[derive(Debug, Deserialize)]
struct StoreResponse {
    #[serde(deserialize_with = "id_as_string")]
    id: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(alias = "detail", alias = "message")]
    error: Value,
}

/// Server ids arrive as integers or UUID strings depending on the endpoint.
fn id_as_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or integer id, got {other}"
        ))),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Service trait
// ────────────────────────────────────────────────────────────────────────────

/// The generation service seam. Carried in `AppState` as `Arc<dyn TemplateService>`.
#[async_trait]
pub trait TemplateService: Send + Sync {
    /// Persists the resume server-side and returns its id.
    async fn store_resume(&self, record: &ResumeRecord) -> Result<String, ServiceError>;

    async fn generate(
        &self,
        request: &GenerationRequest<'_>,
    ) -> Result<Vec<StoredTemplate>, ServiceError>;

    async fn generate_legacy(&self, flat: &FlatDocument)
        -> Result<Vec<LegacyTemplate>, ServiceError>;

    async fn list_stored(&self) -> Result<Vec<StoredTemplate>, ServiceError>;

    async fn fetch_stored(&self, id: &str) -> Result<Bytes, ServiceError>;

    async fn fetch_legacy(
        &self,
        template_name: &str,
        flat: &FlatDocument,
    ) -> Result<Bytes, ServiceError>;
}

// ────────────────────────────────────────────────────────────────────────────
// HTTP implementation
// ────────────────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct HttpTemplateService {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpTemplateService {
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .expect("Failed to build HTTP client"),
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `{base}/{prefix..}/{segment}/` with `segment` percent-encoded, so ids and
    /// template names from the service cannot change the request path.
    fn segment_url(&self, prefix: &[&str], segment: &str) -> Result<Url, ServiceError> {
        let mut url =
            Url::parse(&self.base_url).map_err(|e| ServiceError::InvalidUrl(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| ServiceError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .extend(prefix)
            .push(segment)
            .push("");
        Ok(url)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, ServiceError> {
        let response = self.authorized(builder).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .map(|e| match e.error {
                Value::String(s) => s,
                other => other.to_string(),
            })
            .unwrap_or(body);
        Err(ServiceError::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ServiceError> {
        let bytes = self.send(builder).await?.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn send_binary(&self, builder: RequestBuilder) -> Result<Bytes, ServiceError> {
        let bytes = self.send(builder).await?.bytes().await?;
        debug!("Fetched {} byte artifact", bytes.len());
        Ok(bytes)
    }
}

/// Unwraps a `{success, templates, error}` envelope, all or nothing.
fn unwrap_templates(envelope: TemplatesEnvelope) -> Result<Vec<StoredTemplate>, ServiceError> {
    if !envelope.success {
        return Err(ServiceError::Rejected(
            envelope
                .error
                .unwrap_or_else(|| "Failed to generate templates".to_string()),
        ));
    }
    envelope
        .templates
        .ok_or_else(|| ServiceError::MalformedResponse("missing 'templates'".to_string()))
}

#[async_trait]
impl TemplateService for HttpTemplateService {
    async fn store_resume(&self, record: &ResumeRecord) -> Result<String, ServiceError> {
        let response: StoreResponse = self
            .send_json(self.client.post(self.url(STORE_RESUME_PATH)).json(record))
            .await?;
        Ok(response.id)
    }

    async fn generate(
        &self,
        request: &GenerationRequest<'_>,
    ) -> Result<Vec<StoredTemplate>, ServiceError> {
        let envelope: TemplatesEnvelope = self
            .send_json(self.client.post(self.url(GENERATE_PATH)).json(request))
            .await?;
        unwrap_templates(envelope)
    }

    async fn generate_legacy(
        &self,
        flat: &FlatDocument,
    ) -> Result<Vec<LegacyTemplate>, ServiceError> {
        let envelope: LegacyEnvelope = self
            .send_json(self.client.post(self.url(LEGACY_GENERATE_PATH)).json(flat))
            .await?;
        envelope.templates.ok_or_else(|| {
            ServiceError::MalformedResponse("Invalid response format from server".to_string())
        })
    }

    async fn list_stored(&self) -> Result<Vec<StoredTemplate>, ServiceError> {
        let envelope: TemplatesEnvelope = self
            .send_json(self.client.get(self.url(LIST_GENERATED_PATH)))
            .await?;
        unwrap_templates(envelope)
    }

    async fn fetch_stored(&self, id: &str) -> Result<Bytes, ServiceError> {
        let url = self.segment_url(DOWNLOAD_SEGMENTS, id)?;
        self.send_binary(self.client.get(url)).await
    }

    async fn fetch_legacy(
        &self,
        template_name: &str,
        flat: &FlatDocument,
    ) -> Result<Bytes, ServiceError> {
        let url = self.segment_url(LEGACY_DOWNLOAD_SEGMENTS, template_name)?;
        self.send_binary(self.client.post(url).json(flat)).await
    }
}
