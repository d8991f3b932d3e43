use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// The artifact collection shared by generation (writer) and downloads.
pub type SharedArtifacts = Arc<RwLock<ArtifactCollection>>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateInfo {
    pub title: String,
    pub description: String,
}

/// Where an artifact's binary comes from.
///
/// Stored artifacts have a persistent server id; legacy artifacts only exist
/// as a template name and must be re-rendered from the document on download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ArtifactKind {
    Stored,
    Legacy {
        #[serde(
            default,
            rename = "downloadUrl",
            skip_serializing_if = "Option::is_none"
        )]
        download_url: Option<String>,
    },
}

/// One generated, renderable resume variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateArtifact {
    pub id: String,
    pub template_name: String,
    pub info: TemplateInfo,
    pub thumbnail: Option<String>,
    pub created_at: DateTime<Utc>,
    pub download_count: u32,
    #[serde(flatten)]
    pub kind: ArtifactKind,
}

impl TemplateArtifact {
    pub fn is_legacy(&self) -> bool {
        matches!(self.kind, ArtifactKind::Legacy { .. })
    }

    pub fn display_name(&self) -> &str {
        &self.info.title
    }

    /// Only stored artifacts can be removed; legacy ones have no server identity.
    pub fn supports_delete(&self) -> bool {
        matches!(self.kind, ArtifactKind::Stored)
    }

    /// File name the rendered PDF is saved under.
    pub fn file_name(&self) -> String {
        format!("{}_resume.pdf", self.template_name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CollectionStats {
    pub total: usize,
    pub total_downloads: u64,
    pub distinct_templates: usize,
}

/// The artifacts currently offered for download, in presentation order.
#[derive(Debug, Clone, Default)]
pub struct ArtifactCollection {
    artifacts: Vec<TemplateArtifact>,
}

impl ArtifactCollection {
    pub fn list(&self) -> &[TemplateArtifact] {
        &self.artifacts
    }

    pub fn get(&self, id: &str) -> Option<&TemplateArtifact> {
        self.artifacts.iter().find(|a| a.id == id)
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    /// Replaces the whole collection with a freshly generated batch.
    pub fn replace_all(&mut self, batch: Vec<TemplateArtifact>) {
        self.artifacts = batch;
    }

    /// Appends a batch. An artifact whose id is already present takes the
    /// existing slot so ids stay unique across repeated legacy generations.
    pub fn append(&mut self, batch: Vec<TemplateArtifact>) {
        for artifact in batch {
            match self.artifacts.iter_mut().find(|a| a.id == artifact.id) {
                Some(slot) => *slot = artifact,
                None => self.artifacts.push(artifact),
            }
        }
    }

    /// Bumps the local download counter and returns the new value.
    pub fn increment_download(&mut self, id: &str) -> Option<u32> {
        let artifact = self.artifacts.iter_mut().find(|a| a.id == id)?;
        artifact.download_count = artifact.download_count.saturating_add(1);
        Some(artifact.download_count)
    }

    pub fn remove(&mut self, id: &str) -> Option<TemplateArtifact> {
        let idx = self.artifacts.iter().position(|a| a.id == id)?;
        Some(self.artifacts.remove(idx))
    }

    pub fn clear(&mut self) {
        self.artifacts.clear();
    }

    pub fn stats(&self) -> CollectionStats {
        let mut names: Vec<&str> = self
            .artifacts
            .iter()
            .map(|a| a.template_name.as_str())
            .collect();
        names.sort_unstable();
        names.dedup();
        CollectionStats {
            total: self.artifacts.len(),
            total_downloads: self.artifacts.iter().map(|a| a.download_count as u64).sum(),
            distinct_templates: names.len(),
        }
    }

    pub fn grouped_by_date(&self) -> BTreeMap<NaiveDate, Vec<&TemplateArtifact>> {
        let mut groups: BTreeMap<NaiveDate, Vec<&TemplateArtifact>> = BTreeMap::new();
        for artifact in &self.artifacts {
            groups
                .entry(artifact.created_at.date_naive())
                .or_default()
                .push(artifact);
        }
        groups
    }
}
