use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tempfile::NamedTempFile;
use tracing::info;

/// Numbered copies tried before giving up on a file name.
const MAX_COPIES: usize = 1000;

/// Saves downloaded artifact binaries into the export directory.
#[derive(Debug, Clone)]
pub struct Exporter {
    dir: PathBuf,
}

impl Exporter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Writes `bytes` under `file_name`, or under `name (1).pdf`, `name (2).pdf`
    /// ... when that name is taken. Existing exports are never overwritten.
    pub async fn save(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("Failed to create export dir {}", self.dir.display()))?;

        let dir = self.dir.clone();
        let file_name = sanitize_file_name(file_name);
        let len = bytes.len();
        let bytes = bytes.to_vec();
        let path = tokio::task::spawn_blocking(move || write_new_file(&dir, &file_name, &bytes))
            .await
            .context("Export task panicked")??;

        info!("Exported {len} bytes to {}", path.display());
        Ok(path)
    }
}

/// Keeps the file inside the export directory whatever the template name is.
fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '\0' => '_',
            other => other,
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "resume.pdf".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Writes into a temp file in `dir`, then links it to the first free name.
/// A partially written export never appears under its final name.
fn write_new_file(dir: &Path, file_name: &str, bytes: &[u8]) -> Result<PathBuf> {
    let mut tmp = NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temp file in {}", dir.display()))?;
    tmp.write_all(bytes).context("Failed to write export")?;
    tmp.as_file().sync_all().context("Failed to flush export")?;

    for copy in 0..MAX_COPIES {
        let candidate = dir.join(numbered_name(file_name, copy));
        match tmp.persist_noclobber(&candidate) {
            Ok(_) => return Ok(candidate),
            Err(e) if e.error.kind() == ErrorKind::AlreadyExists => tmp = e.file,
            Err(e) => {
                return Err(e.error)
                    .with_context(|| format!("Failed to write {}", candidate.display()))
            }
        }
    }
    bail!("No free file name for {file_name} in {}", dir.display())
}

/// `modern_resume.pdf` -> `modern_resume (2).pdf` for `copy == 2`.
fn numbered_name(file_name: &str, copy: usize) -> String {
    if copy == 0 {
        return file_name.to_string();
    }
    match file_name.rfind('.') {
        Some(dot) if dot > 0 => format!("{} ({copy}){}", &file_name[..dot], &file_name[dot..]),
        _ => format!("{file_name} ({copy})"),
    }
}
