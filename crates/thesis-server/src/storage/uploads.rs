//! Uploaded document storage
//!
//! Files land in a single flat directory. Stored names are prefixed with
//! a UUID so two uploads with the same base name never overwrite each
//! other, and client-supplied names are sanitized down to one safe path
//! component before they ever touch the filesystem.

use anyhow::{Context, Result};
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::info;
use uuid::Uuid;

/// Document types accepted for thesis uploads
const ALLOWED_EXTENSIONS: &[&str] = &["pdf", "doc", "docx"];

pub struct UploadStore {
    root: PathBuf,
}

impl UploadStore {
    pub async fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root)
            .await
            .with_context(|| format!("Failed to create upload directory {}", root.display()))?;
        info!("Upload storage ready at {}", root.display());
        Ok(Self { root })
    }

    /// Whether the filename carries an allowed document extension
    /// (matched case-insensitively)
    pub fn is_allowed(filename: &str) -> bool {
        match filename.rsplit_once('.') {
            Some((_, ext)) => ALLOWED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()),
            None => false,
        }
    }

    /// Reduce a client-supplied filename to a single safe path component:
    /// directory parts are dropped, characters outside `[A-Za-z0-9._-]`
    /// become underscores, and leading dots are stripped. Returns `None`
    /// when nothing usable remains.
    pub fn sanitize(filename: &str) -> Option<String> {
        let base = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
        let cleaned: String = base
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        let cleaned = cleaned.trim_start_matches('.');
        if cleaned.is_empty() {
            None
        } else {
            Some(cleaned.to_string())
        }
    }

    /// Persist an upload under a UUID-prefixed name and return the stored
    /// name the caller should record
    pub async fn save(&self, filename: &str, data: &[u8]) -> Result<String> {
        let safe = Self::sanitize(filename)
            .ok_or_else(|| anyhow::anyhow!("Unusable upload filename: {filename}"))?;
        let stored = format!("{}_{}", Uuid::new_v4(), safe);
        let path = self.root.join(&stored);

        tokio::fs::write(&path, data)
            .await
            .with_context(|| format!("Failed to write upload {}", path.display()))?;

        info!("Stored upload {} ({} bytes)", stored, data.len());
        Ok(stored)
    }

    /// Read a stored upload back. Names that do not survive sanitization
    /// unchanged are treated as missing, so a crafted path can never
    /// escape the upload directory.
    pub async fn read(&self, stored_name: &str) -> Result<Option<Vec<u8>>> {
        let safe = match Self::sanitize(stored_name) {
            Some(s) if s == stored_name => s,
            _ => return Ok(None),
        };
        let path = self.root.join(safe);

        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(anyhow::Error::new(e)
                .context(format!("Failed to read upload {}", path.display()))),
        }
    }

    /// Content type for a stored name, derived from its extension
    pub fn content_type(stored_name: &str) -> &'static str {
        let ext = stored_name
            .rsplit_once('.')
            .map(|(_, e)| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("pdf") => "application/pdf",
            Some("doc") => "application/msword",
            Some("docx") => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            _ => "application/octet-stream",
        }
    }
}
