//! Upload directory management.
//!
//! Stored files keep the client's original filename behind a random hex
//! prefix, so repeated uploads of the same file never collide. Files for
//! successful predictions are kept indefinitely; the predict flow removes
//! the file again when a later step fails.

use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("failed to create upload directory {dir}: {source}")]
    CreateDir {
        dir: String,
        source: std::io::Error,
    },
    #[error("failed to write upload {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },
}

/// Filesystem store for uploaded images.
#[derive(Clone)]
pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    /// Open the store, creating the directory if absent.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, UploadError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|source| UploadError::CreateDir {
            dir: dir.display().to_string(),
            source,
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Absolute path of a stored filename.
    pub fn path_of(&self, filename: &str) -> PathBuf {
        self.dir.join(filename)
    }

    /// Write `bytes` under `{random-hex}_{original}` and return the stored
    /// filename.
    pub async fn save(&self, original: &str, bytes: &[u8]) -> Result<String, UploadError> {
        let filename = format!("{}_{}", Uuid::new_v4().simple(), original);
        let path = self.dir.join(&filename);

        tokio::fs::write(&path, bytes)
            .await
            .map_err(|source| UploadError::Write {
                path: path.display().to_string(),
                source,
            })?;

        tracing::debug!(filename = %filename, bytes = bytes.len(), "upload stored");
        Ok(filename)
    }

    /// Best-effort removal, used as compensating cleanup when a prediction
    /// fails after its upload was written. Logs and swallows errors so the
    /// original failure stays the one surfaced.
    pub async fn remove(&self, filename: &str) {
        let path = self.dir.join(filename);
        if let Err(err) = tokio::fs::remove_file(&path).await {
            tracing::warn!(path = %path.display(), error = %err, "failed to remove stored upload");
        }
    }
}
