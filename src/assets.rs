//! Destination asset storage.
//!
//! Hosted attachments are re-uploaded to the destination platform's asset
//! store, which answers with the URL the file will be served from.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};
use uuid::Uuid;

/// What the asset store returns for an uploaded file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetResponse {
    /// Public URL of the stored file.
    pub file_url: String,
}

/// Errors raised by an asset store.
#[derive(Debug, Error)]
pub enum AssetError {
    /// File system error while writing the asset.
    #[error("IO error writing asset to {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The store refused the upload.
    #[error("asset store rejected {filename}: {reason}")]
    Rejected {
        /// Name of the rejected file.
        filename: String,
        /// Reason reported by the store.
        reason: String,
    },
}

/// Destination for attachment bytes.
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Stores `bytes` under the suggested `filename`.
    async fn store(&self, filename: &str, bytes: Vec<u8>) -> Result<AssetResponse, AssetError>;
}

/// Asset store that writes files beneath a local directory.
///
/// Each asset gets its own UUID subdirectory so that identically named files
/// from different documents never collide. URLs are built from `base_url`.
#[derive(Debug, Clone)]
pub struct DirectoryAssetStore {
    root: PathBuf,
    base_url: String,
}

impl DirectoryAssetStore {
    /// Creates a store rooted at `root`, serving files from `base_url`.
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Directory assets are written beneath.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl AssetStore for DirectoryAssetStore {
    #[instrument(skip(self, bytes), fields(bytes = bytes.len()))]
    async fn store(&self, filename: &str, bytes: Vec<u8>) -> Result<AssetResponse, AssetError> {
        if filename.is_empty() || filename.contains(['/', '\\']) || filename == ".." {
            return Err(AssetError::Rejected {
                filename: filename.to_string(),
                reason: "filename must be a single path segment".to_string(),
            });
        }

        let asset_id = Uuid::new_v4().to_string();
        let dir = self.root.join(&asset_id);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|source| AssetError::Io {
                path: dir.clone(),
                source,
            })?;

        let path = dir.join(filename);
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|source| AssetError::Io {
                path: path.clone(),
                source,
            })?;

        let file_url = format!("{}/{asset_id}/{filename}", self.base_url);
        debug!(path = %path.display(), %file_url, "asset stored");
        Ok(AssetResponse { file_url })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[tokio::test]
    async fn test_directory_store_writes_file_and_returns_url() {
        let temp_dir = TempDir::new().unwrap();
        let store = DirectoryAssetStore::new(temp_dir.path(), "https://assets.example/media/");

        let response = store.store("some.pdf", b"PDF".to_vec()).await.unwrap();

        assert!(response.file_url.starts_with("https://assets.example/media/"));
        assert!(response.file_url.ends_with("/some.pdf"));
        let asset_id = response
            .file_url
            .trim_start_matches("https://assets.example/media/")
            .trim_end_matches("/some.pdf");
        let written = std::fs::read(temp_dir.path().join(asset_id).join("some.pdf")).unwrap();
        assert_eq!(written, b"PDF");
    }

    #[tokio::test]
    async fn test_directory_store_keeps_same_names_apart() {
        let temp_dir = TempDir::new().unwrap();
        let store = DirectoryAssetStore::new(temp_dir.path(), "https://assets.example");

        let first = store.store("a.pdf", b"1".to_vec()).await.unwrap();
        let second = store.store("a.pdf", b"2".to_vec()).await.unwrap();
        assert_ne!(first.file_url, second.file_url);
    }

    #[tokio::test]
    async fn test_directory_store_rejects_path_traversal() {
        let temp_dir = TempDir::new().unwrap();
        let store = DirectoryAssetStore::new(temp_dir.path(), "https://assets.example");

        let err = store.store("../escape.pdf", Vec::new()).await.unwrap_err();
        assert!(matches!(err, AssetError::Rejected { .. }));
    }
}
