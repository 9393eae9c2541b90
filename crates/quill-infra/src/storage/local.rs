//! Local-disk file storage.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use uuid::Uuid;

use quill_core::ports::{FileStorage, StorageError};

/// Stores uploads under a directory on the local filesystem and returns
/// paths below a configurable public prefix.
pub struct LocalFileStorage {
    root: PathBuf,
    public_prefix: String,
}

impl LocalFileStorage {
    pub fn new(root: impl Into<PathBuf>, public_prefix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_prefix: public_prefix.into(),
        }
    }
}

#[async_trait]
impl FileStorage for LocalFileStorage {
    async fn store(&self, filename: &str, bytes: &[u8]) -> Result<String, StorageError> {
        // The client-supplied name only contributes its extension; the
        // stored name is a fresh uuid, so path traversal cannot occur.
        let extension = Path::new(filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .filter(|ext| ext.chars().all(|c| c.is_ascii_alphanumeric()))
            .map(|ext| ext.to_ascii_lowercase())
            .unwrap_or_else(|| "bin".to_string());
        let stored_name = format!("{}.{extension}", Uuid::new_v4());

        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| StorageError::Io(e.to_string()))?;
        tokio::fs::write(self.root.join(&stored_name), bytes)
            .await
            .map_err(|e| StorageError::Io(e.to_string()))?;

        tracing::debug!(file = %stored_name, size = bytes.len(), "Stored upload");

        Ok(format!(
            "{}/{stored_name}",
            self.public_prefix.trim_end_matches('/')
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir() -> PathBuf {
        std::env::temp_dir().join(format!("quill-storage-{}", Uuid::new_v4()))
    }

    #[tokio::test]
    async fn store_writes_the_file_and_returns_a_public_path() {
        let dir = scratch_dir();
        let storage = LocalFileStorage::new(&dir, "/uploads");

        let path = storage.store("cover.PNG", b"fake image").await.unwrap();

        assert!(path.starts_with("/uploads/"));
        assert!(path.ends_with(".png"));
        let stored = dir.join(path.rsplit('/').next().unwrap());
        assert_eq!(tokio::fs::read(stored).await.unwrap(), b"fake image");

        tokio::fs::remove_dir_all(dir).await.unwrap();
    }

    #[tokio::test]
    async fn suspicious_extensions_fall_back_to_bin() {
        let dir = scratch_dir();
        let storage = LocalFileStorage::new(&dir, "/uploads");

        let path = storage.store("../..//etc/passwd%00", b"data").await.unwrap();

        assert!(path.ends_with(".bin"));

        tokio::fs::remove_dir_all(dir).await.unwrap();
    }
}
