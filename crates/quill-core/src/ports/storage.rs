//! File storage port.

use async_trait::async_trait;

/// Stores uploaded binaries and hands back a stable public path. The core
/// persists only the returned path string (as a post's cover image).
#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Store `bytes` under a name derived from `filename`; returns the
    /// public path of the stored file.
    async fn store(&self, filename: &str, bytes: &[u8]) -> Result<String, StorageError>;
}

/// File storage errors.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("I/O failure: {0}")]
    Io(String),

    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),
}
