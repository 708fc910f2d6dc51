//! Durable cache of the last credential pair that authenticated successfully.
//!
//! Pure I/O. Nothing here checks whether credentials are still valid; the
//! client lifecycle decides when a pair is worth persisting.

mod file;

use async_trait::async_trait;
use gemgate_upstream::Credentials;

pub use file::FileCredentialStore;

pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serde json error: {0}")]
    Serde(#[from] serde_json::Error),
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Returns `None` when nothing usable is persisted, including when the
    /// file is missing, unreadable, or corrupted.
    async fn load(&self) -> Option<Credentials>;

    /// Overwrites the persisted pair, creating parent directories as needed.
    async fn save(&self, credentials: &Credentials) -> StorageResult<()>;

    /// Whether a persisted file currently exists. Never reads its content.
    async fn exists(&self) -> bool;
}
