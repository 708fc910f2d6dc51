use std::path::{Path, PathBuf};

use async_trait::async_trait;
use gemgate_upstream::Credentials;
use tracing::{debug, warn};

use crate::{CredentialStore, StorageResult};

/// Stores the credential pair as a small JSON document at a fixed path.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn load(&self) -> Option<Credentials> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return None,
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "credential file unreadable");
                return None;
            }
        };
        match serde_json::from_slice::<Credentials>(&raw) {
            Ok(creds) if !creds.secure_1psid.trim().is_empty() => Some(creds),
            Ok(_) => {
                warn!(path = %self.path.display(), "credential file has an empty primary secret");
                None
            }
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "credential file corrupted");
                None
            }
        }
    }

    async fn save(&self, credentials: &Credentials) -> StorageResult<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        let body = serde_json::to_vec(credentials)?;
        tokio::fs::write(&self.path, body).await?;
        debug!(path = %self.path.display(), "credentials persisted");
        Ok(())
    }

    async fn exists(&self) -> bool {
        tokio::fs::try_exists(&self.path).await.unwrap_or(false)
    }
}
