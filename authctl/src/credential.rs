//! Session credential and its local persistence.

use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use auth_core::{AuthError, AuthResult};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

/// Opaque bearer token plus what is known about it.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    /// Lifetime in seconds. `None` and `Some(0)` both mean the token never expires.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl_seconds: Option<i64>,
}

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            subject: None,
            ttl_seconds: None,
        }
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn with_ttl(mut self, ttl_seconds: Option<i64>) -> Self {
        self.ttl_seconds = ttl_seconds;
        self
    }
}

/// `now + ttl` for a positive TTL, otherwise no expiry.
pub fn expiry_from_ttl(ttl_seconds: Option<i64>, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    match ttl_seconds {
        Some(ttl) if ttl > 0 => Some(now + Duration::seconds(ttl)),
        _ => None,
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"<redacted>")
            .field("subject", &self.subject)
            .field("ttl_seconds", &self.ttl_seconds)
            .finish()
    }
}

/// The single persisted session slot.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// The stored credential, or `None` when logged out.
    async fn read(&self) -> AuthResult<Option<Credential>>;
    /// Replace whatever is stored.
    async fn write(&self, credential: &Credential) -> AuthResult<()>;
    /// Remove the stored credential; a no-op when nothing is stored.
    async fn clear(&self) -> AuthResult<()>;
}

/// JSON record on disk, replaced atomically via write-to-temp-then-rename.
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

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(format!(".{}.tmp", uuid::Uuid::new_v4()));
        PathBuf::from(name)
    }

    /// Make the rename itself durable.
    #[cfg(unix)]
    async fn sync_parent(&self) -> std::io::Result<()> {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => {
                fs::File::open(parent).await?.sync_all().await
            }
            _ => fs::File::open(".").await?.sync_all().await,
        }
    }

    #[cfg(not(unix))]
    async fn sync_parent(&self) -> std::io::Result<()> {
        Ok(())
    }

    async fn write_temp(&self, temp_path: &Path, content: &[u8]) -> std::io::Result<()> {
        let mut options = fs::OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        options.mode(0o600);

        let mut file = options.open(temp_path).await?;
        file.write_all(content).await?;
        file.sync_all().await
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn read(&self) -> AuthResult<Option<Credential>> {
        let data = match fs::read(&self.path).await {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let credential: Credential = serde_json::from_slice(&data).map_err(|e| {
            AuthError::Credential(anyhow::anyhow!(
                "failed to parse credential file {}: {}",
                self.path.display(),
                e
            ))
        })?;

        if credential.token.is_empty() {
            return Ok(None);
        }
        Ok(Some(credential))
    }

    async fn write(&self, credential: &Credential) -> AuthResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let content = serde_json::to_vec_pretty(credential)?;
        let temp_path = self.temp_path();

        if let Err(e) = self.write_temp(&temp_path, &content).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        if let Err(e) = fs::rename(&temp_path, &self.path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }
        self.sync_parent().await?;

        tracing::debug!(path = %self.path.display(), "Credential written");
        Ok(())
    }

    async fn clear(&self) -> AuthResult<()> {
        match fs::remove_file(&self.path).await {
            Ok(()) => {
                tracing::debug!(path = %self.path.display(), "Credential removed");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-process store, for tests and embedding.
#[derive(Default)]
pub struct MemoryCredentialStore {
    slot: RwLock<Option<Credential>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn read(&self) -> AuthResult<Option<Credential>> {
        Ok(self.slot.read().await.clone())
    }

    async fn write(&self, credential: &Credential) -> AuthResult<()> {
        *self.slot.write().await = Some(credential.clone());
        Ok(())
    }

    async fn clear(&self) -> AuthResult<()> {
        *self.slot.write().await = None;
        Ok(())
    }
}
