//! Durable token storage.
//!
//! Both the session manager and the API client go through this store: the
//! session manager writes tokens at login, the client reads the access token
//! at send time and rotates it after a refresh. Keeping the store as the
//! single source of truth is what lets a token rotated by one in-flight
//! request be picked up by the next one.

use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::{ApiError, ApiResult};

/// Storage keys, fixed by the wire format of the credentials file.
pub const ACCESS_TOKEN_KEY: &str = "access_token";
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoredTokens {
    #[serde(rename = "access_token", skip_serializing_if = "Option::is_none")]
    pub access: Option<String>,
    #[serde(rename = "refresh_token", skip_serializing_if = "Option::is_none")]
    pub refresh: Option<String>,
}

#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn access_token(&self) -> ApiResult<Option<String>>;

    async fn refresh_token(&self) -> ApiResult<Option<String>>;

    /// Persist both tokens, as written by a successful login.
    async fn store_tokens(&self, access: &str, refresh: &str) -> ApiResult<()>;

    /// Rotate only the access token, keeping the stored refresh token.
    async fn store_access_token(&self, access: &str) -> ApiResult<()>;

    /// Clear both tokens together. Callers must never clear one without the
    /// other; a half-cleared store leaves the session inconsistent.
    async fn clear(&self) -> ApiResult<()>;
}

/// File-backed store: a small JSON document holding the two token slots.
/// Reads go to disk on every call so that concurrent writers are observed.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    fn load(&self) -> ApiResult<StoredTokens> {
        match std::fs::read(&self.path) {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|err| ApiError::internal(format!("corrupt credentials file: {err}"))),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(StoredTokens::default()),
            Err(err) => Err(ApiError::internal(format!("failed to read credentials: {err}"))),
        }
    }

    fn save(&self, tokens: &StoredTokens) -> ApiResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|err| ApiError::internal(format!("failed to create credentials dir: {err}")))?;
        }

        let body = serde_json::to_string_pretty(tokens)
            .map_err(|err| ApiError::internal(format!("failed to encode credentials: {err}")))?;

        std::fs::write(&self.path, body)
            .map_err(|err| ApiError::internal(format!("failed to write credentials: {err}")))
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn access_token(&self) -> ApiResult<Option<String>> {
        Ok(self.load()?.access)
    }

    async fn refresh_token(&self) -> ApiResult<Option<String>> {
        Ok(self.load()?.refresh)
    }

    async fn store_tokens(&self, access: &str, refresh: &str) -> ApiResult<()> {
        self.save(&StoredTokens {
            access: Some(access.to_string()),
            refresh: Some(refresh.to_string()),
        })
    }

    async fn store_access_token(&self, access: &str) -> ApiResult<()> {
        let mut tokens = self.load()?;
        tokens.access = Some(access.to_string());
        self.save(&tokens)
    }

    async fn clear(&self) -> ApiResult<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(ApiError::internal(format!("failed to clear credentials: {err}"))),
        }
    }
}

/// In-memory store for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    inner: Mutex<StoredTokens>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StoredTokens> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn access_token(&self) -> ApiResult<Option<String>> {
        Ok(self.lock().access.clone())
    }

    async fn refresh_token(&self) -> ApiResult<Option<String>> {
        Ok(self.lock().refresh.clone())
    }

    async fn store_tokens(&self, access: &str, refresh: &str) -> ApiResult<()> {
        let mut tokens = self.lock();
        tokens.access = Some(access.to_string());
        tokens.refresh = Some(refresh.to_string());
        Ok(())
    }

    async fn store_access_token(&self, access: &str) -> ApiResult<()> {
        self.lock().access = Some(access.to_string());
        Ok(())
    }

    async fn clear(&self) -> ApiResult<()> {
        *self.lock() = StoredTokens::default();
        Ok(())
    }
}
