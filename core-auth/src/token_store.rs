//! Token Persistence
//!
//! Tokens live in a JSON dotfile under the output directory so the
//! interactive sign-in only has to happen once per directory. The file is
//! rewritten wholesale after sign-in and after every refresh.
//!
//! ## Security
//!
//! - Token values are never logged
//! - A corrupted token file is reported, not silently replaced; deleting the
//!   file forces a fresh interactive sign-in

use crate::error::{AuthError, Result};
use crate::types::OAuthTokens;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// On-disk representation of the token set.
///
/// `expire_time` is an absolute Unix timestamp so remaining validity
/// survives process restarts.
#[derive(Debug, Serialize, Deserialize)]
struct StoredTokens {
    access_token: String,
    expire_time: i64,
    refresh_token: String,
}

/// File-backed token storage.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    /// Create a store backed by the given file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted token set.
    ///
    /// Returns `Ok(None)` when the file does not exist yet and
    /// [`AuthError::TokenCorrupted`] when it exists but cannot be parsed.
    pub async fn load(&self) -> Result<Option<OAuthTokens>> {
        let data = match tokio::fs::read(&self.path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No token file found");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let stored: StoredTokens =
            serde_json::from_slice(&data).map_err(|e| AuthError::TokenCorrupted {
                path: self.path.clone(),
                reason: e.to_string(),
            })?;

        let expires_at = DateTime::<Utc>::from_timestamp(stored.expire_time, 0).ok_or_else(|| {
            AuthError::TokenCorrupted {
                path: self.path.clone(),
                reason: format!("expire_time {} out of range", stored.expire_time),
            }
        })?;

        debug!(path = %self.path.display(), "Loaded persisted tokens");

        Ok(Some(OAuthTokens {
            access_token: stored.access_token,
            refresh_token: stored.refresh_token,
            expires_at,
        }))
    }

    /// Persist the token set, overwriting any previous contents.
    pub async fn save(&self, tokens: &OAuthTokens) -> Result<()> {
        let stored = StoredTokens {
            access_token: tokens.access_token.clone(),
            expire_time: tokens.expires_at.timestamp(),
            refresh_token: tokens.refresh_token.clone(),
        };

        let json = serde_json::to_vec(&stored)
            .map_err(|e| AuthError::Other(format!("Failed to serialize tokens: {}", e)))?;

        tokio::fs::write(&self.path, json).await?;

        info!(path = %self.path.display(), "Tokens persisted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_load_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join(".token.json"));
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_then_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join(".token.json"));

        let tokens = OAuthTokens::new("access".to_string(), "refresh".to_string(), 3600);
        store.save(&tokens).await.unwrap();

        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded.access_token, "access");
        assert_eq!(loaded.refresh_token, "refresh");
        // Timestamps are truncated to whole seconds on disk
        assert_eq!(loaded.expires_at.timestamp(), tokens.expires_at.timestamp());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".token.json");
        tokio::fs::write(&path, b"{not json").await.unwrap();

        let store = FileTokenStore::new(&path);
        let result = store.load().await;
        assert!(matches!(result, Err(AuthError::TokenCorrupted { .. })));
    }

    #[tokio::test]
    async fn test_save_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join(".token.json"));

        let first = OAuthTokens::new("a1".to_string(), "r1".to_string(), 3600);
        let second = OAuthTokens::new("a2".to_string(), "r2".to_string(), 3600);
        store.save(&first).await.unwrap();
        store.save(&second).await.unwrap();

        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded.access_token, "a2");
        assert_eq!(loaded.refresh_token, "r2");
    }
}
