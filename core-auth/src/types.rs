use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::error::{AuthError, Result};

/// OAuth 2.0 token set.
///
/// Contains the access token, refresh token, and expiration time for an
/// authenticated session. Refresh replaces the whole set in place; the new
/// set is persisted immediately afterwards.
///
/// # Security
///
/// Tokens should never be logged. The `Debug` implementation redacts
/// sensitive values.
///
/// # Examples
///
/// ```
/// use core_auth::OAuthTokens;
///
/// let tokens = OAuthTokens::new(
///     "access_token".to_string(),
///     "refresh_token".to_string(),
///     3600, // 1 hour
/// );
/// assert!(!tokens.is_expired_with_buffer(60));
/// ```
#[derive(Clone, Serialize, Deserialize)]
pub struct OAuthTokens {
    /// The access token used for API requests
    pub access_token: String,
    /// The refresh token used to obtain new access tokens
    pub refresh_token: String,
    /// When the access token expires (UTC)
    pub expires_at: chrono::DateTime<chrono::Utc>,
}

impl OAuthTokens {
    /// Create a new token set expiring `expires_in` seconds from now.
    pub fn new(access_token: String, refresh_token: String, expires_in: i64) -> Self {
        Self {
            access_token,
            refresh_token,
            expires_at: chrono::Utc::now() + chrono::Duration::seconds(expires_in),
        }
    }

    /// Check whether the access token expires within `buffer_seconds`.
    ///
    /// Callers refresh when this returns `true` so API requests never go out
    /// with a credential about to lapse mid-flight.
    pub fn is_expired_with_buffer(&self, buffer_seconds: i64) -> bool {
        let now = chrono::Utc::now();
        let buffer = chrono::Duration::seconds(buffer_seconds);
        now >= self.expires_at - buffer
    }
}

// Custom Debug implementation to avoid logging tokens
impl fmt::Debug for OAuthTokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthTokens")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// OAuth client registration.
///
/// Loaded from a JSON file supplied on the command line; both fields are
/// required.
///
/// # Examples
///
/// ```no_run
/// use core_auth::ClientConfig;
///
/// let config = ClientConfig::load("client_config.json").unwrap();
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    pub client_id: String,
    pub client_secret: String,
}

impl ClientConfig {
    /// Load the client configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::ClientConfig`] when the file is missing,
    /// unparseable, or either field is empty.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AuthError::ClientConfig(format!("cannot read {}: {}", path.display(), e))
        })?;

        let config: ClientConfig = serde_json::from_str(&contents).map_err(|e| {
            AuthError::ClientConfig(format!("cannot parse {}: {}", path.display(), e))
        })?;

        if config.client_id.is_empty() || config.client_secret.is_empty() {
            return Err(AuthError::ClientConfig(format!(
                "client_id and client_secret required within {}",
                path.display()
            )));
        }

        Ok(config)
    }
}
