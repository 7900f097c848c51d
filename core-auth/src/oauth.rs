//! OAuth 2.0 Authorization Flow with PKCE Support
//!
//! Implements RFC 6749 (OAuth 2.0) and RFC 7636 (PKCE) against the photo
//! library's authorization endpoints.
//!
//! # Overview
//!
//! The flow manager handles:
//! - Building authorization URLs with a PKCE challenge
//! - Exchanging authorization codes for tokens
//! - Refreshing access tokens
//! - State verification for CSRF protection
//!
//! # Security
//!
//! - Generates cryptographically secure random state and code verifier
//! - Validates the state parameter to prevent CSRF attacks
//! - Never logs sensitive values (tokens, codes, verifiers)

use crate::error::{AuthError, Result};
use crate::types::{ClientConfig, OAuthTokens};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest};
use bytes::Bytes;
use rand::Rng;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{instrument, warn};
use url::Url;

/// Authorization endpoint for the photo library provider
const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";

/// Token endpoint for the photo library provider
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Read-only photo library scope
const SCOPE: &str = "https://www.googleapis.com/auth/photoslibrary.readonly";

/// OAuth 2.0 provider configuration.
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    /// OAuth client ID
    pub client_id: String,
    /// OAuth client secret
    pub client_secret: String,
    /// List of OAuth scopes to request
    pub scopes: Vec<String>,
    /// Authorization endpoint URL
    pub auth_url: String,
    /// Token endpoint URL
    pub token_url: String,
}

impl OAuthConfig {
    /// Configuration for the photo library provider with read-only scope.
    pub fn photo_library(client: ClientConfig) -> Self {
        Self {
            client_id: client.client_id,
            client_secret: client.client_secret,
            scopes: vec![SCOPE.to_string()],
            auth_url: AUTH_URL.to_string(),
            token_url: TOKEN_URL.to_string(),
        }
    }
}

/// PKCE (Proof Key for Code Exchange) verifier.
///
/// Contains the code verifier that must be held during the authorization
/// flow and used when exchanging the authorization code, plus the state
/// parameter for CSRF protection. Only the challenge derived from the
/// verifier is sent during authorization.
#[derive(Debug, Clone)]
pub struct PkceVerifier {
    /// The code verifier (base64-url-encoded random string)
    verifier: String,
    /// The state parameter for CSRF protection
    state: String,
}

impl PkceVerifier {
    /// Create a new PKCE verifier with cryptographically secure random values.
    ///
    /// Generates a 32-byte random code verifier and a 16-byte random state,
    /// both URL-safe base64 encoded without padding.
    pub fn new() -> Self {
        let mut rng = rand::thread_rng();

        // Code verifier must be 43-128 characters per RFC 7636
        let mut verifier_bytes = [0u8; 32];
        rng.fill(&mut verifier_bytes);
        let verifier = URL_SAFE_NO_PAD.encode(verifier_bytes);

        let mut state_bytes = [0u8; 16];
        rng.fill(&mut state_bytes);
        let state = URL_SAFE_NO_PAD.encode(state_bytes);

        Self { verifier, state }
    }

    /// Get the code verifier string.
    pub fn verifier(&self) -> &str {
        &self.verifier
    }

    /// Get the state parameter.
    pub fn state(&self) -> &str {
        &self.state
    }

    /// Compute the code challenge from the verifier.
    ///
    /// Uses the S256 method: BASE64URL(SHA256(code_verifier))
    pub fn challenge(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.verifier.as_bytes());
        let hash = hasher.finalize();
        URL_SAFE_NO_PAD.encode(hash)
    }
}

impl Default for PkceVerifier {
    fn default() -> Self {
        Self::new()
    }
}

/// OAuth 2.0 flow manager.
///
/// Handles the complete authorization code flow with PKCE. The redirect URI
/// is supplied per flow because the local callback listener binds an
/// ephemeral port.
pub struct OAuthFlowManager {
    config: OAuthConfig,
    http_client: Arc<dyn HttpClient>,
}

impl OAuthFlowManager {
    /// Create a new OAuth flow manager with the given configuration.
    pub fn new(config: OAuthConfig, http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            config,
            http_client,
        }
    }

    /// Build the authorization URL with PKCE challenge.
    ///
    /// Returns both the URL the user should visit and the PKCE verifier,
    /// which the caller must hold for the code exchange.
    #[instrument(skip(self, redirect_uri))]
    pub fn build_auth_url(&self, redirect_uri: &str) -> Result<(String, PkceVerifier)> {
        let verifier = PkceVerifier::new();
        let challenge = verifier.challenge();

        let mut url = Url::parse(&self.config.auth_url)
            .map_err(|e| AuthError::Other(format!("Invalid auth URL: {}", e)))?;

        {
            let mut query = url.query_pairs_mut();
            query.append_pair("client_id", &self.config.client_id);
            query.append_pair("redirect_uri", redirect_uri);
            query.append_pair("response_type", "code");
            query.append_pair("scope", &self.config.scopes.join(" "));
            query.append_pair("state", verifier.state());
            query.append_pair("code_challenge", &challenge);
            query.append_pair("code_challenge_method", "S256");
            query.append_pair("access_type", "offline"); // Request refresh token
        }

        tracing::debug!("Built authorization URL");

        Ok((url.to_string(), verifier))
    }

    /// Exchange an authorization code for OAuth tokens.
    ///
    /// Called after the callback listener receives the authorization code
    /// and state.
    ///
    /// # Errors
    ///
    /// Returns an error if the state does not match (CSRF protection), the
    /// code is invalid, or the token endpoint rejects the request.
    #[instrument(skip(self, code, verifier, redirect_uri))]
    pub async fn exchange_code(
        &self,
        code: &str,
        state: &str,
        verifier: &PkceVerifier,
        redirect_uri: &str,
    ) -> Result<OAuthTokens> {
        // Verify state to prevent CSRF attacks
        if state != verifier.state() {
            warn!("OAuth state mismatch during code exchange");
            return Err(AuthError::StateMismatch {
                expected: verifier.state().to_string(),
                actual: state.to_string(),
            });
        }

        let mut params = HashMap::new();
        params.insert("grant_type", "authorization_code");
        params.insert("code", code);
        params.insert("redirect_uri", redirect_uri);
        params.insert("client_id", &self.config.client_id);
        params.insert("client_secret", &self.config.client_secret);
        params.insert("code_verifier", verifier.verifier());

        tracing::debug!("Exchanging authorization code for tokens");

        let response = self.post_token_request(&params).await?;

        if !response.is_success() {
            let status = response.status;
            let error_body = response
                .text()
                .unwrap_or_else(|_| "Unable to read error response".to_string());

            warn!(
                status = status,
                error = %error_body,
                "Token exchange failed while exchanging authorization code"
            );

            return Err(AuthError::InvalidAuthCode(format!(
                "Token endpoint returned {}: {}",
                status, error_body
            )));
        }

        let token_response: TokenResponse = response
            .json()
            .map_err(|e| AuthError::Other(format!("Failed to parse token response: {}", e)))?;

        let refresh_token = token_response.refresh_token.ok_or_else(|| {
            AuthError::AuthorizationFailed("no refresh token granted by provider".to_string())
        })?;

        tracing::info!(
            "Successfully exchanged code for tokens (expires in {}s)",
            token_response.expires_in
        );

        Ok(OAuthTokens::new(
            token_response.access_token,
            refresh_token,
            token_response.expires_in,
        ))
    }

    /// Refresh an access token using a refresh token.
    ///
    /// Providers may omit the refresh token in the response; the old one is
    /// carried forward in that case. Transient endpoint failures are retried
    /// with exponential backoff.
    #[instrument(skip(self, refresh_token))]
    pub async fn refresh_access_token(&self, refresh_token: &str) -> Result<OAuthTokens> {
        let mut params = HashMap::new();
        params.insert("grant_type", "refresh_token");
        params.insert("refresh_token", refresh_token);
        params.insert("client_id", &self.config.client_id);
        params.insert("client_secret", &self.config.client_secret);

        tracing::debug!("Refreshing access token");

        let mut attempts = 0;
        const MAX_RETRIES: u32 = 3;

        loop {
            attempts += 1;

            let response = self.post_token_request(&params).await.map_err(|e| {
                AuthError::TokenRefreshFailed(e.to_string())
            })?;

            if response.is_success() {
                let token_response: TokenResponse = response.json().map_err(|e| {
                    AuthError::Other(format!("Failed to parse token response: {}", e))
                })?;

                tracing::info!(
                    "Successfully refreshed token (expires in {}s)",
                    token_response.expires_in
                );

                return Ok(OAuthTokens::new(
                    token_response.access_token,
                    token_response
                        .refresh_token
                        .unwrap_or_else(|| refresh_token.to_string()),
                    token_response.expires_in,
                ));
            }

            let status = response.status;

            if response.is_client_error() {
                let error_body = response
                    .text()
                    .unwrap_or_else(|_| "Unable to read error response".to_string());

                warn!(
                    status = status,
                    error = %error_body,
                    "Token refresh failed without retry"
                );

                return Err(AuthError::TokenRefreshFailed(format!(
                    "Token endpoint returned {}: {}",
                    status, error_body
                )));
            }

            if attempts >= MAX_RETRIES {
                let error_body = response
                    .text()
                    .unwrap_or_else(|_| "Unable to read error response".to_string());

                return Err(AuthError::TokenRefreshFailed(format!(
                    "Token refresh failed after {} attempts. Last error: {} - {}",
                    attempts, status, error_body
                )));
            }

            let delay = Duration::from_millis(100 * 2u64.pow(attempts - 1));
            warn!(
                status = status,
                attempts = attempts,
                delay_ms = delay.as_millis(),
                "Token refresh failed, retrying"
            );
            sleep(delay).await;
        }
    }

    async fn post_token_request(
        &self,
        params: &HashMap<&str, &str>,
    ) -> Result<bridge_traits::http::HttpResponse> {
        let encoded_body = serde_urlencoded::to_string(params)
            .map_err(|e| AuthError::Other(format!("Failed to encode token request: {}", e)))?;

        let request = HttpRequest::new(HttpMethod::Post, self.config.token_url.clone())
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(Bytes::from(encoded_body));

        self.http_client
            .execute(request)
            .await
            .map_err(|e| AuthError::NetworkError(e.to_string()))
    }
}

/// Token response from the OAuth provider.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    3600 // Default to 1 hour if not specified
}
