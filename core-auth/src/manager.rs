//! Authentication Manager
//!
//! Exposes the single capability the rest of the system depends on: an
//! [`Authenticator`] that always hands out a fresh-enough credential. The
//! manager restores tokens from the token file when possible, runs the
//! interactive browser flow otherwise, and transparently refreshes and
//! persists on every later use.

use crate::callback::CallbackServer;
use crate::error::Result;
use crate::oauth::{OAuthConfig, OAuthFlowManager};
use crate::token_store::FileTokenStore;
use crate::types::OAuthTokens;
use async_trait::async_trait;
use bridge_traits::http::HttpClient;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

/// Refresh when fewer than this many seconds of validity remain.
const REFRESH_BUFFER_SECS: i64 = 60;

/// Credential source for outgoing remote calls.
///
/// Implementations may refresh and persist internally; callers only rely on
/// the returned credential being valid for the immediate request.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// A credential with enough remaining validity for one request.
    async fn current_credential(&self) -> Result<OAuthTokens>;
}

/// Production [`Authenticator`] backed by the OAuth flow and the token file.
pub struct AuthManager {
    flow: OAuthFlowManager,
    store: FileTokenStore,
    tokens: Mutex<OAuthTokens>,
}

impl AuthManager {
    /// Restore a session from the token file, or run the interactive
    /// sign-in flow when no tokens are persisted yet.
    ///
    /// The interactive flow prints an authorization URL, blocks on the
    /// one-shot callback listener, exchanges the received code, and persists
    /// the resulting tokens before returning.
    #[instrument(skip_all)]
    pub async fn sign_in_or_restore(
        config: OAuthConfig,
        store: FileTokenStore,
        http_client: Arc<dyn HttpClient>,
    ) -> Result<Self> {
        let flow = OAuthFlowManager::new(config, http_client);

        let tokens = match store.load().await? {
            Some(tokens) => {
                debug!("Restored tokens from token file");
                tokens
            }
            None => {
                info!("No persisted tokens, starting interactive sign-in");
                let tokens = Self::interactive_sign_in(&flow).await?;
                store.save(&tokens).await?;
                tokens
            }
        };

        Ok(Self {
            flow,
            store,
            tokens: Mutex::new(tokens),
        })
    }

    async fn interactive_sign_in(flow: &OAuthFlowManager) -> Result<OAuthTokens> {
        let server = CallbackServer::bind().await?;
        let redirect_uri = server.redirect_uri();
        let (auth_url, verifier) = flow.build_auth_url(&redirect_uri)?;

        println!("Waiting for authorization, go to:\n  {}", auth_url);

        let callback = server.wait_for_callback().await?;
        debug!("Authorization code received, exchanging for tokens");

        flow.exchange_code(&callback.code, &callback.state, &verifier, &redirect_uri)
            .await
    }
}

#[async_trait]
impl Authenticator for AuthManager {
    async fn current_credential(&self) -> Result<OAuthTokens> {
        let mut tokens = self.tokens.lock().await;

        if tokens.is_expired_with_buffer(REFRESH_BUFFER_SECS) {
            debug!("Access token expiring, refreshing");
            let refreshed = self.flow.refresh_access_token(&tokens.refresh_token).await?;
            self.store.save(&refreshed).await?;
            *tokens = refreshed;
        }

        Ok(tokens.clone())
    }
}
