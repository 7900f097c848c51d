//! # Authentication Module
//!
//! OAuth 2.0 authorization for the remote photo library.
//!
//! ## Overview
//!
//! The sync core only needs one capability from this crate: an
//! [`Authenticator`] that produces a non-expired credential on demand. The
//! rest is the machinery behind that capability:
//!
//! - **OAuth Flow** (`oauth`): authorization-code flow with PKCE, token
//!   exchange and refresh
//! - **Callback Server** (`callback`): one-shot localhost listener that
//!   receives the authorization code during interactive sign-in
//! - **Token Store** (`token_store`): JSON token file under the output
//!   directory, rewritten after sign-in and after every refresh
//! - **Auth Manager** (`manager`): ties the pieces together and implements
//!   [`Authenticator`]

pub mod callback;
pub mod error;
pub mod manager;
pub mod oauth;
pub mod token_store;
pub mod types;

pub use error::{AuthError, Result};
pub use manager::{AuthManager, Authenticator};
pub use oauth::{OAuthConfig, OAuthFlowManager, PkceVerifier};
pub use token_store::FileTokenStore;
pub use types::{ClientConfig, OAuthTokens};
