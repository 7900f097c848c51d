//! # Host Bridge Traits
//!
//! Platform abstraction traits that the sync core depends on.
//!
//! ## Overview
//!
//! This crate defines the contract between the sync engine and everything it
//! treats as an external collaborator. Each trait represents a capability the
//! core requires but that is implemented elsewhere:
//!
//! - [`HttpClient`](http::HttpClient) - Async HTTP operations with retry and
//!   streaming downloads
//! - [`MediaCatalog`](catalog::MediaCatalog) - Paginated remote listing and
//!   batched identity resolution
//! - [`UserPrompt`](prompt::UserPrompt) - Blocking yes/no confirmation, the
//!   only interactive point in the core
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type.
//! Implementations should convert their own errors to `BridgeError` and
//! provide actionable error messages.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` bounds so they can be shared
//! across async tasks behind `Arc<dyn Trait>`.

pub mod catalog;
pub mod error;
pub mod http;
pub mod prompt;

pub use error::BridgeError;

// Re-export commonly used types
pub use catalog::{MediaCatalog, MediaItem};
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
pub use prompt::UserPrompt;
