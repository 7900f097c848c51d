//! Remote Media Catalog Abstraction
//!
//! The sync core never talks to a provider API directly. It sees the remote
//! library through this trait: a paginated listing of downloadable items and
//! a batched lookup that resolves stored identities back to fresh items.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::error::Result;

/// One downloadable item in the remote library.
///
/// Items are re-fetched on every run; the download locator (`base_url`) is
/// short-lived and must never be cached across runs. Only `id` is stable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaItem {
    /// Opaque stable identity, unique per remote item across runs
    pub id: String,
    /// Display filename as reported by the remote library; not unique
    pub filename: String,
    /// Whether the item is a video (affects the download URL suffix)
    pub is_video: bool,
    /// Base download locator returned by the provider
    pub base_url: String,
}

impl MediaItem {
    /// Full-resolution download URL for this item.
    ///
    /// Videos and images use different locator suffixes on the provider side.
    pub fn download_url(&self) -> String {
        if self.is_video {
            format!("{}=dv", self.base_url)
        } else {
            format!("{}=d", self.base_url)
        }
    }
}

/// Remote media catalog trait
///
/// Implementations own pagination tokens, credential freshness, and provider
/// specific filtering (e.g. excluding videos that are still processing).
///
/// # Example
///
/// ```ignore
/// use bridge_traits::catalog::MediaCatalog;
///
/// async fn count_items(catalog: &dyn MediaCatalog) -> Result<usize> {
///     let mut total = 0;
///     let mut cursor = None;
///     loop {
///         let (items, next) = catalog.list_items(cursor).await?;
///         total += items.len();
///         match next {
///             Some(token) => cursor = Some(token),
///             None => return Ok(total),
///         }
///     }
/// }
/// ```
#[async_trait]
pub trait MediaCatalog: Send + Sync {
    /// Fetch one page of the remote library.
    ///
    /// Returns the items on that page plus an opaque cursor for the next
    /// page, or `None` when the listing is exhausted. Items the provider
    /// reports as not yet downloadable are excluded from the page.
    async fn list_items(&self, cursor: Option<String>) -> Result<(Vec<MediaItem>, Option<String>)>;

    /// Resolve stored identities back to downloadable items.
    ///
    /// Batched internally in provider-sized chunks. Identities that fail
    /// lookup (deleted remotely, or returned with an error status) are
    /// absent from the result; the error is surfaced as a diagnostic only.
    async fn resolve_items(&self, ids: &[String]) -> Result<HashMap<String, MediaItem>>;
}
