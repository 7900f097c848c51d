//! Wire types for the Google Photos Library API v1

use bridge_traits::catalog::MediaItem;
use serde::Deserialize;

/// Response to `GET /v1/mediaItems`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaItemsListResponse {
    #[serde(default)]
    pub media_items: Vec<ApiMediaItem>,
    pub next_page_token: Option<String>,
}

/// Response to `GET /v1/mediaItems:batchGet`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchGetResponse {
    #[serde(default)]
    pub media_item_results: Vec<MediaItemResult>,
}

/// One entry of a batchGet response; carries either an item or an error
/// status for the requested identity.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaItemResult {
    pub media_item: Option<ApiMediaItem>,
    pub status: Option<ApiStatus>,
}

/// Per-identity error status returned by batchGet
#[derive(Debug, Deserialize)]
pub struct ApiStatus {
    #[serde(default)]
    pub code: i32,
    #[serde(default)]
    pub message: String,
}

/// A media item as returned by the API
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiMediaItem {
    pub id: String,
    pub filename: String,
    pub base_url: String,
    #[serde(default)]
    pub media_metadata: MediaMetadata,
}

#[derive(Debug, Default, Deserialize)]
pub struct MediaMetadata {
    pub video: Option<VideoMetadata>,
}

#[derive(Debug, Deserialize)]
pub struct VideoMetadata {
    pub status: Option<String>,
}

impl ApiMediaItem {
    /// Convert to the catalog item the core consumes.
    ///
    /// Returns `None` for videos the provider has not finished processing;
    /// their download locators are not usable yet, so they are excluded
    /// from listings and lookups and picked up on a later run.
    pub fn into_media_item(self) -> Option<MediaItem> {
        let is_video = self.media_metadata.video.is_some();
        if let Some(video) = &self.media_metadata.video {
            if video.status.as_deref() != Some("READY") {
                return None;
            }
        }
        Some(MediaItem {
            id: self.id,
            filename: self.filename,
            is_video,
            base_url: self.base_url,
        })
    }
}
