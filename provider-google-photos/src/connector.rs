//! Google Photos API connector implementation
//!
//! Implements the `MediaCatalog` trait for the Google Photos Library API v1.

use async_trait::async_trait;
use bridge_traits::catalog::{MediaCatalog, MediaItem};
use bridge_traits::error::Result;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, RetryPolicy};
use core_auth::Authenticator;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::error::GooglePhotosError;
use crate::types::{ApiMediaItem, BatchGetResponse, MediaItemsListResponse};

/// Google Photos API base URL
const PHOTOS_API_BASE: &str = "https://photoslibrary.googleapis.com/v1";

/// Items requested per listing page
const PAGE_SIZE: u32 = 100;

/// Maximum identities per batchGet request (API limit)
pub const MAX_IDS_PER_BATCH_GET: usize = 50;

/// Google Photos API connector
///
/// Implements `MediaCatalog` for the Photos Library API v1.
///
/// # Features
///
/// - Paginated media item listing; videos still processing are excluded
/// - Batched identity resolution, chunked at the API's batchGet limit
/// - Exponential backoff for rate limiting and server errors
/// - Every request carries a fresh credential from the [`Authenticator`]
pub struct GooglePhotosConnector {
    /// HTTP client for API requests
    http_client: Arc<dyn HttpClient>,

    /// Credential source; consulted before every request
    authenticator: Arc<dyn Authenticator>,
}

impl GooglePhotosConnector {
    /// Create a new Google Photos connector
    pub fn new(http_client: Arc<dyn HttpClient>, authenticator: Arc<dyn Authenticator>) -> Self {
        Self {
            http_client,
            authenticator,
        }
    }

    /// Execute an API GET with a fresh bearer token and retry logic
    ///
    /// Implements exponential backoff for rate limiting and transient
    /// errors. The credential is re-fetched per attempt so a refresh that
    /// happens mid-backoff is picked up. The transport is asked for single
    /// attempts so this loop is the only retry layer.
    #[instrument(skip(self), fields(url = %url))]
    async fn execute_with_retry(
        &self,
        url: String,
        max_retries: u32,
    ) -> crate::error::Result<bridge_traits::http::HttpResponse> {
        let single_attempt = RetryPolicy {
            max_attempts: 1,
            ..RetryPolicy::default()
        };
        let mut attempt = 0;

        loop {
            let credential = self
                .authenticator
                .current_credential()
                .await
                .map_err(|e| GooglePhotosError::AuthenticationFailed(e.to_string()))?;

            let request = HttpRequest::new(HttpMethod::Get, url.clone())
                .bearer_token(credential.access_token)
                .header("Accept", "application/json")
                .timeout(Duration::from_secs(30));

            match self
                .http_client
                .execute_with_retry(request, single_attempt.clone())
                .await
            {
                Ok(response) => {
                    let status = response.status;

                    if status == 200 {
                        debug!("API request succeeded: status={}", status);
                        return Ok(response);
                    } else if status == 429 || (500..600).contains(&status) {
                        // Rate limit or server error - retry with backoff
                        attempt += 1;
                        if attempt >= max_retries {
                            warn!(
                                "API request failed after {} attempts: status={}",
                                max_retries, status
                            );
                            return Err(GooglePhotosError::ApiError {
                                status_code: status,
                                message: format!("Request failed after {} retries", max_retries),
                            });
                        }

                        let backoff_ms = 100u64 * 2u64.pow(attempt);
                        warn!(
                            "API request failed (attempt {}/{}): status={}, retrying in {}ms",
                            attempt, max_retries, status, backoff_ms
                        );
                        tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    } else {
                        // Client error - don't retry
                        warn!("API request failed: status={}", status);
                        return Err(GooglePhotosError::ApiError {
                            status_code: status,
                            message: String::from_utf8_lossy(&response.body).to_string(),
                        });
                    }
                }
                Err(e) => {
                    attempt += 1;
                    if attempt >= max_retries {
                        warn!("API request failed after {} attempts: {}", max_retries, e);
                        return Err(GooglePhotosError::NetworkError(e.to_string()));
                    }

                    let backoff_ms = 100u64 * 2u64.pow(attempt);
                    warn!(
                        "API request failed (attempt {}/{}): {}, retrying in {}ms",
                        attempt, max_retries, e, backoff_ms
                    );
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                }
            }
        }
    }
}

#[async_trait]
impl MediaCatalog for GooglePhotosConnector {
    #[instrument(skip(self, cursor))]
    async fn list_items(&self, cursor: Option<String>) -> Result<(Vec<MediaItem>, Option<String>)> {
        let mut url = format!("{}/mediaItems?pageSize={}", PHOTOS_API_BASE, PAGE_SIZE);
        if let Some(page_token) = cursor {
            url.push_str(&format!("&pageToken={}", urlencoding::encode(&page_token)));
        }

        let response = self.execute_with_retry(url, 3).await?;

        let list_response: MediaItemsListResponse = serde_json::from_slice(&response.body)
            .map_err(|e| {
                GooglePhotosError::ParseError(format!("Failed to parse media items list: {}", e))
            })?;

        let items: Vec<MediaItem> = list_response
            .media_items
            .into_iter()
            .filter_map(ApiMediaItem::into_media_item)
            .collect();

        debug!("Listed {} downloadable items on this page", items.len());

        Ok((items, list_response.next_page_token))
    }

    #[instrument(skip(self, ids), fields(id_count = ids.len()))]
    async fn resolve_items(&self, ids: &[String]) -> Result<HashMap<String, MediaItem>> {
        let mut resolved = HashMap::new();

        info!(
            "Resolving {} identities in {} batch request(s)",
            ids.len(),
            ids.len().div_ceil(MAX_IDS_PER_BATCH_GET)
        );

        for chunk in ids.chunks(MAX_IDS_PER_BATCH_GET) {
            let params: Vec<String> = chunk
                .iter()
                .map(|id| format!("mediaItemIds={}", urlencoding::encode(id)))
                .collect();
            let url = format!(
                "{}/mediaItems:batchGet?{}",
                PHOTOS_API_BASE,
                params.join("&")
            );

            let response = self.execute_with_retry(url, 3).await?;

            let batch: BatchGetResponse = serde_json::from_slice(&response.body).map_err(|e| {
                GooglePhotosError::ParseError(format!("Failed to parse batchGet response: {}", e))
            })?;

            for result in batch.media_item_results {
                match result.media_item {
                    Some(api_item) => {
                        if let Some(item) = api_item.into_media_item() {
                            resolved.insert(item.id.clone(), item);
                        }
                    }
                    None => {
                        // Deleted remotely or otherwise unavailable; the
                        // caller treats absence as skip, not failure
                        if let Some(status) = result.status {
                            warn!(
                                code = status.code,
                                message = %status.message,
                                "Identity lookup failed, skipping"
                            );
                        }
                    }
                }
            }
        }

        info!("Resolved {} of {} identities", resolved.len(), ids.len());

        Ok(resolved)
    }
}
