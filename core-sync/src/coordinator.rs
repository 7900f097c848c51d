//! Drives one full synchronization pass.
//!
//! The coordinator lists the remote catalog page by page, skips items whose
//! identity is already in the location store, enforces the download budget,
//! reserves a unique local name for each pending item, and hands the batch
//! to the download pool. It exclusively owns the store while the batch
//! runs, committing each reserved path as outcomes arrive and persisting
//! incrementally so a crash mid-batch loses little progress.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use bridge_traits::catalog::MediaCatalog;
use tokio::sync::mpsc;
use tracing::{info, instrument, warn};

use crate::error::{Result, SyncError};
use crate::location_store::LocationStore;
use crate::name_resolver::reserve;
use crate::pool::{DownloadOutcome, DownloadPool, DownloadTask};

/// Tuning knobs for a sync pass.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Stop listing the catalog after this many items, if set.
    pub max_items: Option<usize>,
    /// Refuse to start when more than this many downloads are pending.
    /// `None` means unlimited.
    pub max_downloads: Option<usize>,
    /// Persist the store after every N completed downloads.
    pub persist_every: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_items: None,
            max_downloads: Some(500),
            persist_every: 20,
        }
    }
}

pub struct SyncCoordinator {
    catalog: Arc<dyn MediaCatalog>,
    pool: DownloadPool,
    output_dir: PathBuf,
    store_path: PathBuf,
    config: SyncConfig,
}

impl SyncCoordinator {
    pub fn new(
        catalog: Arc<dyn MediaCatalog>,
        pool: DownloadPool,
        output_dir: PathBuf,
        store_path: PathBuf,
        config: SyncConfig,
    ) -> Self {
        Self {
            catalog,
            pool,
            output_dir,
            store_path,
            config,
        }
    }

    /// Run one sync pass against `store`.
    ///
    /// Returns `Ok(true)` when every pending download succeeded and
    /// `Ok(false)` when at least one failed. Failed items still get their
    /// reserved path committed to the store; a later reconcile pass can
    /// find and repair them.
    ///
    /// # Errors
    ///
    /// Fails before any download starts if the catalog cannot be listed,
    /// the pending count exceeds the budget, or a name cannot be reserved.
    #[instrument(skip(self, store))]
    pub async fn sync(&self, store: &mut LocationStore) -> Result<bool> {
        let pending = self.list_pending(store).await?;
        info!(pending = pending.len(), known = store.len(), "Catalog delta computed");

        if let Some(limit) = self.config.max_downloads {
            if pending.len() > limit {
                return Err(SyncError::BudgetExceeded {
                    pending: pending.len(),
                    limit,
                });
            }
        }

        let mut reserved = store.normalized_paths();
        let mut tasks = Vec::with_capacity(pending.len());
        for item in pending {
            let location = reserve(&self.output_dir, &item.filename, &reserved)?;
            reserved.insert(crate::location_store::normalized_path(&location.relative));
            tasks.push(DownloadTask { item, location });
        }

        let total = tasks.len();
        let outcomes = self.pool.start(tasks);
        run_batch(outcomes, total, store, &self.store_path, self.config.persist_every).await
    }

    /// Walk the catalog and collect items whose identity the store has not
    /// seen, honoring the `max_items` listing cap.
    async fn list_pending(
        &self,
        store: &LocationStore,
    ) -> Result<Vec<bridge_traits::catalog::MediaItem>> {
        let mut pending = Vec::new();
        let mut listed = 0usize;
        let mut cursor = None;

        loop {
            let (items, next) = self
                .catalog
                .list_items(cursor)
                .await
                .map_err(|e| SyncError::Catalog(e.to_string()))?;

            for item in items {
                listed += 1;
                if !store.contains(&item.id) {
                    pending.push(item);
                }
                if let Some(cap) = self.config.max_items {
                    if listed >= cap {
                        return Ok(pending);
                    }
                }
            }

            match next {
                Some(token) => cursor = Some(token),
                None => return Ok(pending),
            }
        }
    }
}

/// Drain a batch of download outcomes, committing each to the store.
///
/// Every outcome's reserved path is recorded whether or not the download
/// succeeded, so the name stays claimed and reconcile can repair the gap.
/// Returns whether every download in the batch succeeded.
pub(crate) async fn run_batch(
    mut outcomes: mpsc::UnboundedReceiver<DownloadOutcome>,
    total: usize,
    store: &mut LocationStore,
    store_path: &Path,
    persist_every: usize,
) -> Result<bool> {
    if total == 0 {
        info!("Nothing to download");
        return Ok(true);
    }

    let mut completed = 0usize;
    let mut all_succeeded = true;

    while completed < total {
        let outcome = outcomes.recv().await.ok_or(SyncError::PoolStopped)?;
        completed += 1;

        if !outcome.success {
            all_succeeded = false;
            warn!(file = %outcome.task.location.relative, "Recording failed download");
        }
        store.record(outcome.task.item.id, outcome.task.location.relative);

        if completed % persist_every == 0 {
            store.save(store_path).await?;
            info!(completed, total, "Progress checkpoint saved");
        }
    }

    store.save(store_path).await?;
    info!(total, all_succeeded, "Batch complete");
    Ok(all_succeeded)
}
