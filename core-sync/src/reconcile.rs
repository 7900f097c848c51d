//! Repairs drift between the output directory and the location store.
//!
//! Two kinds of drift are handled, each behind an explicit confirmation:
//! files on disk the store does not know about are offered for deletion,
//! and store entries whose file is missing on disk are offered for
//! re-download. Both steps treat filenames case-insensitively, matching
//! how names are reserved in the first place.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use bridge_traits::catalog::MediaCatalog;
use bridge_traits::prompt::UserPrompt;
use tracing::{info, instrument, warn};

use crate::coordinator::run_batch;
use crate::error::{Result, SyncError};
use crate::location_store::{normalized_path, LocationStore};
use crate::name_resolver::LocalLocation;
use crate::pool::{DownloadPool, DownloadTask};

pub struct Reconciler {
    catalog: Arc<dyn MediaCatalog>,
    pool: DownloadPool,
    prompt: Arc<dyn UserPrompt>,
    output_dir: PathBuf,
    store_path: PathBuf,
    persist_every: usize,
}

impl Reconciler {
    pub fn new(
        catalog: Arc<dyn MediaCatalog>,
        pool: DownloadPool,
        prompt: Arc<dyn UserPrompt>,
        output_dir: PathBuf,
        store_path: PathBuf,
        persist_every: usize,
    ) -> Self {
        Self {
            catalog,
            pool,
            prompt,
            output_dir,
            store_path,
            persist_every,
        }
    }

    /// Run one reconcile pass against `store`.
    ///
    /// Returns `Ok(true)` when every confirmed re-download succeeded, and
    /// `Ok(false)` when one failed or an entry could not be resolved
    /// remotely. Declining a confirmation skips that step without
    /// affecting the result.
    #[instrument(skip(self, store))]
    pub async fn reconcile(&self, store: &mut LocationStore) -> Result<bool> {
        let on_disk = self.scan_output_dir().await?;
        let on_disk_normalized: HashSet<String> =
            on_disk.iter().map(|name| normalized_path(name)).collect();
        let known: HashSet<String> = store
            .relative_paths()
            .map(normalized_path)
            .collect();

        let mut success = true;

        let mut strays: Vec<&String> = on_disk
            .iter()
            .filter(|name| !known.contains(&normalized_path(name)))
            .collect();
        strays.sort();
        if !strays.is_empty() {
            self.delete_strays(&strays).await?;
        }

        let mut missing: Vec<(String, String)> = store
            .iter()
            .filter(|(_, relative)| !on_disk_normalized.contains(&normalized_path(relative)))
            .map(|(id, relative)| (id.to_string(), relative.to_string()))
            .collect();
        missing.sort_by(|a, b| a.1.cmp(&b.1));
        if !missing.is_empty() {
            success &= self.redownload_missing(&missing, store).await?;
        }

        info!(success, "Reconcile pass complete");
        Ok(success)
    }

    /// Non-recursive listing of regular, non-hidden files in the output
    /// directory. Dotfiles are skipped so the store and token files never
    /// count as strays.
    async fn scan_output_dir(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.output_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = match entry.file_name().into_string() {
                Ok(name) => name,
                Err(raw) => {
                    warn!(name = ?raw, "Skipping file with non-UTF-8 name");
                    continue;
                }
            };
            if name.starts_with('.') {
                continue;
            }
            if entry.file_type().await?.is_file() {
                names.push(name);
            }
        }
        Ok(names)
    }

    /// Offer the stray files for deletion. Individual deletion failures
    /// are logged and skipped rather than aborting the pass.
    async fn delete_strays(&self, strays: &[&String]) -> Result<()> {
        let listing = strays
            .iter()
            .map(|name| format!("  {name}"))
            .collect::<Vec<_>>()
            .join("\n");
        let question = format!(
            "The following files are not tracked:\n{listing}\nDelete {} file(s)?",
            strays.len()
        );
        let confirmed = self
            .prompt
            .confirm(&question)
            .await
            .map_err(|e| SyncError::Prompt(e.to_string()))?;
        if !confirmed {
            info!("Deletion declined, keeping untracked files");
            return Ok(());
        }

        for name in strays {
            match tokio::fs::remove_file(self.output_dir.join(name.as_str())).await {
                Ok(()) => info!(file = %name, "Deleted untracked file"),
                Err(e) => warn!(file = %name, error = %e, "Could not delete untracked file"),
            }
        }
        Ok(())
    }

    /// Offer re-download of tracked entries whose file is missing.
    ///
    /// The original recorded filename is reused verbatim, keeping the
    /// store unchanged for entries that repair cleanly.
    async fn redownload_missing(
        &self,
        missing: &[(String, String)],
        store: &mut LocationStore,
    ) -> Result<bool> {
        let listing = missing
            .iter()
            .map(|(_, relative)| format!("  {relative}"))
            .collect::<Vec<_>>()
            .join("\n");
        let question = format!(
            "The following tracked files are missing:\n{listing}\nRe-download {} file(s)?",
            missing.len()
        );
        let confirmed = self
            .prompt
            .confirm(&question)
            .await
            .map_err(|e| SyncError::Prompt(e.to_string()))?;
        if !confirmed {
            info!("Re-download declined, leaving entries as-is");
            return Ok(true);
        }

        let ids: Vec<String> = missing.iter().map(|(id, _)| id.clone()).collect();
        let mut resolved = self
            .catalog
            .resolve_items(&ids)
            .await
            .map_err(|e| SyncError::Catalog(e.to_string()))?;

        let mut all_resolved = true;
        let mut tasks = Vec::new();
        for (id, relative) in missing {
            match resolved.remove(id) {
                Some(item) => tasks.push(DownloadTask {
                    item,
                    location: LocalLocation {
                        relative: relative.clone(),
                        absolute: self.output_dir.join(relative),
                    },
                }),
                None => {
                    warn!(id = %id, file = %relative, "Item no longer resolvable, skipping");
                    all_resolved = false;
                }
            }
        }

        let total = tasks.len();
        let outcomes = self.pool.start(tasks);
        let batch_ok = run_batch(
            outcomes,
            total,
            store,
            &self.store_path,
            self.persist_every,
        )
        .await?;
        Ok(batch_ok && all_resolved)
    }
}
