//! Durable mapping from remote item identity to local relative path.
//!
//! The store is the system's memory of what has already been fetched: an
//! item whose identity appears here is never downloaded again by a normal
//! sync run, regardless of what is actually on disk. It persists as a
//! single pretty-printed JSON object so users can inspect and hand-edit it.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use tracing::debug;

use crate::error::{Result, SyncError};

/// Normalize a relative path for case-insensitive comparison.
///
/// Reserved and stored paths are compared through this so that `IMG_1.JPG`
/// and `img_1.jpg` are treated as the same name, which keeps the mapping
/// safe on case-insensitive filesystems.
pub fn normalized_path(path: &str) -> String {
    path.to_lowercase()
}

/// Identity → relative path mapping, persisted as JSON.
///
/// Entries are kept in a `BTreeMap` so the serialized file is stable across
/// runs and diffs cleanly.
#[derive(Debug, Default)]
pub struct LocationStore {
    entries: BTreeMap<String, String>,
}

impl LocationStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the store from `path`.
    ///
    /// A missing file yields an empty store; a present but unparseable
    /// file, or one containing two entries that collide after
    /// normalization, is an error rather than a silent reset, because
    /// proceeding with a partial view would re-download everything.
    pub async fn load(path: &Path) -> Result<Self> {
        let raw = match tokio::fs::read_to_string(path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No location file found, starting empty");
                return Ok(Self::new());
            }
            Err(e) => return Err(e.into()),
        };

        let entries: BTreeMap<String, String> =
            serde_json::from_str(&raw).map_err(|e| SyncError::CorruptState {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        let mut seen = HashSet::new();
        for relative in entries.values() {
            if !seen.insert(normalized_path(relative)) {
                return Err(SyncError::CorruptState {
                    path: path.to_path_buf(),
                    reason: format!("duplicate local path '{relative}'"),
                });
            }
        }

        debug!(path = %path.display(), entries = entries.len(), "Loaded location file");
        Ok(Self { entries })
    }

    /// Persist the store to `path`, replacing any previous contents.
    pub async fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.entries).map_err(|e| {
            SyncError::CorruptState {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }
        })?;
        tokio::fs::write(path, json).await?;
        Ok(())
    }

    /// Whether `id` already has a recorded location.
    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Record (or overwrite) the location for `id`.
    pub fn record(&mut self, id: impl Into<String>, relative: impl Into<String>) {
        self.entries.insert(id.into(), relative.into());
    }

    /// All recorded relative paths.
    pub fn relative_paths(&self) -> impl Iterator<Item = &str> {
        self.entries.values().map(String::as_str)
    }

    /// The normalized forms of all recorded paths, for collision checks.
    pub fn normalized_paths(&self) -> HashSet<String> {
        self.entries
            .values()
            .map(|relative| normalized_path(relative))
            .collect()
    }

    /// Iterate over `(id, relative path)` pairs in identity order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(id, relative)| (id.as_str(), relative.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
