//! Deterministic filename collision avoidance.
//!
//! Remote filenames are not unique, and the output directory may already
//! hold files with the same names. Reservation walks `name.ext`,
//! `name-1.ext`, `name-2.ext`, ... until it finds a candidate that is
//! neither on disk nor already reserved, comparing case-insensitively.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::error::{Result, SyncError};
use crate::location_store::normalized_path;

/// Upper bound on suffix attempts before giving up on a name.
const MAX_SUFFIX_ATTEMPTS: u32 = 10_000;

/// A reserved local destination for one download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalLocation {
    /// Path relative to the output directory, as recorded in the store.
    pub relative: String,
    /// Absolute path the worker writes to.
    pub absolute: PathBuf,
}

/// Reserve a unique local filename for `preferred_name` under `output_dir`.
///
/// `already_reserved` holds the normalized forms of every path that is
/// spoken for in this run (store contents plus earlier reservations); the
/// caller must insert the returned reservation into it before reserving the
/// next name.
pub fn reserve(
    output_dir: &Path,
    preferred_name: &str,
    already_reserved: &HashSet<String>,
) -> Result<LocalLocation> {
    let (stem, extension) = split_extension(preferred_name);

    for attempt in 0..MAX_SUFFIX_ATTEMPTS {
        let candidate = if attempt == 0 {
            preferred_name.to_string()
        } else {
            match extension {
                Some(ext) => format!("{stem}-{attempt}.{ext}"),
                None => format!("{stem}-{attempt}"),
            }
        };

        let absolute = output_dir.join(&candidate);
        if already_reserved.contains(&normalized_path(&candidate)) || absolute.is_file() {
            continue;
        }

        return Ok(LocalLocation {
            relative: candidate,
            absolute,
        });
    }

    Err(SyncError::NameSpaceExhausted {
        preferred: preferred_name.to_string(),
        attempts: MAX_SUFFIX_ATTEMPTS,
    })
}

/// Split a filename on its last dot.
///
/// A leading dot (`.hidden`) or no dot at all means no extension; the
/// suffix is then appended to the whole name.
fn split_extension(name: &str) -> (&str, Option<&str>) {
    match name.rfind('.') {
        Some(0) | None => (name, None),
        Some(idx) => (&name[..idx], Some(&name[idx + 1..])),
    }
}
