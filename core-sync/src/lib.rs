//! # Sync Engine
//!
//! Keeps a local directory synchronized with a remote media library.
//!
//! ## Overview
//!
//! This crate is the core of the system. It discovers remote items not yet
//! present locally, assigns each a unique local filename, downloads them
//! concurrently, and maintains a durable mapping from remote identity to
//! local file so repeated runs are incremental and idempotent.
//!
//! ## Components
//!
//! - **Location Store** (`location_store`): durable identity → relative
//!   path mapping, persisted as a JSON file under the output directory
//! - **Name Resolver** (`name_resolver`): deterministic, case-insensitive
//!   filename collision avoidance
//! - **Download Pool** (`pool`): fixed number of workers draining a closed
//!   task queue, one file per task, per-task failure isolation
//! - **Sync Coordinator** (`coordinator`): remote-vs-local delta, budget
//!   check, reservation, batch download with incremental persistence
//! - **Reconciler** (`reconcile`): diffs on-disk reality against the
//!   persisted mapping and offers corrective deletion / re-download
//!
//! ## Concurrency model
//!
//! One coordinating task owns the `LocationStore` and the reservation set
//! exclusively. Workers only ever see their own `DownloadTask` and report
//! through an outcome channel, so no locking is needed on coordinator
//! state. The input queue is closed before workers start; pool shutdown is
//! implicit once it drains.

pub mod coordinator;
pub mod error;
pub mod location_store;
pub mod name_resolver;
pub mod pool;
pub mod reconcile;

pub use coordinator::{SyncConfig, SyncCoordinator};
pub use error::{Result, SyncError};
pub use location_store::{normalized_path, LocationStore};
pub use name_resolver::{reserve, LocalLocation};
pub use pool::{DownloadOutcome, DownloadPool, DownloadTask};
pub use reconcile::Reconciler;
