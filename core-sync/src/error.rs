use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error(
        "{pending} items pending download exceeds the budget of {limit}; \
         raise the limit or pass -1 for unlimited"
    )]
    BudgetExceeded { pending: usize, limit: usize },

    #[error("Location file {path} is corrupted: {reason}")]
    CorruptState { path: PathBuf, reason: String },

    #[error("No unused filename variant for '{preferred}' after {attempts} attempts")]
    NameSpaceExhausted { preferred: String, attempts: u32 },

    #[error("Download worker count must be at least 1")]
    InvalidWorkerCount,

    #[error("Download pool stopped before all outcomes were reported")]
    PoolStopped,

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Prompt error: {0}")]
    Prompt(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SyncError>;
