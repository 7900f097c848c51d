//! User Confirmation Abstraction
//!
//! Reconciliation deletes files and re-downloads missing ones only after an
//! explicit operator confirmation. That prompt is the single interactive
//! point in the core and is injected through this trait so tests can script
//! the answers.

use async_trait::async_trait;

use crate::error::Result;

/// Blocking yes/no confirmation prompt.
///
/// A `false` answer is a normal outcome that skips the proposed action, not
/// an error. Errors are reserved for the prompt channel itself failing
/// (e.g. stdin closed).
#[async_trait]
pub trait UserPrompt: Send + Sync {
    /// Ask the operator a yes/no question and block until answered.
    async fn confirm(&self, question: &str) -> Result<bool>;
}
