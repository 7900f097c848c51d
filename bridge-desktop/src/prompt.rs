//! Terminal Confirmation Prompt
//!
//! Reads yes/no answers from stdin. Any answer other than `y` or `n`
//! (case-insensitive) re-asks the question, matching the strictness the
//! reconcile flow expects before it deletes anything.

use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result};
use bridge_traits::prompt::UserPrompt;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::debug;

/// Interactive prompt on the controlling terminal.
#[derive(Debug, Default)]
pub struct TerminalPrompt;

impl TerminalPrompt {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl UserPrompt for TerminalPrompt {
    async fn confirm(&self, question: &str) -> Result<bool> {
        let mut stdout = tokio::io::stdout();
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            stdout
                .write_all(format!("{} [y/n] ", question).as_bytes())
                .await?;
            stdout.flush().await?;

            let line = lines
                .next_line()
                .await?
                .ok_or_else(|| BridgeError::OperationFailed("stdin closed".to_string()))?;

            match line.trim().to_lowercase().as_str() {
                "y" => {
                    debug!(question, answer = "y", "Prompt confirmed");
                    return Ok(true);
                }
                "n" => {
                    debug!(question, answer = "n", "Prompt declined");
                    return Ok(false);
                }
                _ => continue,
            }
        }
    }
}
