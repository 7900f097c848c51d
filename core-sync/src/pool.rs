//! Fixed-size download worker pool.
//!
//! The pool is fed a closed batch of tasks up front. Each worker loops
//! popping the next task from a shared queue, streams the item's bytes to
//! its reserved destination, and reports an outcome on a channel. A failed
//! download never aborts the batch; the failure is recorded in the outcome
//! and any partially written file is removed.

use std::collections::VecDeque;
use std::sync::Arc;

use bridge_traits::catalog::MediaItem;
use bridge_traits::http::HttpClient;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error, warn};

use crate::error::{Result, SyncError};
use crate::name_resolver::LocalLocation;

/// One unit of download work: a remote item and its reserved destination.
#[derive(Debug, Clone)]
pub struct DownloadTask {
    pub item: MediaItem,
    pub location: LocalLocation,
}

/// Result of one download attempt.
#[derive(Debug)]
pub struct DownloadOutcome {
    pub task: DownloadTask,
    pub success: bool,
}

/// Spawns a fixed number of workers over a closed task queue.
pub struct DownloadPool {
    http_client: Arc<dyn HttpClient>,
    worker_count: usize,
}

impl DownloadPool {
    /// Create a pool with `worker_count` concurrent workers.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::InvalidWorkerCount`] if `worker_count` is zero.
    pub fn new(http_client: Arc<dyn HttpClient>, worker_count: usize) -> Result<Self> {
        if worker_count == 0 {
            return Err(SyncError::InvalidWorkerCount);
        }
        Ok(Self {
            http_client,
            worker_count,
        })
    }

    /// Start downloading `tasks`, returning a receiver that yields exactly
    /// one [`DownloadOutcome`] per task.
    ///
    /// Workers exit once the queue drains; there is no explicit shutdown.
    pub fn start(&self, tasks: Vec<DownloadTask>) -> mpsc::UnboundedReceiver<DownloadOutcome> {
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
        let queue = Arc::new(Mutex::new(tasks.into_iter().collect::<VecDeque<_>>()));

        for worker_id in 0..self.worker_count {
            let queue = Arc::clone(&queue);
            let outcome_tx = outcome_tx.clone();
            let http_client = Arc::clone(&self.http_client);

            tokio::spawn(async move {
                loop {
                    let task = match queue.lock().await.pop_front() {
                        Some(task) => task,
                        None => break,
                    };

                    let success = match download_one(http_client.as_ref(), &task).await {
                        Ok(()) => {
                            debug!(
                                worker_id,
                                file = %task.location.relative,
                                "Download complete"
                            );
                            true
                        }
                        Err(e) => {
                            error!(
                                worker_id,
                                file = %task.location.relative,
                                error = %e,
                                "Download failed"
                            );
                            remove_partial(&task.location).await;
                            false
                        }
                    };

                    if outcome_tx.send(DownloadOutcome { task, success }).is_err() {
                        // Receiver dropped; nobody is listening anymore.
                        break;
                    }
                }
            });
        }

        outcome_rx
    }
}

/// Stream one item to its reserved destination file.
async fn download_one(http_client: &dyn HttpClient, task: &DownloadTask) -> Result<()> {
    let url = task.item.download_url();
    let mut reader = http_client
        .download_stream(url)
        .await
        .map_err(|e| SyncError::Catalog(e.to_string()))?;

    let mut file = tokio::fs::File::create(&task.location.absolute).await?;
    tokio::io::copy(&mut reader, &mut file).await?;

    use tokio::io::AsyncWriteExt;
    file.flush().await?;
    Ok(())
}

/// Best-effort removal of a partially written file after a failure.
async fn remove_partial(location: &LocalLocation) {
    match tokio::fs::remove_file(&location.absolute).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            warn!(
                file = %location.relative,
                error = %e,
                "Could not remove partial download"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::error::BridgeError;
    use bridge_traits::http::{HttpRequest, HttpResponse};
    use mockall::mock;

    mock! {
        Http {}

        #[async_trait::async_trait]
        impl HttpClient for Http {
            async fn execute(&self, request: HttpRequest) -> bridge_traits::error::Result<HttpResponse>;
            async fn download_stream(
                &self,
                url: String,
            ) -> bridge_traits::error::Result<Box<dyn tokio::io::AsyncRead + Send + Unpin>>;
        }
    }

    fn task_for(dir: &std::path::Path, id: &str, name: &str) -> DownloadTask {
        DownloadTask {
            item: MediaItem {
                id: id.to_string(),
                filename: name.to_string(),
                is_video: false,
                base_url: format!("https://example.com/{id}"),
            },
            location: LocalLocation {
                relative: name.to_string(),
                absolute: dir.join(name),
            },
        }
    }

    #[tokio::test]
    async fn test_zero_workers_is_rejected() {
        let http = Arc::new(MockHttp::new());
        assert!(matches!(
            DownloadPool::new(http, 0),
            Err(SyncError::InvalidWorkerCount)
        ));
    }

    #[tokio::test]
    async fn test_downloads_write_files_and_report_success() {
        let dir = tempfile::tempdir().unwrap();
        let mut http = MockHttp::new();
        http.expect_download_stream().times(2).returning(|_| {
            Ok(Box::new(std::io::Cursor::new(b"payload".to_vec()))
                as Box<dyn tokio::io::AsyncRead + Send + Unpin>)
        });

        let pool = DownloadPool::new(Arc::new(http), 2).unwrap();
        let tasks = vec![
            task_for(dir.path(), "id1", "a.jpg"),
            task_for(dir.path(), "id2", "b.jpg"),
        ];
        let mut outcomes = pool.start(tasks);

        let mut successes = 0;
        while let Some(outcome) = outcomes.recv().await {
            assert!(outcome.success);
            successes += 1;
        }
        assert_eq!(successes, 2);
        assert_eq!(std::fs::read(dir.path().join("a.jpg")).unwrap(), b"payload");
        assert_eq!(std::fs::read(dir.path().join("b.jpg")).unwrap(), b"payload");
    }

    #[tokio::test]
    async fn test_failed_download_reports_failure_and_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut http = MockHttp::new();
        http.expect_download_stream()
            .times(1)
            .returning(|_| Err(BridgeError::OperationFailed("connection reset".to_string())));

        let pool = DownloadPool::new(Arc::new(http), 1).unwrap();
        let mut outcomes = pool.start(vec![task_for(dir.path(), "id1", "a.jpg")]);

        let outcome = outcomes.recv().await.unwrap();
        assert!(!outcome.success);
        assert!(!dir.path().join("a.jpg").exists());
        assert!(outcomes.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_one_failure_does_not_stop_other_tasks() {
        let dir = tempfile::tempdir().unwrap();
        let mut http = MockHttp::new();
        http.expect_download_stream().times(3).returning(|url| {
            if url.contains("id2") {
                Err(BridgeError::OperationFailed("boom".to_string()))
            } else {
                Ok(Box::new(std::io::Cursor::new(b"ok".to_vec()))
                    as Box<dyn tokio::io::AsyncRead + Send + Unpin>)
            }
        });

        let pool = DownloadPool::new(Arc::new(http), 1).unwrap();
        let tasks = vec![
            task_for(dir.path(), "id1", "a.jpg"),
            task_for(dir.path(), "id2", "b.jpg"),
            task_for(dir.path(), "id3", "c.jpg"),
        ];
        let mut outcomes = pool.start(tasks);

        let mut results = Vec::new();
        while let Some(outcome) = outcomes.recv().await {
            results.push((outcome.task.item.id.clone(), outcome.success));
        }
        results.sort();
        assert_eq!(
            results,
            vec![
                ("id1".to_string(), true),
                ("id2".to_string(), false),
                ("id3".to_string(), true),
            ]
        );
    }
}
