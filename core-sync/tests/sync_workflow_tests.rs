//! End-to-end tests of the sync and reconcile workflows against stubbed
//! catalog, transport, and prompt collaborators.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bridge_traits::catalog::{MediaCatalog, MediaItem};
use bridge_traits::error::BridgeError;
use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
use bridge_traits::prompt::UserPrompt;
use core_sync::{
    DownloadPool, LocationStore, Reconciler, SyncConfig, SyncCoordinator, SyncError,
};

fn item(id: &str, filename: &str) -> MediaItem {
    MediaItem {
        id: id.to_string(),
        filename: filename.to_string(),
        is_video: false,
        base_url: format!("https://media.example.com/{id}"),
    }
}

/// Catalog stub serving a fixed set of pages and a lookup table.
struct StubCatalog {
    pages: Vec<Vec<MediaItem>>,
    by_id: HashMap<String, MediaItem>,
}

impl StubCatalog {
    fn single_page(items: Vec<MediaItem>) -> Self {
        Self::paged(vec![items])
    }

    fn paged(pages: Vec<Vec<MediaItem>>) -> Self {
        let by_id = pages
            .iter()
            .flatten()
            .map(|i| (i.id.clone(), i.clone()))
            .collect();
        Self { pages, by_id }
    }
}

#[async_trait]
impl MediaCatalog for StubCatalog {
    async fn list_items(
        &self,
        cursor: Option<String>,
    ) -> bridge_traits::error::Result<(Vec<MediaItem>, Option<String>)> {
        let index = match cursor.as_deref() {
            None => 0,
            Some(token) => token
                .strip_prefix("page-")
                .and_then(|n| n.parse::<usize>().ok())
                .ok_or_else(|| BridgeError::OperationFailed("bad cursor".to_string()))?,
        };
        let items = self.pages.get(index).cloned().unwrap_or_default();
        let next = if index + 1 < self.pages.len() {
            Some(format!("page-{}", index + 1))
        } else {
            None
        };
        Ok((items, next))
    }

    async fn resolve_items(
        &self,
        ids: &[String],
    ) -> bridge_traits::error::Result<HashMap<String, MediaItem>> {
        Ok(ids
            .iter()
            .filter_map(|id| self.by_id.get(id).map(|i| (id.clone(), i.clone())))
            .collect())
    }
}

/// Transport stub that serves each download as the bytes of its URL, and
/// fails any URL containing one of the configured markers.
struct StubTransport {
    fail_markers: Vec<String>,
    downloads: AtomicUsize,
}

impl StubTransport {
    fn new() -> Self {
        Self::failing(&[])
    }

    fn failing(markers: &[&str]) -> Self {
        Self {
            fail_markers: markers.iter().map(|m| m.to_string()).collect(),
            downloads: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl HttpClient for StubTransport {
    async fn execute(
        &self,
        _request: HttpRequest,
    ) -> bridge_traits::error::Result<HttpResponse> {
        Err(BridgeError::NotAvailable("not used by these tests".to_string()))
    }

    async fn download_stream(
        &self,
        url: String,
    ) -> bridge_traits::error::Result<Box<dyn tokio::io::AsyncRead + Send + Unpin>> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        if self.fail_markers.iter().any(|m| url.contains(m.as_str())) {
            return Err(BridgeError::OperationFailed("simulated failure".to_string()));
        }
        Ok(Box::new(std::io::Cursor::new(url.as_bytes().to_vec())))
    }
}

/// Prompt stub with a scripted sequence of answers.
struct StubPrompt {
    answers: Vec<bool>,
    asked: AtomicUsize,
}

impl StubPrompt {
    fn new(answers: &[bool]) -> Self {
        Self {
            answers: answers.to_vec(),
            asked: AtomicUsize::new(0),
        }
    }

    fn questions_asked(&self) -> usize {
        self.asked.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UserPrompt for StubPrompt {
    async fn confirm(&self, _question: &str) -> bridge_traits::error::Result<bool> {
        let index = self.asked.fetch_add(1, Ordering::SeqCst);
        self.answers
            .get(index)
            .copied()
            .ok_or_else(|| BridgeError::OperationFailed("unexpected prompt".to_string()))
    }
}

fn coordinator(
    catalog: Arc<dyn MediaCatalog>,
    transport: Arc<StubTransport>,
    output_dir: &Path,
    config: SyncConfig,
) -> SyncCoordinator {
    SyncCoordinator::new(
        catalog,
        DownloadPool::new(transport, 4).unwrap(),
        output_dir.to_path_buf(),
        output_dir.join(".file_locations.json"),
        config,
    )
}

#[tokio::test]
async fn test_sync_downloads_new_items_and_second_run_is_a_no_op() {
    let dir = tempfile::tempdir().unwrap();
    let store_path = dir.path().join(".file_locations.json");
    let catalog = Arc::new(StubCatalog::single_page(vec![
        item("id1", "a.jpg"),
        item("id2", "b.jpg"),
    ]));
    let transport = Arc::new(StubTransport::new());
    let coordinator = coordinator(
        catalog,
        Arc::clone(&transport),
        dir.path(),
        SyncConfig::default(),
    );

    let mut store = LocationStore::new();
    assert!(coordinator.sync(&mut store).await.unwrap());
    assert!(dir.path().join("a.jpg").is_file());
    assert!(dir.path().join("b.jpg").is_file());
    assert_eq!(store.len(), 2);
    let first_bytes = std::fs::read(&store_path).unwrap();

    // Second run over the same catalog finds nothing new.
    let mut store = LocationStore::load(&store_path).await.unwrap();
    assert!(coordinator.sync(&mut store).await.unwrap());
    assert_eq!(transport.downloads.load(Ordering::SeqCst), 2);
    assert_eq!(std::fs::read(&store_path).unwrap(), first_bytes);
}

#[tokio::test]
async fn test_sync_walks_all_catalog_pages() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = Arc::new(StubCatalog::paged(vec![
        vec![item("id1", "a.jpg"), item("id2", "b.jpg")],
        vec![item("id3", "c.jpg")],
    ]));
    let transport = Arc::new(StubTransport::new());
    let coordinator = coordinator(
        catalog,
        Arc::clone(&transport),
        dir.path(),
        SyncConfig::default(),
    );

    let mut store = LocationStore::new();
    assert!(coordinator.sync(&mut store).await.unwrap());
    assert_eq!(store.len(), 3);
    assert!(dir.path().join("c.jpg").is_file());
}

#[tokio::test]
async fn test_budget_check_refuses_before_any_download() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = Arc::new(StubCatalog::single_page(vec![
        item("id1", "a.jpg"),
        item("id2", "b.jpg"),
        item("id3", "c.jpg"),
    ]));
    let transport = Arc::new(StubTransport::new());
    let config = SyncConfig {
        max_downloads: Some(2),
        ..SyncConfig::default()
    };
    let coordinator = coordinator(catalog, Arc::clone(&transport), dir.path(), config);

    let mut store = LocationStore::new();
    let err = coordinator.sync(&mut store).await.unwrap_err();
    assert!(matches!(
        err,
        SyncError::BudgetExceeded { pending: 3, limit: 2 }
    ));
    assert_eq!(transport.downloads.load(Ordering::SeqCst), 0);
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_max_items_caps_how_much_of_the_catalog_is_listed() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = Arc::new(StubCatalog::paged(vec![
        vec![item("id1", "a.jpg"), item("id2", "b.jpg")],
        vec![item("id3", "c.jpg")],
    ]));
    let transport = Arc::new(StubTransport::new());
    let config = SyncConfig {
        max_items: Some(2),
        ..SyncConfig::default()
    };
    let coordinator = coordinator(catalog, Arc::clone(&transport), dir.path(), config);

    let mut store = LocationStore::new();
    assert!(coordinator.sync(&mut store).await.unwrap());
    assert_eq!(store.len(), 2);
    assert!(!dir.path().join("c.jpg").exists());
}

#[tokio::test]
async fn test_partial_failure_commits_every_reserved_path() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = Arc::new(StubCatalog::single_page(vec![
        item("id1", "a.jpg"),
        item("id2", "b.jpg"),
        item("id3", "c.jpg"),
        item("id4", "d.jpg"),
        item("id5", "e.jpg"),
    ]));
    let transport = Arc::new(StubTransport::failing(&["id3"]));
    let coordinator = coordinator(
        catalog,
        Arc::clone(&transport),
        dir.path(),
        SyncConfig::default(),
    );

    let mut store = LocationStore::new();
    let ok = coordinator.sync(&mut store).await.unwrap();
    assert!(!ok);
    assert_eq!(store.len(), 5);
    assert!(store.contains("id3"));
    assert!(dir.path().join("a.jpg").is_file());
    assert!(!dir.path().join("c.jpg").exists());
}

#[tokio::test]
async fn test_duplicate_remote_filenames_get_suffixed() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = Arc::new(StubCatalog::single_page(vec![
        item("id1", "photo.jpg"),
        item("id2", "photo.jpg"),
    ]));
    let transport = Arc::new(StubTransport::new());
    let coordinator = coordinator(
        catalog,
        Arc::clone(&transport),
        dir.path(),
        SyncConfig::default(),
    );

    let mut store = LocationStore::new();
    assert!(coordinator.sync(&mut store).await.unwrap());

    let mut names: Vec<String> = store.relative_paths().map(str::to_string).collect();
    names.sort();
    assert_eq!(names, vec!["photo-1.jpg".to_string(), "photo.jpg".to_string()]);
    assert!(dir.path().join("photo.jpg").is_file());
    assert!(dir.path().join("photo-1.jpg").is_file());
}

#[tokio::test]
async fn test_reconcile_deletes_strays_and_redownloads_missing() {
    let dir = tempfile::tempdir().unwrap();
    let store_path = dir.path().join(".file_locations.json");
    std::fs::write(dir.path().join("a.jpg"), b"kept").unwrap();
    std::fs::write(dir.path().join("stray.jpg"), b"orphan").unwrap();
    std::fs::write(&store_path, b"ignored dotfile").unwrap();

    let mut store = LocationStore::new();
    store.record("id1", "a.jpg");
    store.record("id2", "b.jpg");

    let catalog = Arc::new(StubCatalog::single_page(vec![
        item("id1", "a.jpg"),
        item("id2", "b.jpg"),
    ]));
    let transport = Arc::new(StubTransport::new());
    let prompt = Arc::new(StubPrompt::new(&[true, true]));
    let reconciler = Reconciler::new(
        catalog,
        DownloadPool::new(Arc::clone(&transport) as Arc<dyn HttpClient>, 2).unwrap(),
        Arc::clone(&prompt) as Arc<dyn UserPrompt>,
        dir.path().to_path_buf(),
        store_path.clone(),
        20,
    );

    let ok = reconciler.reconcile(&mut store).await.unwrap();
    assert!(ok);
    assert_eq!(prompt.questions_asked(), 2);
    assert!(!dir.path().join("stray.jpg").exists());
    assert!(dir.path().join("b.jpg").is_file());
    // The tracked file that was fine is untouched.
    assert_eq!(std::fs::read(dir.path().join("a.jpg")).unwrap(), b"kept");
    // Only the missing entry was downloaded.
    assert_eq!(transport.downloads.load(Ordering::SeqCst), 1);
    assert_eq!(store.len(), 2);
}

#[tokio::test]
async fn test_reconcile_declined_prompts_change_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let store_path = dir.path().join(".file_locations.json");
    std::fs::write(dir.path().join("stray.jpg"), b"orphan").unwrap();

    let mut store = LocationStore::new();
    store.record("id2", "b.jpg");

    let catalog = Arc::new(StubCatalog::single_page(vec![item("id2", "b.jpg")]));
    let transport = Arc::new(StubTransport::new());
    let prompt = Arc::new(StubPrompt::new(&[false, false]));
    let reconciler = Reconciler::new(
        catalog,
        DownloadPool::new(Arc::clone(&transport) as Arc<dyn HttpClient>, 2).unwrap(),
        Arc::clone(&prompt) as Arc<dyn UserPrompt>,
        dir.path().to_path_buf(),
        store_path,
        20,
    );

    let ok = reconciler.reconcile(&mut store).await.unwrap();
    assert!(ok);
    assert!(dir.path().join("stray.jpg").is_file());
    assert!(!dir.path().join("b.jpg").exists());
    assert_eq!(transport.downloads.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_reconcile_flags_unresolvable_entries() {
    let dir = tempfile::tempdir().unwrap();
    let store_path = dir.path().join(".file_locations.json");

    let mut store = LocationStore::new();
    store.record("gone-id", "gone.jpg");

    // Catalog no longer knows the entry's identity.
    let catalog = Arc::new(StubCatalog::single_page(vec![]));
    let transport = Arc::new(StubTransport::new());
    let prompt = Arc::new(StubPrompt::new(&[true]));
    let reconciler = Reconciler::new(
        catalog,
        DownloadPool::new(Arc::clone(&transport) as Arc<dyn HttpClient>, 2).unwrap(),
        Arc::clone(&prompt) as Arc<dyn UserPrompt>,
        dir.path().to_path_buf(),
        store_path,
        20,
    );

    let ok = reconciler.reconcile(&mut store).await.unwrap();
    assert!(!ok);
    assert!(!dir.path().join("gone.jpg").exists());
}
