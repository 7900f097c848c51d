//! Command-line entry point for the photo library sync tool.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use bridge_desktop::http::ReqwestHttpClient;
use bridge_desktop::prompt::TerminalPrompt;
use bridge_traits::http::HttpClient;
use core_auth::{AuthManager, ClientConfig, FileTokenStore, OAuthConfig};
use core_sync::{DownloadPool, LocationStore, Reconciler, SyncConfig, SyncCoordinator};
use provider_google_photos::GooglePhotosConnector;

const TOKEN_FILE: &str = ".token.json";
const LOCATIONS_FILE: &str = ".file_locations.json";

/// Mirror a Google Photos library into a local directory.
#[derive(Debug, Parser)]
#[command(name = "photosync", version, about)]
struct Args {
    /// Path to the OAuth client configuration JSON file
    #[arg(short = 'c', long)]
    client_config: PathBuf,

    /// Directory the library is mirrored into
    #[arg(short = 'o', long)]
    output_dir: PathBuf,

    /// Refuse to run when more than this many downloads are pending;
    /// -1 removes the limit
    #[arg(long, default_value_t = 500)]
    max_downloads: i64,

    /// Stop listing the remote library after this many items
    #[arg(long)]
    max_items: Option<usize>,

    /// Number of concurrent download workers
    #[arg(long, default_value_t = 10)]
    download_workers: usize,

    /// Check the output directory against the tracked state and offer
    /// to delete untracked files and re-download missing ones
    #[arg(long)]
    reconcile: bool,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_tracing(args.debug);

    match run(args).await {
        Ok(true) => {}
        Ok(false) => {
            error!("Completed with failures");
            std::process::exit(1);
        }
        Err(e) => {
            error!("{e:#}");
            std::process::exit(1);
        }
    }
}

fn init_tracing(debug: bool) {
    let default_directive = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

async fn run(args: Args) -> anyhow::Result<bool> {
    tokio::fs::create_dir_all(&args.output_dir)
        .await
        .with_context(|| format!("creating output directory {}", args.output_dir.display()))?;

    let client_config =
        ClientConfig::load(&args.client_config).context("loading client configuration")?;

    let http_client: Arc<dyn HttpClient> =
        Arc::new(ReqwestHttpClient::new().context("building HTTP client")?);

    let auth = AuthManager::sign_in_or_restore(
        OAuthConfig::photo_library(client_config),
        FileTokenStore::new(args.output_dir.join(TOKEN_FILE)),
        Arc::clone(&http_client),
    )
    .await
    .context("signing in")?;

    let catalog = Arc::new(GooglePhotosConnector::new(
        Arc::clone(&http_client),
        Arc::new(auth),
    ));

    let store_path = args.output_dir.join(LOCATIONS_FILE);
    let mut store = LocationStore::load(&store_path)
        .await
        .context("loading tracked file locations")?;
    info!(tracked = store.len(), "Loaded tracked file locations");

    let config = SyncConfig {
        max_items: args.max_items,
        max_downloads: usize::try_from(args.max_downloads).ok(),
        ..SyncConfig::default()
    };

    let success = if args.reconcile {
        let reconciler = Reconciler::new(
            catalog,
            DownloadPool::new(Arc::clone(&http_client), args.download_workers)?,
            Arc::new(TerminalPrompt::new()),
            args.output_dir.clone(),
            store_path,
            config.persist_every,
        );
        reconciler.reconcile(&mut store).await?
    } else {
        let coordinator = SyncCoordinator::new(
            catalog,
            DownloadPool::new(Arc::clone(&http_client), args.download_workers)?,
            args.output_dir.clone(),
            store_path,
            config,
        );
        coordinator.sync(&mut store).await?
    };

    Ok(success)
}
