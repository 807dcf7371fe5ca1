//! Pipeline orchestrator
//!
//! [`PlaylistMirror`] wires the stages together: scan disk, fetch and enrich
//! metadata, plan the diff, execute the plan, merge into the store. It is
//! the only place the stages meet; each stage stays independently testable.
//!
//! One pipeline run at a time per base directory: the store and the disk
//! state are read-modify-written without locks, so concurrent runs against
//! the same directory must be prevented by the caller.

use std::sync::Arc;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::executor::{self, ExecuteParams};
use crate::fetcher;
use crate::planner;
use crate::provider::{HttpMetadataProvider, MetadataProvider};
use crate::scanner;
use crate::store::Store;
use crate::types::{ItemId, MirrorEvent};
use crate::worker::{CliDownloadWorker, DownloadWorker};

/// Capacity of the progress event channel
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// HTTP timeout for thumbnail fetches
const THUMBNAIL_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

/// Summary of one mirror run
#[derive(Clone, Debug)]
pub struct RunReport {
    /// Items fetched from the provider
    pub fetched: usize,
    /// Download actions the planner selected
    pub planned: usize,
    /// Worker invocations that completed successfully
    pub downloaded: usize,
    /// Thumbnails fetched and written
    pub thumbnails_fetched: usize,
    /// Per-item failures (downloads and thumbnails)
    pub failures: Vec<(ItemId, String)>,
    /// Store records changed by the merge
    pub store_mutations: usize,
    /// Whether the store file was rewritten
    pub store_written: bool,
}

impl RunReport {
    /// Whether every planned action completed
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// The playlist mirroring pipeline
///
/// # Example
///
/// ```no_run
/// use playlist_mirror::{Config, PlaylistMirror};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = Config {
///         base_dir: "/data/music".into(),
///         ..Default::default()
///     };
///     let mirror = PlaylistMirror::with_defaults(config)?;
///
///     // Subscribe to progress events
///     let mut events = mirror.subscribe();
///     tokio::spawn(async move {
///         while let Ok(event) = events.recv().await {
///             println!("{event:?}");
///         }
///     });
///
///     let report = mirror.run("PLAYLIST_ID").await?;
///     println!("downloaded {} items", report.downloaded);
///     Ok(())
/// }
/// ```
pub struct PlaylistMirror {
    config: Config,
    provider: Arc<dyn MetadataProvider>,
    worker: Arc<dyn DownloadWorker>,
    http: reqwest::Client,
    event_tx: broadcast::Sender<MirrorEvent>,
    cancel: CancellationToken,
}

impl PlaylistMirror {
    /// Create a mirror with explicit provider and worker implementations
    pub fn new(
        config: Config,
        provider: Arc<dyn MetadataProvider>,
        worker: Arc<dyn DownloadWorker>,
    ) -> Result<Self> {
        config.validate()?;
        let http = reqwest::Client::builder()
            .timeout(THUMBNAIL_TIMEOUT)
            .user_agent(concat!("playlist-mirror/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Ok(Self {
            config,
            provider,
            worker,
            http,
            event_tx,
            cancel: CancellationToken::new(),
        })
    }

    /// Create a mirror wired to the hosted metadata provider and the
    /// yt-dlp-compatible CLI worker
    ///
    /// # Errors
    ///
    /// Fails before any work when the worker binary cannot be found.
    pub fn with_defaults(config: Config) -> Result<Self> {
        let provider = Arc::new(HttpMetadataProvider::new(
            HttpMetadataProvider::DEFAULT_API_BASE,
        )?);
        let worker = Arc::new(CliDownloadWorker::resolve(&config.worker)?);
        Self::new(config, provider, worker)
    }

    /// Subscribe to progress events
    ///
    /// Events are broadcast; slow subscribers may observe lag and skip
    /// events, which never blocks the pipeline.
    pub fn subscribe(&self) -> broadcast::Receiver<MirrorEvent> {
        self.event_tx.subscribe()
    }

    /// Cooperatively cancel an in-flight run
    ///
    /// In-flight worker invocations are killed; the run returns with the
    /// remaining items recorded as failures.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// The configuration this mirror was built with
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run the full pipeline once for a collection
    ///
    /// Re-running with no upstream changes performs zero worker invocations
    /// and zero store writes; resumability across runs comes entirely from
    /// the idempotent disk-state and store checks.
    pub async fn run(&self, collection: &str) -> Result<RunReport> {
        if !self.config.base_dir.is_dir() {
            return Err(Error::NotFound(format!(
                "base directory {}",
                self.config.base_dir.display()
            )));
        }

        info!(collection, base_dir = %self.config.base_dir.display(), "mirror run starting");
        let disk = scanner::scan_disk(&self.config)?;

        let _ = self.event_tx.send(MirrorEvent::FetchStarted {
            collection: collection.to_string(),
        });
        let items = fetcher::fetch_playlist(
            self.provider.as_ref(),
            collection,
            &self.config.fetch,
            &self.event_tx,
        )
        .await?;

        let work = planner::plan_work(&items, &disk, &self.config.download);
        let planned = work.iter().filter(|w| w.action.is_download()).count();
        let _ = self.event_tx.send(MirrorEvent::PlanReady {
            fetched: items.len(),
            planned,
        });

        let fetched = items.len();
        let execution = executor::execute(ExecuteParams {
            worker: self.worker.as_ref(),
            http: &self.http,
            config: &self.config,
            items,
            work: &work,
            disk: &disk,
            events: &self.event_tx,
            cancel: &self.cancel,
        })
        .await?;

        let mut store = Store::load(self.config.store_path());
        let store_mutations = store.merge(execution.outcomes.into_iter().map(|o| o.item));
        let store_written = store.persist()?;
        if store_written {
            let _ = self.event_tx.send(MirrorEvent::StorePersisted {
                mutations: store_mutations,
            });
        }

        let report = RunReport {
            fetched,
            planned,
            downloaded: execution.downloaded,
            thumbnails_fetched: execution.thumbnails_fetched,
            failures: execution.failures,
            store_mutations,
            store_written,
        };
        let _ = self.event_tx.send(MirrorEvent::RunCompleted {
            downloaded: report.downloaded,
            failed: report.failures.len(),
        });
        info!(
            fetched = report.fetched,
            planned = report.planned,
            downloaded = report.downloaded,
            failed = report.failures.len(),
            store_written = report.store_written,
            "mirror run finished"
        );
        Ok(report)
    }
}
