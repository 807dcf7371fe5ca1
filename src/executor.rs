//! Concurrency-bounded batch executor
//!
//! Runs the planned work through the download worker in fixed-size batches
//! (batch size = concurrency limit). Batches execute strictly one after
//! another; within a batch every invocation starts concurrently and the
//! batch completes only once all of its invocations have settled. This is a
//! barrier-synchronized batch scheduler, not a sliding-window pool: a single
//! slow item delays the start of the next batch even if capacity is free.
//!
//! Each invocation's outcome is captured as success-or-error, so one failing
//! item does not discard the results of its batch siblings. Result order
//! matches input order regardless of completion order.

use futures::future::join_all;
use std::collections::HashMap;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{Result, WorkerError};
use crate::types::{DiskState, ItemId, MirrorEvent, PartialItem, PlaylistItem, WorkItem};
use crate::worker::{DownloadKind, DownloadWorker, WorkerOutput, WorkerRequest};

/// Inputs of one execution pass
pub struct ExecuteParams<'a> {
    /// The download worker to invoke
    pub worker: &'a dyn DownloadWorker,
    /// HTTP client for thumbnail fetches
    pub http: &'a reqwest::Client,
    /// Run configuration
    pub config: &'a Config,
    /// All fetched items, in collection order
    pub items: Vec<PartialItem>,
    /// The planned work list
    pub work: &'a [WorkItem],
    /// Disk state from the scanner (for thumbnail targeting)
    pub disk: &'a DiskState,
    /// Progress event channel
    pub events: &'a broadcast::Sender<MirrorEvent>,
    /// Cooperative run cancellation
    pub cancel: &'a CancellationToken,
}

/// One item's result after execution
#[derive(Clone, Debug)]
pub struct ItemOutcome {
    /// The enriched record; extensions are filled on success and left `None`
    /// on failure or when no download was planned
    pub item: PlaylistItem,
    /// The failure reason, when this item's invocation failed
    pub error: Option<String>,
}

/// Aggregate result of an execution pass
#[derive(Debug)]
pub struct ExecutionResult {
    /// Enriched records for every fetched item, in input order
    pub outcomes: Vec<ItemOutcome>,
    /// Worker invocations that completed successfully
    pub downloaded: usize,
    /// Thumbnails fetched and written
    pub thumbnails_fetched: usize,
    /// Per-item failures (downloads and thumbnails), in completion order
    pub failures: Vec<(ItemId, String)>,
}

/// Run the planned work and produce enriched records for every item
pub async fn execute(params: ExecuteParams<'_>) -> Result<ExecutionResult> {
    let ExecuteParams {
        worker,
        http,
        config,
        items,
        work,
        disk,
        events,
        cancel,
    } = params;

    let requests = build_requests(config, &items, work);
    prepare_directories(config, &requests).await?;

    // Batched worker invocations, one barrier per batch
    let batch_size = config.executor.max_concurrent_downloads;
    let mut results: HashMap<ItemId, std::result::Result<WorkerOutput, String>> = HashMap::new();
    for batch in requests.chunks(batch_size) {
        let settled = join_all(batch.iter().map(|request| async move {
            let _ = events.send(MirrorEvent::ItemStarted {
                id: request.id.clone(),
                action: request.kind.action(),
            });

            let result = run_invocation(worker, config, request, cancel).await;
            let result = match result {
                Ok(output) if request.kind == DownloadKind::Both => {
                    relocate_audio(config, request, output).await
                }
                other => other,
            };

            match &result {
                Ok(_) => {
                    let _ = events.send(MirrorEvent::ItemCompleted {
                        id: request.id.clone(),
                    });
                }
                Err(e) => {
                    warn!(id = %request.id, error = %e, "worker invocation failed");
                    let _ = events.send(MirrorEvent::ItemFailed {
                        id: request.id.clone(),
                        reason: e.to_string(),
                    });
                }
            }
            (request.id.clone(), result.map_err(|e| e.to_string()))
        }))
        .await;
        results.extend(settled);
    }

    let downloaded = results.values().filter(|r| r.is_ok()).count();
    let mut failures: Vec<(ItemId, String)> = Vec::new();

    // Join results back into their original positions
    let mut outcomes: Vec<ItemOutcome> = Vec::with_capacity(items.len());
    for item in items {
        let outcome = match results.remove(&item.id) {
            Some(Ok(output)) => ItemOutcome {
                item: item.into_item(output.audio_ext, output.video_ext),
                error: None,
            },
            Some(Err(reason)) => {
                failures.push((item.id.clone(), reason.clone()));
                ItemOutcome {
                    item: item.into_item(None, None),
                    error: Some(reason),
                }
            }
            None => ItemOutcome {
                item: item.into_item(None, None),
                error: None,
            },
        };
        outcomes.push(outcome);
    }

    let thumbnails_fetched =
        fetch_thumbnails(http, config, &outcomes, disk, events, cancel, &mut failures).await?;

    info!(
        downloaded,
        thumbnails = thumbnails_fetched,
        failed = failures.len(),
        "execution pass complete"
    );
    Ok(ExecutionResult {
        outcomes,
        downloaded,
        thumbnails_fetched,
        failures,
    })
}

/// Build worker requests for the download actions in the work list
fn build_requests(config: &Config, items: &[PartialItem], work: &[WorkItem]) -> Vec<WorkerRequest> {
    let by_id: HashMap<&ItemId, &PartialItem> = items.iter().map(|item| (&item.id, item)).collect();

    work.iter()
        .filter_map(|work_item| {
            let kind = DownloadKind::from_action(work_item.action)?;
            let item = by_id.get(&work_item.id)?;
            let output_dir = match kind {
                DownloadKind::Audio => config.audio_dir(),
                DownloadKind::Video | DownloadKind::Both => config.video_dir(),
            };
            Some(WorkerRequest {
                id: item.id.clone(),
                url: item.url.clone(),
                title: item.title.clone(),
                kind,
                output_dir,
                audio_format: config.worker.audio_format.clone(),
                video_format: config.worker.video_format.clone(),
            })
        })
        .collect()
}

/// Create the directories the requested artifact kinds need, idempotently
async fn prepare_directories(config: &Config, requests: &[WorkerRequest]) -> Result<()> {
    if requests.iter().any(|r| r.kind.wants_audio()) {
        tokio::fs::create_dir_all(config.audio_dir()).await?;
    }
    if requests.iter().any(|r| r.kind.wants_video()) {
        tokio::fs::create_dir_all(config.video_dir()).await?;
    }
    Ok(())
}

/// Run one worker invocation under the configured timeout and the run's
/// cancellation token
async fn run_invocation(
    worker: &dyn DownloadWorker,
    config: &Config,
    request: &WorkerRequest,
    cancel: &CancellationToken,
) -> Result<WorkerOutput> {
    let invocation = async {
        match config.executor.worker_timeout {
            Some(limit) => match tokio::time::timeout(limit, worker.download(request)).await {
                Ok(result) => result,
                Err(_) => Err(WorkerError::Timeout {
                    id: request.id.to_string(),
                    elapsed_secs: limit.as_secs(),
                }
                .into()),
            },
            None => worker.download(request).await,
        }
    };

    tokio::select! {
        () = cancel.cancelled() => Err(WorkerError::Cancelled {
            id: request.id.to_string(),
        }
        .into()),
        result = invocation => result,
    }
}

/// Move the extracted audio artifact out of the video directory
///
/// A keep-both invocation places both artifacts under the video directory;
/// the audio file is relocated into the audio directory after a successful
/// run.
async fn relocate_audio(
    config: &Config,
    request: &WorkerRequest,
    output: WorkerOutput,
) -> Result<WorkerOutput> {
    let Some(audio_ext) = output.audio_ext.as_deref() else {
        return Ok(output);
    };
    let file_name = format!("{} [{}].{}", request.title, request.id, audio_ext);
    let source = request.output_dir.join(&file_name);
    let dest = config.audio_dir().join(&file_name);
    tokio::fs::rename(&source, &dest).await?;
    debug!(id = %request.id, file = %file_name, "relocated audio artifact");
    Ok(output)
}

/// Fetch missing thumbnails, one GET per item, isolating failures
#[allow(clippy::too_many_arguments)]
async fn fetch_thumbnails(
    http: &reqwest::Client,
    config: &Config,
    outcomes: &[ItemOutcome],
    disk: &DiskState,
    events: &broadcast::Sender<MirrorEvent>,
    cancel: &CancellationToken,
    failures: &mut Vec<(ItemId, String)>,
) -> Result<usize> {
    let targets: Vec<(ItemId, String)> = outcomes
        .iter()
        .filter(|o| !o.item.unavailable && !disk.has_thumbnail(&o.item.id))
        .filter_map(|o| {
            o.item
                .thumbnail_url
                .clone()
                .map(|url| (o.item.id.clone(), url))
        })
        .collect();
    if targets.is_empty() {
        return Ok(0);
    }

    tokio::fs::create_dir_all(config.thumbnail_dir()).await?;

    let mut fetched = 0;
    for (id, url) in targets {
        if cancel.is_cancelled() {
            break;
        }
        match fetch_one_thumbnail(http, &url).await {
            Ok(bytes) => {
                let path = config.thumbnail_dir().join(format!("{id}.jpg"));
                tokio::fs::write(&path, &bytes).await?;
                fetched += 1;
            }
            Err(e) => {
                warn!(id = %id, error = %e, "thumbnail fetch failed");
                let _ = events.send(MirrorEvent::ItemFailed {
                    id: id.clone(),
                    reason: format!("thumbnail: {e}"),
                });
                failures.push((id, format!("thumbnail: {e}")));
            }
        }
    }
    Ok(fetched)
}

/// GET one thumbnail; the response body is written verbatim by the caller
async fn fetch_one_thumbnail(http: &reqwest::Client, url: &str) -> Result<Vec<u8>> {
    let response = http.get(url).send().await?.error_for_status()?;
    Ok(response.bytes().await?.to_vec())
}
