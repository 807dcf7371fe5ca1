//! Two-phase metadata fetch engine
//!
//! Phase 1 walks the collection listing cursor-by-cursor into an accumulator
//! (an explicit loop, so stack and memory stay bounded for arbitrarily long
//! collections). Phase 2 batches the collected identifiers and enriches each
//! item with a duration, issuing batches concurrently up to the configured
//! outbound limit.
//!
//! Any malformed record in either phase is fatal: no partial listing is
//! considered safe to act on.

use futures::StreamExt;
use std::collections::HashMap;
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::config::FetchConfig;
use crate::error::{ProviderError, Result};
use crate::provider::{MetadataProvider, parse_duration_expression, to_whole_seconds};
use crate::types::{ItemId, MirrorEvent, PartialItem};

/// Fetch the full set of partial items for a collection, enriched with
/// durations
///
/// Honors `config.max_items` as a "most recent N" cap on the listing phase.
pub async fn fetch_playlist(
    provider: &dyn MetadataProvider,
    collection: &str,
    config: &FetchConfig,
    events: &broadcast::Sender<MirrorEvent>,
) -> Result<Vec<PartialItem>> {
    let mut items = list_collection(provider, collection, config, events).await?;
    enrich_durations(provider, &mut items, config).await?;
    info!(collection, items = items.len(), "metadata fetch complete");
    Ok(items)
}

/// Phase 1: accumulate listing pages until the cursor runs out or the cap is
/// reached
async fn list_collection(
    provider: &dyn MetadataProvider,
    collection: &str,
    config: &FetchConfig,
    events: &broadcast::Sender<MirrorEvent>,
) -> Result<Vec<PartialItem>> {
    if config.max_items == Some(0) {
        return Ok(Vec::new());
    }

    let mut accumulated: Vec<PartialItem> = Vec::new();
    let mut cursor: Option<String> = None;

    loop {
        // Never request more than still needed under a cap
        let page_size = match config.max_items {
            Some(cap) => config.page_size.min(cap - accumulated.len()),
            None => config.page_size,
        };

        let page = provider
            .list_page(collection, page_size, cursor.as_deref())
            .await?;
        accumulated.extend(page.entries);
        debug!(fetched = accumulated.len(), "accumulated listing page");
        let _ = events.send(MirrorEvent::FetchProgress {
            fetched: accumulated.len(),
        });

        if let Some(cap) = config.max_items
            && accumulated.len() >= cap
        {
            accumulated.truncate(cap);
            break;
        }
        match page.next_cursor {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }

    Ok(accumulated)
}

/// Phase 2: batch identifiers at the provider's per-call maximum and fetch
/// durations concurrently
///
/// Identifiers absent from the response (removed between phases) keep
/// duration `0`.
async fn enrich_durations(
    provider: &dyn MetadataProvider,
    items: &mut [PartialItem],
    config: &FetchConfig,
) -> Result<()> {
    if items.is_empty() {
        return Ok(());
    }

    let ids: Vec<ItemId> = items.iter().map(|item| item.id.clone()).collect();
    let batches: Vec<Vec<ItemId>> = ids
        .chunks(config.detail_batch_size)
        .map(<[ItemId]>::to_vec)
        .collect();
    debug!(
        batches = batches.len(),
        concurrency = config.request_concurrency,
        "enriching durations"
    );

    let mut detail_stream = futures::stream::iter(
        batches
            .into_iter()
            .map(|batch| async move { provider.details(&batch).await }),
    )
    .buffer_unordered(config.request_concurrency);

    let mut durations: HashMap<ItemId, f64> = HashMap::new();
    while let Some(batch_result) = detail_stream.next().await {
        for detail in batch_result? {
            let seconds = parse_duration_expression(&detail.duration).ok_or_else(|| {
                ProviderError::InvalidDuration {
                    id: detail.id.to_string(),
                    expression: detail.duration.clone(),
                }
            })?;
            durations.insert(detail.id, seconds);
        }
    }

    for item in items.iter_mut() {
        if let Some(seconds) = durations.get(&item.id) {
            item.duration_secs = to_whole_seconds(*seconds);
        }
    }
    Ok(())
}
