//! Work planner (the diff engine)
//!
//! Combines fetched metadata, disk state, and the configured download mode
//! into the concrete per-item action list. Pure functions, no I/O.

use tracing::debug;

use crate::config::{DownloadConfig, DownloadMode};
use crate::types::{DiskState, PartialItem, WorkAction, WorkItem};

/// Produce the work-item list for a set of enriched items
///
/// An item is excluded entirely when its duration exceeds the configured
/// maximum, when it is marked unavailable, or when every artifact the mode
/// requires is already present on disk. Input order is preserved.
pub fn plan_work(
    items: &[PartialItem],
    disk: &DiskState,
    download: &DownloadConfig,
) -> Vec<WorkItem> {
    let max_secs = download.max_duration.map(|d| d.as_secs());

    let work: Vec<WorkItem> = items
        .iter()
        .filter(|item| !item.unavailable)
        .filter(|item| max_secs.is_none_or(|max| item.duration_secs <= max))
        .filter_map(|item| {
            select_action(
                download.mode,
                disk.has_audio(&item.id),
                disk.has_video(&item.id),
            )
            .map(|action| WorkItem {
                id: item.id.clone(),
                action,
            })
        })
        .collect();

    debug!(
        items = items.len(),
        planned = work.len(),
        mode = ?download.mode,
        "planned work"
    );
    work
}

/// Select the action for one item, or `None` when nothing is missing
///
/// `DownloadBoth` is preferred over issuing two independent requests because
/// the worker can extract audio from the same video fetch.
fn select_action(mode: DownloadMode, has_audio: bool, has_video: bool) -> Option<WorkAction> {
    match mode {
        DownloadMode::Both => match (has_audio, has_video) {
            (false, false) => Some(WorkAction::DownloadBoth),
            (true, false) => Some(WorkAction::DownloadVideo),
            (false, true) => Some(WorkAction::DownloadAudio),
            (true, true) => None,
        },
        DownloadMode::Audio => (!has_audio).then_some(WorkAction::DownloadAudio),
        DownloadMode::Video => (!has_video).then_some(WorkAction::DownloadVideo),
        DownloadMode::None => Some(WorkAction::RecordOnly),
    }
}
