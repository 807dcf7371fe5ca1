//! Common test utilities for playlist-mirror integration tests

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use playlist_mirror::{
    DownloadWorker, ItemDetail, ItemId, ListPage, MetadataProvider, PartialItem, Result,
    WorkerOutput, WorkerRequest,
};

/// Build an available partial item with a deterministic timestamp
///
/// `added_offset_secs` shifts the collection-add timestamp so tests can
/// control store sort order.
pub fn entry(id: &str, added_offset_secs: i64) -> PartialItem {
    let id = ItemId::new(id);
    let added_at = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
        + chrono::Duration::seconds(added_offset_secs);
    PartialItem {
        url: format!("https://www.youtube.com/watch?v={id}"),
        channel_url: Some("https://www.youtube.com/channel/UCtest".into()),
        thumbnail_url: None,
        title: format!("Title {id}"),
        description: String::new(),
        channel_id: "UCtest".into(),
        channel_title: "Test Channel".into(),
        published_at: Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap(),
        added_at,
        duration_secs: 0,
        unavailable: false,
        id,
    }
}

/// Provider serving a mutable snapshot of the collection in a single page
///
/// Tests swap the snapshot between runs to simulate upstream changes.
pub struct SnapshotProvider {
    entries: Mutex<Vec<PartialItem>>,
}

impl SnapshotProvider {
    pub fn new(entries: Vec<PartialItem>) -> Self {
        Self {
            entries: Mutex::new(entries),
        }
    }

    /// Replace the snapshot served on the next run
    pub fn set_entries(&self, entries: Vec<PartialItem>) {
        *self.entries.lock().unwrap() = entries;
    }
}

#[async_trait]
impl MetadataProvider for SnapshotProvider {
    async fn list_page(
        &self,
        _collection: &str,
        _page_size: usize,
        _cursor: Option<&str>,
    ) -> Result<ListPage> {
        Ok(ListPage {
            entries: self.entries.lock().unwrap().clone(),
            next_cursor: None,
        })
    }

    async fn details(&self, ids: &[ItemId]) -> Result<Vec<ItemDetail>> {
        Ok(ids
            .iter()
            .map(|id| ItemDetail {
                id: id.clone(),
                duration: "PT1M".into(),
            })
            .collect())
    }
}

/// Worker that records invocations and writes the artifact files a real
/// worker would produce
#[derive(Default)]
pub struct RecordingWorker {
    calls: AtomicUsize,
}

impl RecordingWorker {
    pub fn invocations(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DownloadWorker for RecordingWorker {
    async fn download(&self, request: &WorkerRequest) -> Result<WorkerOutput> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let audio_ext = request.kind.wants_audio().then(|| "m4a".to_string());
        let video_ext = request.kind.wants_video().then(|| "mp4".to_string());
        if let Some(ext) = &video_ext {
            let name = format!("{} [{}].{}", request.title, request.id, ext);
            std::fs::write(request.output_dir.join(name), b"video").unwrap();
        }
        if let Some(ext) = &audio_ext {
            let name = format!("{} [{}].{}", request.title, request.id, ext);
            std::fs::write(request.output_dir.join(name), b"audio").unwrap();
        }
        Ok(WorkerOutput {
            audio_ext,
            video_ext,
        })
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}
