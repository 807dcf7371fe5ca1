//! Core types and events for playlist-mirror

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Unique identifier for a collection item
///
/// Item identifiers are opaque strings assigned by the metadata provider.
/// They are stable across runs and unique within a collection, which makes
/// them the join key between fetched metadata, on-disk artifacts, and the
/// persisted store.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub String);

impl ItemId {
    /// Create a new ItemId
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the inner string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ItemId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for ItemId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A fully enriched collection item, as persisted in the metadata store
///
/// Produced by the executor from a [`PartialItem`] once the download worker
/// has reported resolved file extensions (or immediately, with no extensions,
/// for items that required no download).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistItem {
    /// Stable provider-assigned identifier
    pub id: ItemId,

    /// Item title
    pub title: String,

    /// Item description (may be empty)
    #[serde(default)]
    pub description: String,

    /// Owning-channel identifier (empty when the source entry no longer
    /// exposes an owner, e.g. removed or private items)
    #[serde(default)]
    pub channel_id: String,

    /// Owning-channel display name (empty when unknown)
    #[serde(default)]
    pub channel_title: String,

    /// When the item itself was created/published
    pub published_at: DateTime<Utc>,

    /// When the item was added to the collection
    pub added_at: DateTime<Utc>,

    /// Best-available thumbnail URL, picked by descending-resolution
    /// preference order; `None` when the entry carries no thumbnails
    pub thumbnail_url: Option<String>,

    /// Duration in whole seconds; `0` when undetermined
    #[serde(default)]
    pub duration_secs: u64,

    /// Canonical item URL
    pub url: String,

    /// Canonical channel URL; `None` when there is no channel id
    pub channel_url: Option<String>,

    /// Resolved audio file extension, once an audio artifact has been
    /// downloaded; never erased by a failed or skipped run
    pub audio_ext: Option<String>,

    /// Resolved video file extension, once a video artifact has been
    /// downloaded; never erased by a failed or skipped run
    pub video_ext: Option<String>,

    /// Whether the source entry is no longer retrievable (private/deleted)
    #[serde(default)]
    pub unavailable: bool,
}

/// A collection entry before extension enrichment
///
/// The intermediate form produced by the fetch: phase 1 fills everything but
/// the duration, phase 2 fills the duration. Partial items are created per
/// run and never persisted directly.
#[derive(Clone, Debug, PartialEq)]
pub struct PartialItem {
    /// Stable provider-assigned identifier
    pub id: ItemId,
    /// Item title (sentinel titles mark unavailable entries)
    pub title: String,
    /// Item description (may be empty)
    pub description: String,
    /// Owning-channel identifier (empty when unknown)
    pub channel_id: String,
    /// Owning-channel display name (empty when unknown)
    pub channel_title: String,
    /// When the item itself was created/published
    pub published_at: DateTime<Utc>,
    /// When the item was added to the collection
    pub added_at: DateTime<Utc>,
    /// Best-available thumbnail URL
    pub thumbnail_url: Option<String>,
    /// Duration in whole seconds; `0` until phase 2 enrichment, and kept `0`
    /// for identifiers absent from the enrichment response
    pub duration_secs: u64,
    /// Canonical item URL
    pub url: String,
    /// Canonical channel URL
    pub channel_url: Option<String>,
    /// Whether the source entry is no longer retrievable
    pub unavailable: bool,
}

impl PartialItem {
    /// Complete this partial item into a [`PlaylistItem`] with the given
    /// resolved extensions
    pub fn into_item(self, audio_ext: Option<String>, video_ext: Option<String>) -> PlaylistItem {
        PlaylistItem {
            id: self.id,
            title: self.title,
            description: self.description,
            channel_id: self.channel_id,
            channel_title: self.channel_title,
            published_at: self.published_at,
            added_at: self.added_at,
            thumbnail_url: self.thumbnail_url,
            duration_secs: self.duration_secs,
            url: self.url,
            channel_url: self.channel_url,
            audio_ext,
            video_ext,
            unavailable: self.unavailable,
        }
    }
}

/// The artifact action selected for one item by the work planner
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkAction {
    /// Download video and keep the extracted audio as a separate artifact
    ///
    /// Preferred over two independent requests: the worker extracts audio
    /// from the same video fetch, avoiding a duplicate network transfer.
    DownloadBoth,
    /// Download the audio artifact only
    DownloadAudio,
    /// Download the video artifact only
    DownloadVideo,
    /// No download; the item's metadata is still recorded in the store
    RecordOnly,
}

impl WorkAction {
    /// Whether this action requests an audio artifact
    pub fn wants_audio(&self) -> bool {
        matches!(self, WorkAction::DownloadBoth | WorkAction::DownloadAudio)
    }

    /// Whether this action requests a video artifact
    pub fn wants_video(&self) -> bool {
        matches!(self, WorkAction::DownloadBoth | WorkAction::DownloadVideo)
    }

    /// Whether this action invokes the download worker at all
    pub fn is_download(&self) -> bool {
        !matches!(self, WorkAction::RecordOnly)
    }
}

impl std::fmt::Display for WorkAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            WorkAction::DownloadBoth => "both",
            WorkAction::DownloadAudio => "audio",
            WorkAction::DownloadVideo => "video",
            WorkAction::RecordOnly => "record-only",
        };
        write!(f, "{s}")
    }
}

/// One planned unit of work: an item and the action chosen for it
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkItem {
    /// The item to act on
    pub id: ItemId,
    /// The selected action
    pub action: WorkAction,
}

/// Which item identifiers already have artifacts of each kind on disk
///
/// Produced by the disk state scanner. A missing directory scans to an empty
/// set, not an error.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DiskState {
    /// Identifiers with an audio artifact present
    pub audio: HashSet<ItemId>,
    /// Identifiers with a video artifact present
    pub video: HashSet<ItemId>,
    /// Identifiers with a thumbnail present
    pub thumbnails: HashSet<ItemId>,
}

impl DiskState {
    /// Whether an audio artifact exists for the given item
    pub fn has_audio(&self, id: &ItemId) -> bool {
        self.audio.contains(id)
    }

    /// Whether a video artifact exists for the given item
    pub fn has_video(&self, id: &ItemId) -> bool {
        self.video.contains(id)
    }

    /// Whether a thumbnail exists for the given item
    pub fn has_thumbnail(&self, id: &ItemId) -> bool {
        self.thumbnails.contains(id)
    }
}

/// Progress events emitted during a mirror run
///
/// Consumers subscribe via [`crate::mirror::PlaylistMirror::subscribe`]; with
/// no subscribers the channel is a no-op. This is the library's observer
/// surface; there is no global logging switch.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "snake_case", tag = "event")]
pub enum MirrorEvent {
    /// Metadata fetch started for a collection
    FetchStarted {
        /// The collection being listed
        collection: String,
    },
    /// A page of collection entries was accumulated
    FetchProgress {
        /// Entries accumulated so far
        fetched: usize,
    },
    /// The work planner produced its action list
    PlanReady {
        /// Items fetched from the provider
        fetched: usize,
        /// Items with a download action planned
        planned: usize,
    },
    /// A worker invocation started
    ItemStarted {
        /// The item being downloaded
        id: ItemId,
        /// The action being performed
        action: WorkAction,
    },
    /// A worker invocation completed successfully
    ItemCompleted {
        /// The downloaded item
        id: ItemId,
    },
    /// A worker invocation or thumbnail fetch failed; the run continues
    ItemFailed {
        /// The failed item
        id: ItemId,
        /// Human-readable failure reason
        reason: String,
    },
    /// The metadata store was rewritten
    StorePersisted {
        /// Number of records that changed
        mutations: usize,
    },
    /// The run finished
    RunCompleted {
        /// Items downloaded successfully
        downloaded: usize,
        /// Items that failed
        failed: usize,
    },
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn partial(id: &str) -> PartialItem {
        PartialItem {
            id: ItemId::new(id),
            title: "A Title".into(),
            description: String::new(),
            channel_id: "chan1".into(),
            channel_title: "Channel".into(),
            published_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            added_at: Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap(),
            thumbnail_url: None,
            duration_secs: 120,
            url: "https://example.com/watch?v=a".into(),
            channel_url: Some("https://example.com/channel/chan1".into()),
            unavailable: false,
        }
    }

    #[test]
    fn item_id_display_and_as_str_agree() {
        let id = ItemId::new("dQw4w9WgXcQ");
        assert_eq!(id.to_string(), "dQw4w9WgXcQ");
        assert_eq!(id.as_str(), "dQw4w9WgXcQ");
    }

    #[test]
    fn item_id_serializes_transparently() {
        let id = ItemId::new("abc123");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc123\"");
        let back: ItemId = serde_json::from_str("\"abc123\"").unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn into_item_carries_all_fields_and_extensions() {
        let p = partial("a");
        let item = p.clone().into_item(Some("m4a".into()), Some("mp4".into()));
        assert_eq!(item.id, p.id);
        assert_eq!(item.title, p.title);
        assert_eq!(item.duration_secs, 120);
        assert_eq!(item.audio_ext.as_deref(), Some("m4a"));
        assert_eq!(item.video_ext.as_deref(), Some("mp4"));
        assert!(!item.unavailable);
    }

    #[test]
    fn work_action_artifact_flags() {
        assert!(WorkAction::DownloadBoth.wants_audio());
        assert!(WorkAction::DownloadBoth.wants_video());
        assert!(WorkAction::DownloadAudio.wants_audio());
        assert!(!WorkAction::DownloadAudio.wants_video());
        assert!(!WorkAction::DownloadVideo.wants_audio());
        assert!(WorkAction::DownloadVideo.wants_video());
        assert!(!WorkAction::RecordOnly.wants_audio());
        assert!(!WorkAction::RecordOnly.wants_video());
        assert!(!WorkAction::RecordOnly.is_download());
    }

    #[test]
    fn playlist_item_round_trips_through_json() {
        let item = partial("x").into_item(Some("opus".into()), None);
        let json = serde_json::to_string(&item).unwrap();
        let back: PlaylistItem = serde_json::from_str(&json).unwrap();
        assert_eq!(back, item);
    }

    #[test]
    fn playlist_item_json_uses_camel_case_keys() {
        let item = partial("x").into_item(None, None);
        let value: serde_json::Value = serde_json::to_value(&item).unwrap();
        assert!(value.get("addedAt").is_some());
        assert!(value.get("durationSecs").is_some());
        assert!(value.get("channelId").is_some());
        assert!(value.get("added_at").is_none());
    }

    #[test]
    fn disk_state_lookups() {
        let mut state = DiskState::default();
        state.audio.insert(ItemId::new("a"));
        state.thumbnails.insert(ItemId::new("b"));
        assert!(state.has_audio(&ItemId::new("a")));
        assert!(!state.has_video(&ItemId::new("a")));
        assert!(state.has_thumbnail(&ItemId::new("b")));
        assert!(!state.has_thumbnail(&ItemId::new("a")));
    }
}
