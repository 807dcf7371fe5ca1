//! Shared helpers for unit tests

use chrono::{TimeZone, Utc};

use crate::provider::{channel_url, item_url};
use crate::types::{ItemId, PartialItem, PlaylistItem};

/// Build a plain available partial item with a deterministic timestamp
///
/// `added_offset_secs` shifts the collection-add timestamp so tests can
/// control sort order.
pub(crate) fn partial_item(id: &str, added_offset_secs: i64) -> PartialItem {
    let id = ItemId::new(id);
    let added_at = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
        + chrono::Duration::seconds(added_offset_secs);
    PartialItem {
        url: item_url(&id),
        channel_url: channel_url("UCtest"),
        thumbnail_url: Some(format!("https://img.example/{id}.jpg")),
        title: format!("Title {id}"),
        description: String::new(),
        channel_id: "UCtest".into(),
        channel_title: "Test Channel".into(),
        published_at: Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap(),
        added_at,
        duration_secs: 60,
        unavailable: false,
        id,
    }
}

/// Build a fully enriched item from a partial
pub(crate) fn item(id: &str, added_offset_secs: i64) -> PlaylistItem {
    partial_item(id, added_offset_secs).into_item(None, None)
}
