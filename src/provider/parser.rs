//! Typed parsing of provider responses
//!
//! Raw response bodies are deserialized into loosely-typed shapes and then
//! validated by explicit parse functions. Expected variability, such as
//! missing owner fields on removed or private entries, parses into empty fields;
//! anything else that deviates from the contract is a fatal
//! [`ProviderError::Schema`]. Nothing in this module panics on provider
//! input.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;

use super::{ItemDetail, ListPage, channel_url, item_url};
use crate::error::{ProviderError, Result};
use crate::types::{ItemId, PartialItem};

/// Titles the provider substitutes for entries that can no longer be listed
const SENTINEL_TITLES: &[&str] = &["Private video", "Deleted video"];

/// Thumbnail variants in descending-resolution preference order
const THUMBNAIL_PREFERENCE: &[&str] = &["maxres", "standard", "high", "medium", "default"];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct RawListResponse {
    #[serde(default)]
    items: Vec<RawEntry>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEntry {
    snippet: Option<RawSnippet>,
    content_details: Option<RawEntryContentDetails>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSnippet {
    title: Option<String>,
    #[serde(default)]
    description: String,
    /// When the entry was added to the collection
    published_at: Option<DateTime<Utc>>,
    video_owner_channel_id: Option<String>,
    video_owner_channel_title: Option<String>,
    resource_id: Option<RawResourceId>,
    #[serde(default)]
    thumbnails: HashMap<String, RawThumbnail>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawResourceId {
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawThumbnail {
    url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEntryContentDetails {
    /// When the item itself was published; absent for removed/private items
    video_published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct RawDetailResponse {
    #[serde(default)]
    items: Vec<RawDetailItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDetailItem {
    id: Option<String>,
    content_details: Option<RawVideoContentDetails>,
}

#[derive(Debug, Deserialize)]
struct RawVideoContentDetails {
    duration: Option<String>,
}

/// Parse a listing response body into a page of partial items
pub(super) fn parse_list_body(body: &str) -> Result<ListPage> {
    let raw: RawListResponse = serde_json::from_str(body).map_err(|e| ProviderError::Schema {
        context: format!("listing response: {e}"),
    })?;

    let entries = raw
        .items
        .into_iter()
        .map(parse_entry)
        .collect::<Result<Vec<_>>>()?;

    Ok(ListPage {
        entries,
        next_cursor: raw.next_page_token,
    })
}

/// Parse a detail response body into duration details
pub(super) fn parse_detail_body(body: &str) -> Result<Vec<ItemDetail>> {
    let raw: RawDetailResponse = serde_json::from_str(body).map_err(|e| ProviderError::Schema {
        context: format!("detail response: {e}"),
    })?;

    raw.items
        .into_iter()
        .map(|item| {
            let id = item.id.ok_or_else(|| ProviderError::Schema {
                context: "detail item missing id".into(),
            })?;
            let duration = item
                .content_details
                .and_then(|d| d.duration)
                .ok_or_else(|| ProviderError::Schema {
                    context: format!("detail item {id} missing duration"),
                })?;
            Ok(ItemDetail {
                id: ItemId::new(id),
                duration,
            })
        })
        .collect()
}

/// Validate one raw listing entry into a [`PartialItem`]
fn parse_entry(raw: RawEntry) -> Result<PartialItem> {
    let snippet = raw.snippet.ok_or_else(|| ProviderError::Schema {
        context: "listing entry missing snippet".into(),
    })?;

    let id = snippet
        .resource_id
        .and_then(|r| r.video_id)
        .ok_or_else(|| ProviderError::Schema {
            context: "listing entry missing resource video id".into(),
        })?;
    let id = ItemId::new(id);

    let title = snippet.title.ok_or_else(|| ProviderError::Schema {
        context: format!("listing entry {id} missing title"),
    })?;

    let added_at = snippet.published_at.ok_or_else(|| ProviderError::Schema {
        context: format!("listing entry {id} missing publishedAt"),
    })?;

    let unavailable = SENTINEL_TITLES.contains(&title.as_str());

    // Removed/private placeholders omit the item's own publish timestamp;
    // fall back to the collection-add timestamp.
    let published_at = raw
        .content_details
        .and_then(|d| d.video_published_at)
        .unwrap_or(added_at);

    let channel_id = snippet.video_owner_channel_id.unwrap_or_default();
    let channel_title = snippet.video_owner_channel_title.unwrap_or_default();

    Ok(PartialItem {
        url: item_url(&id),
        channel_url: channel_url(&channel_id),
        thumbnail_url: pick_thumbnail(&snippet.thumbnails),
        id,
        title,
        description: snippet.description,
        channel_id,
        channel_title,
        published_at,
        added_at,
        duration_secs: 0,
        unavailable,
    })
}

/// Pick the best-available thumbnail by descending-resolution preference
fn pick_thumbnail(thumbnails: &HashMap<String, RawThumbnail>) -> Option<String> {
    THUMBNAIL_PREFERENCE
        .iter()
        .find_map(|variant| thumbnails.get(*variant))
        .map(|t| t.url.clone())
}
