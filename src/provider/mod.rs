//! Metadata provider abstraction
//!
//! The provider is the paginated API the collection listing comes from. The
//! [`MetadataProvider`] trait covers the two calls the fetch engine needs:
//! a cursor-based listing and a batched detail lookup for durations. The
//! crate ships [`HttpMetadataProvider`], which speaks the provider's JSON
//! protocol over HTTP; tests substitute in-memory implementations.

mod duration;
mod http;
mod parser;

pub use duration::{parse_duration_expression, to_whole_seconds};
pub use http::HttpMetadataProvider;

use crate::error::Result;
use crate::types::{ItemId, PartialItem};
use async_trait::async_trait;

/// Base URL for canonical item links
const WATCH_URL_BASE: &str = "https://www.youtube.com/watch?v=";

/// Base URL for canonical channel links
const CHANNEL_URL_BASE: &str = "https://www.youtube.com/channel/";

/// One page of collection entries
#[derive(Clone, Debug)]
pub struct ListPage {
    /// Entries on this page, in collection order
    pub entries: Vec<PartialItem>,
    /// Opaque continuation cursor; `None` on the final page
    pub next_cursor: Option<String>,
}

/// Duration detail for one item, from the enrichment endpoint
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ItemDetail {
    /// The item the detail belongs to
    pub id: ItemId,
    /// Raw duration expression (e.g. "PT4M13S")
    pub duration: String,
}

/// A paginated source of collection metadata
///
/// Implementations must be cancel-safe: the fetch engine may drop an
/// in-flight call when the run is aborted.
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Fetch one page of collection entries
    ///
    /// # Arguments
    ///
    /// * `collection` - The collection (playlist) identifier
    /// * `page_size` - Requested page size; the provider may return fewer
    /// * `cursor` - Continuation cursor from the previous page, if any
    async fn list_page(
        &self,
        collection: &str,
        page_size: usize,
        cursor: Option<&str>,
    ) -> Result<ListPage>;

    /// Fetch duration details for a batch of identifiers
    ///
    /// Identifiers removed between listing and enrichment may be absent from
    /// the response; callers keep duration `0` for those.
    async fn details(&self, ids: &[ItemId]) -> Result<Vec<ItemDetail>>;
}

/// Canonical URL of an item
pub fn item_url(id: &ItemId) -> String {
    format!("{WATCH_URL_BASE}{id}")
}

/// Canonical URL of a channel; `None` for an empty channel id
pub fn channel_url(channel_id: &str) -> Option<String> {
    if channel_id.is_empty() {
        None
    } else {
        Some(format!("{CHANNEL_URL_BASE}{channel_id}"))
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_url_appends_identifier() {
        let url = item_url(&ItemId::new("dQw4w9WgXcQ"));
        assert_eq!(url, "https://www.youtube.com/watch?v=dQw4w9WgXcQ");
    }

    #[test]
    fn channel_url_is_none_for_empty_id() {
        assert_eq!(channel_url(""), None);
        assert_eq!(
            channel_url("UCabc").as_deref(),
            Some("https://www.youtube.com/channel/UCabc")
        );
    }
}
