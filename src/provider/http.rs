//! HTTP metadata provider speaking the provider's JSON pagination protocol

use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::parser::{parse_detail_body, parse_list_body};
use super::{ItemDetail, ListPage, MetadataProvider};
use crate::error::{Error, ProviderError, Result};
use crate::types::ItemId;

/// HTTP request timeout for provider calls
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Metadata provider backed by the remote JSON API
///
/// Issues `GET {base}/playlistItems` for listing pages and
/// `GET {base}/videos` for duration details. Non-success statuses and
/// malformed bodies are fatal; this client performs no retries.
///
/// # Examples
///
/// ```no_run
/// use playlist_mirror::provider::HttpMetadataProvider;
///
/// let provider =
///     HttpMetadataProvider::new(HttpMetadataProvider::DEFAULT_API_BASE)?;
/// # Ok::<(), playlist_mirror::Error>(())
/// ```
#[derive(Debug)]
pub struct HttpMetadataProvider {
    client: reqwest::Client,
    /// API base, stored without a trailing slash
    base: String,
}

impl HttpMetadataProvider {
    /// Default API base of the hosted metadata provider
    pub const DEFAULT_API_BASE: &'static str = "https://www.googleapis.com/youtube/v3";

    /// Create a provider client for the given API base URL
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an unparsable base URL, or a
    /// network error if the HTTP client cannot be constructed.
    pub fn new(base_url: &str) -> Result<Self> {
        // Validate up front so request-time URLs cannot be malformed
        Url::parse(base_url).map_err(|e| Error::Config {
            message: format!("invalid provider base URL {base_url:?}: {e}"),
            key: Some("provider.base_url".into()),
        })?;

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("playlist-mirror/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_body(&self, url: &str, query: &[(&str, String)]) -> Result<String> {
        let response = self.client.get(url).query(query).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            }
            .into());
        }
        Ok(response.text().await?)
    }
}

#[async_trait]
impl MetadataProvider for HttpMetadataProvider {
    async fn list_page(
        &self,
        collection: &str,
        page_size: usize,
        cursor: Option<&str>,
    ) -> Result<ListPage> {
        let url = format!("{}/playlistItems", self.base);
        let mut query: Vec<(&str, String)> = vec![
            ("part", "snippet,contentDetails".to_string()),
            ("playlistId", collection.to_string()),
            ("maxResults", page_size.to_string()),
        ];
        if let Some(cursor) = cursor {
            query.push(("pageToken", cursor.to_string()));
        }

        debug!(collection, page_size, cursor = ?cursor, "requesting listing page");
        let body = self.get_body(&url, &query).await?;
        parse_list_body(&body)
    }

    async fn details(&self, ids: &[ItemId]) -> Result<Vec<ItemDetail>> {
        let url = format!("{}/videos", self.base);
        let joined = ids
            .iter()
            .map(ItemId::as_str)
            .collect::<Vec<_>>()
            .join(",");
        let query: Vec<(&str, String)> = vec![
            ("part", "contentDetails".to_string()),
            ("id", joined),
        ];

        debug!(batch = ids.len(), "requesting duration details");
        let body = self.get_body(&url, &query).await?;
        parse_detail_body(&body)
    }
}
