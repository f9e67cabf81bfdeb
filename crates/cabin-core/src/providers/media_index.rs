//! Media index service: playlist listing and stream resolution.

use async_trait::async_trait;
use serde::Deserialize;

use super::{MediaIndex, ProviderError};
use crate::config;

/// One playlist entry as the index reports it. Fields may be missing for
/// unavailable or delisted items; entries without a `url` are unplayable.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PlaylistEntry {
    /// Track title.
    pub title: Option<String>,
    /// Uploader / artist name.
    pub uploader: Option<String>,
    /// Entry reference used for stream resolution.
    pub url: Option<String>,
}

/// A resolved stream for one entry.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StreamInfo {
    /// Direct stream URL, absent when resolution produced nothing playable.
    pub url: Option<String>,
    /// Track title.
    pub title: Option<String>,
    /// Uploader / artist name.
    pub uploader: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlaylistResponse {
    #[serde(default)]
    entries: Vec<PlaylistEntry>,
}

/// Media index backed by an HTTP resolver service.
pub struct HttpMediaIndex {
    client: reqwest::Client,
    base_url: String,
}

impl HttpMediaIndex {
    /// Create an index client against the default service.
    pub fn new(client: reqwest::Client) -> Self {
        Self::with_base_url(client, config::MEDIA_INDEX_URL)
    }

    /// Create an index client against a specific service.
    pub fn with_base_url(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl MediaIndex for HttpMediaIndex {
    async fn fetch_playlist(&self, source_url: &str) -> Result<Vec<PlaylistEntry>, ProviderError> {
        let url = format!("{}/playlist", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("url", source_url)])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ProviderError::Status(response.status().as_u16()));
        }

        let body: PlaylistResponse = response.json().await?;
        Ok(body.entries)
    }

    async fn resolve_stream(&self, entry_url: &str) -> Result<StreamInfo, ProviderError> {
        let url = format!("{}/stream", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("url", entry_url)])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ProviderError::Status(response.status().as_u16()));
        }

        Ok(response.json().await?)
    }
}
