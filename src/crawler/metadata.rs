//! Feed metadata endpoint client
//!
//! `GET {base}/metadata?category_id=&page=&limit=` answers either
//! `{"articles": [...], "total": n}` or `{"error": "..."}`.

use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use super::fetcher::HttpFetcher;
use crate::cache::CacheKey;
use crate::config::ApiSettings;
use crate::models::Page;
use crate::preload::{LoadResult, PageLoader};
use crate::utils::error::FetchError;

/// Raw metadata response body
#[derive(Debug, Deserialize)]
struct MetadataResponse {
    #[serde(default)]
    articles: Option<Page>,
    #[serde(default)]
    total: Option<u64>,
    #[serde(default)]
    error: Option<String>,
}

/// One page of the feed as reported by the backend
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataPage {
    pub articles: Page,
    /// Total article count of the category, when reported
    pub total: Option<u64>,
}

/// Page loader backed by the REST metadata endpoint
pub struct FeedApi {
    http: HttpFetcher,
    base_url: Url,
}

impl FeedApi {
    /// # Errors
    ///
    /// Returns `FetchError::InvalidUrl` for a malformed base URL and
    /// `FetchError::Http` if the HTTP client cannot be created
    pub fn new(settings: &ApiSettings) -> Result<Self, FetchError> {
        let base_url = Url::parse(&settings.base_url)
            .map_err(|e| FetchError::InvalidUrl(format!("{}: {e}", settings.base_url)))?;

        if base_url.cannot_be_a_base() {
            return Err(FetchError::InvalidUrl(settings.base_url.clone()));
        }

        Ok(Self {
            http: HttpFetcher::new(settings)?,
            base_url,
        })
    }

    /// Request URL of the page identified by `key`
    pub fn metadata_url(&self, key: &CacheKey) -> Result<Url, FetchError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| FetchError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .push("metadata");
        url.query_pairs_mut()
            .append_pair("category_id", &key.category_id.to_string())
            .append_pair("page", &key.page.to_string())
            .append_pair("limit", &key.page_size.to_string());
        Ok(url)
    }

    /// Fetch one page of the feed
    pub async fn fetch_metadata(&self, key: CacheKey) -> Result<MetadataPage, FetchError> {
        let url = self.metadata_url(&key)?;
        let _timer = crate::metrics::start_request_timer("metadata");

        let response: MetadataResponse = self.http.get_json(&url).await?;

        if let Some(message) = response.error {
            tracing::warn!(key = %key, error = %message, "Backend rejected metadata request");
            return Err(FetchError::Backend(message));
        }

        let articles = response.articles.unwrap_or_default();
        tracing::debug!(key = %key, items = articles.len(), total = response.total, "Fetched metadata page");

        Ok(MetadataPage {
            articles,
            total: response.total,
        })
    }
}

#[async_trait]
impl PageLoader for FeedApi {
    async fn load(&self, key: CacheKey) -> LoadResult {
        self.fetch_metadata(key)
            .await
            .map(|page| page.articles)
            .map_err(Into::into)
    }
}
