//! HTTP fetching with rate limiting and retry
//!
//! [`HttpFetcher`] is the shared transport: one reqwest client, a governor
//! rate limiter and exponential backoff on transient failures (timeouts,
//! connection errors, 429 and 5xx). [`ArticleFetcher`] builds on it to
//! download an article page and run content extraction over it.

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE},
    Client, Response, StatusCode,
};
use serde::de::DeserializeOwned;
use std::num::NonZeroU32;
use std::time::Duration;
use url::Url;

use crate::config::{ApiSettings, Config};
use crate::parser::{ContentExtractor, ExtractionResult};
use crate::utils::error::FetchError;
use crate::utils::retry::{with_retry_if, RetryConfig};

/// Rate-limited HTTP client with retry
pub struct HttpFetcher {
    client: Client,
    rate_limiter: DefaultDirectRateLimiter,
    retry: RetryConfig,
}

impl HttpFetcher {
    /// Build a fetcher from the API section of the configuration
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Http` if the HTTP client cannot be created
    pub fn new(settings: &ApiSettings) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static("vi-VN,vi;q=0.9,en-US;q=0.8,en;q=0.7"),
        );
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/json;q=0.9,*/*;q=0.8"),
        );

        let client = Client::builder()
            .user_agent(&settings.user_agent)
            .timeout(Duration::from_secs(settings.timeout_secs))
            .default_headers(headers)
            .gzip(true)
            .build()?;

        let rate = NonZeroU32::new(settings.requests_per_second).unwrap_or(NonZeroU32::MIN);

        Ok(Self {
            client,
            rate_limiter: RateLimiter::direct(Quota::per_second(rate)),
            retry: RetryConfig::from_api(settings),
        })
    }

    /// GET `url` and return the body as text
    pub async fn get_text(&self, url: &Url) -> Result<String, FetchError> {
        with_retry_if(
            &self.retry,
            || async move {
                let response = self.send(url).await?;
                response
                    .text()
                    .await
                    .map_err(|e| FetchError::Decode(e.to_string()))
            },
            FetchError::is_transient,
        )
        .await
    }

    /// GET `url` and decode the body as JSON
    pub async fn get_json<T: DeserializeOwned>(&self, url: &Url) -> Result<T, FetchError> {
        with_retry_if(
            &self.retry,
            || async move {
                let response = self.send(url).await?;
                let bytes = response.bytes().await.map_err(classify)?;
                serde_json::from_slice(&bytes).map_err(|e| FetchError::Decode(e.to_string()))
            },
            FetchError::is_transient,
        )
        .await
    }

    /// One rate-limited attempt; non-success statuses become errors
    async fn send(&self, url: &Url) -> Result<Response, FetchError> {
        self.rate_limiter.until_ready().await;

        tracing::trace!(url = %url, "Sending request");
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(classify)?;

        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else if status == StatusCode::TOO_MANY_REQUESTS {
            Err(FetchError::RateLimit)
        } else {
            Err(FetchError::ServerError(status.as_u16()))
        }
    }
}

fn classify(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::Http(err)
    }
}

/// Parse an article URL, accepting only http(s)
pub fn parse_article_url(raw: &str) -> Result<Url, FetchError> {
    let url = Url::parse(raw.trim()).map_err(|e| FetchError::InvalidUrl(format!("{raw}: {e}")))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(FetchError::InvalidUrl(format!(
            "{raw}: unsupported scheme {other}"
        ))),
    }
}

/// Downloads article pages and extracts their content
pub struct ArticleFetcher {
    http: HttpFetcher,
    extractor: ContentExtractor,
}

impl ArticleFetcher {
    /// # Errors
    ///
    /// Returns `FetchError::Http` if the HTTP client cannot be created
    pub fn new(config: &Config) -> Result<Self, FetchError> {
        Ok(Self {
            http: HttpFetcher::new(&config.api)?,
            extractor: ContentExtractor::from_settings(&config.extraction),
        })
    }

    pub fn extractor(&self) -> &ContentExtractor {
        &self.extractor
    }

    /// Raw HTML of the article at `url`
    pub async fn fetch_html(&self, url: &str) -> Result<String, FetchError> {
        let url = parse_article_url(url)?;
        let _timer = crate::metrics::start_request_timer("article");
        self.http.get_text(&url).await
    }

    /// Download the article at `url` and extract its content blocks
    ///
    /// Only transport failures are errors; a page without a recognizable
    /// body yields the placeholder result.
    pub async fn fetch_article(&self, url: &str) -> Result<ExtractionResult, FetchError> {
        let html = self.fetch_html(url).await?;
        let result = self.extractor.extract(&html);

        tracing::info!(
            url = url,
            bytes = html.len(),
            blocks = result.blocks.len(),
            "Fetched article"
        );

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_article_url() {
        assert!(parse_article_url("https://vnexpress.net/a-123.html").is_ok());
        assert!(parse_article_url("  http://example.com/x  ").is_ok());
        assert!(matches!(
            parse_article_url("ftp://example.com/x"),
            Err(FetchError::InvalidUrl(_))
        ));
        assert!(matches!(
            parse_article_url("not a url"),
            Err(FetchError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_fetcher_builds_with_defaults() {
        assert!(HttpFetcher::new(&ApiSettings::default()).is_ok());
        assert!(ArticleFetcher::new(&Config::default()).is_ok());
    }
}
