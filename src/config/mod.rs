//! Configuration management for vnews
//!
//! This module handles loading and validating configuration from environment
//! variables and TOML files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::parser::blocks::{DEFAULT_GALLERY_MARKER, DEFAULT_PLACEHOLDER};
use crate::parser::locator::DEFAULT_CONTENT_SIGNATURES;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Page cache configuration
    pub cache: CacheSettings,

    /// Feed pagination and preload configuration
    pub feed: FeedSettings,

    /// Content extraction configuration
    pub extraction: ExtractionSettings,

    /// Backend API configuration
    pub api: ApiSettings,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Page cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Entry time-to-live in seconds (default: 5 minutes)
    pub ttl_secs: u64,
}

/// Feed pagination and preload configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedSettings {
    /// Articles per page
    pub page_size: u32,

    /// Pages prefetched after an explicit page load
    pub prefetch_pages: u32,

    /// Pages prefetched by the scroll trigger
    pub scroll_prefetch_pages: u32,

    /// Scroll progress (0..1) past which the scroll trigger fires
    pub scroll_threshold: f64,
}

/// Content extraction configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionSettings {
    /// Body container class markers, highest priority first
    pub content_signatures: Vec<String>,

    /// Class marker of inline photo galleries
    pub gallery_marker: String,

    /// Text of the block emitted when nothing could be extracted
    pub placeholder: String,
}

/// Backend API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    /// Base URL of the REST API (e.g., http://localhost:3001/api)
    pub base_url: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Maximum retry attempts for transient failures
    pub max_retries: u32,

    /// Base delay in milliseconds for exponential backoff
    pub retry_base_delay_ms: u64,

    /// Maximum requests per second
    pub requests_per_second: u32,

    /// User agent string
    pub user_agent: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self { ttl_secs: 300 }
    }
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            page_size: 20,
            prefetch_pages: 3,
            scroll_prefetch_pages: 2,
            scroll_threshold: 0.7,
        }
    }
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Self {
            content_signatures: DEFAULT_CONTENT_SIGNATURES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            gallery_marker: DEFAULT_GALLERY_MARKER.to_string(),
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
        }
    }
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: String::from("http://localhost:3001/api"),
            timeout_secs: 30,
            max_retries: 3,
            retry_base_delay_ms: 500,
            requests_per_second: 5,
            user_agent: format!("vnews/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse::<T>().ok())
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Unset or unparsable variables fall back to defaults.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let signatures = std::env::var("VNEWS_CONTENT_SIGNATURES")
            .ok()
            .map(|v| {
                v.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect::<Vec<_>>()
            })
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.extraction.content_signatures);

        Ok(Self {
            cache: CacheSettings {
                ttl_secs: env_parse("VNEWS_CACHE_TTL").unwrap_or(defaults.cache.ttl_secs),
            },
            feed: FeedSettings {
                page_size: env_parse("VNEWS_PAGE_SIZE").unwrap_or(defaults.feed.page_size),
                prefetch_pages: env_parse("VNEWS_PREFETCH_PAGES")
                    .unwrap_or(defaults.feed.prefetch_pages),
                scroll_prefetch_pages: env_parse("VNEWS_SCROLL_PREFETCH_PAGES")
                    .unwrap_or(defaults.feed.scroll_prefetch_pages),
                scroll_threshold: env_parse("VNEWS_SCROLL_THRESHOLD")
                    .unwrap_or(defaults.feed.scroll_threshold),
            },
            extraction: ExtractionSettings {
                content_signatures: signatures,
                gallery_marker: std::env::var("VNEWS_GALLERY_MARKER")
                    .unwrap_or(defaults.extraction.gallery_marker),
                placeholder: std::env::var("VNEWS_PLACEHOLDER")
                    .unwrap_or(defaults.extraction.placeholder),
            },
            api: ApiSettings {
                base_url: std::env::var("VNEWS_API_URL").unwrap_or(defaults.api.base_url),
                timeout_secs: env_parse("VNEWS_REQUEST_TIMEOUT")
                    .unwrap_or(defaults.api.timeout_secs),
                max_retries: env_parse("VNEWS_MAX_RETRIES").unwrap_or(defaults.api.max_retries),
                retry_base_delay_ms: env_parse("VNEWS_RETRY_BASE_DELAY_MS")
                    .unwrap_or(defaults.api.retry_base_delay_ms),
                requests_per_second: env_parse("VNEWS_RATE_LIMIT")
                    .unwrap_or(defaults.api.requests_per_second),
                user_agent: std::env::var("VNEWS_USER_AGENT").unwrap_or(defaults.api.user_agent),
            },
            logging: LoggingConfig {
                level: std::env::var("VNEWS_LOG_LEVEL").unwrap_or(defaults.logging.level),
                format: std::env::var("VNEWS_LOG_FORMAT").unwrap_or(defaults.logging.format),
            },
        })
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.cache.ttl_secs == 0 {
            anyhow::bail!("cache.ttl_secs must be greater than 0");
        }

        if self.api.requests_per_second == 0 {
            anyhow::bail!("api.requests_per_second must be greater than 0");
        }

        if self.feed.page_size == 0 {
            anyhow::bail!("feed.page_size must be greater than 0");
        }

        let threshold = self.feed.scroll_threshold;
        if threshold.is_nan() || threshold <= 0.0 || threshold >= 1.0 {
            anyhow::bail!("feed.scroll_threshold must be between 0 and 1 (exclusive)");
        }

        if self.extraction.content_signatures.is_empty() {
            anyhow::bail!("extraction.content_signatures must not be empty");
        }

        url::Url::parse(&self.api.base_url)
            .with_context(|| format!("api.base_url is not a valid URL: {}", self.api.base_url))?;

        Ok(())
    }

    /// Get cache TTL as Duration
    #[must_use]
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.ttl_secs)
    }

    /// Get request timeout as Duration
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }
}
