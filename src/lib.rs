//! vnews - news reader core
//!
//! Article body extraction for Vietnamese news sites, and a paginated feed
//! cache with request coalescing and speculative preload.
//!
//! # Architecture
//!
//! - [`parser`] - HTML document tree, content locator, block extractor, inline tokenizer
//! - [`cache`] - TTL page cache with category-scoped invalidation
//! - [`preload`] - read-through coordinator, prefetch and infinite-scroll feed state
//! - [`crawler`] - HTTP transport, metadata endpoint loader, article fetcher
//! - [`config`] - configuration management and settings
//! - [`models`] - feed records and categories
//! - [`metrics`] - Prometheus metrics
//! - [`utils`] - retry, error types and helpers
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use vnews::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let cache = Arc::new(PageCache::new(config.cache_ttl()));
//!     let loader = Arc::new(FeedApi::new(&config.api)?);
//!     let coordinator = PreloadCoordinator::new(cache, loader, (&config.feed).into());
//!
//!     let page = coordinator.load_page(NewsCategory::Latest.id(), 1).await?;
//!     println!("{} articles", page.len());
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod config;
pub mod crawler;
pub mod error;
pub mod metrics;
pub mod models;
pub mod parser;
pub mod preload;
pub mod utils;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::cache::{CacheKey, PageCache};
    pub use crate::config::Config;
    pub use crate::crawler::{ArticleFetcher, FeedApi};
    pub use crate::error::{ErrorCategory, VnewsErrorTrait};
    pub use crate::models::{ArticleSummary, NewsCategory, Page};
    pub use crate::parser::{ContentBlock, ContentExtractor, ExtractionResult, InlineRun};
    pub use crate::preload::{FeedSession, PageLoader, PreloadCoordinator, PreloadStatus};
    pub use crate::utils::error::{FetchError, LoadError};
}

// Direct re-exports for convenience
pub use models::{ArticleSummary, NewsCategory, Page};
