//! Network collaborators of the core
//!
//! - [`fetcher`] - rate-limited HTTP transport and article download
//! - [`metadata`] - feed page loader backed by the REST metadata endpoint

pub mod fetcher;
pub mod metadata;

pub use fetcher::{parse_article_url, ArticleFetcher, HttpFetcher};
pub use metadata::{FeedApi, MetadataPage};
