//! Error types for the vnews client
//!
//! This module defines the error types of the network layer and of page
//! loading.

use thiserror::Error;

/// Errors that can occur during HTTP fetching operations
#[derive(Error, Debug)]
pub enum FetchError {
    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimit,

    /// Server error with status code
    #[error("Server error: {0}")]
    ServerError(u16),

    /// Request timeout
    #[error("Request timeout")]
    Timeout,

    /// Response body could not be decoded
    #[error("Decoding error: {0}")]
    Decode(String),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Backend answered with an error payload
    #[error("Backend error: {0}")]
    Backend(String),
}

impl FetchError {
    /// Whether retrying the same request may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Self::RateLimit | Self::Timeout => true,
            Self::ServerError(status) => *status >= 500,
            Self::Decode(_) | Self::InvalidUrl(_) | Self::Backend(_) => false,
        }
    }
}

/// Outcome of a failed page load
///
/// Clone so a single failure can be handed to every caller waiting on a
/// coalesced load.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// Transport or upstream failure
    #[error("Upstream failure: {0}")]
    Upstream(String),

    /// Backend reported an error
    #[error("Backend error: {0}")]
    Backend(String),

    /// The loader panicked
    #[error("Page loader panicked")]
    Panicked,

    /// The load task was cancelled before finishing
    #[error("Load aborted: {0}")]
    Aborted(String),
}

impl From<FetchError> for LoadError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Backend(message) => Self::Backend(message),
            other => Self::Upstream(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(FetchError::Timeout.is_transient());
        assert!(FetchError::RateLimit.is_transient());
        assert!(FetchError::ServerError(503).is_transient());
        assert!(!FetchError::ServerError(404).is_transient());
        assert!(!FetchError::Backend("bad category".into()).is_transient());
    }

    #[test]
    fn test_load_error_from_fetch_error() {
        assert_eq!(
            LoadError::from(FetchError::Backend("bad category".into())),
            LoadError::Backend("bad category".into())
        );
        assert_eq!(
            LoadError::from(FetchError::ServerError(502)),
            LoadError::Upstream("Server error: 502".into())
        );
    }
}
