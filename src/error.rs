//! Error classification shared by the vnews error types
//!
//! Domain errors stay in their modules ([`FetchError`], [`LoadError`]);
//! this module gives them a common interface so callers can decide how to
//! report and whether to retry without matching on every variant.
//!
//! - [`VnewsErrorTrait`] - common interface implemented by all error types
//! - [`ErrorCategory`] - classification of errors for handling strategies
//!
//! Content extraction has no error type: it always produces a result.

pub use crate::utils::error::{FetchError, LoadError};

/// Common trait for all vnews error types
pub trait VnewsErrorTrait: std::error::Error {
    /// Check if this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Short message suitable for showing to a reader
    fn user_message(&self) -> String;

    /// Get the error category for handling strategies
    fn category(&self) -> ErrorCategory;
}

/// Classification of errors for handling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Network-related errors (HTTP, timeout, rate limit)
    Network,
    /// Errors reported by the feed backend
    Backend,
    /// Malformed responses or documents
    Parsing,
    /// Configuration and validation errors
    Config,
    /// Other/unknown errors
    Other,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Backend => "backend",
            Self::Parsing => "parsing",
            Self::Config => "config",
            Self::Other => "other",
        }
    }
}

impl VnewsErrorTrait for FetchError {
    fn is_recoverable(&self) -> bool {
        self.is_transient()
    }

    fn user_message(&self) -> String {
        match self {
            Self::Timeout => "Máy chủ phản hồi quá lâu.".to_string(),
            Self::RateLimit => "Quá nhiều yêu cầu, vui lòng thử lại sau.".to_string(),
            Self::Backend(msg) => msg.clone(),
            _ => "Không thể kết nối tới máy chủ.".to_string(),
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Decode(_) => ErrorCategory::Parsing,
            Self::InvalidUrl(_) => ErrorCategory::Config,
            Self::Backend(_) => ErrorCategory::Backend,
            _ => ErrorCategory::Network,
        }
    }
}

impl VnewsErrorTrait for LoadError {
    fn is_recoverable(&self) -> bool {
        matches!(self, Self::Upstream(_) | Self::Aborted(_))
    }

    fn user_message(&self) -> String {
        match self {
            Self::Backend(msg) => msg.clone(),
            _ => "Không thể tải tin tức.".to_string(),
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Upstream(_) => ErrorCategory::Network,
            Self::Backend(_) => ErrorCategory::Backend,
            Self::Panicked | Self::Aborted(_) => ErrorCategory::Other,
        }
    }
}
