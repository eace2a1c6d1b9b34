// Core data structures shared by the feed cache and the CLI

use serde::{Deserialize, Serialize};
use std::fmt;

/// Article record as returned by the feed metadata endpoint
///
/// Passed through untouched; fields the core does not know about are kept in
/// `extra`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ArticleSummary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<serde_json::Value>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ArticleSummary {
    /// Minimal record, mostly for tests and fixtures
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            ..Default::default()
        }
    }
}

/// One page of the article feed, in server order
pub type Page = Vec<ArticleSummary>;

/// Feed categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NewsCategory {
    Latest = 1,
    World = 2,
    Business = 3,
    Life = 4,
    Health = 5,
    Culture = 6,
    Entertainment = 7,
    Sports = 8,
    Technology = 9,
}

impl NewsCategory {
    /// Create from category ID
    pub fn from_id(id: u32) -> Option<Self> {
        match id {
            1 => Some(Self::Latest),
            2 => Some(Self::World),
            3 => Some(Self::Business),
            4 => Some(Self::Life),
            5 => Some(Self::Health),
            6 => Some(Self::Culture),
            7 => Some(Self::Entertainment),
            8 => Some(Self::Sports),
            9 => Some(Self::Technology),
            _ => None,
        }
    }

    /// Category ID used by the metadata endpoint
    pub fn id(&self) -> u32 {
        *self as u32
    }

    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Latest => "latest",
            Self::World => "world",
            Self::Business => "business",
            Self::Life => "life",
            Self::Health => "health",
            Self::Culture => "culture",
            Self::Entertainment => "entertainment",
            Self::Sports => "sports",
            Self::Technology => "technology",
        }
    }

    /// Vietnamese tab label
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Latest => "Tin mới",
            Self::World => "Thế giới",
            Self::Business => "Kinh tế",
            Self::Life => "Đời sống",
            Self::Health => "Sức khỏe",
            Self::Culture => "Văn hóa",
            Self::Entertainment => "Giải trí",
            Self::Sports => "Thể thao",
            Self::Technology => "Công nghệ",
        }
    }

    /// Create from a numeric ID, English slug, or Vietnamese label
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if let Ok(id) = s.parse::<u32>() {
            return Self::from_id(id);
        }
        let lower = s.to_lowercase();
        Self::all()
            .into_iter()
            .find(|c| c.as_str() == lower || c.display_name().to_lowercase() == lower)
    }

    /// All categories in tab order
    pub fn all() -> Vec<Self> {
        vec![
            Self::Latest,
            Self::World,
            Self::Business,
            Self::Life,
            Self::Health,
            Self::Culture,
            Self::Entertainment,
            Self::Sports,
            Self::Technology,
        ]
    }
}

impl fmt::Display for NewsCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
