//! In-memory pagination cache for the article feed
//!
//! Pages are stored under a [`CacheKey`] of `(category, page, page size)` and
//! expire after a fixed time-to-live. Expired entries are logically absent:
//! `get` drops them on access, `len` never counts them, `put` sweeps them
//! out before inserting, and [`PageCache::purge_expired`] removes them on
//! demand.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use vnews::cache::{CacheKey, PageCache};
//!
//! let cache = PageCache::new(Duration::from_secs(300));
//! let key = CacheKey::new(1, 1, 20);
//!
//! cache.put(key, Vec::new());
//! assert!(cache.get(&key).is_some());
//!
//! cache.invalidate_category(1);
//! assert!(cache.get(&key).is_none());
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;

use crate::models::Page;

/// Identity of one feed page
///
/// The canonical encoding is `"{category}-{page}-{page_size}"`; equal
/// triples always encode identically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CacheKey {
    pub category_id: u32,
    pub page: u32,
    pub page_size: u32,
}

impl CacheKey {
    pub const fn new(category_id: u32, page: u32, page_size: u32) -> Self {
        Self {
            category_id,
            page,
            page_size,
        }
    }

    /// Key of the page `offset` pages after this one
    #[must_use]
    pub fn advanced(&self, offset: u32) -> Self {
        Self {
            page: self.page.saturating_add(offset),
            ..*self
        }
    }

    /// Key of the following page
    #[must_use]
    pub fn next(&self) -> Self {
        self.advanced(1)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.category_id, self.page, self.page_size)
    }
}

/// Error returned when decoding a malformed cache key
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid cache key: {0}")]
pub struct InvalidCacheKey(String);

impl FromStr for CacheKey {
    type Err = InvalidCacheKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidCacheKey(s.to_string());

        let mut parts = s.split('-').map(|part| part.parse::<u32>());
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(Ok(category_id)), Some(Ok(page)), Some(Ok(page_size)), None) => {
                Ok(Self::new(category_id, page, page_size))
            }
            _ => Err(invalid()),
        }
    }
}

/// A cached page and the instant it was stored
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub key: CacheKey,
    pub value: Page,
    pub inserted_at: Instant,
}

impl CacheEntry {
    /// Stale once strictly older than `ttl`
    pub fn is_expired(&self, ttl: Duration, now: Instant) -> bool {
        now.saturating_duration_since(self.inserted_at) > ttl
    }
}

/// TTL page cache with category-scoped invalidation
///
/// Reads and writes take a short internal lock and never await.
#[derive(Debug)]
pub struct PageCache {
    ttl: Duration,
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
}

impl PageCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<CacheKey, CacheEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Cached page for `key`, if present and fresh
    pub fn get(&self, key: &CacheKey) -> Option<Page> {
        let now = Instant::now();
        let mut entries = self.lock();

        let hit = match entries.get(key) {
            Some(entry) if !entry.is_expired(self.ttl, now) => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                tracing::trace!(key = %key, "Dropped expired cache entry");
                None
            }
            None => None,
        };

        crate::metrics::record_cache_lookup(hit.is_some());
        hit
    }

    /// Whether a fresh entry exists, without touching hit/miss metrics
    pub fn contains(&self, key: &CacheKey) -> bool {
        let now = Instant::now();
        self.lock()
            .get(key)
            .is_some_and(|entry| !entry.is_expired(self.ttl, now))
    }

    /// Insert or overwrite the page for `key`; the last write wins
    pub fn put(&self, key: CacheKey, value: Page) {
        let entry = CacheEntry {
            key,
            value,
            inserted_at: Instant::now(),
        };
        let mut entries = self.lock();
        retain_fresh(&mut entries, self.ttl, entry.inserted_at);
        entries.insert(key, entry);
    }

    /// Remove every entry of `category_id`, returning how many were removed
    pub fn invalidate_category(&self, category_id: u32) -> usize {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|key, _| key.category_id != category_id);
        before - entries.len()
    }

    /// Remove every entry
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Remove expired entries, returning how many were removed
    pub fn purge_expired(&self) -> usize {
        retain_fresh(&mut self.lock(), self.ttl, Instant::now())
    }

    /// Number of live (non-expired) entries
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.lock()
            .values()
            .filter(|entry| !entry.is_expired(self.ttl, now))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Live keys, sorted
    pub fn keys(&self) -> Vec<CacheKey> {
        let now = Instant::now();
        let mut keys: Vec<_> = self
            .lock()
            .values()
            .filter(|entry| !entry.is_expired(self.ttl, now))
            .map(|entry| entry.key)
            .collect();
        keys.sort();
        keys
    }
}

/// Drop entries stale at `now`, returning how many were removed
fn retain_fresh(entries: &mut HashMap<CacheKey, CacheEntry>, ttl: Duration, now: Instant) -> usize {
    let before = entries.len();
    entries.retain(|_, entry| !entry.is_expired(ttl, now));
    before - entries.len()
}
