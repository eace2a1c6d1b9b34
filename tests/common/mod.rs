//! Common test utilities

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use vnews::cache::{CacheKey, PageCache};
use vnews::models::{ArticleSummary, Page};
use vnews::preload::{LoadResult, PageLoader, PreloadCoordinator, PreloadSettings};
use vnews::utils::error::LoadError;

pub const PAGE_SIZE: u32 = 20;

pub const TTL: Duration = Duration::from_secs(300);

/// Page of `len` synthetic articles for `key`
pub fn make_page(key: CacheKey, len: usize) -> Page {
    (0..len)
        .map(|i| {
            ArticleSummary::new(
                format!("Bài {}-{}-{i}", key.category_id, key.page),
                format!("https://vnexpress.net/{}-{}-{i}.html", key.category_id, key.page),
            )
        })
        .collect()
}

/// Scriptable loader that counts calls per key
pub struct StubLoader {
    default_len: usize,
    lengths: HashMap<u32, usize>,
    failing: HashSet<u32>,
    delay: Duration,
    calls: Mutex<HashMap<CacheKey, usize>>,
}

#[allow(dead_code)]
impl StubLoader {
    /// Every page returns `default_len` articles
    pub fn new(default_len: usize) -> Self {
        Self {
            default_len,
            lengths: HashMap::new(),
            failing: HashSet::new(),
            delay: Duration::ZERO,
            calls: Mutex::new(HashMap::new()),
        }
    }

    /// Page number `page` returns `len` articles
    pub fn with_page(mut self, page: u32, len: usize) -> Self {
        self.lengths.insert(page, len);
        self
    }

    /// Page number `page` fails
    pub fn failing_on(mut self, page: u32) -> Self {
        self.failing.insert(page);
        self
    }

    /// Every load sleeps for `delay` first
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls_for(&self, key: &CacheKey) -> usize {
        self.calls.lock().unwrap().get(key).copied().unwrap_or(0)
    }

    /// Calls for `page` across every category and page size
    pub fn calls_for_page(&self, page: u32) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(key, _)| key.page == page)
            .map(|(_, n)| n)
            .sum()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }
}

#[async_trait]
impl PageLoader for StubLoader {
    async fn load(&self, key: CacheKey) -> LoadResult {
        *self.calls.lock().unwrap().entry(key).or_insert(0) += 1;

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        if self.failing.contains(&key.page) {
            return Err(LoadError::Upstream(format!("page {} unavailable", key.page)));
        }

        let len = self.lengths.get(&key.page).copied().unwrap_or(self.default_len);
        Ok(make_page(key, len))
    }
}

/// Coordinator over a fresh cache and `loader`
#[allow(dead_code)]
pub fn coordinator_with(loader: Arc<StubLoader>) -> PreloadCoordinator {
    PreloadCoordinator::new(
        Arc::new(PageCache::new(TTL)),
        loader,
        PreloadSettings {
            page_size: PAGE_SIZE,
            prefetch_pages: 3,
        },
    )
}
