//! Read-through page loading with request coalescing and speculative prefetch
//!
//! [`PreloadCoordinator`] sits in front of a [`PageCache`] and a
//! [`PageLoader`]:
//!
//! - a cached page is returned without calling the loader
//! - concurrent requests for the same key share one upstream load
//! - a successful load is cached, a failed one is not
//! - the in-flight entry of a key is removed whenever its load settles,
//!   including when the loader panics
//! - a page shorter than the page size marks the end of the category, and
//!   prefetching stops past it until the category is invalidated
//!
//! Loads run as spawned tasks, so bookkeeping completes even when every
//! caller has stopped waiting.

pub mod feed;

pub use feed::{scroll_progress, FeedSession};

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::cache::{CacheKey, PageCache};
use crate::config::FeedSettings;
use crate::models::Page;
use crate::utils::error::LoadError;

/// Outcome of one page load
pub type LoadResult = Result<Page, LoadError>;

type SharedLoad = Shared<BoxFuture<'static, LoadResult>>;

/// Source of feed pages
///
/// Implementations own transport concerns such as timeouts and retries.
#[async_trait]
pub trait PageLoader: Send + Sync + 'static {
    async fn load(&self, key: CacheKey) -> LoadResult;
}

/// Adapts an async closure into a [`PageLoader`]
///
/// ```
/// use vnews::models::Page;
/// use vnews::preload::{FnLoader, PageLoader};
/// use vnews::utils::error::LoadError;
///
/// let loader = FnLoader(|_key| async { Ok::<Page, LoadError>(Vec::new()) });
/// # let _: &dyn PageLoader = &loader;
/// ```
pub struct FnLoader<F>(pub F);

#[async_trait]
impl<F, Fut> PageLoader for FnLoader<F>
where
    F: Fn(CacheKey) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = LoadResult> + Send + 'static,
{
    async fn load(&self, key: CacheKey) -> LoadResult {
        (self.0)(key).await
    }
}

/// Coordinator tuning
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreloadSettings {
    /// Items per page; also the end-of-data threshold
    pub page_size: u32,

    /// Pages prefetched after an explicit full page load
    pub prefetch_pages: u32,
}

impl Default for PreloadSettings {
    fn default() -> Self {
        Self::from(&FeedSettings::default())
    }
}

impl From<&FeedSettings> for PreloadSettings {
    fn from(feed: &FeedSettings) -> Self {
        Self {
            page_size: feed.page_size,
            prefetch_pages: feed.prefetch_pages,
        }
    }
}

/// Snapshot of coordinator occupancy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
pub struct PreloadStatus {
    pub cached_key_count: usize,
    pub in_flight_count: usize,
}

/// Summary of a finished prefetch batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PrefetchReport {
    /// Pages whose load completed successfully
    pub loaded: usize,
    /// Pages whose load failed
    pub failed: usize,
    /// Pages that were already cached when the batch was issued
    pub already_cached: usize,
}

/// Background loads issued by [`PreloadCoordinator::prefetch`]
///
/// Dropping the batch detaches the tasks; they still run to completion.
#[derive(Debug)]
pub struct PrefetchBatch {
    tasks: Vec<(CacheKey, JoinHandle<bool>)>,
    already_cached: usize,
}

impl PrefetchBatch {
    /// Keys with a load started or joined by this batch
    pub fn scheduled(&self) -> Vec<CacheKey> {
        self.tasks.iter().map(|(key, _)| *key).collect()
    }

    pub fn already_cached(&self) -> usize {
        self.already_cached
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Wait for every load in the batch
    pub async fn join(self) -> PrefetchReport {
        let mut report = PrefetchReport {
            already_cached: self.already_cached,
            ..PrefetchReport::default()
        };

        for (_, task) in self.tasks {
            match task.await {
                Ok(true) => report.loaded += 1,
                Ok(false) | Err(_) => report.failed += 1,
            }
        }

        report
    }
}

struct InFlight {
    generation: u64,
    load: SharedLoad,
}

#[derive(Default)]
struct State {
    in_flight: HashMap<CacheKey, InFlight>,
    /// Last page of each category, learned from a short page
    last_pages: HashMap<u32, u32>,
    next_generation: u64,
}

struct Inner {
    cache: Arc<PageCache>,
    loader: Arc<dyn PageLoader>,
    settings: PreloadSettings,
    state: Mutex<State>,
}

enum Begin {
    Cached(Page),
    Pending(SharedLoad),
}

/// Coalescing read-through front of the page cache
///
/// Cheap to clone; clones share cache, loader and in-flight state.
#[derive(Clone)]
pub struct PreloadCoordinator {
    inner: Arc<Inner>,
}

impl PreloadCoordinator {
    pub fn new(
        cache: Arc<PageCache>,
        loader: Arc<dyn PageLoader>,
        settings: PreloadSettings,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                cache,
                loader,
                settings,
                state: Mutex::new(State::default()),
            }),
        }
    }

    pub fn cache(&self) -> &PageCache {
        &self.inner.cache
    }

    pub fn settings(&self) -> PreloadSettings {
        self.inner.settings
    }

    /// Key of `page` in `category_id` at the configured page size
    pub fn key(&self, category_id: u32, page: u32) -> CacheKey {
        CacheKey::new(category_id, page, self.inner.settings.page_size)
    }

    /// Return the page for `key`, loading it at most once across callers
    pub async fn fetch_page(&self, key: CacheKey) -> LoadResult {
        match self.begin(key) {
            Begin::Cached(page) => Ok(page),
            Begin::Pending(load) => load.await,
        }
    }

    /// Explicit page load; a full page also prefetches the pages after it
    pub async fn load_page(&self, category_id: u32, page: u32) -> LoadResult {
        let key = self.key(category_id, page);
        let result = self.fetch_page(key).await;

        match &result {
            Ok(items) if items.len() >= self.inner.settings.page_size as usize => {
                self.prefetch(category_id, page, self.inner.settings.prefetch_pages);
            }
            Ok(items) => {
                debug!(key = %key, items = items.len(), "Short page, not prefetching");
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Page load failed");
            }
        }

        result
    }

    /// Start background loads for the `count` pages after `from_page`
    ///
    /// Returns immediately. Cached pages are skipped, pages already loading
    /// are joined rather than reloaded, and nothing past a known last page
    /// is requested. Failures are only logged.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn prefetch(&self, category_id: u32, from_page: u32, count: u32) -> PrefetchBatch {
        let last_page = self.end_of_data(category_id);
        let from = self.key(category_id, from_page);
        let mut batch = PrefetchBatch {
            tasks: Vec::new(),
            already_cached: 0,
        };

        for offset in 1..=count {
            let key = from.advanced(offset);

            if last_page.is_some_and(|last| key.page > last) {
                debug!(key = %key, last_page, "Not prefetching past the last page");
                break;
            }

            match self.begin(key) {
                Begin::Cached(_) => batch.already_cached += 1,
                Begin::Pending(load) => {
                    let task = tokio::spawn(async move {
                        match load.await {
                            Ok(_) => true,
                            Err(e) => {
                                warn!(key = %key, error = %e, "Prefetch failed");
                                crate::metrics::record_prefetch_failure(key.category_id);
                                false
                            }
                        }
                    });
                    batch.tasks.push((key, task));
                }
            }
        }

        debug!(
            category_id,
            from_page,
            count,
            scheduled = batch.tasks.len(),
            already_cached = batch.already_cached,
            "Prefetch issued"
        );

        batch
    }

    /// Drop cached pages, in-flight bookkeeping and the end marker of a category
    ///
    /// Loads already running are left to finish, but their results are not
    /// cached.
    pub fn invalidate_category(&self, category_id: u32) -> usize {
        let mut state = self.inner.lock_state();
        state.in_flight.retain(|key, _| key.category_id != category_id);
        state.last_pages.remove(&category_id);
        crate::metrics::set_in_flight(state.in_flight.len());

        let removed = self.inner.cache.invalidate_category(category_id);
        debug!(category_id, removed, "Invalidated category");
        removed
    }

    /// Empty the cache and all bookkeeping
    pub fn clear_all(&self) {
        let mut state = self.inner.lock_state();
        state.in_flight.clear();
        state.last_pages.clear();
        crate::metrics::set_in_flight(0);

        self.inner.cache.clear();
        debug!("Cleared page cache and preload state");
    }

    pub fn status(&self) -> PreloadStatus {
        let state = self.inner.lock_state();
        PreloadStatus {
            cached_key_count: self.inner.cache.len(),
            in_flight_count: state.in_flight.len(),
        }
    }

    pub fn is_in_flight(&self, key: &CacheKey) -> bool {
        self.inner.lock_state().in_flight.contains_key(key)
    }

    /// Last page of `category_id`, if a short page has been seen
    pub fn end_of_data(&self, category_id: u32) -> Option<u32> {
        self.inner.lock_state().last_pages.get(&category_id).copied()
    }

    /// Whether pages after `page` may exist
    pub fn has_more_after(&self, category_id: u32, page: u32) -> bool {
        self.end_of_data(category_id).map_or(true, |last| page < last)
    }

    /// Cached page, or join / start its load. Registration happens before
    /// returning, so two calls for one key can never both start a load.
    fn begin(&self, key: CacheKey) -> Begin {
        let mut state = self.inner.lock_state();

        if let Some(page) = self.inner.cache.get(&key) {
            return Begin::Cached(page);
        }

        if let Some(existing) = state.in_flight.get(&key) {
            debug!(key = %key, "Joining in-flight load");
            crate::metrics::record_coalesced(key.category_id);
            return Begin::Pending(existing.load.clone());
        }

        let generation = state.next_generation;
        state.next_generation += 1;

        let handle = tokio::spawn(run_load(Arc::clone(&self.inner), key, generation));
        let load = async move {
            match handle.await {
                Ok(result) => result,
                Err(e) if e.is_panic() => Err(LoadError::Panicked),
                Err(e) => Err(LoadError::Aborted(e.to_string())),
            }
        }
        .boxed()
        .shared();

        state.in_flight.insert(
            key,
            InFlight {
                generation,
                load: load.clone(),
            },
        );
        crate::metrics::set_in_flight(state.in_flight.len());

        Begin::Pending(load)
    }
}

impl Inner {
    fn lock_state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record the outcome of load `generation` of `key`
    fn settle(&self, key: CacheKey, generation: u64, result: &LoadResult) {
        let mut state = self.lock_state();

        let registered = state
            .in_flight
            .get(&key)
            .is_some_and(|entry| entry.generation == generation);
        if registered {
            state.in_flight.remove(&key);
        }
        crate::metrics::set_in_flight(state.in_flight.len());

        match result {
            Ok(page) if registered => {
                if page.len() < key.page_size as usize {
                    debug!(key = %key, items = page.len(), "Reached last page");
                    let last = state.last_pages.entry(key.category_id).or_insert(key.page);
                    *last = (*last).min(key.page);
                } else if state
                    .last_pages
                    .get(&key.category_id)
                    .is_some_and(|&last| key.page >= last)
                {
                    state.last_pages.remove(&key.category_id);
                }

                self.cache.put(key, page.clone());
            }
            Ok(_) => {
                debug!(key = %key, "Discarding result of invalidated load");
            }
            Err(e) => {
                let kind = match e {
                    LoadError::Upstream(_) => "upstream",
                    LoadError::Backend(_) => "backend",
                    LoadError::Panicked => "panicked",
                    LoadError::Aborted(_) => "aborted",
                };
                crate::metrics::record_load_failed(key.category_id, kind);
            }
        }
    }

    /// Drop the in-flight entry of a load that ended without settling
    fn abandon(&self, key: CacheKey, generation: u64) {
        let mut state = self.lock_state();
        if state
            .in_flight
            .get(&key)
            .is_some_and(|entry| entry.generation == generation)
        {
            state.in_flight.remove(&key);
        }
        crate::metrics::set_in_flight(state.in_flight.len());
    }
}

/// Clears the in-flight entry if the load task is dropped mid-flight
struct AbandonGuard<'a> {
    inner: &'a Inner,
    key: CacheKey,
    generation: u64,
    armed: bool,
}

impl Drop for AbandonGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            warn!(key = %self.key, "Load task dropped before settling");
            self.inner.abandon(self.key, self.generation);
        }
    }
}

async fn run_load(inner: Arc<Inner>, key: CacheKey, generation: u64) -> LoadResult {
    let mut guard = AbandonGuard {
        inner: &inner,
        key,
        generation,
        armed: true,
    };

    crate::metrics::record_load_started(key.category_id);
    debug!(key = %key, "Loading page");

    let result = match AssertUnwindSafe(inner.loader.load(key)).catch_unwind().await {
        Ok(result) => result,
        Err(_) => {
            error!(key = %key, "Page loader panicked");
            Err(LoadError::Panicked)
        }
    };

    guard.armed = false;
    inner.settle(key, generation, &result);
    result
}
