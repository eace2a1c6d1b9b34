//! Infinite-scroll feed state for one category
//!
//! A [`FeedSession`] accumulates pages of a category and decides when
//! scrolling should prefetch ahead.

use tracing::debug;

use super::{PrefetchBatch, PreloadCoordinator};
use crate::config::FeedSettings;
use crate::models::ArticleSummary;
use crate::utils::error::LoadError;

/// Fraction of the content seen: `(offset + viewport) / content_height`
///
/// `None` when the content height is not positive.
pub fn scroll_progress(offset: f64, viewport_height: f64, content_height: f64) -> Option<f64> {
    if content_height.is_nan() || content_height <= 0.0 {
        return None;
    }
    Some((offset + viewport_height) / content_height)
}

/// Paginated article list of one category
pub struct FeedSession {
    coordinator: PreloadCoordinator,
    category_id: u32,
    articles: Vec<ArticleSummary>,
    current_page: u32,
    has_more: bool,
    scroll_threshold: f64,
    scroll_prefetch_pages: u32,
}

impl FeedSession {
    pub fn new(coordinator: PreloadCoordinator, category_id: u32, settings: &FeedSettings) -> Self {
        Self {
            coordinator,
            category_id,
            articles: Vec::new(),
            current_page: 0,
            has_more: true,
            scroll_threshold: settings.scroll_threshold,
            scroll_prefetch_pages: settings.scroll_prefetch_pages,
        }
    }

    pub fn category_id(&self) -> u32 {
        self.category_id
    }

    pub fn articles(&self) -> &[ArticleSummary] {
        &self.articles
    }

    /// Last page appended, 0 before the first load
    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    /// Drop everything known about the category and load its first page
    pub async fn refresh(&mut self) -> Result<usize, LoadError> {
        self.coordinator.invalidate_category(self.category_id);
        self.articles.clear();
        self.current_page = 0;
        self.has_more = true;

        self.load_more().await
    }

    /// Append the next page, returning how many articles were added
    ///
    /// A page shorter than the page size ends the feed. A full page
    /// prefetches the pages after it.
    pub async fn load_more(&mut self) -> Result<usize, LoadError> {
        if !self.has_more {
            return Ok(0);
        }

        let next_page = self.current_page + 1;
        let key = self.coordinator.key(self.category_id, next_page);
        let page = self.coordinator.fetch_page(key).await?;

        let added = page.len();
        self.articles.extend(page);
        self.current_page = next_page;
        self.has_more = added >= key.page_size as usize;

        debug!(
            category_id = self.category_id,
            page = next_page,
            added,
            has_more = self.has_more,
            "Appended feed page"
        );

        if self.has_more {
            self.coordinator
                .prefetch(self.category_id, next_page, self.scroll_prefetch_pages);
        }

        Ok(added)
    }

    /// Scroll handler; prefetches ahead once the reader passes the threshold
    ///
    /// The batch covers pages `current_page + 1 ..= current_page +
    /// scroll_prefetch_pages`. The page right after the current one is
    /// included, so a prefetch of it that failed earlier is retried here.
    ///
    /// Repeated calls are harmless: cached and in-flight pages are never
    /// loaded twice.
    pub fn on_scroll(
        &self,
        offset: f64,
        viewport_height: f64,
        content_height: f64,
    ) -> Option<PrefetchBatch> {
        let progress = scroll_progress(offset, viewport_height, content_height)?;
        if progress <= self.scroll_threshold || !self.has_more {
            return None;
        }

        let next = self.coordinator.key(self.category_id, self.current_page).next();
        if self.coordinator.is_in_flight(&next) {
            return None;
        }

        Some(
            self.coordinator
                .prefetch(self.category_id, self.current_page, self.scroll_prefetch_pages),
        )
    }
}
