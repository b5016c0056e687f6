//! Caching layer for connection pages.
//!
//! Consecutive queries for nearby times walk over the same pages, so pages
//! are cached by cursor. A short TTL keeps delays reasonably fresh.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache as MokaCache;
use tracing::trace;

use super::error::SourceError;
use super::page::{Page, PageCursor};
use super::source::ConnectionSource;

/// Cached page entry. `None` records the end of history.
type PageEntry = Arc<Option<Page>>;

/// Configuration for the cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL for cached entries.
    pub ttl: Duration,

    /// Maximum number of cached pages.
    pub max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(60),
            max_capacity: 1000,
        }
    }
}

/// Connection source with caching.
///
/// Wraps another source and caches its pages. Errors are not cached.
pub struct CachedSource<S> {
    inner: S,
    pages: MokaCache<PageCursor, PageEntry>,
}

impl<S: ConnectionSource> CachedSource<S> {
    /// Create a new cached source.
    pub fn new(inner: S, config: &CacheConfig) -> Self {
        let pages = MokaCache::builder()
            .time_to_live(config.ttl)
            .max_capacity(config.max_capacity)
            .build();

        Self { inner, pages }
    }

    /// Access the underlying source for operations that bypass cache.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Get cache statistics.
    pub fn entry_count(&self) -> u64 {
        self.pages.entry_count()
    }

    /// Invalidate all cached entries.
    pub fn invalidate_all(&self) {
        self.pages.invalidate_all();
    }
}

impl<S: ConnectionSource> ConnectionSource for CachedSource<S> {
    async fn next_page(&self, cursor: &PageCursor) -> Result<Option<Page>, SourceError> {
        if let Some(cached) = self.pages.get(cursor).await {
            trace!(before = %cursor.before.to_rfc3339(), "page cache hit");
            return Ok(Option::clone(&cached));
        }

        let page = self.inner.next_page(cursor).await?;
        self.pages
            .insert(cursor.clone(), Arc::new(page.clone()))
            .await;

        Ok(page)
    }
}
