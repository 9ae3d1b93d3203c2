//! Page cache keyed by the normalized query serialization.
//!
//! Keys look like `user?is_active=true&search=bob&page=2`: the resource, the
//! canonical query string and the page number. Entries expire after a
//! freshness window and can be dropped per resource after a mutation.
//! Expired entries are swept whenever a page is stored.

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::time::Instant;
use tracing::debug;

use crate::error::Result;
use crate::pagination::{ListSource, Page};
use crate::query::Query;

struct CacheEntry {
    stored_at: Instant,
    page: Arc<dyn Any + Send + Sync>,
}

pub struct PageCache {
    entries: DashMap<String, CacheEntry>,
    ttl: Duration,
}

impl PageCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    pub fn key(resource: &str, query: &Query, page: u32) -> String {
        format!("{}&page={}", query.cache_key(resource), page)
    }

    /// A zero freshness window disables caching
    pub fn is_enabled(&self) -> bool {
        !self.ttl.is_zero()
    }

    pub fn get<T: Clone + Send + Sync + 'static>(&self, key: &str) -> Option<Page<T>> {
        let (fresh, page) = {
            let entry = self.entries.get(key)?;
            (
                entry.stored_at.elapsed() < self.ttl,
                entry.page.downcast_ref::<Page<T>>().cloned(),
            )
        };
        if !fresh {
            self.entries.remove(key);
            return None;
        }
        page
    }

    pub fn insert<T: Clone + Send + Sync + 'static>(&self, key: String, page: Page<T>) {
        if !self.is_enabled() {
            return;
        }
        self.sweep();
        self.entries.insert(
            key,
            CacheEntry {
                stored_at: Instant::now(),
                page: Arc::new(page),
            },
        );
    }

    /// Drop every page of `resource`. Returns how many entries went away.
    pub fn invalidate_prefix(&self, resource: &str) -> usize {
        let removed = self.remove_prefixed(&format!("{resource}?"));
        if removed > 0 {
            debug!(resource, removed, "page cache invalidated");
        }
        removed
    }

    /// Drop every page of one query of `resource`
    pub fn invalidate_query(&self, resource: &str, query: &Query) -> usize {
        self.remove_prefixed(&format!("{}&page=", query.cache_key(resource)))
    }

    /// Remove entries older than the freshness window
    pub fn sweep(&self) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| entry.stored_at.elapsed() < self.ttl);
        before - self.entries.len()
    }

    fn remove_prefixed(&self, prefix: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| !key.starts_with(prefix));
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A [`ListSource`] that answers from the cache when it can.
///
/// A first page fetched from the server drops the cached later pages of the
/// same query, so one accumulated list never mixes old and new pages.
pub struct CachedSource<T> {
    inner: Arc<dyn ListSource<T>>,
    cache: Arc<PageCache>,
}

impl<T> CachedSource<T> {
    pub fn new(inner: Arc<dyn ListSource<T>>, cache: Arc<PageCache>) -> Self {
        Self { inner, cache }
    }
}

#[async_trait]
impl<T: Clone + Send + Sync + 'static> ListSource<T> for CachedSource<T> {
    fn resource(&self) -> &str {
        self.inner.resource()
    }

    async fn fetch_page(&self, query: &Query, page: u32, page_size: u32) -> Result<Page<T>> {
        let resource = self.inner.resource();
        let key = PageCache::key(resource, query, page);
        if let Some(hit) = self.cache.get::<T>(&key) {
            debug!(key, "page cache hit");
            return Ok(hit);
        }

        let fetched = self.inner.fetch_page(query, page, page_size).await?;
        if page == 1 {
            self.cache.invalidate_query(resource, query);
        }
        self.cache.insert(key, fetched.clone());
        Ok(fetched)
    }

    fn invalidate(&self) {
        let removed = self.cache.invalidate_prefix(self.inner.resource());
        debug!(resource = self.inner.resource(), removed, "cached pages dropped");
        self.inner.invalidate();
    }
}
