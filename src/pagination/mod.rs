//! Incremental pagination: page shapes, the fetch cursor, the page cache and
//! the scroll sentinel.

pub mod cache;
pub mod cursor;
pub mod sentinel;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::query::Query;

pub use cache::{CachedSource, PageCache};
pub use cursor::{Completion, CursorState, FetchTicket, PageCursor};
pub use sentinel::{Gate, RowSpan, SentinelObserver, Viewport};

/// Pagination metadata reported by the server for one page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchOptions {
    pub page: u32,
    pub page_size: u32,
    pub total_count: u64,
}

impl SearchOptions {
    pub fn total_pages(&self) -> u64 {
        if self.page_size == 0 {
            return 0;
        }
        self.total_count.div_ceil(u64::from(self.page_size))
    }

    pub fn has_next_page(&self) -> bool {
        u64::from(self.page) < self.total_pages()
    }
}

/// One fetched batch of items
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// None for endpoints that return everything at once
    pub search_options: Option<SearchOptions>,
}

impl<T> Page<T> {
    /// A page that is known to be the only one
    pub fn single(items: Vec<T>) -> Self {
        Self {
            items,
            search_options: None,
        }
    }

    pub fn has_next_page(&self) -> bool {
        self.search_options.is_some_and(|o| o.has_next_page())
    }

    pub fn total_count(&self) -> u64 {
        self.search_options
            .map_or(self.items.len() as u64, |o| o.total_count)
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            search_options: self.search_options,
        }
    }
}

/// List body as returned by the backend: the paginated envelope or a bare array
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ListResponse<T> {
    Bare(Vec<T>),
    Envelope {
        founds: Vec<T>,
        #[serde(default)]
        search_options: Option<SearchOptions>,
    },
}

impl<T> From<ListResponse<T>> for Page<T> {
    fn from(response: ListResponse<T>) -> Self {
        match response {
            ListResponse::Envelope {
                founds,
                search_options,
            } => Page {
                items: founds,
                search_options,
            },
            ListResponse::Bare(items) => Page::single(items),
        }
    }
}

/// Anything that can produce pages of `T` for a query
#[async_trait]
pub trait ListSource<T>: Send + Sync {
    /// Resource name used as the cache key prefix (`user`, `groups`, ...)
    fn resource(&self) -> &str;

    async fn fetch_page(&self, query: &Query, page: u32, page_size: u32) -> Result<Page<T>>;

    /// Forget anything held between fetches, so the next page 1 comes from
    /// the server
    fn invalidate(&self) {}
}
