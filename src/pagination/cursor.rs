//! Paginated fetch cursor.
//!
//! [`PageCursor`] is a synchronous state machine. It never performs I/O: it
//! hands out a [`FetchTicket`] whenever a request should be made and accepts
//! the outcome through [`PageCursor::complete`]. Every query change bumps the
//! generation, so a completion carrying an older ticket is recognized as stale
//! and dropped.
//!
//! ```text
//! Idle -> LoadingFirstPage -> HasMore <-> LoadingNextPage
//!                         \-> Exhausted
//! any loading state -> Errored -> (retry | new query) -> Loading*
//! ```

use crate::pagination::{Page, SearchOptions};
use crate::query::Query;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    Idle,
    LoadingFirstPage,
    HasMore,
    LoadingNextPage,
    Exhausted,
    Errored,
}

impl CursorState {
    pub fn label(self) -> &'static str {
        match self {
            CursorState::Idle => "idle",
            CursorState::LoadingFirstPage => "loading",
            CursorState::HasMore => "has more",
            CursorState::LoadingNextPage => "loading more",
            CursorState::Exhausted => "end of list",
            CursorState::Errored => "error",
        }
    }
}

/// Identifies one request the cursor is waiting for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub generation: u64,
    pub page: u32,
    pub query: Query,
}

/// Outcome of feeding a completion into the cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Applied,
    /// The ticket no longer matches the request in flight
    Stale,
}

#[derive(Debug)]
pub struct PageCursor<T> {
    query: Option<Query>,
    generation: u64,
    items: Vec<T>,
    pages_loaded: u32,
    latest: Option<SearchOptions>,
    in_flight: Option<FetchTicket>,
    state: CursorState,
    error: Option<String>,
}

impl<T> Default for PageCursor<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> PageCursor<T> {
    pub fn new() -> Self {
        Self {
            query: None,
            generation: 0,
            items: Vec::new(),
            pages_loaded: 0,
            latest: None,
            in_flight: None,
            state: CursorState::Idle,
            error: None,
        }
    }

    /// Bind the cursor to `query`.
    ///
    /// An equal query is a no-op. A different one discards everything
    /// accumulated so far and returns the ticket for its first page.
    pub fn set_query(&mut self, query: Query) -> Option<FetchTicket> {
        if self.query.as_ref() == Some(&query) {
            return None;
        }
        self.query = Some(query);
        Some(self.restart())
    }

    /// Reload the current query from page 1, e.g. after a mutation
    pub fn refresh(&mut self) -> Option<FetchTicket> {
        self.query.as_ref()?;
        Some(self.restart())
    }

    fn restart(&mut self) -> FetchTicket {
        self.generation += 1;
        self.items.clear();
        self.pages_loaded = 0;
        self.latest = None;
        self.error = None;
        self.state = CursorState::LoadingFirstPage;
        self.issue(1)
    }

    fn issue(&mut self, page: u32) -> FetchTicket {
        let ticket = FetchTicket {
            generation: self.generation,
            page,
            query: self.query.clone().unwrap_or_default(),
        };
        self.in_flight = Some(ticket.clone());
        ticket
    }

    /// Ticket for the next page, only when one is known to exist and nothing
    /// is in flight.
    pub fn fetch_next_page(&mut self) -> Option<FetchTicket> {
        if self.state != CursorState::HasMore {
            return None;
        }
        self.state = CursorState::LoadingNextPage;
        Some(self.issue(self.pages_loaded + 1))
    }

    /// Re-request whatever failed. Accumulated items are kept.
    pub fn retry(&mut self) -> Option<FetchTicket> {
        if self.state != CursorState::Errored {
            return None;
        }
        self.error = None;
        if self.pages_loaded == 0 {
            self.state = CursorState::LoadingFirstPage;
        } else {
            self.state = CursorState::LoadingNextPage;
        }
        Some(self.issue(self.pages_loaded + 1))
    }

    /// Apply the outcome of a request
    pub fn complete(&mut self, ticket: &FetchTicket, result: Result<Page<T>, String>) -> Completion {
        let current = match &self.in_flight {
            Some(t) if t.generation == ticket.generation && t.page == ticket.page => t,
            _ => return Completion::Stale,
        };
        debug_assert_eq!(current.query, ticket.query);
        self.in_flight = None;

        match result {
            Ok(page) => {
                let has_next = page.has_next_page();
                self.items.extend(page.items);
                self.pages_loaded = ticket.page;
                self.latest = page.search_options;
                self.state = if has_next {
                    CursorState::HasMore
                } else {
                    CursorState::Exhausted
                };
            }
            Err(message) => {
                self.error = Some(message);
                self.state = CursorState::Errored;
            }
        }
        Completion::Applied
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn query(&self) -> Option<&Query> {
        self.query.as_ref()
    }

    pub fn state(&self) -> CursorState {
        self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn pages_loaded(&self) -> u32 {
        self.pages_loaded
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Total reported by the latest page, when the endpoint paginates
    pub fn total_count(&self) -> Option<u64> {
        self.latest.map(|o| o.total_count)
    }

    /// Derived from the latest page's metadata
    pub fn has_next_page(&self) -> bool {
        self.latest.is_some_and(|o| o.has_next_page())
    }

    /// True only while page 1 of the current query is in flight
    pub fn is_loading(&self) -> bool {
        self.state == CursorState::LoadingFirstPage
    }

    /// True only while a page >= 2 is in flight
    pub fn is_fetching_next_page(&self) -> bool {
        self.state == CursorState::LoadingNextPage
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(items: std::ops::Range<u32>, page: u32, total: u64) -> Page<u32> {
        Page {
            items: items.collect(),
            search_options: Some(SearchOptions {
                page,
                page_size: 20,
                total_count: total,
            }),
        }
    }

    fn q(search: &str) -> Query {
        Query::new().with("search", search)
    }

    #[test]
    fn test_walks_pages_until_exhausted() {
        let mut cursor = PageCursor::new();
        assert_eq!(cursor.state(), CursorState::Idle);

        let t1 = cursor.set_query(q("a")).unwrap();
        assert_eq!(t1.page, 1);
        assert!(cursor.is_loading());
        assert_eq!(cursor.complete(&t1, Ok(page(0..20, 1, 45))), Completion::Applied);
        assert!(cursor.has_next_page());
        assert_eq!(cursor.state(), CursorState::HasMore);

        let t2 = cursor.fetch_next_page().unwrap();
        assert_eq!(t2.page, 2);
        assert!(cursor.is_fetching_next_page());
        assert!(!cursor.is_loading());
        cursor.complete(&t2, Ok(page(20..40, 2, 45)));

        let t3 = cursor.fetch_next_page().unwrap();
        cursor.complete(&t3, Ok(page(40..45, 3, 45)));
        assert!(!cursor.has_next_page());
        assert_eq!(cursor.state(), CursorState::Exhausted);
        assert_eq!(cursor.items(), (0..45).collect::<Vec<_>>().as_slice());
        assert!(cursor.fetch_next_page().is_none());
    }

    #[test]
    fn test_fetch_next_page_twice_issues_one_ticket() {
        let mut cursor = PageCursor::new();
        let t1 = cursor.set_query(q("a")).unwrap();
        cursor.complete(&t1, Ok(page(0..20, 1, 45)));

        assert!(cursor.fetch_next_page().is_some());
        assert!(cursor.fetch_next_page().is_none());
    }

    #[test]
    fn test_fetch_next_page_is_noop_while_first_page_loads() {
        let mut cursor: PageCursor<u32> = PageCursor::new();
        cursor.set_query(q("a"));
        assert!(cursor.fetch_next_page().is_none());
    }

    #[test]
    fn test_query_change_empties_list_immediately() {
        let mut cursor = PageCursor::new();
        let t1 = cursor.set_query(q("a")).unwrap();
        cursor.complete(&t1, Ok(page(0..20, 1, 45)));
        assert_eq!(cursor.items().len(), 20);

        let t2 = cursor.set_query(q("b")).unwrap();
        assert!(cursor.items().is_empty());
        assert!(cursor.is_loading());
        assert!(!cursor.has_next_page());
        assert_eq!(t2.page, 1);
        assert_eq!(t2.generation, t1.generation + 1);
    }

    #[test]
    fn test_equal_query_is_noop() {
        let mut cursor: PageCursor<u32> = PageCursor::new();
        let a = Query::new().with("x", "1").with("y", "2");
        let b = Query::new().with("y", "2").with("x", "1");
        assert!(cursor.set_query(a).is_some());
        assert!(cursor.set_query(b).is_none());
    }

    #[test]
    fn test_late_response_for_superseded_query_is_discarded() {
        let mut cursor = PageCursor::new();
        let old = cursor.set_query(q("a")).unwrap();
        let new = cursor.set_query(q("b")).unwrap();

        assert_eq!(cursor.complete(&old, Ok(page(0..20, 1, 45))), Completion::Stale);
        assert!(cursor.items().is_empty());
        assert!(cursor.is_loading());

        assert_eq!(cursor.complete(&new, Ok(page(100..103, 1, 3))), Completion::Applied);
        assert_eq!(cursor.items(), &[100, 101, 102]);
    }

    #[test]
    fn test_first_page_error_does_not_retry_automatically() {
        let mut cursor: PageCursor<u32> = PageCursor::new();
        let t1 = cursor.set_query(q("a")).unwrap();
        cursor.complete(&t1, Err("connection refused".into()));
        assert_eq!(cursor.state(), CursorState::Errored);
        assert_eq!(cursor.error(), Some("connection refused"));
        assert!(cursor.fetch_next_page().is_none());

        let retry = cursor.retry().unwrap();
        assert_eq!(retry.page, 1);
        assert!(cursor.is_loading());
        assert!(cursor.error().is_none());
    }

    #[test]
    fn test_next_page_error_keeps_items() {
        let mut cursor = PageCursor::new();
        let t1 = cursor.set_query(q("a")).unwrap();
        cursor.complete(&t1, Ok(page(0..20, 1, 45)));
        let t2 = cursor.fetch_next_page().unwrap();
        cursor.complete(&t2, Err("timeout".into()));

        assert_eq!(cursor.state(), CursorState::Errored);
        assert_eq!(cursor.items().len(), 20);

        let retry = cursor.retry().unwrap();
        assert_eq!(retry.page, 2);
        assert!(cursor.is_fetching_next_page());
        cursor.complete(&retry, Ok(page(20..40, 2, 45)));
        assert_eq!(cursor.items().len(), 40);
    }

    #[test]
    fn test_new_query_leaves_error_state() {
        let mut cursor: PageCursor<u32> = PageCursor::new();
        let t1 = cursor.set_query(q("a")).unwrap();
        cursor.complete(&t1, Err("boom".into()));
        cursor.set_query(q("b")).unwrap();
        assert_eq!(cursor.state(), CursorState::LoadingFirstPage);
        assert!(cursor.error().is_none());
    }

    #[test]
    fn test_refresh_restarts_same_query() {
        let mut cursor = PageCursor::new();
        assert!(cursor.refresh().is_none());
        let t1 = cursor.set_query(q("a")).unwrap();
        cursor.complete(&t1, Ok(page(0..3, 1, 3)));

        let t2 = cursor.refresh().unwrap();
        assert_eq!(t2.query, q("a"));
        assert!(cursor.items().is_empty());
        assert_eq!(cursor.complete(&t1, Ok(page(0..3, 1, 3))), Completion::Stale);
    }

    #[test]
    fn test_empty_result_is_exhausted_not_error() {
        let mut cursor: PageCursor<u32> = PageCursor::new();
        let t1 = cursor.set_query(q("zzz")).unwrap();
        cursor.complete(&t1, Ok(page(0..0, 1, 0)));
        assert_eq!(cursor.state(), CursorState::Exhausted);
        assert!(cursor.error().is_none());
    }
}
