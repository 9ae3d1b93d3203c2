//! Scroll sentinel.
//!
//! The sentinel is the row right after the last loaded item. When it becomes
//! fully visible in the viewport the next page is requested, provided one
//! exists and none is already loading. Partial visibility never triggers.

/// Visible window of a scrolling list, in rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    pub offset: usize,
    pub height: usize,
}

impl Viewport {
    pub fn new(offset: usize, height: usize) -> Self {
        Self { offset, height }
    }

    pub fn fully_contains(&self, span: RowSpan) -> bool {
        let len = span.len.max(1);
        span.start >= self.offset && span.start + len <= self.offset + self.height
    }
}

/// Rows occupied by the sentinel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowSpan {
    pub start: usize,
    pub len: usize,
}

impl RowSpan {
    pub fn row(start: usize) -> Self {
        Self { start, len: 1 }
    }
}

/// Cursor flags the sentinel checks before firing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Gate {
    pub has_next_page: bool,
    pub is_fetching_next_page: bool,
}

impl Gate {
    fn is_open(self) -> bool {
        self.has_next_page && !self.is_fetching_next_page
    }
}

#[derive(Debug, Default)]
pub struct SentinelObserver {
    identity: Option<u64>,
    was_visible: bool,
}

impl SentinelObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start observing the sentinel known as `identity`.
    ///
    /// A new identity re-arms the observer, so a sentinel that is already on
    /// screen after a re-render counts as newly visible.
    pub fn observe(&mut self, identity: u64) {
        if self.identity != Some(identity) {
            self.identity = Some(identity);
            self.was_visible = false;
        }
    }

    pub fn disconnect(&mut self) {
        self.identity = None;
        self.was_visible = false;
    }

    pub fn is_connected(&self) -> bool {
        self.identity.is_some()
    }

    /// Feed the latest layout. Returns true when the next page should be
    /// requested.
    pub fn update(&mut self, viewport: Viewport, sentinel: RowSpan, gate: Gate) -> bool {
        if !self.is_connected() {
            return false;
        }
        let visible = viewport.fully_contains(sentinel);
        let entered = visible && !self.was_visible;
        self.was_visible = visible;
        entered && gate.is_open()
    }
}
