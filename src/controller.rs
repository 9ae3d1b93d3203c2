//! Async driver for one list screen.
//!
//! [`ListController`] runs as its own tokio task and is the only writer of the
//! screen's filter state and page cursor. The UI sends [`ListCommand`]s through
//! a [`ListHandle`] and renders the [`ListSnapshot`]s it publishes. Fetches run
//! as spawned tasks that report back on an internal channel tagged with their
//! [`FetchTicket`]; a superseded fetch is aborted, and if its result still
//! arrives the cursor rejects it as stale.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::filters::FilterSync;
use crate::notify::{Notification, Notifier};
use crate::pagination::{
    Completion, CursorState, FetchTicket, Gate, ListSource, Page, PageCursor, RowSpan,
    SentinelObserver, Viewport,
};
use crate::query::{FieldValue, Query};
use crate::router::{Location, MemoryNavigator, Navigator};
use crate::screens::ScreenSpec;

#[derive(Debug, Clone)]
pub enum ListCommand {
    /// Keystroke in a typed filter field
    Edit {
        field: String,
        value: Option<FieldValue>,
    },
    /// Selection in a dropdown-style field
    SetDirect {
        field: String,
        value: Option<FieldValue>,
    },
    FetchNextPage,
    /// The visible window of the list changed
    Layout(Viewport),
    Retry,
    /// Reload from page 1 bypassing cached pages, e.g. after a mutation
    Refresh,
    /// Jump to another location of the same screen
    Navigate(Location),
    Shutdown,
}

/// Everything a view needs to render the list
#[derive(Debug, Clone)]
pub struct ListSnapshot<T> {
    pub location: Location,
    /// Current values of the typed inputs
    pub inputs: Query,
    pub items: Vec<T>,
    pub state: CursorState,
    pub generation: u64,
    pub has_next_page: bool,
    pub is_loading: bool,
    pub is_fetching_next_page: bool,
    pub total_count: Option<u64>,
    pub error: Option<String>,
}

impl<T> ListSnapshot<T> {
    fn initial(location: Location) -> Self {
        Self {
            location,
            inputs: Query::new(),
            items: Vec::new(),
            state: CursorState::Idle,
            generation: 0,
            has_next_page: false,
            is_loading: false,
            is_fetching_next_page: false,
            total_count: None,
            error: None,
        }
    }

    /// The persisted filters
    pub fn query(&self) -> &Query {
        &self.location.query
    }

    /// Input value to show for `field`. Typed fields read the inputs, which
    /// may run ahead of the persisted query; direct fields read the query.
    pub fn field_text(&self, screen: &ScreenSpec, field: &str) -> String {
        let value = if screen.is_debounced(field) {
            self.inputs.get(field)
        } else {
            self.location.query.get(field)
        };
        value.map(FieldValue::as_param).unwrap_or_default()
    }
}

pub struct ListOptions {
    pub location: Location,
    pub page_size: u32,
    pub debounce: Duration,
}

type FetchOutcome<T> = (FetchTicket, Result<Page<T>, String>);

pub struct ListController<T> {
    screen: &'static ScreenSpec,
    source: Arc<dyn ListSource<T>>,
    notifier: Arc<dyn Notifier>,
    page_size: u32,
    navigator: MemoryNavigator,
    filters: FilterSync,
    cursor: PageCursor<T>,
    sentinel: SentinelObserver,
    viewport: Option<Viewport>,
    fetch_task: Option<JoinHandle<()>>,
    commands: mpsc::UnboundedReceiver<ListCommand>,
    settled: mpsc::UnboundedReceiver<Query>,
    completions_tx: mpsc::UnboundedSender<FetchOutcome<T>>,
    completions: mpsc::UnboundedReceiver<FetchOutcome<T>>,
    snapshots: watch::Sender<ListSnapshot<T>>,
}

impl<T: Clone + Send + Sync + 'static> ListController<T> {
    /// Start a controller task for `screen`. Must be called within a tokio
    /// runtime.
    pub fn spawn(
        screen: &'static ScreenSpec,
        source: Arc<dyn ListSource<T>>,
        notifier: Arc<dyn Notifier>,
        options: ListOptions,
    ) -> ListHandle<T> {
        let (commands_tx, commands) = mpsc::unbounded_channel();
        let (completions_tx, completions) = mpsc::unbounded_channel();
        let (snapshots, snapshots_rx) =
            watch::channel(ListSnapshot::initial(options.location.clone()));

        let navigator = MemoryNavigator::new(options.location);
        let (filters, settled) =
            FilterSync::new(screen.debounced_fields, options.debounce, &navigator);

        let controller = Self {
            screen,
            source,
            notifier,
            page_size: options.page_size,
            navigator,
            filters,
            cursor: PageCursor::new(),
            sentinel: SentinelObserver::new(),
            viewport: None,
            fetch_task: None,
            commands,
            settled,
            completions_tx,
            completions,
            snapshots,
        };

        let task = tokio::spawn(controller.run());
        ListHandle {
            commands: commands_tx,
            snapshots: snapshots_rx,
            task: Some(task),
        }
    }

    async fn run(mut self) {
        self.sync_query();
        self.publish();

        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(ListCommand::Shutdown) | None => break,
                    Some(command) => self.handle(command),
                },
                Some(snapshot) = self.settled.recv() => {
                    if self.filters.settle(&snapshot, &mut self.navigator) {
                        self.sync_query();
                    }
                }
                Some((ticket, result)) = self.completions.recv() => {
                    self.on_completion(ticket, result);
                }
            }
            self.check_sentinel();
            self.publish();
        }

        self.sentinel.disconnect();
        debug!(resource = self.screen.resource, "list controller stopped");
    }

    fn handle(&mut self, command: ListCommand) {
        match command {
            ListCommand::Edit { field, value } => {
                if self.screen.is_debounced(&field) {
                    self.filters.edit(&field, value);
                } else {
                    self.set_direct(&field, value);
                }
            }
            ListCommand::SetDirect { field, value } => self.set_direct(&field, value),
            ListCommand::FetchNextPage => {
                if let Some(ticket) = self.cursor.fetch_next_page() {
                    self.start_fetch(ticket);
                }
            }
            ListCommand::Layout(viewport) => self.viewport = Some(viewport),
            ListCommand::Retry => {
                if let Some(ticket) = self.cursor.retry() {
                    self.start_fetch(ticket);
                }
            }
            ListCommand::Refresh => {
                self.source.invalidate();
                if let Some(ticket) = self.cursor.refresh() {
                    self.start_fetch(ticket);
                }
            }
            ListCommand::Navigate(location) => {
                if location.route != self.screen.route {
                    warn!(%location, "ignoring navigation to another screen");
                    return;
                }
                self.navigator.push(location);
                self.filters.hydrate(&self.navigator);
                self.sync_query();
            }
            ListCommand::Shutdown => {}
        }
    }

    fn set_direct(&mut self, field: &str, value: Option<FieldValue>) {
        if !self.screen.is_direct(field) {
            warn!(field, resource = self.screen.resource, "unknown filter field");
            return;
        }
        if self.filters.set_direct(field, value, &mut self.navigator) {
            self.sync_query();
        }
    }

    /// Point the cursor at the persisted query; a changed key restarts the list
    fn sync_query(&mut self) {
        let key = self.screen.list_key(&FilterSync::persisted(&self.navigator));
        if let Some(ticket) = self.cursor.set_query(key) {
            self.start_fetch(ticket);
        }
    }

    fn start_fetch(&mut self, ticket: FetchTicket) {
        if let Some(previous) = self.fetch_task.take() {
            previous.abort();
        }

        debug!(
            resource = self.screen.resource,
            page = ticket.page,
            generation = ticket.generation,
            query = %ticket.query,
            "fetching page"
        );

        let source = self.source.clone();
        let tx = self.completions_tx.clone();
        let page_size = self.page_size;
        self.fetch_task = Some(tokio::spawn(async move {
            let result = source
                .fetch_page(&ticket.query, ticket.page, page_size)
                .await
                .map_err(|e| e.to_string());
            let _ = tx.send((ticket, result));
        }));
    }

    fn on_completion(&mut self, ticket: FetchTicket, result: Result<Page<T>, String>) {
        let failure = result.as_ref().err().cloned();
        match self.cursor.complete(&ticket, result) {
            Completion::Stale => {
                debug!(
                    page = ticket.page,
                    generation = ticket.generation,
                    "discarding stale page"
                );
            }
            Completion::Applied => {
                self.fetch_task = None;
                if let Some(message) = failure {
                    warn!(
                        resource = self.screen.resource,
                        page = ticket.page,
                        error = %message,
                        "page fetch failed"
                    );
                    if ticket.page > 1 {
                        self.notifier.notify(Notification::error(format!(
                            "Failed to load more {}: {}",
                            self.screen.resource, message
                        )));
                    }
                } else {
                    debug!(
                        resource = self.screen.resource,
                        page = ticket.page,
                        items = self.cursor.items().len(),
                        "page loaded"
                    );
                }
            }
        }
    }

    fn check_sentinel(&mut self) {
        let Some(viewport) = self.viewport else {
            return;
        };
        let loaded = self.cursor.items().len();
        self.sentinel
            .observe((self.cursor.generation() << 32) ^ loaded as u64);

        let gate = Gate {
            has_next_page: self.cursor.has_next_page(),
            is_fetching_next_page: self.cursor.is_fetching_next_page(),
        };
        if self.sentinel.update(viewport, RowSpan::row(loaded), gate)
            && let Some(ticket) = self.cursor.fetch_next_page()
        {
            self.start_fetch(ticket);
        }
    }

    fn publish(&self) {
        self.snapshots.send_replace(ListSnapshot {
            location: self.navigator.location().clone(),
            inputs: self.filters.local().clone(),
            items: self.cursor.items().to_vec(),
            state: self.cursor.state(),
            generation: self.cursor.generation(),
            has_next_page: self.cursor.has_next_page(),
            is_loading: self.cursor.is_loading(),
            is_fetching_next_page: self.cursor.is_fetching_next_page(),
            total_count: self.cursor.total_count(),
            error: self.cursor.error().map(str::to_string),
        });
    }
}

impl<T> Drop for ListController<T> {
    fn drop(&mut self) {
        if let Some(task) = self.fetch_task.take() {
            task.abort();
        }
    }
}

/// The UI's end of a running [`ListController`]
pub struct ListHandle<T> {
    commands: mpsc::UnboundedSender<ListCommand>,
    snapshots: watch::Receiver<ListSnapshot<T>>,
    task: Option<JoinHandle<()>>,
}

impl<T: Clone> ListHandle<T> {
    /// Returns false once the controller has stopped
    pub fn send(&self, command: ListCommand) -> bool {
        self.commands.send(command).is_ok()
    }

    pub fn edit(&self, field: &str, value: Option<FieldValue>) -> bool {
        self.send(ListCommand::Edit {
            field: field.to_string(),
            value,
        })
    }

    pub fn set_direct(&self, field: &str, value: Option<FieldValue>) -> bool {
        self.send(ListCommand::SetDirect {
            field: field.to_string(),
            value,
        })
    }

    pub fn fetch_next_page(&self) -> bool {
        self.send(ListCommand::FetchNextPage)
    }

    pub fn layout(&self, viewport: Viewport) -> bool {
        self.send(ListCommand::Layout(viewport))
    }

    pub fn retry(&self) -> bool {
        self.send(ListCommand::Retry)
    }

    pub fn refresh(&self) -> bool {
        self.send(ListCommand::Refresh)
    }

    pub fn navigate(&self, location: Location) -> bool {
        self.send(ListCommand::Navigate(location))
    }

    pub fn snapshot(&self) -> ListSnapshot<T> {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ListSnapshot<T>> {
        self.snapshots.clone()
    }

    /// Wait until a published snapshot satisfies `predicate`.
    ///
    /// Returns None if the controller stops first.
    pub async fn wait_for(
        &mut self,
        predicate: impl FnMut(&ListSnapshot<T>) -> bool,
    ) -> Option<ListSnapshot<T>> {
        self.snapshots
            .wait_for(predicate)
            .await
            .ok()
            .map(|snapshot| (*snapshot).clone())
    }

    /// Stop the controller and wait for it to finish
    pub async fn shutdown(mut self) {
        let _ = self.commands.send(ListCommand::Shutdown);
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl<T> Drop for ListHandle<T> {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DeskError, Result};
    use crate::notify::{ChannelNotifier, Level};
    use crate::pagination::{CachedSource, PageCache, SearchOptions};
    use crate::router::Route;
    use crate::screens::USERS;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    struct FakeUsers {
        total: u32,
        latency: Duration,
        calls: Mutex<Vec<(Query, u32)>>,
        fail_once: Mutex<Vec<u32>>,
    }

    impl FakeUsers {
        fn new(total: u32) -> Arc<Self> {
            Arc::new(Self {
                total,
                latency: Duration::from_millis(200),
                calls: Mutex::new(Vec::new()),
                fail_once: Mutex::new(Vec::new()),
            })
        }

        fn pages_requested(&self, page: u32) -> usize {
            self.calls.lock().iter().filter(|(_, p)| *p == page).count()
        }
    }

    #[async_trait]
    impl ListSource<String> for FakeUsers {
        fn resource(&self) -> &str {
            "user"
        }

        async fn fetch_page(&self, query: &Query, page: u32, page_size: u32) -> Result<Page<String>> {
            self.calls.lock().push((query.clone(), page));
            tokio::time::sleep(self.latency).await;

            let fail = {
                let mut pending = self.fail_once.lock();
                match pending.iter().position(|p| *p == page) {
                    Some(idx) => {
                        pending.remove(idx);
                        true
                    }
                    None => false,
                }
            };
            if fail {
                return Err(DeskError::Other("connection reset".to_string()));
            }

            let start = (page - 1) * page_size;
            let end = (start + page_size).min(self.total);
            Ok(Page {
                items: (start..end).map(|i| format!("{query}#{i}")).collect(),
                search_options: Some(SearchOptions {
                    page,
                    page_size,
                    total_count: u64::from(self.total),
                }),
            })
        }
    }

    fn options(location: Location) -> ListOptions {
        ListOptions {
            location,
            page_size: 20,
            debounce: Duration::from_millis(500),
        }
    }

    fn spawn_users(
        source: Arc<FakeUsers>,
        notifier: Arc<dyn Notifier>,
    ) -> ListHandle<String> {
        ListController::spawn(&USERS, source, notifier, options(Location::new(Route::Users)))
    }

    fn quiet() -> Arc<dyn Notifier> {
        Arc::new(ChannelNotifier::new().0)
    }

    #[tokio::test(start_paused = true)]
    async fn test_initial_load_uses_default_filters() {
        let source = FakeUsers::new(45);
        let mut handle = spawn_users(source.clone(), quiet());

        let snap = handle.wait_for(|s| s.state == CursorState::HasMore).await.unwrap();
        assert_eq!(snap.items.len(), 20);
        assert_eq!(snap.total_count, Some(45));
        assert!(snap.has_next_page);

        let calls = source.calls.lock().clone();
        assert_eq!(calls, vec![(Query::new().with("filterActive", true), 1)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_of_edits_refetches_once() {
        let source = FakeUsers::new(45);
        let mut handle = spawn_users(source.clone(), quiet());
        handle.wait_for(|s| s.state == CursorState::HasMore).await;

        for text in ["b", "bo", "bob"] {
            handle.edit("search", Some(text.into()));
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        let snap = handle.snapshot();
        assert_eq!(snap.inputs.text("search"), "bob");
        assert!(!snap.query().contains("search"), "persisted query lags input");

        let snap = handle
            .wait_for(|s| s.query().text("search") == "bob" && s.state == CursorState::HasMore)
            .await
            .unwrap();
        assert!(snap.items.iter().all(|i| i.contains("search=bob")));
        assert_eq!(source.pages_requested(1), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_query_change_clears_items_before_first_page() {
        let source = FakeUsers::new(45);
        let mut handle = spawn_users(source.clone(), quiet());
        handle.wait_for(|s| s.items.len() == 20).await;

        handle.set_direct("filterActive", Some(false.into()));
        let snap = handle
            .wait_for(|s| s.query().flag("filterActive") == Some(false))
            .await
            .unwrap();
        assert!(snap.items.is_empty());
        assert!(snap.is_loading);

        let snap = handle.wait_for(|s| !s.items.is_empty()).await.unwrap();
        assert!(snap.items.iter().all(|i| i.contains("filterActive=false")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_double_fetch_next_page_issues_one_request() {
        let source = FakeUsers::new(45);
        let mut handle = spawn_users(source.clone(), quiet());
        handle.wait_for(|s| s.state == CursorState::HasMore).await;

        handle.fetch_next_page();
        handle.fetch_next_page();
        let snap = handle.wait_for(|s| s.items.len() == 40).await.unwrap();
        assert!(!snap.is_fetching_next_page);
        assert_eq!(source.pages_requested(2), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_query_never_leaks_into_list() {
        let source = FakeUsers::new(45);
        let mut handle = spawn_users(source.clone(), quiet());
        handle.wait_for(|s| s.state == CursorState::HasMore).await;

        handle.set_direct("ordering", Some("user_name".into()));
        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.set_direct("ordering", Some("created_at".into()));

        let snap = handle
            .wait_for(|s| s.query().text("ordering") == "created_at" && s.items.len() == 20)
            .await
            .unwrap();
        assert!(snap.items.iter().all(|i| i.contains("ordering=created_at")));

        tokio::time::sleep(Duration::from_secs(2)).await;
        let snap = handle.snapshot();
        assert_eq!(snap.items.len(), 20);
        assert!(!snap.items.iter().any(|i| i.contains("ordering=user_name")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_next_page_error_keeps_items_and_notifies() {
        let source = FakeUsers::new(45);
        source.fail_once.lock().push(2);
        let (notifier, mut toasts) = ChannelNotifier::new();
        let mut handle = spawn_users(source.clone(), Arc::new(notifier));
        handle.wait_for(|s| s.state == CursorState::HasMore).await;

        handle.fetch_next_page();
        let snap = handle
            .wait_for(|s| s.state == CursorState::Errored)
            .await
            .unwrap();
        assert_eq!(snap.items.len(), 20);
        assert!(snap.error.as_deref().unwrap().contains("connection reset"));

        let toast = toasts.try_recv().unwrap();
        assert_eq!(toast.level, Level::Error);

        // No automatic retry
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(source.pages_requested(2), 1);

        handle.retry();
        handle.wait_for(|s| s.items.len() == 40).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_page_error_shows_error_without_toast() {
        let source = FakeUsers::new(45);
        source.fail_once.lock().push(1);
        let (notifier, mut toasts) = ChannelNotifier::new();
        let mut handle = spawn_users(source.clone(), Arc::new(notifier));

        let snap = handle
            .wait_for(|s| s.state == CursorState::Errored)
            .await
            .unwrap();
        assert!(snap.items.is_empty());
        assert!(toasts.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_visible_sentinel_loads_until_viewport_filled() {
        let source = FakeUsers::new(100);
        let mut handle = spawn_users(source.clone(), quiet());
        handle.wait_for(|s| s.items.len() == 20).await;

        // Rows 0..30 visible: sentinel at row 20 is on screen
        handle.layout(Viewport::new(0, 30));
        handle.wait_for(|s| s.items.len() == 40).await.unwrap();

        // Sentinel now at row 40, below the viewport
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(source.pages_requested(3), 0);

        handle.layout(Viewport::new(15, 30));
        handle.wait_for(|s| s.items.len() == 60).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_skips_cached_first_page() {
        let source = FakeUsers::new(45);
        let cache = Arc::new(PageCache::new(Duration::from_secs(300)));
        let cached = CachedSource::new(source.clone() as Arc<dyn ListSource<String>>, cache.clone());
        let mut handle = ListController::<String>::spawn(
            &USERS,
            Arc::new(cached),
            quiet(),
            options(Location::new(Route::Users)),
        );
        let first = handle
            .wait_for(|s| s.state == CursorState::HasMore)
            .await
            .unwrap();
        assert_eq!(source.pages_requested(1), 1);

        handle.refresh();
        handle
            .wait_for(|s| s.generation > first.generation && s.state == CursorState::HasMore)
            .await
            .unwrap();
        assert_eq!(source.pages_requested(1), 2);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleared_input_stays_empty_until_settled() {
        let source = FakeUsers::new(45);
        let location = Location::parse("/home/admin?search=ann&ordering=user_name").unwrap();
        let mut handle = ListController::<String>::spawn(&USERS, source, quiet(), options(location));
        handle.wait_for(|s| s.state == CursorState::HasMore).await;

        handle.edit("search", None);
        let snap = handle
            .wait_for(|s| !s.inputs.contains("search"))
            .await
            .unwrap();
        assert_eq!(snap.query().text("search"), "ann");
        assert_eq!(snap.field_text(&USERS, "search"), "");
        assert_eq!(snap.field_text(&USERS, "ordering"), "user_name");

        let snap = handle
            .wait_for(|s| !s.query().contains("search"))
            .await
            .unwrap();
        assert_eq!(snap.field_text(&USERS, "search"), "");
    }

    #[tokio::test(start_paused = true)]
    async fn test_navigate_hydrates_inputs() {
        let source = FakeUsers::new(45);
        let mut handle = spawn_users(source.clone(), quiet());
        handle.wait_for(|s| s.state == CursorState::HasMore).await;

        handle.navigate(Location::parse("/home/admin?search=ann&filterActive=false").unwrap());
        let snap = handle
            .wait_for(|s| s.inputs.text("search") == "ann" && s.items.len() == 20)
            .await
            .unwrap();
        assert!(snap.items.iter().all(|i| i.contains("search=ann")));

        handle.shutdown().await;
    }
}
