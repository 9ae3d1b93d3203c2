//! Interactive console screens (`deltadesk open`)
//!
//! Every list route renders [`ListScreen`] on top of a
//! [`ListController`]; the remaining routes render [`Placeholder`]. The group
//! screen runs a second controller over the permission list, kept at the
//! catalogue query selected by the group filters. Leaving a
//! screen records where to go next in the shared context, and
//! [`run_location`] returns it to the caller.

use std::sync::Arc;
use std::time::Duration;

use iocraft::prelude::*;
use parking_lot::Mutex;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info};

use crate::api::{EndpointSource, Group, Permission, User};
use crate::controller::{ListController, ListHandle, ListOptions, ListSnapshot};
use crate::desk::{Desk, GuardedSource};
use crate::error::{DeskError, Result};
use crate::forms::{Mutation, MutationFailure};
use crate::notify::{ChannelNotifier, Notification, Notifier};
use crate::pagination::{CachedSource, ListSource, Viewport};
use crate::query::Query;
use crate::router::{Location, Route};
use crate::screens::{PERMISSIONS, ScreenId, ScreenSpec, catalogue_query};
use crate::tui::components::{
    Footer, Header, ListPane, SearchBox, placeholder_shortcuts, render_toast,
};
use crate::tui::model::{
    Focus, ListEffect, ListViewState, compute_catalogue_view, compute_list_view_model,
    key_to_action, reduce_list_state,
};
use crate::tui::rows::{Row, RowSource, TableRow, columns};
use crate::tui::theme::theme;

const TOAST_DURATION: Duration = Duration::from_secs(4);

/// Where the console goes after a screen closes
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Exit {
    #[default]
    Quit,
    Navigate(Location),
}

/// Everything a list screen shares with its handlers
pub struct ScreenContext {
    pub desk: Arc<Desk>,
    pub screen: &'static ScreenSpec,
    pub handle: ListHandle<Row>,
    /// Permission catalogue, on the group screen only
    pub catalogue: Option<ListHandle<Row>>,
    pub notifier: ChannelNotifier,
    notifications: Mutex<Option<UnboundedReceiver<Notification>>>,
    exit: Mutex<Exit>,
}

impl ScreenContext {
    fn leave(&self, exit: Exit) {
        *self.exit.lock() = exit;
    }
}

/// Wrap an endpoint in the page cache and the session check, and flatten it
/// into display rows
fn row_source<T>(endpoint: EndpointSource<T>, desk: &Arc<Desk>) -> Arc<dyn ListSource<Row>>
where
    T: TableRow + Clone + Send + Sync + 'static,
    EndpointSource<T>: ListSource<T>,
{
    let endpoint: Arc<dyn ListSource<T>> = Arc::new(endpoint);
    let cached: Arc<dyn ListSource<T>> = Arc::new(CachedSource::new(endpoint, desk.cache.clone()));
    let guarded: Arc<dyn ListSource<T>> = Arc::new(GuardedSource::new(cached, desk.clone()));
    Arc::new(RowSource::new(guarded))
}

/// Permission list location for a group screen's filters
fn catalogue_location(group_filters: &Query) -> Location {
    Location::with_query(PERMISSIONS.route, catalogue_query(group_filters))
}

/// Run the screen for `location` until the user leaves it
pub async fn run_location(desk: Arc<Desk>, location: Location) -> Result<Exit> {
    let Some(screen) = location.route.screen() else {
        let exit = Arc::new(Mutex::new(Exit::Quit));
        element!(Placeholder(route: Some(location.route), exit: Some(exit.clone())))
            .fullscreen()
            .await
            .map_err(|e| DeskError::Other(format!("TUI error: {}", e)))?;
        let next = exit.lock().clone();
        return Ok(next);
    };

    let client = desk.client.clone();
    let source = match screen.id {
        ScreenId::Users => row_source(EndpointSource::<User>::users(client), &desk),
        ScreenId::Permissions => row_source(EndpointSource::<Permission>::permissions(client), &desk),
        ScreenId::Groups => row_source(EndpointSource::<Group>::groups(client), &desk),
    };

    let (notifier, notifications) = ChannelNotifier::new();
    let page_size = desk.config.list.page_size;
    let debounce = desk.config.debounce_delay();

    let catalogue = (screen.id == ScreenId::Groups).then(|| {
        let source = row_source(EndpointSource::<Permission>::permissions(desk.client.clone()), &desk);
        let options = ListOptions {
            location: catalogue_location(&location.query),
            page_size,
            debounce,
        };
        ListController::spawn(&PERMISSIONS, source, Arc::new(notifier.clone()), options)
    });

    let options = ListOptions {
        location,
        page_size,
        debounce,
    };
    let handle = ListController::spawn(screen, source, Arc::new(notifier.clone()), options);

    let context = Arc::new(ScreenContext {
        desk,
        screen,
        handle,
        catalogue,
        notifier,
        notifications: Mutex::new(Some(notifications)),
        exit: Mutex::new(Exit::Quit),
    });

    info!(route = %screen.route, "opening list screen");
    element!(ListScreen(context: Some(context.clone())))
        .fullscreen()
        .await
        .map_err(|e| DeskError::Other(format!("TUI error: {}", e)))?;

    let exit = context.exit.lock().clone();
    Ok(exit)
}

fn delete_mutation(screen: ScreenId) -> Mutation {
    match screen {
        ScreenId::Users => Mutation::DeleteUser,
        ScreenId::Permissions => Mutation::DeletePermission,
        ScreenId::Groups => Mutation::DeleteGroup,
    }
}

async fn delete_row(context: &ScreenContext, id: i64) {
    let client = &context.desk.client;
    let mutation = delete_mutation(context.screen.id);
    let result = match context.screen.id {
        ScreenId::Users => client.delete_user(id).await,
        ScreenId::Permissions => client.delete_permission(id).await,
        ScreenId::Groups => client.delete_group(id).await,
    };

    match context.desk.finish(mutation, result, &context.notifier) {
        Ok(()) => {
            context.handle.refresh();
        }
        Err(MutationFailure::Message(message)) => {
            context.notifier.notify(Notification::error(message));
        }
        Err(MutationFailure::Fields(fields)) => {
            let detail = fields.into_values().collect::<Vec<_>>().join("; ");
            context.notifier.notify(Notification::error(detail));
        }
    }
}

#[derive(Default, Props)]
pub struct ListScreenProps {
    pub context: Option<Arc<ScreenContext>>,
}

/// List screen
///
/// Layout:
/// ```text
/// +------------------------------------------+
/// | Header                                    |
/// +------------------------------------------+
/// | SearchBox + filters                       |
/// +------------------------------------------+
/// | ListPane                                  |
/// |   rows ...                                |
/// |   load more                               |
/// +------------------------------------------+
/// | Toast / confirmation                      |
/// | Footer                                    |
/// +------------------------------------------+
/// ```
#[component]
pub fn ListScreen(props: &ListScreenProps, mut hooks: Hooks) -> impl Into<AnyElement<'static>> {
    let Some(context) = props.context.clone() else {
        return element!(View);
    };
    let screen = context.screen;

    let (_width, height) = hooks.use_terminal_size();
    let mut system = hooks.use_context_mut::<SystemContext>();

    let mut snapshot: State<ListSnapshot<Row>> = hooks.use_state(|| context.handle.snapshot());
    let mut view_state: State<ListViewState> = hooks.use_state(ListViewState::default);
    let mut input = hooks.use_state(String::new);
    let mut last_viewport: State<Option<Viewport>> = hooks.use_state(|| None);
    let mut last_generation = hooks.use_state(|| 0u64);
    let mut should_exit = hooks.use_state(|| false);

    let mut catalogue_snapshot: State<Option<ListSnapshot<Row>>> =
        hooks.use_state(|| context.catalogue.as_ref().map(ListHandle::snapshot));

    // Controller snapshots; the catalogue follows the persisted group filters
    hooks.use_future({
        let context = context.clone();
        let mut updates = context.handle.subscribe();
        async move {
            let mut catalogue_at = context
                .catalogue
                .as_ref()
                .map(|catalogue| catalogue.snapshot().location);
            while updates.changed().await.is_ok() {
                let latest = updates.borrow_and_update().clone();
                if let Some(catalogue) = &context.catalogue {
                    let next = catalogue_location(latest.query());
                    if catalogue_at.as_ref() != Some(&next) {
                        catalogue.navigate(next.clone());
                        catalogue_at = Some(next);
                    }
                }
                snapshot.set(latest);
            }
        }
    });

    hooks.use_future({
        let updates = context.catalogue.as_ref().map(ListHandle::subscribe);
        async move {
            let Some(mut updates) = updates else {
                return;
            };
            while updates.changed().await.is_ok() {
                let latest = updates.borrow_and_update().clone();
                catalogue_snapshot.set(Some(latest));
            }
        }
    });

    // Notifications, each shown for a few seconds
    hooks.use_future({
        let context = context.clone();
        async move {
            let Some(mut notifications) = context.notifications.lock().take() else {
                return;
            };
            loop {
                let shown = view_state.read().toast.is_some();
                tokio::select! {
                    received = notifications.recv() => match received {
                        Some(notification) => {
                            let mut next = view_state.read().clone();
                            next.toast = Some(notification);
                            view_state.set(next);
                        }
                        None => break,
                    },
                    _ = tokio::time::sleep(TOAST_DURATION), if shown => {
                        let mut next = view_state.read().clone();
                        next.toast = None;
                        view_state.set(next);
                    }
                }
            }
        }
    });

    // Leave for the sign-in screen when the session goes away
    hooks.use_future({
        let context = context.clone();
        let mut sessions = context.desk.sessions.subscribe();
        async move {
            while sessions.changed().await.is_ok() {
                if sessions.borrow_and_update().is_none() {
                    context.leave(Exit::Navigate(Location::new(Route::Login)));
                    should_exit.set(true);
                    break;
                }
            }
        }
    });

    let delete_handler: Handler<i64> = hooks.use_async_handler({
        let context = context.clone();
        move |id: i64| {
            let context = context.clone();
            async move {
                delete_row(&context, id).await;
            }
        }
    });

    let edit_handler: Handler<String> = hooks.use_async_handler({
        let context = context.clone();
        move |text: String| {
            let context = context.clone();
            async move {
                let field_index = view_state.read().field_index;
                if let Some(field) = context.screen.debounced_fields.get(field_index) {
                    context.handle.edit(field, context.screen.value(field, &text));
                }
            }
        }
    });

    let current = snapshot.read().clone();

    // A restarted list starts from the top
    if current.generation != last_generation.get() {
        last_generation.set(current.generation);
        let mut next = view_state.read().clone();
        next.selected_index = 0;
        next.scroll_offset = 0;
        view_state.set(next);
    }

    let state = view_state.read().clone();
    let toast_height = if state.toast.is_some() { 3 } else { 0 };
    let confirm_height = if state.pending_delete.is_some() { 1 } else { 0 };
    // header (1) + search box (3) + pane borders and heading (3) + footer (1)
    let available = (height as usize).saturating_sub(8 + toast_height + confirm_height);
    // The catalogue takes a third, plus its title and pane chrome (4)
    let catalogue_rows = if context.catalogue.is_some() { available / 3 } else { 0 };
    let list_height = if catalogue_rows > 0 {
        available.saturating_sub(catalogue_rows + 4)
    } else {
        available
    };

    let viewport = Viewport::new(state.scroll_offset, list_height);
    if last_viewport.get() != Some(viewport) {
        last_viewport.set(Some(viewport));
        context.handle.layout(viewport);
    }

    hooks.use_terminal_events({
        let context = context.clone();
        let delete_handler = delete_handler.clone();
        let rows = current.items.clone();
        let list_key = screen.list_key(current.query());
        let current = current.clone();
        move |event| {
            let TerminalEvent::Key(KeyEvent {
                code,
                kind,
                modifiers,
                ..
            }) = event
            else {
                return;
            };
            if kind == KeyEventKind::Release {
                return;
            }

            let before = view_state.read().clone();
            let Some(action) = key_to_action(code, modifiers, &before) else {
                return;
            };
            let (after, effect) =
                reduce_list_state(before.clone(), action, screen, &rows, list_height);

            if after.focus == Focus::Search
                && (before.focus != Focus::Search || before.field_index != after.field_index)
                && let Some(field) = screen.debounced_fields.get(after.field_index)
            {
                input.set(current.field_text(screen, field));
            }
            view_state.set(after);

            let Some(effect) = effect else {
                return;
            };
            debug!(?effect, "list effect");
            match effect {
                ListEffect::FetchNextPage => {
                    context.handle.fetch_next_page();
                }
                ListEffect::Retry => {
                    context.handle.retry();
                }
                ListEffect::Refresh => {
                    context.handle.refresh();
                }
                ListEffect::CycleChoice(field) => {
                    let next = screen.next_choice(field, list_key.get(field));
                    context.handle.set_direct(field, next);
                }
                ListEffect::Delete(id) => delete_handler(id),
                ListEffect::Navigate(route) => {
                    context.leave(Exit::Navigate(Location::new(route)));
                    should_exit.set(true);
                }
                ListEffect::Exit => {
                    context.leave(Exit::Quit);
                    should_exit.set(true);
                }
            }
        }
    });

    if should_exit.get() {
        system.exit();
    }

    let vm = compute_list_view_model(&state, &current, screen, list_height);
    let catalogue = catalogue_snapshot
        .read()
        .as_ref()
        .filter(|_| catalogue_rows > 0)
        .map(|snap| compute_catalogue_view(snap, catalogue_rows));
    let theme = theme();

    element! {
        View(
            width: 100pct,
            height: height,
            flex_direction: FlexDirection::Column,
        ) {
            Header(
                title: vm.title.clone(),
                user: Some(context.desk.session.user_name().to_string()),
                count: Some(vm.count_label.clone()),
            )
            SearchBox(
                label: vm.search_label.clone(),
                value: if screen.debounced_fields.is_empty() { None } else { Some(input) },
                has_focus: state.focus == Focus::Search,
                on_change: Some(edit_handler),
                filters: vm.filters_label.clone(),
            )
            ListPane(
                columns: columns(screen.id),
                rows: vm.rows.clone(),
                sentinel: vm.sentinel.clone(),
                has_focus: state.focus == Focus::List,
            )
            #(catalogue.map(|view| element! {
                View(
                    width: 100pct,
                    height: (catalogue_rows + 4) as u16,
                    flex_shrink: 0.0,
                    flex_direction: FlexDirection::Column,
                ) {
                    View(height: 1, padding_left: 1) {
                        Text(content: view.title, color: theme.text_dimmed, weight: Weight::Bold)
                    }
                    ListPane(
                        columns: columns(ScreenId::Permissions),
                        rows: view.rows,
                        sentinel: view.sentinel,
                        has_focus: false,
                    )
                }
            }))
            #(vm.confirm.clone().map(|text| element! {
                View(height: 1, padding_left: 1) {
                    Text(content: text, color: theme.warning, weight: Weight::Bold)
                }
            }))
            #(render_toast(&state.toast))
            Footer(shortcuts: vm.shortcuts.clone(), location: Some(current.location.to_string()))
        }
    }
}

#[derive(Default, Props)]
pub struct PlaceholderProps {
    pub route: Option<Route>,
    pub exit: Option<Arc<Mutex<Exit>>>,
}

/// Routes without a screen yet
#[component]
pub fn Placeholder(props: &PlaceholderProps, mut hooks: Hooks) -> impl Into<AnyElement<'static>> {
    let (_width, height) = hooks.use_terminal_size();
    let mut system = hooks.use_context_mut::<SystemContext>();
    let mut should_exit = hooks.use_state(|| false);
    let route = props.route.unwrap_or(Route::Dashboard);
    let exit = props.exit.clone();

    hooks.use_terminal_events(move |event| {
        let TerminalEvent::Key(KeyEvent { code, kind, .. }) = event else {
            return;
        };
        if kind == KeyEventKind::Release {
            return;
        }
        let next = match code {
            KeyCode::Char('1') => Exit::Navigate(Location::new(Route::Users)),
            KeyCode::Char('2') => Exit::Navigate(Location::new(Route::GroupPermissions)),
            KeyCode::Char('3') => Exit::Navigate(Location::new(Route::Permissions)),
            KeyCode::Char('q') | KeyCode::Esc => Exit::Quit,
            _ => return,
        };
        if let Some(exit) = &exit {
            *exit.lock() = next;
        }
        should_exit.set(true);
    });

    if should_exit.get() {
        system.exit();
    }

    let theme = theme();
    let shortcuts = placeholder_shortcuts();

    element! {
        View(
            width: 100pct,
            height: height,
            flex_direction: FlexDirection::Column,
        ) {
            Header(title: route.title().to_string())
            View(
                flex_grow: 1.0,
                width: 100pct,
                justify_content: JustifyContent::Center,
                align_items: AlignItems::Center,
            ) {
                Text(
                    content: format!("{} is not available in the console yet", route.title()),
                    color: theme.text_dimmed,
                )
            }
            Footer(shortcuts: shortcuts, location: Some(route.path().to_string()))
        }
    }
}
