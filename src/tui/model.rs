//! List screen model types for testable state management
//!
//! This module separates state (ListViewState) from view (ListViewModel)
//! enabling unit testing of key handling, scrolling and the trailing
//! "load more" row without the iocraft framework.

use iocraft::prelude::{KeyCode, KeyModifiers};

use crate::controller::ListSnapshot;
use crate::notify::Notification;
use crate::pagination::CursorState;
use crate::query::FieldValue;
use crate::router::Route;
use crate::screens::ScreenSpec;
use crate::tui::components::footer::{
    Shortcut, browse_shortcuts, confirm_shortcuts, search_shortcuts,
};
use crate::tui::rows::Row;

// ============================================================================
// State Types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    List,
    /// The search box, editing `ListViewState::field_index`
    Search,
}

/// Raw state that changes during user interaction
#[derive(Debug, Clone, Default)]
pub struct ListViewState {
    /// Selected line; `rows.len()` is the trailing "load more" line
    pub selected_index: usize,
    pub scroll_offset: usize,
    pub focus: Focus,
    /// Which debounced field the search box edits
    pub field_index: usize,
    /// Row id awaiting delete confirmation
    pub pending_delete: Option<i64>,
    pub toast: Option<Notification>,
}

// ============================================================================
// Actions
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListAction {
    MoveUp,
    MoveDown,
    PageUp,
    PageDown,
    GoToTop,
    GoToBottom,
    FocusSearch,
    ExitSearch,
    NextField,
    /// Cycle the direct field of the screen's n-th choice
    CycleChoice(usize),
    /// Enter on the selected line
    Activate,
    RequestDelete,
    ConfirmDelete,
    CancelDelete,
    Retry,
    Refresh,
    Navigate(Route),
    ShowToast(Notification),
    DismissToast,
    Quit,
}

/// Work for the view to carry out after a reduction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListEffect {
    FetchNextPage,
    Retry,
    Refresh,
    CycleChoice(&'static str),
    Delete(i64),
    Navigate(Route),
    Exit,
}

// ============================================================================
// View Model
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowLine {
    pub index: usize,
    pub row: Row,
    pub is_selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentinelLine {
    pub text: String,
    pub state: CursorState,
    pub is_selected: bool,
}

#[derive(Debug, Clone)]
pub struct ListViewModel {
    pub title: String,
    pub count_label: String,
    pub rows: Vec<RowLine>,
    /// Present when the trailing line falls inside the viewport
    pub sentinel: Option<SentinelLine>,
    pub search_label: String,
    pub filters_label: String,
    pub confirm: Option<String>,
    pub shortcuts: Vec<Shortcut>,
}

/// Keys that cycle the screen's choices, in order
pub const CHOICE_KEYS: [char; 2] = ['f', 'o'];

/// Compute the view model from state and the latest controller snapshot
pub fn compute_list_view_model(
    state: &ListViewState,
    snapshot: &ListSnapshot<Row>,
    screen: &ScreenSpec,
    list_height: usize,
) -> ListViewModel {
    let total_lines = snapshot.items.len() + 1;
    let end = (state.scroll_offset + list_height).min(total_lines);

    let rows = (state.scroll_offset..end)
        .filter(|i| *i < snapshot.items.len())
        .map(|i| RowLine {
            index: i,
            row: snapshot.items[i].clone(),
            is_selected: state.focus == Focus::List && i == state.selected_index,
        })
        .collect();

    let sentinel_index = snapshot.items.len();
    let sentinel = (state.scroll_offset..end)
        .contains(&sentinel_index)
        .then(|| SentinelLine {
            text: sentinel_text(snapshot),
            state: snapshot.state,
            is_selected: state.focus == Focus::List && state.selected_index == sentinel_index,
        });

    let count_label = match snapshot.total_count {
        Some(total) => format!("{} of {}", snapshot.items.len(), total),
        None => format!("{} loaded", snapshot.items.len()),
    };

    let field = search_field(screen, state.field_index).unwrap_or_default();
    let list_key = screen.list_key(snapshot.query());
    let filters_label = screen
        .choices
        .iter()
        .zip(CHOICE_KEYS)
        .map(|(choice, key)| {
            let value = list_key
                .get(choice.field)
                .map(FieldValue::as_param)
                .unwrap_or_else(|| snapshot.field_text(screen, choice.field));
            let value = if value.is_empty() { "all" } else { value.as_str() };
            format!("[{key}] {}: {value}", choice.label)
        })
        .collect::<Vec<_>>()
        .join("  ");

    let confirm = state
        .pending_delete
        .map(|id| format!("Delete #{id}? [y] yes  [n] no"));

    ListViewModel {
        title: screen.route.title().to_string(),
        count_label,
        rows,
        sentinel,
        search_label: field.to_string(),
        filters_label,
        confirm,
        shortcuts: compute_shortcuts(state, screen),
    }
}

/// Read-only permission catalogue shown under the group list
#[derive(Debug, Clone)]
pub struct CatalogueView {
    pub title: String,
    pub rows: Vec<RowLine>,
    /// Present when every entry fits, so the list state stays visible
    pub sentinel: Option<SentinelLine>,
}

pub fn compute_catalogue_view(snapshot: &ListSnapshot<Row>, height: usize) -> CatalogueView {
    let filters = snapshot.query();
    let title = if filters.is_empty() {
        format!("Permission catalogue ({})", snapshot.items.len())
    } else {
        format!("Permission catalogue ({}) {}", snapshot.items.len(), filters)
    };

    let rows = snapshot
        .items
        .iter()
        .take(height)
        .enumerate()
        .map(|(index, row)| RowLine {
            index,
            row: row.clone(),
            is_selected: false,
        })
        .collect();

    let sentinel = (snapshot.items.len() < height).then(|| SentinelLine {
        text: sentinel_text(snapshot),
        state: snapshot.state,
        is_selected: false,
    });

    CatalogueView {
        title,
        rows,
        sentinel,
    }
}

fn sentinel_text(snapshot: &ListSnapshot<Row>) -> String {
    match snapshot.state {
        CursorState::Idle => String::new(),
        CursorState::LoadingFirstPage => "Loading...".to_string(),
        CursorState::HasMore => "Load more".to_string(),
        CursorState::LoadingNextPage => "Loading more...".to_string(),
        CursorState::Exhausted if snapshot.items.is_empty() => "No results".to_string(),
        CursorState::Exhausted => "End of list".to_string(),
        CursorState::Errored => format!(
            "{} [r] retry",
            snapshot.error.as_deref().unwrap_or("Request failed")
        ),
    }
}

fn search_field(screen: &ScreenSpec, index: usize) -> Option<&'static str> {
    screen.debounced_fields.get(index).copied()
}

fn compute_shortcuts(state: &ListViewState, screen: &ScreenSpec) -> Vec<Shortcut> {
    if state.pending_delete.is_some() {
        confirm_shortcuts()
    } else if state.focus == Focus::Search {
        search_shortcuts(screen.debounced_fields.len())
    } else {
        browse_shortcuts(!screen.debounced_fields.is_empty())
    }
}

// ============================================================================
// Reducer
// ============================================================================

/// Apply an action. `rows` is what the list currently holds.
pub fn reduce_list_state(
    mut state: ListViewState,
    action: ListAction,
    screen: &ScreenSpec,
    rows: &[Row],
    list_height: usize,
) -> (ListViewState, Option<ListEffect>) {
    // The trailing line is selectable
    let last = rows.len();
    let mut effect = None;

    match action {
        ListAction::MoveUp => {
            state.selected_index = state.selected_index.saturating_sub(1);
        }
        ListAction::MoveDown => {
            state.selected_index = (state.selected_index + 1).min(last);
        }
        ListAction::PageUp => {
            state.selected_index = state.selected_index.saturating_sub(list_height.max(1));
        }
        ListAction::PageDown => {
            state.selected_index = (state.selected_index + list_height.max(1)).min(last);
        }
        ListAction::GoToTop => state.selected_index = 0,
        ListAction::GoToBottom => state.selected_index = last,
        ListAction::FocusSearch => {
            if !screen.debounced_fields.is_empty() {
                state.focus = Focus::Search;
            }
        }
        ListAction::ExitSearch => state.focus = Focus::List,
        ListAction::NextField => {
            let count = screen.debounced_fields.len();
            if count > 0 {
                state.field_index = (state.field_index + 1) % count;
            }
        }
        ListAction::CycleChoice(n) => {
            if let Some(choice) = screen.choices.get(n) {
                effect = Some(ListEffect::CycleChoice(choice.field));
            }
        }
        ListAction::Activate => {
            if state.selected_index == last {
                effect = Some(ListEffect::FetchNextPage);
            }
        }
        ListAction::RequestDelete => {
            state.pending_delete = rows.get(state.selected_index).map(|r| r.id);
        }
        ListAction::ConfirmDelete => {
            effect = state.pending_delete.take().map(ListEffect::Delete);
        }
        ListAction::CancelDelete => state.pending_delete = None,
        ListAction::Retry => effect = Some(ListEffect::Retry),
        ListAction::Refresh => effect = Some(ListEffect::Refresh),
        ListAction::Navigate(route) => {
            if route != screen.route {
                effect = Some(ListEffect::Navigate(route));
            }
        }
        ListAction::ShowToast(notification) => state.toast = Some(notification),
        ListAction::DismissToast => state.toast = None,
        ListAction::Quit => effect = Some(ListEffect::Exit),
    }

    state.selected_index = state.selected_index.min(last);
    state.scroll_offset = adjust_scroll(state.scroll_offset, state.selected_index, list_height);
    (state, effect)
}

/// Adjust scroll offset to keep selected item visible
pub fn adjust_scroll(scroll_offset: usize, selected_index: usize, list_height: usize) -> usize {
    if list_height == 0 {
        return 0;
    }
    if selected_index < scroll_offset {
        return selected_index;
    }
    if selected_index >= scroll_offset + list_height {
        return selected_index.saturating_sub(list_height - 1);
    }
    scroll_offset
}

// ============================================================================
// Key Mapping
// ============================================================================

/// Convert a key event to a ListAction (pure function)
///
/// Returns `None` if the key doesn't map to any action. Printable keys in
/// search mode belong to the search box.
pub fn key_to_action(
    code: KeyCode,
    modifiers: KeyModifiers,
    state: &ListViewState,
) -> Option<ListAction> {
    if state.pending_delete.is_some() {
        return match code {
            KeyCode::Char('y') | KeyCode::Enter => Some(ListAction::ConfirmDelete),
            KeyCode::Char('n') | KeyCode::Esc => Some(ListAction::CancelDelete),
            _ => None,
        };
    }

    if state.focus == Focus::Search {
        return match (code, modifiers) {
            (KeyCode::Esc | KeyCode::Enter, _) => Some(ListAction::ExitSearch),
            (KeyCode::Tab, _) => Some(ListAction::NextField),
            (KeyCode::Char('q'), m) if m.contains(KeyModifiers::CONTROL) => Some(ListAction::Quit),
            _ => None,
        };
    }

    match (code, modifiers) {
        (KeyCode::Char('j') | KeyCode::Down, _) => Some(ListAction::MoveDown),
        (KeyCode::Char('k') | KeyCode::Up, _) => Some(ListAction::MoveUp),
        (KeyCode::Char('g'), KeyModifiers::NONE) => Some(ListAction::GoToTop),
        (KeyCode::Char('G'), _) => Some(ListAction::GoToBottom),
        (KeyCode::PageUp, _) => Some(ListAction::PageUp),
        (KeyCode::PageDown, _) => Some(ListAction::PageDown),
        (KeyCode::Enter, _) => Some(ListAction::Activate),
        (KeyCode::Char('/'), _) => Some(ListAction::FocusSearch),
        (KeyCode::Char('f'), KeyModifiers::NONE) => Some(ListAction::CycleChoice(0)),
        (KeyCode::Char('o'), KeyModifiers::NONE) => Some(ListAction::CycleChoice(1)),
        (KeyCode::Char('d'), KeyModifiers::NONE) => Some(ListAction::RequestDelete),
        (KeyCode::Char('r'), KeyModifiers::NONE) => Some(ListAction::Retry),
        (KeyCode::Char('R'), _) => Some(ListAction::Refresh),
        (KeyCode::Char('1'), _) => Some(ListAction::Navigate(Route::Users)),
        (KeyCode::Char('2'), _) => Some(ListAction::Navigate(Route::GroupPermissions)),
        (KeyCode::Char('3'), _) => Some(ListAction::Navigate(Route::Permissions)),
        (KeyCode::Char('0'), _) => Some(ListAction::Navigate(Route::Dashboard)),
        (KeyCode::Char('q') | KeyCode::Esc, _) => Some(ListAction::Quit),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::Location;
    use crate::screens::{PERMISSIONS, USERS};

    fn rows(n: usize) -> Vec<Row> {
        (0..n)
            .map(|i| Row {
                id: i as i64 + 100,
                cells: vec![format!("row{i}")],
            })
            .collect()
    }

    fn snapshot(items: Vec<Row>, state: CursorState) -> ListSnapshot<Row> {
        ListSnapshot {
            location: Location::new(Route::Users),
            inputs: Default::default(),
            items,
            state,
            generation: 1,
            has_next_page: state == CursorState::HasMore,
            is_loading: state == CursorState::LoadingFirstPage,
            is_fetching_next_page: state == CursorState::LoadingNextPage,
            total_count: Some(40),
            error: None,
        }
    }

    #[test]
    fn test_move_down_reaches_trailing_line_and_scrolls() {
        let items = rows(5);
        let mut state = ListViewState::default();
        for _ in 0..10 {
            state = reduce_list_state(state, ListAction::MoveDown, &USERS, &items, 3).0;
        }
        assert_eq!(state.selected_index, 5);
        assert_eq!(state.scroll_offset, 3);
    }

    #[test]
    fn test_activate_on_trailing_line_fetches_next_page() {
        let items = rows(2);
        let state = ListViewState {
            selected_index: 2,
            ..Default::default()
        };
        let (_, effect) = reduce_list_state(state, ListAction::Activate, &USERS, &items, 10);
        assert_eq!(effect, Some(ListEffect::FetchNextPage));

        let (_, effect) =
            reduce_list_state(ListViewState::default(), ListAction::Activate, &USERS, &items, 10);
        assert_eq!(effect, None);
    }

    #[test]
    fn test_delete_needs_confirmation() {
        let items = rows(3);
        let state = ListViewState {
            selected_index: 1,
            ..Default::default()
        };
        let (state, effect) = reduce_list_state(state, ListAction::RequestDelete, &USERS, &items, 10);
        assert_eq!(state.pending_delete, Some(101));
        assert_eq!(effect, None);

        assert_eq!(
            key_to_action(KeyCode::Char('j'), KeyModifiers::NONE, &state),
            None
        );
        let (state, effect) = reduce_list_state(state, ListAction::ConfirmDelete, &USERS, &items, 10);
        assert_eq!(effect, Some(ListEffect::Delete(101)));
        assert_eq!(state.pending_delete, None);
    }

    #[test]
    fn test_delete_on_trailing_line_is_ignored() {
        let items = rows(1);
        let state = ListViewState {
            selected_index: 1,
            ..Default::default()
        };
        let (state, _) = reduce_list_state(state, ListAction::RequestDelete, &USERS, &items, 10);
        assert_eq!(state.pending_delete, None);
    }

    #[test]
    fn test_cycle_choice_names_field() {
        let (_, effect) =
            reduce_list_state(ListViewState::default(), ListAction::CycleChoice(1), &PERMISSIONS, &[], 5);
        assert_eq!(effect, Some(ListEffect::CycleChoice("action")));
        let (_, effect) =
            reduce_list_state(ListViewState::default(), ListAction::CycleChoice(5), &USERS, &[], 5);
        assert_eq!(effect, None);
    }

    #[test]
    fn test_next_field_wraps() {
        let mut state = ListViewState::default();
        for _ in 0..4 {
            state = reduce_list_state(state, ListAction::NextField, &PERMISSIONS, &[], 5).0;
        }
        assert_eq!(state.field_index, 0);
        state = reduce_list_state(state, ListAction::NextField, &USERS, &[], 5).0;
        assert_eq!(state.field_index, 0);
    }

    #[test]
    fn test_navigate_to_same_screen_is_noop() {
        let (_, effect) = reduce_list_state(
            ListViewState::default(),
            ListAction::Navigate(Route::Users),
            &USERS,
            &[],
            5,
        );
        assert_eq!(effect, None);
    }

    #[test]
    fn test_search_mode_keys() {
        let state = ListViewState {
            focus: Focus::Search,
            ..Default::default()
        };
        assert_eq!(
            key_to_action(KeyCode::Char('q'), KeyModifiers::NONE, &state),
            None
        );
        assert_eq!(
            key_to_action(KeyCode::Esc, KeyModifiers::NONE, &state),
            Some(ListAction::ExitSearch)
        );
        assert_eq!(
            key_to_action(KeyCode::Char('q'), KeyModifiers::CONTROL, &state),
            Some(ListAction::Quit)
        );
    }

    #[test]
    fn test_view_model_sentinel_visibility() {
        let snap = snapshot(rows(5), CursorState::HasMore);
        let state = ListViewState::default();
        let vm = compute_list_view_model(&state, &snap, &USERS, 3);
        assert_eq!(vm.rows.len(), 3);
        assert!(vm.sentinel.is_none());
        assert_eq!(vm.count_label, "5 of 40");

        let vm = compute_list_view_model(&state, &snap, &USERS, 10);
        assert_eq!(vm.rows.len(), 5);
        let sentinel = vm.sentinel.unwrap();
        assert_eq!(sentinel.text, "Load more");
        assert!(!sentinel.is_selected);
    }

    #[test]
    fn test_catalogue_view_fits_height() {
        let mut snap = snapshot(rows(4), CursorState::Exhausted);
        snap.location = Location::parse("/home/admin/getListPermissions?resource=user").unwrap();

        let view = compute_catalogue_view(&snap, 2);
        assert_eq!(view.title, "Permission catalogue (4) resource=user");
        assert_eq!(view.rows.len(), 2);
        assert!(view.rows.iter().all(|line| !line.is_selected));
        assert!(view.sentinel.is_none());

        let view = compute_catalogue_view(&snap, 10);
        assert_eq!(view.rows.len(), 4);
        assert_eq!(view.sentinel.unwrap().text, "End of list");

        let empty = snapshot(vec![], CursorState::Exhausted);
        let view = compute_catalogue_view(&empty, 3);
        assert_eq!(view.title, "Permission catalogue (0)");
        assert_eq!(view.sentinel.unwrap().text, "No results");
    }

    #[test]
    fn test_view_model_error_and_filters() {
        let mut snap = snapshot(vec![], CursorState::Errored);
        snap.error = Some("HTTP 500".into());
        let vm = compute_list_view_model(&ListViewState::default(), &snap, &USERS, 5);
        assert_eq!(vm.sentinel.unwrap().text, "HTTP 500 [r] retry");
        assert_eq!(vm.filters_label, "[f] Status: true  [o] Sort: all");
        assert_eq!(vm.search_label, "search");

        snap.location.query = snap.location.query.clone().with("filterActive", false);
        let vm = compute_list_view_model(&ListViewState::default(), &snap, &USERS, 5);
        assert_eq!(vm.filters_label, "[f] Status: false  [o] Sort: all");
    }
}
