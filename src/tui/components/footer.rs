//! Bottom bar: key hints on the left, the current location on the right.
//!
//! The location is the same string `deltadesk open` accepts, so it can be
//! copied to reopen the screen with its filters.

use iocraft::prelude::*;

use crate::tui::theme::theme;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shortcut {
    pub key: String,
    pub action: String,
}

impl Shortcut {
    pub fn new(key: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            action: action.into(),
        }
    }
}

/// Hints for a list screen that is browsing rows
pub fn browse_shortcuts(can_search: bool) -> Vec<Shortcut> {
    let mut shortcuts = vec![Shortcut::new("j/k", "Move")];
    if can_search {
        shortcuts.push(Shortcut::new("/", "Search"));
    }
    shortcuts.extend([
        Shortcut::new("d", "Delete"),
        Shortcut::new("R", "Refresh"),
        Shortcut::new("1-3", "Screens"),
        Shortcut::new("q", "Quit"),
    ]);
    shortcuts
}

/// Hints while a search box has focus
pub fn search_shortcuts(field_count: usize) -> Vec<Shortcut> {
    let mut shortcuts = vec![Shortcut::new("Enter", "Done"), Shortcut::new("Esc", "Back")];
    if field_count > 1 {
        shortcuts.push(Shortcut::new("Tab", "Next field"));
    }
    shortcuts
}

/// Hints while a delete waits for confirmation
pub fn confirm_shortcuts() -> Vec<Shortcut> {
    vec![Shortcut::new("y", "Confirm"), Shortcut::new("n", "Cancel")]
}

/// Hints on routes without a list screen
pub fn placeholder_shortcuts() -> Vec<Shortcut> {
    vec![
        Shortcut::new("1", "Users"),
        Shortcut::new("2", "Groups"),
        Shortcut::new("3", "Permissions"),
        Shortcut::new("q", "Quit"),
    ]
}

#[derive(Default, Props)]
pub struct FooterProps {
    pub shortcuts: Vec<Shortcut>,
    pub location: Option<String>,
}

#[component]
pub fn Footer(props: &FooterProps) -> impl Into<AnyElement<'static>> {
    let theme = theme();

    element! {
        View(
            width: 100pct,
            min_height: 1,
            flex_direction: FlexDirection::Row,
            justify_content: JustifyContent::SpaceBetween,
            flex_shrink: 0.0,
            padding_left: 1,
            padding_right: 1,
            background_color: theme.border,
        ) {
            View(flex_direction: FlexDirection::Row, flex_wrap: FlexWrap::Wrap, column_gap: 2) {
                #(props.shortcuts.iter().map(|shortcut| element! {
                    View(flex_direction: FlexDirection::Row) {
                        Text(
                            content: format!("[{}]", shortcut.key),
                            color: theme.highlight,
                            weight: Weight::Bold,
                        )
                        Text(content: format!(" {}", shortcut.action), color: theme.text)
                    }
                }))
            }
            #(props.location.clone().map(|location| element! {
                Text(content: location, color: theme.text_dimmed)
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(shortcuts: &[Shortcut]) -> Vec<&str> {
        shortcuts.iter().map(|s| s.key.as_str()).collect()
    }

    #[test]
    fn test_browse_hides_search_without_typed_fields() {
        assert_eq!(keys(&browse_shortcuts(true))[..2], ["j/k", "/"]);
        assert!(!keys(&browse_shortcuts(false)).contains(&"/"));
    }

    #[test]
    fn test_search_offers_tab_only_with_several_fields() {
        assert_eq!(keys(&search_shortcuts(1)), ["Enter", "Esc"]);
        assert_eq!(keys(&search_shortcuts(4)), ["Enter", "Esc", "Tab"]);
    }
}
