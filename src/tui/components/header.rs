//! App header bar component
//!
//! Displays the screen title, the signed-in user and the item count.

use iocraft::prelude::*;

use crate::tui::theme::theme;

#[derive(Default, Props)]
pub struct HeaderProps {
    pub title: String,
    pub user: Option<String>,
    /// e.g. "20 of 134"
    pub count: Option<String>,
}

#[component]
pub fn Header(props: &HeaderProps) -> impl Into<AnyElement<'static>> {
    let theme = theme();

    let left_text = match &props.user {
        Some(user) => format!("deltadesk - {} ({})", props.title, user),
        None => format!("deltadesk - {}", props.title),
    };

    element! {
        View(
            width: 100pct,
            height: 1,
            flex_direction: FlexDirection::Row,
            flex_shrink: 0.0,
            justify_content: JustifyContent::SpaceBetween,
            padding_left: 1,
            padding_right: 1,
            background_color: theme.highlight,
        ) {
            Text(
                content: left_text,
                color: theme.text,
                weight: Weight::Bold,
            )
            #(props.count.clone().map(|count| element! {
                Text(content: count, color: theme.text)
            }))
        }
    }
}
