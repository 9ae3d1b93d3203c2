//! Filter input component
//!
//! A labelled text input bound to one typed filter field, followed by the
//! current values of the screen's selectable filters.

use iocraft::prelude::*;

use crate::tui::theme::theme;

#[derive(Default, Props)]
pub struct SearchBoxProps {
    /// Name of the field being edited
    pub label: String,
    /// State for the input value
    pub value: Option<State<String>>,
    pub has_focus: bool,
    /// Called with every change of the input
    pub on_change: Option<Handler<String>>,
    /// Selectable filters, e.g. "[f] Status: true"
    pub filters: String,
}

#[component]
pub fn SearchBox(props: &SearchBoxProps) -> impl Into<AnyElement<'static>> {
    let theme = theme();
    let border_color = if props.has_focus {
        theme.border_focused
    } else {
        theme.border
    };
    let label = if props.label.is_empty() {
        "filters".to_string()
    } else {
        format!("{}:", props.label)
    };
    let on_change = props.on_change.clone();

    let Some(mut value) = props.value else {
        return element! {
            View(
                flex_direction: FlexDirection::Row,
                border_style: BorderStyle::Round,
                border_color: border_color,
                padding_left: 1,
                padding_right: 1,
                height: 3,
            ) {
                Text(content: props.filters.clone(), color: theme.text_dimmed)
            }
        };
    };

    element! {
        View(
            flex_direction: FlexDirection::Row,
            flex_shrink: 0.0,
            border_style: BorderStyle::Round,
            border_color: border_color,
            padding_left: 1,
            padding_right: 1,
            height: 3,
            column_gap: 1,
        ) {
            Text(content: label, color: theme.text_dimmed)
            View(flex_grow: 1.0) {
                TextInput(
                    value: value.to_string(),
                    has_focus: props.has_focus,
                    on_change: move |new_value: String| {
                        value.set(new_value.clone());
                        if let Some(handler) = &on_change {
                            handler(new_value);
                        }
                    },
                    color: theme.text,
                )
            }
            Text(content: props.filters.clone(), color: theme.text_dimmed)
        }
    }
}
