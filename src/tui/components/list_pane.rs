//! List pane component
//!
//! Renders the visible slice of a list screen: a header line, the rows, and
//! the trailing line whose visibility drives loading of the next page.

use iocraft::prelude::*;

use crate::tui::model::{RowLine, SentinelLine};
use crate::tui::theme::theme;
use crate::utils::fit_width;

#[derive(Default, Props)]
pub struct ListPaneProps {
    /// Column names and widths
    pub columns: &'static [(&'static str, usize)],
    pub rows: Vec<RowLine>,
    pub sentinel: Option<SentinelLine>,
    pub has_focus: bool,
}

#[component]
pub fn ListPane(props: &ListPaneProps) -> impl Into<AnyElement<'static>> {
    let theme = theme();
    let columns = props.columns;

    let heading = columns
        .iter()
        .map(|(name, width)| fit_width(name, *width))
        .collect::<Vec<_>>()
        .join(" ");

    element! {
        View(
            width: 100pct,
            flex_grow: 1.0,
            flex_direction: FlexDirection::Column,
            border_style: BorderStyle::Round,
            border_color: if props.has_focus { theme.border_focused } else { theme.border },
        ) {
            View(height: 1, padding_left: 1) {
                Text(
                    content: format!("  {:<6} {}", "ID", heading),
                    color: theme.text_dimmed,
                    weight: Weight::Bold,
                )
            }
            #(props.rows.iter().map(|line| {
                let indicator = if line.is_selected { ">" } else { " " };
                let cells = line
                    .row
                    .cells
                    .iter()
                    .zip(columns.iter())
                    .map(|(cell, (_, width))| fit_width(cell, *width))
                    .collect::<Vec<_>>()
                    .join(" ");
                element! {
                    View(
                        height: 1,
                        width: 100pct,
                        padding_left: 1,
                        background_color: if line.is_selected { Some(theme.highlight) } else { None },
                    ) {
                        Text(content: indicator.to_string(), color: theme.text)
                        Text(
                            content: format!(" {:<6}", line.row.id),
                            color: if line.is_selected { theme.text } else { theme.id_color },
                        )
                        Text(content: format!(" {}", cells), color: theme.text)
                    }
                }
            }))
            #(props.sentinel.as_ref().map(|sentinel| {
                let indicator = if sentinel.is_selected { ">" } else { " " };
                element! {
                    View(
                        height: 1,
                        width: 100pct,
                        padding_left: 1,
                        background_color: if sentinel.is_selected { Some(theme.highlight) } else { None },
                    ) {
                        Text(
                            content: format!("{} {}", indicator, sentinel.text),
                            color: if sentinel.is_selected {
                                theme.text
                            } else {
                                theme.cursor_color(sentinel.state)
                            },
                        )
                    }
                }
            }))
        }
    }
}
