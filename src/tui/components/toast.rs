//! Toast notification bar

use iocraft::prelude::*;

use crate::notify::Notification;
use crate::tui::theme::theme;

/// Render a notification as an optional element
pub fn render_toast(toast: &Option<Notification>) -> Option<AnyElement<'static>> {
    let theme = theme();
    toast.as_ref().map(|n| {
        let color = theme.level_color(n.level);
        element! {
            View(
                width: 100pct,
                height: 3,
                flex_shrink: 0.0,
                align_items: AlignItems::Center,
                justify_content: JustifyContent::Center,
                background_color: Color::Black,
                border_edges: Edges::Top,
                border_style: BorderStyle::Single,
                border_color: color,
            ) {
                Text(content: n.message.clone(), color: color)
            }
        }
        .into_any()
    })
}
