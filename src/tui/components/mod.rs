//! Reusable TUI components

pub mod footer;
pub mod header;
pub mod list_pane;
pub mod search_box;
pub mod toast;

pub use footer::{Footer, Shortcut, placeholder_shortcuts};
pub use header::Header;
pub use list_pane::ListPane;
pub use search_box::SearchBox;
pub use toast::render_toast;
