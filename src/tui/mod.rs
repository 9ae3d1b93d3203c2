//! Interactive full-screen console
//!
//! - `app` - list screens and placeholders, one per route
//! - `model` - pure state, reducer and key mapping for list screens
//! - `rows` - flattening of records into display rows

pub mod app;
pub mod components;
pub mod model;
pub mod rows;
pub mod theme;

pub use app::{Exit, ListScreen, ListScreenProps, Placeholder, PlaceholderProps, run_location};
pub use theme::Theme;
