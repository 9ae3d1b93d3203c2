//! Theme system for TUI colors and styles
//!
//! Colors match the CLI output in `commands`.

use iocraft::prelude::Color;

use crate::notify::Level;
use crate::pagination::CursorState;

const GREY: Color = Color::Rgb {
    r: 120,
    g: 120,
    b: 120,
};

#[derive(Debug, Clone)]
pub struct Theme {
    // Notification colors
    pub success: Color,
    pub info: Color,
    pub warning: Color,
    pub error: Color,

    // UI colors
    pub border: Color,
    pub border_focused: Color,
    pub text: Color,
    pub text_dimmed: Color,
    pub highlight: Color,
    pub id_color: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            success: Color::Green,
            info: Color::Cyan,
            warning: Color::Yellow,
            error: Color::Red,

            border: GREY,
            border_focused: Color::Blue,
            text: Color::White,
            text_dimmed: GREY,
            highlight: Color::Blue,
            id_color: Color::Cyan,
        }
    }
}

impl Theme {
    pub fn level_color(&self, level: Level) -> Color {
        match level {
            Level::Success => self.success,
            Level::Info => self.info,
            Level::Warning => self.warning,
            Level::Error => self.error,
        }
    }

    /// Color of the trailing list row for a cursor state
    pub fn cursor_color(&self, state: CursorState) -> Color {
        match state {
            CursorState::Errored => self.error,
            CursorState::LoadingFirstPage | CursorState::LoadingNextPage => self.info,
            _ => self.text_dimmed,
        }
    }
}

/// Global theme instance
pub static THEME: std::sync::LazyLock<Theme> = std::sync::LazyLock::new(Theme::default);

/// Get a reference to the global theme
pub fn theme() -> &'static Theme {
    &THEME
}
