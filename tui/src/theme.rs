//! Theme and Colors

use ratatui::style::{Color, Modifier, Style};

use crate::display::LineKind;

/// Accent for the selected tab and the assistant
pub const ACCENT: Color = Color::Rgb(120, 170, 255);

/// User input green
pub const USER_GREEN: Color = Color::Rgb(130, 220, 130);

/// System/dim text
pub const DIM_GRAY: Color = Color::Rgb(100, 100, 100);

/// Status line text
pub const STATUS_AMBER: Color = Color::Rgb(230, 190, 110);

/// Error red
pub const ERROR_RED: Color = Color::Rgb(255, 80, 80);

/// Success green
pub const SUCCESS_GREEN: Color = Color::Rgb(120, 230, 120);

/// Style for a kind of display line
pub fn line_style(kind: LineKind) -> Style {
    match kind {
        LineKind::User => Style::default().fg(USER_GREEN),
        LineKind::Assistant => Style::default().fg(ACCENT),
        LineKind::Status => Style::default().fg(STATUS_AMBER),
        LineKind::Source => Style::default().fg(DIM_GRAY).add_modifier(Modifier::UNDERLINED),
        LineKind::Error => Style::default().fg(ERROR_RED),
        LineKind::Success => Style::default().fg(SUCCESS_GREEN),
        LineKind::Progress => Style::default().fg(STATUS_AMBER),
        LineKind::Dim => Style::default().fg(DIM_GRAY),
    }
}
