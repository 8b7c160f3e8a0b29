pub mod connection;
pub mod interface;

use ratatui::layout::Constraint;
use ratatui::text::Span;
use ratatui::widgets::Cell;

use crate::output::rate::{Units, format_rate};

use super::theme::Theme;

/// Right-aligned colored rate cell.
fn rate_cell(bits_per_sec: i64, units: Units, theme: &Theme) -> Cell<'static> {
    Cell::from(
        ratatui::text::Line::from(Span::styled(
            format_rate(bits_per_sec, units),
            ratatui::style::Style::default().fg(theme.rate_color(bits_per_sec)),
        ))
        .right_aligned(),
    )
}

/// Width of a rate column for the active units.
fn rate_width(units: Units) -> Constraint {
    if units.raw {
        Constraint::Length(12)
    } else {
        Constraint::Length(11)
    }
}
