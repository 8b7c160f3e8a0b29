use ratatui::style::{Color, Modifier, Style};

/// Color theme for TUI rendering.
///
/// Respects the NO_COLOR convention: when `no_color` is true, all color
/// methods return `Color::Reset` / unstyled values.
#[derive(Clone, Copy, Debug)]
pub struct Theme {
    pub no_color: bool,
}

impl Theme {
    pub fn new(no_color: bool) -> Self {
        Self { no_color }
    }

    /// Returns a color representing the magnitude of a rate in bits/s.
    ///
    /// - Green  below 1 Mbit/s
    /// - Yellow from 1 up to 100 Mbit/s
    /// - Red    above 100 Mbit/s
    pub fn rate_color(&self, bits_per_sec: i64) -> Color {
        if self.no_color {
            return Color::Reset;
        }
        if bits_per_sec < 1_000_000 {
            Color::Green
        } else if bits_per_sec <= 100_000_000 {
            Color::Yellow
        } else {
            Color::Red
        }
    }

    /// Style for table/column headers: bold, cyan foreground.
    pub fn header_style(&self) -> Style {
        if self.no_color {
            return Style::default().add_modifier(Modifier::BOLD);
        }
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    }

    /// Interface rows in the device view.
    pub fn device_style(&self) -> Style {
        if self.no_color {
            return Style::default().add_modifier(Modifier::BOLD);
        }
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD)
    }

    pub fn normal_style(&self) -> Style {
        if self.no_color {
            return Style::default();
        }
        Style::default().fg(Color::Gray)
    }

    /// RUNNING/PAUSED indicator in the header.
    pub fn run_state_style(&self, paused: bool) -> Style {
        if self.no_color {
            return Style::default().add_modifier(Modifier::REVERSED);
        }
        let color = if paused { Color::Yellow } else { Color::Green };
        Style::default().fg(color).add_modifier(Modifier::BOLD)
    }
}
