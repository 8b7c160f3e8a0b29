use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

/// Result of feeding one key to a [`NumericPrompt`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PromptOutcome {
    /// Still collecting digits.
    Pending,
    /// Enter pressed with an in-range value.
    Submitted(i64),
    /// Escape pressed, or Enter with an empty or out-of-range value.
    Cancelled,
}

/// Single-line numeric input with inclusive bounds.
///
/// Captures digits while open; anything out of range is rejected on Enter.
#[derive(Clone, Debug)]
pub struct NumericPrompt {
    label: &'static str,
    input: String,
    min: i64,
    max: i64,
}

impl NumericPrompt {
    pub fn new(label: &'static str, min: i64, max: i64) -> Self {
        Self {
            label,
            input: String::new(),
            min,
            max,
        }
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> PromptOutcome {
        match key.code {
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.input.clear();
                PromptOutcome::Pending
            }
            KeyCode::Char(c) if c.is_ascii_digit() => {
                // i64 overflows past 19 digits
                if self.input.len() < 19 {
                    self.input.push(c);
                }
                PromptOutcome::Pending
            }
            KeyCode::Backspace => {
                self.input.pop();
                PromptOutcome::Pending
            }
            KeyCode::Esc => PromptOutcome::Cancelled,
            KeyCode::Enter => match self.input.parse::<i64>() {
                Ok(v) if (self.min..=self.max).contains(&v) => PromptOutcome::Submitted(v),
                _ => PromptOutcome::Cancelled,
            },
            _ => PromptOutcome::Pending,
        }
    }

    pub fn widget(&self) -> Paragraph<'_> {
        let line = Line::from(vec![
            Span::styled(
                format!("{} ({}-{}): ", self.label, self.min, self.max),
                Style::default().fg(Color::Yellow),
            ),
            Span::styled(
                self.input.as_str(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::styled("_", Style::default().fg(Color::Yellow)),
        ]);
        Paragraph::new(line)
    }
}
