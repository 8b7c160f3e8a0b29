pub mod event;
pub mod theme;
pub mod views;
pub mod widgets;

use std::io;

use crossterm::ExecutableCommand;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use crate::config::{AgeFormat, Command, Config};
use crate::error::ConntopError;
use crate::output::rate::{Units, format_rate};
use crate::state::CycleReport;

use self::theme::Theme;
use self::widgets::{NumericPrompt, PromptOutcome};

pub const INTERVAL_PROMPT_MAX: i64 = 998;
pub const THRESHOLD_PROMPT_MAX: i64 = 9_999_999_999_998;

/// What a key press asks of the wait loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyOutcome {
    Ignored,
    /// Settings or overlays changed; draw the last report again.
    Redraw,
    /// Stop waiting and run the next cycle now.
    EndWait,
    Quit,
    /// Drop out of full-screen mode and continue with line output.
    LeaveFullScreen,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PromptKind {
    Interval,
    Threshold,
}

/// Interactive session state layered over the runtime configuration.
pub struct App {
    pub config: Config,
    pub paused: bool,
    pub show_help: bool,
    prompt: Option<(PromptKind, NumericPrompt)>,
    theme: Theme,
}

impl App {
    pub fn new(config: Config) -> Self {
        let theme = Theme::new(config.no_color);
        Self {
            config,
            paused: false,
            show_help: false,
            prompt: None,
            theme,
        }
    }

    /// True while the wait between cycles must not expire.
    pub fn holding(&self) -> bool {
        self.paused || self.show_help || self.prompt.is_some()
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> KeyOutcome {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return KeyOutcome::Quit;
        }

        if let Some((kind, prompt)) = self.prompt.as_mut() {
            match prompt.handle_key(key) {
                PromptOutcome::Pending => {}
                PromptOutcome::Submitted(value) => {
                    let command = match kind {
                        PromptKind::Interval => Command::SetInterval(value.unsigned_abs()),
                        PromptKind::Threshold => Command::SetThreshold(value),
                    };
                    self.config = self.config.apply(command);
                    self.prompt = None;
                }
                PromptOutcome::Cancelled => self.prompt = None,
            }
            return KeyOutcome::Redraw;
        }

        if key.code == KeyCode::Char('q') {
            return KeyOutcome::Quit;
        }

        if self.show_help {
            self.show_help = false;
            return KeyOutcome::Redraw;
        }

        let command = match key.code {
            KeyCode::Char('p') => {
                // Running: one more cycle is drawn, then the wait holds.
                self.paused = !self.paused;
                return KeyOutcome::EndWait;
            }
            KeyCode::Char('h' | '?') => {
                self.show_help = true;
                return KeyOutcome::Redraw;
            }
            KeyCode::Char('u') => {
                self.prompt = Some((
                    PromptKind::Interval,
                    NumericPrompt::new("Interval", 1, INTERVAL_PROMPT_MAX),
                ));
                return KeyOutcome::Redraw;
            }
            KeyCode::Char('t') => {
                self.prompt = Some((
                    PromptKind::Threshold,
                    NumericPrompt::new("Threshold", 0, THRESHOLD_PROMPT_MAX),
                ));
                return KeyOutcome::Redraw;
            }
            KeyCode::Char('c') => {
                self.config = self.config.apply(Command::ToggleContinuous);
                return KeyOutcome::LeaveFullScreen;
            }
            KeyCode::Char('n') => Command::ToggleNumericLocal,
            KeyCode::Char('N') => Command::ToggleNumericRemote,
            KeyCode::Char('a') => Command::ToggleAge,
            KeyCode::Char('w') => Command::ToggleWide,
            KeyCode::Char('r') => Command::ToggleRedactLocal,
            KeyCode::Char('R') => Command::ToggleRedactRemote,
            KeyCode::Char('S') => Command::ToggleSi,
            KeyCode::Char('V') => Command::ToggleStatus,
            KeyCode::Char('I') => Command::ToggleId,
            KeyCode::Char('b') => Command::ToggleBytes,
            KeyCode::Char('B') => Command::ToggleRawBps,
            KeyCode::Char('l') => Command::ToggleLoopback,
            KeyCode::Char('0') => Command::BothFamilies,
            KeyCode::Char('4') => Command::KeepIpv4ToggleIpv6,
            KeyCode::Char('6') => Command::KeepIpv6ToggleIpv4,
            KeyCode::Char('d') => Command::ToggleDeviceView,
            _ => return KeyOutcome::Ignored,
        };
        self.config = self.config.apply(command);
        KeyOutcome::Redraw
    }
}

/// Full-screen terminal session. Raw mode and the alternate screen are
/// released on drop.
pub struct Tui {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
}

impl Tui {
    pub fn enter() -> Result<Self, ConntopError> {
        enable_raw_mode().map_err(ConntopError::Tui)?;
        io::stdout()
            .execute(EnterAlternateScreen)
            .map_err(ConntopError::Tui)?;
        let backend = CrosstermBackend::new(io::stdout());
        let terminal = Terminal::new(backend).map_err(ConntopError::Tui)?;
        Ok(Self { terminal })
    }

    pub fn draw(&mut self, app: &App, report: &CycleReport) -> Result<(), ConntopError> {
        self.terminal
            .draw(|frame| render(frame, app, report))
            .map_err(ConntopError::Tui)?;
        Ok(())
    }
}

impl Drop for Tui {
    fn drop(&mut self) {
        restore_terminal();
    }
}

/// Leave raw mode and the alternate screen. Safe to call more than once.
pub fn restore_terminal() {
    let _ = disable_raw_mode();
    let _ = io::stdout().execute(LeaveAlternateScreen);
}

fn render(frame: &mut ratatui::Frame, app: &App, report: &CycleReport) {
    let size = frame.area();
    let prompt_height = u16::from(app.prompt.is_some());
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(3),
            Constraint::Length(prompt_height),
        ])
        .split(size);

    render_header(frame, chunks[0], app, report);

    if app.config.device_view {
        views::interface::render(frame, chunks[1], report, &app.config, &app.theme);
    } else {
        views::connection::render(frame, chunks[1], report, &app.config, &app.theme);
    }

    if let Some((_, prompt)) = &app.prompt {
        frame.render_widget(prompt.widget(), chunks[2]);
    }

    if app.show_help {
        render_help_overlay(frame, size, app, report.age_tracking);
    }
}

fn family_label(config: &Config) -> &'static str {
    match (config.ipv4, config.ipv6) {
        (true, true) => "IPv4+IPv6",
        (true, false) => "IPv4",
        (false, true) => "IPv6",
        (false, false) => "none",
    }
}

fn render_header(frame: &mut ratatui::Frame, area: Rect, app: &App, report: &CycleReport) {
    let config = &app.config;
    let units = Units::from_config(config);
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let run_state = if app.paused { " PAUSED " } else { " RUNNING " };

    let first = Line::from(vec![
        Span::styled("conntop", bold),
        Span::raw(format!("  flows: {}  ", report.flow_count)),
        Span::styled(run_state, app.theme.run_state_style(app.paused)),
        Span::raw(format!(
            "  interval: {}s  units: {}  family: {}",
            config.interval_secs,
            units.label(),
            family_label(config),
        )),
    ]);
    let second = Line::from(vec![
        Span::raw(format!(
            "RX: {}  TX: {}  shown: {}  threshold: {}  sort: {}",
            format_rate(report.totals.rx, units),
            format_rate(report.totals.tx, units),
            report.connections.len(),
            config.threshold,
            config.sort,
        )),
        Span::styled("   h for help", Style::default().add_modifier(Modifier::DIM)),
    ]);
    frame.render_widget(Paragraph::new(vec![first, second]), area);
}

fn on_off(v: bool) -> &'static str {
    if v { "on" } else { "off" }
}

/// Key reference with the current value of every setting.
fn help_lines(config: &Config, age_tracking: bool) -> Vec<String> {
    let age = match config.age {
        AgeFormat::Hidden => "off",
        AgeFormat::Seconds => "seconds",
        AgeFormat::Dhms => "d/h/m/s",
    };
    let mut lines = vec![
        "  q       Quit".to_string(),
        "  p       Pause / resume".to_string(),
        "  h ?     This help".to_string(),
        format!("  n       Numeric local addresses   [{}]", on_off(config.numeric_local)),
        format!("  N       Numeric remote addresses  [{}]", on_off(config.numeric_remote)),
        format!("  u       Update interval           [{}s]", config.interval_secs),
        format!("  t       Threshold bits/s          [{}]", config.threshold),
        format!("  a       Flow age                  [{age}]"),
        format!("  w       Wide rows                 [{}]", on_off(config.wide)),
        format!("  r       Redact local              [{}]", on_off(config.redact_local)),
        format!("  R       Redact remote             [{}]", on_off(config.redact_remote)),
        format!("  S       1024-based units          [{}]", on_off(config.si)),
        format!("  V       Flow status               [{}]", on_off(config.show_status)),
        format!("  I       Conntrack id              [{}]", on_off(config.show_id)),
        format!("  b       Bytes instead of bits     [{}]", on_off(config.bytes)),
        format!("  B       Raw bits/s                [{}]", on_off(config.raw_bps)),
        "  c       Continuous line output".to_string(),
        format!("  l       Loopback flows            [{}]", on_off(config.include_loopback)),
        format!("  0 4 6   Address families          [{}]", family_label(config)),
        format!("  d       Device view               [{}]", on_off(config.device_view)),
    ];
    if !age_tracking {
        lines.push(String::new());
        // split to fit the overlay width
        lines.push("  Age field unavailable; enable".to_string());
        lines.push("  net.netfilter.nf_conntrack_timestamp in kernel".to_string());
    }
    lines
}

fn render_help_overlay(frame: &mut ratatui::Frame, area: Rect, app: &App, age_tracking: bool) {
    let lines = help_lines(&app.config, age_tracking);
    let help_width = 52u16.min(area.width.saturating_sub(4));
    let wanted = u16::try_from(lines.len() + 4).unwrap_or(u16::MAX);
    let help_height = wanted.min(area.height.saturating_sub(2));
    let x = (area.width.saturating_sub(help_width)) / 2;
    let y = (area.height.saturating_sub(help_height)) / 2;
    let help_area = Rect::new(x, y, help_width, help_height);

    let mut text: Vec<Line> = lines.into_iter().map(Line::from).collect();
    text.push(Line::from(""));
    text.push(Line::from(Span::styled(
        "Press any key to continue, q to quit",
        Style::default().add_modifier(Modifier::DIM),
    )));

    let help = Paragraph::new(text).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Help "),
    );

    frame.render_widget(Clear, help_area);
    frame.render_widget(help, help_area);
}
