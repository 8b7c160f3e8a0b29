use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyEventKind};

use crate::error::ConntopError;
use crate::state::CycleReport;

use super::{App, KeyOutcome, Tui};

/// Granularity of the wait between cycles.
pub const POLL_SLICE: Duration = Duration::from_millis(50);

/// How a wait between cycles ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WaitEnd {
    NextCycle,
    Quit,
    LeaveFullScreen,
}

/// Wait out one interval while serving keys and resizes.
///
/// Input is polled in short slices so keys and the shutdown flag are seen
/// promptly. The deadline is ignored while the app holds (paused, help or a
/// prompt open).
pub fn wait_for_next_cycle(
    tui: &mut Tui,
    app: &mut App,
    report: &CycleReport,
    shutdown: &AtomicBool,
) -> Result<WaitEnd, ConntopError> {
    let started = Instant::now();
    loop {
        if shutdown.load(Ordering::Relaxed) {
            return Ok(WaitEnd::Quit);
        }
        if !app.holding() && started.elapsed() >= app.config.interval() {
            return Ok(WaitEnd::NextCycle);
        }

        if !event::poll(POLL_SLICE).map_err(ConntopError::Tui)? {
            continue;
        }
        match event::read().map_err(ConntopError::Tui)? {
            Event::Key(key) if key.kind != KeyEventKind::Release => match app.handle_key(key) {
                KeyOutcome::Ignored => {}
                KeyOutcome::Redraw => tui.draw(app, report)?,
                KeyOutcome::EndWait => return Ok(WaitEnd::NextCycle),
                KeyOutcome::Quit => return Ok(WaitEnd::Quit),
                KeyOutcome::LeaveFullScreen => return Ok(WaitEnd::LeaveFullScreen),
            },
            Event::Resize(_, _) => tui.draw(app, report)?,
            // Mouse, focus and paste events are ignored
            _ => {}
        }
    }
}
