use std::io::{self, IsTerminal};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use clap::Parser;

use conntop::cli::Cli;
use conntop::config::Config;
use conntop::enrichment::dns_resolver::SystemResolver;
use conntop::error::ConntopError;
use conntop::output::LineOutput;
use conntop::state::Monitor;
use conntop::system::conntrack::ProcConntrack;
use conntop::system::interface::SystemInterfaces;
use conntop::tui::event::{POLL_SLICE, WaitEnd, wait_for_next_cycle};
use conntop::tui::{self, App, Tui};

/// Global shutdown flag, set by signal handlers.
static SHUTDOWN_REQUESTED: AtomicBool = AtomicBool::new(false);

extern "C" fn signal_handler(_sig: libc::c_int) {
    SHUTDOWN_REQUESTED.store(true, Ordering::Relaxed);
}

fn install_signal_handlers() {
    unsafe {
        libc::signal(
            libc::SIGTERM,
            signal_handler as *const () as libc::sighandler_t,
        );
        libc::signal(
            libc::SIGINT,
            signal_handler as *const () as libc::sighandler_t,
        );
    }
}

fn exit_code(err: &ConntopError) -> i32 {
    match err {
        ConntopError::ConntrackUnavailable(_) => 1,
        ConntopError::Conntrack(_) | ConntopError::Interface(_) => 2,
        ConntopError::Serialization(_) | ConntopError::Tui(_) | ConntopError::Fatal(_) => 4,
    }
}

fn main() {
    env_logger::init();

    let config = Cli::parse().into_config();
    let full_screen = io::stdout().is_terminal() && !config.continuous;

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| run(config)));

    match result {
        Ok(Ok(())) => std::process::exit(0),
        Ok(Err(e)) => {
            eprintln!("error: {e}");
            std::process::exit(exit_code(&e));
        }
        Err(_) => {
            if full_screen {
                tui::restore_terminal();
            }
            eprintln!("error: fatal: unexpected panic");
            std::process::exit(4);
        }
    }
}

type SystemMonitor = Monitor<SystemResolver>;

fn run(config: Config) -> Result<(), ConntopError> {
    install_signal_handlers();

    let mut monitor = Monitor::new(SystemResolver);
    let mut flows = ProcConntrack::new();
    let interfaces = SystemInterfaces;
    log::info!(
        "Polling conntrack every {}s, threshold {} bits/s",
        config.interval_secs,
        config.threshold
    );

    let config = if io::stdout().is_terminal() && !config.continuous {
        match run_full_screen(config, &mut monitor, &mut flows, &interfaces)? {
            Some(config) => config,
            None => return Ok(()),
        }
    } else {
        config
    };

    run_lines(&config, &mut monitor, &mut flows, &interfaces)
}

/// Interactive loop. Returns the live configuration when the user switches
/// to continuous output, `None` on quit.
fn run_full_screen(
    config: Config,
    monitor: &mut SystemMonitor,
    flows: &mut ProcConntrack,
    interfaces: &SystemInterfaces,
) -> Result<Option<Config>, ConntopError> {
    let mut tui = Tui::enter()?;
    let mut app = App::new(config);

    loop {
        let report = monitor
            .run_cycle(&app.config, flows, interfaces)
            .inspect_err(|e| log::warn!("Cycle aborted: {e}"))?;
        tui.draw(&app, &report)?;

        match wait_for_next_cycle(&mut tui, &mut app, &report, &SHUTDOWN_REQUESTED)? {
            WaitEnd::NextCycle => {}
            WaitEnd::Quit => return Ok(None),
            WaitEnd::LeaveFullScreen => {
                drop(tui);
                log::debug!("Switching to continuous output");
                return Ok(Some(app.config));
            }
        }
    }
}

fn run_lines(
    config: &Config,
    monitor: &mut SystemMonitor,
    flows: &mut ProcConntrack,
    interfaces: &SystemInterfaces,
) -> Result<(), ConntopError> {
    let mut output = LineOutput::new();
    let stdout = io::stdout();

    while !SHUTDOWN_REQUESTED.load(Ordering::Relaxed) {
        let report = monitor
            .run_cycle(config, flows, interfaces)
            .inspect_err(|e| log::warn!("Cycle aborted: {e}"))?;
        match output.write_report(&report, config, &mut stdout.lock()) {
            Ok(()) => {}
            // Reader went away (e.g. piped into head)
            Err(ConntopError::Serialization(e)) if e.kind() == io::ErrorKind::BrokenPipe => {
                return Ok(());
            }
            Err(e) => return Err(e),
        }
        sleep_interruptible(config.interval());
    }
    Ok(())
}

fn sleep_interruptible(duration: Duration) {
    let started = Instant::now();
    while !SHUTDOWN_REQUESTED.load(Ordering::Relaxed) {
        let Some(left) = duration.checked_sub(started.elapsed()) else {
            return;
        };
        std::thread::sleep(left.min(POLL_SLICE));
    }
}
