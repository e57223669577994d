//! Pipsea binary entrypoint kept minimal. The full runtime lives in `app`.

mod app;
mod events;
mod instance;
mod logic;
mod parse;
mod paths;
mod pip;
mod state;
mod theme;
mod ui;
mod util;

use std::fmt;
use std::io::Write as _;
use std::sync::OnceLock;

/// Timestamp formatter for the diagnostic log, `YYYY-MM-DD-THH:MM:SS`.
struct PipseaTimer;

impl tracing_subscriber::fmt::time::FormatTime for PipseaTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> fmt::Result {
        let ts = chrono::Local::now().format("%Y-%m-%d-T%H:%M:%S").to_string();
        w.write_str(&ts)
    }
}

static LOG_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();

fn crash_log_path() -> std::path::PathBuf {
    paths::logs_dir().join("crash.log")
}

/// Append one entry to the crash log; best effort, never panics.
fn append_crash_entry(entry: &str) {
    if let Ok(mut f) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(crash_log_path())
    {
        let when = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        let _ = writeln!(f, "==== {when} ====");
        let _ = writeln!(f, "{entry}");
    }
}

/// Route panics into the crash log, then exit instead of unwinding into an
/// undefined half-alive state.
fn install_crash_hook() {
    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::force_capture();
        append_crash_entry(&format!("panic: {info}\n{backtrace}"));
        let _ = crossterm::terminal::disable_raw_mode();
        let _ = crossterm::execute!(std::io::stdout(), crossterm::terminal::LeaveAlternateScreen);
        eprintln!(
            "pipsea crashed; details appended to {}",
            crash_log_path().display()
        );
        std::process::exit(1);
    }));
}

/// Initialize tracing writing to `<config>/pipsea/logs/pipsea.log`, falling
/// back to stderr when the file cannot be opened.
fn init_logging() {
    let log_path = paths::logs_dir().join("pipsea.log");
    match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        Ok(file) => {
            let (non_blocking, guard) = tracing_appender::non_blocking(file);
            let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_ansi(false)
                .with_writer(non_blocking)
                .with_timer(PipseaTimer)
                .init();
            let _ = LOG_GUARD.set(guard);
            tracing::info!(path = %log_path.display(), "logging initialized");
        }
        Err(e) => {
            let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_ansi(true)
                .with_timer(PipseaTimer)
                .init();
            tracing::warn!(error = %e, "failed to open log file; using stderr");
        }
    }
}

#[tokio::main]
async fn main() {
    install_crash_hook();
    init_logging();

    // Single-instance gate: nothing else may start when another process
    // holds the guard. The handle lives until process exit.
    let Some(_instance) = instance::acquire() else {
        tracing::warn!("another instance already holds the lock; exiting");
        eprintln!("Pipsea is already running in another window.");
        std::process::exit(1);
    };

    tracing::info!("Pipsea starting");
    if let Err(err) = app::run().await {
        tracing::error!(error = ?err, "Application error");
        append_crash_entry(&format!("fatal: {err}"));
        std::process::exit(1);
    }
    tracing::info!("Pipsea exited");
}

#[cfg(test)]
mod tests {
    /// The timer must always produce a non-empty stamp for the subscriber.
    #[test]
    fn pipsea_timer_formats_time_without_panic() {
        use tracing_subscriber::fmt::time::FormatTime;
        let mut buf = String::new();
        let mut writer = tracing_subscriber::fmt::format::Writer::new(&mut buf);
        let t = super::PipseaTimer;
        let _ = t.format_time(&mut writer);
        assert!(!buf.is_empty());
    }
}
