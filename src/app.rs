//! Application runtime: terminal lifecycle, worker wiring, and the
//! UI-owning event loop.
//!
//! `run` owns [`AppState`] for the whole session. Every other task — the
//! input-poll thread, the tick task, the detail-queue worker, and the
//! short-lived per-action workers spawned from `logic` — communicates with
//! it over unbounded mpsc channels, and each channel is drained here in
//! receipt order. No other code mutates display state.

use std::time::Duration;

type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

use crossterm::{
    event::{self, Event as CEvent},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use tokio::{select, sync::mpsc};

use crate::logic::{self, JobSenders};
use crate::state::{AppState, DetailTask, ListingUpdate, Modal};
use crate::ui::ui;

fn setup_terminal() -> Result<()> {
    enable_raw_mode()?;
    execute!(std::io::stdout(), EnterAlternateScreen)?;
    Ok(())
}

fn restore_terminal() -> Result<()> {
    disable_raw_mode()?;
    execute!(std::io::stdout(), LeaveAlternateScreen)?;
    Ok(())
}

/// Start the TUI runtime and run the main event loop until the operator
/// quits.
///
/// - Initializes the terminal (raw mode, alternate screen)
/// - Spawns the input-poll thread, the redraw tick, and the environment
///   check; the detail-queue worker starts once pip has been resolved
/// - Applies worker messages to [`AppState`] strictly in receipt order per
///   channel and repaints after each
pub async fn run() -> Result<()> {
    setup_terminal()?;

    let mut terminal = Terminal::new(CrosstermBackend::new(std::io::stdout()))?;
    let mut app = AppState::default();

    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<CEvent>();
    let (env_tx, mut env_rx) = mpsc::unbounded_channel();
    let (listing_tx, mut listing_rx) = mpsc::unbounded_channel();
    let (detail_req_tx, detail_req_rx) = mpsc::unbounded_channel::<DetailTask>();
    let (detail_res_tx, mut detail_res_rx) = mpsc::unbounded_channel();
    let (report_tx, mut report_rx) = mpsc::unbounded_channel();
    let (details_tx, mut details_rx) = mpsc::unbounded_channel();
    let (log_tx, mut log_rx) = mpsc::unbounded_channel::<String>();
    let (tick_tx, mut tick_rx) = mpsc::unbounded_channel::<()>();

    let jobs = JobSenders {
        env_tx,
        listing_tx,
        detail_req_tx,
        report_tx,
        details_tx,
        log_tx,
    };

    // Crossterm's blocking poll lives on its own thread so the async loop
    // never blocks on terminal input.
    std::thread::spawn(move || {
        loop {
            if let Ok(true) = event::poll(Duration::from_millis(50))
                && let Ok(ev) = event::read()
            {
                if event_tx.send(ev).is_err() {
                    break;
                }
            }
        }
    });

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(200));
        loop {
            interval.tick().await;
            if tick_tx.send(()).is_err() {
                break;
            }
        }
    });

    // The detail worker needs a resolved pip handle; its receiver is parked
    // here until the first successful environment check.
    let mut detail_req_rx = Some(detail_req_rx);

    logic::request_env_check(&mut app, &jobs);

    loop {
        let _ = terminal.draw(|f| ui(f, &mut app));

        select! {
            Some(ev) = event_rx.recv() => {
                if crate::events::handle_event(ev, &mut app, &jobs) { break; }
            }
            Some(report) = env_rx.recv() => {
                app.env_checking = false;
                app.env = report.status;
                if let Some(pip) = report.pip {
                    if let Some(rx) = detail_req_rx.take() {
                        tokio::spawn(logic::detail_worker(
                            pip.clone(),
                            rx,
                            detail_res_tx.clone(),
                            jobs.log_tx.clone(),
                        ));
                    }
                    app.pip = Some(pip);
                }
            }
            Some(update) = listing_rx.recv() => match update {
                ListingUpdate::Loaded { generation, rows } => {
                    if app.apply_listing(generation, rows) {
                        app.append_log(format!(
                            "found {} installed package(s); fetching details...",
                            app.rows.len()
                        ));
                        for row in &app.rows {
                            let _ = jobs.detail_req_tx.send(DetailTask {
                                generation,
                                name: row.name.clone(),
                            });
                        }
                    }
                }
                ListingUpdate::Failed { message } => {
                    app.listing_in_flight = false;
                    app.append_log(format!("listing failed: {message}"));
                    app.modal = Modal::Alert { message };
                }
            },
            Some(update) = detail_res_rx.recv() => {
                // Stale generations and vanished rows are discarded by the
                // projection.
                let _ = app.apply_detail_update(&update);
            }
            Some(report) = report_rx.recv() => {
                if report.ok {
                    app.modal = Modal::Alert { message: report.message.clone() };
                    logic::request_listing(&mut app, &jobs);
                } else {
                    app.modal = Modal::Alert {
                        message: format!(
                            "{} of {} failed: {}",
                            report.kind.verb(), report.name, report.message
                        ),
                    };
                }
            }
            Some(details) = details_rx.recv() => {
                match details.text {
                    Some(text) => {
                        app.modal = Modal::Details { name: details.name, text, scroll: 0 };
                    }
                    None => {
                        app.modal = Modal::Alert {
                            message: format!("could not fetch details for {}", details.name),
                        };
                    }
                }
            }
            Some(line) = log_rx.recv() => { app.append_log(line); }
            Some(()) = tick_rx.recv() => {}
            else => {}
        }
    }

    restore_terminal()?;
    Ok(())
}
