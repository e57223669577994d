//! Background jobs and the request helpers the event layer calls.
//!
//! Every user action maps to a short-lived worker task spawned here. A
//! worker runs pip through [`crate::pip`], interprets the output through
//! [`crate::parse`], and reports back exclusively over channels; nothing in
//! this module mutates [`AppState`] from a worker. The `request_*` helpers
//! are the UI-thread half: they validate the action against current state,
//! then hand off to a `spawn_*` function.
//!
//! The one long-lived consumer is [`detail_worker`]: a strict FIFO over the
//! detail queue, one lookup in flight at a time, soft failures logged and
//! skipped.

use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

use crate::parse;
use crate::pip::{CommandResult, Pip};
use crate::state::{
    ActionKind, ActionReport, AppState, DetailSlot, DetailTask, DetailUpdate, DetailsText,
    EnvReport, EnvStatus, ListingUpdate, Modal, PackageRow,
};

/// Channel endpoints handed to workers and to the event layer.
#[derive(Debug, Clone)]
pub struct JobSenders {
    /// Environment detection results.
    pub env_tx: UnboundedSender<EnvReport>,
    /// Listing results.
    pub listing_tx: UnboundedSender<ListingUpdate>,
    /// Detail queue producer side.
    pub detail_req_tx: UnboundedSender<DetailTask>,
    /// Install/uninstall outcomes.
    pub report_tx: UnboundedSender<ActionReport>,
    /// `pip show` text for the details modal.
    pub details_tx: UnboundedSender<DetailsText>,
    /// Operation log entries, consumed in order by the UI loop.
    pub log_tx: UnboundedSender<String>,
}

/// Detect pip and probe its version.
pub async fn check_environment() -> EnvReport {
    let Some(pip) = Pip::detect() else {
        return EnvReport {
            status: EnvStatus {
                installed: false,
                version: String::new(),
                last_error: "no pip executable found on PATH".to_string(),
            },
            pip: None,
        };
    };
    tracing::debug!(program = %pip.program().display(), "probing pip");
    let out = pip.version().await;
    if out.ok() {
        EnvReport {
            status: EnvStatus {
                installed: true,
                version: out.stdout.trim().to_string(),
                last_error: String::new(),
            },
            pip: Some(pip),
        }
    } else {
        EnvReport {
            status: EnvStatus {
                installed: false,
                version: String::new(),
                last_error: out.failure_reason(),
            },
            pip: None,
        }
    }
}

/// Run `pip list` and shape the outcome for the UI loop.
///
/// Command failures and parse failures both become [`ListingUpdate::Failed`]
/// so the loop leaves the current table untouched and raises a notice.
pub async fn run_listing(pip: &Pip, generation: u64) -> ListingUpdate {
    let out = pip.list().await;
    if !out.ok() {
        return ListingUpdate::Failed {
            message: format!(
                "could not list installed packages: {}",
                out.failure_reason()
            ),
        };
    }
    match parse::parse_listing(&out.stdout) {
        Ok(pkgs) => ListingUpdate::Loaded {
            generation,
            rows: pkgs
                .into_iter()
                .map(|p| PackageRow::pending(p.name, p.version))
                .collect(),
        },
        Err(e) => {
            tracing::warn!(raw = %e.raw, "listing output did not parse");
            ListingUpdate::Failed {
                message: e.to_string(),
            }
        }
    }
}

/// Shape one command outcome into an [`ActionReport`].
///
/// The failure message is stderr when non-empty, stdout otherwise — pip
/// writes resolution errors to stderr but some build failures only to
/// stdout.
pub fn action_report(kind: ActionKind, name: &str, out: &CommandResult) -> ActionReport {
    if out.ok() {
        ActionReport {
            kind,
            name: name.to_string(),
            ok: true,
            message: format!("{name} {} succeeded", kind.verb()),
        }
    } else {
        ActionReport {
            kind,
            name: name.to_string(),
            ok: false,
            message: out.failure_reason(),
        }
    }
}

/// Log line for a report; ✓/✗ prefix so outcomes scan easily in the pane.
pub fn report_line(report: &ActionReport) -> String {
    if report.ok {
        format!("✓ {}", report.message)
    } else {
        format!(
            "✗ {} of {} failed: {}",
            report.kind.verb(),
            report.name,
            report.message
        )
    }
}

/// Single consumer of the detail queue.
///
/// Tasks are processed strictly in submission order, one at a time. A
/// failure resolving one task degrades that row to "unknown" and the loop
/// moves on; the worker itself never dies before its channel closes.
pub async fn detail_worker(
    pip: Pip,
    mut rx: UnboundedReceiver<DetailTask>,
    res_tx: UnboundedSender<DetailUpdate>,
    log_tx: UnboundedSender<String>,
) {
    while let Some(task) = rx.recv().await {
        let update = resolve_detail(&pip, &task, &log_tx).await;
        if res_tx.send(update).is_err() {
            break;
        }
    }
}

/// Resolve location and size for one detail task; failures are soft.
async fn resolve_detail(
    pip: &Pip,
    task: &DetailTask,
    log_tx: &UnboundedSender<String>,
) -> DetailUpdate {
    let out = pip.show(&task.name).await;
    let location = if out.ok() {
        parse::parse_location(&out.stdout)
    } else {
        let _ = log_tx.send(format!(
            "detail lookup failed for {}: {}",
            task.name,
            out.failure_reason()
        ));
        None
    };
    let Some(loc) = location else {
        return DetailUpdate {
            generation: task.generation,
            name: task.name.clone(),
            location: DetailSlot::Unknown,
            size: DetailSlot::Unknown,
        };
    };
    let size = {
        let dir = std::path::PathBuf::from(&loc);
        let name = task.name.clone();
        match tokio::task::spawn_blocking(move || crate::util::payload_size(&dir, &name)).await {
            Ok(bytes) => bytes,
            Err(e) => {
                let _ = log_tx.send(format!("size computation failed for {}: {e}", task.name));
                None
            }
        }
    };
    DetailUpdate {
        generation: task.generation,
        name: task.name.clone(),
        location: DetailSlot::Known(loc),
        size: size.map_or(DetailSlot::Unknown, |b| {
            DetailSlot::Known(crate::util::human_size(b))
        }),
    }
}

/// Spawn the environment check worker.
pub fn spawn_env_check(jobs: &JobSenders) {
    let env_tx = jobs.env_tx.clone();
    let log_tx = jobs.log_tx.clone();
    tokio::spawn(async move {
        let _ = log_tx.send("checking pip environment...".to_string());
        let report = check_environment().await;
        if report.status.installed {
            let _ = log_tx.send(format!("detected {}", report.status.version));
        } else {
            let _ = log_tx.send(format!("pip not detected: {}", report.status.last_error));
        }
        let _ = env_tx.send(report);
    });
}

/// Spawn a listing worker for an already-issued generation.
pub fn spawn_listing(pip: &Pip, generation: u64, jobs: &JobSenders) {
    let pip = pip.clone();
    let listing_tx = jobs.listing_tx.clone();
    tokio::spawn(async move {
        let update = run_listing(&pip, generation).await;
        let _ = listing_tx.send(update);
    });
}

/// Spawn a single-package install worker.
pub fn spawn_install(pip: &Pip, name: String, jobs: &JobSenders) {
    let pip = pip.clone();
    let report_tx = jobs.report_tx.clone();
    let log_tx = jobs.log_tx.clone();
    tokio::spawn(async move {
        let _ = log_tx.send(format!("installing {name}..."));
        let out = pip.install(&name).await;
        let report = action_report(ActionKind::Install, &name, &out);
        let _ = log_tx.send(report_line(&report));
        let _ = report_tx.send(report);
    });
}

/// Spawn a sequential batch install worker for the common-pane selection.
///
/// Packages install one after another with a log line each; a single
/// summary report is sent at the end so the UI raises one notice and one
/// refresh for the whole batch.
pub fn spawn_install_batch(pip: &Pip, names: Vec<String>, jobs: &JobSenders) {
    let pip = pip.clone();
    let report_tx = jobs.report_tx.clone();
    let log_tx = jobs.log_tx.clone();
    tokio::spawn(async move {
        let mut failed: Vec<String> = Vec::new();
        for name in &names {
            let _ = log_tx.send(format!("installing {name}..."));
            let out = pip.install(name).await;
            let report = action_report(ActionKind::Install, name, &out);
            let _ = log_tx.send(report_line(&report));
            if !report.ok {
                failed.push(name.clone());
            }
        }
        let summary = if failed.is_empty() {
            ActionReport {
                kind: ActionKind::Install,
                name: names.join(", "),
                ok: true,
                message: format!("installed {} package(s)", names.len()),
            }
        } else {
            ActionReport {
                kind: ActionKind::Install,
                name: failed.join(", "),
                ok: false,
                message: format!("{} of {} package(s) failed to install", failed.len(), names.len()),
            }
        };
        let _ = report_tx.send(summary);
    });
}

/// Spawn an uninstall worker.
pub fn spawn_uninstall(pip: &Pip, name: String, jobs: &JobSenders) {
    let pip = pip.clone();
    let report_tx = jobs.report_tx.clone();
    let log_tx = jobs.log_tx.clone();
    tokio::spawn(async move {
        let _ = log_tx.send(format!("uninstalling {name}..."));
        let out = pip.uninstall(&name).await;
        let report = action_report(ActionKind::Uninstall, &name, &out);
        let _ = log_tx.send(report_line(&report));
        let _ = report_tx.send(report);
    });
}

/// Spawn a worker fetching the full `pip show` text for the details modal.
pub fn spawn_show_details(pip: &Pip, name: String, jobs: &JobSenders) {
    let pip = pip.clone();
    let details_tx = jobs.details_tx.clone();
    let log_tx = jobs.log_tx.clone();
    tokio::spawn(async move {
        let out = pip.show(&name).await;
        let text = if out.ok() && !out.stdout.trim().is_empty() {
            Some(out.stdout)
        } else {
            let _ = log_tx.send(format!(
                "could not fetch details for {name}: {}",
                out.failure_reason()
            ));
            None
        };
        let _ = details_tx.send(DetailsText { name, text });
    });
}

/// Open a package's install directory with the platform file opener.
///
/// The opener is spawned detached; only spawn failures are reported.
pub fn open_directory(name: &str, location: &str, jobs: &JobSenders) {
    #[cfg(target_os = "windows")]
    let mut cmd = {
        let mut c = std::process::Command::new("explorer");
        c.arg(location);
        c
    };
    #[cfg(target_os = "macos")]
    let mut cmd = {
        let mut c = std::process::Command::new("open");
        c.arg(location);
        c
    };
    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    let mut cmd = {
        let mut c = std::process::Command::new("xdg-open");
        c.arg(location);
        c
    };
    match cmd.spawn() {
        Ok(_) => {
            let _ = jobs
                .log_tx
                .send(format!("opened install directory of {name}: {location}"));
        }
        Err(e) => {
            let _ = jobs
                .log_tx
                .send(format!("could not open directory {location}: {e}"));
        }
    }
}

/// Re-run environment detection (startup and the `r` key).
pub fn request_env_check(app: &mut AppState, jobs: &JobSenders) {
    app.env_checking = true;
    spawn_env_check(jobs);
}

/// Issue a listing refresh if pip is available, else raise a notice.
pub fn request_listing(app: &mut AppState, jobs: &JobSenders) {
    let Some(pip) = app.pip.clone() else {
        app.modal = Modal::Alert {
            message: "pip was not detected; press 'r' to re-check the environment".to_string(),
        };
        return;
    };
    let generation = app.issue_listing();
    let _ = jobs
        .log_tx
        .send("refreshing installed package list...".to_string());
    spawn_listing(&pip, generation, jobs);
}

/// Install the package named in the input line.
pub fn request_install_custom(app: &mut AppState, jobs: &JobSenders) {
    let name = app.input.trim().to_string();
    if name.is_empty() {
        app.modal = Modal::Alert {
            message: "enter a package name to install".to_string(),
        };
        return;
    }
    let Some(pip) = app.pip.clone() else {
        app.modal = Modal::Alert {
            message: "pip was not detected; press 'r' to re-check the environment".to_string(),
        };
        return;
    };
    app.input.clear();
    spawn_install(&pip, name, jobs);
}

/// Install every package marked in the common pane.
pub fn request_install_selected(app: &mut AppState, jobs: &JobSenders) {
    let names = app.selected_common();
    if names.is_empty() {
        app.modal = Modal::Alert {
            message: "mark at least one common package to install".to_string(),
        };
        return;
    }
    let Some(pip) = app.pip.clone() else {
        app.modal = Modal::Alert {
            message: "pip was not detected; press 'r' to re-check the environment".to_string(),
        };
        return;
    };
    let _ = jobs
        .log_tx
        .send(format!("installing selected packages: {}", names.join(", ")));
    spawn_install_batch(&pip, names, jobs);
}

/// Uninstall after the confirm modal was accepted.
pub fn request_uninstall(app: &mut AppState, name: String, jobs: &JobSenders) {
    let Some(pip) = app.pip.clone() else {
        app.modal = Modal::Alert {
            message: "pip was not detected; press 'r' to re-check the environment".to_string(),
        };
        return;
    };
    spawn_uninstall(&pip, name, jobs);
}

/// Fetch `pip show` text for the highlighted row.
pub fn request_show_details(app: &mut AppState, jobs: &JobSenders) {
    let Some(row) = app.selected_row() else {
        return;
    };
    let name = row.name.clone();
    let Some(pip) = app.pip.clone() else {
        app.modal = Modal::Alert {
            message: "pip was not detected; press 'r' to re-check the environment".to_string(),
        };
        return;
    };
    spawn_show_details(&pip, name, jobs);
}

/// Open the highlighted row's install directory, if known.
pub fn request_open_directory(app: &mut AppState, jobs: &JobSenders) {
    let Some(row) = app.selected_row() else {
        return;
    };
    let name = row.name.clone();
    let location = row.location.clone();
    match location {
        DetailSlot::Known(loc) => open_directory(&name, &loc, jobs),
        DetailSlot::Pending | DetailSlot::Unknown => {
            app.modal = Modal::Alert {
                message: "install location is not known for this package".to_string(),
            };
        }
    }
}
