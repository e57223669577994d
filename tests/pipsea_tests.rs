use pipsea as crate_root;

use crate_root::logic;
use crate_root::parse;
use crate_root::state::{
    ActionKind, AppState, DetailSlot, DetailTask, DetailUpdate, PackageRow,
};

fn pending_rows(names: &[&str]) -> Vec<PackageRow> {
    names
        .iter()
        .map(|n| PackageRow::pending((*n).to_string(), "1.0".to_string()))
        .collect()
}

#[test]
fn listing_displays_case_insensitive_ascending() {
    let raw = r#"[{"name":"Zeta","version":"1.0"}, {"name":"alpha","version":"2.0"}]"#;
    let pkgs = parse::parse_listing(raw).expect("valid listing");
    let names: Vec<&str> = pkgs.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["alpha", "Zeta"]);
}

#[test]
fn location_parse_trims_and_degrades_softly() {
    let with = "Name: foo\nLocation: /usr/lib/foo\nRequires:\n";
    assert_eq!(parse::parse_location(with).as_deref(), Some("/usr/lib/foo"));
    let without = "Name: foo\nVersion: 1.0\n";
    assert_eq!(parse::parse_location(without), None);
}

#[test]
fn detail_result_for_removed_row_is_discarded() {
    let mut app = AppState::default();
    let g1 = app.issue_listing();
    assert!(app.apply_listing(g1, pending_rows(&["requests", "flask"])));

    // Old task's update while its listing is current: applies.
    let live = DetailUpdate {
        generation: g1,
        name: "flask".to_string(),
        location: DetailSlot::Known("/site".to_string()),
        size: DetailSlot::Known("1.0 MB".to_string()),
    };
    assert!(app.apply_detail_update(&live));

    // Full refresh replaces the rows; the pending requests task is now stale.
    let g2 = app.issue_listing();
    assert!(app.apply_listing(g2, pending_rows(&["numpy"])));
    let stale = DetailUpdate {
        generation: g1,
        name: "requests".to_string(),
        location: DetailSlot::Known("/elsewhere".to_string()),
        size: DetailSlot::Known("9.9 MB".to_string()),
    };
    assert!(!app.apply_detail_update(&stale));
    assert_eq!(app.rows.len(), 1);
    assert_eq!(app.rows[0].name, "numpy");
    assert_eq!(app.rows[0].location, DetailSlot::Pending);
}

#[test]
fn failed_install_is_logged_with_the_manager_message() {
    let out = crate_root::pip::CommandResult {
        exit_code: 1,
        stdout: String::new(),
        stderr: "No matching distribution".to_string(),
        timed_out: false,
    };
    let report = logic::action_report(ActionKind::Install, "nosuchpkg", &out);
    assert!(!report.ok);
    let line = logic::report_line(&report);
    assert!(line.contains("No matching distribution"));
    assert!(line.contains("nosuchpkg"));
}

#[tokio::test]
async fn log_channel_preserves_submission_order_per_producer() {
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<String>();

    let tx_a = tx.clone();
    let a = tokio::spawn(async move {
        for i in 0..100u32 {
            tx_a.send(format!("a{i}")).expect("send a");
            tokio::task::yield_now().await;
        }
    });
    let tx_b = tx.clone();
    let b = tokio::spawn(async move {
        for i in 0..100u32 {
            tx_b.send(format!("b{i}")).expect("send b");
            tokio::task::yield_now().await;
        }
    });
    a.await.expect("producer a");
    b.await.expect("producer b");
    drop(tx);

    let mut received = Vec::new();
    while let Some(line) = rx.recv().await {
        received.push(line);
    }
    assert_eq!(received.len(), 200);
    // Each producer's entries arrive in exactly the order they were sent.
    let only = |prefix: char| -> Vec<u32> {
        received
            .iter()
            .filter(|l| l.starts_with(prefix))
            .map(|l| l[1..].parse::<u32>().expect("sequence number"))
            .collect()
    };
    assert_eq!(only('a'), (0..100).collect::<Vec<_>>());
    assert_eq!(only('b'), (0..100).collect::<Vec<_>>());
}

#[tokio::test]
async fn log_channel_is_strict_fifo_for_interleaved_sends() {
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<String>();
    for i in 0..50u32 {
        tx.send(format!("line {i}")).expect("send");
    }
    drop(tx);
    let mut seen = Vec::new();
    while let Some(line) = rx.recv().await {
        seen.push(line);
    }
    let expected: Vec<String> = (0..50).map(|i| format!("line {i}")).collect();
    assert_eq!(seen, expected);
}

#[cfg(unix)]
mod unix {
    use super::*;
    use std::io::Write;
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};

    use pipsea::pip::Pip;
    use pipsea::state::ListingUpdate;

    /// Write a fake pip executable that prints `stdout` for `list` and
    /// exits `code`.
    fn fake_pip(dir: &Path, list_stdout: &str, code: i32) -> PathBuf {
        let path = dir.join("pip");
        let script = format!(
            "#!/bin/sh\nif [ \"$1\" = list ]; then printf '%s' '{list_stdout}'; fi\nexit {code}\n"
        );
        std::fs::File::create(&path)
            .and_then(|mut f| f.write_all(script.as_bytes()))
            .expect("write fake pip");
        let mut perms = std::fs::metadata(&path).expect("stat").permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).expect("chmod");
        path
    }

    #[tokio::test]
    async fn run_listing_loads_sorted_rows_from_json() {
        let dir = tempfile::tempdir().expect("tempdir");
        let pip = Pip::with_program(fake_pip(
            dir.path(),
            r#"[{"name":"Zeta","version":"1.0"},{"name":"alpha","version":"2.0"}]"#,
            0,
        ));
        match logic::run_listing(&pip, 7).await {
            ListingUpdate::Loaded { generation, rows } => {
                assert_eq!(generation, 7);
                let names: Vec<&str> = rows.iter().map(|r| r.name.as_str()).collect();
                assert_eq!(names, vec!["alpha", "Zeta"]);
                assert!(rows.iter().all(|r| r.location == DetailSlot::Pending));
            }
            ListingUpdate::Failed { message } => panic!("unexpected failure: {message}"),
        }
    }

    #[tokio::test]
    async fn run_listing_surfaces_malformed_output_as_failure() {
        let dir = tempfile::tempdir().expect("tempdir");
        let pip = Pip::with_program(fake_pip(dir.path(), "WARNING: broken", 0));
        match logic::run_listing(&pip, 1).await {
            ListingUpdate::Failed { message } => {
                assert!(message.contains("malformed package listing"));
            }
            ListingUpdate::Loaded { .. } => panic!("malformed output must not load"),
        }
    }

    #[tokio::test]
    async fn run_listing_reports_nonzero_exit() {
        let dir = tempfile::tempdir().expect("tempdir");
        let pip = Pip::with_program(fake_pip(dir.path(), "", 2));
        match logic::run_listing(&pip, 1).await {
            ListingUpdate::Failed { message } => {
                assert!(message.contains("could not list installed packages"));
            }
            ListingUpdate::Loaded { .. } => panic!("exit 2 must not load"),
        }
    }

    #[tokio::test]
    async fn detail_worker_processes_tasks_in_order_and_survives_failures() {
        // A pip that cannot even spawn: every lookup degrades to unknown,
        // and the worker must keep draining the queue regardless.
        let pip = Pip::with_program(PathBuf::from("/nonexistent/pip"));
        let (req_tx, req_rx) = tokio::sync::mpsc::unbounded_channel();
        let (res_tx, mut res_rx) = tokio::sync::mpsc::unbounded_channel();
        let (log_tx, _log_rx) = tokio::sync::mpsc::unbounded_channel();
        let worker = tokio::spawn(logic::detail_worker(pip, req_rx, res_tx, log_tx));

        for name in ["one", "two", "three"] {
            req_tx
                .send(DetailTask {
                    generation: 3,
                    name: name.to_string(),
                })
                .expect("enqueue");
        }
        drop(req_tx);

        let mut order = Vec::new();
        while let Some(update) = res_rx.recv().await {
            assert_eq!(update.generation, 3);
            assert_eq!(update.location, DetailSlot::Unknown);
            assert_eq!(update.size, DetailSlot::Unknown);
            order.push(update.name);
        }
        assert_eq!(order, vec!["one", "two", "three"]);
        worker.await.expect("worker exits cleanly");
    }

    #[test]
    fn second_instance_is_refused_while_first_holds_the_lock() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("pipsea.lock");
        let first = pipsea::instance::acquire_at(&path).expect("first acquires");
        assert!(
            pipsea::instance::acquire_at(&path).is_none(),
            "second launch must be refused while the guard is held"
        );
        drop(first);
        assert!(pipsea::instance::acquire_at(&path).is_some());
    }
}
