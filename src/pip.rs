//! pip discovery and command execution.
//!
//! Every interaction with the package manager funnels through
//! [`run_command`], which never returns an error: spawn failures, non-zero
//! exits, and timeouts are all encoded in the returned [`CommandResult`] so
//! worker tasks can translate them into log lines and notices without any
//! error path crossing a channel.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

/// Timeout for `pip --version` during environment detection.
pub const VERSION_TIMEOUT: Duration = Duration::from_secs(10);
/// Timeout for a per-package `pip show` lookup.
pub const SHOW_TIMEOUT: Duration = Duration::from_secs(15);
/// Timeout for `pip list`.
pub const LIST_TIMEOUT: Duration = Duration::from_secs(30);
/// Timeout for `pip uninstall`.
pub const UNINSTALL_TIMEOUT: Duration = Duration::from_secs(60);
/// Timeout for `pip install`; installs may compile wheels.
pub const INSTALL_TIMEOUT: Duration = Duration::from_secs(300);

/// Captured outcome of one external command invocation.
#[derive(Debug, Clone, Default)]
pub struct CommandResult {
    /// Process exit code; `-1` when the process could not be spawned or was
    /// killed by a signal.
    pub exit_code: i32,
    /// Captured standard output, lossily decoded.
    pub stdout: String,
    /// Captured standard error, lossily decoded.
    pub stderr: String,
    /// Whether the invocation hit its timeout and the child was killed.
    pub timed_out: bool,
}

impl CommandResult {
    /// Whether the command completed within its timeout and exited zero.
    pub const fn ok(&self) -> bool {
        !self.timed_out && self.exit_code == 0
    }

    /// Human-readable failure reason: stderr if non-empty, else stdout,
    /// else a generic exit/timeout description.
    pub fn failure_reason(&self) -> String {
        if self.timed_out {
            return "command timed out".to_string();
        }
        let err = self.stderr.trim();
        if !err.is_empty() {
            return err.to_string();
        }
        let out = self.stdout.trim();
        if !out.is_empty() {
            return out.to_string();
        }
        format!("exited with code {}", self.exit_code)
    }
}

/// Run `program` with `args`, capturing output, bounded by `timeout`.
///
/// The child is spawned with `kill_on_drop`, so hitting the timeout kills
/// the process rather than leaving it running detached. Must only be
/// awaited from worker tasks; the UI loop never calls this directly.
pub async fn run_command(program: &Path, args: &[&str], timeout: Duration) -> CommandResult {
    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    #[cfg(windows)]
    {
        // CREATE_NO_WINDOW: keep console children from flashing a window.
        cmd.creation_flags(0x0800_0000);
    }
    match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(Ok(out)) => CommandResult {
            exit_code: out.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&out.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&out.stderr).into_owned(),
            timed_out: false,
        },
        Ok(Err(e)) => CommandResult {
            exit_code: -1,
            stdout: String::new(),
            stderr: e.to_string(),
            timed_out: false,
        },
        Err(_) => CommandResult {
            exit_code: -1,
            stdout: String::new(),
            stderr: String::new(),
            timed_out: true,
        },
    }
}

/// Handle to a resolved pip executable.
#[derive(Debug, Clone)]
pub struct Pip {
    program: PathBuf,
}

impl Pip {
    /// Locate a pip executable on `PATH`, preferring `pip` over `pip3`.
    ///
    /// Absence is a normal state (the environment pane reports it), not an
    /// error.
    pub fn detect() -> Option<Self> {
        ["pip", "pip3"]
            .into_iter()
            .find_map(|name| which::which(name).ok())
            .map(Self::with_program)
    }

    /// Build a handle around an explicit executable path.
    pub const fn with_program(program: PathBuf) -> Self {
        Self { program }
    }

    /// Path of the resolved executable.
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// `pip --version`; exit 0 means the environment is usable.
    pub async fn version(&self) -> CommandResult {
        run_command(&self.program, &["--version"], VERSION_TIMEOUT).await
    }

    /// `pip list --format=json`.
    pub async fn list(&self) -> CommandResult {
        run_command(&self.program, &["list", "--format=json"], LIST_TIMEOUT).await
    }

    /// `pip show <name>`.
    pub async fn show(&self, name: &str) -> CommandResult {
        run_command(&self.program, &["show", name], SHOW_TIMEOUT).await
    }

    /// `pip install <name> --no-cache-dir`.
    pub async fn install(&self, name: &str) -> CommandResult {
        run_command(
            &self.program,
            &["install", name, "--no-cache-dir"],
            INSTALL_TIMEOUT,
        )
        .await
    }

    /// `pip uninstall -y <name>`.
    pub async fn uninstall(&self, name: &str) -> CommandResult {
        run_command(&self.program, &["uninstall", "-y", name], UNINSTALL_TIMEOUT).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_reason_prefers_stderr_then_stdout() {
        let r = CommandResult {
            exit_code: 1,
            stdout: "out".into(),
            stderr: "err".into(),
            timed_out: false,
        };
        assert_eq!(r.failure_reason(), "err");
        let r = CommandResult {
            exit_code: 1,
            stdout: "only out\n".into(),
            stderr: "  ".into(),
            timed_out: false,
        };
        assert_eq!(r.failure_reason(), "only out");
        let r = CommandResult {
            exit_code: 7,
            ..CommandResult::default()
        };
        assert_eq!(r.failure_reason(), "exited with code 7");
        let r = CommandResult {
            timed_out: true,
            ..CommandResult::default()
        };
        assert!(!r.ok());
        assert_eq!(r.failure_reason(), "command timed out");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn run_command_reports_exit_code_and_output() {
        let sh = std::path::Path::new("/bin/sh");
        let r = run_command(sh, &["-c", "echo hi; echo oops >&2; exit 3"], LIST_TIMEOUT).await;
        assert!(!r.ok());
        assert_eq!(r.exit_code, 3);
        assert_eq!(r.stdout.trim(), "hi");
        assert_eq!(r.stderr.trim(), "oops");
        assert!(!r.timed_out);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn run_command_times_out_and_kills() {
        let sh = std::path::Path::new("/bin/sh");
        let started = std::time::Instant::now();
        let r = run_command(sh, &["-c", "sleep 5"], Duration::from_millis(100)).await;
        assert!(r.timed_out);
        assert!(!r.ok());
        // The child must be cancelled, not waited to completion.
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[tokio::test]
    async fn run_command_spawn_failure_is_encoded() {
        let r = run_command(
            std::path::Path::new("/definitely/not/a/real/binary"),
            &[],
            VERSION_TIMEOUT,
        )
        .await;
        assert!(!r.ok());
        assert_eq!(r.exit_code, -1);
        assert!(!r.stderr.is_empty());
    }
}
