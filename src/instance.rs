//! Single-instance guard.
//!
//! Exactly one Pipsea process may run per machine session. The guard is
//! acquired at startup, before the terminal is touched or any command is
//! spawned, and held for the lifetime of the process; the operating system
//! releases it on exit, including abnormal exit.
//!
//! Two outcomes matter: the lock was acquired (proceed), or another process
//! already holds it (report and quit). Any other OS failure fails *open* —
//! the app proceeds as if no other instance existed — but is logged with a
//! warning so a broken runtime directory does not silently mask real
//! contention. On Windows the guard is a named kernel mutex; elsewhere it
//! is an advisory `flock` on a lock file carrying the holder PID for
//! diagnostics.

/// Held lock keeping this process the single instance.
///
/// Dropping the guard (normally at process exit) releases the underlying
/// OS object. On the fail-open paths the guard is inert.
pub struct InstanceGuard {
    #[cfg(unix)]
    _lock: Option<nix::fcntl::Flock<std::fs::File>>,
    #[cfg(windows)]
    _handle: usize,
}

/// Try to become the single running instance.
///
/// Returns `None` when another process already holds the guard; the caller
/// must report and terminate without initializing anything else.
pub fn acquire() -> Option<InstanceGuard> {
    imp::acquire()
}

/// Acquire the guard on an explicit lock-file path (Unix only); the
/// same contract as [`acquire`] against a caller-chosen file.
#[cfg(unix)]
pub use imp::acquire_at;

#[cfg(unix)]
mod imp {
    use std::io::Write;

    use nix::errno::Errno;
    use nix::fcntl::{Flock, FlockArg};

    use super::InstanceGuard;

    /// Lock file name under the runtime directory.
    const LOCK_FILE_NAME: &str = "pipsea.lock";

    pub fn acquire() -> Option<InstanceGuard> {
        acquire_at(&crate::paths::runtime_dir().join(LOCK_FILE_NAME))
    }

    /// Acquire the guard on an explicit lock-file path; split out so tests
    /// can exercise the contract without touching the real runtime dir.
    pub fn acquire_at(path: &std::path::Path) -> Option<InstanceGuard> {
        let file = match std::fs::OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(path)
        {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!(error = %e, path = %path.display(),
                    "could not open instance lock file; continuing unguarded");
                return Some(InstanceGuard { _lock: None });
            }
        };
        match Flock::lock(file, FlockArg::LockExclusiveNonblock) {
            Ok(lock) => {
                // Best-effort PID breadcrumb for the operator; the flock is
                // the authority, not this content.
                let _ = lock.set_len(0);
                let mut writer: &std::fs::File = &lock;
                let _ = write!(writer, "{}", std::process::id());
                Some(InstanceGuard { _lock: Some(lock) })
            }
            Err((_, Errno::EWOULDBLOCK)) => None,
            Err((_, errno)) => {
                tracing::warn!(error = %errno, path = %path.display(),
                    "instance lock failed for an unexpected reason; continuing unguarded");
                Some(InstanceGuard { _lock: None })
            }
        }
    }

}

#[cfg(windows)]
mod imp {
    use windows_sys::Win32::Foundation::{ERROR_ALREADY_EXISTS, GetLastError};
    use windows_sys::Win32::System::Threading::CreateMutexW;

    use super::InstanceGuard;

    /// Global (session-wide) mutex name.
    const MUTEX_NAME: &str = "Global\\PipseaSingleInstance";

    pub fn acquire() -> Option<InstanceGuard> {
        let wide: Vec<u16> = MUTEX_NAME.encode_utf16().chain(std::iter::once(0)).collect();
        // The handle is intentionally never closed: the mutex must live
        // exactly as long as the process, and the kernel reclaims it then.
        let handle = unsafe { CreateMutexW(std::ptr::null(), 0, wide.as_ptr()) };
        let last_error = unsafe { GetLastError() };
        if last_error == ERROR_ALREADY_EXISTS {
            return None;
        }
        if handle.is_null() {
            tracing::warn!(
                error = last_error,
                "could not create instance mutex; continuing unguarded"
            );
        }
        Some(InstanceGuard {
            _handle: handle as usize,
        })
    }
}
