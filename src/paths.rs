//! Filesystem locations used by Pipsea.
//!
//! All directories are resolved from the environment (`$HOME` and the
//! `XDG_*` variables) and created on first use. Nothing here reads or
//! writes configuration; Pipsea keeps no config file.

use std::env;
use std::path::PathBuf;

/// Resolve an XDG base directory from the environment or fall back to
/// `$HOME` joined with `home_default` segments.
fn xdg_base_dir(var: &str, home_default: &[&str]) -> PathBuf {
    if let Ok(p) = env::var(var)
        && !p.trim().is_empty()
    {
        return PathBuf::from(p);
    }
    let home = env::var("HOME").unwrap_or_else(|_| ".".to_string());
    let mut base = PathBuf::from(home);
    for seg in home_default {
        base = base.join(seg);
    }
    base
}

/// Application directory under the user's config base (ensured to exist).
pub fn config_dir() -> PathBuf {
    let base = xdg_base_dir("XDG_CONFIG_HOME", &[".config"]);
    let dir = base.join("pipsea");
    let _ = std::fs::create_dir_all(&dir);
    dir
}

/// Logs directory under the application config directory (ensured to
/// exist). Holds the rolling diagnostic log and the append-only crash log.
pub fn logs_dir() -> PathBuf {
    let dir = config_dir().join("logs");
    let _ = std::fs::create_dir_all(&dir);
    dir
}

/// Runtime directory for the single-instance lock file (ensured to exist).
///
/// Prefers `$XDG_RUNTIME_DIR`; falls back to the system temp directory so
/// the lock lives on a path that does not survive reboots.
pub fn runtime_dir() -> PathBuf {
    let base = if let Ok(p) = env::var("XDG_RUNTIME_DIR")
        && !p.trim().is_empty()
    {
        PathBuf::from(p)
    } else {
        env::temp_dir()
    };
    let dir = base.join("pipsea");
    let _ = std::fs::create_dir_all(&dir);
    dir
}

#[cfg(test)]
mod tests {
    #[test]
    fn config_and_logs_resolve_under_home() {
        let base = std::env::temp_dir().join(format!("pipsea_test_paths_{}", std::process::id()));
        let _ = std::fs::create_dir_all(&base);
        let orig_home = std::env::var_os("HOME");
        let orig_xdg = std::env::var_os("XDG_CONFIG_HOME");
        unsafe {
            std::env::set_var("HOME", base.display().to_string());
            std::env::remove_var("XDG_CONFIG_HOME");
        }
        let cfg = super::config_dir();
        let logs = super::logs_dir();
        assert!(cfg.ends_with("pipsea"));
        assert!(logs.ends_with("logs"));
        assert!(logs.starts_with(&cfg));
        unsafe {
            if let Some(v) = orig_home {
                std::env::set_var("HOME", v);
            } else {
                std::env::remove_var("HOME");
            }
            if let Some(v) = orig_xdg {
                std::env::set_var("XDG_CONFIG_HOME", v);
            }
        }
    }
}
