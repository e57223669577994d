//! Small filesystem and formatting helpers used by the detail worker.

use std::path::{Path, PathBuf};

/// Format a byte count with a 1024 ladder and one decimal, e.g. `1.5 KB`.
pub fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 6] = ["B", "KB", "MB", "GB", "TB", "PB"];
    if bytes == 0 {
        return "0 B".to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 0usize;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

/// Sum the sizes of all regular files under `path`, recursively.
///
/// Unreadable entries are skipped rather than propagated; a partial sum is
/// still a useful display value.
pub fn dir_size(path: &Path) -> u64 {
    let mut total = 0u64;
    let Ok(entries) = std::fs::read_dir(path) else {
        return 0;
    };
    for entry in entries.flatten() {
        let Ok(meta) = entry.metadata() else {
            continue;
        };
        if meta.is_dir() {
            total = total.saturating_add(dir_size(&entry.path()));
        } else if meta.is_file() {
            total = total.saturating_add(meta.len());
        }
    }
    total
}

/// Locate the on-disk payload of an installed package beneath its reported
/// install location.
///
/// Distribution names use `-` where import directories use `_`, so both
/// spellings are probed, as a directory first and then as a single-file
/// `.py` module. Returns `None` when nothing matching exists; callers treat
/// that as an unknown size, never an error.
pub fn package_payload_path(location: &Path, name: &str) -> Option<PathBuf> {
    let import_name = name.to_lowercase().replace('-', "_");
    let candidates = [
        location.join(&import_name),
        location.join(name),
        location.join(format!("{import_name}.py")),
    ];
    candidates.into_iter().find(|p| p.exists())
}

/// Total size in bytes of a package payload: a recursive sum for package
/// directories, the single file size for one-file modules.
pub fn payload_size(location: &Path, name: &str) -> Option<u64> {
    let target = package_payload_path(location, name)?;
    let meta = std::fs::metadata(&target).ok()?;
    if meta.is_dir() {
        Some(dir_size(&target))
    } else {
        Some(meta.len())
    }
}
