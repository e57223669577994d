//! Core application state for Pipsea's TUI.
//!
//! [`AppState`] is the single source of truth for everything on screen. It
//! is owned and mutated exclusively by the UI-owning loop in `app`;
//! background workers communicate intent through the message types defined
//! here and never touch the state directly. The `apply_*` helpers implement
//! the projection rules, including the stale-update discard that makes
//! overlapping refreshes safe without locking.

use ratatui::widgets::{ListState, TableState};

use crate::pip::Pip;

/// Curated set of frequently installed packages offered in the common pane.
pub const COMMON_PACKAGES: [&str; 10] = [
    "requests",
    "beautifulsoup4",
    "selenium",
    "numpy",
    "pandas",
    "matplotlib",
    "flask",
    "django",
    "pillow",
    "openpyxl",
];

/// A detail cell of a package row.
///
/// Rows are inserted with both detail cells `Pending`; the detail worker
/// later resolves each to `Known` or degrades it to `Unknown`. Lookup
/// failures are always soft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailSlot {
    /// Detail fetch has not completed yet.
    Pending,
    /// Lookup failed or nothing was found on disk.
    Unknown,
    /// Resolved display value.
    Known(String),
}

impl DetailSlot {
    /// Text shown in the table cell.
    pub fn label(&self) -> &str {
        match self {
            Self::Pending => "fetching...",
            Self::Unknown => "unknown",
            Self::Known(v) => v,
        }
    }
}

/// One row of the installed-packages table.
#[derive(Debug, Clone)]
pub struct PackageRow {
    /// Distribution name (unique within one listing).
    pub name: String,
    /// Installed version.
    pub version: String,
    /// Install location from `pip show`.
    pub location: DetailSlot,
    /// Humanized on-disk size.
    pub size: DetailSlot,
}

impl PackageRow {
    /// Fresh row straight from a listing, details still pending.
    pub const fn pending(name: String, version: String) -> Self {
        Self {
            name,
            version,
            location: DetailSlot::Pending,
            size: DetailSlot::Pending,
        }
    }
}

/// Environment detection outcome, recomputed wholesale on each run.
#[derive(Debug, Clone, Default)]
pub struct EnvStatus {
    /// Whether a working pip was found.
    pub installed: bool,
    /// `pip --version` output when installed.
    pub version: String,
    /// Failure detail when detection did not succeed.
    pub last_error: String,
}

/// Environment worker result: the status plus the resolved handle the rest
/// of the app should use for subsequent commands.
#[derive(Debug)]
pub struct EnvReport {
    /// Detection outcome for display.
    pub status: EnvStatus,
    /// Usable pip handle, present only when detection succeeded.
    pub pip: Option<Pip>,
}

/// Work item for the detail queue: resolve location and size of one row.
#[derive(Debug, Clone)]
pub struct DetailTask {
    /// Listing generation the row belongs to.
    pub generation: u64,
    /// Package name to look up.
    pub name: String,
}

/// Detail worker result delivered back to the UI loop.
#[derive(Debug, Clone)]
pub struct DetailUpdate {
    /// Listing generation the originating task was issued for.
    pub generation: u64,
    /// Package name the update targets.
    pub name: String,
    /// Resolved install location.
    pub location: DetailSlot,
    /// Resolved humanized size.
    pub size: DetailSlot,
}

/// Listing worker result.
#[derive(Debug)]
pub enum ListingUpdate {
    /// A listing completed; rows are sorted and detail-pending.
    Loaded {
        /// Generation assigned when the refresh was issued.
        generation: u64,
        /// Replacement rows for the table.
        rows: Vec<PackageRow>,
    },
    /// The listing or its parse failed; the current table is left as-is.
    Failed {
        /// Operator-facing reason.
        message: String,
    },
}

/// Which user action a report concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    /// `pip install`.
    Install,
    /// `pip uninstall`.
    Uninstall,
}

impl ActionKind {
    /// Verb used in log lines and notices.
    pub const fn verb(self) -> &'static str {
        match self {
            Self::Install => "install",
            Self::Uninstall => "uninstall",
        }
    }
}

/// Outcome of a user-initiated install or uninstall.
#[derive(Debug, Clone)]
pub struct ActionReport {
    /// Which operation ran.
    pub kind: ActionKind,
    /// Target package name (or a joined list for batch installs).
    pub name: String,
    /// Whether every command involved exited zero.
    pub ok: bool,
    /// Failure detail or success summary.
    pub message: String,
}

/// `pip show` text fetched for the details modal.
#[derive(Debug, Clone)]
pub struct DetailsText {
    /// Package the text describes.
    pub name: String,
    /// Full `pip show` stdout, `None` when the lookup failed.
    pub text: Option<String>,
}

/// Modal dialog state.
#[derive(Debug, Clone, Default)]
pub enum Modal {
    /// No modal visible.
    #[default]
    None,
    /// Informational alert dismissed with Enter/Esc.
    Alert {
        /// Message body.
        message: String,
    },
    /// Confirmation before uninstalling a package.
    ConfirmRemove {
        /// Package to uninstall on confirm.
        name: String,
    },
    /// Scrollable `pip show` output viewer.
    Details {
        /// Package the text belongs to.
        name: String,
        /// Full text being displayed.
        text: String,
        /// Vertical scroll offset in lines.
        scroll: u16,
    },
}

/// Which pane has keyboard focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    /// Installed packages table.
    Packages,
    /// Common packages toggle list.
    Common,
    /// Custom package input line.
    Input,
}

/// One toggleable entry of the common-packages pane.
#[derive(Debug, Clone)]
pub struct CommonPackage {
    /// Package name offered for install.
    pub name: String,
    /// Whether the entry is currently marked for install.
    pub selected: bool,
}

/// Global application state owned by the UI loop.
#[derive(Debug)]
pub struct AppState {
    /// Resolved pip handle once detection has succeeded.
    pub pip: Option<Pip>,
    /// Latest environment detection outcome.
    pub env: EnvStatus,
    /// Whether a detection run is in flight.
    pub env_checking: bool,

    /// Installed-package rows currently displayed.
    pub rows: Vec<PackageRow>,
    /// Table selection state for the packages pane.
    pub table_state: TableState,
    /// Generation of the most recently *issued* refresh.
    pub latest_listing_gen: u64,
    /// Generation of the listing currently displayed.
    pub current_gen: u64,
    /// Whether a listing refresh is in flight.
    pub listing_in_flight: bool,

    /// Operation log lines, oldest first, displayed in receipt order.
    pub log: Vec<String>,

    /// Custom install input text.
    pub input: String,
    /// Pane focus.
    pub focus: Focus,
    /// Common-packages entries.
    pub common: Vec<CommonPackage>,
    /// List selection state for the common pane.
    pub common_state: ListState,

    /// Active modal, if any.
    pub modal: Modal,
}

impl Default for AppState {
    fn default() -> Self {
        let mut common_state = ListState::default();
        common_state.select(Some(0));
        Self {
            pip: None,
            env: EnvStatus::default(),
            env_checking: false,
            rows: Vec::new(),
            table_state: TableState::default(),
            latest_listing_gen: 0,
            current_gen: 0,
            listing_in_flight: false,
            log: Vec::new(),
            input: String::new(),
            focus: Focus::Packages,
            common: COMMON_PACKAGES
                .iter()
                .map(|name| CommonPackage {
                    name: (*name).to_string(),
                    selected: false,
                })
                .collect(),
            common_state,
            modal: Modal::None,
        }
    }
}

impl AppState {
    /// Allocate the generation for a new refresh and mark it in flight.
    ///
    /// The returned generation travels with the listing worker and with
    /// every detail task spawned from its result.
    pub fn issue_listing(&mut self) -> u64 {
        self.latest_listing_gen += 1;
        self.listing_in_flight = true;
        self.latest_listing_gen
    }

    /// Replace the table with the rows of a completed listing.
    ///
    /// A listing whose generation is not the most recently issued one is
    /// stale (the operator refreshed again meanwhile) and is dropped.
    /// Returns whether the rows were applied.
    pub fn apply_listing(&mut self, generation: u64, rows: Vec<PackageRow>) -> bool {
        if generation != self.latest_listing_gen {
            return false;
        }
        self.rows = rows;
        self.current_gen = generation;
        self.listing_in_flight = false;
        self.table_state
            .select(if self.rows.is_empty() { None } else { Some(0) });
        true
    }

    /// Apply a detail update to its target row.
    ///
    /// Discarded silently when the update's generation is not the displayed
    /// one or the row no longer exists; this is the defined resolution for
    /// a refresh racing an older detail task, not an error. Returns whether
    /// a row was updated.
    pub fn apply_detail_update(&mut self, update: &DetailUpdate) -> bool {
        if update.generation != self.current_gen {
            return false;
        }
        match self.rows.iter_mut().find(|r| r.name == update.name) {
            Some(row) => {
                row.location = update.location.clone();
                row.size = update.size.clone();
                true
            }
            None => false,
        }
    }

    /// Append one line to the operation log.
    pub fn append_log(&mut self, line: String) {
        self.log.push(line);
    }

    /// Row currently highlighted in the packages table.
    pub fn selected_row(&self) -> Option<&PackageRow> {
        self.table_state.selected().and_then(|i| self.rows.get(i))
    }

    /// Move the packages-table selection by `delta`, clamped.
    pub fn move_selection(&mut self, delta: isize) {
        if self.rows.is_empty() {
            self.table_state.select(None);
            return;
        }
        let len = self.rows.len() as isize;
        let cur = self.table_state.selected().unwrap_or(0) as isize;
        let next = (cur + delta).clamp(0, len - 1);
        self.table_state.select(Some(next as usize));
    }

    /// Move the common-pane selection by `delta`, clamped.
    pub fn move_common(&mut self, delta: isize) {
        if self.common.is_empty() {
            return;
        }
        let len = self.common.len() as isize;
        let cur = self.common_state.selected().unwrap_or(0) as isize;
        let next = (cur + delta).clamp(0, len - 1);
        self.common_state.select(Some(next as usize));
    }

    /// Toggle the highlighted common-pane entry.
    pub fn toggle_common(&mut self) {
        if let Some(i) = self.common_state.selected()
            && let Some(entry) = self.common.get_mut(i)
        {
            entry.selected = !entry.selected;
        }
    }

    /// Names currently marked in the common pane, in pane order.
    pub fn selected_common(&self) -> Vec<String> {
        self.common
            .iter()
            .filter(|c| c.selected)
            .map(|c| c.name.clone())
            .collect()
    }
}
