//! Keyboard handling for Pipsea's TUI.
//!
//! Converts raw `crossterm` key events into mutations on [`AppState`] and
//! background work via [`crate::logic`]. Modal dialogs take precedence over
//! pane bindings; pane focus decides which bindings are active:
//!
//! - Packages: navigate rows, `Enter` details, `o` open directory,
//!   `d`/`Delete` uninstall (confirmed), `l`/`F5` refresh listing, `r`
//!   re-check the environment
//! - Common: navigate, `Space` toggle, `Enter`/`i` install marked packages
//! - Input: edit the custom package name, `Enter` installs it
//!
//! All handling is synchronous; anything long-running is delegated to
//! worker tasks so input stays responsive. Returns `true` when the
//! application should exit.

use crossterm::event::{Event as CEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::logic::{self, JobSenders};
use crate::state::{AppState, Focus, Modal};

/// Dispatch a single input event. Returns `true` to request shutdown.
pub fn handle_event(ev: CEvent, app: &mut AppState, jobs: &JobSenders) -> bool {
    let CEvent::Key(key) = ev else {
        return false;
    };
    if key.kind != KeyEventKind::Press {
        return false;
    }
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return true;
    }
    if !matches!(app.modal, Modal::None) {
        handle_modal_key(key, app, jobs);
        return false;
    }
    match key.code {
        KeyCode::Tab => {
            app.focus = next_focus(app.focus);
            return false;
        }
        KeyCode::BackTab => {
            app.focus = prev_focus(app.focus);
            return false;
        }
        _ => {}
    }
    match app.focus {
        Focus::Packages => handle_packages_key(key, app, jobs),
        Focus::Common => handle_common_key(key, app, jobs),
        Focus::Input => {
            handle_input_key(key, app, jobs);
            false
        }
    }
}

/// Focus order: Packages -> Common -> Input -> Packages.
const fn next_focus(f: Focus) -> Focus {
    match f {
        Focus::Packages => Focus::Common,
        Focus::Common => Focus::Input,
        Focus::Input => Focus::Packages,
    }
}

const fn prev_focus(f: Focus) -> Focus {
    match f {
        Focus::Packages => Focus::Input,
        Focus::Common => Focus::Packages,
        Focus::Input => Focus::Common,
    }
}

/// Keys while a modal is open. Modals never quit the app.
fn handle_modal_key(key: KeyEvent, app: &mut AppState, jobs: &JobSenders) {
    let modal = std::mem::take(&mut app.modal);
    match modal {
        Modal::None => {}
        Modal::Alert { message } => match key.code {
            KeyCode::Enter | KeyCode::Esc => {}
            _ => app.modal = Modal::Alert { message },
        },
        Modal::ConfirmRemove { name } => match key.code {
            KeyCode::Enter | KeyCode::Char('y') => {
                logic::request_uninstall(app, name, jobs);
            }
            KeyCode::Esc | KeyCode::Char('n') => {}
            _ => app.modal = Modal::ConfirmRemove { name },
        },
        Modal::Details { name, text, scroll } => {
            let next_scroll = match key.code {
                KeyCode::Esc | KeyCode::Char('q') | KeyCode::Enter => None,
                KeyCode::Up | KeyCode::Char('k') => Some(scroll.saturating_sub(1)),
                KeyCode::Down | KeyCode::Char('j') => Some(scroll.saturating_add(1)),
                KeyCode::PageUp => Some(scroll.saturating_sub(10)),
                KeyCode::PageDown => Some(scroll.saturating_add(10)),
                _ => Some(scroll),
            };
            if let Some(scroll) = next_scroll {
                app.modal = Modal::Details { name, text, scroll };
            }
        }
    }
}

fn handle_packages_key(key: KeyEvent, app: &mut AppState, jobs: &JobSenders) -> bool {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => return true,
        KeyCode::Up | KeyCode::Char('k') => app.move_selection(-1),
        KeyCode::Down | KeyCode::Char('j') => app.move_selection(1),
        KeyCode::PageUp => app.move_selection(-10),
        KeyCode::PageDown => app.move_selection(10),
        KeyCode::Home => {
            if !app.rows.is_empty() {
                app.table_state.select(Some(0));
            }
        }
        KeyCode::End => {
            if !app.rows.is_empty() {
                app.table_state.select(Some(app.rows.len() - 1));
            }
        }
        KeyCode::Char('r') => logic::request_env_check(app, jobs),
        KeyCode::Char('l') | KeyCode::F(5) => logic::request_listing(app, jobs),
        KeyCode::Enter => logic::request_show_details(app, jobs),
        KeyCode::Char('o') => logic::request_open_directory(app, jobs),
        KeyCode::Delete | KeyCode::Char('d') => {
            if let Some(row) = app.selected_row() {
                app.modal = Modal::ConfirmRemove {
                    name: row.name.clone(),
                };
            }
        }
        _ => {}
    }
    false
}

fn handle_common_key(key: KeyEvent, app: &mut AppState, jobs: &JobSenders) -> bool {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => return true,
        KeyCode::Up | KeyCode::Char('k') => app.move_common(-1),
        KeyCode::Down | KeyCode::Char('j') => app.move_common(1),
        KeyCode::Char(' ') => app.toggle_common(),
        KeyCode::Enter | KeyCode::Char('i') => logic::request_install_selected(app, jobs),
        _ => {}
    }
    false
}

fn handle_input_key(key: KeyEvent, app: &mut AppState, jobs: &JobSenders) {
    match key.code {
        KeyCode::Enter => logic::request_install_custom(app, jobs),
        KeyCode::Backspace => {
            app.input.pop();
        }
        KeyCode::Esc => app.input.clear(),
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.input.push(c);
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEvent, KeyModifiers};

    fn jobs() -> JobSenders {
        let (env_tx, _a) = tokio::sync::mpsc::unbounded_channel();
        let (listing_tx, _b) = tokio::sync::mpsc::unbounded_channel();
        let (detail_req_tx, _c) = tokio::sync::mpsc::unbounded_channel();
        let (report_tx, _d) = tokio::sync::mpsc::unbounded_channel();
        let (details_tx, _e) = tokio::sync::mpsc::unbounded_channel();
        let (log_tx, _f) = tokio::sync::mpsc::unbounded_channel();
        JobSenders {
            env_tx,
            listing_tx,
            detail_req_tx,
            report_tx,
            details_tx,
            log_tx,
        }
    }

    fn press(code: KeyCode) -> CEvent {
        CEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn tab_cycles_focus_through_all_panes() {
        let mut app = AppState::default();
        let jobs = jobs();
        assert_eq!(app.focus, Focus::Packages);
        assert!(!handle_event(press(KeyCode::Tab), &mut app, &jobs));
        assert_eq!(app.focus, Focus::Common);
        assert!(!handle_event(press(KeyCode::Tab), &mut app, &jobs));
        assert_eq!(app.focus, Focus::Input);
        assert!(!handle_event(press(KeyCode::Tab), &mut app, &jobs));
        assert_eq!(app.focus, Focus::Packages);
    }

    #[test]
    fn typing_goes_to_the_input_pane_only() {
        let mut app = AppState::default();
        let jobs = jobs();
        app.focus = Focus::Input;
        for c in ['f', 'l', 'a', 's', 'k'] {
            handle_event(press(KeyCode::Char(c)), &mut app, &jobs);
        }
        assert_eq!(app.input, "flask");
        handle_event(press(KeyCode::Backspace), &mut app, &jobs);
        assert_eq!(app.input, "flas");
        handle_event(press(KeyCode::Esc), &mut app, &jobs);
        assert!(app.input.is_empty());
    }

    #[test]
    fn alert_modal_swallows_keys_until_dismissed() {
        let mut app = AppState::default();
        let jobs = jobs();
        app.modal = Modal::Alert {
            message: "boom".to_string(),
        };
        // 'q' must not quit while the modal is up.
        assert!(!handle_event(press(KeyCode::Char('q')), &mut app, &jobs));
        assert!(matches!(app.modal, Modal::Alert { .. }));
        assert!(!handle_event(press(KeyCode::Enter), &mut app, &jobs));
        assert!(matches!(app.modal, Modal::None));
    }

    #[test]
    fn confirm_remove_cancel_leaves_state_untouched() {
        let mut app = AppState::default();
        let jobs = jobs();
        app.modal = Modal::ConfirmRemove {
            name: "requests".to_string(),
        };
        assert!(!handle_event(press(KeyCode::Char('n')), &mut app, &jobs));
        assert!(matches!(app.modal, Modal::None));
    }

    #[test]
    fn quit_keys_work_from_list_panes() {
        let mut app = AppState::default();
        let jobs = jobs();
        assert!(handle_event(press(KeyCode::Char('q')), &mut app, &jobs));
        app.focus = Focus::Common;
        assert!(handle_event(press(KeyCode::Esc), &mut app, &jobs));
        // Ctrl+C quits regardless of focus.
        app.focus = Focus::Input;
        let ctrl_c = CEvent::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(handle_event(ctrl_c, &mut app, &jobs));
    }
}
