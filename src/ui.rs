//! Rendering for Pipsea's TUI.
//!
//! Pure projection of [`AppState`] onto the frame: an environment header,
//! the installed-packages table, the common-packages pane, the custom
//! install input, the operation log, and modal overlays. Nothing here
//! mutates state beyond the widget selection cursors.

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    prelude::Position,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{
        Block, BorderType, Borders, Cell, Clear, List, ListItem, Paragraph, Row, Table, Wrap,
    },
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::state::{AppState, DetailSlot, Focus, Modal};
use crate::theme::{Theme, theme};

/// Draw one frame.
pub fn ui(f: &mut Frame, app: &mut AppState) {
    let th = theme();
    let area = f.area();

    let bg = Block::default().style(Style::default().bg(th.base));
    f.render_widget(bg, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Min(8),
            Constraint::Length(9),
        ])
        .split(area);

    render_header(f, app, &th, chunks[0]);

    let middle = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(62), Constraint::Percentage(38)])
        .split(chunks[1]);

    render_packages(f, app, &th, middle[0]);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(3)])
        .split(middle[1]);

    render_common(f, app, &th, right[0]);
    render_input(f, app, &th, right[1]);
    render_log(f, app, &th, chunks[2]);
    render_modal(f, app, &th, area);
}

/// Environment status and key hints.
fn render_header(f: &mut Frame, app: &AppState, th: &Theme, area: Rect) {
    let status = if app.env_checking {
        Span::styled("⟳ checking environment...", Style::default().fg(th.yellow))
    } else if app.env.installed {
        Span::styled("✓ pip detected", Style::default().fg(th.green))
    } else {
        Span::styled("✗ pip not available", Style::default().fg(th.red))
    };
    let detail = if app.env.installed {
        Span::styled(app.env.version.clone(), Style::default().fg(th.subtext0))
    } else {
        Span::styled(app.env.last_error.clone(), Style::default().fg(th.subtext0))
    };
    let hints = Line::from(Span::styled(
        "Tab switch pane · l refresh list · Enter details · o open dir · d uninstall · r re-check · q quit",
        Style::default().fg(th.overlay1),
    ));
    let text = vec![Line::from(vec![status, Span::raw("  "), detail]), hints];
    let header = Paragraph::new(text).block(
        Block::default()
            .title(Span::styled(
                "Pipsea",
                Style::default().fg(th.mauve).add_modifier(Modifier::BOLD),
            ))
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(th.surface2)),
    );
    f.render_widget(header, area);
}

/// Installed-packages table.
fn render_packages(f: &mut Frame, app: &mut AppState, th: &Theme, area: Rect) {
    let focused = matches!(app.focus, Focus::Packages);
    // Column budget for the location cell, used to ellipsize by display
    // width rather than bytes.
    let loc_width = (usize::from(area.width.saturating_sub(4)) * 42) / 100;

    let header = Row::new(
        ["Name", "Version", "Size", "Location"]
            .into_iter()
            .map(|h| Cell::from(Span::styled(h, Style::default().fg(th.overlay1)))),
    );

    let rows: Vec<Row> = app
        .rows
        .iter()
        .map(|r| {
            Row::new(vec![
                Cell::from(Span::styled(
                    r.name.clone(),
                    Style::default().fg(th.text).add_modifier(Modifier::BOLD),
                )),
                Cell::from(Span::styled(
                    r.version.clone(),
                    Style::default().fg(th.subtext0),
                )),
                Cell::from(slot_span(&r.size, th)),
                Cell::from(slot_span_fitted(&r.location, th, loc_width)),
            ])
        })
        .collect();

    let title = if app.listing_in_flight {
        format!("Installed packages ({}) — refreshing...", app.rows.len())
    } else {
        format!("Installed packages ({})", app.rows.len())
    };
    let table = Table::new(
        rows,
        [
            Constraint::Percentage(28),
            Constraint::Percentage(14),
            Constraint::Percentage(14),
            Constraint::Percentage(44),
        ],
    )
    .header(header)
    .style(Style::default().fg(th.text).bg(th.base))
    .block(pane_block(&title, focused, th))
    .row_highlight_style(Style::default().fg(th.base).bg(th.lavender))
    .highlight_symbol("> ");

    f.render_stateful_widget(table, area, &mut app.table_state);
}

/// Common-packages toggle list.
fn render_common(f: &mut Frame, app: &mut AppState, th: &Theme, area: Rect) {
    let focused = matches!(app.focus, Focus::Common);
    let items: Vec<ListItem> = app
        .common
        .iter()
        .map(|c| {
            let mark = if c.selected { "[x] " } else { "[ ] " };
            let style = if c.selected {
                Style::default().fg(th.green)
            } else if focused {
                Style::default().fg(th.text)
            } else {
                Style::default().fg(th.subtext0)
            };
            ListItem::new(Line::from(vec![
                Span::styled(mark, style),
                Span::styled(c.name.clone(), style),
            ]))
        })
        .collect();
    let list = List::new(items)
        .style(Style::default().fg(th.text).bg(th.base))
        .block(pane_block(
            "Common packages (Space mark, Enter install)",
            focused,
            th,
        ))
        .highlight_style(Style::default().fg(th.base).bg(th.lavender))
        .highlight_symbol("> ");
    f.render_stateful_widget(list, area, &mut app.common_state);
}

/// Custom install input line.
fn render_input(f: &mut Frame, app: &AppState, th: &Theme, area: Rect) {
    let focused = matches!(app.focus, Focus::Input);
    let line = Line::from(vec![
        Span::styled(
            "> ",
            Style::default().fg(if focused { th.sapphire } else { th.overlay1 }),
        ),
        Span::styled(
            app.input.clone(),
            Style::default().fg(if focused { th.text } else { th.subtext0 }),
        ),
    ]);
    let input = Paragraph::new(line)
        .style(Style::default().bg(th.base))
        .block(pane_block("Install package", focused, th));
    f.render_widget(input, area);
    if focused {
        let right = area.x + area.width.saturating_sub(1);
        let x = area.x + 1 + 2 + app.input.as_str().width() as u16;
        f.set_cursor_position(Position::new(x.min(right), area.y + 1));
    }
}

/// Operation log tail, newest at the bottom.
fn render_log(f: &mut Frame, app: &AppState, th: &Theme, area: Rect) {
    let visible = usize::from(area.height.saturating_sub(2));
    let start = app.log.len().saturating_sub(visible);
    let items: Vec<ListItem> = app.log[start..]
        .iter()
        .map(|l| ListItem::new(Span::styled(l.clone(), Style::default().fg(th.subtext0))))
        .collect();
    let list = List::new(items)
        .style(Style::default().fg(th.subtext0).bg(th.base))
        .block(
            Block::default()
                .title(Span::styled(
                    format!("Log ({})", app.log.len()),
                    Style::default().fg(th.overlay1),
                ))
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(th.surface1)),
        );
    f.render_widget(list, area);
}

/// Modal overlays, drawn last so they sit above everything.
fn render_modal(f: &mut Frame, app: &AppState, th: &Theme, area: Rect) {
    match &app.modal {
        Modal::None => {}
        Modal::Alert { message } => {
            let rect = centered_rect(60, 30, area);
            f.render_widget(Clear, rect);
            let body = Paragraph::new(message.clone())
                .wrap(Wrap { trim: true })
                .style(Style::default().fg(th.text).bg(th.base))
                .block(
                    Block::default()
                        .title(Span::styled("Notice", Style::default().fg(th.yellow)))
                        .borders(Borders::ALL)
                        .border_type(BorderType::Rounded)
                        .border_style(Style::default().fg(th.yellow)),
                );
            f.render_widget(body, rect);
        }
        Modal::ConfirmRemove { name } => {
            let rect = centered_rect(60, 25, area);
            f.render_widget(Clear, rect);
            let lines = vec![
                Line::from(Span::styled(
                    format!("Uninstall {name}?"),
                    Style::default().fg(th.text).add_modifier(Modifier::BOLD),
                )),
                Line::default(),
                Line::from(Span::styled(
                    "Enter/y confirm · Esc/n cancel",
                    Style::default().fg(th.overlay1),
                )),
            ];
            let body = Paragraph::new(lines)
                .wrap(Wrap { trim: true })
                .style(Style::default().fg(th.text).bg(th.base))
                .block(
                    Block::default()
                        .title(Span::styled("Confirm", Style::default().fg(th.red)))
                        .borders(Borders::ALL)
                        .border_type(BorderType::Rounded)
                        .border_style(Style::default().fg(th.red)),
                );
            f.render_widget(body, rect);
        }
        Modal::Details { name, text, scroll } => {
            let rect = centered_rect(70, 70, area);
            f.render_widget(Clear, rect);
            let body = Paragraph::new(text.clone())
                .scroll((*scroll, 0))
                .wrap(Wrap { trim: false })
                .style(Style::default().fg(th.text).bg(th.base))
                .block(
                    Block::default()
                        .title(Span::styled(
                            format!("Details — {name} (j/k scroll, Esc close)"),
                            Style::default().fg(th.sapphire),
                        ))
                        .borders(Borders::ALL)
                        .border_type(BorderType::Rounded)
                        .border_style(Style::default().fg(th.sapphire)),
                );
            f.render_widget(body, rect);
        }
    }
}

/// Bordered pane block with a focus-dependent title and border color.
fn pane_block(title: &str, focused: bool, th: &Theme) -> Block<'static> {
    Block::default()
        .title(Span::styled(
            title.to_string(),
            Style::default().fg(if focused { th.mauve } else { th.overlay1 }),
        ))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(if focused { th.mauve } else { th.surface1 }))
}

/// Style a detail cell, dimming placeholders.
fn slot_span(slot: &DetailSlot, th: &Theme) -> Span<'static> {
    let style = match slot {
        DetailSlot::Pending => Style::default().fg(th.yellow),
        DetailSlot::Unknown => Style::default().fg(th.overlay1),
        DetailSlot::Known(_) => Style::default().fg(th.text),
    };
    Span::styled(slot.label().to_string(), style)
}

/// Like [`slot_span`], ellipsizing known values to `max` display columns.
fn slot_span_fitted(slot: &DetailSlot, th: &Theme, max: usize) -> Span<'static> {
    match slot {
        DetailSlot::Known(v) => {
            Span::styled(fit_width(v, max), Style::default().fg(th.subtext0))
        }
        _ => slot_span(slot, th),
    }
}

/// Truncate `s` to at most `max` display columns, appending `…` when cut.
fn fit_width(s: &str, max: usize) -> String {
    if s.width() <= max || max == 0 {
        return s.to_string();
    }
    let mut out = String::new();
    let budget = max.saturating_sub(1);
    let mut used = 0usize;
    for ch in s.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        out.push(ch);
    }
    out.push('…');
    out
}

/// Rectangle centered in `r` spanning the given percentages.
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let vert = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);
    let horiz = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vert[1]);
    horiz[1]
}

#[cfg(test)]
mod tests {
    use super::fit_width;

    #[test]
    fn fit_width_ellipsizes_long_values() {
        assert_eq!(fit_width("short", 10), "short");
        assert_eq!(fit_width("/usr/lib/python3/dist-packages", 12), "/usr/lib/py…");
        // Zero budget leaves the value alone rather than panicking.
        assert_eq!(fit_width("abc", 0), "abc");
    }
}
