use chrono::{Local, TimeZone};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Paragraph, Widget},
};
use std::fmt;

use crate::{
    app::App,
    history::group_by_calendar_day,
    session::StoredSession,
    util::{format_clock, format_day_heading, format_total},
};

/// Journal lines grouped under day headings, plus the index of the line
/// holding the selected session so the caller can scroll to it.
///
/// `sessions` is expected newest first. `selected` indexes the sessions in
/// the order they are drawn, so callers that select by index should hold
/// the list already flattened from its day groups (see `App::refresh_history`).
pub fn history_lines<Tz>(
    sessions: &[StoredSession],
    selected: usize,
    tz: &Tz,
) -> (Vec<Line<'static>>, Option<usize>)
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let mut lines = Vec::new();
    let mut selected_line = None;
    let mut position = 0;

    for group in group_by_calendar_day(sessions, tz) {
        if !lines.is_empty() {
            lines.push(Line::default());
        }
        lines.push(Line::from(vec![
            Span::styled(
                format_day_heading(group.date),
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("  {} total", format_total(group.total_seconds())),
                Style::default().add_modifier(Modifier::DIM),
            ),
        ]));

        for session in &group.sessions {
            let is_selected = position == selected;
            if is_selected {
                selected_line = Some(lines.len());
            }
            lines.push(session_line(session, tz, is_selected));
            for a in &session.annotations {
                lines.push(Line::from(vec![
                    Span::raw("      "),
                    Span::styled(
                        format_clock(a.offset_seconds),
                        Style::default().fg(Color::Cyan),
                    ),
                    Span::raw(format!("  {}", a.text)),
                ]));
            }
            position += 1;
        }
    }

    (lines, selected_line)
}

fn session_line<Tz>(session: &StoredSession, tz: &Tz, selected: bool) -> Line<'static>
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let start = session.started_at.with_timezone(tz).format("%H:%M").to_string();
    let note = if session.note.is_empty() {
        Span::styled("(no note)", Style::default().add_modifier(Modifier::DIM))
    } else {
        Span::raw(session.note.clone())
    };
    let line = Line::from(vec![
        Span::raw(if selected { "> " } else { "  " }),
        Span::raw(format!("{}  ", start)),
        Span::styled(
            format_clock(session.duration_seconds),
            Style::default().fg(Color::Magenta),
        ),
        Span::raw("  "),
        note,
    ]);
    if selected {
        line.style(Style::default().add_modifier(Modifier::REVERSED))
    } else {
        line
    }
}

/// First line to draw so that `selected_line` stays on screen
fn scroll_offset(selected_line: Option<usize>, height: u16) -> u16 {
    match selected_line {
        Some(line) if height > 0 && line >= height as usize => {
            (line + 1 - height as usize) as u16
        }
        _ => 0,
    }
}

pub fn render_history(app: &App, area: Rect, buf: &mut Buffer) {
    let block = Block::bordered().title(format!(" History ({}) ", app.history.sessions.len()));
    let inner = block.inner(area);
    block.render(area, buf);

    if app.history.sessions.is_empty() {
        Paragraph::new(Span::styled(
            "No sessions yet",
            Style::default().add_modifier(Modifier::DIM),
        ))
        .alignment(Alignment::Center)
        .render(inner, buf);
        return;
    }

    let (lines, selected_line) =
        history_lines(&app.history.sessions, app.history.selected, &Local);
    let offset = scroll_offset(selected_line, inner.height);
    Paragraph::new(lines).scroll((offset, 0)).render(inner, buf);
}
