use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Layout, Position, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Gauge, List, ListItem, ListState, Paragraph, StatefulWidget, Widget},
};

use crate::{app::App, session::Annotation, timer::Status, util::format_clock};

fn layout(app: &App, area: Rect) -> [Rect; 7] {
    let input_height = if app.editing { 3 } else { 0 };
    Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(1), // clock
        Constraint::Length(1), // status
        Constraint::Length(1), // progress
        Constraint::Length(1),
        Constraint::Min(0), // notes
        Constraint::Length(input_height),
    ])
    .areas(area)
}

fn status_style(status: Status) -> Style {
    let base = Style::default().add_modifier(Modifier::BOLD);
    match status {
        Status::Running => base.fg(Color::Green),
        Status::Paused => base.fg(Color::Yellow),
        Status::Completed => base.fg(Color::Magenta),
        Status::Idle => base,
    }
}

/// Notes as a selectable list, `MM:SS  text` per row
pub(crate) fn render_annotations(
    annotations: &[Annotation],
    selected: Option<usize>,
    title: &str,
    area: Rect,
    buf: &mut Buffer,
) {
    if annotations.is_empty() || area.height == 0 {
        return;
    }
    let items: Vec<ListItem> = annotations
        .iter()
        .map(|a| {
            ListItem::new(Line::from(vec![
                Span::styled(
                    format_clock(a.offset_seconds),
                    Style::default().fg(Color::Cyan),
                ),
                Span::raw("  "),
                Span::raw(a.text.as_str()),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(Block::bordered().title(title.to_string()))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    let mut state = ListState::default().with_selected(selected);
    StatefulWidget::render(list, area, buf, &mut state);
}

/// Bordered single-line text box
pub(crate) fn render_input(value: &str, title: String, area: Rect, buf: &mut Buffer) {
    if area.height == 0 {
        return;
    }
    Paragraph::new(value)
        .block(
            Block::bordered()
                .title(title)
                .border_style(Style::default().fg(Color::Yellow)),
        )
        .render(area, buf);
}

/// Cursor inside a box drawn by `render_input`
pub(crate) fn input_cursor(app: &App, area: Rect) -> Option<Position> {
    if area.height < 3 || area.width < 3 {
        return None;
    }
    let offset = (app.input.cursor_width() as u16).min(area.width - 3);
    Some(Position::new(area.x + 1 + offset, area.y + 1))
}

pub fn render_timer(app: &App, area: Rect, buf: &mut Buffer) {
    let timer = &app.timer;
    let [_, clock, status, progress, _, notes, input] = layout(app, area);

    Paragraph::new(Span::styled(
        format_clock(timer.elapsed_seconds()),
        status_style(timer.status()),
    ))
    .alignment(Alignment::Center)
    .render(clock, buf);

    let mut status_text = timer.status().to_string().to_uppercase();
    if let Some(started) = timer.started_at() {
        status_text.push_str(&format!("  started {}", started.format("%H:%M")));
    }
    Paragraph::new(Span::styled(
        status_text,
        Style::default().add_modifier(Modifier::DIM),
    ))
    .alignment(Alignment::Center)
    .render(status, buf);

    Gauge::default()
        .ratio(timer.progress())
        .label(format!(
            "{} / {}",
            format_clock(timer.elapsed_seconds()),
            format_clock(timer.max_seconds())
        ))
        .gauge_style(Style::default().fg(Color::Magenta))
        .render(progress, buf);

    render_annotations(
        timer.annotations(),
        app.selected_annotation,
        "Notes",
        notes,
        buf,
    );

    if app.editing {
        render_input(
            app.input.value(),
            format!("Note at {}", format_clock(timer.elapsed_seconds())),
            input,
            buf,
        );
    }
}

pub fn cursor(app: &App, area: Rect) -> Option<Position> {
    if !app.editing {
        return None;
    }
    let [.., input] = layout(app, area);
    input_cursor(app, input)
}
