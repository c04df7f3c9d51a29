use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Layout, Position, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

use crate::{
    app::App,
    ui::timer::{input_cursor, render_annotations, render_input},
    util::format_clock,
};

fn layout(area: Rect) -> [Rect; 5] {
    Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(1), // summary
        Constraint::Length(1), // started
        Constraint::Min(0),    // notes
        Constraint::Length(3), // note input
    ])
    .areas(area)
}

pub fn render_review(app: &App, area: Rect, buf: &mut Buffer) {
    let timer = &app.timer;
    let [_, summary, started, notes, input] = layout(area);

    Paragraph::new(Line::from(vec![
        Span::raw("Focused for "),
        Span::styled(
            format_clock(timer.elapsed_seconds()),
            Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
        ),
    ]))
    .alignment(Alignment::Center)
    .render(summary, buf);

    if let Some(at) = timer.started_at() {
        Paragraph::new(Span::styled(
            format!("started {}", at.format("%H:%M")),
            Style::default().add_modifier(Modifier::DIM),
        ))
        .alignment(Alignment::Center)
        .render(started, buf);
    }

    render_annotations(
        timer.annotations(),
        app.selected_annotation,
        "Notes taken",
        notes,
        buf,
    );

    render_input(
        app.input.value(),
        "How did it go?".to_string(),
        input,
        buf,
    );
}

pub fn cursor(app: &App, area: Rect) -> Option<Position> {
    let [.., input] = layout(area);
    input_cursor(app, input)
}
