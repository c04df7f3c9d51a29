pub mod history;
pub mod review;
pub mod screen;
pub mod timer;

use std::time::Instant;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Layout, Position, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
    Frame,
};

use crate::{
    app::{App, View},
    timer::Status,
};

const HORIZONTAL_MARGIN: u16 = 2;

/// Render the whole app and place the terminal cursor on the active input.
pub fn draw(app: &App, f: &mut Frame) {
    let area = f.area();
    f.render_widget(app, area);
    if let Some(pos) = cursor_position(app, area) {
        f.set_cursor_position(pos);
    }
}

/// Header, body, notice line and key legend
fn split(area: Rect) -> [Rect; 4] {
    Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .horizontal_margin(HORIZONTAL_MARGIN)
    .areas(area)
}

pub fn cursor_position(app: &App, area: Rect) -> Option<Position> {
    let [_, body, _, _] = split(area);
    screen::current_screen(app.view).cursor(app, body)
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let [header, body, notice, legend] = split(area);
        let flashing = self.flash_remaining(Instant::now()).is_some();

        render_header(self, flashing, header, buf);
        screen::current_screen(self.view).render(self, body, buf);

        if let Some(n) = &self.notice {
            let style = if n.is_error {
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Cyan).add_modifier(Modifier::ITALIC)
            };
            Paragraph::new(Span::styled(n.text.as_str(), style)).render(notice, buf);
        }

        Paragraph::new(Span::styled(
            legend_text(self),
            Style::default()
                .fg(Color::Gray)
                .add_modifier(Modifier::ITALIC),
        ))
        .render(legend, buf);
    }
}

fn render_header(app: &App, flashing: bool, area: Rect, buf: &mut Buffer) {
    let active = Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD);
    let inactive = Style::default().add_modifier(Modifier::DIM);

    let tab = |view: View, label: &'static str| {
        let on = app.view == view || (view == View::Timer && app.view == View::Review);
        Span::styled(label, if on { active } else { inactive })
    };

    let mut line = Line::from(vec![
        Span::styled("stint", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("  "),
        tab(View::Timer, "timer"),
        Span::raw(" · "),
        tab(View::History, "history"),
    ]);
    if flashing {
        line = line.style(
            Style::default()
                .bg(Color::Yellow)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        );
    }
    Paragraph::new(line).alignment(Alignment::Left).render(area, buf);
}

fn legend_text(app: &App) -> &'static str {
    match app.view {
        View::Timer if app.editing => "(enter) add note / (esc) cancel",
        View::Timer => match app.timer.status() {
            Status::Running => {
                "(space) pause / (n)ote / (f)inish / (r)eset / (h)istory / (q)uit"
            }
            Status::Paused => {
                "(space) resume / (n)ote / (f)inish / (r)eset / (h)istory / (q)uit"
            }
            _ => "(space) start / (h)istory / (q)uit",
        },
        View::Review => {
            "(enter) save / (ctrl+d) discard / (↑↓) select note / (del) remove note"
        }
        View::History if app.history.confirm_clear => "(y) delete everything / any key to cancel",
        View::History => "(↑↓) select / (d)elete / (c)lear all / (t)imer / (q)uit",
    }
}
