use ratatui::{
    buffer::Buffer,
    layout::{Position, Rect},
};

use crate::{
    app::{App, View},
    ui::{history::render_history, review, timer},
};

/// A UI Screen boundary: responsible for rendering the body area and
/// saying where the text cursor belongs, if anywhere
pub trait Screen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer);
    fn cursor(&self, _app: &App, _area: Rect) -> Option<Position> {
        None
    }
}

/// Clock, progress and in-session notes
pub struct TimerScreen;

impl Screen for TimerScreen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer) {
        timer::render_timer(app, area, buf);
    }

    fn cursor(&self, app: &App, area: Rect) -> Option<Position> {
        timer::cursor(app, area)
    }
}

/// Completed session: note entry, save or discard
pub struct ReviewScreen;

impl Screen for ReviewScreen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer) {
        review::render_review(app, area, buf);
    }

    fn cursor(&self, app: &App, area: Rect) -> Option<Position> {
        review::cursor(app, area)
    }
}

/// Journal grouped by day
pub struct HistoryScreen;

impl Screen for HistoryScreen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer) {
        render_history(app, area, buf);
    }
}

/// Helper to construct the appropriate screen for the current view
pub fn current_screen(view: View) -> Box<dyn Screen> {
    match view {
        View::Timer => Box::new(TimerScreen),
        View::Review => Box::new(ReviewScreen),
        View::History => Box::new(HistoryScreen),
    }
}
