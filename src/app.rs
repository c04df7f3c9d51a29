use chrono::{DateTime, Local};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::time::{Duration, Instant};
use tracing::{debug, error};

use crate::config::Config;
use crate::error::{StoreError, TimerError};
use crate::history::group_by_calendar_day;
use crate::input::TextInput;
use crate::runtime::FocusEvent;
use crate::session::StoredSession;
use crate::store::SessionStore;
use crate::timer::{Status, TimerSession, Transition};

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum View {
    Timer,
    /// Completed session awaiting save or discard
    Review,
    History,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub text: String,
    pub is_error: bool,
}

impl Notice {
    fn info(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: false,
        }
    }

    fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: true,
        }
    }
}

/// Journal as shown on the history screen: newest first, then grouped by
/// calendar day, so `selected` indexes exactly the rows on screen
#[derive(Debug, Default)]
pub struct HistoryState {
    pub sessions: Vec<StoredSession>,
    pub selected: usize,
    pub confirm_clear: bool,
}

impl HistoryState {
    pub fn selected_session(&self) -> Option<&StoredSession> {
        self.sessions.get(self.selected)
    }

    fn select_next(&mut self) {
        if self.selected + 1 < self.sessions.len() {
            self.selected += 1;
        }
    }

    fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }
}

pub struct App {
    pub timer: TimerSession,
    pub store: Box<dyn SessionStore>,
    pub config: Config,
    pub view: View,
    /// Annotation text on the timer screen, note text on the review screen
    pub input: TextInput,
    /// Timer screen has the annotation box focused
    pub editing: bool,
    pub selected_annotation: Option<usize>,
    pub history: HistoryState,
    pub notice: Option<Notice>,
    pub flash_until: Option<Instant>,
    pub should_quit: bool,
    bell_pending: bool,
}

impl App {
    pub fn new(config: Config, store: Box<dyn SessionStore>) -> Self {
        Self {
            timer: TimerSession::new(config.max_seconds()),
            store,
            config,
            view: View::Timer,
            input: TextInput::new(),
            editing: false,
            selected_annotation: None,
            history: HistoryState::default(),
            notice: None,
            flash_until: None,
            should_quit: false,
            bell_pending: false,
        }
    }

    pub fn is_flashing(&self) -> bool {
        self.flash_until.is_some()
    }

    /// True once per completion; the caller rings the bell.
    pub fn take_bell(&mut self) -> bool {
        std::mem::take(&mut self.bell_pending)
    }

    /// Feed one runtime event. The returned transition tells the caller
    /// whether to arm or cancel the tick schedule.
    pub fn handle_event(&mut self, event: FocusEvent, now: DateTime<Local>) -> Transition {
        match event {
            FocusEvent::Tick => self.on_tick(),
            FocusEvent::Heartbeat => {
                self.expire_flash(Instant::now());
                Transition::Ignored
            }
            FocusEvent::Resize => Transition::Ignored,
            FocusEvent::Key(key) => self.on_key(key, now),
        }
    }

    pub fn on_tick(&mut self) -> Transition {
        let transition = self.timer.tick();
        if transition == Transition::Completed {
            self.enter_review();
        }
        transition
    }

    pub fn expire_flash(&mut self, now: Instant) {
        if self.flash_until.is_some_and(|until| now >= until) {
            self.flash_until = None;
        }
    }

    fn enter_review(&mut self) {
        self.view = View::Review;
        self.editing = false;
        self.input.clear();
        self.selected_annotation = None;
        self.history.confirm_clear = false;
        self.flash_until = Some(Instant::now() + self.config.flash_duration());
        self.bell_pending = self.config.bell;
        self.notice = Some(Notice::info("Session complete"));
    }

    fn back_to_timer(&mut self) {
        self.view = View::Timer;
        self.editing = false;
        self.input.clear();
        self.selected_annotation = None;
        self.flash_until = None;
    }

    pub fn on_key(&mut self, key: KeyEvent, now: DateTime<Local>) -> Transition {
        if key.kind == KeyEventKind::Release {
            return Transition::Ignored;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return Transition::Ignored;
        }
        match self.view {
            View::Timer if self.editing => self.on_annotation_key(key),
            View::Timer => self.on_timer_key(key, now),
            View::Review => self.on_review_key(key, now),
            View::History => self.on_history_key(key),
        }
    }

    fn on_timer_key(&mut self, key: KeyEvent, now: DateTime<Local>) -> Transition {
        match key.code {
            KeyCode::Char(' ') | KeyCode::Char('s') => {
                if self.timer.status() == Status::Running {
                    self.timer.pause()
                } else {
                    self.start(now)
                }
            }
            KeyCode::Char('p') => self.timer.pause(),
            KeyCode::Char('r') => {
                self.selected_annotation = None;
                self.timer.reset()
            }
            KeyCode::Char('f') => match self.timer.finish() {
                Ok(transition) => {
                    self.enter_review();
                    transition
                }
                Err(err) => self.report(err),
            },
            KeyCode::Char('n') | KeyCode::Char('a') => {
                if self.timer.is_active() {
                    self.editing = true;
                    self.input.clear();
                } else {
                    self.notice = Some(Notice::info("Start a session to take notes"));
                }
                Transition::Ignored
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.move_annotation_selection(-1);
                Transition::Ignored
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.move_annotation_selection(1);
                Transition::Ignored
            }
            KeyCode::Char('x') | KeyCode::Delete => {
                self.remove_selected_annotation();
                Transition::Ignored
            }
            KeyCode::Tab | KeyCode::Char('h') => {
                self.show_history();
                Transition::Ignored
            }
            KeyCode::Char('q') | KeyCode::Esc => {
                self.should_quit = true;
                Transition::Ignored
            }
            _ => Transition::Ignored,
        }
    }

    fn start(&mut self, now: DateTime<Local>) -> Transition {
        match self.timer.start(now) {
            Ok(transition) => transition,
            Err(err) => self.report(err),
        }
    }

    fn on_annotation_key(&mut self, key: KeyEvent) -> Transition {
        match key.code {
            KeyCode::Enter => {
                let text = self.input.take();
                if let Err(err) = self.timer.annotate(&text) {
                    self.report(err);
                }
                self.editing = false;
            }
            KeyCode::Esc => {
                self.input.clear();
                self.editing = false;
            }
            _ => {
                self.input.handle_key(key);
            }
        }
        Transition::Ignored
    }

    fn on_review_key(&mut self, key: KeyEvent, now: DateTime<Local>) -> Transition {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Enter => self.commit(now),
            KeyCode::Char('d') if ctrl => match self.timer.discard() {
                Ok(transition) => {
                    self.back_to_timer();
                    self.notice = Some(Notice::info("Session discarded"));
                    transition
                }
                Err(err) => self.report(err),
            },
            KeyCode::Up => {
                self.move_annotation_selection(-1);
                Transition::Ignored
            }
            KeyCode::Down => {
                self.move_annotation_selection(1);
                Transition::Ignored
            }
            KeyCode::Delete if self.selected_annotation.is_some() => {
                self.remove_selected_annotation();
                Transition::Ignored
            }
            _ => {
                self.input.handle_key(key);
                Transition::Ignored
            }
        }
    }

    fn commit(&mut self, now: DateTime<Local>) -> Transition {
        let note = self.input.value().to_string();
        match self.timer.commit(self.store.as_ref(), &note, now) {
            Ok(_id) => {
                self.back_to_timer();
                self.notice = Some(Notice::info("Session saved"));
                Transition::Reset
            }
            Err(err) => self.report(err),
        }
    }

    fn on_history_key(&mut self, key: KeyEvent) -> Transition {
        if self.history.confirm_clear {
            self.history.confirm_clear = false;
            if key.code == KeyCode::Char('y') {
                match self.store.clear_all() {
                    Ok(()) => self.notice = Some(Notice::info("History cleared")),
                    Err(err) => {
                        self.report_store(err);
                    }
                }
                self.refresh_history();
            } else {
                self.notice = None;
            }
            return Transition::Ignored;
        }

        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.history.select_prev(),
            KeyCode::Down | KeyCode::Char('j') => self.history.select_next(),
            KeyCode::Char('d') | KeyCode::Delete => self.delete_selected_session(),
            KeyCode::Char('c') if !self.history.sessions.is_empty() => {
                self.history.confirm_clear = true;
                self.notice = Some(Notice::info("Delete every session? (y/n)"));
            }
            KeyCode::Tab | KeyCode::Char('t') | KeyCode::Esc => {
                self.view = View::Timer;
            }
            KeyCode::Char('q') => self.should_quit = true,
            _ => {}
        }
        Transition::Ignored
    }

    pub fn show_history(&mut self) {
        self.view = View::History;
        self.history.confirm_clear = false;
        self.refresh_history();
    }

    /// Reload the journal. An unreadable journal shows as empty with the
    /// error in the status line.
    pub fn refresh_history(&mut self) {
        match self.store.list_all() {
            Ok(mut sessions) => {
                sessions.reverse();
                self.history.sessions = group_by_calendar_day(&sessions, &Local)
                    .into_iter()
                    .flat_map(|day| day.sessions)
                    .collect();
            }
            Err(err) => {
                self.history.sessions.clear();
                self.report_store(err);
            }
        }
        let len = self.history.sessions.len();
        self.history.selected = self.history.selected.min(len.saturating_sub(1));
    }

    fn delete_selected_session(&mut self) {
        let Some(id) = self.history.selected_session().map(|s| s.id.clone()) else {
            return;
        };
        match self.store.delete_by_id(&id) {
            Ok(_) => self.notice = Some(Notice::info("Session deleted")),
            Err(err) => self.report_store(err),
        }
        self.refresh_history();
    }

    fn move_annotation_selection(&mut self, delta: i32) {
        let len = self.timer.annotations().len();
        if len == 0 {
            self.selected_annotation = None;
            return;
        }
        let next = match self.selected_annotation {
            None if delta < 0 => len - 1,
            None => 0,
            Some(i) if delta < 0 => i.saturating_sub(1),
            Some(i) => (i + 1).min(len - 1),
        };
        self.selected_annotation = Some(next);
    }

    fn remove_selected_annotation(&mut self) {
        let Some(index) = self.selected_annotation else {
            return;
        };
        match self.timer.remove_annotation(index) {
            Ok(_) => {
                let len = self.timer.annotations().len();
                self.selected_annotation = if len == 0 {
                    None
                } else {
                    Some(index.min(len - 1))
                };
            }
            Err(err) => {
                self.selected_annotation = None;
                self.report(err);
            }
        }
    }

    fn report(&mut self, err: TimerError) -> Transition {
        match err {
            TimerError::Store(store_err) => self.report_store(store_err),
            other => {
                debug!(error = %other, "rejected timer action");
                self.notice = Some(Notice::info(other.to_string()));
            }
        }
        Transition::Ignored
    }

    fn report_store(&mut self, err: StoreError) {
        error!(error = %err, "session store failure");
        self.notice = Some(Notice::error(err.to_string()));
    }

    /// Flash cue remaining, for rendering
    pub fn flash_remaining(&self, now: Instant) -> Option<Duration> {
        self.flash_until
            .map(|until| until.saturating_duration_since(now))
            .filter(|d| !d.is_zero())
    }
}
