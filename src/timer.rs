use chrono::{DateTime, Local};
use tracing::{debug, info};

use crate::error::{TimerError, TimerResult};
use crate::session::{Annotation, StoredSession};
use crate::store::SessionStore;

/// One hour
pub const DEFAULT_MAX_SECONDS: u32 = 60 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Status {
    Idle,
    Running,
    Paused,
    /// Stopped and waiting to be committed or discarded
    Completed,
}

/// What a call on [`TimerSession`] actually did.
///
/// The presentation layer keys its side effects (tick schedule, bell,
/// screen changes) off this rather than diffing state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Benign repeat, nothing changed
    Ignored,
    Started,
    Resumed,
    Paused,
    Reset,
    Ticked,
    Completed,
}

impl Transition {
    /// The tick schedule must be armed after this transition
    pub fn starts_ticking(self) -> bool {
        matches!(self, Transition::Started | Transition::Resumed)
    }

    /// The tick schedule must be cancelled after this transition
    pub fn stops_ticking(self) -> bool {
        matches!(
            self,
            Transition::Paused | Transition::Reset | Transition::Completed
        )
    }
}

/// In-memory state of the session being timed.
///
/// Transitions are pure: nothing here touches the terminal, the clock or the
/// tick schedule. `now` is passed in where a timestamp is recorded.
#[derive(Debug, Clone)]
pub struct TimerSession {
    max_seconds: u32,
    elapsed_seconds: u32,
    status: Status,
    started_at: Option<DateTime<Local>>,
    annotations: Vec<Annotation>,
}

impl Default for TimerSession {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SECONDS)
    }
}

impl TimerSession {
    pub fn new(max_seconds: u32) -> Self {
        Self {
            max_seconds: max_seconds.max(1),
            elapsed_seconds: 0,
            status: Status::Idle,
            started_at: None,
            annotations: Vec::new(),
        }
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn elapsed_seconds(&self) -> u32 {
        self.elapsed_seconds
    }

    pub fn max_seconds(&self) -> u32 {
        self.max_seconds
    }

    pub fn started_at(&self) -> Option<DateTime<Local>> {
        self.started_at
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    /// Running or paused: a session exists and has not been completed yet
    pub fn is_active(&self) -> bool {
        matches!(self.status, Status::Running | Status::Paused)
    }

    /// Fraction of the maximum duration used so far, in `0.0..=1.0`
    pub fn progress(&self) -> f64 {
        (self.elapsed_seconds as f64 / self.max_seconds as f64).clamp(0.0, 1.0)
    }

    pub fn start(&mut self, now: DateTime<Local>) -> TimerResult<Transition> {
        match self.status {
            Status::Running => Ok(Transition::Ignored),
            Status::Paused => {
                self.status = Status::Running;
                debug!(elapsed = self.elapsed_seconds, "session resumed");
                Ok(Transition::Resumed)
            }
            Status::Idle => {
                self.started_at = Some(now);
                self.annotations.clear();
                self.status = Status::Running;
                info!(started_at = %now, "session started");
                Ok(Transition::Started)
            }
            Status::Completed => Err(self.rejected("start")),
        }
    }

    pub fn pause(&mut self) -> Transition {
        if self.status != Status::Running {
            return Transition::Ignored;
        }
        self.status = Status::Paused;
        debug!(elapsed = self.elapsed_seconds, "session paused");
        Transition::Paused
    }

    pub fn reset(&mut self) -> Transition {
        self.elapsed_seconds = 0;
        self.started_at = None;
        self.annotations.clear();
        self.status = Status::Idle;
        Transition::Reset
    }

    /// Advance one second. Only meaningful while running; reaching the
    /// maximum completes the session.
    pub fn tick(&mut self) -> Transition {
        if self.status != Status::Running {
            return Transition::Ignored;
        }
        self.elapsed_seconds = (self.elapsed_seconds + 1).min(self.max_seconds);
        if self.elapsed_seconds >= self.max_seconds {
            info!(elapsed = self.elapsed_seconds, "maximum duration reached");
            self.complete()
        } else {
            Transition::Ticked
        }
    }

    /// Manual completion. Needs at least one elapsed second.
    pub fn finish(&mut self) -> TimerResult<Transition> {
        if !self.is_active() || self.elapsed_seconds == 0 {
            return Err(self.rejected("finish"));
        }
        info!(elapsed = self.elapsed_seconds, "session finished manually");
        Ok(self.complete())
    }

    fn complete(&mut self) -> Transition {
        self.status = Status::Completed;
        Transition::Completed
    }

    /// Record a note at the current elapsed offset. Returns false when the
    /// text was blank and nothing was recorded.
    pub fn annotate(&mut self, text: &str) -> TimerResult<bool> {
        if !self.is_active() {
            return Err(self.rejected("annotate"));
        }
        let text = text.trim();
        if text.is_empty() {
            return Ok(false);
        }
        self.annotations
            .push(Annotation::new(self.elapsed_seconds, text));
        Ok(true)
    }

    pub fn remove_annotation(&mut self, index: usize) -> TimerResult<Annotation> {
        if index >= self.annotations.len() {
            return Err(TimerError::OutOfRangeIndex {
                index,
                len: self.annotations.len(),
            });
        }
        Ok(self.annotations.remove(index))
    }

    /// Package the completed session, hand it to `store` and go back to idle.
    ///
    /// If the store rejects the record the session stays completed with all
    /// of its data, so the caller can retry or discard.
    pub fn commit<S: SessionStore + ?Sized>(
        &mut self,
        store: &S,
        note: &str,
        now: DateTime<Local>,
    ) -> TimerResult<String> {
        if self.status != Status::Completed {
            return Err(self.rejected("commit"));
        }
        let started_at = self.started_at.unwrap_or(now);
        let record = StoredSession::new(
            started_at,
            now,
            self.elapsed_seconds,
            note,
            self.annotations.clone(),
        );
        let id = store.insert(record)?;
        info!(%id, duration = self.elapsed_seconds, "session committed");
        self.reset();
        Ok(id)
    }

    pub fn discard(&mut self) -> TimerResult<Transition> {
        if self.status != Status::Completed {
            return Err(self.rejected("discard"));
        }
        debug!(elapsed = self.elapsed_seconds, "session discarded");
        Ok(self.reset())
    }

    fn rejected(&self, action: &'static str) -> TimerError {
        TimerError::InvalidTransition {
            action,
            status: self.status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::MemoryKv;
    use crate::store::KvSessionStore;
    use assert_matches::assert_matches;
    use chrono::TimeZone;

    fn t0() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()
    }

    fn ticks(timer: &mut TimerSession, n: u32) {
        for _ in 0..n {
            timer.tick();
        }
    }

    #[test]
    fn new_timer_is_idle() {
        let timer = TimerSession::default();
        assert_eq!(timer.status(), Status::Idle);
        assert_eq!(timer.elapsed_seconds(), 0);
        assert_eq!(timer.max_seconds(), 3600);
        assert!(timer.started_at().is_none());
        assert!(timer.annotations().is_empty());
    }

    #[test]
    fn start_sets_started_at_once() {
        let mut timer = TimerSession::default();
        assert_eq!(timer.start(t0()).unwrap(), Transition::Started);
        ticks(&mut timer, 3);
        timer.pause();

        let later = t0() + chrono::Duration::minutes(5);
        assert_eq!(timer.start(later).unwrap(), Transition::Resumed);
        assert_eq!(timer.started_at(), Some(t0()));
        assert_eq!(timer.elapsed_seconds(), 3);
    }

    #[test]
    fn double_start_and_double_pause_are_ignored() {
        let mut timer = TimerSession::default();
        timer.start(t0()).unwrap();
        assert_eq!(timer.start(t0()).unwrap(), Transition::Ignored);
        assert_eq!(timer.pause(), Transition::Paused);
        assert_eq!(timer.pause(), Transition::Ignored);
        assert_eq!(timer.status(), Status::Paused);
    }

    #[test]
    fn ticks_only_count_while_running() {
        let mut timer = TimerSession::default();
        assert_eq!(timer.tick(), Transition::Ignored);
        assert_eq!(timer.elapsed_seconds(), 0);

        timer.start(t0()).unwrap();
        ticks(&mut timer, 4);
        timer.pause();
        ticks(&mut timer, 10);
        assert_eq!(timer.elapsed_seconds(), 4);

        timer.start(t0()).unwrap();
        ticks(&mut timer, 2);
        assert_eq!(timer.elapsed_seconds(), 6);
    }

    #[test]
    fn reset_clears_everything_from_any_state() {
        let mut timer = TimerSession::default();
        timer.start(t0()).unwrap();
        ticks(&mut timer, 5);
        timer.annotate("note").unwrap();
        timer.finish().unwrap();

        assert_eq!(timer.reset(), Transition::Reset);
        assert_eq!(timer.status(), Status::Idle);
        assert_eq!(timer.elapsed_seconds(), 0);
        assert!(timer.annotations().is_empty());
        assert!(timer.started_at().is_none());

        // idle reset is harmless too
        timer.reset();
        assert_eq!(timer.status(), Status::Idle);
    }

    #[test]
    fn reaching_max_completes_exactly_once() {
        let mut timer = TimerSession::new(3);
        timer.start(t0()).unwrap();
        assert_eq!(timer.tick(), Transition::Ticked);
        assert_eq!(timer.tick(), Transition::Ticked);
        assert_eq!(timer.tick(), Transition::Completed);
        assert_eq!(timer.status(), Status::Completed);

        assert_eq!(timer.tick(), Transition::Ignored);
        assert_eq!(timer.elapsed_seconds(), 3);
        assert_eq!(timer.progress(), 1.0);
    }

    #[test]
    fn finish_requires_elapsed_time() {
        let mut timer = TimerSession::default();
        assert_matches!(
            timer.finish(),
            Err(TimerError::InvalidTransition { action: "finish", status: Status::Idle })
        );

        timer.start(t0()).unwrap();
        assert_matches!(timer.finish(), Err(TimerError::InvalidTransition { .. }));
        assert_eq!(timer.status(), Status::Running);

        timer.tick();
        timer.pause();
        assert_eq!(timer.finish().unwrap(), Transition::Completed);
    }

    #[test]
    fn annotate_trims_and_ignores_blank_text() {
        let mut timer = TimerSession::default();
        timer.start(t0()).unwrap();
        ticks(&mut timer, 7);

        assert!(!timer.annotate("").unwrap());
        assert!(!timer.annotate("   ").unwrap());
        assert!(timer.annotations().is_empty());

        assert!(timer.annotate("  stretch ").unwrap());
        assert_eq!(timer.annotations(), &[Annotation::new(7, "stretch")]);
    }

    #[test]
    fn annotate_is_rejected_when_idle_or_completed() {
        let mut timer = TimerSession::default();
        assert_matches!(
            timer.annotate("hello"),
            Err(TimerError::InvalidTransition { action: "annotate", .. })
        );

        timer.start(t0()).unwrap();
        timer.tick();
        timer.finish().unwrap();
        assert_matches!(timer.annotate("late"), Err(TimerError::InvalidTransition { .. }));
    }

    #[test]
    fn annotate_while_paused_is_allowed() {
        let mut timer = TimerSession::default();
        timer.start(t0()).unwrap();
        ticks(&mut timer, 2);
        timer.pause();
        timer.annotate("coffee").unwrap();
        assert_eq!(timer.annotations()[0].offset_seconds, 2);
    }

    #[test]
    fn remove_annotation_checks_bounds() {
        let mut timer = TimerSession::default();
        timer.start(t0()).unwrap();
        timer.annotate("a").unwrap();
        timer.annotate("b").unwrap();

        assert_matches!(
            timer.remove_annotation(2),
            Err(TimerError::OutOfRangeIndex { index: 2, len: 2 })
        );
        let removed = timer.remove_annotation(0).unwrap();
        assert_eq!(removed.text, "a");
        assert_eq!(timer.annotations().len(), 1);
        assert_eq!(timer.annotations()[0].text, "b");
    }

    #[test]
    fn start_from_idle_clears_stale_annotations() {
        let mut timer = TimerSession::default();
        timer.start(t0()).unwrap();
        timer.annotate("old").unwrap();
        timer.tick();
        timer.finish().unwrap();
        timer.discard().unwrap();

        timer.start(t0()).unwrap();
        assert!(timer.annotations().is_empty());
    }

    #[test]
    fn commit_scenario_records_duration_note_and_logs() {
        let store = KvSessionStore::new(MemoryKv::new());
        let mut timer = TimerSession::default();

        timer.start(t0()).unwrap();
        ticks(&mut timer, 5);
        timer.annotate("check email").unwrap();
        ticks(&mut timer, 5);
        timer.finish().unwrap();

        let end = t0() + chrono::Duration::seconds(10);
        let id = timer.commit(&store, "focused well", end).unwrap();

        assert_eq!(timer.status(), Status::Idle);
        assert_eq!(timer.elapsed_seconds(), 0);

        let all = store.list_all().unwrap();
        assert_eq!(all.len(), 1);
        let saved = &all[0];
        assert_eq!(saved.id, id);
        assert_eq!(saved.duration_seconds, 10);
        assert_eq!(saved.note, "focused well");
        assert_eq!(saved.annotations, vec![Annotation::new(5, "check email")]);
        assert_eq!(saved.started_at, t0().fixed_offset());
        assert_eq!(saved.ended_at, end.fixed_offset());
    }

    #[test]
    fn commit_failure_keeps_completed_session() {
        let store = KvSessionStore::new(MemoryKv::with_quota(8));
        let mut timer = TimerSession::default();
        timer.start(t0()).unwrap();
        ticks(&mut timer, 3);
        timer.annotate("keep me").unwrap();
        timer.finish().unwrap();

        let err = timer.commit(&store, "note", t0()).unwrap_err();
        assert_matches!(err, TimerError::Store(ref e) if e.is_storage_failure());
        assert_eq!(timer.status(), Status::Completed);
        assert_eq!(timer.elapsed_seconds(), 3);
        assert_eq!(timer.annotations().len(), 1);
    }

    #[test]
    fn commit_and_discard_need_a_completed_session() {
        let store = KvSessionStore::new(MemoryKv::new());
        let mut timer = TimerSession::default();
        timer.start(t0()).unwrap();
        assert_matches!(
            timer.commit(&store, "", t0()),
            Err(TimerError::InvalidTransition { action: "commit", .. })
        );
        assert_matches!(timer.discard(), Err(TimerError::InvalidTransition { .. }));
        assert!(store.list_all().unwrap().is_empty());
    }

    #[test]
    fn discard_returns_to_idle_without_saving() {
        let store = KvSessionStore::new(MemoryKv::new());
        let mut timer = TimerSession::default();
        timer.start(t0()).unwrap();
        ticks(&mut timer, 2);
        timer.finish().unwrap();
        assert_eq!(timer.discard().unwrap(), Transition::Reset);
        assert_eq!(timer.status(), Status::Idle);
        assert!(store.list_all().unwrap().is_empty());
    }

    #[test]
    fn start_after_completion_is_rejected() {
        let mut timer = TimerSession::new(1);
        timer.start(t0()).unwrap();
        timer.tick();
        assert_matches!(timer.start(t0()), Err(TimerError::InvalidTransition { .. }));
    }

    #[test]
    fn transition_tick_schedule_hints() {
        assert!(Transition::Started.starts_ticking());
        assert!(Transition::Resumed.starts_ticking());
        assert!(!Transition::Ignored.starts_ticking());
        assert!(Transition::Paused.stops_ticking());
        assert!(Transition::Reset.stops_ticking());
        assert!(Transition::Completed.stops_ticking());
        assert!(!Transition::Ticked.stops_ticking());
    }
}
