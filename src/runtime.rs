use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CtEvent, KeyEvent};
use tracing::{debug, trace};

/// How often the loop wakes up while no session is ticking
pub const DEFAULT_HEARTBEAT: Duration = Duration::from_millis(250);

/// Everything the timer loop reacts to, in arrival order
#[derive(Clone, Debug)]
pub enum FocusEvent {
    Key(KeyEvent),
    Resize,
    /// One timer second has passed. Only produced while the schedule is armed.
    Tick,
    /// Periodic wake-up for redraws; never advances the timer
    Heartbeat,
}

/// Where key presses and resizes come from. `Tick` and `Heartbeat` are
/// made by the [`Runner`], never by a source.
pub trait FocusEventSource: Send + 'static {
    /// Wait at most `timeout` for the next input event.
    fn recv_timeout(&self, timeout: Duration) -> Result<FocusEvent, RecvTimeoutError>;
}

/// Reads the real terminal on a background thread
pub struct CrosstermEventSource {
    rx: Receiver<FocusEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || {
            while let Ok(ev) = event::read() {
                let Some(ev) = translate(ev) else { continue };
                if tx.send(ev).is_err() {
                    break;
                }
            }
            trace!("terminal reader stopped");
        });

        Self { rx }
    }
}

fn translate(ev: CtEvent) -> Option<FocusEvent> {
    match ev {
        CtEvent::Key(key) => Some(FocusEvent::Key(key)),
        CtEvent::Resize(_, _) => Some(FocusEvent::Resize),
        _ => None,
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl FocusEventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<FocusEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Length of one timer second
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Scripted input fed through a channel, for driving the loop headless
pub struct TestEventSource {
    rx: Receiver<FocusEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<FocusEvent>) -> Self {
        Self { rx }
    }
}

impl FocusEventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<FocusEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Repeating tick deadline.
///
/// Disarmed means no deadline at all: `cancel` takes effect before it
/// returns and a disarmed schedule never reports a due tick.
#[derive(Debug, Clone)]
pub struct TickSchedule {
    interval: Duration,
    next_due: Option<Instant>,
}

impl TickSchedule {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.max(Duration::from_millis(1)),
            next_due: None,
        }
    }

    /// Start ticking one interval from `now`. Arming an armed schedule
    /// keeps the current deadline.
    pub fn arm(&mut self, now: Instant) {
        if self.next_due.is_none() {
            self.next_due = Some(now + self.interval);
        }
    }

    /// Idempotent
    pub fn cancel(&mut self) {
        self.next_due = None;
    }

    pub fn is_armed(&self) -> bool {
        self.next_due.is_some()
    }

    pub fn time_until_due(&self, now: Instant) -> Option<Duration> {
        self.next_due.map(|due| due.saturating_duration_since(now))
    }

    /// Consume one due tick, if any. After a long stall the next deadline
    /// is pushed out from `now` rather than firing a burst of catch-up ticks.
    pub fn fire_if_due(&mut self, now: Instant) -> bool {
        match self.next_due {
            Some(due) if now >= due => {
                let mut next = due + self.interval;
                if next <= now {
                    next = now + self.interval;
                }
                self.next_due = Some(next);
                true
            }
            _ => false,
        }
    }
}

/// Runner that advances the application one event/tick at a time
pub struct Runner<E: FocusEventSource, T: Ticker> {
    event_source: E,
    ticker: T,
    heartbeat: Duration,
    schedule: TickSchedule,
}

impl<E: FocusEventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        let schedule = TickSchedule::new(ticker.interval());
        Self {
            event_source,
            ticker,
            heartbeat: DEFAULT_HEARTBEAT,
            schedule,
        }
    }

    pub fn with_heartbeat(mut self, heartbeat: Duration) -> Self {
        self.heartbeat = heartbeat.max(Duration::from_millis(1));
        self
    }

    pub fn tick_interval(&self) -> Duration {
        self.ticker.interval()
    }

    pub fn start_ticking(&mut self) {
        if !self.schedule.is_armed() {
            debug!(interval_ms = self.ticker.interval().as_millis() as u64, "tick schedule armed");
        }
        self.schedule.arm(Instant::now());
    }

    pub fn stop_ticking(&mut self) {
        if self.schedule.is_armed() {
            debug!("tick schedule cancelled");
        }
        self.schedule.cancel();
    }

    pub fn is_ticking(&self) -> bool {
        self.schedule.is_armed()
    }

    /// Blocks until the next event, the next due tick, or the heartbeat,
    /// whichever comes first.
    pub fn step(&mut self) -> FocusEvent {
        let now = Instant::now();
        if self.schedule.fire_if_due(now) {
            return FocusEvent::Tick;
        }

        let timeout = self
            .schedule
            .time_until_due(now)
            .map_or(self.heartbeat, |d| d.min(self.heartbeat));

        match self.event_source.recv_timeout(timeout) {
            Ok(ev) => ev,
            Err(err) => {
                if let RecvTimeoutError::Disconnected = err {
                    // nothing will ever arrive; behave like a timeout
                    trace!("event source disconnected");
                    std::thread::sleep(timeout);
                }
                if self.schedule.fire_if_due(Instant::now()) {
                    FocusEvent::Tick
                } else {
                    FocusEvent::Heartbeat
                }
            }
        }
    }
}
