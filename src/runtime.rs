//! Event plumbing for the game loop. A reader thread turns crossterm
//! input into [`AppEvent`]s; [`Runner`] paces the loop and emits clock
//! ticks that carry measured wall time, so the solver countdown and
//! the memory flip-back stay accurate when drawing or input handling
//! runs long.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CtEvent, KeyEvent};

/// What one pass of the game loop reacts to.
#[derive(Clone, Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Resize,
    /// No input arrived for a full tick interval. Carries the wall
    /// time since the previous tick; timed game state advances by it.
    Tick(Duration),
}

/// Source of terminal events (keyboard, resize, etc.)
pub trait EventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError>;
}

/// Production event source using crossterm
pub struct CrosstermEventSource {
    rx: Receiver<AppEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            match event::read() {
                Ok(CtEvent::Key(key)) => {
                    if tx.send(AppEvent::Key(key)).is_err() {
                        break;
                    }
                }
                Ok(CtEvent::Resize(_, _)) => {
                    if tx.send(AppEvent::Resize).is_err() {
                        break;
                    }
                }
                Ok(_) => {}
                Err(_) => break,
            }
        });

        Self { rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Test event source fed from an mpsc channel; draining the channel
/// makes the runner fall through to its tick path.
pub struct TestEventSource {
    rx: Receiver<AppEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<AppEvent>) -> Self {
        Self { rx }
    }
}

impl EventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Advances the application one event or tick at a time, keeping the
/// game clock honest: input bursts delay the tick, and the elapsed
/// time the tick reports grows to match.
pub struct Runner<E: EventSource> {
    source: E,
    tick_every: Duration,
    last_tick: Instant,
}

impl<E: EventSource> Runner<E> {
    pub fn new(source: E, tick_every: Duration) -> Self {
        Self {
            source,
            tick_every,
            last_tick: Instant::now(),
        }
    }

    /// The next input event, or a measured tick once the interval
    /// passes without input.
    pub fn step(&mut self) -> AppEvent {
        match self.source.recv_timeout(self.tick_every) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                let now = Instant::now();
                let elapsed = now.duration_since(self.last_tick);
                self.last_tick = now;
                AppEvent::Tick(elapsed)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn step_ticks_with_measured_elapsed_on_timeout() {
        let (_tx, rx) = mpsc::channel();
        let mut runner = Runner::new(TestEventSource::new(rx), Duration::from_millis(5));

        match runner.step() {
            AppEvent::Tick(elapsed) => assert!(elapsed >= Duration::from_millis(5)),
            other => panic!("expected Tick, got {other:?}"),
        }
    }

    #[test]
    fn step_passes_events_through_ahead_of_ticks() {
        let (tx, rx) = mpsc::channel();
        tx.send(AppEvent::Resize).unwrap();
        let mut runner = Runner::new(TestEventSource::new(rx), Duration::from_millis(10));

        assert!(matches!(runner.step(), AppEvent::Resize));
        assert!(matches!(runner.step(), AppEvent::Tick(_)));
    }

    #[test]
    fn tick_elapsed_covers_time_spent_on_input() {
        // Input handled between ticks must still be counted by the
        // next tick, or the game clock would drift.
        let (tx, rx) = mpsc::channel();
        tx.send(AppEvent::Resize).unwrap();
        let mut runner = Runner::new(TestEventSource::new(rx), Duration::from_millis(2));

        let started = Instant::now();
        assert!(matches!(runner.step(), AppEvent::Resize));
        std::thread::sleep(Duration::from_millis(10));
        match runner.step() {
            AppEvent::Tick(elapsed) => assert!(elapsed >= started.elapsed() - Duration::from_millis(2)),
            other => panic!("expected Tick, got {other:?}"),
        }
    }

    #[test]
    fn scripted_ticks_keep_their_duration() {
        let (tx, rx) = mpsc::channel();
        tx.send(AppEvent::Tick(Duration::from_secs(31))).unwrap();
        let mut runner = Runner::new(TestEventSource::new(rx), Duration::from_millis(10));

        match runner.step() {
            AppEvent::Tick(elapsed) => assert_eq!(elapsed, Duration::from_secs(31)),
            other => panic!("expected Tick, got {other:?}"),
        }
    }
}
