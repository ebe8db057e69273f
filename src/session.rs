use std::time::SystemTime;

use crate::timer::SessionTimer;

/// One recorded user interaction. Immutable once appended.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionEvent {
    /// Identifier of the item/card/word the action targeted.
    pub subject_id: String,
    pub timestamp: SystemTime,
    pub correct: bool,
    pub selected: String,
    pub expected: String,
    /// Milliseconds since the previous action in the same session.
    pub response_ms: u64,
}

/// Lifecycle of a playthrough, derived purely from the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    NotStarted,
    InProgress,
    Completed,
}

/// The full sequence of [`ActionEvent`]s for one game playthrough.
///
/// Events are appended in strict input order and never reordered; a
/// record is finalized exactly once and discarded on reset. Every
/// derived score must be computable from this data alone.
#[derive(Debug, Clone, Default)]
pub struct SessionRecord {
    pub level: String,
    pub timer: SessionTimer,
    events: Vec<ActionEvent>,
}

impl SessionRecord {
    pub fn new(level: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            timer: SessionTimer::new(),
            events: Vec::new(),
        }
    }

    pub fn begin(&mut self) {
        self.timer.start();
        self.events.clear();
    }

    /// Append an action, stamping it with the current time and the
    /// elapsed milliseconds since the previous action.
    pub fn record(
        &mut self,
        subject_id: impl Into<String>,
        correct: bool,
        selected: impl Into<String>,
        expected: impl Into<String>,
    ) -> &ActionEvent {
        let response_ms = self.timer.mark_action();
        self.record_timed(subject_id, correct, selected, expected, response_ms)
    }

    /// Append an action whose response time was measured externally,
    /// for games that hold responses back until they are locked in.
    pub fn record_timed(
        &mut self,
        subject_id: impl Into<String>,
        correct: bool,
        selected: impl Into<String>,
        expected: impl Into<String>,
        response_ms: u64,
    ) -> &ActionEvent {
        self.events.push(ActionEvent {
            subject_id: subject_id.into(),
            timestamp: SystemTime::now(),
            correct,
            selected: selected.into(),
            expected: expected.into(),
            response_ms,
        });
        self.events.last().expect("event just pushed")
    }

    /// Finalize the record; returns total elapsed milliseconds.
    pub fn finish(&mut self) -> u64 {
        self.timer.stop()
    }

    pub fn phase(&self) -> Phase {
        if self.timer.has_stopped() {
            Phase::Completed
        } else if self.timer.has_started() {
            Phase::InProgress
        } else {
            Phase::NotStarted
        }
    }

    pub fn events(&self) -> &[ActionEvent] {
        &self.events
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn total(&self) -> usize {
        self.events.len()
    }

    pub fn correct_count(&self) -> usize {
        self.events.iter().filter(|e| e.correct).count()
    }

    pub fn incorrect_count(&self) -> usize {
        self.events.iter().filter(|e| !e.correct).count()
    }

    pub fn response_times_ms(&self) -> Vec<f64> {
        self.events.iter().map(|e| e.response_ms as f64).collect()
    }

    pub fn duration_ms(&self) -> u64 {
        self.timer.elapsed_ms()
    }
}
