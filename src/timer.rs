use std::time::SystemTime;

/// Wall-clock bookkeeping for a game session: one start mark, one end
/// mark, and a rolling per-action mark used to measure reaction times.
#[derive(Debug, Clone, Default)]
pub struct SessionTimer {
    pub started_at: Option<SystemTime>,
    pub ended_at: Option<SystemTime>,
    last_mark: Option<SystemTime>,
}

/// Milliseconds between two timestamps, 0 if `end` precedes `start`.
pub fn time_diff_ms(start: SystemTime, end: SystemTime) -> u64 {
    end.duration_since(start).unwrap_or_default().as_millis() as u64
}

impl SessionTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self) {
        self.started_at = Some(SystemTime::now());
        self.ended_at = None;
        self.last_mark = None;
    }

    /// Record an action and return the elapsed milliseconds since the
    /// previous mark. The first mark of a session returns 0 (there is
    /// nothing to measure against, matching the recorded data model).
    pub fn mark_action(&mut self) -> u64 {
        let now = SystemTime::now();
        let elapsed = match self.last_mark {
            Some(prev) => time_diff_ms(prev, now),
            None => 0,
        };
        self.last_mark = Some(now);
        elapsed
    }

    /// Finalize the session and return the total elapsed milliseconds.
    pub fn stop(&mut self) -> u64 {
        let now = SystemTime::now();
        self.ended_at = Some(now);
        match self.started_at {
            Some(start) => time_diff_ms(start, now),
            None => 0,
        }
    }

    pub fn has_started(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn has_stopped(&self) -> bool {
        self.ended_at.is_some()
    }

    /// Elapsed milliseconds so far; total once stopped.
    pub fn elapsed_ms(&self) -> u64 {
        match (self.started_at, self.ended_at) {
            (Some(start), Some(end)) => time_diff_ms(start, end),
            (Some(start), None) => time_diff_ms(start, SystemTime::now()),
            _ => 0,
        }
    }
}
