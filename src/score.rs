//! Fixed aggregation formulas turning a session's action events into
//! normalized 0-100 metrics. All deterministic arithmetic over finite
//! in-memory slices; edge cases fall back to documented constants
//! instead of erroring.

use crate::util::{clamp_pct, mean, std_dev};

/// Reference reaction time subtracted before scaling the speed score.
pub const SPEED_BASELINE_MS: f64 = 500.0;
/// Milliseconds of average reaction per speed point lost.
pub const SPEED_DIVISOR: f64 = 20.0;
/// Assumed average reaction when no reactions were recorded.
pub const DEFAULT_REACTION_MS: f64 = 1000.0;
/// Milliseconds of reaction-time spread per consistency point lost.
pub const CONSISTENCY_DIVISOR: f64 = 50.0;

/// Neutral values used when a session has no events at all.
pub const NEUTRAL_ACCURACY: f64 = 0.0;
pub const NEUTRAL_SPEED: f64 = 75.0;
pub const NEUTRAL_CONSISTENCY: f64 = 100.0;
pub const NEUTRAL_EFFICIENCY: f64 = 0.0;

/// A named metric with a value clamped to [0, 100].
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreEntry {
    pub name: &'static str,
    pub value: f64,
}

/// Ordered set of derived metrics for one session. Recomputed in full,
/// never mutated incrementally.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreSet {
    entries: Vec<ScoreEntry>,
}

impl ScoreSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a metric, clamping the value into the score range.
    pub fn push(&mut self, name: &'static str, value: f64) {
        self.entries.push(ScoreEntry {
            name,
            value: clamp_pct(value),
        });
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.entries.iter().find(|e| e.name == name).map(|e| e.value)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScoreEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// correct / total x 100, clamped. Zero total scores 0.
pub fn accuracy_score(correct: usize, total: usize) -> f64 {
    if total == 0 {
        return NEUTRAL_ACCURACY;
    }
    clamp_pct((correct as f64 / total as f64) * 100.0)
}

/// Speed from average reaction time: 100 - (avg - 500) / 20, clamped.
/// An empty reaction list is treated as an average of 1000 ms.
pub fn reaction_speed_score(reaction_ms: &[f64]) -> f64 {
    let avg = mean(reaction_ms).unwrap_or(DEFAULT_REACTION_MS);
    clamp_pct(100.0 - (avg - SPEED_BASELINE_MS) / SPEED_DIVISOR)
}

/// Consistency from reaction-time spread: 100 - stddev / 50, clamped.
/// Fewer than two samples means zero spread, the best case.
pub fn reaction_consistency_score(reaction_ms: &[f64]) -> f64 {
    if reaction_ms.len() < 2 {
        return NEUTRAL_CONSISTENCY;
    }
    let spread = std_dev(reaction_ms).unwrap_or(0.0);
    clamp_pct(100.0 - spread / CONSISTENCY_DIVISOR)
}

/// optimal / actual x 100, clamped. Zero actual scores 0.
pub fn efficiency_score(optimal: usize, actual: usize) -> f64 {
    if actual == 0 {
        return NEUTRAL_EFFICIENCY;
    }
    clamp_pct((optimal as f64 / actual as f64) * 100.0)
}

/// Average of a reaction-time series, with the documented default for
/// an empty series.
pub fn average_reaction_ms(reaction_ms: &[f64]) -> f64 {
    mean(reaction_ms).unwrap_or(DEFAULT_REACTION_MS)
}
