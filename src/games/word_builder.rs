//! Word Builder: type each word from a level's list. Per-word analysis
//! counts positional matches, letter reversals (b/d, p/q), and total
//! character errors, then the level summary folds those into an
//! encouragement badge.

use std::error::Error;

use crate::games::{load_levels, LevelDescriptor};
use crate::session::{Phase, SessionRecord};
use crate::util::{mean, pct};

/// Mirror-confusable letter pairs counted as reversals.
const REVERSAL_PAIRS: [(char, char); 4] = [('b', 'd'), ('d', 'b'), ('p', 'q'), ('q', 'p')];

/// Per-word breakdown of a typed attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct WordAttempt {
    pub expected: String,
    pub typed: String,
    /// Positional accuracy against the expected word, 0..=100.
    pub accuracy: f64,
    pub reversals: usize,
    pub errors: usize,
    pub time_ms: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WordBuilderSummary {
    pub average_accuracy: f64,
    pub total_reversals: usize,
    pub total_errors: usize,
    pub average_time_ms: f64,
    /// Reversals per word as a percentage.
    pub reversal_rate: f64,
    /// Character errors per word.
    pub error_rate: f64,
    pub badge: &'static str,
    pub feedback: &'static str,
}

/// Compare a typed word against the expected one.
pub fn analyze_word(typed: &str, expected: &str) -> (f64, usize, usize) {
    let typed_chars: Vec<char> = typed.chars().collect();
    let expected_chars: Vec<char> = expected.chars().collect();

    let matched = typed_chars
        .iter()
        .zip(expected_chars.iter())
        .filter(|(t, e)| t == e)
        .count();
    let accuracy = pct(matched, expected_chars.len());

    let reversals = typed_chars
        .iter()
        .zip(expected_chars.iter())
        .filter(|(t, e)| REVERSAL_PAIRS.contains(&(**t, **e)))
        .count();

    let errors = (0..typed_chars.len().max(expected_chars.len()))
        .filter(|&i| typed_chars.get(i) != expected_chars.get(i))
        .count();

    (accuracy, reversals, errors)
}

#[derive(Debug)]
pub struct WordBuilder {
    levels: Vec<LevelDescriptor>,
    level_idx: usize,
    word_idx: usize,
    attempts: Vec<WordAttempt>,
    session: SessionRecord,
}

impl WordBuilder {
    pub fn new() -> Result<Self, Box<dyn Error>> {
        let levels = load_levels("word_builder")?;
        Ok(Self {
            levels,
            level_idx: 0,
            word_idx: 0,
            attempts: Vec::new(),
            session: SessionRecord::new("word_builder"),
        })
    }

    pub fn with_level(level_idx: usize) -> Result<Self, Box<dyn Error>> {
        let mut game = Self::new()?;
        if level_idx >= game.levels.len() {
            return Err(format!("no such level: {level_idx}").into());
        }
        game.level_idx = level_idx;
        game.session = SessionRecord::new(&game.levels[level_idx].id);
        Ok(game)
    }

    pub fn start(&mut self) {
        self.session.begin();
    }

    pub fn level(&self) -> &LevelDescriptor {
        &self.levels[self.level_idx]
    }

    pub fn levels(&self) -> &[LevelDescriptor] {
        &self.levels
    }

    pub fn current_word(&self) -> Option<&str> {
        self.level().items.get(self.word_idx).map(String::as_str)
    }

    pub fn attempts(&self) -> &[WordAttempt] {
        &self.attempts
    }

    pub fn session(&self) -> &SessionRecord {
        &self.session
    }

    pub fn phase(&self) -> Phase {
        self.session.phase()
    }

    /// Submit the typed rendition of the current word. Blank input is
    /// ignored so an accidental Enter never scores a zero.
    pub fn submit(&mut self, typed: &str) -> Option<&WordAttempt> {
        if self.phase() != Phase::InProgress {
            return None;
        }
        let typed = typed.trim();
        if typed.is_empty() {
            return None;
        }
        let expected = self.current_word()?.to_string();

        let (accuracy, reversals, errors) = analyze_word(typed, &expected);
        let event = self.session.record(
            format!("word-{}", self.word_idx),
            typed == expected,
            typed.to_string(),
            expected.clone(),
        );
        let time_ms = event.response_ms;

        self.attempts.push(WordAttempt {
            expected,
            typed: typed.to_string(),
            accuracy,
            reversals,
            errors,
            time_ms,
        });

        self.word_idx += 1;
        if self.word_idx >= self.level().items.len() {
            self.session.finish();
        }
        self.attempts.last()
    }

    pub fn reset(&mut self) {
        self.word_idx = 0;
        self.attempts.clear();
        self.session = SessionRecord::new(&self.levels[self.level_idx].id);
    }

    pub fn summary(&self) -> Option<WordBuilderSummary> {
        if self.attempts.is_empty() {
            return None;
        }
        let total_words = self.attempts.len() as f64;

        let accuracies: Vec<f64> = self.attempts.iter().map(|a| a.accuracy).collect();
        let average_accuracy = mean(&accuracies).unwrap_or(0.0);
        let total_reversals: usize = self.attempts.iter().map(|a| a.reversals).sum();
        let total_errors: usize = self.attempts.iter().map(|a| a.errors).sum();
        let times: Vec<f64> = self.attempts.iter().map(|a| a.time_ms as f64).collect();
        let average_time_ms = mean(&times).unwrap_or(0.0);

        let reversal_rate = (total_reversals as f64 / total_words) * 100.0;
        let error_rate = total_errors as f64 / total_words;

        // Weighted trouble signals decide the badge.
        let mut points = 0u32;
        if reversal_rate > 10.0 {
            points += 2;
        }
        if average_accuracy < 70.0 {
            points += 2;
        }
        if average_time_ms / 1000.0 > 12.0 {
            points += 1;
        }
        if error_rate > 2.0 {
            points += 1;
        }

        let (badge, feedback) = match points {
            4.. => (
                "Keep Practicing!",
                "Writing can be tricky. Keep practicing and you will get better every day!",
            ),
            2..=3 => (
                "Good Job!",
                "You are making progress. A little more practice will make these words easier.",
            ),
            1 => (
                "Well Done!",
                "Nice work on those words. Keep an eye on the tricky letters.",
            ),
            0 => ("Great!", "Excellent spelling and letter formation!"),
        };

        Some(WordBuilderSummary {
            average_accuracy,
            total_reversals,
            total_errors,
            average_time_ms,
            reversal_rate,
            error_rate,
            badge,
            feedback,
        })
    }
}
