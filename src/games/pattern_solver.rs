//! Pattern Solver: a 30-second run of generated puzzles. Early levels
//! are arithmetic sequences, later levels shape/color cycles. Wrong
//! answers re-roll the current level; correct answers score level x 10
//! and advance. The post-run analysis derives a screening risk tier.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::insight::RiskTier;
use crate::session::{Phase, SessionRecord};

pub const RUN_SECONDS: f64 = 30.0;

/// Accuracy below this is a high-risk signal on its own.
const LOW_ACCURACY: f64 = 50.0;
const MODERATE_ACCURACY: f64 = 70.0;
const SLOW_RESPONSE_SECS: f64 = 8.0;
const QUICK_RESPONSE_SECS: f64 = 3.0;
const ERROR_RATE_THRESHOLD: f64 = 40.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Shape {
    Circle,
    Square,
    Triangle,
}

const SHAPES: [Shape; 3] = [Shape::Circle, Shape::Square, Shape::Triangle];

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum ShapeColor {
    Red,
    Blue,
    Green,
}

const COLORS: [ShapeColor; 3] = [ShapeColor::Red, ShapeColor::Blue, ShapeColor::Green];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShapeCell {
    pub shape: Shape,
    pub color: ShapeColor,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Puzzle {
    /// Arithmetic sequence with the last term hidden.
    Sequence { terms: Vec<i64>, answer: i64 },
    /// Shape/color cycle with the last cell hidden.
    Shapes { cells: Vec<ShapeCell>, answer: ShapeCell },
}

/// A submitted answer for the active puzzle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Answer {
    Number(i64),
    Shape(ShapeCell),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Correct,
    Incorrect,
    /// Answer type does not match the puzzle, or the run is over.
    Rejected,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SolverStats {
    pub total_attempts: usize,
    pub correct_answers: usize,
    /// Running average response time in milliseconds.
    pub average_time_ms: f64,
    pub sequential_errors: usize,
    pub spatial_errors: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SolverAnalysis {
    pub risk: RiskTier,
    pub accuracy: f64,
    pub strengths: Vec<String>,
    pub concerns: Vec<String>,
    pub recommendations: Vec<String>,
}

#[derive(Debug)]
pub struct PatternSolver {
    level: u32,
    score: u32,
    seconds_remaining: f64,
    puzzle: Option<Puzzle>,
    stats: SolverStats,
    session: SessionRecord,
    rng: StdRng,
}

impl PatternSolver {
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        Self {
            level: 1,
            score: 0,
            seconds_remaining: RUN_SECONDS,
            puzzle: None,
            stats: SolverStats::default(),
            session: SessionRecord::new("timed-30s"),
            rng,
        }
    }

    pub fn start(&mut self) {
        self.level = 1;
        self.score = 0;
        self.seconds_remaining = RUN_SECONDS;
        self.stats = SolverStats::default();
        self.session.begin();
        self.next_puzzle();
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn seconds_remaining(&self) -> f64 {
        self.seconds_remaining
    }

    pub fn stats(&self) -> &SolverStats {
        &self.stats
    }

    pub fn puzzle(&self) -> Option<&Puzzle> {
        self.puzzle.as_ref()
    }

    pub fn session(&self) -> &SessionRecord {
        &self.session
    }

    pub fn phase(&self) -> Phase {
        self.session.phase()
    }

    /// Advance the countdown by measured wall time; ends the run at
    /// zero.
    pub fn on_tick(&mut self, elapsed: Duration) {
        if self.phase() != Phase::InProgress {
            return;
        }
        self.seconds_remaining -= elapsed.as_secs_f64();
        if self.seconds_remaining <= 0.0 {
            self.seconds_remaining = 0.0;
            self.puzzle = None;
            self.session.finish();
        }
    }

    fn next_puzzle(&mut self) {
        let puzzle = if self.level <= 2 {
            self.generate_sequence()
        } else {
            self.generate_shapes()
        };
        self.puzzle = Some(puzzle);
    }

    fn generate_sequence(&mut self) -> Puzzle {
        let length = (4 + self.level as usize).min(8);
        let increment = self.rng.gen_range(1..=3i64);
        let start = self.rng.gen_range(1..=10i64);

        let full: Vec<i64> = (0..length as i64).map(|i| start + i * increment).collect();
        let answer = *full.last().expect("length >= 5");
        Puzzle::Sequence {
            terms: full[..full.len() - 1].to_vec(),
            answer,
        }
    }

    fn generate_shapes(&mut self) -> Puzzle {
        let length = (3 + self.level as usize / 2).min(6);

        let full: Vec<ShapeCell> = (0..length)
            .map(|i| ShapeCell {
                shape: SHAPES[i % SHAPES.len()],
                color: COLORS[(i / SHAPES.len()) % COLORS.len()],
            })
            .collect();
        let answer = *full.last().expect("length >= 3");
        Puzzle::Shapes {
            cells: full[..full.len() - 1].to_vec(),
            answer,
        }
    }

    pub fn submit(&mut self, answer: Answer) -> Verdict {
        if self.phase() != Phase::InProgress {
            return Verdict::Rejected;
        }
        let Some(puzzle) = self.puzzle.clone() else {
            return Verdict::Rejected;
        };

        let (correct, selected, expected, sequential) = match (&puzzle, answer) {
            (Puzzle::Sequence { answer: want, .. }, Answer::Number(got)) => {
                (got == *want, got.to_string(), want.to_string(), true)
            }
            (Puzzle::Shapes { answer: want, .. }, Answer::Shape(got)) => (
                got == *want,
                format!("{} {}", got.color, got.shape),
                format!("{} {}", want.color, want.shape),
                false,
            ),
            _ => return Verdict::Rejected,
        };

        let event = self
            .session
            .record(format!("level-{}", self.level), correct, selected, expected);
        let response_ms = event.response_ms as f64;

        self.stats.total_attempts += 1;
        let n = self.stats.total_attempts as f64;
        self.stats.average_time_ms =
            (self.stats.average_time_ms * (n - 1.0) + response_ms) / n;

        if correct {
            self.stats.correct_answers += 1;
            self.score += self.level * 10;
            self.level += 1;
        } else if sequential {
            self.stats.sequential_errors += 1;
        } else {
            self.stats.spatial_errors += 1;
        }

        self.next_puzzle();
        if correct {
            Verdict::Correct
        } else {
            Verdict::Incorrect
        }
    }

    pub fn reset(&mut self) {
        self.level = 1;
        self.score = 0;
        self.seconds_remaining = RUN_SECONDS;
        self.puzzle = None;
        self.stats = SolverStats::default();
        self.session = SessionRecord::new("timed-30s");
    }

    /// Risk analysis for the finished run (valid mid-run too; it only
    /// reads the stats).
    pub fn analysis(&self) -> SolverAnalysis {
        let stats = &self.stats;
        let accuracy = if stats.total_attempts > 0 {
            (stats.correct_answers as f64 / stats.total_attempts as f64) * 100.0
        } else {
            0.0
        };
        let avg_secs = stats.average_time_ms / 1000.0;

        let mut risk = RiskTier::Low;
        let mut strengths = Vec::new();
        let mut concerns = Vec::new();
        let mut recommendations = Vec::new();

        if accuracy < LOW_ACCURACY {
            risk = RiskTier::High;
            concerns
                .push("Low pattern recognition accuracy may indicate processing difficulties".into());
            recommendations
                .push("Practice with simpler patterns and gradually increase complexity".into());
        } else if accuracy < MODERATE_ACCURACY {
            risk = RiskTier::Moderate;
            concerns.push("Moderate difficulty with pattern recognition".into());
        } else {
            strengths.push("Good pattern recognition abilities".into());
        }

        if avg_secs > SLOW_RESPONSE_SECS {
            concerns.push(
                "Slower processing speed may indicate difficulties with visual-motor integration"
                    .into(),
            );
            recommendations.push("Practice timed exercises to improve processing speed".into());
            risk = risk.at_least(RiskTier::Moderate);
        } else if avg_secs < QUICK_RESPONSE_SECS {
            strengths.push("Quick processing and response time".into());
        }

        let spatial_rate = if stats.total_attempts > 0 {
            (stats.spatial_errors as f64 / stats.total_attempts as f64) * 100.0
        } else {
            0.0
        };
        let sequential_rate = if stats.total_attempts > 0 {
            (stats.sequential_errors as f64 / stats.total_attempts as f64) * 100.0
        } else {
            0.0
        };

        if spatial_rate > ERROR_RATE_THRESHOLD {
            concerns.push("Difficulty with spatial relationships and visual coordination".into());
            recommendations.push("Focus on spatial awareness exercises".into());
        }
        if sequential_rate > ERROR_RATE_THRESHOLD {
            concerns.push("Challenges with sequential processing".into());
            recommendations.push("Practice sequence-based activities".into());
        }

        if concerns.len() >= 2 {
            risk = if concerns.len() >= 3 {
                RiskTier::High
            } else {
                RiskTier::Moderate
            };
        }

        SolverAnalysis {
            risk,
            accuracy,
            strengths,
            concerns,
            recommendations,
        }
    }
}

impl Default for PatternSolver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn correct_answer(puzzle: &Puzzle) -> Answer {
        match puzzle {
            Puzzle::Sequence { answer, .. } => Answer::Number(*answer),
            Puzzle::Shapes { answer, .. } => Answer::Shape(*answer),
        }
    }

    #[test]
    fn test_start_generates_first_puzzle() {
        let mut game = PatternSolver::with_seed(1);
        assert!(game.puzzle().is_none());
        game.start();
        assert_eq!(game.phase(), Phase::InProgress);
        assert_matches!(game.puzzle(), Some(Puzzle::Sequence { .. }));
    }

    #[test]
    fn test_sequence_dimensions_follow_level() {
        let mut game = PatternSolver::with_seed(2);
        game.start();
        // level 1: full length 5, one term hidden
        if let Some(Puzzle::Sequence { terms, .. }) = game.puzzle() {
            assert_eq!(terms.len(), 4);
        } else {
            panic!("expected a sequence puzzle");
        }
    }

    #[test]
    fn test_sequence_answer_continues_the_arithmetic_series() {
        let mut game = PatternSolver::with_seed(3);
        game.start();
        if let Some(Puzzle::Sequence { terms, answer }) = game.puzzle() {
            let increment = terms[1] - terms[0];
            for pair in terms.windows(2) {
                assert_eq!(pair[1] - pair[0], increment);
            }
            assert_eq!(*answer, terms.last().unwrap() + increment);
        } else {
            panic!("expected a sequence puzzle");
        }
    }

    #[test]
    fn test_correct_answer_scores_and_advances() {
        let mut game = PatternSolver::with_seed(4);
        game.start();
        let answer = correct_answer(game.puzzle().unwrap());
        assert_eq!(game.submit(answer), Verdict::Correct);
        assert_eq!(game.score(), 10);
        assert_eq!(game.level(), 2);
        assert_eq!(game.stats().correct_answers, 1);
    }

    #[test]
    fn test_wrong_answer_rerolls_same_level() {
        let mut game = PatternSolver::with_seed(5);
        game.start();
        assert_eq!(game.submit(Answer::Number(-9999)), Verdict::Incorrect);
        assert_eq!(game.level(), 1);
        assert_eq!(game.score(), 0);
        assert_eq!(game.stats().sequential_errors, 1);
        assert_matches!(game.puzzle(), Some(Puzzle::Sequence { .. }));
    }

    #[test]
    fn test_shape_puzzles_appear_from_level_three() {
        let mut game = PatternSolver::with_seed(6);
        game.start();
        for _ in 0..2 {
            let answer = correct_answer(game.puzzle().unwrap());
            assert_eq!(game.submit(answer), Verdict::Correct);
        }
        assert_eq!(game.level(), 3);
        assert_matches!(game.puzzle(), Some(Puzzle::Shapes { .. }));
    }

    #[test]
    fn test_shape_cycle_layout() {
        let mut game = PatternSolver::with_seed(7);
        game.start();
        for _ in 0..2 {
            let answer = correct_answer(game.puzzle().unwrap());
            game.submit(answer);
        }
        if let Some(Puzzle::Shapes { cells, answer }) = game.puzzle() {
            // level 3: full length 4, one cell hidden
            assert_eq!(cells.len(), 3);
            assert_eq!(cells[0].shape, Shape::Circle);
            assert_eq!(cells[1].shape, Shape::Square);
            assert_eq!(cells[2].shape, Shape::Triangle);
            assert_eq!(answer.shape, Shape::Circle);
            assert_eq!(answer.color, ShapeColor::Blue);
        } else {
            panic!("expected a shape puzzle");
        }
    }

    #[test]
    fn test_mismatched_answer_type_is_rejected() {
        let mut game = PatternSolver::with_seed(8);
        game.start();
        let verdict = game.submit(Answer::Shape(ShapeCell {
            shape: Shape::Circle,
            color: ShapeColor::Red,
        }));
        assert_eq!(verdict, Verdict::Rejected);
        assert_eq!(game.stats().total_attempts, 0);
    }

    #[test]
    fn test_run_ends_when_time_expires() {
        let mut game = PatternSolver::with_seed(9);
        game.start();
        let ticks = (RUN_SECONDS * 10.0) as usize + 1;
        for _ in 0..ticks {
            game.on_tick(Duration::from_millis(100));
        }
        assert_eq!(game.phase(), Phase::Completed);
        assert_eq!(game.seconds_remaining(), 0.0);
        assert!(game.puzzle().is_none());
        assert_eq!(game.submit(Answer::Number(1)), Verdict::Rejected);
    }

    #[test]
    fn test_laggy_ticks_still_count_in_full() {
        // one oversized tick must burn the same clock as many small ones
        let mut game = PatternSolver::with_seed(15);
        game.start();
        game.on_tick(Duration::from_secs_f64(RUN_SECONDS + 0.5));
        assert_eq!(game.phase(), Phase::Completed);
        assert_eq!(game.seconds_remaining(), 0.0);
    }

    #[test]
    fn test_running_average_time() {
        let mut game = PatternSolver::with_seed(10);
        game.start();
        game.submit(Answer::Number(-1));
        game.submit(Answer::Number(-1));
        game.submit(Answer::Number(-1));
        // headless responses are near-instant; average stays tiny but defined
        assert!(game.stats().average_time_ms >= 0.0);
        assert_eq!(game.stats().total_attempts, 3);
    }

    #[test]
    fn test_analysis_all_correct_is_low_risk() {
        let mut game = PatternSolver::with_seed(11);
        game.start();
        for _ in 0..5 {
            let answer = correct_answer(game.puzzle().unwrap());
            assert_eq!(game.submit(answer), Verdict::Correct);
        }

        let analysis = game.analysis();
        assert_eq!(analysis.risk, RiskTier::Low);
        assert_eq!(analysis.accuracy, 100.0);
        assert!(analysis.concerns.is_empty());
        assert!(analysis
            .strengths
            .iter()
            .any(|s| s.contains("Good pattern recognition")));
    }

    #[test]
    fn test_analysis_low_accuracy_is_high_risk() {
        let mut game = PatternSolver::with_seed(12);
        game.start();
        for _ in 0..4 {
            game.submit(Answer::Number(-1));
        }
        let answer = correct_answer(game.puzzle().unwrap());
        game.submit(answer);

        let analysis = game.analysis();
        // 1/5 = 20% accuracy and 80% sequential errors: two concerns
        assert_eq!(analysis.accuracy, 20.0);
        assert_eq!(analysis.concerns.len(), 2);
        assert_eq!(analysis.risk, RiskTier::Moderate);
    }

    #[test]
    fn test_analysis_no_attempts() {
        let mut game = PatternSolver::with_seed(13);
        game.start();
        let analysis = game.analysis();
        assert_eq!(analysis.accuracy, 0.0);
        assert_eq!(analysis.risk, RiskTier::High);
    }

    #[test]
    fn test_reset_discards_run() {
        let mut game = PatternSolver::with_seed(14);
        game.start();
        let answer = correct_answer(game.puzzle().unwrap());
        game.submit(answer);

        game.reset();
        assert_eq!(game.phase(), Phase::NotStarted);
        assert_eq!(game.level(), 1);
        assert_eq!(game.score(), 0);
        assert!(game.puzzle().is_none());
        assert!(game.session().is_empty());
    }
}
