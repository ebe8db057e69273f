//! Pattern Recognition: eight fixed completion puzzles spanning visual,
//! numerical, directional, and alphabetical sequences. Analysis breaks
//! accuracy down per pattern kind and derives screening insights.

use itertools::Itertools;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Deserialize;
use std::error::Error;

use crate::games::level_file_contents;
use crate::insight::Insight;
use crate::session::{Phase, SessionRecord};
use crate::util::{mean, pct};

/// Average response above this suggests slow visual-spatial processing.
const SLOW_RESPONSE_MS: f64 = 8000.0;
/// Average response below this counts as a strength.
const QUICK_RESPONSE_MS: f64 = 3000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, strum_macros::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PatternKind {
    Sequence,
    Numerical,
    Complex,
    Visual,
    Directional,
    Alphabetical,
    Fibonacci,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PatternLevel {
    pub id: u8,
    pub kind: PatternKind,
    pub pattern: Vec<String>,
    pub options: Vec<String>,
    pub correct: String,
}

#[derive(Debug, Deserialize)]
struct PatternFile {
    name: String,
    levels: Vec<PatternLevel>,
}

/// Load the eight fixed levels, validating that each correct answer is
/// one of its own options.
pub fn load_pattern_levels() -> Result<Vec<PatternLevel>, Box<dyn Error>> {
    let contents = level_file_contents("pattern_recognition.json")?;
    let file: PatternFile = serde_json::from_str(contents)?;

    if file.name != "pattern_recognition" {
        return Err(format!("pattern file is tagged {:?}", file.name).into());
    }
    for level in &file.levels {
        if !level.options.contains(&level.correct) {
            return Err(format!("level {} correct answer not among options", level.id).into());
        }
        if level.pattern.is_empty() {
            return Err(format!("level {} has an empty pattern", level.id).into());
        }
    }
    Ok(file.levels)
}

#[derive(Debug, Clone, PartialEq)]
pub struct KindBreakdown {
    pub kind: PatternKind,
    pub correct: usize,
    pub total: usize,
    pub accuracy: f64,
    pub avg_response_ms: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PatternAnalysis {
    pub total_questions: usize,
    pub correct_answers: usize,
    pub overall_accuracy: f64,
    pub average_response_ms: f64,
    pub per_kind: Vec<KindBreakdown>,
}

#[derive(Debug)]
pub struct PatternRecognition {
    levels: Vec<PatternLevel>,
    current: usize,
    score: u32,
    session: SessionRecord,
    answered_kinds: Vec<(PatternKind, bool, u64)>,
}

impl PatternRecognition {
    pub fn new() -> Result<Self, Box<dyn Error>> {
        Self::build(None)
    }

    /// Deterministic option order for tests.
    pub fn with_seed(seed: u64) -> Result<Self, Box<dyn Error>> {
        Self::build(Some(seed))
    }

    fn build(seed: Option<u64>) -> Result<Self, Box<dyn Error>> {
        let mut levels = load_pattern_levels()?;
        match seed {
            Some(seed) => {
                let mut rng = StdRng::seed_from_u64(seed);
                for level in &mut levels {
                    level.options.shuffle(&mut rng);
                }
            }
            None => {
                let mut rng = rand::thread_rng();
                for level in &mut levels {
                    level.options.shuffle(&mut rng);
                }
            }
        }
        Ok(Self {
            levels,
            current: 0,
            score: 0,
            session: SessionRecord::new("fixed-8"),
            answered_kinds: Vec::new(),
        })
    }

    pub fn start(&mut self) {
        self.session.begin();
        self.current = 0;
        self.score = 0;
        self.answered_kinds.clear();
    }

    pub fn phase(&self) -> Phase {
        self.session.phase()
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn session(&self) -> &SessionRecord {
        &self.session
    }

    pub fn level_number(&self) -> usize {
        self.current + 1
    }

    pub fn total_levels(&self) -> usize {
        self.levels.len()
    }

    pub fn current_level(&self) -> Option<&PatternLevel> {
        if self.phase() != Phase::InProgress {
            return None;
        }
        self.levels.get(self.current)
    }

    /// Submit the answer for the current level. Returns whether it was
    /// correct, or `None` when no level is active.
    pub fn answer(&mut self, selected: &str) -> Option<bool> {
        let level = self.current_level()?.clone();
        let correct = selected == level.correct;

        let event = self.session.record(
            format!("level-{}", level.id),
            correct,
            selected,
            level.correct.clone(),
        );
        self.answered_kinds
            .push((level.kind, correct, event.response_ms));

        if correct {
            self.score += 1;
        }
        self.current += 1;
        if self.current >= self.levels.len() {
            self.session.finish();
        }
        Some(correct)
    }

    pub fn reset(&mut self) {
        self.session = SessionRecord::new("fixed-8");
        self.current = 0;
        self.score = 0;
        self.answered_kinds.clear();
    }

    /// Aggregate the answered levels; `None` when nothing was answered.
    pub fn analysis(&self) -> Option<PatternAnalysis> {
        if self.session.is_empty() {
            return None;
        }

        let total = self.session.total();
        let correct = self.session.correct_count();
        let times = self.session.response_times_ms();

        let per_kind = self
            .answered_kinds
            .iter()
            .into_group_map_by(|(kind, _, _)| *kind)
            .into_iter()
            .map(|(kind, entries)| {
                let total = entries.len();
                let correct = entries.iter().filter(|(_, ok, _)| *ok).count();
                let times: Vec<f64> = entries.iter().map(|(_, _, ms)| *ms as f64).collect();
                KindBreakdown {
                    kind,
                    correct,
                    total,
                    accuracy: pct(correct, total),
                    avg_response_ms: mean(&times).unwrap_or(0.0),
                }
            })
            .sorted_by_key(|b| b.kind.to_string())
            .collect();

        Some(PatternAnalysis {
            total_questions: total,
            correct_answers: correct,
            overall_accuracy: pct(correct, total),
            average_response_ms: mean(&times).unwrap_or(0.0),
            per_kind,
        })
    }

    /// Qualitative findings derived from the analysis thresholds.
    pub fn insights(analysis: &PatternAnalysis) -> Vec<Insight> {
        let mut insights = Vec::new();

        if analysis.average_response_ms > SLOW_RESPONSE_MS {
            insights.push(Insight::concern(
                "Extended processing time observed - may indicate visual-spatial processing challenges",
            ));
        } else if analysis.average_response_ms < QUICK_RESPONSE_MS {
            insights.push(Insight::strength(
                "Quick response times suggest good pattern recognition speed",
            ));
        }

        if analysis.overall_accuracy < 50.0 {
            insights.push(Insight::concern(
                "Lower accuracy in pattern recognition - may suggest difficulties with visual sequencing",
            ));
        } else if analysis.overall_accuracy >= 75.0 {
            insights.push(Insight::strength(
                "Strong pattern recognition abilities demonstrated",
            ));
        }

        for breakdown in &analysis.per_kind {
            if breakdown.accuracy >= 50.0 {
                continue;
            }
            match breakdown.kind {
                PatternKind::Sequence => insights.push(Insight::concern(
                    "Difficulty with sequential patterns - common in dysgraphia",
                )),
                PatternKind::Directional => insights.push(Insight::concern(
                    "Challenges with directional patterns - may relate to spatial orientation difficulties",
                )),
                PatternKind::Alphabetical => insights.push(Insight::concern(
                    "Letter sequence difficulties observed - relevant to writing challenges",
                )),
                _ => {}
            }
        }

        if insights.is_empty() {
            insights.push(Insight::note(
                "Performance within typical ranges across all pattern types",
            ));
        }
        insights
    }
}
