//! Memory Match: flip two cards per move, find every pair. Completion
//! produces a four-metric cognitive analysis of the recorded flips.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::score::{
    efficiency_score, reaction_consistency_score, reaction_speed_score, NEUTRAL_ACCURACY,
    NEUTRAL_CONSISTENCY, NEUTRAL_EFFICIENCY, NEUTRAL_SPEED,
};
use crate::session::{Phase, SessionRecord};
use crate::util::clamp_pct;
use crate::ScoreSet;

/// Symbol pool; level 1 uses the first 6, level 2 the first 8, level 3
/// all 10.
const SYMBOLS: [char; 10] = ['♠', '♥', '♦', '♣', '★', '☀', '☾', '♫', '♜', '☘'];

/// Penalty per mismatched move subtracted from the memory score.
const ERROR_PENALTY: f64 = 5.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    pub id: usize,
    pub symbol: char,
    pub face_up: bool,
    pub matched: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlipOutcome {
    /// Card already resolved, out of range, or game complete.
    Ignored,
    /// First card of a move turned face up.
    FaceUp,
    Matched,
    Mismatch,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemoryAnalysis {
    pub memory_strength: f64,
    pub processing_speed: f64,
    pub attention_level: f64,
    pub working_memory: f64,
}

impl MemoryAnalysis {
    pub fn score_set(&self) -> ScoreSet {
        let mut scores = ScoreSet::new();
        scores.push("memory_strength", self.memory_strength);
        scores.push("processing_speed", self.processing_speed);
        scores.push("attention_level", self.attention_level);
        scores.push("working_memory", self.working_memory);
        scores
    }

    fn neutral() -> Self {
        Self {
            memory_strength: NEUTRAL_ACCURACY,
            processing_speed: NEUTRAL_SPEED,
            attention_level: NEUTRAL_CONSISTENCY,
            working_memory: NEUTRAL_EFFICIENCY,
        }
    }
}

#[derive(Debug)]
pub struct MemoryMatch {
    level: u8,
    cards: Vec<Card>,
    first_flip: Option<usize>,
    pending_mismatch: Option<(usize, usize)>,
    moves: usize,
    mismatches: usize,
    session: SessionRecord,
    analysis: Option<MemoryAnalysis>,
}

impl MemoryMatch {
    pub fn new(level: u8) -> Self {
        Self::with_rng(level, &mut rand::thread_rng())
    }

    /// Deterministic deck for tests.
    pub fn with_seed(level: u8, seed: u64) -> Self {
        Self::with_rng(level, &mut StdRng::seed_from_u64(seed))
    }

    fn with_rng<R: rand::Rng>(level: u8, rng: &mut R) -> Self {
        let level = level.clamp(1, 3);
        let pairs = match level {
            1 => 6,
            2 => 8,
            _ => 10,
        };

        let mut symbols: Vec<char> = SYMBOLS[..pairs].iter().flat_map(|s| [*s, *s]).collect();
        symbols.shuffle(rng);

        let cards = symbols
            .into_iter()
            .enumerate()
            .map(|(id, symbol)| Card {
                id,
                symbol,
                face_up: false,
                matched: false,
            })
            .collect();

        Self {
            level,
            cards,
            first_flip: None,
            pending_mismatch: None,
            moves: 0,
            mismatches: 0,
            session: SessionRecord::new(format!("level-{level}")),
            analysis: None,
        }
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    pub fn pairs(&self) -> usize {
        self.cards.len() / 2
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn moves(&self) -> usize {
        self.moves
    }

    pub fn mismatches(&self) -> usize {
        self.mismatches
    }

    pub fn matched_pairs(&self) -> usize {
        self.cards.iter().filter(|c| c.matched).count() / 2
    }

    pub fn phase(&self) -> Phase {
        self.session.phase()
    }

    pub fn session(&self) -> &SessionRecord {
        &self.session
    }

    pub fn analysis(&self) -> Option<&MemoryAnalysis> {
        self.analysis.as_ref()
    }

    pub fn pending_mismatch(&self) -> Option<(usize, usize)> {
        self.pending_mismatch
    }

    /// Turn a mismatched pair back face down. A new flip resolves any
    /// pending pair first; the tick loop also calls this so the pair
    /// does not linger on screen.
    pub fn resolve_mismatch(&mut self) {
        if let Some((a, b)) = self.pending_mismatch.take() {
            self.cards[a].face_up = false;
            self.cards[b].face_up = false;
        }
    }

    pub fn flip(&mut self, idx: usize) -> FlipOutcome {
        if self.phase() == Phase::Completed {
            return FlipOutcome::Ignored;
        }
        self.resolve_mismatch();

        let Some(card) = self.cards.get(idx) else {
            return FlipOutcome::Ignored;
        };
        if card.face_up || card.matched {
            return FlipOutcome::Ignored;
        }

        if self.phase() == Phase::NotStarted {
            self.session.begin();
        }

        self.cards[idx].face_up = true;
        let symbol = self.cards[idx].symbol;

        match self.first_flip.take() {
            None => {
                self.session
                    .record(idx.to_string(), true, symbol, symbol);
                self.first_flip = Some(idx);
                FlipOutcome::FaceUp
            }
            Some(first) => {
                let expected = self.cards[first].symbol;
                let matched = symbol == expected;
                self.session
                    .record(idx.to_string(), matched, symbol, expected);
                self.moves += 1;

                if matched {
                    self.cards[first].matched = true;
                    self.cards[idx].matched = true;
                    if self.cards.iter().all(|c| c.matched) {
                        self.session.finish();
                        self.analysis = Some(self.compute_analysis());
                    }
                    FlipOutcome::Matched
                } else {
                    self.mismatches += 1;
                    self.pending_mismatch = Some((first, idx));
                    FlipOutcome::Mismatch
                }
            }
        }
    }

    /// Discard the session and reshuffle. Back to NotStarted.
    pub fn reset(&mut self) {
        *self = Self::new(self.level);
    }

    /// Analysis for the recorded session so far; the neutral constants
    /// when nothing was recorded.
    pub fn compute_analysis(&self) -> MemoryAnalysis {
        if self.session.is_empty() {
            return MemoryAnalysis::neutral();
        }

        let reaction_times = self.session.response_times_ms();
        let matched_cards = self.cards.iter().filter(|c| c.matched).count();
        let errors = self.mismatches;

        let denominator = matched_cards + errors * 2;
        let accuracy = if denominator == 0 {
            0.0
        } else {
            matched_cards as f64 / denominator as f64
        };
        let memory_strength =
            clamp_pct(accuracy * 100.0 - errors as f64 * ERROR_PENALTY).round();

        MemoryAnalysis {
            memory_strength,
            processing_speed: reaction_speed_score(&reaction_times).round(),
            attention_level: reaction_consistency_score(&reaction_times).round(),
            working_memory: efficiency_score(self.pairs(), self.moves).round(),
        }
    }
}
