pub mod memory_match;
pub mod pattern_recognition;
pub mod pattern_solver;
pub mod spot_difference;
pub mod word_builder;

use include_dir::{include_dir, Dir};
use serde::Deserialize;
use std::error::Error;

static LEVELS_DIR: Dir = include_dir!("src/levels");

/// Which mini-game a session belongs to. The serialized form is the
/// key used in the history database and on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum GameKind {
    #[strum(serialize = "memory")]
    MemoryMatch,
    #[strum(serialize = "patterns")]
    PatternRecognition,
    #[strum(serialize = "solver")]
    PatternSolver,
    #[strum(serialize = "words")]
    WordBuilder,
    #[strum(serialize = "spot")]
    SpotDifference,
}

impl GameKind {
    pub fn title(&self) -> &'static str {
        match self {
            GameKind::MemoryMatch => "Memory Match",
            GameKind::PatternRecognition => "Pattern Recognition",
            GameKind::PatternSolver => "Pattern Solver",
            GameKind::WordBuilder => "Word Builder",
            GameKind::SpotDifference => "Spot the Difference",
        }
    }
}

/// One playable level: an identifier, child-facing text, and the
/// ordered item pool it presents.
#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct LevelDescriptor {
    pub id: String,
    pub title: String,
    pub instruction: String,
    pub items: Vec<String>,
    pub difficulty: u8,
}

#[derive(Deserialize, Debug)]
struct LevelFile {
    name: String,
    levels: Vec<LevelDescriptor>,
}

/// Raw contents of an embedded level-data file.
pub(crate) fn level_file_contents(file_name: &str) -> Result<&'static str, Box<dyn Error>> {
    let file = LEVELS_DIR
        .get_file(file_name)
        .ok_or_else(|| format!("level file not found: {file_name}"))?;
    file.contents_utf8()
        .ok_or_else(|| format!("level file is not utf-8: {file_name}").into())
}

/// Load and validate a tagged list of level descriptors.
pub fn load_levels(name: &str) -> Result<Vec<LevelDescriptor>, Box<dyn Error>> {
    let contents = level_file_contents(&format!("{name}.json"))?;
    let file: LevelFile = serde_json::from_str(contents)?;

    if file.name != name {
        return Err(format!("level file {name}.json is tagged {:?}", file.name).into());
    }
    if file.levels.is_empty() {
        return Err(format!("level file {name}.json has no levels").into());
    }
    let mut prev_difficulty = 0u8;
    for level in &file.levels {
        if level.items.is_empty() {
            return Err(format!("level {:?} has no items", level.id).into());
        }
        if level.difficulty < prev_difficulty {
            return Err(format!("level {:?} lowers difficulty", level.id).into());
        }
        prev_difficulty = level.difficulty;
    }
    let mut ids: Vec<&str> = file.levels.iter().map(|l| l.id.as_str()).collect();
    ids.sort_unstable();
    ids.dedup();
    if ids.len() != file.levels.len() {
        return Err(format!("level file {name}.json has duplicate level ids").into());
    }

    Ok(file.levels)
}
