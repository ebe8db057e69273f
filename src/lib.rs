// Library surface for headless/integration tests and reuse.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod app_dirs;
pub mod config;
pub mod games;
pub mod insight;
pub mod report;
pub mod runtime;
pub mod score;
pub mod screening;
pub mod session;
pub mod timer;
pub mod util;

pub use score::ScoreSet;

/// UI tick interval; timed games count down in these steps.
pub const TICK_RATE_MS: u64 = 100;
