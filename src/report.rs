//! Session history: a sqlite store of finished game runs plus a CSV
//! append log and a CSV exporter for sharing results.

use chrono::{DateTime, Local};
use rusqlite::{params, Connection, Result};
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;
use crate::insight::RiskTier;

/// One finished game run.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub game: String,
    pub level: String,
    /// Headline score for the run, 0..=100.
    pub score: f64,
    pub risk: RiskTier,
    pub duration_ms: u64,
    pub timestamp: DateTime<Local>,
}

/// Database manager for session history
#[derive(Debug)]
pub struct HistoryDb {
    conn: Connection,
}

impl HistoryDb {
    /// Initialize the database connection and create tables if needed
    pub fn new() -> Result<Self> {
        let db_path = AppDirs::db_path().unwrap_or_else(|| PathBuf::from("scrawl_history.db"));

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                rusqlite::Error::SqliteFailure(
                    rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CANTOPEN),
                    Some(format!("Failed to create directory: {}", e)),
                )
            })?;
        }

        let conn = Connection::open(&db_path)?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS session_results (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                game TEXT NOT NULL,
                level TEXT NOT NULL,
                score REAL NOT NULL,
                risk TEXT NOT NULL,
                duration_ms INTEGER NOT NULL,
                timestamp TEXT NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_session_results_game ON session_results(game)",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_session_results_timestamp ON session_results(timestamp)",
            [],
        )?;

        Ok(HistoryDb { conn })
    }

    /// Record a finished run
    pub fn record(&self, summary: &SessionSummary) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO session_results
            (game, level, score, risk, duration_ms, timestamp)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                summary.game,
                summary.level,
                summary.score,
                summary.risk.to_string(),
                summary.duration_ms,
                summary.timestamp.to_rfc3339(),
            ],
        )?;

        Ok(())
    }

    /// Most recent runs, newest first
    pub fn recent(&self, limit: usize) -> Result<Vec<SessionSummary>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT game, level, score, risk, duration_ms, timestamp
            FROM session_results
            ORDER BY timestamp DESC
            LIMIT ?1
            "#,
        )?;

        let iter = stmt.query_map([limit as i64], |row| {
            let risk_str: String = row.get(3)?;
            let timestamp_str: String = row.get(5)?;
            let timestamp = DateTime::parse_from_rfc3339(&timestamp_str)
                .map_err(|_| {
                    rusqlite::Error::InvalidColumnType(
                        5,
                        "timestamp".to_string(),
                        rusqlite::types::Type::Text,
                    )
                })?
                .with_timezone(&Local);

            Ok(SessionSummary {
                game: row.get(0)?,
                level: row.get(1)?,
                score: row.get(2)?,
                risk: risk_str.parse().unwrap_or(RiskTier::Low),
                duration_ms: row.get(4)?,
                timestamp,
            })
        })?;

        let mut summaries = Vec::new();
        for summary in iter {
            summaries.push(summary?);
        }

        Ok(summaries)
    }

    /// Average headline score for one game, None when no runs exist
    pub fn average_score(&self, game: &str) -> Result<Option<f64>> {
        let mut stmt = self
            .conn
            .prepare("SELECT AVG(score) FROM session_results WHERE game = ?1")?;

        let avg: Option<f64> = stmt.query_row([game], |row| row.get(0))?;
        Ok(avg)
    }

    /// How many runs ended in each risk tier for one game
    pub fn risk_counts(&self, game: &str) -> Result<Vec<(String, i64)>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT risk, COUNT(*) as total
            FROM session_results
            WHERE game = ?1
            GROUP BY risk
            ORDER BY risk
            "#,
        )?;

        let iter = stmt.query_map([game], |row| Ok((row.get(0)?, row.get(1)?)))?;

        let mut counts = Vec::new();
        for item in iter {
            counts.push(item?);
        }

        Ok(counts)
    }

    /// Clear all history (for testing or reset purposes)
    pub fn clear_all(&self) -> Result<()> {
        self.conn.execute("DELETE FROM session_results", [])?;
        Ok(())
    }

    pub fn database_exists() -> bool {
        if let Some(path) = AppDirs::db_path() {
            path.exists()
        } else {
            false
        }
    }
}

/// Append one run to the plain-text log, writing the header on first use.
pub fn append_log(summary: &SessionSummary) -> io::Result<()> {
    let Some(log_path) = AppDirs::log_path() else {
        return Ok(());
    };
    append_log_at(&log_path, summary)
}

pub fn append_log_at(log_path: &Path, summary: &SessionSummary) -> io::Result<()> {
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let needs_header = !log_path.exists();

    let mut log_file = OpenOptions::new()
        .write(true)
        .append(true)
        .create(true)
        .open(log_path)?;

    if needs_header {
        writeln!(log_file, "date,game,level,score,risk,duration_ms")?;
    }

    writeln!(
        log_file,
        "{},{},{},{:.1},{},{}",
        summary.timestamp.format("%Y-%m-%d %H:%M:%S"),
        summary.game,
        summary.level,
        summary.score,
        summary.risk,
        summary.duration_ms,
    )
}

/// Export history to a CSV file for sharing with a specialist.
pub fn export_history_csv(
    summaries: &[SessionSummary],
    path: &Path,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["date", "game", "level", "score", "risk", "duration_ms"])?;
    for summary in summaries {
        writer.write_record([
            summary.timestamp.to_rfc3339(),
            summary.game.clone(),
            summary.level.clone(),
            format!("{:.1}", summary.score),
            summary.risk.to_string(),
            summary.duration_ms.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}
