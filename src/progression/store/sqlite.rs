//! SQLite database connection, schema management, and the SQLite store
//!
//! One database file holds the progression singleton row and the local
//! activity log. Amounts and dates are TEXT columns so they round-trip exactly.

use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use rusqlite::{Connection, OptionalExtension};

use super::ProgressionStore;
use crate::progression::achievements::AchievementProgress;
use crate::progression::calendar::{day_key, parse_day_key};
use crate::progression::state::ProgressionState;

const SCHEMA_VERSION: i32 = 1;

/// Shared database handle
#[derive(Clone)]
pub struct ProgressDb {
    conn: Arc<Mutex<Connection>>,
}

impl ProgressDb {
    /// Open or create the database at a specific path
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create data dir: {}", parent.display()))?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open progress db: {}", path.display()))?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;

        Self::from_connection(conn)
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory db")?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.init_schema()?;
        Ok(db)
    }

    /// Get a reference to the connection
    pub fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().expect("Progress DB lock poisoned")
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.conn();
        conn.execute_batch(SCHEMA_SQL)?;
        drop(conn);
        self.check_schema_version()
    }

    fn check_schema_version(&self) -> Result<()> {
        let conn = self.conn();
        let version: i32 = conn
            .query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))
            .context("Failed to read schema version")?;

        if version > SCHEMA_VERSION {
            anyhow::bail!(
                "Progress db schema version {} is newer than supported version {}",
                version,
                SCHEMA_VERSION
            );
        }

        conn.execute(
            "INSERT OR REPLACE INTO schema_version VALUES (?1)",
            [SCHEMA_VERSION],
        )?;
        Ok(())
    }
}

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY
);

-- Progression (singleton)
CREATE TABLE IF NOT EXISTS progression_state (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    daily_earned TEXT NOT NULL DEFAULT '0',
    last_reset_date TEXT,
    total_earned TEXT NOT NULL DEFAULT '0',
    current_login_streak INTEGER NOT NULL DEFAULT 0,
    longest_login_streak INTEGER NOT NULL DEFAULT 0,
    last_login_date TEXT,
    total_active_days INTEGER NOT NULL DEFAULT 0,
    games_completed INTEGER NOT NULL DEFAULT 0,
    perfect_game_streak INTEGER NOT NULL DEFAULT 0,
    total_perfect_games INTEGER NOT NULL DEFAULT 0,
    total_shares INTEGER NOT NULL DEFAULT 0,
    virality_score TEXT NOT NULL DEFAULT '0',
    referrals_completed INTEGER NOT NULL DEFAULT 0,
    achievement_progress TEXT NOT NULL DEFAULT '{}',
    unlocked_ids TEXT NOT NULL DEFAULT '[]',
    updated_at INTEGER
);

-- Raw activity evidence recorded locally
CREATE TABLE IF NOT EXISTS activity_log (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    kind TEXT NOT NULL,
    timestamp_ms INTEGER,
    timestamp_text TEXT,
    source_ref TEXT NOT NULL DEFAULT '',
    recorded_at INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_activity_kind ON activity_log(kind);
"#;

/// Progression store backed by the `progression_state` row
#[derive(Clone)]
pub struct SqliteStore {
    db: ProgressDb,
}

impl SqliteStore {
    pub fn new(db: ProgressDb) -> Self {
        Self { db }
    }

    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self::new(ProgressDb::open(path)?))
    }

    pub fn db(&self) -> &ProgressDb {
        &self.db
    }
}

/// Row as stored, before parsing the TEXT columns
struct StateRow {
    daily_earned: String,
    last_reset_date: Option<String>,
    total_earned: String,
    current_login_streak: i64,
    longest_login_streak: i64,
    last_login_date: Option<String>,
    total_active_days: i64,
    games_completed: i64,
    perfect_game_streak: i64,
    total_perfect_games: i64,
    total_shares: i64,
    virality_score: String,
    referrals_completed: i64,
    achievement_progress: String,
    unlocked_ids: String,
}

impl StateRow {
    fn into_state(self) -> Result<ProgressionState> {
        Ok(ProgressionState {
            daily_earned: self
                .daily_earned
                .parse()
                .with_context(|| format!("Bad daily_earned: {:?}", self.daily_earned))?,
            last_reset_date: parse_optional_day(self.last_reset_date.as_deref())?,
            total_earned: self
                .total_earned
                .parse()
                .with_context(|| format!("Bad total_earned: {:?}", self.total_earned))?,
            current_login_streak: self.current_login_streak.try_into()?,
            longest_login_streak: self.longest_login_streak.try_into()?,
            last_login_date: parse_optional_day(self.last_login_date.as_deref())?,
            total_active_days: self.total_active_days.try_into()?,
            games_completed: self.games_completed.try_into()?,
            perfect_game_streak: self.perfect_game_streak.try_into()?,
            total_perfect_games: self.total_perfect_games.try_into()?,
            total_shares: self.total_shares.try_into()?,
            virality_score: self
                .virality_score
                .parse()
                .with_context(|| format!("Bad virality_score: {:?}", self.virality_score))?,
            referrals_completed: self.referrals_completed.try_into()?,
            achievements: AchievementProgress {
                achievement_progress: serde_json::from_str(&self.achievement_progress)
                    .context("Bad achievement_progress")?,
                unlocked_ids: serde_json::from_str(&self.unlocked_ids)
                    .context("Bad unlocked_ids")?,
            },
        })
    }
}

fn parse_optional_day(value: Option<&str>) -> Result<Option<NaiveDate>> {
    match value {
        None => Ok(None),
        Some(s) => parse_day_key(s)
            .map(Some)
            .with_context(|| format!("Bad date: {:?}", s)),
    }
}

impl ProgressionStore for SqliteStore {
    fn load_raw(&self) -> Result<Option<ProgressionState>> {
        let conn = self.db.conn();
        let row = conn
            .query_row(
                r#"SELECT daily_earned, last_reset_date, total_earned,
                          current_login_streak, longest_login_streak, last_login_date, total_active_days,
                          games_completed, perfect_game_streak, total_perfect_games,
                          total_shares, virality_score, referrals_completed,
                          achievement_progress, unlocked_ids
                   FROM progression_state WHERE id = 1"#,
                [],
                |r| {
                    Ok(StateRow {
                        daily_earned: r.get(0)?,
                        last_reset_date: r.get(1)?,
                        total_earned: r.get(2)?,
                        current_login_streak: r.get(3)?,
                        longest_login_streak: r.get(4)?,
                        last_login_date: r.get(5)?,
                        total_active_days: r.get(6)?,
                        games_completed: r.get(7)?,
                        perfect_game_streak: r.get(8)?,
                        total_perfect_games: r.get(9)?,
                        total_shares: r.get(10)?,
                        virality_score: r.get(11)?,
                        referrals_completed: r.get(12)?,
                        achievement_progress: r.get(13)?,
                        unlocked_ids: r.get(14)?,
                    })
                },
            )
            .optional()
            .context("Failed to read progression row")?;
        drop(conn);

        row.map(StateRow::into_state).transpose()
    }

    fn save(&self, state: &ProgressionState) -> Result<()> {
        let progress = serde_json::to_string(&state.achievements.achievement_progress)?;
        let unlocked = serde_json::to_string(&state.achievements.unlocked_ids)?;
        let now = Utc::now().timestamp_millis();

        let conn = self.db.conn();
        conn.execute(
            r#"INSERT OR REPLACE INTO progression_state
               (id, daily_earned, last_reset_date, total_earned,
                current_login_streak, longest_login_streak, last_login_date, total_active_days,
                games_completed, perfect_game_streak, total_perfect_games,
                total_shares, virality_score, referrals_completed,
                achievement_progress, unlocked_ids, updated_at)
               VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)"#,
            rusqlite::params![
                state.daily_earned.to_string(),
                state.last_reset_date.map(day_key),
                state.total_earned.to_string(),
                state.current_login_streak as i64,
                state.longest_login_streak as i64,
                state.last_login_date.map(day_key),
                state.total_active_days as i64,
                state.games_completed as i64,
                state.perfect_game_streak as i64,
                state.total_perfect_games as i64,
                state.total_shares as i64,
                state.virality_score.to_string(),
                state.referrals_completed as i64,
                progress,
                unlocked,
                now,
            ],
        )
        .context("Failed to write progression row")?;

        tracing::debug!("Saved progression to sqlite");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TokenAmount;
    use rust_decimal::Decimal;
    use tempfile::tempdir;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()
    }

    #[test]
    fn test_empty_db_loads_default() {
        let store = SqliteStore::new(ProgressDb::open_in_memory().unwrap());
        assert!(store.load_raw().unwrap().is_none());
        assert_eq!(store.load(today()).last_reset_date, Some(today()));
    }

    #[test]
    fn test_roundtrip_exact() {
        let dir = tempdir().unwrap();
        let store = SqliteStore::open(&dir.path().join("progress.db")).unwrap();

        let mut state = ProgressionState {
            daily_earned: TokenAmount::new(u128::MAX),
            last_reset_date: Some(today()),
            total_earned: TokenAmount::new(10u128.pow(30)),
            current_login_streak: 4,
            longest_login_streak: 9,
            last_login_date: Some(today()),
            total_active_days: 20,
            games_completed: 55,
            perfect_game_streak: 2,
            total_perfect_games: 11,
            total_shares: 3,
            virality_score: Decimal::new(1234, 3),
            referrals_completed: 1,
            ..Default::default()
        };
        state.achievements.unlocked_ids.insert("first_match".to_string());
        state.achievements.achievement_progress.insert("centurion".to_string(), 55);

        store.save(&state).unwrap();
        assert_eq!(store.load_raw().unwrap(), Some(state.clone()));

        // Saving twice keeps one row
        store.save(&state).unwrap();
        let count: i64 = store
            .db()
            .conn()
            .query_row("SELECT COUNT(*) FROM progression_state", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_corrupt_row_falls_back() {
        let store = SqliteStore::new(ProgressDb::open_in_memory().unwrap());
        store
            .db()
            .conn()
            .execute(
                "INSERT INTO progression_state (id, daily_earned, games_completed) VALUES (1, 'lots', 3)",
                [],
            )
            .unwrap();

        assert!(store.load_raw().is_err());
        let state = store.load(today());
        assert_eq!(state.games_completed, 0);
        assert_eq!(state.daily_earned, TokenAmount::ZERO);
    }

    #[test]
    fn test_reopen_keeps_schema_version() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("progress.db");
        drop(ProgressDb::open(&path).unwrap());
        let db = ProgressDb::open(&path).unwrap();
        let version: i32 = db
            .conn()
            .query_row("SELECT MAX(version) FROM schema_version", [], |r| r.get(0))
            .unwrap();
        assert_eq!(version, SCHEMA_VERSION);
    }

    #[test]
    fn test_newer_schema_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("progress.db");
        let db = ProgressDb::open(&path).unwrap();
        db.conn()
            .execute("INSERT INTO schema_version VALUES (?1)", [SCHEMA_VERSION + 1])
            .unwrap();
        drop(db);

        let err = ProgressDb::open(&path).err().unwrap();
        assert!(format!("{:#}", err).contains("newer than supported"));
    }
}
