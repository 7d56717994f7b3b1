//! CLI command implementations

pub mod game;
pub mod init;
pub mod login;
pub mod share;
pub mod status;
pub mod streak;

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{FixedOffset, NaiveDate, Utc};

use streakcap::config::{Config, StoreBackend};
use streakcap::progression::{
    calendar, ActivityLog, ActivityNormalizer, JsonFileStore, Outcome, ProgressDb,
    ProgressionService, ProgressionStore, RefreshStatus, SqliteStore, StreakTracker,
};
use streakcap::{ActivityType, RawActivityEvent};

/// Loaded config plus resolved locations, shared by every command
pub struct AppContext {
    pub config: Config,
    pub data_dir: PathBuf,
    pub offset: FixedOffset,
}

impl AppContext {
    pub fn load(config_path: Option<PathBuf>, data_dir: Option<PathBuf>) -> Result<Self> {
        let config = match config_path {
            Some(path) => Config::load_from(&path)?,
            None => Config::load()?,
        };
        let data_dir = data_dir.unwrap_or_else(Config::global_config_dir);
        let offset = config.calendar.offset();

        Ok(Self {
            config,
            data_dir,
            offset,
        })
    }

    pub fn today(&self) -> NaiveDate {
        calendar::today(self.offset)
    }

    /// Progression service over the configured backend
    pub fn service(&self) -> Result<ProgressionService<Box<dyn ProgressionStore>>> {
        let path = self.config.store.progress_path(&self.data_dir);
        let store: Box<dyn ProgressionStore> = match self.config.store.backend {
            StoreBackend::Json => Box::new(JsonFileStore::new(path)),
            StoreBackend::Sqlite => Box::new(SqliteStore::open(&path)?),
        };
        let registry = self.config.registry()?;

        Ok(ProgressionService::new(
            store,
            self.config.rewards.clone(),
            registry,
        ))
    }

    pub fn activity_log(&self) -> Result<ActivityLog> {
        let path = self.config.store.activity_db_path(&self.data_dir);
        let db = ProgressDb::open(&path)
            .with_context(|| format!("Failed to open activity log: {}", path.display()))?;
        Ok(ActivityLog::new(db))
    }

    /// Append an activity of `activity_type` happening now
    pub fn record_activity(&self, log: &ActivityLog, activity_type: ActivityType, source_ref: &str) -> Result<()> {
        log.append(&RawActivityEvent::new(activity_type, Utc::now(), source_ref))
    }

    /// Tracker refreshed from the activity log
    pub async fn refreshed_tracker(&self, log: &ActivityLog) -> StreakTracker {
        let mut tracker = StreakTracker::new(ActivityNormalizer::new(self.offset));
        let status = tracker
            .refresh(log, self.config.fetch.retry_policy(), self.today())
            .await;
        match status {
            RefreshStatus::Fresh => {}
            RefreshStatus::Stale { error } | RefreshStatus::Unavailable { error } => {
                eprintln!("Warning: activity history unavailable ({})", error);
            }
        }
        tracker
    }
}

/// Print the rewards and unlocks of one operation
pub fn print_outcome(outcome: &Outcome, daily_cap: streakcap::TokenAmount) {
    if outcome.rewards.is_empty() {
        println!("No rewards.");
    }

    for reward in &outcome.rewards {
        match reward.scaled_from {
            Some(original) => println!(
                "  +{} {} (capped from {})",
                reward.amount, reward.description, original
            ),
            None => println!("  +{} {}", reward.amount, reward.description),
        }
    }

    for def in &outcome.unlocked {
        println!("  Unlocked: {} [{}] - {}", def.name, def.tier, def.description);
    }

    println!(
        "Today: {} / {}{}",
        outcome.state.daily_earned,
        daily_cap,
        if outcome.cap_reached { " (daily cap reached)" } else { "" }
    );
}
