//! Configuration loading and management

mod io;
mod rewards;

pub use rewards::{ConfigError, RewardConfig, TierTable};

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};

use crate::progression::{calendar, AchievementDefinition, AchievementRegistry, RetryPolicy};

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Reward amounts, multiplier tables and the daily cap
    #[serde(default)]
    pub rewards: RewardConfig,

    /// Calendar day boundaries
    #[serde(default)]
    pub calendar: CalendarSettings,

    /// Where progression is persisted
    #[serde(default)]
    pub store: StoreSettings,

    /// Activity fetch retries
    #[serde(default)]
    pub fetch: FetchSettings,

    /// Replaces the built-in achievement set when non-empty
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub achievements: Vec<AchievementDefinition>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarSettings {
    /// Offset from UTC, in minutes, that defines the user's calendar day
    #[serde(default)]
    pub utc_offset_minutes: i32,
}

impl CalendarSettings {
    pub fn offset(&self) -> FixedOffset {
        calendar::offset_from_minutes(self.utc_offset_minutes)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Json,
    Sqlite,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSettings {
    #[serde(default)]
    pub backend: StoreBackend,

    /// Explicit progression file; defaults to a file in the data directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl StoreSettings {
    /// Progression file for this backend under `data_dir`
    pub fn progress_path(&self, data_dir: &Path) -> PathBuf {
        match (&self.path, self.backend) {
            (Some(path), _) => path.clone(),
            (None, StoreBackend::Json) => data_dir.join("progress.json"),
            (None, StoreBackend::Sqlite) => data_dir.join("progress.db"),
        }
    }

    /// SQLite file holding the activity log
    pub fn activity_db_path(&self, data_dir: &Path) -> PathBuf {
        match self.backend {
            StoreBackend::Sqlite => self.progress_path(data_dir),
            StoreBackend::Json => data_dir.join("activity.db"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchSettings {
    #[serde(default = "default_attempts")]
    pub attempts: u32,

    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
}

fn default_attempts() -> u32 {
    3
}

fn default_backoff_ms() -> u64 {
    250
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            attempts: default_attempts(),
            backoff_ms: default_backoff_ms(),
        }
    }
}

impl FetchSettings {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            attempts: self.attempts.max(1),
            backoff: Duration::from_millis(self.backoff_ms),
        }
    }
}

impl Config {
    /// Achievement registry in effect: the configured set, or the built-in one
    pub fn registry(&self) -> Result<AchievementRegistry, ConfigError> {
        if self.achievements.is_empty() {
            return Ok(AchievementRegistry::builtin().clone());
        }
        Ok(AchievementRegistry::new(self.achievements.clone())?)
    }

    /// Validate everything the engine depends on
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.rewards.validate()?;
        self.registry()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TokenAmount;
    use crate::progression::{AchievementCategory, AchievementMetric, AchievementTier, RegistryError};

    #[test]
    fn test_empty_toml_is_default() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.registry().unwrap().len(), AchievementRegistry::builtin().len());
    }

    #[test]
    fn test_partial_toml() {
        let config: Config = toml::from_str(
            r#"
            [rewards]
            daily_cap = "500000000000000000000"
            login_multipliers = [1.0, 1.25, 2.0]

            [calendar]
            utc_offset_minutes = -300

            [store]
            backend = "sqlite"
            "#,
        )
        .unwrap();

        assert_eq!(config.rewards.daily_cap, TokenAmount::new(500_000_000_000_000_000_000));
        assert_eq!(config.rewards.login_multipliers.len(), 3);
        assert_eq!(config.rewards.login_base.get(), 10);
        assert_eq!(config.calendar.offset().local_minus_utc(), -300 * 60);
        assert_eq!(
            config.store.progress_path(Path::new("/data")),
            PathBuf::from("/data/progress.db")
        );
        assert_eq!(config.fetch.retry_policy().attempts, 3);
    }

    #[test]
    fn test_custom_achievements_replace_builtin() {
        let config: Config = toml::from_str(
            r#"
            [[achievements]]
            id = "marathon"
            name = "Marathon"
            category = "gameplay"
            tier = "gold"
            metric = "games_completed"
            target = 42
            reward_amount = 77
            "#,
        )
        .unwrap();

        let registry = config.registry().unwrap();
        assert_eq!(registry.len(), 1);
        let def = registry.get("marathon").unwrap();
        assert_eq!(def.category, AchievementCategory::Gameplay);
        assert_eq!(def.tier, AchievementTier::Gold);
        assert_eq!(def.metric, AchievementMetric::GamesCompleted);
        assert_eq!(def.reward_amount, Some(TokenAmount::new(77)));
    }

    #[test]
    fn test_duplicate_achievement_rejected() {
        let def = AchievementRegistry::builtin().get("first_match").unwrap().clone();
        let config = Config {
            achievements: vec![def.clone(), def],
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::Registry(RegistryError::DuplicateId(
                "first_match".to_string()
            )))
        );
    }
}
