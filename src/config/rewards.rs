//! Reward engine configuration
//!
//! Every value here is read-only input to the reward engine.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::TokenAmount;
use crate::progression::achievements::AchievementTier;

/// Error returned when a reward configuration is not usable
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("login multiplier table is empty")]
    EmptyMultiplierTable,

    #[error("login multiplier at index {0} is negative")]
    NegativeMultiplier(usize),

    #[error("login multiplier table decreases at index {0}")]
    DecreasingMultipliers(usize),

    #[error("tier amounts must increase from bronze to platinum")]
    TierOrder,

    #[error("max_viral_multiplier must not be negative")]
    NegativeViralClamp,

    #[error("invalid achievement registry: {0}")]
    Registry(#[from] crate::progression::achievements::RegistryError),
}

/// Fixed reward per achievement tier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierTable {
    #[serde(default = "default_bronze")]
    pub bronze: TokenAmount,
    #[serde(default = "default_silver")]
    pub silver: TokenAmount,
    #[serde(default = "default_gold")]
    pub gold: TokenAmount,
    #[serde(default = "default_platinum")]
    pub platinum: TokenAmount,
}

impl TierTable {
    pub fn amount(&self, tier: AchievementTier) -> TokenAmount {
        match tier {
            AchievementTier::Bronze => self.bronze,
            AchievementTier::Silver => self.silver,
            AchievementTier::Gold => self.gold,
            AchievementTier::Platinum => self.platinum,
        }
    }
}

impl Default for TierTable {
    fn default() -> Self {
        Self {
            bronze: default_bronze(),
            silver: default_silver(),
            gold: default_gold(),
            platinum: default_platinum(),
        }
    }
}

fn default_bronze() -> TokenAmount {
    TokenAmount::new(10)
}

fn default_silver() -> TokenAmount {
    TokenAmount::new(25)
}

fn default_gold() -> TokenAmount {
    TokenAmount::new(50)
}

fn default_platinum() -> TokenAmount {
    TokenAmount::new(100)
}

/// Base amounts, tables and limits for every reward trigger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardConfig {
    /// Maximum total reward per calendar day
    #[serde(default = "default_daily_cap")]
    pub daily_cap: TokenAmount,

    /// Daily login base amount
    #[serde(default = "default_login_base")]
    pub login_base: TokenAmount,

    /// Streak multipliers indexed by `streak - 1`, clamped at the last entry
    #[serde(default = "default_login_multipliers")]
    pub login_multipliers: Vec<Decimal>,

    /// Paid for every completed game
    #[serde(default = "default_game_completion")]
    pub game_completion: TokenAmount,

    /// Extra for the first game of the calendar day
    #[serde(default = "default_first_game_bonus")]
    pub first_game_bonus: TokenAmount,

    /// Extra for 100% accuracy
    #[serde(default = "default_perfect_game")]
    pub perfect_game: TokenAmount,

    /// Extra for finishing within `speed_threshold_secs`
    #[serde(default = "default_speed_bonus")]
    pub speed_bonus: TokenAmount,

    #[serde(default = "default_speed_threshold_secs")]
    pub speed_threshold_secs: u64,

    /// Base amount for non-referral shares
    #[serde(default = "default_share_base")]
    pub share_base: TokenAmount,

    /// Base amount for referral shares
    #[serde(default = "default_referral_base")]
    pub referral_base: TokenAmount,

    /// Bonus per unit of (clamped) virality score
    #[serde(default = "default_viral_bonus_unit")]
    pub viral_bonus_unit: TokenAmount,

    /// Upper clamp for the virality score
    #[serde(default = "default_max_viral_multiplier")]
    pub max_viral_multiplier: Decimal,

    #[serde(default)]
    pub tiers: TierTable,

    /// Tier used for achievement ids missing from the registry
    #[serde(default = "default_tier")]
    pub default_tier: AchievementTier,
}

fn default_daily_cap() -> TokenAmount {
    TokenAmount::new(1000)
}

fn default_login_base() -> TokenAmount {
    TokenAmount::new(10)
}

fn default_login_multipliers() -> Vec<Decimal> {
    vec![
        Decimal::new(10, 1),
        Decimal::new(10, 1),
        Decimal::new(12, 1),
        Decimal::new(12, 1),
        Decimal::new(15, 1),
        Decimal::new(15, 1),
        Decimal::new(20, 1),
    ]
}

fn default_game_completion() -> TokenAmount {
    TokenAmount::new(5)
}

fn default_first_game_bonus() -> TokenAmount {
    TokenAmount::new(10)
}

fn default_perfect_game() -> TokenAmount {
    TokenAmount::new(15)
}

fn default_speed_bonus() -> TokenAmount {
    TokenAmount::new(10)
}

fn default_speed_threshold_secs() -> u64 {
    30
}

fn default_share_base() -> TokenAmount {
    TokenAmount::new(5)
}

fn default_referral_base() -> TokenAmount {
    TokenAmount::new(25)
}

fn default_viral_bonus_unit() -> TokenAmount {
    TokenAmount::new(2)
}

fn default_max_viral_multiplier() -> Decimal {
    Decimal::new(10, 0)
}

fn default_tier() -> AchievementTier {
    AchievementTier::Bronze
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            daily_cap: default_daily_cap(),
            login_base: default_login_base(),
            login_multipliers: default_login_multipliers(),
            game_completion: default_game_completion(),
            first_game_bonus: default_first_game_bonus(),
            perfect_game: default_perfect_game(),
            speed_bonus: default_speed_bonus(),
            speed_threshold_secs: default_speed_threshold_secs(),
            share_base: default_share_base(),
            referral_base: default_referral_base(),
            viral_bonus_unit: default_viral_bonus_unit(),
            max_viral_multiplier: default_max_viral_multiplier(),
            tiers: TierTable::default(),
            default_tier: default_tier(),
        }
    }
}

impl RewardConfig {
    /// Check the table and clamp invariants the engine relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.login_multipliers.is_empty() {
            return Err(ConfigError::EmptyMultiplierTable);
        }
        for (i, factor) in self.login_multipliers.iter().enumerate() {
            if factor.is_sign_negative() && !factor.is_zero() {
                return Err(ConfigError::NegativeMultiplier(i));
            }
            if i > 0 && *factor < self.login_multipliers[i - 1] {
                return Err(ConfigError::DecreasingMultipliers(i));
            }
        }

        let t = &self.tiers;
        if !(t.bronze < t.silver && t.silver < t.gold && t.gold < t.platinum) {
            return Err(ConfigError::TierOrder);
        }

        if self.max_viral_multiplier.is_sign_negative() && !self.max_viral_multiplier.is_zero() {
            return Err(ConfigError::NegativeViralClamp);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(RewardConfig::default().validate(), Ok(()));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: RewardConfig = toml::from_str(
            r#"
            daily_cap = "500"
            login_multipliers = ["1", "1.5", "3"]

            [tiers]
            gold = 60
            "#,
        )
        .unwrap();

        assert_eq!(config.daily_cap, TokenAmount::new(500));
        assert_eq!(config.login_multipliers, vec![Decimal::new(1, 0), Decimal::new(15, 1), Decimal::new(3, 0)]);
        assert_eq!(config.tiers.gold, TokenAmount::new(60));
        assert_eq!(config.tiers.silver, TokenAmount::new(25));
        assert_eq!(config.referral_base, TokenAmount::new(25));
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_validate_rejects_bad_tables() {
        let mut config = RewardConfig::default();
        config.login_multipliers.clear();
        assert_eq!(config.validate(), Err(ConfigError::EmptyMultiplierTable));

        config.login_multipliers = vec![Decimal::new(2, 0), Decimal::new(1, 0)];
        assert_eq!(config.validate(), Err(ConfigError::DecreasingMultipliers(1)));

        config.login_multipliers = vec![Decimal::new(-1, 0)];
        assert_eq!(config.validate(), Err(ConfigError::NegativeMultiplier(0)));

        let mut config = RewardConfig::default();
        config.tiers.silver = config.tiers.gold;
        assert_eq!(config.validate(), Err(ConfigError::TierOrder));

        let mut config = RewardConfig::default();
        config.max_viral_multiplier = Decimal::new(-5, 0);
        assert_eq!(config.validate(), Err(ConfigError::NegativeViralClamp));
    }
}
