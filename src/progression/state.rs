//! Aggregate progression state
//!
//! This is the full persisted record. Computation components read a snapshot
//! of it and return a new one; nothing mutates it in place across components.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::achievements::{AchievementProgress, AchievementStats};
use crate::domain::TokenAmount;

/// Everything persisted per user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProgressionState {
    /// Rewards granted on `last_reset_date`
    pub daily_earned: TokenAmount,
    pub last_reset_date: Option<NaiveDate>,
    /// Lifetime rewards granted
    pub total_earned: TokenAmount,

    pub current_login_streak: u32,
    pub longest_login_streak: u32,
    pub last_login_date: Option<NaiveDate>,
    pub total_active_days: u32,

    pub games_completed: u64,
    /// Consecutive perfect games; reset by any non-perfect game
    pub perfect_game_streak: u32,
    pub total_perfect_games: u64,

    pub total_shares: u64,
    /// Sum of virality scores of all shares
    pub virality_score: Decimal,
    pub referrals_completed: u64,

    #[serde(flatten)]
    pub achievements: AchievementProgress,
}

impl ProgressionState {
    /// Lazily reset the daily counter on the first access after a date change.
    ///
    /// Returns true when a reset happened.
    pub fn roll_over(&mut self, today: NaiveDate) -> bool {
        if self.last_reset_date == Some(today) {
            return false;
        }
        tracing::debug!(
            previous = ?self.last_reset_date,
            %today,
            daily_earned = %self.daily_earned,
            "Resetting daily earnings"
        );
        self.daily_earned = TokenAmount::ZERO;
        self.last_reset_date = Some(today);
        true
    }

    /// Statistics the achievement tracker measures against
    pub fn achievement_stats(&self) -> AchievementStats {
        AchievementStats {
            games_completed: self.games_completed,
            perfect_games: self.total_perfect_games,
            perfect_game_streak: self.perfect_game_streak as u64,
            total_shares: self.total_shares,
            referrals_completed: self.referrals_completed,
            login_streak: self.longest_login_streak as u64,
            active_days: self.total_active_days as u64,
        }
    }

    /// Record a finished game in the running statistics
    pub fn record_game(&mut self, perfect: bool) {
        self.games_completed += 1;
        if perfect {
            self.perfect_game_streak += 1;
            self.total_perfect_games += 1;
        } else {
            self.perfect_game_streak = 0;
        }
    }

    pub fn claimed_login_on(&self, day: NaiveDate) -> bool {
        self.last_login_date == Some(day)
    }
}
