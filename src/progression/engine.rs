//! Progression operations
//!
//! Each operation takes a state snapshot and returns the next one together with
//! the granted rewards. The flow is always the same:
//!
//! 1. lazy daily rollover
//! 2. update running statistics
//! 3. evaluate achievements against the updated statistics
//! 4. trigger rewards and achievement rewards go through one cap batch
//! 5. commit `daily_earned` and `total_earned`

use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::achievements::{self, AchievementDefinition, AchievementRegistry};
use super::rewards::{self, GameResult, RewardTrigger, ShareEvent, ShareKind};
use super::state::ProgressionState;
use super::streaks::StreakState;
use crate::config::RewardConfig;
use crate::domain::{RewardEvent, TokenAmount};

/// Result of one operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub state: ProgressionState,
    pub rewards: Vec<RewardEvent>,
    pub unlocked: Vec<AchievementDefinition>,
    pub cap_reached: bool,
}

impl Outcome {
    pub fn granted(&self) -> TokenAmount {
        self.rewards.iter().map(|r| r.amount).sum()
    }
}

/// Stateless operation runner over a config and registry
#[derive(Debug, Clone, Copy)]
pub struct ProgressionEngine<'a> {
    config: &'a RewardConfig,
    registry: &'a AchievementRegistry,
}

impl<'a> ProgressionEngine<'a> {
    pub fn new(config: &'a RewardConfig, registry: &'a AchievementRegistry) -> Self {
        Self { config, registry }
    }

    /// Daily login. Rewarded at most once per calendar day.
    ///
    /// `streak` is the activity streak from the last good fetch. Without one,
    /// the stored login streak is carried forward instead of restarting.
    pub fn login(
        &self,
        state: &ProgressionState,
        streak: Option<&StreakState>,
        today: NaiveDate,
    ) -> Outcome {
        let mut next = state.clone();
        next.roll_over(today);

        let already_claimed = next.claimed_login_on(today);

        // Logging in is itself activity, so the streak is at least one day.
        let (current, longest, active_days) = match streak {
            Some(streak) => (
                streak.current_streak.max(1),
                streak.longest_streak,
                streak.total_active_days,
            ),
            None => {
                let current = carried_login_streak(&next, today);
                let active_days = if already_claimed {
                    next.total_active_days
                } else {
                    next.total_active_days.saturating_add(1)
                };
                tracing::debug!(current, "No activity streak, carrying stored login streak");
                (current, 0, active_days)
            }
        };

        next.current_login_streak = current;
        next.longest_login_streak = next.longest_login_streak.max(longest).max(current);
        next.total_active_days = next.total_active_days.max(active_days).max(1);
        next.last_login_date = Some(today);

        let triggers = if already_claimed {
            tracing::debug!(%today, "Login reward already claimed today");
            Vec::new()
        } else {
            vec![RewardTrigger::Login { streak: current }]
        };

        self.finish(next, triggers)
    }

    pub fn game_completed(
        &self,
        state: &ProgressionState,
        game: &GameResult,
        today: NaiveDate,
    ) -> Outcome {
        let mut next = state.clone();
        next.roll_over(today);
        next.record_game(game.is_perfect());

        self.finish(next, vec![RewardTrigger::GameCompleted(game.clone())])
    }

    pub fn shared(&self, state: &ProgressionState, share: &ShareEvent, today: NaiveDate) -> Outcome {
        let mut next = state.clone();
        next.roll_over(today);

        next.total_shares += 1;
        if share.kind == ShareKind::Referral {
            next.referrals_completed += 1;
        }
        next.virality_score = next
            .virality_score
            .checked_add(share.virality_score.max(Decimal::ZERO))
            .unwrap_or(Decimal::MAX);

        self.finish(next, vec![RewardTrigger::Share(share.clone())])
    }

    fn finish(&self, mut next: ProgressionState, mut triggers: Vec<RewardTrigger>) -> Outcome {
        let evaluation = achievements::evaluate(
            self.registry,
            &next.achievement_stats(),
            &next.achievements,
        );
        next.achievements = evaluation.updated;

        triggers.extend(
            evaluation
                .newly_unlocked
                .iter()
                .map(|def| RewardTrigger::Achievement { id: def.id.clone() }),
        );

        let batch = rewards::compute_rewards(&triggers, self.registry, self.config, next.daily_earned);
        let granted = batch.granted();

        next.daily_earned = batch.new_daily_earned;
        next.total_earned = next.total_earned.saturating_add(granted);

        if !granted.is_zero() {
            tracing::info!(
                %granted,
                daily_earned = %next.daily_earned,
                cap_reached = batch.cap_reached,
                "Rewards granted"
            );
        }

        Outcome {
            state: next,
            rewards: batch.rewards,
            unlocked: evaluation.newly_unlocked,
            cap_reached: batch.cap_reached,
        }
    }
}

/// Login streak derived from the stored state alone
fn carried_login_streak(state: &ProgressionState, today: NaiveDate) -> u32 {
    let stored = state.current_login_streak;
    match state.last_login_date {
        Some(last) if last == today => stored.max(1),
        Some(last) if today.pred_opt() == Some(last) => stored.saturating_add(1),
        _ => 1,
    }
}
