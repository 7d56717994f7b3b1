//! Reward engine
//!
//! Computes reward events for each trigger and enforces the daily earning cap
//! over a batch by scaling every reward down proportionally. Nothing here has
//! side effects; configuration is read-only input.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::achievements::AchievementRegistry;
use crate::config::RewardConfig;
use crate::domain::{mul_div, RewardEvent, RewardKind, TokenAmount};

/// Outcome of a finished game, as reported by the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameResult {
    /// Accuracy in percent; 100 or more counts as perfect
    pub accuracy_pct: Decimal,
    pub duration_secs: u64,
    /// Caller asserts this is the first completion of the calendar day
    pub first_today: bool,
}

impl GameResult {
    pub fn is_perfect(&self) -> bool {
        self.accuracy_pct >= Decimal::ONE_HUNDRED
    }
}

/// What was shared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShareKind {
    Referral,
    GameResult,
    Achievement,
    Collectible,
}

impl ShareKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Referral => "referral",
            Self::GameResult => "game_result",
            Self::Achievement => "achievement",
            Self::Collectible => "collectible",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "referral" => Some(Self::Referral),
            "game_result" | "game" => Some(Self::GameResult),
            "achievement" => Some(Self::Achievement),
            "collectible" | "nft" => Some(Self::Collectible),
            _ => None,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Referral => "referral",
            Self::GameResult => "game result",
            Self::Achievement => "achievement",
            Self::Collectible => "collectible",
        }
    }
}

/// A social share with its externally computed virality score
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareEvent {
    pub kind: ShareKind,
    pub virality_score: Decimal,
}

/// Input to the reward engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RewardTrigger {
    Login { streak: u32 },
    GameCompleted(GameResult),
    Share(ShareEvent),
    Achievement { id: String },
}

/// Rewards after cap enforcement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewardBatch {
    pub rewards: Vec<RewardEvent>,
    pub new_daily_earned: TokenAmount,
    pub cap_reached: bool,
}

impl RewardBatch {
    /// Sum of the amounts actually granted
    pub fn granted(&self) -> TokenAmount {
        self.rewards.iter().map(|r| r.amount).sum()
    }
}

/// Daily login reward for a streak of `streak` days.
///
/// The multiplier index is clamped to the table, so streaks longer than the
/// table earn the last factor.
pub fn login_reward(streak: u32, config: &RewardConfig) -> RewardEvent {
    let last = config.login_multipliers.len().saturating_sub(1);
    let index = (streak.saturating_sub(1) as usize).min(last);
    let multiplier = config
        .login_multipliers
        .get(index)
        .copied()
        .unwrap_or(Decimal::ONE);

    let amount = config.login_base.apply_factor(multiplier);
    RewardEvent::new(
        RewardKind::Login,
        amount,
        format!("Daily login bonus (day {})", streak.max(1)),
    )
    .with_multiplier(multiplier)
}

/// Rewards for one completed game: base plus up to three independent bonuses.
pub fn game_rewards(game: &GameResult, config: &RewardConfig) -> Vec<RewardEvent> {
    let mut rewards = vec![RewardEvent::new(
        RewardKind::GameCompletion,
        config.game_completion,
        "Game completed",
    )];

    if game.first_today {
        rewards.push(RewardEvent::new(
            RewardKind::GameCompletion,
            config.first_game_bonus,
            "First game of the day",
        ));
    }

    if game.is_perfect() {
        rewards.push(RewardEvent::new(
            RewardKind::PerfectGame,
            config.perfect_game,
            "Perfect accuracy",
        ));
    }

    if game.duration_secs <= config.speed_threshold_secs {
        rewards.push(RewardEvent::new(
            RewardKind::SpeedBonus,
            config.speed_bonus,
            format!("Speed bonus ({}s)", game.duration_secs),
        ));
    }

    rewards
}

/// Reward for a share: kind-specific base plus a clamped virality bonus.
pub fn share_reward(share: &ShareEvent, config: &RewardConfig) -> RewardEvent {
    let base = match share.kind {
        ShareKind::Referral => config.referral_base,
        _ => config.share_base,
    };

    let clamped = share
        .virality_score
        .max(Decimal::ZERO)
        .min(config.max_viral_multiplier);
    let bonus = config.viral_bonus_unit.apply_factor(clamped);

    let description = if bonus.is_zero() {
        format!("Shared {}", share.kind.label())
    } else {
        format!("Shared {} (+{} virality bonus)", share.kind.label(), bonus)
    };

    RewardEvent::new(RewardKind::SocialShare, base.saturating_add(bonus), description)
        .with_multiplier(clamped)
}

/// Reward for an unlocked achievement.
///
/// Ids missing from the registry fall back to the configured default tier.
pub fn achievement_reward(id: &str, registry: &AchievementRegistry, config: &RewardConfig) -> RewardEvent {
    match registry.get(id) {
        Some(def) => {
            let amount = def
                .reward_amount
                .unwrap_or_else(|| config.tiers.amount(def.tier));
            RewardEvent::new(
                RewardKind::Achievement,
                amount,
                format!("Achievement unlocked: {} ({})", def.name, def.tier),
            )
        }
        None => {
            tracing::warn!(id, tier = %config.default_tier, "Unknown achievement id, using default tier");
            RewardEvent::new(
                RewardKind::Achievement,
                config.tiers.amount(config.default_tier),
                format!("Achievement unlocked: {} ({})", id, config.default_tier),
            )
        }
    }
}

/// Expand triggers into uncapped reward events, in trigger order.
pub fn rewards_for(
    triggers: &[RewardTrigger],
    registry: &AchievementRegistry,
    config: &RewardConfig,
) -> Vec<RewardEvent> {
    let mut rewards = Vec::new();
    for trigger in triggers {
        match trigger {
            RewardTrigger::Login { streak } => rewards.push(login_reward(*streak, config)),
            RewardTrigger::GameCompleted(game) => rewards.extend(game_rewards(game, config)),
            RewardTrigger::Share(share) => rewards.push(share_reward(share, config)),
            RewardTrigger::Achievement { id } => {
                rewards.push(achievement_reward(id, registry, config))
            }
        }
    }
    rewards
}

/// Compute all rewards for one logical operation and apply the daily cap.
pub fn compute_rewards(
    triggers: &[RewardTrigger],
    registry: &AchievementRegistry,
    config: &RewardConfig,
    prior_daily_earned: TokenAmount,
) -> RewardBatch {
    let rewards = rewards_for(triggers, registry, config);
    enforce_daily_cap(rewards, prior_daily_earned, config.daily_cap)
}

/// Apply the daily cap to a batch.
///
/// A batch that fits is committed unchanged. Otherwise every reward is scaled
/// by `headroom / batch_total` with exact integer arithmetic, and the
/// truncation leftover goes to the largest remainders (earlier rewards win
/// ties), so the scaled batch sums to exactly the headroom. Rewards scaled to
/// zero are still returned.
pub fn enforce_daily_cap(
    mut rewards: Vec<RewardEvent>,
    prior_daily_earned: TokenAmount,
    daily_cap: TokenAmount,
) -> RewardBatch {
    let total = rewards
        .iter()
        .try_fold(TokenAmount::ZERO, |acc, r| acc.checked_add(r.amount));

    if let Some(new_total) = total
        .and_then(|t| prior_daily_earned.checked_add(t))
        .filter(|t| *t <= daily_cap)
    {
        return RewardBatch {
            rewards,
            new_daily_earned: new_total,
            cap_reached: new_total == daily_cap,
        };
    }

    let headroom = daily_cap.saturating_sub(prior_daily_earned);
    scale_to_headroom(&mut rewards, headroom);

    tracing::debug!(
        %prior_daily_earned,
        %daily_cap,
        total = ?total.map(|t| t.get()),
        %headroom,
        "Daily cap reached, scaled reward batch"
    );

    RewardBatch {
        rewards,
        new_daily_earned: daily_cap.max(prior_daily_earned),
        cap_reached: true,
    }
}

/// Shift every amount right by the fewest bits that make their sum fit in
/// `u128`. Returns the shifted weights and their sum.
fn scaling_weights(amounts: &[u128]) -> (Vec<u128>, u128) {
    for shift in 0..u128::BITS {
        let weights: Vec<u128> = amounts.iter().map(|a| a >> shift).collect();
        if let Some(total) = weights.iter().try_fold(0u128, |acc, w| acc.checked_add(*w)) {
            return (weights, total);
        }
    }
    (vec![0; amounts.len()], 0)
}

/// Scale a batch whose total exceeds `headroom` so it sums to exactly `headroom`.
fn scale_to_headroom(rewards: &mut [RewardEvent], headroom: TokenAmount) {
    let h = headroom.get();
    let originals: Vec<u128> = rewards.iter().map(|r| r.amount.get()).collect();
    let (weights, t) = scaling_weights(&originals);

    if t == 0 {
        return;
    }

    let mut remainders = Vec::with_capacity(rewards.len());
    let mut granted: u128 = 0;
    for (i, reward) in rewards.iter_mut().enumerate() {
        let (quotient, remainder) = mul_div(weights[i], h, t).unwrap_or((0, 0));
        let quotient = quotient.min(originals[i]);
        reward.amount = TokenAmount::new(quotient);
        granted = granted.saturating_add(quotient);
        remainders.push((remainder, i));
    }
    debug_assert!(granted <= h, "scaled batch {} exceeds headroom {}", granted, h);

    let mut leftover = h.saturating_sub(granted);
    remainders.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
    for (remainder, i) in remainders {
        if leftover == 0 || remainder == 0 {
            break;
        }
        if rewards[i].amount.get() < originals[i] {
            rewards[i].amount = rewards[i].amount.saturating_add(TokenAmount::new(1));
            leftover -= 1;
        }
    }

    // Weights from shifted amounts can lose more than one unit per reward;
    // hand the rest out in order, never above the original amount.
    for (reward, original) in rewards.iter_mut().zip(&originals) {
        if leftover == 0 {
            break;
        }
        let extra = (original - reward.amount.get()).min(leftover);
        reward.amount = reward.amount.saturating_add(TokenAmount::new(extra));
        leftover -= extra;
    }

    mark_scaled(rewards, &originals);
}

fn mark_scaled(rewards: &mut [RewardEvent], originals: &[u128]) {
    for (reward, &original) in rewards.iter_mut().zip(originals) {
        if reward.amount.get() != original {
            reward.scaled_from = Some(TokenAmount::new(original));
        }
    }
}
