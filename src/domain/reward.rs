//! Reward events emitted by the reward engine

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::amount::TokenAmount;

/// Trigger that produced a reward
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RewardKind {
    Login,
    GameCompletion,
    PerfectGame,
    SpeedBonus,
    SocialShare,
    Achievement,
}

impl RewardKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::GameCompletion => "gameCompletion",
            Self::PerfectGame => "perfectGame",
            Self::SpeedBonus => "speedBonus",
            Self::SocialShare => "socialShare",
            Self::Achievement => "achievement",
        }
    }
}

impl std::fmt::Display for RewardKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single granted (or cap-reduced) reward
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardEvent {
    pub kind: RewardKind,
    pub amount: TokenAmount,
    pub description: String,
    /// Factor applied to the base amount, when one was
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multiplier: Option<Decimal>,
    /// Amount before the daily cap scaled this reward down
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scaled_from: Option<TokenAmount>,
}

impl RewardEvent {
    pub fn new(kind: RewardKind, amount: TokenAmount, description: impl Into<String>) -> Self {
        Self {
            kind,
            amount,
            description: description.into(),
            multiplier: None,
            scaled_from: None,
        }
    }

    pub fn with_multiplier(mut self, multiplier: Decimal) -> Self {
        self.multiplier = Some(multiplier);
        self
    }

    /// Whether the daily cap reduced this reward
    pub fn was_capped(&self) -> bool {
        self.scaled_from.is_some()
    }
}
