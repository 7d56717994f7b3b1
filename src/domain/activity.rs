//! Activity evidence types

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Kind of qualifying user action
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    /// Opened the game
    Login,
    /// Finished a matching game
    GameCompleted,
    /// Shared something to a social feed
    SocialShare,
    /// Unlocked an achievement
    Achievement,
    /// Ledger transaction initiated by the user
    Transaction,
}

impl ActivityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::GameCompleted => "game_completed",
            Self::SocialShare => "social_share",
            Self::Achievement => "achievement",
            Self::Transaction => "transaction",
        }
    }

    /// Parse an event kind. Accepts a few aliases used by event producers.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "login" | "daily_login" => Some(Self::Login),
            "game_completed" | "game" | "game_completion" => Some(Self::GameCompleted),
            "social_share" | "share" => Some(Self::SocialShare),
            "achievement" | "achievement_unlocked" => Some(Self::Achievement),
            "transaction" | "tx" => Some(Self::Transaction),
            _ => None,
        }
    }
}

impl std::fmt::Display for ActivityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Timestamp as delivered by an event source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawTimestamp {
    /// Unix epoch milliseconds
    Millis(i64),
    /// RFC 3339 text, e.g. `2024-05-01T09:30:00Z`
    Text(String),
}

/// An event record in the shape an external source hands it over
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawActivityEvent {
    pub kind: String,
    #[serde(default)]
    pub timestamp: Option<RawTimestamp>,
    #[serde(default)]
    pub source_ref: String,
}

impl RawActivityEvent {
    pub fn new(kind: ActivityType, at: DateTime<Utc>, source_ref: impl Into<String>) -> Self {
        Self {
            kind: kind.as_str().to_string(),
            timestamp: Some(RawTimestamp::Millis(at.timestamp_millis())),
            source_ref: source_ref.into(),
        }
    }
}

/// Normalized, de-duplicated evidence of one activity type on one calendar day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub activity_type: ActivityType,
    pub calendar_date: NaiveDate,
    pub timestamp: DateTime<Utc>,
    /// Opaque reference back to the source event
    pub source_ref: String,
}
