//! Achievement definitions and metadata
//!
//! The registry is static configuration: the crate ships a default set and the
//! config file may replace it.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::domain::TokenAmount;

/// Achievement category for grouping in UI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AchievementCategory {
    Gameplay,
    Mastery,
    Social,
    Dedication,
}

impl AchievementCategory {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Gameplay => "Gameplay",
            Self::Mastery => "Mastery",
            Self::Social => "Social",
            Self::Dedication => "Dedication",
        }
    }
}

/// Ordinal reward bracket
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AchievementTier {
    Bronze,
    Silver,
    Gold,
    Platinum,
}

impl AchievementTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bronze => "bronze",
            Self::Silver => "silver",
            Self::Gold => "gold",
            Self::Platinum => "platinum",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "bronze" => Some(Self::Bronze),
            "silver" => Some(Self::Silver),
            "gold" => Some(Self::Gold),
            "platinum" => Some(Self::Platinum),
            _ => None,
        }
    }
}

impl std::fmt::Display for AchievementTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Running statistic an achievement's progress is read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AchievementMetric {
    GamesCompleted,
    PerfectGames,
    PerfectGameStreak,
    TotalShares,
    ReferralsCompleted,
    LoginStreak,
    ActiveDays,
}

/// Achievement definition with all metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AchievementDefinition {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category: AchievementCategory,
    pub tier: AchievementTier,
    pub metric: AchievementMetric,
    pub target: u64,
    /// Overrides the tier table amount when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reward_amount: Option<TokenAmount>,
}

/// Error building a registry
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("duplicate achievement id: {0}")]
    DuplicateId(String),

    #[error("achievement {0} has a zero target")]
    ZeroTarget(String),
}

/// Lookup table of achievement definitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AchievementRegistry {
    definitions: Vec<AchievementDefinition>,
}

impl AchievementRegistry {
    pub fn new(definitions: Vec<AchievementDefinition>) -> Result<Self, RegistryError> {
        let mut seen = HashSet::new();
        for def in &definitions {
            if !seen.insert(def.id.as_str()) {
                return Err(RegistryError::DuplicateId(def.id.clone()));
            }
            if def.target == 0 {
                return Err(RegistryError::ZeroTarget(def.id.clone()));
            }
        }
        Ok(Self { definitions })
    }

    /// The built-in achievement set
    pub fn builtin() -> &'static AchievementRegistry {
        &BUILTIN
    }

    pub fn get(&self, id: &str) -> Option<&AchievementDefinition> {
        self.definitions.iter().find(|d| d.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AchievementDefinition> {
        self.definitions.iter()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

static BUILTIN: Lazy<AchievementRegistry> = Lazy::new(|| AchievementRegistry {
    definitions: BUILTIN_ACHIEVEMENTS.iter().map(BuiltinAchievement::to_definition).collect(),
});

/// Compile-time form of a built-in definition
struct BuiltinAchievement {
    id: &'static str,
    name: &'static str,
    description: &'static str,
    category: AchievementCategory,
    tier: AchievementTier,
    metric: AchievementMetric,
    target: u64,
}

impl BuiltinAchievement {
    fn to_definition(&self) -> AchievementDefinition {
        AchievementDefinition {
            id: self.id.to_string(),
            name: self.name.to_string(),
            description: self.description.to_string(),
            category: self.category,
            tier: self.tier,
            metric: self.metric,
            target: self.target,
            reward_amount: None,
        }
    }
}

/// All built-in achievement definitions
static BUILTIN_ACHIEVEMENTS: &[BuiltinAchievement] = &[
    // === GAMEPLAY ===
    BuiltinAchievement {
        id: "first_match",
        name: "First Match",
        description: "Complete your first game",
        category: AchievementCategory::Gameplay,
        tier: AchievementTier::Bronze,
        metric: AchievementMetric::GamesCompleted,
        target: 1,
    },
    BuiltinAchievement {
        id: "regular",
        name: "Regular",
        description: "Complete 10 games",
        category: AchievementCategory::Gameplay,
        tier: AchievementTier::Silver,
        metric: AchievementMetric::GamesCompleted,
        target: 10,
    },
    BuiltinAchievement {
        id: "centurion",
        name: "Centurion",
        description: "Complete 100 games",
        category: AchievementCategory::Gameplay,
        tier: AchievementTier::Gold,
        metric: AchievementMetric::GamesCompleted,
        target: 100,
    },
    // === MASTERY ===
    BuiltinAchievement {
        id: "sharp_eye",
        name: "Sharp Eye",
        description: "Finish a game with perfect accuracy",
        category: AchievementCategory::Mastery,
        tier: AchievementTier::Bronze,
        metric: AchievementMetric::PerfectGames,
        target: 1,
    },
    BuiltinAchievement {
        id: "hot_hand",
        name: "Hot Hand",
        description: "Three perfect games in a row",
        category: AchievementCategory::Mastery,
        tier: AchievementTier::Silver,
        metric: AchievementMetric::PerfectGameStreak,
        target: 3,
    },
    BuiltinAchievement {
        id: "untouchable",
        name: "Untouchable",
        description: "Ten perfect games in a row",
        category: AchievementCategory::Mastery,
        tier: AchievementTier::Platinum,
        metric: AchievementMetric::PerfectGameStreak,
        target: 10,
    },
    BuiltinAchievement {
        id: "perfectionist",
        name: "Perfectionist",
        description: "Finish 25 perfect games",
        category: AchievementCategory::Mastery,
        tier: AchievementTier::Gold,
        metric: AchievementMetric::PerfectGames,
        target: 25,
    },
    // === SOCIAL ===
    BuiltinAchievement {
        id: "first_share",
        name: "Show-Off",
        description: "Share something for the first time",
        category: AchievementCategory::Social,
        tier: AchievementTier::Bronze,
        metric: AchievementMetric::TotalShares,
        target: 1,
    },
    BuiltinAchievement {
        id: "influencer",
        name: "Influencer",
        description: "Share 25 times",
        category: AchievementCategory::Social,
        tier: AchievementTier::Gold,
        metric: AchievementMetric::TotalShares,
        target: 25,
    },
    BuiltinAchievement {
        id: "recruiter",
        name: "Recruiter",
        description: "Complete 5 referrals",
        category: AchievementCategory::Social,
        tier: AchievementTier::Gold,
        metric: AchievementMetric::ReferralsCompleted,
        target: 5,
    },
    // === DEDICATION ===
    BuiltinAchievement {
        id: "on_fire",
        name: "On Fire",
        description: "Log in 3 days in a row",
        category: AchievementCategory::Dedication,
        tier: AchievementTier::Bronze,
        metric: AchievementMetric::LoginStreak,
        target: 3,
    },
    BuiltinAchievement {
        id: "week_warrior",
        name: "Week Warrior",
        description: "Log in 7 days in a row",
        category: AchievementCategory::Dedication,
        tier: AchievementTier::Silver,
        metric: AchievementMetric::LoginStreak,
        target: 7,
    },
    BuiltinAchievement {
        id: "monthly_master",
        name: "Monthly Master",
        description: "Log in 30 days in a row",
        category: AchievementCategory::Dedication,
        tier: AchievementTier::Platinum,
        metric: AchievementMetric::LoginStreak,
        target: 30,
    },
    BuiltinAchievement {
        id: "seasoned",
        name: "Seasoned",
        description: "Be active on 50 different days",
        category: AchievementCategory::Dedication,
        tier: AchievementTier::Gold,
        metric: AchievementMetric::ActiveDays,
        target: 50,
    },
];
