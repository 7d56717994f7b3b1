//! Achievements: static registry plus progress evaluation
//!
//! The tracker only decides what unlocks. Turning unlocks into rewards is left
//! to the caller so both halves stay independently testable.

mod definitions;
mod tracker;

pub use definitions::{
    AchievementCategory, AchievementDefinition, AchievementMetric, AchievementRegistry,
    AchievementTier, RegistryError,
};
pub use tracker::{evaluate, AchievementProgress, AchievementStats, Evaluation};
