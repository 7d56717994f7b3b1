//! Achievement evaluation
//!
//! Progress is recomputed from authoritative running statistics on every
//! evaluation; stored progress values are display-only and never incremented.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::definitions::{AchievementDefinition, AchievementMetric, AchievementRegistry};

/// Running statistics achievements are measured against
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AchievementStats {
    pub games_completed: u64,
    pub perfect_games: u64,
    pub perfect_game_streak: u64,
    pub total_shares: u64,
    pub referrals_completed: u64,
    pub login_streak: u64,
    pub active_days: u64,
}

impl AchievementStats {
    pub fn value(&self, metric: AchievementMetric) -> u64 {
        match metric {
            AchievementMetric::GamesCompleted => self.games_completed,
            AchievementMetric::PerfectGames => self.perfect_games,
            AchievementMetric::PerfectGameStreak => self.perfect_game_streak,
            AchievementMetric::TotalShares => self.total_shares,
            AchievementMetric::ReferralsCompleted => self.referrals_completed,
            AchievementMetric::LoginStreak => self.login_streak,
            AchievementMetric::ActiveDays => self.active_days,
        }
    }
}

/// Per-user achievement progress
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementProgress {
    /// Last computed progress per locked achievement
    #[serde(default)]
    pub achievement_progress: BTreeMap<String, u64>,
    /// Unlocked achievement ids; append-only
    #[serde(default)]
    pub unlocked_ids: BTreeSet<String>,
}

impl AchievementProgress {
    pub fn is_unlocked(&self, id: &str) -> bool {
        self.unlocked_ids.contains(id)
    }
}

/// Outcome of one evaluation
#[derive(Debug, Clone, Default)]
pub struct Evaluation {
    pub updated: AchievementProgress,
    /// Achievements unlocked by this call only
    pub newly_unlocked: Vec<AchievementDefinition>,
}

/// Evaluate every locked achievement against `stats`.
pub fn evaluate(
    registry: &AchievementRegistry,
    stats: &AchievementStats,
    prior: &AchievementProgress,
) -> Evaluation {
    let mut updated = prior.clone();
    let mut newly_unlocked = Vec::new();

    for def in registry.iter() {
        if updated.is_unlocked(&def.id) {
            continue;
        }

        let progress = stats.value(def.metric);
        if progress >= def.target {
            tracing::info!(id = %def.id, tier = %def.tier, "Achievement unlocked");
            updated.unlocked_ids.insert(def.id.clone());
            updated.achievement_progress.insert(def.id.clone(), def.target);
            newly_unlocked.push(def.clone());
        } else {
            updated.achievement_progress.insert(def.id.clone(), progress);
        }
    }

    Evaluation {
        updated,
        newly_unlocked,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(defs: &[AchievementDefinition]) -> Vec<&str> {
        defs.iter().map(|d| d.id.as_str()).collect()
    }

    #[test]
    fn test_first_game_unlocks() {
        let stats = AchievementStats {
            games_completed: 1,
            ..Default::default()
        };
        let eval = evaluate(AchievementRegistry::builtin(), &stats, &AchievementProgress::default());
        assert_eq!(ids(&eval.newly_unlocked), vec!["first_match"]);
        assert!(eval.updated.is_unlocked("first_match"));
        assert_eq!(eval.updated.achievement_progress.get("regular"), Some(&1));
    }

    #[test]
    fn test_second_evaluation_is_idempotent() {
        let stats = AchievementStats {
            games_completed: 12,
            total_shares: 1,
            login_streak: 7,
            ..Default::default()
        };
        let registry = AchievementRegistry::builtin();

        let first = evaluate(registry, &stats, &AchievementProgress::default());
        assert_eq!(
            ids(&first.newly_unlocked),
            vec!["first_match", "regular", "first_share", "on_fire", "week_warrior"]
        );

        let second = evaluate(registry, &stats, &first.updated);
        assert!(second.newly_unlocked.is_empty());
        assert_eq!(second.updated, first.updated);
    }

    #[test]
    fn test_unlocked_ids_never_shrink() {
        let registry = AchievementRegistry::builtin();
        let streaking = AchievementStats {
            perfect_game_streak: 3,
            perfect_games: 3,
            ..Default::default()
        };
        let first = evaluate(registry, &streaking, &AchievementProgress::default());
        assert!(first.updated.is_unlocked("hot_hand"));

        // Streak broken: progress drops but the unlock stays
        let broken = AchievementStats {
            perfect_game_streak: 0,
            perfect_games: 3,
            ..Default::default()
        };
        let second = evaluate(registry, &broken, &first.updated);
        assert!(second.updated.is_unlocked("hot_hand"));
        assert!(second.updated.unlocked_ids.is_superset(&first.updated.unlocked_ids));
        assert_eq!(second.updated.achievement_progress.get("untouchable"), Some(&0));
    }

    #[test]
    fn test_progress_recomputed_not_accumulated() {
        let registry = AchievementRegistry::builtin();
        let mut prior = AchievementProgress::default();
        // Drifted stored value must be overwritten by the true statistic
        prior.achievement_progress.insert("regular".to_string(), 9);

        let stats = AchievementStats {
            games_completed: 2,
            ..Default::default()
        };
        let eval = evaluate(registry, &stats, &prior);
        assert_eq!(eval.updated.achievement_progress.get("regular"), Some(&2));
        assert!(!eval.updated.is_unlocked("regular"));
    }
}
