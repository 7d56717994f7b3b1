//! Store-backed progression service
//!
//! Runs `load -> compute -> save` for one operation at a time. Holding
//! `&mut self` for the whole sequence keeps a single writer per store.

use anyhow::{Context, Result};
use chrono::NaiveDate;

use super::achievements::AchievementRegistry;
use super::engine::{Outcome, ProgressionEngine};
use super::rewards::{GameResult, ShareEvent};
use super::state::ProgressionState;
use super::store::ProgressionStore;
use super::streaks::StreakState;
use crate::config::RewardConfig;

pub struct ProgressionService<S: ProgressionStore> {
    store: S,
    config: RewardConfig,
    registry: AchievementRegistry,
}

impl<S: ProgressionStore> ProgressionService<S> {
    pub fn new(store: S, config: RewardConfig, registry: AchievementRegistry) -> Self {
        Self {
            store,
            config,
            registry,
        }
    }

    /// Service with the built-in achievement set
    pub fn with_defaults(store: S, config: RewardConfig) -> Self {
        Self::new(store, config, AchievementRegistry::builtin().clone())
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &RewardConfig {
        &self.config
    }

    pub fn registry(&self) -> &AchievementRegistry {
        &self.registry
    }

    /// Current state for `today`, with rollover applied but not saved
    pub fn state(&self, today: NaiveDate) -> ProgressionState {
        self.store.load(today)
    }

    /// Claim the daily login. Pass `None` when no activity streak is available.
    pub fn login(&mut self, streak: Option<&StreakState>, today: NaiveDate) -> Result<Outcome> {
        self.run(today, |engine, state| engine.login(state, streak, today))
    }

    pub fn game_completed(&mut self, game: &GameResult, today: NaiveDate) -> Result<Outcome> {
        self.run(today, |engine, state| engine.game_completed(state, game, today))
    }

    pub fn shared(&mut self, share: &ShareEvent, today: NaiveDate) -> Result<Outcome> {
        self.run(today, |engine, state| engine.shared(state, share, today))
    }

    fn run<F>(&mut self, today: NaiveDate, op: F) -> Result<Outcome>
    where
        F: FnOnce(&ProgressionEngine<'_>, &ProgressionState) -> Outcome,
    {
        let state = self.store.load(today);
        let engine = ProgressionEngine::new(&self.config, &self.registry);
        let outcome = op(&engine, &state);

        self.store
            .save(&outcome.state)
            .context("Failed to save progression")?;
        Ok(outcome)
    }
}
