//! Streaks, capped rewards and achievements
//!
//! Pure computation sits in the middle; I/O lives at the edges.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌─────────────────┐
//! │ ActivitySource  │     │   CLI / host    │
//! │ (fetch + retry) │     │  (operations)   │
//! └────────┬────────┘     └────────┬────────┘
//!          ▼                       ▼
//!  ActivityNormalizer      ProgressionService
//!          ▼                       │
//!    StreakTracker ──streak──▶ ProgressionEngine
//!                                  │  achievements::evaluate
//!                                  │  rewards::compute_rewards
//!                                  ▼
//!                          ProgressionStore
//!                     (json | sqlite | memory)
//! ```
//!
//! # Usage
//!
//! ```ignore
//! let mut service = ProgressionService::with_defaults(JsonFileStore::new(path), config);
//! let outcome = service.game_completed(&game, today)?;
//! for reward in &outcome.rewards {
//!     println!("{}: {}", reward.kind, reward.amount);
//! }
//! ```

pub mod achievements;
pub mod calendar;
mod engine;
mod normalizer;
pub mod rewards;
mod service;
mod source;
mod state;
pub mod store;
pub mod streaks;

pub use achievements::{
    AchievementCategory, AchievementDefinition, AchievementMetric, AchievementProgress,
    AchievementRegistry, AchievementStats, AchievementTier, Evaluation, RegistryError,
};
pub use engine::{Outcome, ProgressionEngine};
pub use normalizer::{ActivityNormalizer, NormalizeError, NormalizeReport};
pub use rewards::{
    compute_rewards, enforce_daily_cap, GameResult, RewardBatch, RewardTrigger, ShareEvent,
    ShareKind,
};
pub use service::ProgressionService;
pub use source::{
    fetch_with_retry, ActivityLog, ActivitySnapshot, ActivitySource, FetchError, RefreshStatus,
    RetryPolicy, StreakTracker,
};
pub use state::ProgressionState;
pub use store::{JsonFileStore, MemoryStore, ProgressDb, ProgressionStore, SqliteStore};
pub use streaks::StreakState;
