//! streakcap - activity streaks and daily-capped rewards
//!
//! streakcap turns raw activity evidence (logins, finished games, shares) into
//! calendar-day streaks, grants token rewards from several sources under a
//! single daily cap, and unlocks tiered achievements from running statistics.
//!
//! ## Layout
//!
//! - [`domain`]: token amounts, activity evidence and reward events
//! - [`progression`]: streaks, the reward engine, achievements and persistence
//! - [`config`]: TOML configuration (`~/.streakcap/config.toml`)

pub mod config;
pub mod domain;
pub mod progression;

pub use domain::*;
