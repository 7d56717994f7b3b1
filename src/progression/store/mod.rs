//! Progression persistence
//!
//! Stores only move whole [`ProgressionState`] snapshots. Loading never fails:
//! a missing or unreadable record becomes the default state, and the lazy
//! daily reset is applied before the state is handed out.

mod json;
mod memory;
mod sqlite;

pub use json::JsonFileStore;
pub use memory::MemoryStore;
pub use sqlite::{ProgressDb, SqliteStore};

use anyhow::Result;
use chrono::NaiveDate;

use super::state::ProgressionState;

/// Backend that persists a single user's progression
pub trait ProgressionStore {
    /// Read the stored state as-is. `Ok(None)` means nothing has been saved yet.
    fn load_raw(&self) -> Result<Option<ProgressionState>>;

    /// Replace the stored state.
    fn save(&self, state: &ProgressionState) -> Result<()>;

    /// Load the state for `today`, falling back to defaults and applying the
    /// daily rollover.
    fn load(&self, today: NaiveDate) -> ProgressionState {
        let mut state = match self.load_raw() {
            Ok(Some(state)) => state,
            Ok(None) => {
                tracing::debug!("No stored progression, starting fresh");
                ProgressionState::default()
            }
            Err(e) => {
                tracing::warn!("Stored progression unreadable, using defaults: {:#}", e);
                ProgressionState::default()
            }
        };
        state.roll_over(today);
        state
    }
}

impl<T: ProgressionStore + ?Sized> ProgressionStore for Box<T> {
    fn load_raw(&self) -> Result<Option<ProgressionState>> {
        (**self).load_raw()
    }

    fn save(&self, state: &ProgressionState) -> Result<()> {
        (**self).save(state)
    }
}
