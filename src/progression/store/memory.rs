//! In-process store, for tests and embedding

use std::sync::Mutex;

use anyhow::Result;

use super::ProgressionStore;
use crate::progression::state::ProgressionState;

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<Option<ProgressionState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: ProgressionState) -> Self {
        Self {
            state: Mutex::new(Some(state)),
        }
    }

    /// Current stored snapshot without rollover
    pub fn snapshot(&self) -> Option<ProgressionState> {
        self.state.lock().expect("lock").clone()
    }
}

impl ProgressionStore for MemoryStore {
    fn load_raw(&self) -> Result<Option<ProgressionState>> {
        Ok(self.state.lock().expect("lock").clone())
    }

    fn save(&self, state: &ProgressionState) -> Result<()> {
        *self.state.lock().expect("lock") = Some(state.clone());
        Ok(())
    }
}
