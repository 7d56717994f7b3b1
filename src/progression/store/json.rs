//! JSON file store
//!
//! Writes are atomic (temp file + rename) and serialized across processes
//! with an exclusive lock on a sidecar lock file.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fs2::FileExt;

use super::ProgressionStore;
use crate::progression::state::ProgressionState;

#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ProgressionStore for JsonFileStore {
    fn load_raw(&self) -> Result<Option<ProgressionState>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read progression file: {}", self.path.display()))?;
        if content.trim().is_empty() {
            return Ok(None);
        }

        let state = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse progression file: {}", self.path.display()))?;
        Ok(Some(state))
    }

    fn save(&self, state: &ProgressionState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create progression directory: {}", parent.display())
            })?;
        }

        let content =
            serde_json::to_string_pretty(state).context("Failed to serialize progression")?;

        let lock_path = self.path.with_extension("json.lock");
        let lock_file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&lock_path)
            .with_context(|| format!("Failed to create lock file: {}", lock_path.display()))?;
        lock_file
            .lock_exclusive()
            .context("Failed to acquire progression lock")?;

        let temp_path = self.path.with_extension("json.tmp");
        let mut temp_file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)
            .with_context(|| format!("Failed to create temp file: {}", temp_path.display()))?;
        temp_file
            .write_all(content.as_bytes())
            .context("Failed to write progression")?;
        temp_file.sync_all().context("Failed to sync progression file")?;

        std::fs::rename(&temp_path, &self.path)
            .with_context(|| format!("Failed to rename progression file: {}", self.path.display()))?;

        tracing::debug!(path = %self.path.display(), "Saved progression");
        Ok(())
    }
}
