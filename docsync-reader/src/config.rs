//! Reader policy constants, loadable from YAML.
//!
//! ```yaml
//! building_threshold_ms: 1000
//! reload_attempts: 1
//! update_buffer: 64
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{io_err, ReaderError};

pub const DEFAULT_BUILDING_THRESHOLD_MS: u64 = 1000;
pub const DEFAULT_RELOAD_ATTEMPTS: u32 = 1;
pub const DEFAULT_UPDATE_BUFFER: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// How long the sync may stay at `CHECKING` before the reader shows it as
    /// `BUILDING`.
    pub building_threshold_ms: u64,
    /// Content refetches allowed per epoch when a build becomes ready before
    /// any content was loaded.
    pub reload_attempts: u32,
    /// States retained for a consumer of `ReaderHandle::next` that falls
    /// behind. Treated as at least 1.
    pub update_buffer: usize,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            building_threshold_ms: DEFAULT_BUILDING_THRESHOLD_MS,
            reload_attempts: DEFAULT_RELOAD_ATTEMPTS,
            update_buffer: DEFAULT_UPDATE_BUFFER,
        }
    }
}

impl ReaderConfig {
    pub fn building_threshold(&self) -> Duration {
        Duration::from_millis(self.building_threshold_ms)
    }

    /// Load from a YAML file. An empty file yields the defaults.
    pub fn load_at(path: &Path) -> Result<Self, ReaderError> {
        let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&contents).map_err(|source| ReaderError::Config {
            path: path.to_path_buf(),
            source,
        })
    }
}
