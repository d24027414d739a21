//! Store configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::CoreError;
use crate::Result;

const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the database file
    pub data_dir: PathBuf,
    /// Milliseconds to wait on a conflicting transaction
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl Config {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
        }
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir
            .join(format!("{}.db", pondpilot_storage::DB_NAME))
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }

    /// Load a JSON config file. `data_dir` is required.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config: Config = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.data_dir.as_os_str().is_empty() {
            return Err(CoreError::Config("data_dir must not be empty".to_string()));
        }
        if self.busy_timeout_ms == 0 {
            return Err(CoreError::Config(
                "busy_timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
