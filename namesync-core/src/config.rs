//! Engine configuration file.
//!
//! Loaded from `<home>/.namesync/config.yaml`; every field has a default so
//! a missing file yields a usable config. Provider base URLs are the only
//! settings most installs change.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default task provider API root (Google Tasks shaped).
pub const DEFAULT_TASKS_BASE_URL: &str = "https://tasks.googleapis.com/tasks/v1";
/// Default profile provider API root.
pub const DEFAULT_PROFILE_BASE_URL: &str = "https://api.profile.example.com/1.1";

fn default_tasks_base_url() -> String {
    DEFAULT_TASKS_BASE_URL.to_string()
}

fn default_profile_base_url() -> String {
    DEFAULT_PROFILE_BASE_URL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_parallelism() -> usize {
    4
}

/// Runtime configuration for the sync engine and provider adapters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Task provider API root, e.g. `https://tasks.googleapis.com/tasks/v1`.
    #[serde(default = "default_tasks_base_url")]
    pub tasks_base_url: String,
    /// Profile provider API root.
    #[serde(default = "default_profile_base_url")]
    pub profile_base_url: String,
    /// Per-request timeout for all provider calls, in seconds. A timed-out
    /// call is a transient failure, retried on the next scheduled run.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Upper bound on rules processed concurrently within one run.
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            tasks_base_url: default_tasks_base_url(),
            profile_base_url: default_profile_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            parallelism: default_parallelism(),
        }
    }
}

impl SyncConfig {
    /// `<home>/.namesync/config.yaml` — pure, no I/O.
    pub fn path_at(home: &Path) -> PathBuf {
        home.join(".namesync").join("config.yaml")
    }

    /// Load the config rooted at `home`, falling back to defaults when the
    /// file does not exist. A present-but-malformed file is an error, not a
    /// silent fallback.
    pub fn load_at(home: &Path) -> Result<Self, ConfigError> {
        let path = Self::path_at(home);
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse { path, source })
    }
}
