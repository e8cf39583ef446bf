use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Top-level service settings, persisted as `settings.json` in the config dir.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServiceSettings {
    /// Data root holding `pages/` and `collect.db`. `None` means the platform data dir.
    pub data_dir: Option<PathBuf>,
    pub storage: StorageSettings,
    pub updates: UpdateSettings,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            data_dir: None,
            storage: StorageSettings::default(),
            updates: UpdateSettings::default(),
        }
    }
}

/// Limits applied by the lifecycle engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageSettings {
    pub trash_retention_days: u64,
    /// Favicons longer than this (in bytes) are dropped on save.
    pub max_favicon_len: usize,
    /// Maximum characters of a sanitized file stem.
    pub max_name_len: usize,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            trash_retention_days: 7,
            max_favicon_len: 100_000,
            max_name_len: 80,
        }
    }
}

impl StorageSettings {
    pub fn trash_retention(&self) -> Duration {
        Duration::from_secs(self.trash_retention_days.saturating_mul(24 * 60 * 60))
    }
}

/// Where new releases are looked up.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UpdateSettings {
    /// GitHub `owner/name`.
    pub release_repo: String,
    pub release_asset: String,
}

impl Default for UpdateSettings {
    fn default() -> Self {
        Self {
            release_repo: "Waasaabii/chrome-collect".to_string(),
            release_asset: "chrome-collect.exe".to_string(),
        }
    }
}
