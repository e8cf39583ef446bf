use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Current vs. latest released version, as reported to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionInfo {
    pub current: String,
    pub latest: String,
    pub update_available: bool,
    pub releases_url: String,
    pub download_url: Option<String>,
}

/// A request to replace the running executable with a downloaded one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateRequest {
    pub download_url: String,
    pub version: String,
    /// Hex SHA-256 of the expected executable, if the caller knows it.
    #[serde(default)]
    pub sha256: Option<String>,
}

/// Role of this process, chosen once from the launch arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchMode {
    /// Normal service process.
    Controller,
    /// Freshly downloaded copy that must replace `target` once `pid` exits.
    Updater { pid: u32, target: PathBuf },
}

/// How the updater's wait for the controller ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Exited,
    ProbeFailed,
    CeilingReached,
}
