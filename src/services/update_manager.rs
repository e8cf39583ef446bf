//! Update Manager for Chrome Collect.
//!
//! Asks the GitHub Releases API for the latest tag and reports whether it is
//! newer than the running build. Results are cached for an hour.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde::Deserialize;
use tracing::{debug, warn};

use crate::types::errors::UpdateError;
use crate::types::settings::UpdateSettings;
use crate::types::update::VersionInfo;

const CHECK_TIMEOUT: Duration = Duration::from_secs(8);
const CACHE_TTL: Duration = Duration::from_secs(60 * 60);
const USER_AGENT: &str = concat!("chrome-collect/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct LatestRelease {
    tag_name: String,
}

/// Update manager implementation.
pub struct UpdateManager {
    current_version: String,
    settings: UpdateSettings,
    client: reqwest::Client,
    cache: Mutex<Option<(Instant, VersionInfo)>>,
}

impl UpdateManager {
    pub fn new(settings: UpdateSettings) -> Self {
        Self::with_version(env!("CARGO_PKG_VERSION"), settings)
    }

    pub fn with_version(current_version: &str, settings: UpdateSettings) -> Self {
        Self {
            current_version: current_version.to_string(),
            settings,
            client: reqwest::Client::new(),
            cache: Mutex::new(None),
        }
    }

    pub fn get_current_version(&self) -> &str {
        &self.current_version
    }

    /// Compares two semver strings. Returns true if `latest` is newer than `current`.
    pub fn is_newer_version(current: &str, latest: &str) -> bool {
        let parse = |v: &str| -> Vec<u32> {
            v.trim_start_matches('v')
                .split('.')
                .filter_map(|s| s.parse().ok())
                .collect()
        };
        let c = parse(current);
        let l = parse(latest);
        l > c
    }

    pub fn releases_url(&self) -> String {
        format!("https://github.com/{}/releases/latest", self.settings.release_repo)
    }

    /// Report for a known latest tag, or "no update" when `latest_tag` is `None`.
    pub fn version_info(&self, latest_tag: Option<&str>) -> VersionInfo {
        match latest_tag.filter(|t| !t.is_empty()) {
            Some(tag) => VersionInfo {
                current: self.current_version.clone(),
                latest: tag.to_string(),
                update_available: self.current_version != "dev"
                    && Self::is_newer_version(&self.current_version, tag),
                releases_url: self.releases_url(),
                download_url: Some(format!(
                    "https://github.com/{}/releases/download/{}/{}",
                    self.settings.release_repo, tag, self.settings.release_asset
                )),
            },
            None => VersionInfo {
                current: self.current_version.clone(),
                latest: self.current_version.clone(),
                update_available: false,
                releases_url: self.releases_url(),
                download_url: None,
            },
        }
    }

    /// Returns the cached report if it is younger than an hour and `force` is false.
    pub fn cached(&self, force: bool) -> Option<VersionInfo> {
        if force {
            return None;
        }
        let cache = self.cache.lock().unwrap_or_else(|p| p.into_inner());
        cache
            .as_ref()
            .filter(|(at, _)| at.elapsed() < CACHE_TTL)
            .map(|(_, info)| info.clone())
    }

    /// Checks for a newer release. Network or API failures report "no update".
    pub async fn check_for_updates(&self, force: bool) -> VersionInfo {
        if let Some(info) = self.cached(force) {
            return info;
        }
        let info = match self.fetch_latest_tag().await {
            Ok(tag) => {
                debug!(tag = %tag, "Fetched latest release");
                self.version_info(Some(&tag))
            }
            Err(e) => {
                warn!(error = %e, "Release check failed");
                self.version_info(None)
            }
        };
        *self.cache.lock().unwrap_or_else(|p| p.into_inner()) = Some((Instant::now(), info.clone()));
        info
    }

    async fn fetch_latest_tag(&self) -> Result<String, UpdateError> {
        let url = format!(
            "https://api.github.com/repos/{}/releases/latest",
            self.settings.release_repo
        );
        let response = self
            .client
            .get(&url)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .timeout(CHECK_TIMEOUT)
            .send()
            .await
            .map_err(|e| UpdateError::NetworkError(e.to_string()))?;
        if !response.status().is_success() {
            return Err(UpdateError::HttpStatus(response.status().as_u16()));
        }
        let release: LatestRelease = response
            .json()
            .await
            .map_err(|e| UpdateError::ParseError(e.to_string()))?;
        Ok(release.tag_name)
    }
}
