//! Self-update hand-off for Chrome Collect.
//!
//! Two processes cooperate without any IPC channel:
//!
//! 1. The running service (controller) downloads the new executable to a
//!    version-named file in the temp dir, launches it with
//!    `--update-pid=<own pid> --update-target=<own exe path>` and shuts down.
//! 2. The new process (updater) polls the controller's PID until it is gone
//!    or a ceiling passes, waits for file handles to be released, moves its
//!    own executable over the target and relaunches the target normally.
//!
//! Nothing touches the installed executable until phase 2, so a failed
//! download or launch leaves the old version running untouched.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use ring::digest;
use tokio::io::AsyncWriteExt;
use tokio::runtime::Handle;
use tracing::{debug, error, info, warn};

use crate::platform;
use crate::types::errors::UpdateError;
use crate::types::update::{LaunchMode, UpdateRequest, WaitOutcome};

/// Launch argument carrying the controller's PID.
pub const UPDATE_PID_ARG: &str = "--update-pid=";
/// Launch argument carrying the executable path to overwrite.
pub const UPDATE_TARGET_ARG: &str = "--update-target=";

const DOWNLOAD_PREFIX: &str = "chrome-collect";
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Selects this process's role from its launch arguments (program name excluded).
///
/// Both hand-off arguments must be present and valid, otherwise the process
/// runs as a normal controller.
pub fn parse_launch_mode<I, S>(args: I) -> LaunchMode
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut pid = None;
    let mut target = None;
    for arg in args {
        let arg = arg.as_ref();
        if let Some(value) = arg.strip_prefix(UPDATE_PID_ARG) {
            pid = value.parse::<u32>().ok().filter(|p| *p > 0);
        } else if let Some(value) = arg.strip_prefix(UPDATE_TARGET_ARG) {
            target = Some(value).filter(|v| !v.is_empty()).map(PathBuf::from);
        }
    }
    match (pid, target) {
        (Some(pid), Some(target)) => LaunchMode::Updater { pid, target },
        _ => LaunchMode::Controller,
    }
}

/// Capability to ask whether a process is still running.
pub trait ProcessProbe: Send + Sync {
    /// `Ok(false)` once the process is gone; an error if it cannot be probed.
    fn is_alive(&self, pid: u32) -> io::Result<bool>;
}

/// Probe backed by the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProbe;

impl ProcessProbe for SystemProbe {
    fn is_alive(&self, pid: u32) -> io::Result<bool> {
        platform::is_process_alive(pid)
    }
}

/// Timing of the updater's wait for the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandoffTiming {
    pub poll_interval: Duration,
    /// Upper bound on the wait; the update proceeds once it passes.
    pub wait_ceiling: Duration,
    /// Pause after the wait so the OS releases the old executable.
    pub release_delay: Duration,
}

impl Default for HandoffTiming {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
            wait_ceiling: Duration::from_secs(30),
            release_delay: Duration::from_millis(500),
        }
    }
}

/// Polls `pid` until it exits, the probe fails, or the ceiling passes.
pub fn wait_for_exit(probe: &dyn ProcessProbe, pid: u32, timing: &HandoffTiming) -> WaitOutcome {
    let deadline = Instant::now() + timing.wait_ceiling;
    loop {
        match probe.is_alive(pid) {
            Ok(false) => return WaitOutcome::Exited,
            Err(e) => {
                debug!(pid, error = %e, "Liveness probe failed, treating controller as gone");
                return WaitOutcome::ProbeFailed;
            }
            Ok(true) => {}
        }
        let now = Instant::now();
        if now >= deadline {
            return WaitOutcome::CeilingReached;
        }
        thread::sleep(timing.poll_interval.min(deadline - now));
    }
}

/// Temp-dir location for a downloaded version. The same version always maps
/// to the same file, so repeated downloads overwrite each other.
pub fn download_path(version: &str) -> PathBuf {
    let safe: String = version
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
        .collect();
    std::env::temp_dir().join(format!(
        "{}-{}{}",
        DOWNLOAD_PREFIX,
        safe,
        std::env::consts::EXE_SUFFIX
    ))
}

/// Streams the executable at `url` into [`download_path`] for `version`.
pub async fn download_update(
    client: &reqwest::Client,
    url: &str,
    version: &str,
) -> Result<PathBuf, UpdateError> {
    let mut response = client
        .get(url)
        .timeout(DOWNLOAD_TIMEOUT)
        .send()
        .await
        .map_err(|e| UpdateError::NetworkError(e.to_string()))?;
    if response.status() != reqwest::StatusCode::OK {
        return Err(UpdateError::HttpStatus(response.status().as_u16()));
    }

    let path = download_path(version);
    let fs_err = |e: io::Error| UpdateError::FileSystemError(format!("{}: {}", path.display(), e));
    let mut file = tokio::fs::File::create(&path).await.map_err(fs_err)?;
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| UpdateError::NetworkError(e.to_string()))?
    {
        file.write_all(&chunk).await.map_err(fs_err)?;
    }
    file.flush().await.map_err(fs_err)?;
    drop(file);

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
            .await
            .map_err(fs_err)?;
    }

    info!(path = %path.display(), version, "Downloaded update");
    Ok(path)
}

/// Compares a file's SHA-256 with a hex digest (case-insensitive).
pub fn verify_checksum(path: &Path, expected_sha256: &str) -> Result<bool, UpdateError> {
    let data = fs::read(path)
        .map_err(|e| UpdateError::FileSystemError(format!("{}: {}", path.display(), e)))?;
    let actual = digest::digest(&digest::SHA256, &data);
    let actual_hex: String = actual.as_ref().iter().map(|b| format!("{:02x}", b)).collect();
    Ok(actual_hex == expected_sha256.trim().to_lowercase())
}

/// Starts the downloaded executable in updater mode, pointing it at this process.
pub fn launch_updater(downloaded: &Path) -> Result<(), UpdateError> {
    let self_path =
        std::env::current_exe().map_err(|e| UpdateError::FileSystemError(e.to_string()))?;
    let mut target_arg = OsString::from(UPDATE_TARGET_ARG);
    target_arg.push(self_path.as_os_str());

    Command::new(downloaded)
        .arg(format!("{}{}", UPDATE_PID_ARG, std::process::id()))
        .arg(target_arg)
        .spawn()
        .map_err(|e| UpdateError::SpawnFailed(format!("{}: {}", downloaded.display(), e)))?;
    info!(updater = %downloaded.display(), target = %self_path.display(), "Launched updater");
    Ok(())
}

/// Sibling of `target` used to stage a copied executable.
fn staging_path(target: &Path) -> PathBuf {
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| DOWNLOAD_PREFIX.to_string());
    target.with_file_name(format!(".{}.new", name))
}

/// Moves `source` onto `target`.
///
/// When a rename is refused (for example across devices) the executable is
/// copied next to `target` first and renamed over it, so `target` is either
/// the old file or the complete new one.
pub fn replace_executable(source: &Path, target: &Path) -> Result<(), UpdateError> {
    let rename_err = match fs::rename(source, target) {
        Ok(()) => return Ok(()),
        Err(e) => e,
    };
    debug!(error = %rename_err, "Rename failed, staging a copy instead");

    let staged = staging_path(target);
    let moved = fs::copy(source, &staged).and_then(|_| fs::rename(&staged, target));
    if let Err(e) = moved {
        let _ = fs::remove_file(&staged);
        return Err(UpdateError::FileSystemError(format!(
            "{} -> {}: {}",
            source.display(),
            target.display(),
            e
        )));
    }
    if let Err(e) = fs::remove_file(source) {
        warn!(path = %source.display(), error = %e, "Could not remove downloaded copy");
    }
    Ok(())
}

/// Phase 2 without the relaunch: wait for the controller, pause, replace.
pub fn hand_off(
    source: &Path,
    target: &Path,
    pid: u32,
    probe: &dyn ProcessProbe,
    timing: &HandoffTiming,
) -> Result<WaitOutcome, UpdateError> {
    let outcome = wait_for_exit(probe, pid, timing);
    match outcome {
        WaitOutcome::CeilingReached => {
            warn!(pid, "Controller still running after wait ceiling, replacing anyway")
        }
        _ => info!(pid, ?outcome, "Controller gone"),
    }
    thread::sleep(timing.release_delay);
    replace_executable(source, target)?;
    info!(target = %target.display(), "Executable replaced");
    Ok(outcome)
}

/// Phase 2: hand off, then start `target` whether or not it was replaced.
///
/// A failed replacement leaves the old executable in place, and it is
/// relaunched so the service keeps running on the previous version.
pub fn finalize_update(
    source: &Path,
    target: &Path,
    pid: u32,
    probe: &dyn ProcessProbe,
    timing: &HandoffTiming,
) -> Result<WaitOutcome, UpdateError> {
    let replaced = hand_off(source, target, pid, probe, timing);
    if let Err(e) = &replaced {
        error!(error = %e, target = %target.display(), "Replacement failed, relaunching installed version");
    }

    let relaunched = Command::new(target)
        .spawn()
        .map(|_| ())
        .map_err(|e| UpdateError::SpawnFailed(format!("{}: {}", target.display(), e)));
    match (replaced, relaunched) {
        (Ok(outcome), Ok(())) => {
            info!(target = %target.display(), "Relaunched updated service");
            Ok(outcome)
        }
        (Err(e), relaunched) => {
            if let Err(spawn_err) = relaunched {
                error!(error = %spawn_err, "Could not relaunch installed version");
            }
            Err(e)
        }
        (Ok(_), Err(e)) => Err(e),
    }
}

/// Entry point of updater mode: replace `target` with this executable and
/// start it as a normal process.
pub fn run_updater(
    pid: u32,
    target: &Path,
    probe: &dyn ProcessProbe,
    timing: &HandoffTiming,
) -> Result<WaitOutcome, UpdateError> {
    let self_path =
        std::env::current_exe().map_err(|e| UpdateError::FileSystemError(e.to_string()))?;
    finalize_update(&self_path, target, pid, probe, timing)
}

/// Called once the updater is running; expected to shut the controller down.
pub type HandoffHook = Arc<dyn Fn() + Send + Sync>;

/// Phase 1 driver. Runs downloads in the background and reports hand-off
/// through a hook so the owner decides how to exit.
pub struct UpdateCoordinator {
    client: reqwest::Client,
    hook: Mutex<Option<HandoffHook>>,
    in_flight: Arc<AtomicBool>,
}

impl UpdateCoordinator {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            hook: Mutex::new(None),
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn set_handoff_hook(&self, hook: HandoffHook) {
        *self.hook.lock().unwrap_or_else(|p| p.into_inner()) = Some(hook);
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Starts an update in the background and returns immediately.
    ///
    /// Returns `false` without doing anything if another update is already
    /// running. Failures are logged and leave this process running.
    pub fn request_update(&self, runtime: &Handle, request: UpdateRequest) -> bool {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            info!("Update already in progress, ignoring request");
            return false;
        }

        let client = self.client.clone();
        let hook = self.hook.lock().unwrap_or_else(|p| p.into_inner()).clone();
        let in_flight = Arc::clone(&self.in_flight);
        runtime.spawn(async move {
            match controller_phase(&client, &request).await {
                Ok(()) => match hook {
                    Some(hook) => hook(),
                    None => warn!("Updater launched but no shutdown hook is installed"),
                },
                Err(e) => {
                    error!(version = %request.version, error = %e, "Update aborted");
                    in_flight.store(false, Ordering::SeqCst);
                }
            }
        });
        true
    }
}

impl Default for UpdateCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

/// Download, optionally verify, and launch the updater.
async fn controller_phase(client: &reqwest::Client, request: &UpdateRequest) -> Result<(), UpdateError> {
    let path = download_update(client, &request.download_url, &request.version).await?;
    if let Some(expected) = request.sha256.as_deref() {
        if !verify_checksum(&path, expected)? {
            let _ = fs::remove_file(&path);
            return Err(UpdateError::ChecksumMismatch(format!(
                "{} does not match {}",
                path.display(),
                expected
            )));
        }
    }
    launch_updater(&path)
}
