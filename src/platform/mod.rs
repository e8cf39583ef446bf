// Chrome Collect platform abstraction
// Provides platform-specific paths and process probing for Windows, macOS, and Linux.
//
// Uses `cfg(target_os)` for conditional compilation to select the correct
// platform-specific implementation at compile time.

use std::io;
use std::path::PathBuf;

#[cfg(target_os = "linux")]
mod linux;

#[cfg(target_os = "macos")]
mod macos;

#[cfg(target_os = "windows")]
mod windows;

/// Returns the platform-specific configuration directory for Chrome Collect.
///
/// - **Linux**: `~/.config/chrome-collect` (or `$XDG_CONFIG_HOME/chrome-collect`)
/// - **macOS**: `~/Library/Application Support/ChromeCollect`
/// - **Windows**: `%APPDATA%/ChromeCollect`
pub fn get_config_dir() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        linux::get_config_dir()
    }
    #[cfg(target_os = "macos")]
    {
        macos::get_config_dir()
    }
    #[cfg(target_os = "windows")]
    {
        windows::get_config_dir()
    }
}

/// Returns the platform-specific data directory for Chrome Collect.
///
/// - **Linux**: `~/.local/share/chrome-collect` (or `$XDG_DATA_HOME/chrome-collect`)
/// - **macOS**: `~/Library/Application Support/ChromeCollect`
/// - **Windows**: `%APPDATA%/ChromeCollect`
pub fn get_data_dir() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        linux::get_data_dir()
    }
    #[cfg(target_os = "macos")]
    {
        macos::get_data_dir()
    }
    #[cfg(target_os = "windows")]
    {
        windows::get_data_dir()
    }
}

/// Reports whether a process with the given PID is still running.
///
/// `Ok(false)` means the OS confirmed the process is gone. An error means the
/// PID could not be probed at all.
#[cfg(unix)]
pub fn is_process_alive(pid: u32) -> io::Result<bool> {
    // kill(0, ..) and negative PIDs address process groups
    let pid = match i32::try_from(pid) {
        Ok(p) if p > 0 => p,
        _ => {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid pid {}", pid),
            ))
        }
    };
    // Signal 0 performs the permission and existence checks without delivering anything.
    if unsafe { libc::kill(pid, 0) } == 0 {
        return Ok(true);
    }
    let err = io::Error::last_os_error();
    match err.raw_os_error() {
        Some(libc::ESRCH) => Ok(false),
        // Exists, but owned by someone else.
        Some(libc::EPERM) => Ok(true),
        _ => Err(err),
    }
}

#[cfg(windows)]
pub fn is_process_alive(pid: u32) -> io::Result<bool> {
    use windows_sys::Win32::Foundation::{CloseHandle, STILL_ACTIVE};
    use windows_sys::Win32::System::Threading::{
        GetExitCodeProcess, OpenProcess, PROCESS_QUERY_LIMITED_INFORMATION,
    };

    unsafe {
        let handle = OpenProcess(PROCESS_QUERY_LIMITED_INFORMATION, 0, pid);
        if handle == 0 {
            return Ok(false);
        }
        let mut exit_code: u32 = 0;
        let ok = GetExitCodeProcess(handle, &mut exit_code);
        CloseHandle(handle);
        if ok == 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(exit_code == STILL_ACTIVE as u32)
    }
}

#[cfg(not(any(unix, windows)))]
pub fn is_process_alive(_pid: u32) -> io::Result<bool> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "process probing is not supported on this platform",
    ))
}
