// Chrome Collect platform paths for macOS
// Config: ~/Library/Application Support/ChromeCollect
// Data:   ~/Library/Application Support/ChromeCollect

use std::env;
use std::path::PathBuf;

/// Returns the home directory on macOS.
fn home_dir() -> PathBuf {
    PathBuf::from(env::var("HOME").unwrap_or_else(|_| String::from("/tmp")))
}

fn app_support_dir() -> PathBuf {
    home_dir()
        .join("Library")
        .join("Application Support")
        .join("ChromeCollect")
}

/// `~/Library/Application Support/ChromeCollect`
pub fn get_config_dir() -> PathBuf {
    app_support_dir()
}

/// `~/Library/Application Support/ChromeCollect`
pub fn get_data_dir() -> PathBuf {
    app_support_dir()
}
