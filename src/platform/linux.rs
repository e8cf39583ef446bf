// Chrome Collect platform paths for Linux
// Config: ~/.config/chrome-collect
// Data:   ~/.local/share/chrome-collect

use std::env;
use std::path::PathBuf;

const APP_DIR: &str = "chrome-collect";

/// Returns the configuration directory for Chrome Collect on Linux.
/// Uses `$XDG_CONFIG_HOME/chrome-collect` if set, otherwise `~/.config/chrome-collect`.
pub fn get_config_dir() -> PathBuf {
    if let Ok(xdg) = env::var("XDG_CONFIG_HOME") {
        PathBuf::from(xdg).join(APP_DIR)
    } else {
        let home = env::var("HOME").unwrap_or_else(|_| String::from("/tmp"));
        PathBuf::from(home).join(".config").join(APP_DIR)
    }
}

/// Returns the data directory for Chrome Collect on Linux.
/// Uses `$XDG_DATA_HOME/chrome-collect` if set, otherwise `~/.local/share/chrome-collect`.
pub fn get_data_dir() -> PathBuf {
    if let Ok(xdg) = env::var("XDG_DATA_HOME") {
        PathBuf::from(xdg).join(APP_DIR)
    } else {
        let home = env::var("HOME").unwrap_or_else(|_| String::from("/tmp"));
        PathBuf::from(home).join(".local").join("share").join(APP_DIR)
    }
}
