// Chrome Collect platform paths for Windows
// Config: %APPDATA%/ChromeCollect
// Data:   %APPDATA%/ChromeCollect

use std::env;
use std::path::PathBuf;

fn roaming_dir() -> PathBuf {
    let appdata =
        env::var("APPDATA").unwrap_or_else(|_| String::from("C:\\Users\\Default\\AppData\\Roaming"));
    PathBuf::from(appdata).join("ChromeCollect")
}

/// Returns the configuration directory for Chrome Collect on Windows.
/// `%APPDATA%/ChromeCollect`
pub fn get_config_dir() -> PathBuf {
    roaming_dir()
}

/// Returns the data directory for Chrome Collect on Windows.
/// `%APPDATA%/ChromeCollect`
pub fn get_data_dir() -> PathBuf {
    roaming_dir()
}
