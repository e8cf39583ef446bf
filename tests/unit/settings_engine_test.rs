//! Integration-level unit tests for the SettingsEngine public API.
//!
//! These tests exercise the SettingsEngine through its public trait interface,
//! validating default loading, persistence, partial files, and reset behavior.

use std::path::PathBuf;

use chrome_collect::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use chrome_collect::types::errors::SettingsError;
use chrome_collect::types::settings::{ServiceSettings, StorageSettings};
use tempfile::TempDir;

/// Helper: a SettingsEngine writing into a temp directory the caller keeps alive.
fn engine_in_temp(dir: &TempDir) -> SettingsEngine {
    SettingsEngine::new(Some(dir.path().join("settings.json")))
}

#[test]
fn test_load_defaults_when_no_config_file_exists() {
    let dir = TempDir::new().unwrap();
    let mut engine = engine_in_temp(&dir);

    let settings = engine.load().unwrap();
    assert_eq!(settings, ServiceSettings::default());
    assert_eq!(settings.storage.trash_retention_days, 7);
    assert_eq!(settings.storage.max_name_len, 80);
    assert_eq!(settings.updates.release_repo, "Waasaabii/chrome-collect");
}

#[test]
fn test_save_and_load_roundtrip() {
    let dir = TempDir::new().unwrap();
    let mut engine = engine_in_temp(&dir);

    let mut custom = ServiceSettings::default();
    custom.data_dir = Some(PathBuf::from("/srv/collect"));
    custom.storage.trash_retention_days = 30;
    engine.set_settings(custom.clone());
    engine.save().unwrap();

    let mut reloaded = engine_in_temp(&dir);
    assert_eq!(reloaded.load().unwrap(), custom);
}

#[test]
fn test_partial_file_fills_defaults() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("settings.json"),
        r#"{"storage": {"max_name_len": 40}}"#,
    )
    .unwrap();

    let settings = engine_in_temp(&dir).load().unwrap();
    assert_eq!(settings.storage.max_name_len, 40);
    assert_eq!(settings.storage.trash_retention_days, 7);
    assert!(settings.data_dir.is_none());
}

#[test]
fn test_load_malformed_json() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("settings.json"), "{ not json").unwrap();

    let result = engine_in_temp(&dir).load();
    assert!(matches!(result, Err(SettingsError::SerializationError(_))));
}

#[test]
fn test_save_creates_parent_directories() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("deeper").join("settings.json");
    let engine = SettingsEngine::new(Some(path.clone()));

    engine.save().unwrap();
    assert!(path.is_file());
    assert_eq!(engine.get_config_path(), path.as_path());
}

#[test]
fn test_reset_restores_defaults() {
    let dir = TempDir::new().unwrap();
    let mut engine = engine_in_temp(&dir);
    let mut custom = ServiceSettings::default();
    custom.storage.max_favicon_len = 1;
    engine.set_settings(custom);
    engine.save().unwrap();

    engine.reset().unwrap();
    assert_eq!(engine.get_settings(), &ServiceSettings::default());
    assert_eq!(engine_in_temp(&dir).load().unwrap(), ServiceSettings::default());
}

#[test]
fn test_default_config_path_uses_platform() {
    let engine = SettingsEngine::new(None);
    assert!(engine.get_config_path().ends_with("settings.json"));
}

#[test]
fn test_retention_saturates_on_huge_day_count() {
    let storage = StorageSettings {
        trash_retention_days: u64::MAX / 1000,
        ..StorageSettings::default()
    };
    assert_eq!(storage.trash_retention(), std::time::Duration::from_secs(u64::MAX));
    assert_eq!(
        StorageSettings::default().trash_retention(),
        std::time::Duration::from_secs(7 * 24 * 60 * 60)
    );
}
