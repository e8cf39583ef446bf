// Chrome Collect services
// Services provide core functionality: snapshot files, lifecycle, migration, settings, updates.

pub mod file_store;
pub mod legacy_migrator;
pub mod lifecycle;
pub mod settings_engine;
pub mod update_coordinator;
pub mod update_manager;
