//! App Core for Chrome Collect.
//!
//! Central struct holding the data root, database, and update services, and
//! running the startup maintenance that must finish before requests are served.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::runtime::Runtime;
use tracing::info;

use crate::database::Database;
use crate::managers::bookmark_store::BookmarkStore;
use crate::platform;
use crate::services::file_store::FileStore;
use crate::services::legacy_migrator::{LegacyMigrator, MigrationReport};
use crate::services::lifecycle::{now_millis, LifecycleEngine, LifecycleTrait};
use crate::services::update_coordinator::{HandoffHook, UpdateCoordinator};
use crate::services::update_manager::UpdateManager;
use crate::types::bookmark::BatchReport;
use crate::types::errors::StartupError;
use crate::types::settings::ServiceSettings;
use crate::types::update::UpdateRequest;

/// Environment variable that overrides the data root.
pub const DATA_DIR_ENV: &str = "CHROME_COLLECT_DATA_DIR";
/// Database file name under the data root.
pub const DATABASE_FILE: &str = "collect.db";

/// Results of the startup maintenance pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StartupReport {
    pub migration: MigrationReport,
    pub purged: BatchReport,
}

/// Picks the data root: environment override, then settings, then the platform data dir.
pub fn resolve_data_root(settings: &ServiceSettings) -> PathBuf {
    if let Some(dir) = std::env::var_os(DATA_DIR_ENV).filter(|d| !d.is_empty()) {
        return PathBuf::from(dir);
    }
    settings
        .data_dir
        .clone()
        .unwrap_or_else(platform::get_data_dir)
}

/// Central application struct.
///
/// The store and lifecycle engine borrow the database and file store, so they
/// are created on demand through [`App::store`] and [`App::lifecycle`].
pub struct App {
    pub settings: ServiceSettings,
    pub db: Arc<Database>,
    pub files: FileStore,
    pub update_manager: UpdateManager,
    pub update_coordinator: UpdateCoordinator,
    runtime: Runtime,
}

impl App {
    /// Opens the app at the resolved data root.
    pub fn open(settings: ServiceSettings) -> Result<Self, StartupError> {
        let root = resolve_data_root(&settings);
        Self::open_at(root, settings)
    }

    /// Opens the app at an explicit data root, creating `pages/` and the database.
    pub fn open_at(root: impl Into<PathBuf>, settings: ServiceSettings) -> Result<Self, StartupError> {
        let files = FileStore::new(root);
        files
            .ensure_layout()
            .map_err(|e| StartupError::DataDir(e.to_string()))?;

        let db_path = files.root().join(DATABASE_FILE);
        let db = Database::open(&db_path).map_err(|e| StartupError::Database(e.to_string()))?;

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("chrome-collect-io")
            .enable_all()
            .build()
            .map_err(|e| StartupError::Runtime(e.to_string()))?;

        info!(root = %files.root().display(), "Opened data root");
        Ok(Self {
            update_manager: UpdateManager::new(settings.updates.clone()),
            update_coordinator: UpdateCoordinator::new(),
            settings,
            db: Arc::new(db),
            files,
            runtime,
        })
    }

    pub fn store(&self) -> BookmarkStore<'_> {
        BookmarkStore::new(&self.db)
    }

    pub fn lifecycle(&self) -> LifecycleEngine<'_> {
        LifecycleEngine::new(self.store(), &self.files, &self.settings.storage)
    }

    /// Legacy migration, then expired-trash purge. Run once before serving requests.
    pub fn startup(&self) -> Result<StartupReport, StartupError> {
        let migrator = LegacyMigrator::new(self.store(), &self.files, self.settings.storage.max_name_len);
        let migration = migrator
            .run()
            .map_err(|e| StartupError::Maintenance(e.to_string()))?;

        let purged = self
            .lifecycle()
            .purge_expired(now_millis(), self.settings.storage.trash_retention())
            .map_err(|e| StartupError::Maintenance(e.to_string()))?;

        info!(
            migrated = migration.moved.succeeded,
            purged = purged.succeeded,
            purge_failures = purged.failed.len(),
            "Startup maintenance complete"
        );
        Ok(StartupReport { migration, purged })
    }

    /// Blocks on the release check.
    pub fn check_for_updates(&self, force: bool) -> crate::types::update::VersionInfo {
        self.runtime.block_on(self.update_manager.check_for_updates(force))
    }

    /// Starts a background update. `false` if one is already running.
    pub fn request_update(&self, request: UpdateRequest) -> bool {
        self.update_coordinator
            .request_update(self.runtime.handle(), request)
    }

    /// Installs what runs once the updater process has been launched.
    pub fn set_handoff_hook(&self, hook: HandoffHook) {
        self.update_coordinator.set_handoff_hook(hook);
    }
}
