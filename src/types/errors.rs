use std::fmt;

// === StoreError ===

/// Errors raised by the SQLite-backed entity store.
#[derive(Debug)]
pub enum StoreError {
    /// A statement failed to prepare or execute.
    DatabaseError(String),
    /// Schema creation or evolution failed.
    SchemaError(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::DatabaseError(msg) => write!(f, "Bookmark database error: {}", msg),
            StoreError::SchemaError(msg) => write!(f, "Schema migration failed: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::DatabaseError(e.to_string())
    }
}

// === FileStoreError ===

/// Errors related to the on-disk snapshot tree.
#[derive(Debug)]
pub enum FileStoreError {
    /// The file or directory does not exist.
    NotFound(String),
    /// A stored relative path is empty or escapes the data root.
    InvalidPath(String),
    /// Any other I/O failure (disk full, permission denied, ...).
    IoError(String),
}

impl fmt::Display for FileStoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileStoreError::NotFound(path) => write!(f, "File not found: {}", path),
            FileStoreError::InvalidPath(path) => write!(f, "Invalid stored path: {}", path),
            FileStoreError::IoError(msg) => write!(f, "File I/O error: {}", msg),
        }
    }
}

impl std::error::Error for FileStoreError {}

// === LifecycleError ===

/// Errors surfaced by bookmark lifecycle operations.
#[derive(Debug)]
pub enum LifecycleError {
    /// A required field was missing or empty.
    InvalidInput(String),
    /// The record or its backing file is absent.
    NotFound(String),
    /// Writing or reading snapshot files failed.
    IoError(String),
    /// The entity store failed.
    DatabaseError(String),
}

impl fmt::Display for LifecycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            LifecycleError::NotFound(what) => write!(f, "Not found: {}", what),
            LifecycleError::IoError(msg) => write!(f, "Snapshot I/O error: {}", msg),
            LifecycleError::DatabaseError(msg) => write!(f, "Bookmark database error: {}", msg),
        }
    }
}

impl std::error::Error for LifecycleError {}

impl From<StoreError> for LifecycleError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DatabaseError(msg) | StoreError::SchemaError(msg) => {
                LifecycleError::DatabaseError(msg)
            }
        }
    }
}

impl From<FileStoreError> for LifecycleError {
    fn from(e: FileStoreError) -> Self {
        match e {
            FileStoreError::NotFound(path) => LifecycleError::NotFound(path),
            other => LifecycleError::IoError(other.to_string()),
        }
    }
}

// === SettingsError ===

/// Errors related to settings management.
#[derive(Debug)]
pub enum SettingsError {
    /// An I/O error occurred while reading or writing settings.
    IoError(String),
    /// Failed to serialize or deserialize settings.
    SerializationError(String),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::IoError(msg) => write!(f, "Settings I/O error: {}", msg),
            SettingsError::SerializationError(msg) => {
                write!(f, "Settings serialization error: {}", msg)
            }
        }
    }
}

impl std::error::Error for SettingsError {}

// === UpdateError ===

/// Errors related to release checks and the self-update hand-off.
#[derive(Debug)]
pub enum UpdateError {
    /// A network error occurred while checking for or downloading updates.
    NetworkError(String),
    /// The server answered with a non-success status.
    HttpStatus(u16),
    /// The downloaded file's checksum does not match the expected value.
    ChecksumMismatch(String),
    /// Reading, writing or replacing an executable failed.
    FileSystemError(String),
    /// Launching a process failed.
    SpawnFailed(String),
    /// Failed to parse update information.
    ParseError(String),
}

impl fmt::Display for UpdateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateError::NetworkError(msg) => write!(f, "Update network error: {}", msg),
            UpdateError::HttpStatus(code) => write!(f, "Update download failed: HTTP {}", code),
            UpdateError::ChecksumMismatch(msg) => {
                write!(f, "Update checksum mismatch: {}", msg)
            }
            UpdateError::FileSystemError(msg) => {
                write!(f, "Update file system error: {}", msg)
            }
            UpdateError::SpawnFailed(msg) => write!(f, "Update process launch failed: {}", msg),
            UpdateError::ParseError(msg) => write!(f, "Update parse error: {}", msg),
        }
    }
}

impl std::error::Error for UpdateError {}

// === StartupError ===

/// Fatal errors that abort service startup.
#[derive(Debug)]
pub enum StartupError {
    /// The data directory could not be created.
    DataDir(String),
    /// The database could not be opened or its schema evolved.
    Database(String),
    /// Legacy migration or trash purge could not query the store.
    Maintenance(String),
    /// The background runtime could not be started.
    Runtime(String),
}

impl fmt::Display for StartupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StartupError::DataDir(msg) => write!(f, "Cannot create data directory: {}", msg),
            StartupError::Database(msg) => write!(f, "Cannot open database: {}", msg),
            StartupError::Maintenance(msg) => write!(f, "Startup maintenance failed: {}", msg),
            StartupError::Runtime(msg) => write!(f, "Cannot start runtime: {}", msg),
        }
    }
}

impl std::error::Error for StartupError {}
