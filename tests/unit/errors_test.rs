use chrome_collect::types::errors::*;

// === StoreError Tests ===

#[test]
fn store_error_display_variants() {
    assert_eq!(
        StoreError::DatabaseError("locked".to_string()).to_string(),
        "Bookmark database error: locked"
    );
    assert_eq!(
        StoreError::SchemaError("bad column".to_string()).to_string(),
        "Schema migration failed: bad column"
    );
}

#[test]
fn store_error_from_rusqlite() {
    let err: StoreError = rusqlite::Error::QueryReturnedNoRows.into();
    assert!(matches!(err, StoreError::DatabaseError(_)));
}

// === FileStoreError Tests ===

#[test]
fn file_store_error_display_variants() {
    assert_eq!(
        FileStoreError::NotFound("pages/a.html".to_string()).to_string(),
        "File not found: pages/a.html"
    );
    assert_eq!(
        FileStoreError::InvalidPath("../x".to_string()).to_string(),
        "Invalid stored path: ../x"
    );
    assert_eq!(
        FileStoreError::IoError("disk full".to_string()).to_string(),
        "File I/O error: disk full"
    );
}

// === LifecycleError Tests ===

#[test]
fn lifecycle_error_display_variants() {
    assert_eq!(
        LifecycleError::InvalidInput("url is required".to_string()).to_string(),
        "Invalid input: url is required"
    );
    assert_eq!(
        LifecycleError::NotFound("abc".to_string()).to_string(),
        "Not found: abc"
    );
}

#[test]
fn lifecycle_error_from_file_store_keeps_not_found() {
    let err: LifecycleError = FileStoreError::NotFound("x".to_string()).into();
    assert!(matches!(err, LifecycleError::NotFound(_)));

    let err: LifecycleError = FileStoreError::InvalidPath("../x".to_string()).into();
    assert!(matches!(err, LifecycleError::IoError(_)));
}

#[test]
fn lifecycle_error_from_store() {
    let err: LifecycleError = StoreError::DatabaseError("busy".to_string()).into();
    assert!(matches!(err, LifecycleError::DatabaseError(_)));
}

// === UpdateError Tests ===

#[test]
fn update_error_display_variants() {
    assert_eq!(
        UpdateError::HttpStatus(404).to_string(),
        "Update download failed: HTTP 404"
    );
    assert_eq!(
        UpdateError::ChecksumMismatch("abc".to_string()).to_string(),
        "Update checksum mismatch: abc"
    );
    assert_eq!(
        UpdateError::SpawnFailed("denied".to_string()).to_string(),
        "Update process launch failed: denied"
    );
}

// === StartupError Tests ===

#[test]
fn startup_error_display_variants() {
    assert_eq!(
        StartupError::DataDir("read-only".to_string()).to_string(),
        "Cannot create data directory: read-only"
    );
    assert_eq!(
        StartupError::Database("corrupt".to_string()).to_string(),
        "Cannot open database: corrupt"
    );
}

#[test]
fn all_errors_implement_error_trait() {
    let errors: Vec<Box<dyn std::error::Error>> = vec![
        Box::new(StoreError::DatabaseError("e".to_string())),
        Box::new(FileStoreError::IoError("e".to_string())),
        Box::new(LifecycleError::IoError("e".to_string())),
        Box::new(SettingsError::IoError("e".to_string())),
        Box::new(UpdateError::NetworkError("e".to_string())),
        Box::new(StartupError::Runtime("e".to_string())),
    ];
    for err in errors {
        assert!(err.source().is_none());
        assert!(!err.to_string().is_empty());
    }
}
