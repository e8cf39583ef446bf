//! Schema migrations for the Chrome Collect SQLite database.
//!
//! Uses a `schema_version` table to track which migrations have been applied.
//! Each migration runs exactly once and is recorded with a timestamp.

use rusqlite::Connection;

use crate::types::errors::StoreError;

/// Current schema version. Bump this when adding a new migration.
pub const CURRENT_SCHEMA_VERSION: i32 = 3;

/// Columns added after the first release, with their defaults.
const ADDITIVE_COLUMNS: &[(&str, &str)] = &[
    ("deleted_at", "INTEGER NOT NULL DEFAULT 0"),
    ("notes", "TEXT NOT NULL DEFAULT ''"),
];

/// Returns the current schema version from the database (0 if table doesn't exist).
pub fn get_schema_version(conn: &Connection) -> i32 {
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )
    .unwrap_or(0)
}

/// Runs all pending schema migrations against the provided connection.
///
/// Migrations are versioned: each runs exactly once and is recorded in
/// the `schema_version` table. Safe to call on every startup, including on
/// databases written by releases that predate version tracking.
///
/// # Errors
/// Returns `StoreError::SchemaError` if any SQL statement fails.
pub fn run_all(conn: &Connection) -> Result<(), StoreError> {
    // WAL lets readers proceed while a single writer commits
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         CREATE TABLE IF NOT EXISTS schema_version (
             version INTEGER PRIMARY KEY,
             applied_at INTEGER NOT NULL,
             description TEXT NOT NULL
         );",
    )
    .map_err(schema_error)?;

    let current = get_schema_version(conn);

    if current < 1 {
        migration_v1(conn)?;
        record_version(conn, 1, "Initial schema: bookmarks table")?;
    }

    if current < 2 {
        migration_v2(conn)?;
        record_version(conn, 2, "Add deleted_at and notes to bookmarks")?;
    }

    if current < 3 {
        migration_v3(conn)?;
        record_version(conn, 3, "Index bookmarks by created_at, deleted_at, url")?;
    }

    Ok(())
}

fn schema_error(e: rusqlite::Error) -> StoreError {
    StoreError::SchemaError(e.to_string())
}

fn record_version(conn: &Connection, version: i32, description: &str) -> Result<(), StoreError> {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64;
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version, applied_at, description) VALUES (?1, ?2, ?3)",
        rusqlite::params![version, now, description],
    )
    .map_err(schema_error)?;
    Ok(())
}

/// Adds a column, treating "already exists" as success.
///
/// Any other failure is returned, since startup must not continue on a
/// schema it does not understand.
pub fn add_column(conn: &Connection, table: &str, column: &str, decl: &str) -> Result<bool, StoreError> {
    let sql = format!("ALTER TABLE {} ADD COLUMN {} {}", table, column, decl);
    match conn.execute_batch(&sql) {
        Ok(()) => Ok(true),
        Err(e) if e.to_string().contains("duplicate column name") => Ok(false),
        Err(e) => Err(schema_error(e)),
    }
}

/// V1: the original bookmarks table.
fn migration_v1(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS bookmarks (
            id          TEXT PRIMARY KEY,
            url         TEXT NOT NULL,
            title       TEXT NOT NULL DEFAULT '',
            alias       TEXT NOT NULL DEFAULT '',
            favicon     TEXT NOT NULL DEFAULT '',
            file_path   TEXT NOT NULL DEFAULT '',
            thumb_path  TEXT NOT NULL DEFAULT '',
            file_size   INTEGER NOT NULL DEFAULT 0,
            created_at  INTEGER NOT NULL,
            tags        TEXT NOT NULL DEFAULT '[]',
            bookmark_id TEXT NOT NULL DEFAULT ''
        );
        ",
    )
    .map_err(schema_error)
}

/// V2: soft-delete timestamp and free-form notes.
fn migration_v2(conn: &Connection) -> Result<(), StoreError> {
    for (column, decl) in ADDITIVE_COLUMNS {
        add_column(conn, "bookmarks", column, decl)?;
    }
    Ok(())
}

/// V3: indexes backing listing order, trash scans and URL lookups.
fn migration_v3(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        "
        CREATE INDEX IF NOT EXISTS idx_bookmarks_created_at ON bookmarks(created_at);
        CREATE INDEX IF NOT EXISTS idx_bookmarks_deleted_at ON bookmarks(deleted_at);
        CREATE INDEX IF NOT EXISTS idx_bookmarks_url ON bookmarks(url);
        ",
    )
    .map_err(schema_error)
}
