//! Bookmark Store for Chrome Collect.
//!
//! Implements `BookmarkStoreTrait`: CRUD and query operations over the
//! `bookmarks` table, backed by SQLite via `rusqlite`. The store only carries
//! file paths as values; it never touches the filesystem.

use rusqlite::{params, params_from_iter, Connection, OptionalExtension};

use crate::database::Database;
use crate::types::bookmark::{Bookmark, BookmarkPage, ListFilter, Stats};
use crate::types::errors::StoreError;

/// Column list shared by every query that materializes a `Bookmark`.
const COLUMNS: &str = "id, url, title, alias, favicon, file_path, thumb_path, file_size, \
                       created_at, deleted_at, notes, tags, bookmark_id";

/// Fields of a row to insert. The store assigns `deleted_at = 0` and empty alias/notes.
#[derive(Debug, Clone)]
pub struct NewBookmark<'a> {
    pub id: &'a str,
    pub url: &'a str,
    pub title: &'a str,
    pub favicon: &'a str,
    pub file_path: &'a str,
    pub thumb_path: &'a str,
    pub file_size: i64,
    pub created_at: i64,
    pub bookmark_id: &'a str,
}

/// Trait defining bookmark persistence operations.
pub trait BookmarkStoreTrait {
    fn insert(&self, row: &NewBookmark<'_>) -> Result<(), StoreError>;
    fn get(&self, id: &str) -> Result<Option<Bookmark>, StoreError>;
    /// Active records only, newest first. `total` ignores the window.
    /// A negative `limit` means no limit.
    fn list(&self, filter: &ListFilter, limit: i64, offset: i64) -> Result<BookmarkPage, StoreError>;
    /// Trashed records, most recently deleted first.
    fn list_trash(&self) -> Result<Vec<Bookmark>, StoreError>;
    /// Every record regardless of state.
    fn list_all(&self) -> Result<Vec<Bookmark>, StoreError>;
    /// Trashed records with `deleted_at` strictly below `cutoff`.
    fn list_trashed_before(&self, cutoff: i64) -> Result<Vec<Bookmark>, StoreError>;
    fn update_alias(&self, id: &str, alias: &str) -> Result<bool, StoreError>;
    fn update_notes(&self, id: &str, notes: &str) -> Result<bool, StoreError>;
    /// Moves an active record to the trash. False if missing or already trashed.
    fn mark_deleted(&self, id: &str, deleted_at: i64) -> Result<bool, StoreError>;
    /// Brings a trashed record back. False if missing or not trashed.
    fn clear_deleted(&self, id: &str) -> Result<bool, StoreError>;
    fn update_paths(&self, id: &str, file_path: &str, thumb_path: &str) -> Result<bool, StoreError>;
    fn delete(&self, id: &str) -> Result<bool, StoreError>;
    fn stats(&self) -> Result<Stats, StoreError>;
}

/// Bookmark store backed by the shared database handle.
pub struct BookmarkStore<'a> {
    db: &'a Database,
}

impl<'a> BookmarkStore<'a> {
    /// Creates a new `BookmarkStore` using the provided database.
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Reads a single `Bookmark` row into a struct.
    fn row_to_bookmark(row: &rusqlite::Row) -> rusqlite::Result<Bookmark> {
        let text = |idx: usize| -> rusqlite::Result<String> {
            Ok(row.get::<_, Option<String>>(idx)?.unwrap_or_default())
        };
        let tags_json = text(11)?;
        Ok(Bookmark {
            id: row.get(0)?,
            url: row.get(1)?,
            title: text(2)?,
            alias: text(3)?,
            favicon: text(4)?,
            file_path: text(5)?,
            thumb_path: text(6)?,
            file_size: row.get::<_, Option<i64>>(7)?.unwrap_or(0),
            created_at: row.get(8)?,
            deleted_at: row.get::<_, Option<i64>>(9)?.unwrap_or(0),
            notes: text(10)?,
            // Unparseable tag blobs read as "no tags" rather than failing the row.
            tags: serde_json::from_str(&tags_json).unwrap_or_default(),
            bookmark_id: text(12)?,
        })
    }

    fn query_bookmarks<P: rusqlite::Params>(
        conn: &Connection,
        sql: &str,
        params: P,
    ) -> Result<Vec<Bookmark>, StoreError> {
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(params, Self::row_to_bookmark)?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }
        Ok(results)
    }

    /// WHERE clause and bound values for an active-record filter.
    fn filter_clause(filter: &ListFilter) -> (&'static str, Vec<String>) {
        match filter {
            ListFilter::All => ("deleted_at = 0", Vec::new()),
            ListFilter::UrlExact(url) => ("deleted_at = 0 AND url = ?", vec![url.clone()]),
            ListFilter::Text(q) => {
                let like = format!("%{}%", q);
                (
                    "deleted_at = 0 AND (title LIKE ? OR alias LIKE ? OR url LIKE ?)",
                    vec![like.clone(), like.clone(), like],
                )
            }
        }
    }
}

impl<'a> BookmarkStoreTrait for BookmarkStore<'a> {
    fn insert(&self, row: &NewBookmark<'_>) -> Result<(), StoreError> {
        self.db.connection().execute(
            "INSERT INTO bookmarks \
             (id, url, title, alias, favicon, file_path, thumb_path, file_size, created_at, \
              deleted_at, notes, tags, bookmark_id) \
             VALUES (?1, ?2, ?3, '', ?4, ?5, ?6, ?7, ?8, 0, '', '[]', ?9)",
            params![
                row.id,
                row.url,
                row.title,
                row.favicon,
                row.file_path,
                row.thumb_path,
                row.file_size,
                row.created_at,
                row.bookmark_id
            ],
        )?;
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<Bookmark>, StoreError> {
        let sql = format!("SELECT {} FROM bookmarks WHERE id = ?1", COLUMNS);
        let conn = self.db.connection();
        let found = conn
            .query_row(&sql, params![id], Self::row_to_bookmark)
            .optional()?;
        Ok(found)
    }

    fn list(&self, filter: &ListFilter, limit: i64, offset: i64) -> Result<BookmarkPage, StoreError> {
        let (clause, values) = Self::filter_clause(filter);
        let conn = self.db.connection();

        let total: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM bookmarks WHERE {}", clause),
            params_from_iter(values.iter()),
            |row| row.get(0),
        )?;

        let sql = format!(
            "SELECT {} FROM bookmarks WHERE {} ORDER BY created_at DESC, rowid DESC LIMIT {} OFFSET {}",
            COLUMNS,
            clause,
            limit,
            offset.max(0)
        );
        let items = Self::query_bookmarks(&conn, &sql, params_from_iter(values.iter()))?;
        Ok(BookmarkPage { items, total })
    }

    fn list_trash(&self) -> Result<Vec<Bookmark>, StoreError> {
        let sql = format!(
            "SELECT {} FROM bookmarks WHERE deleted_at > 0 ORDER BY deleted_at DESC",
            COLUMNS
        );
        Self::query_bookmarks(&self.db.connection(), &sql, [])
    }

    fn list_all(&self) -> Result<Vec<Bookmark>, StoreError> {
        let sql = format!("SELECT {} FROM bookmarks ORDER BY created_at", COLUMNS);
        Self::query_bookmarks(&self.db.connection(), &sql, [])
    }

    fn list_trashed_before(&self, cutoff: i64) -> Result<Vec<Bookmark>, StoreError> {
        let sql = format!(
            "SELECT {} FROM bookmarks WHERE deleted_at > 0 AND deleted_at < ?1 ORDER BY deleted_at",
            COLUMNS
        );
        Self::query_bookmarks(&self.db.connection(), &sql, params![cutoff])
    }

    fn update_alias(&self, id: &str, alias: &str) -> Result<bool, StoreError> {
        let affected = self.db.connection().execute(
            "UPDATE bookmarks SET alias = ?1 WHERE id = ?2 AND deleted_at = 0",
            params![alias, id],
        )?;
        Ok(affected > 0)
    }

    fn update_notes(&self, id: &str, notes: &str) -> Result<bool, StoreError> {
        let affected = self.db.connection().execute(
            "UPDATE bookmarks SET notes = ?1 WHERE id = ?2 AND deleted_at = 0",
            params![notes, id],
        )?;
        Ok(affected > 0)
    }

    fn mark_deleted(&self, id: &str, deleted_at: i64) -> Result<bool, StoreError> {
        let affected = self.db.connection().execute(
            "UPDATE bookmarks SET deleted_at = ?1 WHERE id = ?2 AND deleted_at = 0",
            params![deleted_at, id],
        )?;
        Ok(affected > 0)
    }

    fn clear_deleted(&self, id: &str) -> Result<bool, StoreError> {
        let affected = self.db.connection().execute(
            "UPDATE bookmarks SET deleted_at = 0 WHERE id = ?1 AND deleted_at > 0",
            params![id],
        )?;
        Ok(affected > 0)
    }

    fn update_paths(&self, id: &str, file_path: &str, thumb_path: &str) -> Result<bool, StoreError> {
        let affected = self.db.connection().execute(
            "UPDATE bookmarks SET file_path = ?1, thumb_path = ?2 WHERE id = ?3",
            params![file_path, thumb_path, id],
        )?;
        Ok(affected > 0)
    }

    fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let affected = self
            .db
            .connection()
            .execute("DELETE FROM bookmarks WHERE id = ?1", params![id])?;
        Ok(affected > 0)
    }

    fn stats(&self) -> Result<Stats, StoreError> {
        // One statement, so the three counters come from the same snapshot.
        let stats = self.db.connection().query_row(
            "SELECT \
                COALESCE(SUM(CASE WHEN deleted_at = 0 THEN 1 ELSE 0 END), 0), \
                COALESCE(SUM(CASE WHEN deleted_at = 0 THEN file_size ELSE 0 END), 0), \
                COALESCE(SUM(CASE WHEN deleted_at > 0 THEN 1 ELSE 0 END), 0) \
             FROM bookmarks",
            [],
            |row| {
                Ok(Stats {
                    active_count: row.get(0)?,
                    total_bytes: row.get(1)?,
                    trash_count: row.get(2)?,
                })
            },
        )?;
        Ok(stats)
    }
}
