//! Bookmark Lifecycle for Chrome Collect.
//!
//! Orchestrates the `active → trashed → destroyed` state machine on top of the
//! bookmark store and the file store: saving snapshots, soft delete and
//! restore, permanent deletion with file cleanup, and retention-based purge.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::managers::bookmark_store::{BookmarkStore, BookmarkStoreTrait, NewBookmark};
use crate::services::file_store::{domain_of, sanitize_name, FileStore};
use crate::types::bookmark::{BatchReport, Bookmark, BookmarkPage, ListFilter, SaveInput, Stats};
use crate::types::errors::LifecycleError;
use crate::types::settings::StorageSettings;

/// Current time as milliseconds since the UNIX epoch.
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

/// Suggested download file name: alias, then title, then id, plus `.html`.
pub fn export_name(bookmark: &Bookmark, max_len: usize) -> String {
    format!("{}.html", sanitize_name(bookmark.display_name(), max_len))
}

/// Trait defining the operations the service exposes over bookmarks.
pub trait LifecycleTrait {
    fn save(&self, input: &SaveInput) -> Result<Bookmark, LifecycleError>;
    fn get(&self, id: &str) -> Result<Option<Bookmark>, LifecycleError>;
    fn list(&self, filter: &ListFilter, limit: i64, offset: i64) -> Result<BookmarkPage, LifecycleError>;
    fn set_alias(&self, id: &str, alias: &str) -> Result<bool, LifecycleError>;
    fn set_notes(&self, id: &str, notes: &str) -> Result<bool, LifecycleError>;
    fn soft_delete(&self, id: &str) -> Result<bool, LifecycleError>;
    fn soft_delete_at(&self, id: &str, deleted_at: i64) -> Result<bool, LifecycleError>;
    fn restore(&self, id: &str) -> Result<bool, LifecycleError>;
    fn permanent_delete(&self, id: &str) -> Result<bool, LifecycleError>;
    fn list_trash(&self) -> Result<Vec<Bookmark>, LifecycleError>;
    fn empty_trash(&self) -> Result<BatchReport, LifecycleError>;
    fn purge_expired(&self, now: i64, retention: Duration) -> Result<BatchReport, LifecycleError>;
    fn stats(&self) -> Result<Stats, LifecycleError>;
    fn read_content(&self, id: &str) -> Result<Vec<u8>, LifecycleError>;
    fn read_thumbnail(&self, id: &str) -> Result<Vec<u8>, LifecycleError>;
}

/// Lifecycle engine over one data root and one database.
pub struct LifecycleEngine<'a> {
    store: BookmarkStore<'a>,
    files: &'a FileStore,
    limits: &'a StorageSettings,
}

impl<'a> LifecycleEngine<'a> {
    pub fn new(store: BookmarkStore<'a>, files: &'a FileStore, limits: &'a StorageSettings) -> Self {
        Self { store, files, limits }
    }

    /// Decodes an inline `data:image/...;base64,` screenshot next to the page.
    ///
    /// Returns the stored relative path, or `None` if anything goes wrong.
    fn write_thumbnail(&self, dir: &Path, base: &str, screenshot: &str) -> Option<String> {
        if !screenshot.starts_with("data:image/") {
            return None;
        }
        let (_, payload) = screenshot.split_once(',')?;
        let bytes = match BASE64.decode(payload.trim()) {
            Ok(b) => b,
            Err(e) => {
                warn!(error = %e, "Discarding undecodable screenshot");
                return None;
            }
        };
        let path = self.files.unique_path(dir, base, ".png");
        if let Err(e) = self.files.write(&path, &bytes) {
            warn!(error = %e, "Discarding screenshot that could not be written");
            return None;
        }
        match self.files.to_relative(&path) {
            Ok(rel) => Some(rel),
            Err(e) => {
                warn!(error = %e, "Discarding screenshot outside the data root");
                let _ = self.files.remove(&path);
                None
            }
        }
    }

    /// Reads the file a record points at.
    fn read_stored(&self, relative: &str, id: &str) -> Result<Vec<u8>, LifecycleError> {
        if relative.is_empty() {
            return Err(LifecycleError::NotFound(id.to_string()));
        }
        let abs = self.files.to_absolute(relative)?;
        Ok(self.files.read(&abs)?)
    }
}

impl<'a> LifecycleTrait for LifecycleEngine<'a> {
    /// Writes the snapshot under `pages/<host>/` and inserts an active record.
    ///
    /// A screenshot that fails to decode or write is dropped, and an oversized
    /// favicon is stored as empty; neither fails the save. Returns the row as
    /// read back from the store.
    fn save(&self, input: &SaveInput) -> Result<Bookmark, LifecycleError> {
        if input.url.trim().is_empty() {
            return Err(LifecycleError::InvalidInput("url is required".to_string()));
        }
        if input.html.is_empty() {
            return Err(LifecycleError::InvalidInput("html is required".to_string()));
        }

        let domain = domain_of(&input.url);
        let dir = self.files.domain_dir(&domain)?;
        let base = sanitize_name(&input.title, self.limits.max_name_len);

        let html_path = self.files.unique_path(&dir, &base, ".html");
        self.files.write(&html_path, input.html.as_bytes())?;
        let file_path = self.files.to_relative(&html_path)?;
        let thumb_path = self
            .write_thumbnail(&dir, &base, &input.screenshot)
            .unwrap_or_default();

        let favicon = if input.favicon.len() > self.limits.max_favicon_len {
            debug!(len = input.favicon.len(), "Dropping oversized favicon");
            ""
        } else {
            input.favicon.as_str()
        };

        let id = Uuid::new_v4().to_string();
        let row = NewBookmark {
            id: &id,
            url: &input.url,
            title: &input.title,
            favicon,
            file_path: &file_path,
            thumb_path: &thumb_path,
            file_size: input.html.len() as i64,
            created_at: now_millis(),
            bookmark_id: &input.bookmark_id,
        };
        if let Err(e) = self.store.insert(&row) {
            let _ = self.files.remove(&html_path);
            if !thumb_path.is_empty() {
                if let Ok(abs) = self.files.to_absolute(&thumb_path) {
                    let _ = self.files.remove(&abs);
                }
            }
            return Err(e.into());
        }

        info!(id = %id, path = %file_path, size = row.file_size, "Saved snapshot");
        self.store
            .get(&id)?
            .ok_or(LifecycleError::NotFound(id))
    }

    fn get(&self, id: &str) -> Result<Option<Bookmark>, LifecycleError> {
        Ok(self.store.get(id)?)
    }

    fn list(&self, filter: &ListFilter, limit: i64, offset: i64) -> Result<BookmarkPage, LifecycleError> {
        Ok(self.store.list(filter, limit, offset)?)
    }

    fn set_alias(&self, id: &str, alias: &str) -> Result<bool, LifecycleError> {
        Ok(self.store.update_alias(id, alias)?)
    }

    fn set_notes(&self, id: &str, notes: &str) -> Result<bool, LifecycleError> {
        Ok(self.store.update_notes(id, notes)?)
    }

    fn soft_delete(&self, id: &str) -> Result<bool, LifecycleError> {
        self.soft_delete_at(id, now_millis())
    }

    /// Moves an active record to the trash with an explicit timestamp.
    fn soft_delete_at(&self, id: &str, deleted_at: i64) -> Result<bool, LifecycleError> {
        // deleted_at == 0 would read back as active
        let deleted_at = deleted_at.max(1);
        Ok(self.store.mark_deleted(id, deleted_at)?)
    }

    fn restore(&self, id: &str) -> Result<bool, LifecycleError> {
        Ok(self.store.clear_deleted(id)?)
    }

    /// Deletes the snapshot files, prunes directories left empty, then the row.
    ///
    /// Works on active and trashed records alike. A file that is already gone
    /// is not an error; any other I/O failure keeps the row so it can be retried.
    fn permanent_delete(&self, id: &str) -> Result<bool, LifecycleError> {
        let bookmark = match self.store.get(id)? {
            Some(b) => b,
            None => return Ok(false),
        };

        let mut dirs: Vec<PathBuf> = Vec::new();
        for relative in [&bookmark.file_path, &bookmark.thumb_path] {
            if relative.is_empty() {
                continue;
            }
            let abs = match self.files.to_absolute(relative) {
                Ok(p) => p,
                Err(e) => {
                    warn!(id = %id, error = %e, "Skipping unresolvable stored path");
                    continue;
                }
            };
            self.files.remove(&abs)?;
            if let Some(parent) = abs.parent() {
                if !dirs.iter().any(|d| d == parent) {
                    dirs.push(parent.to_path_buf());
                }
            }
        }

        let pages_dir = self.files.pages_dir();
        for dir in dirs.iter().filter(|d| **d != pages_dir) {
            self.files.prune_if_empty(dir);
        }

        let deleted = self.store.delete(id)?;
        if deleted {
            info!(id = %id, "Permanently deleted bookmark");
        }
        Ok(deleted)
    }

    fn list_trash(&self) -> Result<Vec<Bookmark>, LifecycleError> {
        Ok(self.store.list_trash()?)
    }

    fn empty_trash(&self) -> Result<BatchReport, LifecycleError> {
        let items = self.store.list_trash()?;
        Ok(destroy_each(self, &items))
    }

    /// Permanently deletes trashed records with `deleted_at < now - retention`.
    ///
    /// Safe to call repeatedly; a run with nothing expired changes nothing.
    fn purge_expired(&self, now: i64, retention: Duration) -> Result<BatchReport, LifecycleError> {
        let retention_ms = i64::try_from(retention.as_millis()).unwrap_or(i64::MAX);
        let cutoff = now.saturating_sub(retention_ms);
        let expired = self.store.list_trashed_before(cutoff)?;
        Ok(destroy_each(self, &expired))
    }

    fn stats(&self) -> Result<Stats, LifecycleError> {
        Ok(self.store.stats()?)
    }

    fn read_content(&self, id: &str) -> Result<Vec<u8>, LifecycleError> {
        let bookmark = self
            .store
            .get(id)?
            .ok_or_else(|| LifecycleError::NotFound(id.to_string()))?;
        self.read_stored(&bookmark.file_path, id)
    }

    fn read_thumbnail(&self, id: &str) -> Result<Vec<u8>, LifecycleError> {
        let bookmark = self
            .store
            .get(id)?
            .ok_or_else(|| LifecycleError::NotFound(id.to_string()))?;
        self.read_stored(&bookmark.thumb_path, id)
    }
}

/// Permanently deletes every item, collecting failures instead of stopping.
fn destroy_each(engine: &LifecycleEngine<'_>, items: &[Bookmark]) -> BatchReport {
    let mut report = BatchReport::default();
    for item in items {
        match engine.permanent_delete(&item.id) {
            Ok(true) => report.succeeded += 1,
            Ok(false) => report.record_failure(&item.id, "record vanished before deletion"),
            Err(e) => {
                warn!(id = %item.id, error = %e, "Failed to permanently delete bookmark");
                report.record_failure(&item.id, e.to_string());
            }
        }
    }
    report
}
