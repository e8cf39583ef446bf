//! Legacy file migration for Chrome Collect.
//!
//! Early releases stored every snapshot flat as `pages/<uuid>.html`. On each
//! startup this task moves such files to `pages/<host>/<title>.html` and
//! rewrites the stored paths. Records already on the current layout are left
//! alone, so running it again is a no-op.

use std::path::Path;

use tracing::{info, warn};
use uuid::Uuid;

use crate::managers::bookmark_store::{BookmarkStore, BookmarkStoreTrait};
use crate::services::file_store::{domain_of, sanitize_name, FileStore, FALLBACK_NAME, PAGES_DIR};
use crate::types::bookmark::{BatchReport, Bookmark};
use crate::types::errors::LifecycleError;

/// Whether a stored path uses the flat `pages/<uuid>.html` scheme.
///
/// The stem must be a lowercase, hyphenated UUID.
pub fn is_legacy_path(file_path: &str) -> bool {
    let stem = match file_path
        .strip_prefix(PAGES_DIR)
        .and_then(|rest| rest.strip_prefix('/'))
        .and_then(|rest| rest.strip_suffix(".html"))
    {
        Some(s) => s,
        None => return false,
    };
    stem.len() == 36
        && !stem.chars().any(|c| c.is_ascii_uppercase())
        && Uuid::parse_str(stem)
            .map(|u| u.hyphenated().to_string() == stem)
            .unwrap_or(false)
}

/// Stem for a migrated file: title, then alias, then the fallback literal.
fn migrated_stem(bookmark: &Bookmark, max_len: usize) -> String {
    [&bookmark.title, &bookmark.alias]
        .into_iter()
        .map(|s| sanitize_name(s, max_len))
        .find(|stem| stem != FALLBACK_NAME)
        .unwrap_or_else(|| FALLBACK_NAME.to_string())
}

/// Outcome of one migration pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// Records whose files were relocated.
    pub moved: BatchReport,
    /// Legacy records whose HTML file no longer exists.
    pub skipped: Vec<String>,
}

/// One-shot relocation of legacy snapshot files.
pub struct LegacyMigrator<'a> {
    store: BookmarkStore<'a>,
    files: &'a FileStore,
    max_name_len: usize,
}

impl<'a> LegacyMigrator<'a> {
    pub fn new(store: BookmarkStore<'a>, files: &'a FileStore, max_name_len: usize) -> Self {
        Self {
            store,
            files,
            max_name_len,
        }
    }

    /// Migrates every legacy record, active or trashed.
    ///
    /// Only failing to list the table is an error; per-record problems are
    /// logged and reported.
    pub fn run(&self) -> Result<MigrationReport, LifecycleError> {
        let legacy: Vec<Bookmark> = self
            .store
            .list_all()?
            .into_iter()
            .filter(|b| is_legacy_path(&b.file_path))
            .collect();

        let mut report = MigrationReport::default();
        if legacy.is_empty() {
            return Ok(report);
        }
        info!(count = legacy.len(), "Migrating legacy snapshot files");

        for bookmark in &legacy {
            match self.migrate_one(bookmark) {
                Ok(true) => report.moved.succeeded += 1,
                Ok(false) => {
                    info!(id = %bookmark.id, path = %bookmark.file_path, "Legacy file missing, skipped");
                    report.skipped.push(bookmark.id.clone());
                }
                Err(e) => {
                    warn!(id = %bookmark.id, error = %e, "Legacy migration failed");
                    report.moved.record_failure(&bookmark.id, e.to_string());
                }
            }
        }

        info!(
            moved = report.moved.succeeded,
            skipped = report.skipped.len(),
            failed = report.moved.failed.len(),
            "Legacy migration finished"
        );
        Ok(report)
    }

    /// Moves one record's files. `Ok(false)` if its HTML file is gone.
    fn migrate_one(&self, bookmark: &Bookmark) -> Result<bool, LifecycleError> {
        let old_html = self.files.to_absolute(&bookmark.file_path)?;
        if !old_html.is_file() {
            return Ok(false);
        }

        let domain = domain_of(&bookmark.url);
        let stem = migrated_stem(bookmark, self.max_name_len);
        let dir = self.files.domain_dir(&domain)?;

        let new_html = self.files.unique_path(&dir, &stem, ".html");
        self.files.move_file(&old_html, &new_html)?;
        let new_html_rel = self.files.to_relative(&new_html)?;

        let mut thumb_moved = None;
        let mut new_thumb_rel = bookmark.thumb_path.clone();
        if !bookmark.thumb_path.is_empty() {
            if let Ok(old_thumb) = self.files.to_absolute(&bookmark.thumb_path) {
                if old_thumb.is_file() {
                    let new_thumb = self.files.unique_path(&dir, &stem, ".png");
                    match self.files.move_file(&old_thumb, &new_thumb) {
                        Ok(()) => {
                            new_thumb_rel = self.files.to_relative(&new_thumb)?;
                            thumb_moved = Some((old_thumb, new_thumb));
                        }
                        Err(e) => {
                            warn!(id = %bookmark.id, error = %e, "Thumbnail left in place");
                        }
                    }
                }
            }
        }

        if let Err(e) = self
            .store
            .update_paths(&bookmark.id, &new_html_rel, &new_thumb_rel)
        {
            // Put the files back so the stored paths stay valid.
            self.undo_move(&new_html, &old_html);
            if let Some((old_thumb, new_thumb)) = &thumb_moved {
                self.undo_move(new_thumb, old_thumb);
            }
            return Err(e.into());
        }

        info!(id = %bookmark.id, from = %bookmark.file_path, to = %new_html_rel, "Migrated legacy snapshot");
        Ok(true)
    }

    fn undo_move(&self, from: &Path, to: &Path) {
        if let Err(e) = self.files.move_file(from, to) {
            warn!(from = %from.display(), error = %e, "Could not restore moved file");
        }
    }
}
