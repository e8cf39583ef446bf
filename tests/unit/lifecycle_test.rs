//! Unit tests for the bookmark lifecycle: save, trash, restore, destroy, purge.

use std::fs;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrome_collect::app::App;
use chrome_collect::database::Database;
use chrome_collect::managers::bookmark_store::BookmarkStore;
use chrome_collect::services::file_store::FileStore;
use chrome_collect::services::lifecycle::{export_name, LifecycleEngine, LifecycleTrait};
use chrome_collect::types::bookmark::{ListFilter, SaveInput};
use chrome_collect::types::errors::LifecycleError;
use chrome_collect::types::settings::{ServiceSettings, StorageSettings};
use tempfile::TempDir;

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

struct Fixture {
    tmp: TempDir,
    db: Database,
    files: FileStore,
    limits: StorageSettings,
}

impl Fixture {
    fn new() -> Self {
        let tmp = tempfile::tempdir().unwrap();
        let files = FileStore::new(tmp.path());
        files.ensure_layout().unwrap();
        Self {
            db: Database::open(tmp.path().join("collect.db")).unwrap(),
            files,
            limits: StorageSettings::default(),
            tmp,
        }
    }

    fn engine(&self) -> LifecycleEngine<'_> {
        LifecycleEngine::new(BookmarkStore::new(&self.db), &self.files, &self.limits)
    }
}

fn input(url: &str, title: &str, html: &str) -> SaveInput {
    SaveInput {
        url: url.to_string(),
        title: title.to_string(),
        html: html.to_string(),
        ..SaveInput::default()
    }
}

#[test]
fn test_save_writes_file_under_host_dir() {
    let fx = Fixture::new();
    let engine = fx.engine();
    let html = "<html><body>héllo</body></html>";

    let saved = engine
        .save(&input("https://example.com/a", "Hello/World", html))
        .unwrap();

    assert_eq!(saved.file_path, "pages/example.com/Hello_World.html");
    assert_eq!(saved.file_size, html.len() as i64);
    assert_eq!(saved.deleted_at, 0);
    assert!(saved.thumb_path.is_empty());

    let on_disk = fs::read_to_string(fx.tmp.path().join("pages/example.com/Hello_World.html")).unwrap();
    assert_eq!(on_disk, html);
    assert_eq!(engine.get(&saved.id).unwrap(), Some(saved.clone()));
    assert_eq!(engine.read_content(&saved.id).unwrap(), html.as_bytes());
}

#[test]
fn test_save_same_title_gets_distinct_files() {
    let fx = Fixture::new();
    let engine = fx.engine();
    let a = engine.save(&input("https://example.com/1", "Page", "one")).unwrap();
    let b = engine.save(&input("https://example.com/2", "Page", "two")).unwrap();

    assert_eq!(a.file_path, "pages/example.com/Page.html");
    assert_eq!(b.file_path, "pages/example.com/Page_1.html");
    assert_eq!(engine.read_content(&a.id).unwrap(), b"one");
}

#[test]
fn test_save_requires_url_and_html() {
    let fx = Fixture::new();
    let engine = fx.engine();
    assert!(matches!(
        engine.save(&input("  ", "t", "<html>")),
        Err(LifecycleError::InvalidInput(_))
    ));
    assert!(matches!(
        engine.save(&input("https://example.com/", "t", "")),
        Err(LifecycleError::InvalidInput(_))
    ));
    assert_eq!(engine.stats().unwrap().active_count, 0);
}

#[test]
fn test_save_decodes_screenshot() {
    let fx = Fixture::new();
    let engine = fx.engine();
    let png = [0x89u8, b'P', b'N', b'G', 0, 1, 2, 3];
    let mut req = input("https://example.com/", "Shot", "<html>");
    req.screenshot = format!("data:image/png;base64,{}", BASE64.encode(png));

    let saved = engine.save(&req).unwrap();
    assert_eq!(saved.thumb_path, "pages/example.com/Shot.png");
    assert_eq!(engine.read_thumbnail(&saved.id).unwrap(), png);
}

#[test]
fn test_bad_screenshot_and_large_favicon_do_not_fail_save() {
    let fx = Fixture::new();
    let engine = fx.engine();
    let mut req = input("https://example.com/", "Shot", "<html>");
    req.screenshot = "data:image/png;base64,@@not base64@@".to_string();
    req.favicon = "x".repeat(fx.limits.max_favicon_len + 1);

    let saved = engine.save(&req).unwrap();
    assert!(saved.thumb_path.is_empty());
    assert!(saved.favicon.is_empty());
    assert!(matches!(
        engine.read_thumbnail(&saved.id),
        Err(LifecycleError::NotFound(_))
    ));
}

#[test]
fn test_soft_delete_then_restore_is_identity() {
    let fx = Fixture::new();
    let engine = fx.engine();
    let saved = engine.save(&input("https://example.com/", "Keep", "<html>")).unwrap();
    engine.set_alias(&saved.id, "mine").unwrap();
    let before = engine.get(&saved.id).unwrap().unwrap();

    assert!(engine.soft_delete_at(&saved.id, 1_000).unwrap());
    let trashed = engine.get(&saved.id).unwrap().unwrap();
    assert_eq!(trashed.deleted_at, 1_000);
    assert_eq!(
        chrome_collect::types::bookmark::Bookmark { deleted_at: 0, ..trashed },
        before
    );
    assert_eq!(engine.list(&ListFilter::All, 50, 0).unwrap().total, 0);
    assert!(fx.tmp.path().join(&before.file_path).is_file(), "trash keeps the file");

    assert!(engine.restore(&saved.id).unwrap());
    assert_eq!(engine.get(&saved.id).unwrap().unwrap(), before);
}

#[test]
fn test_trash_transitions_report_absence() {
    let fx = Fixture::new();
    let engine = fx.engine();
    let saved = engine.save(&input("https://example.com/", "T", "<html>")).unwrap();

    assert!(!engine.restore(&saved.id).unwrap(), "active record cannot be restored");
    assert!(engine.soft_delete(&saved.id).unwrap());
    assert!(!engine.soft_delete(&saved.id).unwrap(), "already trashed");
    assert!(!engine.soft_delete("missing").unwrap());
    assert!(!engine.set_notes(&saved.id, "n").unwrap(), "trashed records are read-only");
}

#[test]
fn test_purge_expired_boundaries() {
    let fx = Fixture::new();
    let engine = fx.engine();
    let retention = Duration::from_secs(7 * 24 * 60 * 60);
    let now = 100 * DAY_MS;
    let cutoff = now - 7 * DAY_MS;

    let older = engine.save(&input("https://a.test/", "older", "<html>")).unwrap();
    let exact = engine.save(&input("https://b.test/", "exact", "<html>")).unwrap();
    let newer = engine.save(&input("https://c.test/", "newer", "<html>")).unwrap();
    let active = engine.save(&input("https://d.test/", "active", "<html>")).unwrap();
    engine.soft_delete_at(&older.id, cutoff - 1).unwrap();
    engine.soft_delete_at(&exact.id, cutoff).unwrap();
    engine.soft_delete_at(&newer.id, cutoff + 1).unwrap();

    let report = engine.purge_expired(now, retention).unwrap();
    assert_eq!(report.succeeded, 1);
    assert!(report.failed.is_empty());

    assert!(engine.get(&older.id).unwrap().is_none());
    assert!(!fx.tmp.path().join(&older.file_path).exists());
    assert!(!fx.tmp.path().join("pages/a.test").exists());
    assert!(engine.get(&exact.id).unwrap().is_some());
    assert!(engine.get(&newer.id).unwrap().is_some());
    assert!(engine.get(&active.id).unwrap().is_some());

    let again = engine.purge_expired(now, retention).unwrap();
    assert_eq!(again.succeeded, 0);
    assert_eq!(engine.stats().unwrap().trash_count, 2);
}

#[test]
fn test_huge_retention_keeps_fresh_trash() {
    let fx = Fixture::new();
    let engine = fx.engine();
    let saved = engine.save(&input("https://a.test/", "kept", "<html>")).unwrap();
    engine.soft_delete_at(&saved.id, 100 * DAY_MS - 1).unwrap();

    let days = StorageSettings {
        trash_retention_days: 102_000_000_000_000,
        ..StorageSettings::default()
    };
    for retention in [days.trash_retention(), Duration::MAX] {
        let report = engine.purge_expired(100 * DAY_MS, retention).unwrap();
        assert_eq!(report.succeeded, 0);
    }
    assert!(engine.get(&saved.id).unwrap().is_some());
}

#[test]
fn test_permanent_delete_prunes_empty_host_dir() {
    let fx = Fixture::new();
    let engine = fx.engine();
    let png = BASE64.encode([1u8, 2, 3]);
    let mut req = input("https://solo.test/", "Only", "<html>");
    req.screenshot = format!("data:image/png;base64,{}", png);
    let saved = engine.save(&req).unwrap();
    assert!(!saved.thumb_path.is_empty());

    assert!(engine.permanent_delete(&saved.id).unwrap());
    assert!(!fx.tmp.path().join("pages/solo.test").exists());
    assert!(fx.tmp.path().join("pages").is_dir(), "pages/ itself stays");
    assert!(engine.get(&saved.id).unwrap().is_none());
    assert!(!engine.permanent_delete(&saved.id).unwrap());
}

#[test]
fn test_permanent_delete_keeps_dir_with_sibling() {
    let fx = Fixture::new();
    let engine = fx.engine();
    let gone = engine.save(&input("https://shared.test/1", "One", "<html>")).unwrap();
    let kept = engine.save(&input("https://shared.test/2", "Two", "<html>")).unwrap();

    assert!(engine.permanent_delete(&gone.id).unwrap());
    assert!(fx.tmp.path().join("pages/shared.test").is_dir());
    assert!(fx.tmp.path().join(&kept.file_path).is_file());
}

#[test]
fn test_permanent_delete_tolerates_missing_file() {
    let fx = Fixture::new();
    let engine = fx.engine();
    let saved = engine.save(&input("https://example.com/", "Gone", "<html>")).unwrap();
    fs::remove_file(fx.tmp.path().join(&saved.file_path)).unwrap();

    assert!(engine.permanent_delete(&saved.id).unwrap());
    assert!(engine.get(&saved.id).unwrap().is_none());
}

#[test]
fn test_empty_trash_leaves_active_records() {
    let fx = Fixture::new();
    let engine = fx.engine();
    let a = engine.save(&input("https://example.com/a", "A", "<html>")).unwrap();
    let b = engine.save(&input("https://example.com/b", "B", "<html>")).unwrap();
    let c = engine.save(&input("https://example.com/c", "C", "<html>")).unwrap();
    engine.soft_delete(&a.id).unwrap();
    engine.soft_delete(&b.id).unwrap();

    let report = engine.empty_trash().unwrap();
    assert_eq!(report.succeeded, 2);
    assert!(engine.list_trash().unwrap().is_empty());

    let stats = engine.stats().unwrap();
    assert_eq!(stats.active_count, 1);
    assert_eq!(stats.trash_count, 0);
    assert_eq!(engine.get(&c.id).unwrap().map(|b| b.id), Some(c.id));
}

#[test]
fn test_read_content_of_missing_record() {
    let fx = Fixture::new();
    assert!(matches!(
        fx.engine().read_content("nope"),
        Err(LifecycleError::NotFound(_))
    ));
}

#[test]
fn test_export_name_prefers_alias() {
    let fx = Fixture::new();
    let engine = fx.engine();
    let saved = engine.save(&input("https://example.com/", "Title: Part", "<html>")).unwrap();
    assert_eq!(export_name(&saved, 80), "Title_ Part.html");

    engine.set_alias(&saved.id, "My copy").unwrap();
    let renamed = engine.get(&saved.id).unwrap().unwrap();
    assert_eq!(export_name(&renamed, 80), "My copy.html");
}

#[test]
fn test_concurrent_saves_through_shared_app() {
    let tmp = tempfile::tempdir().unwrap();
    let app = Arc::new(App::open_at(tmp.path(), ServiceSettings::default()).unwrap());

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let app = Arc::clone(&app);
            thread::spawn(move || {
                let engine = app.lifecycle();
                for i in 0..5 {
                    let saved = engine
                        .save(&input(
                            &format!("https://host{}.test/{}", t, i),
                            &format!("page {}", i),
                            "<html>",
                        ))
                        .unwrap();
                    if i % 2 == 0 {
                        engine.soft_delete(&saved.id).unwrap();
                    }
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let stats = app.lifecycle().stats().unwrap();
    assert_eq!(stats.active_count, 16);
    assert_eq!(stats.trash_count, 24);
    assert_eq!(stats.total_bytes, 16 * "<html>".len() as i64);
}
