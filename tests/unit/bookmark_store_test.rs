//! Unit tests for the BookmarkStore public API.
//!
//! These tests exercise persistence through the `BookmarkStoreTrait`
//! interface, using an in-memory SQLite database.

use chrome_collect::database::Database;
use chrome_collect::managers::bookmark_store::{BookmarkStore, BookmarkStoreTrait, NewBookmark};
use chrome_collect::types::bookmark::ListFilter;
use rstest::rstest;

fn setup() -> Database {
    Database::open_in_memory().expect("Failed to open in-memory database")
}

fn insert(store: &BookmarkStore<'_>, id: &str, url: &str, title: &str, created_at: i64) {
    store
        .insert(&NewBookmark {
            id,
            url,
            title,
            favicon: "",
            file_path: &format!("pages/x/{}.html", id),
            thumb_path: "",
            file_size: 10,
            created_at,
            bookmark_id: "",
        })
        .unwrap();
}

#[test]
fn test_insert_then_get() {
    let db = setup();
    let store = BookmarkStore::new(&db);
    insert(&store, "a", "https://example.com/a", "A", 100);

    let b = store.get("a").unwrap().expect("row exists");
    assert_eq!(b.url, "https://example.com/a");
    assert_eq!(b.file_path, "pages/x/a.html");
    assert_eq!(b.deleted_at, 0);
    assert!(b.alias.is_empty());
    assert!(b.tags.is_empty());
}

#[test]
fn test_get_missing_is_none() {
    let db = setup();
    let store = BookmarkStore::new(&db);
    assert!(store.get("nope").unwrap().is_none());
}

#[test]
fn test_duplicate_id_is_rejected() {
    let db = setup();
    let store = BookmarkStore::new(&db);
    insert(&store, "a", "https://example.com/", "A", 1);
    let again = store.insert(&NewBookmark {
        id: "a",
        url: "https://example.com/",
        title: "",
        favicon: "",
        file_path: "",
        thumb_path: "",
        file_size: 0,
        created_at: 2,
        bookmark_id: "",
    });
    assert!(again.is_err());
}

#[test]
fn test_list_is_newest_first_and_windowed() {
    let db = setup();
    let store = BookmarkStore::new(&db);
    for i in 0..5 {
        insert(&store, &format!("id{}", i), "https://example.com/", "Page", i * 10);
    }

    let page = store.list(&ListFilter::All, 2, 1).unwrap();
    assert_eq!(page.total, 5);
    let ids: Vec<&str> = page.items.iter().map(|b| b.id.as_str()).collect();
    assert_eq!(ids, vec!["id3", "id2"]);
}

#[test]
fn test_negative_limit_means_unbounded() {
    let db = setup();
    let store = BookmarkStore::new(&db);
    for i in 0..5 {
        insert(&store, &format!("id{}", i), "https://example.com/", "Page", i * 10);
    }

    let page = store.list(&ListFilter::All, -1, 1).unwrap();
    assert_eq!(page.items.len(), 4);
    assert_eq!(store.list(&ListFilter::All, 0, 0).unwrap().items.len(), 0);
}

#[rstest]
#[case(ListFilter::UrlExact("https://rust-lang.org/".to_string()), vec!["r"])]
#[case(ListFilter::Text("rust".to_string()), vec!["n", "r"])]
#[case(ListFilter::Text("Example".to_string()), vec!["e"])]
#[case(ListFilter::All, vec!["n", "r", "e"])]
fn test_list_filters(#[case] filter: ListFilter, #[case] expected: Vec<&str>) {
    let db = setup();
    let store = BookmarkStore::new(&db);
    insert(&store, "e", "https://example.com/", "Example Domain", 1);
    insert(&store, "r", "https://rust-lang.org/", "Rust", 2);
    insert(&store, "n", "https://news.test/", "Rust news", 3);

    let page = store.list(&filter, 50, 0).unwrap();
    let ids: Vec<&str> = page.items.iter().map(|b| b.id.as_str()).collect();
    assert_eq!(ids, expected);
    assert_eq!(page.total as usize, expected.len());
}

#[test]
fn test_trashed_rows_leave_listing() {
    let db = setup();
    let store = BookmarkStore::new(&db);
    insert(&store, "a", "https://example.com/", "A", 1);
    insert(&store, "b", "https://example.com/", "B", 2);

    assert!(store.mark_deleted("a", 500).unwrap());
    assert!(!store.mark_deleted("a", 600).unwrap(), "already trashed");

    let page = store.list(&ListFilter::All, 50, 0).unwrap();
    assert_eq!(page.total, 1);
    let trash = store.list_trash().unwrap();
    assert_eq!(trash.len(), 1);
    assert_eq!(trash[0].deleted_at, 500);

    assert!(store.clear_deleted("a").unwrap());
    assert!(!store.clear_deleted("a").unwrap(), "already active");
    assert_eq!(store.list(&ListFilter::All, 50, 0).unwrap().total, 2);
}

#[test]
fn test_alias_and_notes_only_touch_active_rows() {
    let db = setup();
    let store = BookmarkStore::new(&db);
    insert(&store, "a", "https://example.com/", "A", 1);

    assert!(store.update_alias("a", "Mine").unwrap());
    assert!(store.update_notes("a", "read later").unwrap());
    assert!(!store.update_alias("missing", "x").unwrap());

    store.mark_deleted("a", 10).unwrap();
    assert!(!store.update_alias("a", "Other").unwrap());

    let b = store.get("a").unwrap().unwrap();
    assert_eq!(b.alias, "Mine");
    assert_eq!(b.notes, "read later");
}

#[test]
fn test_list_trashed_before_is_strict() {
    let db = setup();
    let store = BookmarkStore::new(&db);
    insert(&store, "a", "https://example.com/", "A", 1);
    insert(&store, "b", "https://example.com/", "B", 2);
    insert(&store, "c", "https://example.com/", "C", 3);
    store.mark_deleted("a", 99).unwrap();
    store.mark_deleted("b", 100).unwrap();

    let ids: Vec<String> = store
        .list_trashed_before(100)
        .unwrap()
        .into_iter()
        .map(|b| b.id)
        .collect();
    assert_eq!(ids, vec!["a".to_string()]);
}

#[test]
fn test_update_paths_and_delete() {
    let db = setup();
    let store = BookmarkStore::new(&db);
    insert(&store, "a", "https://example.com/", "A", 1);

    assert!(store.update_paths("a", "pages/example.com/A.html", "pages/example.com/A.png").unwrap());
    let b = store.get("a").unwrap().unwrap();
    assert_eq!(b.thumb_path, "pages/example.com/A.png");

    assert!(store.delete("a").unwrap());
    assert!(!store.delete("a").unwrap());
    assert!(store.list_all().unwrap().is_empty());
}

#[test]
fn test_stats() {
    let db = setup();
    let store = BookmarkStore::new(&db);
    assert_eq!(store.stats().unwrap().active_count, 0);

    insert(&store, "a", "https://example.com/", "A", 1);
    insert(&store, "b", "https://example.com/", "B", 2);
    insert(&store, "c", "https://example.com/", "C", 3);
    store.mark_deleted("c", 5).unwrap();

    let stats = store.stats().unwrap();
    assert_eq!(stats.active_count, 2);
    assert_eq!(stats.total_bytes, 20);
    assert_eq!(stats.trash_count, 1);
}
