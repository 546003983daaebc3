//! History persistence through the file-backed storage
mod common;

use std::fs;

use command_palette::history::{FileStorage, HistoryStore, Storage};
use command_palette::models::{HistoryEntry, HistoryKind};
use common::TestHome;

const KEY: &str = "command_palette_history";

fn open(home: &TestHome, max: usize) -> HistoryStore {
    HistoryStore::load(Box::new(FileStorage::new(home.data_dir())), KEY, max)
}

fn queries(store: &HistoryStore) -> Vec<String> {
    store.list().iter().map(|e| e.query.clone()).collect()
}

#[test]
fn test_history_survives_restart() {
    let home = TestHome::new();
    {
        let mut store = open(&home, 10);
        store.add(HistoryEntry::new("dupont", HistoryKind::Search));
        store.add(HistoryEntry::new("/tasks", HistoryKind::Navigation));
        store.add(HistoryEntry::new("dupont", HistoryKind::Search));
    }

    let store = open(&home, 10);
    assert_eq!(queries(&store), vec!["dupont", "/tasks"]);
    assert_eq!(store.list()[1].kind, HistoryKind::Navigation);
}

#[test]
fn test_history_bound_after_restart() {
    let home = TestHome::new();
    {
        let mut store = open(&home, 10);
        for i in 0..11 {
            store.add(HistoryEntry::at(format!("query {i}"), HistoryKind::Search, i));
        }
    }

    let store = open(&home, 10);
    assert_eq!(store.len(), 10);
    assert_eq!(store.list()[0].query, "query 10");
    assert!(!queries(&store).contains(&"query 0".to_string()));
}

#[test]
fn test_corrupt_file_is_empty_history_and_gets_replaced() {
    let home = TestHome::new();
    fs::create_dir_all(home.data_dir()).unwrap();
    let path = home.data_dir().join(format!("{KEY}.json"));
    fs::write(&path, "[{\"query\": \"half").unwrap();

    let mut store = open(&home, 10);
    assert!(store.is_empty());

    store.add(HistoryEntry::new("acme", HistoryKind::Search));
    let reopened = open(&home, 10);
    assert_eq!(queries(&reopened), vec!["acme"]);
}

#[test]
fn test_non_array_file_is_empty_history() {
    let home = TestHome::new();
    fs::create_dir_all(home.data_dir()).unwrap();
    fs::write(home.data_dir().join(format!("{KEY}.json")), r#"{"query": "dupont"}"#).unwrap();

    assert!(open(&home, 10).is_empty());
}

#[test]
fn test_clear_removes_file() {
    let home = TestHome::new();
    let mut store = open(&home, 10);
    store.add(HistoryEntry::new("dupont", HistoryKind::Search));
    assert!(home.data_dir().join(format!("{KEY}.json")).exists());

    store.clear();
    assert!(!home.data_dir().join(format!("{KEY}.json")).exists());
    assert!(FileStorage::new(home.data_dir()).get(KEY).is_none());
}

#[cfg(unix)]
#[test]
fn test_unwritable_directory_is_swallowed() {
    use std::os::unix::fs::PermissionsExt;

    let home = TestHome::new();
    let dir = home.data_dir();
    fs::create_dir_all(&dir).unwrap();
    fs::set_permissions(&dir, fs::Permissions::from_mode(0o500)).unwrap();

    // Root ignores directory permissions
    let write_check = dir.join("write_check");
    if fs::write(&write_check, "x").is_ok() {
        fs::remove_file(write_check).unwrap();
        eprintln!("Skipping: directory permissions are not enforced");
        return;
    }

    let mut store = open(&home, 10);
    store.add(HistoryEntry::new("dupont", HistoryKind::Search));
    assert_eq!(queries(&store), vec!["dupont"]);
    assert!(store.is_dirty());

    fs::set_permissions(&dir, fs::Permissions::from_mode(0o700)).unwrap();
    store.add(HistoryEntry::new("acme", HistoryKind::Search));
    assert!(!store.is_dirty());
    assert_eq!(queries(&open(&home, 10)), vec!["acme", "dupont"]);
}
