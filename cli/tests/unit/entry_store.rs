//! File-backed entry store.

#![allow(clippy::expect_used)]

use tempfile::TempDir;
use vbmc_cli::application::ports::EntryStore;
use vbmc_cli::infra::entry_store::FileEntryStore;
use vbmc_common::FleetError;

use crate::helpers::entry;

#[test]
fn test_create_then_get_round_trips() {
    let dir = TempDir::new().expect("tempdir");
    let store = FileEntryStore::new(dir.path());
    let original = entry("vm1", false);

    store.create(&original).expect("create");

    assert_eq!(store.get("vm1").expect("get"), original);
    assert!(dir.path().join("vm1").join("config").is_file());
}

#[test]
fn test_record_survives_a_new_store_instance() {
    let dir = TempDir::new().expect("tempdir");
    FileEntryStore::new(dir.path())
        .create(&entry("vm1", true))
        .expect("create");

    let reopened = FileEntryStore::new(dir.path());

    assert!(reopened.get("vm1").expect("get").active);
}

#[test]
fn test_record_stores_active_as_canonical_string() {
    let dir = TempDir::new().expect("tempdir");
    let store = FileEntryStore::new(dir.path());
    store.create(&entry("vm1", true)).expect("create");

    let text = std::fs::read_to_string(dir.path().join("vm1/config")).expect("read");

    assert!(text.contains("active: 'true'") || text.contains("active: \"true\""), "{text}");
}

#[test]
fn test_put_replaces_record() {
    let dir = TempDir::new().expect("tempdir");
    let store = FileEntryStore::new(dir.path());
    store.create(&entry("vm1", false)).expect("create");

    store.put(&entry("vm1", true)).expect("put");

    assert!(store.get("vm1").expect("get").active);
}

#[test]
fn test_create_existing_is_already_exists() {
    let dir = TempDir::new().expect("tempdir");
    let store = FileEntryStore::new(dir.path());
    store.create(&entry("vm1", false)).expect("create");

    let err = store.create(&entry("vm1", true)).expect_err("duplicate");

    assert!(matches!(err, FleetError::AlreadyExists(_)));
    assert!(!store.get("vm1").expect("get").active);
}

#[test]
fn test_get_missing_is_not_found() {
    let dir = TempDir::new().expect("tempdir");
    let store = FileEntryStore::new(dir.path());

    assert!(matches!(store.get("vm1"), Err(FleetError::NotFound(_))));
}

#[test]
fn test_delete_removes_directory() {
    let dir = TempDir::new().expect("tempdir");
    let store = FileEntryStore::new(dir.path());
    store.create(&entry("vm1", false)).expect("create");

    store.delete("vm1").expect("delete");

    assert!(!dir.path().join("vm1").exists());
    assert!(!store.contains("vm1"));
}

#[test]
fn test_delete_missing_is_not_found() {
    let dir = TempDir::new().expect("tempdir");
    let store = FileEntryStore::new(dir.path());

    assert!(matches!(store.delete("vm1"), Err(FleetError::NotFound(_))));
}

#[test]
fn test_list_missing_root_is_empty() {
    let dir = TempDir::new().expect("tempdir");
    let store = FileEntryStore::new(dir.path().join("not-yet"));

    assert!(store.list().expect("list").is_empty());
}

#[test]
fn test_list_skips_stray_files_and_corrupt_records() {
    let dir = TempDir::new().expect("tempdir");
    let store = FileEntryStore::new(dir.path());
    store.create(&entry("vm1", false)).expect("create");
    store.create(&entry("vm2", true)).expect("create");
    std::fs::write(dir.path().join("README"), "not a domain").expect("stray file");
    std::fs::create_dir(dir.path().join("broken")).expect("dir");
    std::fs::write(dir.path().join("broken/config"), ":::: not yaml [").expect("corrupt");

    let mut names: Vec<String> = store
        .list()
        .expect("list")
        .into_iter()
        .map(|e| e.domain_name)
        .collect();
    names.sort();

    assert_eq!(names, vec!["vm1", "vm2"]);
    assert!(store.contains("broken"), "unreadable slots still count as taken");
}

#[test]
fn test_invalid_names_never_touch_the_filesystem() {
    let dir = TempDir::new().expect("tempdir");
    let store = FileEntryStore::new(dir.path().join("store"));

    for name in ["", ".", "..", "a/b", "../escape"] {
        assert!(store.get(name).is_err(), "{name:?}");
        assert!(!store.contains(name), "{name:?}");
    }
    assert!(!dir.path().join("escape").exists());
}
