//! Scanner integration tests: walks a `tempfile::tempdir()` fixture tree and
//! checks what lands in the Store.

mod common;

use spacesaver::config::Config;
use spacesaver::scanner::{self, ScanSummary};
use spacesaver_db::Status;
use std::fs;

fn config_for(source_dirs: Vec<String>) -> Config {
    Config { source_dirs, ..Config::default() }
}

#[test]
fn scans_new_media_file_into_pending_entry() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("Movie.2020.1080p.mkv"), vec![0u8; 1024]).unwrap();

    let store = common::test_store();
    let config = config_for(vec![dir.path().to_string_lossy().to_string()]);

    let summary = scanner::scan(&store, &config);
    assert_eq!(summary, ScanSummary { added: 1, skipped: 0, errors: 0 });

    let entries = store.list_entries().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].name, "Movie");

    let progress = store.get_progress(entries[0].uuid).unwrap().unwrap();
    assert_eq!(progress.status, Status::Pending);
}

#[test]
fn ignores_non_media_extensions() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("readme.txt"), b"hello").unwrap();

    let store = common::test_store();
    let config = config_for(vec![dir.path().to_string_lossy().to_string()]);

    let summary = scanner::scan(&store, &config);
    assert_eq!(summary, ScanSummary::default());
}

#[test]
fn rescanning_skips_already_known_entries() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("Movie.mkv"), vec![1u8; 100]).unwrap();

    let store = common::test_store();
    let config = config_for(vec![dir.path().to_string_lossy().to_string()]);

    let first = scanner::scan(&store, &config);
    assert_eq!(first.added, 1);

    let second = scanner::scan(&store, &config);
    assert_eq!(second, ScanSummary { added: 0, skipped: 1, errors: 0 });
}

#[test]
fn missing_source_dir_is_logged_not_erred() {
    let store = common::test_store();
    let config = config_for(vec!["/no/such/dir".to_string()]);

    let summary = scanner::scan(&store, &config);
    assert_eq!(summary, ScanSummary::default());
}

#[test]
fn does_not_descend_past_max_depth() {
    let dir = tempfile::tempdir().unwrap();
    let mut deep = dir.path().to_path_buf();
    for level in 0..6 {
        deep = deep.join(format!("d{level}"));
        fs::create_dir_all(&deep).unwrap();
    }
    fs::write(deep.join("Too.Deep.mkv"), vec![0u8; 10]).unwrap();

    let store = common::test_store();
    let config = config_for(vec![dir.path().to_string_lossy().to_string()]);

    let summary = scanner::scan(&store, &config);
    assert_eq!(summary.added, 0);
}
