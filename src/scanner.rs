//! One-shot source scanner: the only writer of new [`Entry`] rows.
//!
//! Runs once at process startup (or via the `scan` subcommand), walking each
//! configured source directory to a bounded depth and inserting an Entry +
//! Declared/Actual metadata + PENDING progress row for every new candidate.

use std::path::Path;

use spacesaver_common::{classify, fingerprint, paths::is_media_file, EntryId};
use spacesaver_db::{Entry, Metadata, MetadataKind, Store};
use walkdir::WalkDir;

use crate::config::Config;
use crate::prober;

/// Maximum relative depth (source dir itself is depth 0) the scanner walks.
const MAX_DEPTH: usize = 3;

/// Summary of one scan pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanSummary {
    pub added: u64,
    pub skipped: u64,
    pub errors: u64,
}

/// Walk every configured source directory and insert newly discovered
/// entries into the store. Missing source directories are logged and
/// skipped, not treated as an error.
pub fn scan(store: &Store, config: &Config) -> ScanSummary {
    let mut summary = ScanSummary::default();

    for source_dir in &config.source_dirs {
        let root = Path::new(source_dir);
        if !root.exists() {
            tracing::warn!(event = "scan_source_dir_missing", dir = %source_dir, "source directory does not exist");
            continue;
        }
        scan_directory(store, config, root, &mut summary);
    }

    tracing::info!(
        event = "scan_complete",
        added = summary.added,
        skipped = summary.skipped,
        errors = summary.errors,
        "scan complete"
    );
    summary
}

fn scan_directory(store: &Store, config: &Config, root: &Path, summary: &mut ScanSummary) {
    let walker = WalkDir::new(root).max_depth(MAX_DEPTH).into_iter();
    for entry in walker.filter_map(|e| e.ok()) {
        let path = entry.path();
        if !path.is_file() || !is_media_file(path) {
            continue;
        }
        scan_file(store, config, path, summary);
    }
}

fn scan_file(store: &Store, config: &Config, path: &Path, summary: &mut ScanSummary) {
    let hash = match fingerprint::hash_file(path) {
        Ok(h) => h,
        Err(e) => {
            tracing::warn!(event = "scan_file_error", path = %path.display(), error = %e, "failed to hash file");
            summary.errors += 1;
            return;
        }
    };

    let size = match std::fs::metadata(path) {
        Ok(meta) => meta.len() as i64,
        Err(e) => {
            tracing::warn!(event = "scan_file_error", path = %path.display(), error = %e, "failed to stat file");
            summary.errors += 1;
            return;
        }
    };

    let path_str = path.display().to_string();
    match store.get_entry_by_hash_and_path(&hash, &path_str) {
        Ok(Some(_)) => {
            summary.skipped += 1;
            return;
        }
        Ok(None) => {}
        Err(e) => {
            tracing::warn!(event = "scan_file_error", path = %path.display(), error = %e, "dedup lookup failed");
            summary.errors += 1;
            return;
        }
    }

    let uuid = EntryId::new();
    let basename = path.file_name().and_then(|n| n.to_str()).unwrap_or("");

    let declared = classify::classify(basename);
    let name = classify::clean_name(basename);

    let declared_metadata = Metadata {
        uuid,
        kind: MetadataKind::Declared,
        codec: declared.codec,
        format: declared.format,
        sar: declared.sar,
        dar: declared.dar,
        resolution: declared.resolution,
        framerate: declared.framerate.parse().unwrap_or(0.0),
        extra: serde_json::json!({}),
    };

    let actual_metadata = prober::probe_actual(uuid, path, config);

    let entry = Entry {
        uuid,
        name,
        hash,
        path: path_str,
        size,
    };

    match store.insert_entry_with_metadata_and_progress(&entry, &[declared_metadata, actual_metadata]) {
        Ok(()) => {
            tracing::info!(event = "scan_file_added", uuid = %uuid, path = %path.display(), "added new entry");
            summary.added += 1;
        }
        Err(e) => {
            tracing::warn!(event = "scan_file_error", uuid = %uuid, path = %path.display(), error = %e, "failed to insert entry");
            summary.errors += 1;
        }
    }
}

