//! Canonical schema definition and startup validation.
//!
//! The schema is intentionally not versioned or migrated: on startup the
//! current `sqlite_master` definition of `entries`, `metadata`, `progress`,
//! and their indexes is compared against the expected DDL below. A mismatch
//! means the on-disk schema predates an incompatible change, and the three
//! tables (indexes go with them) are dropped and recreated from scratch
//! rather than migrated in place.

use rusqlite::Connection;
use spacesaver_common::{Error, Result};

const SCHEMA_SQL: &str = "\
CREATE TABLE entries (uuid TEXT PRIMARY KEY, name TEXT NOT NULL, hash TEXT NOT NULL, path TEXT NOT NULL, size INTEGER NOT NULL);
CREATE TABLE metadata (uuid TEXT NOT NULL REFERENCES entries(uuid), kind TEXT NOT NULL, codec TEXT NOT NULL DEFAULT 'Unknown', format TEXT NOT NULL DEFAULT 'Unknown', sar TEXT NOT NULL DEFAULT 'Unknown', dar TEXT NOT NULL DEFAULT 'Unknown', resolution TEXT NOT NULL DEFAULT 'Unknown', framerate REAL NOT NULL DEFAULT 0.0, extra TEXT NOT NULL DEFAULT '{}', PRIMARY KEY (uuid, kind));
CREATE TABLE progress (uuid TEXT PRIMARY KEY REFERENCES entries(uuid), status TEXT NOT NULL DEFAULT 'pending', progress REAL NOT NULL DEFAULT 0.0, frame_current INTEGER NOT NULL DEFAULT 0, frame_total INTEGER NOT NULL DEFAULT 0, workfile TEXT);
CREATE INDEX idx_entries_hash ON entries(hash);
CREATE INDEX idx_entries_path ON entries(path);
CREATE INDEX idx_entries_size_desc ON entries(size DESC);
CREATE INDEX idx_progress_status ON progress(status);
";

fn expected_tables() -> [(&'static str, &'static str); 3] {
    [
        (
            "entries",
            "CREATE TABLE entries (uuid TEXT PRIMARY KEY, name TEXT NOT NULL, hash TEXT NOT NULL, path TEXT NOT NULL, size INTEGER NOT NULL)",
        ),
        (
            "metadata",
            "CREATE TABLE metadata (uuid TEXT NOT NULL REFERENCES entries(uuid), kind TEXT NOT NULL, codec TEXT NOT NULL DEFAULT 'Unknown', format TEXT NOT NULL DEFAULT 'Unknown', sar TEXT NOT NULL DEFAULT 'Unknown', dar TEXT NOT NULL DEFAULT 'Unknown', resolution TEXT NOT NULL DEFAULT 'Unknown', framerate REAL NOT NULL DEFAULT 0.0, extra TEXT NOT NULL DEFAULT '{}', PRIMARY KEY (uuid, kind))",
        ),
        (
            "progress",
            "CREATE TABLE progress (uuid TEXT PRIMARY KEY REFERENCES entries(uuid), status TEXT NOT NULL DEFAULT 'pending', progress REAL NOT NULL DEFAULT 0.0, frame_current INTEGER NOT NULL DEFAULT 0, frame_total INTEGER NOT NULL DEFAULT 0, workfile TEXT)",
        ),
    ]
}

fn expected_indexes() -> [(&'static str, &'static str); 4] {
    [
        ("idx_entries_hash", "CREATE INDEX idx_entries_hash ON entries(hash)"),
        ("idx_entries_path", "CREATE INDEX idx_entries_path ON entries(path)"),
        (
            "idx_entries_size_desc",
            "CREATE INDEX idx_entries_size_desc ON entries(size DESC)",
        ),
        ("idx_progress_status", "CREATE INDEX idx_progress_status ON progress(status)"),
    ]
}

/// Collapse whitespace runs so schema text can be compared structurally.
pub fn normalise_sql(sql: &str) -> String {
    sql.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Compare the current schema against the expected definition, dropping and
/// recreating `metadata`, `progress`, `entries` (in FK-safe order, indexes
/// along with them) on any mismatch.
///
/// Returns `true` if the existing schema already matched, `false` if it was
/// dropped and recreated.
pub fn validate_schema(conn: &Connection) -> Result<bool> {
    let mut stmt = conn
        .prepare(
            "SELECT name, sql FROM sqlite_master WHERE type IN ('table', 'index') \
             AND name IN ('entries', 'metadata', 'progress', \
             'idx_entries_hash', 'idx_entries_path', 'idx_entries_size_desc', 'idx_progress_status')",
        )
        .map_err(|e| Error::database(e.to_string()))?;

    let mut existing = std::collections::HashMap::new();
    let rows = stmt
        .query_map([], |row| {
            let name: String = row.get(0)?;
            let sql: String = row.get(1)?;
            Ok((name, sql))
        })
        .map_err(|e| Error::database(e.to_string()))?;
    for row in rows {
        let (name, sql) = row.map_err(|e| Error::database(e.to_string()))?;
        existing.insert(name, normalise_sql(&sql));
    }
    drop(stmt);

    let expected_tables = expected_tables();
    let expected_indexes = expected_indexes();
    let matches = existing.len() == expected_tables.len() + expected_indexes.len()
        && expected_tables
            .iter()
            .chain(expected_indexes.iter())
            .all(|(name, sql)| existing.get(*name).map(|s| s.as_str()) == Some(normalise_sql(sql).as_str()));

    if matches {
        tracing::info!(event = "db_schema_validated", "schema matches expected definition");
        return Ok(true);
    }

    tracing::warn!(
        event = "db_schema_mismatch_dropped",
        existing_tables = ?existing.keys().collect::<Vec<_>>(),
        "schema did not match, dropping all tables"
    );
    conn.execute_batch(
        "DROP TABLE IF EXISTS metadata; DROP TABLE IF EXISTS progress; DROP TABLE IF EXISTS entries;",
    )
    .map_err(|e| Error::database(e.to_string()))?;
    conn.execute_batch(SCHEMA_SQL)
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_schema_from_empty_database() {
        let conn = Connection::open_in_memory().unwrap();
        let was_valid = validate_schema(&conn).unwrap();
        assert!(!was_valid);

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name IN ('entries','metadata','progress')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 3);

        let index_count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='index' AND name IN \
                 ('idx_entries_hash','idx_entries_path','idx_entries_size_desc','idx_progress_status')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(index_count, 4);
    }

    #[test]
    fn recognises_already_valid_schema() {
        let conn = Connection::open_in_memory().unwrap();
        validate_schema(&conn).unwrap();
        let was_valid = validate_schema(&conn).unwrap();
        assert!(was_valid);
    }

    #[test]
    fn drops_and_recreates_on_stale_schema() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE entries (uuid TEXT PRIMARY KEY, name TEXT)")
            .unwrap();
        let was_valid = validate_schema(&conn).unwrap();
        assert!(!was_valid);

        let cols: i64 = conn
            .query_row("SELECT COUNT(*) FROM pragma_table_info('entries')", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(cols, 5);
    }

    #[test]
    fn drops_and_recreates_when_an_index_is_missing() {
        let conn = Connection::open_in_memory().unwrap();
        validate_schema(&conn).unwrap();
        conn.execute_batch("DROP INDEX idx_progress_status;").unwrap();

        let was_valid = validate_schema(&conn).unwrap();
        assert!(!was_valid);

        let index_count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='index' AND name = 'idx_progress_status'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(index_count, 1);
    }

    #[test]
    fn normalise_sql_collapses_whitespace() {
        assert_eq!(normalise_sql("CREATE   TABLE\n  x (a INT)"), "CREATE TABLE x (a INT)");
    }
}
