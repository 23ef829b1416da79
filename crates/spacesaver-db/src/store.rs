//! The Store: the sole owner of the `entries`, `metadata`, and `progress`
//! tables, reachable through a pooled connection.

use std::collections::HashMap;

use rusqlite::{params, OptionalExtension};
use spacesaver_common::{Error, EntryId, Result};

use crate::entities::{Entry, Metadata, MetadataKind, Progress, ProgressUpdate, Status};
use crate::pool::DbPool;

/// Thread-safe handle to the database. Cloning shares the underlying pool.
#[derive(Clone)]
pub struct Store {
    pool: DbPool,
}

impl Store {
    /// Wrap an already-initialised pool (schema validated at pool creation).
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> Result<r2d2::PooledConnection<r2d2_sqlite::SqliteConnectionManager>> {
        self.pool
            .get()
            .map_err(|e| Error::database(format!("failed to get connection from pool: {e}")))
    }

    /// Insert a new Entry with its Declared/Actual metadata and a PENDING
    /// Progress row, all in one transaction.
    pub fn insert_entry_with_metadata_and_progress(
        &self,
        entry: &Entry,
        metadata: &[Metadata],
    ) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| Error::database(e.to_string()))?;

        tx.execute(
            "INSERT OR IGNORE INTO entries (uuid, name, hash, path, size) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![entry.uuid.to_string(), entry.name, entry.hash, entry.path, entry.size],
        )
        .map_err(|e| Error::database(e.to_string()))?;

        for meta in metadata {
            insert_metadata_tx(&tx, meta)?;
        }

        tx.execute(
            "INSERT OR IGNORE INTO progress (uuid, status, progress, frame_current, frame_total, workfile) \
             VALUES (?1, ?2, 0.0, 0, 0, NULL)",
            params![entry.uuid.to_string(), Status::Pending.as_str()],
        )
        .map_err(|e| Error::database(e.to_string()))?;

        tx.commit().map_err(|e| Error::database(e.to_string()))
    }

    pub fn get_entry_by_uuid(&self, uuid: EntryId) -> Result<Option<Entry>> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT uuid, name, hash, path, size FROM entries WHERE uuid = ?1",
            params![uuid.to_string()],
            row_to_entry,
        )
        .optional()
        .map_err(|e| Error::database(e.to_string()))
    }

    pub fn get_entry_by_hash_and_path(&self, hash: &str, path: &str) -> Result<Option<Entry>> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT uuid, name, hash, path, size FROM entries WHERE hash = ?1 AND path = ?2",
            params![hash, path],
            row_to_entry,
        )
        .optional()
        .map_err(|e| Error::database(e.to_string()))
    }

    pub fn list_entries(&self) -> Result<Vec<Entry>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT uuid, name, hash, path, size FROM entries ORDER BY rowid ASC")
            .map_err(|e| Error::database(e.to_string()))?;
        let rows = stmt
            .query_map([], row_to_entry)
            .map_err(|e| Error::database(e.to_string()))?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| Error::database(e.to_string()))
    }

    pub fn get_metadata(&self, uuid: EntryId, kind: MetadataKind) -> Result<Option<Metadata>> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT uuid, kind, codec, format, sar, dar, resolution, framerate, extra \
             FROM metadata WHERE uuid = ?1 AND kind = ?2",
            params![uuid.to_string(), kind.as_str()],
            row_to_metadata,
        )
        .optional()
        .map_err(|e| Error::database(e.to_string()))
    }

    pub fn get_all_metadata(&self, uuid: EntryId) -> Result<Vec<Metadata>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT uuid, kind, codec, format, sar, dar, resolution, framerate, extra \
                 FROM metadata WHERE uuid = ?1",
            )
            .map_err(|e| Error::database(e.to_string()))?;
        let rows = stmt
            .query_map(params![uuid.to_string()], row_to_metadata)
            .map_err(|e| Error::database(e.to_string()))?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| Error::database(e.to_string()))
    }

    pub fn get_progress(&self, uuid: EntryId) -> Result<Option<Progress>> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT uuid, status, progress, frame_current, frame_total, workfile \
             FROM progress WHERE uuid = ?1",
            params![uuid.to_string()],
            row_to_progress,
        )
        .optional()
        .map_err(|e| Error::database(e.to_string()))
    }

    pub fn set_status(&self, uuid: EntryId, status: Status) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "UPDATE progress SET status = ?1 WHERE uuid = ?2",
            params![status.as_str(), uuid.to_string()],
        )
        .map_err(|e| Error::database(e.to_string()))?;
        Ok(())
    }

    /// Apply a partial update to a progress row; unset fields are left as-is.
    pub fn update_progress(&self, uuid: EntryId, update: &ProgressUpdate) -> Result<()> {
        let mut clauses = Vec::new();
        let mut values: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(status) = update.status {
            clauses.push("status = ?");
            values.push(Box::new(status.as_str().to_string()));
        }
        if let Some(progress) = update.progress {
            clauses.push("progress = ?");
            values.push(Box::new(progress));
        }
        if let Some(frame_current) = update.frame_current {
            clauses.push("frame_current = ?");
            values.push(Box::new(frame_current));
        }
        if let Some(frame_total) = update.frame_total {
            clauses.push("frame_total = ?");
            values.push(Box::new(frame_total));
        }
        if let Some(ref workfile) = update.workfile {
            clauses.push("workfile = ?");
            values.push(Box::new(workfile.clone()));
        }

        if clauses.is_empty() {
            return Ok(());
        }

        let sql = format!(
            "UPDATE progress SET {} WHERE uuid = ?",
            clauses.join(", ")
        );
        values.push(Box::new(uuid.to_string()));

        let conn = self.conn()?;
        let params: Vec<&dyn rusqlite::ToSql> = values.iter().map(|v| v.as_ref()).collect();
        conn.execute(&sql, params.as_slice())
            .map_err(|e| Error::database(e.to_string()))?;
        Ok(())
    }

    pub fn count_by_status(&self) -> Result<HashMap<String, i64>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT status, COUNT(*) FROM progress GROUP BY status")
            .map_err(|e| Error::database(e.to_string()))?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))
            .map_err(|e| Error::database(e.to_string()))?;
        let mut out = HashMap::new();
        for row in rows {
            let (status, count) = row.map_err(|e| Error::database(e.to_string()))?;
            out.insert(status, count);
        }
        Ok(out)
    }

    pub fn has_active_queue(&self) -> Result<bool> {
        let conn = self.conn()?;
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM progress WHERE status IN (?1, ?2)",
                params![Status::Queued.as_str(), Status::InProgress.as_str()],
                |row| row.get(0),
            )
            .map_err(|e| Error::database(e.to_string()))?;
        Ok(count > 0)
    }

    /// The largest Entry whose Progress is PENDING, ties broken by insertion
    /// order.
    pub fn query_best_candidate(&self) -> Result<Option<Entry>> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT e.uuid, e.name, e.hash, e.path, e.size FROM entries e \
             JOIN progress p ON e.uuid = p.uuid \
             WHERE p.status = ?1 \
             ORDER BY e.size DESC, e.rowid ASC LIMIT 1",
            params![Status::Pending.as_str()],
            row_to_entry,
        )
        .optional()
        .map_err(|e| Error::database(e.to_string()))
    }

    /// Reset every IN_PROGRESS row back to PENDING, clearing progress and
    /// workfile. Run once at Encoder Driver startup to recover from a crash
    /// mid-encode.
    pub fn reset_in_progress_to_pending(&self) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "UPDATE progress SET status = ?1, progress = 0.0, frame_current = 0, workfile = NULL \
             WHERE status = ?2",
            params![Status::Pending.as_str(), Status::InProgress.as_str()],
        )
        .map_err(|e| Error::database(e.to_string()))?;
        Ok(())
    }

    /// The oldest-inserted QUEUED Entry.
    pub fn pick_next_queued(&self) -> Result<Option<Entry>> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT e.uuid, e.name, e.hash, e.path, e.size FROM entries e \
             JOIN progress p ON e.uuid = p.uuid \
             WHERE p.status = ?1 \
             ORDER BY e.rowid ASC LIMIT 1",
            params![Status::Queued.as_str()],
            row_to_entry,
        )
        .optional()
        .map_err(|e| Error::database(e.to_string()))
    }
}

fn insert_metadata_tx(tx: &rusqlite::Transaction<'_>, meta: &Metadata) -> Result<()> {
    tx.execute(
        "INSERT OR REPLACE INTO metadata \
         (uuid, kind, codec, format, sar, dar, resolution, framerate, extra) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            meta.uuid.to_string(),
            meta.kind.as_str(),
            meta.codec,
            meta.format,
            meta.sar,
            meta.dar,
            meta.resolution,
            meta.framerate,
            meta.extra.to_string(),
        ],
    )
    .map_err(|e| Error::database(e.to_string()))?;
    Ok(())
}

fn row_to_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<Entry> {
    let uuid_str: String = row.get(0)?;
    Ok(Entry {
        uuid: uuid_str.parse().map_err(|_| {
            rusqlite::Error::InvalidColumnType(0, "uuid".into(), rusqlite::types::Type::Text)
        })?,
        name: row.get(1)?,
        hash: row.get(2)?,
        path: row.get(3)?,
        size: row.get(4)?,
    })
}

fn row_to_metadata(row: &rusqlite::Row<'_>) -> rusqlite::Result<Metadata> {
    let uuid_str: String = row.get(0)?;
    let kind_str: String = row.get(1)?;
    let extra_str: String = row.get(8)?;
    Ok(Metadata {
        uuid: uuid_str.parse().map_err(|_| {
            rusqlite::Error::InvalidColumnType(0, "uuid".into(), rusqlite::types::Type::Text)
        })?,
        kind: kind_str.parse().map_err(|_| {
            rusqlite::Error::InvalidColumnType(1, "kind".into(), rusqlite::types::Type::Text)
        })?,
        codec: row.get(2)?,
        format: row.get(3)?,
        sar: row.get(4)?,
        dar: row.get(5)?,
        resolution: row.get(6)?,
        framerate: row.get(7)?,
        extra: serde_json::from_str(&extra_str).unwrap_or_else(|_| serde_json::json!({})),
    })
}

fn row_to_progress(row: &rusqlite::Row<'_>) -> rusqlite::Result<Progress> {
    let uuid_str: String = row.get(0)?;
    let status_str: String = row.get(1)?;
    Ok(Progress {
        uuid: uuid_str.parse().map_err(|_| {
            rusqlite::Error::InvalidColumnType(0, "uuid".into(), rusqlite::types::Type::Text)
        })?,
        status: status_str.parse().map_err(|_| {
            rusqlite::Error::InvalidColumnType(1, "status".into(), rusqlite::types::Type::Text)
        })?,
        progress: row.get(2)?,
        frame_current: row.get(3)?,
        frame_total: row.get(4)?,
        workfile: row.get(5)?,
    })
}
