//! Database connection pool management.
//!
//! This module provides connection pooling for SQLite using r2d2.
//! It handles pool initialization, connection customization, and schema
//! validation.

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use spacesaver_common::{Error, Result};

use crate::schema;

/// Type alias for the database connection pool.
pub type DbPool = Pool<SqliteConnectionManager>;

/// Type alias for a pooled database connection.
pub type PooledConnection = r2d2::PooledConnection<SqliteConnectionManager>;

/// Initialize a new database pool with the given file path.
///
/// This function will:
/// - Create the SQLite database file if it doesn't exist
/// - Set up connection pooling with r2d2
/// - Enable foreign key constraints on all connections
/// - Validate the schema, dropping and recreating it on mismatch
/// - Set appropriate pool size (default 4 connections)
pub fn init_pool(db_path: &str) -> Result<DbPool> {
    let manager = SqliteConnectionManager::file(db_path)
        .with_init(|conn| conn.execute_batch("PRAGMA foreign_keys = ON;"));

    let pool = Pool::builder()
        .max_size(4)
        .build(manager)
        .map_err(|e| Error::database(format!("failed to create connection pool: {e}")))?;

    let conn = pool
        .get()
        .map_err(|e| Error::database(format!("failed to get connection for schema check: {e}")))?;
    schema::validate_schema(&conn)?;

    Ok(pool)
}

/// Initialize an in-memory database pool, primarily for tests.
///
/// Uses a single connection so all pooled handles see the same in-memory
/// database; SQLite's `:memory:` databases are otherwise per-connection.
pub fn init_memory_pool() -> Result<DbPool> {
    let manager =
        SqliteConnectionManager::memory().with_init(|conn| conn.execute_batch("PRAGMA foreign_keys = ON;"));

    let pool = Pool::builder()
        .max_size(1)
        .build(manager)
        .map_err(|e| Error::database(format!("failed to create in-memory pool: {e}")))?;

    let conn = pool
        .get()
        .map_err(|e| Error::database(format!("failed to get connection for schema check: {e}")))?;
    schema::validate_schema(&conn)?;

    Ok(pool)
}

/// Get a connection from the pool.
pub fn get_conn(pool: &DbPool) -> Result<PooledConnection> {
    pool.get()
        .map_err(|e| Error::database(format!("failed to get connection from pool: {e}")))
}
