//! Spacesaver-DB: SQLite schema, entities, and the Store.
//!
//! This crate provides database functionality for spacesaver using SQLite
//! with rusqlite and r2d2 connection pooling.
//!
//! # Modules
//!
//! - `schema` - canonical table definitions and startup validation
//! - `entities` - row types for `entries`, `metadata`, `progress`
//! - `pool` - connection pool management
//! - `store` - the Store: all persisted state, reachable through the pool
//!
//! # Example
//!
//! ```no_run
//! use spacesaver_db::pool::init_pool;
//! use spacesaver_db::store::Store;
//!
//! let pool = init_pool("/var/lib/spacesaver/state.db").unwrap();
//! let store = Store::new(pool);
//!
//! let entries = store.list_entries().unwrap();
//! println!("{} entries on record", entries.len());
//! ```

pub mod entities;
pub mod pool;
pub mod schema;
pub mod store;

pub use entities::{Entry, Metadata, MetadataKind, Progress, ProgressUpdate, Status};
pub use store::Store;
