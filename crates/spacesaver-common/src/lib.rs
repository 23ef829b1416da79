//! Spacesaver-Common: Shared types, IDs, and utilities.
//!
//! This crate provides common functionality used across the transcoding
//! service:
//!
//! - **Typed IDs**: a type-safe UUID wrapper for entries
//! - **Path Utilities**: functions to detect candidate media files by extension
//! - **Fingerprinting**: fast, size-aware content hashing for dedup
//! - **Classification**: pure filename-to-metadata parsing
//! - **Error Handling**: the common error type and result alias
//!
//! # Examples
//!
//! ```
//! use spacesaver_common::{EntryId, Error, Result};
//! use spacesaver_common::paths::is_media_file;
//! use std::path::Path;
//!
//! // Create a typed ID
//! let entry_id = EntryId::new();
//!
//! // Check file types
//! assert!(is_media_file(Path::new("movie.mkv")));
//!
//! // Use common error types
//! fn example() -> Result<()> {
//!     Err(Error::not_found("entry"))
//! }
//! ```

pub mod classify;
pub mod error;
pub mod fingerprint;
pub mod ids;
pub mod paths;

pub use error::{Error, Result};
pub use ids::*;
