//! spacesaver - on-demand HEVC transcoding service
//!
//! Scans configured source directories once, persists discovered media as a
//! SQLite-backed state machine, and lazily re-encodes candidates to HEVC on
//! admission, exposing progress and control over a small HTTP surface.

pub mod admission;
pub mod config;
pub mod driver;
pub mod prober;
pub mod scanner;
pub mod server;
