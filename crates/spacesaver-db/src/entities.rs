//! Row types for the `entries`, `metadata`, and `progress` tables.

use serde::{Deserialize, Serialize};
use spacesaver_common::{Error, EntryId};

/// A discovered media file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub uuid: EntryId,
    pub name: String,
    pub hash: String,
    pub path: String,
    pub size: i64,
}

/// Distinguishes the filename-derived guess from the ffprobe-measured truth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetadataKind {
    Declared,
    Actual,
}

impl MetadataKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Declared => "declared",
            Self::Actual => "actual",
        }
    }
}

impl std::str::FromStr for MetadataKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "declared" => Ok(Self::Declared),
            "actual" => Ok(Self::Actual),
            other => Err(Error::invalid_input(format!("unknown metadata kind: {other}"))),
        }
    }
}

/// A declared (filename-derived) or actual (ffprobe-measured) metadata row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub uuid: EntryId,
    pub kind: MetadataKind,
    pub codec: String,
    pub format: String,
    pub sar: String,
    pub dar: String,
    pub resolution: String,
    pub framerate: f64,
    pub extra: serde_json::Value,
}

impl Metadata {
    /// An all-`Unknown` metadata row of the given kind, matching the
    /// defensive all-Unknown fallback used when probing or classification
    /// fails outright.
    pub fn unknown(uuid: EntryId, kind: MetadataKind) -> Self {
        Self {
            uuid,
            kind,
            codec: "Unknown".to_string(),
            format: "Unknown".to_string(),
            sar: "Unknown".to_string(),
            dar: "Unknown".to_string(),
            resolution: "Unknown".to_string(),
            framerate: 0.0,
            extra: serde_json::json!({}),
        }
    }
}

/// Lifecycle state of one entry, per the status transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Pending,
    Queued,
    InProgress,
    Done,
    Optimum,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Queued => "queued",
            Self::InProgress => "in_progress",
            Self::Done => "done",
            Self::Optimum => "optimum",
        }
    }
}

impl std::str::FromStr for Status {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "queued" => Ok(Self::Queued),
            "in_progress" => Ok(Self::InProgress),
            "done" => Ok(Self::Done),
            "optimum" => Ok(Self::Optimum),
            other => Err(Error::invalid_input(format!("unknown status: {other}"))),
        }
    }
}

/// Current transcode progress for one entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    pub uuid: EntryId,
    pub status: Status,
    pub progress: f64,
    pub frame_current: i64,
    pub frame_total: i64,
    pub workfile: Option<String>,
}

/// Partial update for a progress row; `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct ProgressUpdate {
    pub status: Option<Status>,
    pub progress: Option<f64>,
    pub frame_current: Option<i64>,
    pub frame_total: Option<i64>,
    pub workfile: Option<Option<String>>,
}
