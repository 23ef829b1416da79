//! Adapts `spacesaver-av`'s raw [`ProbeInfo`] into the `ACTUAL` metadata row
//! the Store persists.

use std::path::Path;

use spacesaver_av::probe;
use spacesaver_av::ProbeInfo;
use spacesaver_common::EntryId;
use spacesaver_db::{Metadata, MetadataKind};

use crate::config::Config;

/// Probe `path` via the configured ffprobe binary and build the `ACTUAL`
/// metadata row for `uuid`. On any probe failure, returns the all-Unknown
/// sentinel metadata rather than propagating the error — discovery never
/// blocks on a broken probe.
#[must_use]
pub fn probe_actual(uuid: EntryId, path: &Path, config: &Config) -> Metadata {
    match probe::probe(Path::new(&config.ffprobe_path), path) {
        Ok(info) => metadata_from_probe(uuid, &info),
        Err(e) => {
            tracing::warn!(event = "probe_failed", uuid = %uuid, path = %path.display(), error = %e, "probe failed, using defaults");
            Metadata::unknown(uuid, MetadataKind::Actual)
        }
    }
}

/// Re-probe `path`, returning the raw stream info (used by the Encoder
/// Driver, which needs the full `ProbeInfo` for the Skip Oracle and argv
/// builder, not just the persisted metadata projection).
pub fn probe_fresh(path: &Path, config: &Config) -> spacesaver_av::Result<ProbeInfo> {
    probe::probe(Path::new(&config.ffprobe_path), path)
}

fn metadata_from_probe(uuid: EntryId, info: &ProbeInfo) -> Metadata {
    let Some(video) = info.video_streams.first() else {
        return Metadata::unknown(uuid, MetadataKind::Actual);
    };

    let mut extra = serde_json::Map::new();
    if let Some(duration) = info.format_duration {
        if duration > 0.0 {
            extra.insert("duration".to_string(), serde_json::json!(duration));
        }
    }
    if let Some(bit_rate) = info.bit_rate {
        if bit_rate > 0 {
            extra.insert("bitrate".to_string(), serde_json::json!(bit_rate));
        }
    }

    Metadata {
        uuid,
        kind: MetadataKind::Actual,
        codec: non_empty_or_unknown(&video.codec),
        format: non_empty_or_unknown(&video.pix_fmt),
        sar: video.sar.clone().unwrap_or_else(|| "Unknown".to_string()),
        dar: video.dar.clone().unwrap_or_else(|| "Unknown".to_string()),
        resolution: format!("{}x{}", video.width, video.height),
        framerate: round3(video.frame_rate.unwrap_or(0.0)),
        extra: serde_json::Value::Object(extra),
    }
}

fn non_empty_or_unknown(s: &str) -> String {
    if s.is_empty() {
        "Unknown".to_string()
    } else {
        s.to_string()
    }
}

fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}
