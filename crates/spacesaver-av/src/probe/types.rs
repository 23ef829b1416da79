//! Media information types returned by the probe backend.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw probe output for one media file.
///
/// Unlike a normalised media model, this keeps the fields the Skip Oracle and
/// encoder argv builder need verbatim from the probe backend: raw codec names,
/// per-stream duration, and the container-level bit rate.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProbeInfo {
    pub file_path: PathBuf,
    pub container: String,
    /// Container-level duration in seconds, if reported.
    pub format_duration: Option<f64>,
    /// Container-level bit rate in bits/sec, if reported.
    pub bit_rate: Option<u64>,
    pub video_streams: Vec<VideoStream>,
    pub audio_streams: Vec<AudioStream>,
    pub subtitle_streams: Vec<SubtitleStream>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct VideoStream {
    pub index: u32,
    /// Raw ffprobe codec name, lowercase (e.g. "hevc", "h264").
    pub codec: String,
    pub pix_fmt: String,
    pub width: u32,
    pub height: u32,
    /// `sample_aspect_ratio`, `"0:1"` normalised to `None`.
    pub sar: Option<String>,
    /// `display_aspect_ratio`, `"0:1"` normalised to `None`.
    pub dar: Option<String>,
    /// `r_frame_rate` evaluated to a float.
    pub frame_rate: Option<f64>,
    /// Stream-level duration in seconds, if reported.
    pub duration: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AudioStream {
    pub index: u32,
    /// Raw ffprobe codec name, lowercase (e.g. "dts", "truehd", "aac").
    pub codec: String,
    pub channels: u32,
    pub sample_rate: Option<u32>,
    /// ffprobe's `profile` field (e.g. "DTS-HD MA" for lossless DTS variants).
    pub profile: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SubtitleStream {
    pub index: u32,
    pub codec: String,
}

impl ProbeInfo {
    pub fn max_video_height(&self) -> u32 {
        self.video_streams.iter().map(|v| v.height).max().unwrap_or(0)
    }

    pub fn max_video_pixels(&self) -> u64 {
        self.video_streams
            .iter()
            .map(|v| u64::from(v.width) * u64::from(v.height))
            .max()
            .unwrap_or(0)
    }

    pub fn is_hevc(&self) -> bool {
        self.video_streams
            .iter()
            .any(|v| matches!(v.codec.as_str(), "hevc" | "h265"))
    }
}
