//! Media file probing via the external `ffprobe` executable.

mod ffprobe;
mod types;

pub use ffprobe::{parse_frame_rate, probe_with_ffprobe};
pub use types::*;

use crate::Result;
use std::path::Path;

/// Probe a media file via the ffprobe backend.
pub fn probe(ffprobe_bin: &Path, path: &Path) -> Result<ProbeInfo> {
    probe_with_ffprobe(ffprobe_bin, path)
}
