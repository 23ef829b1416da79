//! FFprobe-based media probing.

use super::types::*;
use crate::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::mpsc;
use std::time::Duration;

const PROBE_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Default, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
    bit_rate: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    index: u32,
    codec_type: String,
    codec_name: Option<String>,
    profile: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    pix_fmt: Option<String>,
    sample_aspect_ratio: Option<String>,
    display_aspect_ratio: Option<String>,
    r_frame_rate: Option<String>,
    duration: Option<String>,
    channels: Option<u32>,
    sample_rate: Option<String>,
}

/// Probe a media file using ffprobe, bounded to a ~30s wall-clock timeout.
///
/// `ffprobe_bin` is the resolved executable path (or bare name to rely on `PATH`).
pub fn probe_with_ffprobe(ffprobe_bin: &Path, path: &Path) -> Result<ProbeInfo> {
    let (tx, rx) = mpsc::channel();
    let bin = ffprobe_bin.to_path_buf();
    let target = path.to_path_buf();

    std::thread::spawn(move || {
        let result = Command::new(&bin)
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
            ])
            .arg(&target)
            .stdin(Stdio::null())
            .output();
        let _ = tx.send(result);
    });

    let output = match rx.recv_timeout(PROBE_TIMEOUT) {
        Ok(Ok(output)) => output,
        Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(Error::tool_not_found("ffprobe"))
        }
        Ok(Err(e)) => return Err(Error::Io(e)),
        Err(_) => return Err(Error::tool_failed("ffprobe", "timed out after 30s")),
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::tool_failed("ffprobe", stderr.to_string()));
    }

    let json_str = String::from_utf8(output.stdout)
        .map_err(|e| Error::parse_error("ffprobe", format!("invalid UTF-8: {e}")))?;

    let ff_output: FfprobeOutput = serde_json::from_str(&json_str)?;
    Ok(parse_ffprobe_output(path, ff_output))
}

fn normalise_ratio(ratio: Option<String>) -> Option<String> {
    match ratio {
        Some(r) if r != "0:1" && !r.is_empty() => Some(r),
        _ => None,
    }
}

fn parse_ffprobe_output(path: &Path, output: FfprobeOutput) -> ProbeInfo {
    let mut info = ProbeInfo {
        file_path: path.to_path_buf(),
        format_duration: output.format.duration.and_then(|s| s.parse().ok()),
        bit_rate: output.format.bit_rate.and_then(|s| s.parse().ok()),
        ..Default::default()
    };

    for stream in output.streams {
        match stream.codec_type.as_str() {
            "video" => info.video_streams.push(VideoStream {
                index: stream.index,
                codec: stream.codec_name.unwrap_or_default().to_lowercase(),
                pix_fmt: stream.pix_fmt.unwrap_or_default(),
                width: stream.width.unwrap_or(0),
                height: stream.height.unwrap_or(0),
                sar: normalise_ratio(stream.sample_aspect_ratio),
                dar: normalise_ratio(stream.display_aspect_ratio),
                frame_rate: stream.r_frame_rate.as_deref().and_then(parse_frame_rate),
                duration: stream.duration.and_then(|s| s.parse().ok()),
            }),
            "audio" => info.audio_streams.push(AudioStream {
                index: stream.index,
                codec: stream.codec_name.unwrap_or_default().to_lowercase(),
                channels: stream.channels.unwrap_or(2),
                sample_rate: stream.sample_rate.and_then(|s| s.parse().ok()),
                profile: stream.profile,
            }),
            "subtitle" => info.subtitle_streams.push(SubtitleStream {
                index: stream.index,
                codec: stream.codec_name.unwrap_or_default().to_lowercase(),
            }),
            _ => {}
        }
    }

    info
}

/// Evaluate a `"num/den"` rational frame rate string, falling back to a plain float parse.
pub fn parse_frame_rate(rate_str: &str) -> Option<f64> {
    let parts: Vec<&str> = rate_str.split('/').collect();
    if parts.len() == 2 {
        let num: f64 = parts[0].parse().ok()?;
        let den: f64 = parts[1].parse().ok()?;
        if den != 0.0 {
            return Some(num / den);
        }
    }
    rate_str.parse().ok()
}
