//! Builds the ffmpeg invocation for a single encode and runs it, streaming
//! progress back to the caller via a callback.

use crate::probe::{AudioStream, ProbeInfo};
use crate::{Error, Result};
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::mpsc;
use std::time::Duration;

const LOSSLESS_CODECS: &[&str] = &["truehd", "mlp", "flac"];
const STDERR_TAIL_BYTES: usize = 600;

fn is_lossless(stream: &AudioStream) -> bool {
    if stream.codec.starts_with("pcm_") || LOSSLESS_CODECS.contains(&stream.codec.as_str()) {
        return true;
    }
    if stream.codec == "dts" {
        if let Some(profile) = &stream.profile {
            let p = profile.to_lowercase();
            return p.contains("ma") || p.contains("hd") || p.contains("x");
        }
    }
    false
}

/// Build the ffmpeg argv per the encoder invocation contract: video codec,
/// optional downscale, per-stream audio directives, and progress-on-stdout.
pub fn build_args(
    source_path: &Path,
    workfile: &Path,
    probe: &ProbeInfo,
    crf: u8,
    res_cap: u32,
) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "-y".into(),
        "-loglevel".into(),
        "error".into(),
        "-i".into(),
        source_path.display().to_string(),
        "-map".into(),
        "0:v?".into(),
        "-map".into(),
        "0:a?".into(),
        "-map".into(),
        "0:s?".into(),
        "-c:v".into(),
        "libx265".into(),
        "-crf".into(),
        crf.to_string(),
        "-preset".into(),
        "slow".into(),
        "-x265-params".into(),
        "log-level=error".into(),
    ];

    if res_cap > 0 && probe.max_video_height() > res_cap {
        args.push("-vf".into());
        args.push(format!("scale=-2:{res_cap}"));
    }

    let any_lossless = probe.audio_streams.iter().any(is_lossless);
    if !any_lossless {
        args.push("-c:a".into());
        args.push("copy".into());
    } else {
        for (i, stream) in probe.audio_streams.iter().enumerate() {
            if is_lossless(stream) {
                if stream.channels >= 3 {
                    args.push(format!("-c:a:{i}"));
                    args.push("aac".into());
                    args.push(format!("-b:a:{i}"));
                    args.push("640k".into());
                } else {
                    args.push(format!("-c:a:{i}"));
                    args.push("libopus".into());
                    args.push(format!("-b:a:{i}"));
                    args.push("192k".into());
                }
            } else {
                args.push(format!("-c:a:{i}"));
                args.push("copy".into());
            }
        }
    }

    args.push("-c:s".into());
    args.push("copy".into());
    args.push("-progress".into());
    args.push("pipe:1".into());
    args.push("-nostats".into());
    args.push("-f".into());
    args.push("matroska".into());
    args.push(workfile.display().to_string());

    args
}

/// Estimate total output frames: sum of `fps * duration` over video streams,
/// falling back to `container_duration * 25` if that sum is zero.
pub fn estimate_frame_total(probe: &ProbeInfo) -> u64 {
    let sum: f64 = probe
        .video_streams
        .iter()
        .map(|v| v.frame_rate.unwrap_or(25.0) * v.duration.unwrap_or(0.0))
        .sum();

    if sum > 0.0 {
        return sum.round() as u64;
    }

    (probe.format_duration.unwrap_or(0.0) * 25.0).round() as u64
}

/// Outcome of running the encoder to completion.
pub struct EncodeOutcome {
    pub stderr_tail: String,
}

/// Spawn ffmpeg with the given argv, streaming `frame=<N>` lines on stdout to
/// `on_progress(frame_current)` and draining stderr into a bounded tail buffer
/// on a separate thread so the child cannot block on a full pipe.
///
/// Returns `Ok` on exit code 0; `Err(Error::ToolFailed)` carrying the captured
/// stderr tail otherwise.
pub fn run_encode(
    ffmpeg_bin: &Path,
    args: &[String],
    mut on_progress: impl FnMut(u64),
) -> Result<EncodeOutcome> {
    let mut child = Command::new(ffmpeg_bin)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::tool_not_found("ffmpeg")
            } else {
                Error::Io(e)
            }
        })?;

    let stderr = child.stderr.take().expect("stderr was piped");
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let mut reader = stderr;
        let mut buf = Vec::new();
        let _ = reader.read_to_end(&mut buf);
        let tail_start = buf.len().saturating_sub(STDERR_TAIL_BYTES);
        let tail = String::from_utf8_lossy(&buf[tail_start..]).to_string();
        let _ = tx.send(tail);
    });

    let stdout = child.stdout.take().expect("stdout was piped");
    let reader = BufReader::new(stdout);
    for line in reader.lines().map_while(std::result::Result::ok) {
        if let Some(rest) = line.strip_prefix("frame=") {
            if let Ok(frame) = rest.trim().parse::<u64>() {
                on_progress(frame);
            }
        }
    }

    let status = child.wait().map_err(Error::Io)?;
    let stderr_tail = rx.recv_timeout(Duration::from_secs(5)).unwrap_or_default();

    if status.success() {
        Ok(EncodeOutcome { stderr_tail })
    } else {
        Err(Error::tool_failed("ffmpeg", stderr_tail))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::VideoStream;
    use std::path::PathBuf;

    fn probe_with_audio(streams: Vec<AudioStream>) -> ProbeInfo {
        ProbeInfo {
            video_streams: vec![VideoStream {
                height: 1080,
                width: 1920,
                ..Default::default()
            }],
            audio_streams: streams,
            ..Default::default()
        }
    }

    #[test]
    fn bulk_copy_when_no_lossless_audio() {
        let probe = probe_with_audio(vec![AudioStream {
            index: 0,
            codec: "aac".into(),
            channels: 2,
            ..Default::default()
        }]);
        let args = build_args(Path::new("in.mkv"), Path::new("out.mkv"), &probe, 18, 1080);
        let pos = args.iter().position(|a| a == "-c:a").unwrap();
        assert_eq!(args[pos + 1], "copy");
    }

    #[test]
    fn per_stream_directives_when_lossless_present() {
        let probe = probe_with_audio(vec![
            AudioStream {
                index: 0,
                codec: "truehd".into(),
                channels: 8,
                ..Default::default()
            },
            AudioStream {
                index: 1,
                codec: "aac".into(),
                channels: 2,
                ..Default::default()
            },
        ]);
        let args = build_args(Path::new("in.mkv"), Path::new("out.mkv"), &probe, 18, 1080);
        assert!(args.windows(2).any(|w| w[0] == "-c:a:0" && w[1] == "aac"));
        assert!(args.windows(2).any(|w| w[0] == "-b:a:0" && w[1] == "640k"));
        assert!(args.windows(2).any(|w| w[0] == "-c:a:1" && w[1] == "copy"));
    }

    #[test]
    fn lossless_stereo_uses_opus() {
        let probe = probe_with_audio(vec![AudioStream {
            index: 0,
            codec: "flac".into(),
            channels: 2,
            ..Default::default()
        }]);
        let args = build_args(Path::new("in.mkv"), Path::new("out.mkv"), &probe, 18, 1080);
        assert!(args.windows(2).any(|w| w[0] == "-c:a:0" && w[1] == "libopus"));
    }

    #[test]
    fn audio_directives_use_audio_relative_index_not_raw_stream_index() {
        // Raw ffprobe stream indexes span video+audio+subtitle: a file with one
        // video stream (raw index 0) followed by two audio streams has those
        // audio streams at raw indexes 1 and 2, but ffmpeg's -c:a:N/-b:a:N
        // specifiers are 0-based within the audio streams only.
        let probe = probe_with_audio(vec![
            AudioStream {
                index: 1,
                codec: "truehd".into(),
                channels: 8,
                ..Default::default()
            },
            AudioStream {
                index: 2,
                codec: "aac".into(),
                channels: 2,
                ..Default::default()
            },
        ]);
        let args = build_args(Path::new("in.mkv"), Path::new("out.mkv"), &probe, 18, 1080);
        assert!(args.windows(2).any(|w| w[0] == "-c:a:0" && w[1] == "aac"));
        assert!(args.windows(2).any(|w| w[0] == "-b:a:0" && w[1] == "640k"));
        assert!(args.windows(2).any(|w| w[0] == "-c:a:1" && w[1] == "copy"));
        assert!(!args.iter().any(|a| a == "-c:a:2"));
    }

    #[test]
    fn dts_hd_ma_is_lossless() {
        let stream = AudioStream {
            index: 0,
            codec: "dts".into(),
            channels: 6,
            profile: Some("DTS-HD MA".into()),
            ..Default::default()
        };
        assert!(is_lossless(&stream));
    }

    #[test]
    fn downscale_filter_added_when_exceeding_res_cap() {
        let probe = ProbeInfo {
            video_streams: vec![VideoStream {
                height: 2160,
                width: 3840,
                ..Default::default()
            }],
            ..Default::default()
        };
        let args = build_args(Path::new("in.mkv"), Path::new("out.mkv"), &probe, 18, 1080);
        assert!(args.windows(2).any(|w| w[0] == "-vf" && w[1] == "scale=-2:1080"));
    }

    #[test]
    fn frame_total_estimate_sums_video_streams() {
        let probe = ProbeInfo {
            video_streams: vec![VideoStream {
                frame_rate: Some(24.0),
                duration: Some(10.0),
                ..Default::default()
            }],
            ..Default::default()
        };
        assert_eq!(estimate_frame_total(&probe), 240);
    }

    #[test]
    fn frame_total_falls_back_to_container_duration() {
        let probe = ProbeInfo {
            format_duration: Some(10.0),
            ..Default::default()
        };
        assert_eq!(estimate_frame_total(&probe), 250);
    }

    #[test]
    fn workfile_path_rendered_in_args() {
        let probe = ProbeInfo::default();
        let workfile = PathBuf::from("/work/abc.mkv");
        let args = build_args(Path::new("in.mkv"), &workfile, &probe, 18, 1080);
        assert_eq!(args.last().unwrap(), "/work/abc.mkv");
    }
}
