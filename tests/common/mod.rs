//! Shared test harness for integration tests.
//!
//! Provides an in-memory [`Store`] builder, a [`Config`] builder rooted
//! under a `tempfile::tempdir()` fixture tree, and synthetic `ffmpeg`/
//! `ffprobe` stand-ins (small shell scripts) so the Encoder Driver can be
//! exercised end to end without real media tools installed.
//!
//! Each integration test binary only uses a subset of these helpers; `cargo`
//! compiles this module once per binary, so unused ones would otherwise warn.
#![allow(dead_code)]

use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use spacesaver::config::Config;
use spacesaver_common::EntryId;
use spacesaver_db::pool::init_memory_pool;
use spacesaver_db::{Entry, Store};

/// Build an in-memory Store for a test.
#[must_use]
pub fn test_store() -> Store {
    Store::new(init_memory_pool().expect("failed to create in-memory pool"))
}

/// A throwaway Entry with a given size, used by admission/driver scenarios
/// that don't care about the rest of the row.
#[must_use]
pub fn sample_entry(path: &Path, size: i64) -> Entry {
    Entry {
        uuid: EntryId::new(),
        name: "Sample".to_string(),
        hash: "abcd1234".to_string(),
        path: path.to_string_lossy().to_string(),
        size,
    }
}

/// Write an executable shell script at `dir/fake-ffprobe.sh` that prints
/// `json` to stdout, standing in for the real `ffprobe` binary.
#[must_use]
pub fn fake_ffprobe_script(dir: &Path, json: &str) -> std::path::PathBuf {
    let script = dir.join("fake-ffprobe.sh");
    let mut f = std::fs::File::create(&script).unwrap();
    writeln!(f, "#!/bin/sh").unwrap();
    writeln!(f, "cat <<'EOF'\n{json}\nEOF").unwrap();
    drop(f);
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
    script
}

/// Write an executable shell script at `dir/fake-ffmpeg.sh` that emits
/// `frame=N` progress lines and touches whichever `.mkv` argument it was
/// given (the workfile), standing in for the real `ffmpeg` binary.
#[must_use]
pub fn fake_ffmpeg_script(dir: &Path, frames: &[u64], exit_code: i32) -> std::path::PathBuf {
    let script = dir.join("fake-ffmpeg.sh");
    let mut f = std::fs::File::create(&script).unwrap();
    writeln!(f, "#!/bin/sh").unwrap();
    for frame in frames {
        writeln!(f, "echo frame={frame}").unwrap();
    }
    writeln!(f, "for a in \"$@\"; do").unwrap();
    writeln!(f, "  if [ \"$a\" != \"${{a%.mkv}}\" ]; then touch \"$a\"; fi").unwrap();
    writeln!(f, "done").unwrap();
    writeln!(f, "exit {exit_code}").unwrap();
    drop(f);
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
    script
}

pub const HEVC_1080P_JSON: &str = r#"{
    "format": {"duration": "10.0", "bit_rate": "5000000"},
    "streams": [
        {"index": 0, "codec_type": "video", "codec_name": "hevc", "width": 1920, "height": 1080,
         "pix_fmt": "yuv420p", "r_frame_rate": "24/1", "duration": "10.0"}
    ]
}"#;

pub const H264_1080P_JSON: &str = r#"{
    "format": {"duration": "1.0", "bit_rate": "20000000"},
    "streams": [
        {"index": 0, "codec_type": "video", "codec_name": "h264", "width": 1920, "height": 1080,
         "pix_fmt": "yuv420p", "r_frame_rate": "24/1", "duration": "1.0"}
    ]
}"#;

/// Base config rooted entirely under `dir`, so every test gets an isolated
/// workdir/dest_dir pair.
#[must_use]
pub fn test_config(dir: &Path) -> Config {
    Config {
        workdir: dir.join("work").to_string_lossy().to_string(),
        dest_dir: dir.join("dest").to_string_lossy().to_string(),
        ..Config::default()
    }
}
