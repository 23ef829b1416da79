//! # spacesaver-av
//!
//! Media probing and HEVC encode orchestration for the transcoding service:
//! invoking `ffprobe`/`ffmpeg` as external processes, parsing their output,
//! and deciding when a source can be skipped.
//!
//! ## Modules
//!
//! - `probe` - ffprobe invocation and JSON parsing
//! - `skip` - the Skip Oracle heuristic
//! - `encoder` - ffmpeg argv construction and the streaming child-process driver
//! - `tools` - external tool detection

mod error;
pub mod encoder;
pub mod probe;
pub mod skip;
pub mod tools;

pub use error::{Error, Result};
pub use probe::{AudioStream, ProbeInfo, SubtitleStream, VideoStream};
pub use tools::{check_tool, check_tools, require_tool, ToolInfo};
