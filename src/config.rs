//! Runtime configuration: a TOML file layered with environment variable
//! overrides, loaded once at startup and held as a single shared struct.

use serde::Deserialize;
use std::path::{Path, PathBuf};

fn default_crf() -> u8 {
    18
}

fn default_res_cap() -> u32 {
    1080
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_workdir() -> String {
    "/tmp/spacesaver-work".to_string()
}

fn default_dest_dir() -> String {
    ".".to_string()
}

fn default_tool(name: &str) -> String {
    name.to_string()
}

/// Control Surface bind address.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Runtime settings for the transcoding service, loaded once at startup.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directories the Scanner walks for candidate media files.
    pub source_dirs: Vec<String>,
    /// Base directory under which `.transcoder/state.db` is rooted.
    pub dest_dir: String,
    /// Scratch directory for in-flight workfiles.
    pub workdir: String,
    /// Encoder quality parameter; lower is higher quality/bitrate.
    pub crf: u8,
    /// Maximum output height; taller sources are downscaled.
    pub res_cap: u32,
    pub server: ServerConfig,
    /// Resolved via `PATH` if not set.
    pub ffmpeg_path: String,
    /// Resolved via `PATH` if not set.
    pub ffprobe_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_dirs: Vec::new(),
            dest_dir: default_dest_dir(),
            workdir: default_workdir(),
            crf: default_crf(),
            res_cap: default_res_cap(),
            server: ServerConfig::default(),
            ffmpeg_path: default_tool("ffmpeg"),
            ffprobe_path: default_tool("ffprobe"),
        }
    }
}

impl Config {
    /// Parse from TOML text. Malformed documents are a hard error; missing
    /// or unrecognised fields fall back to documented defaults.
    pub fn from_toml(contents: &str) -> anyhow::Result<Self> {
        let mut config: Config = toml::from_str(contents)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from `path`, or fall back to environment-only defaults if no
    /// path is given. An unreadable or unparsable file aborts the process;
    /// a missing path argument does not.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        match path {
            Some(p) => {
                let contents = std::fs::read_to_string(p).unwrap_or_else(|e| {
                    panic!("failed to read config file {}: {e}", p.display())
                });
                Self::from_toml(&contents)
                    .unwrap_or_else(|e| panic!("failed to parse config file {}: {e}", p.display()))
            }
            None => {
                let mut config = Self::default();
                config.apply_env_overrides();
                config
            }
        }
    }

    /// Layer `SPACESAVER_*` environment variables over whatever was loaded
    /// from the file (or the defaults, if there was no file).
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("SPACESAVER_DEST_DIR") {
            self.dest_dir = v;
        }
        if let Ok(v) = std::env::var("SPACESAVER_WORKDIR") {
            self.workdir = v;
        }
        if let Ok(v) = std::env::var("SPACESAVER_CRF") {
            if let Ok(crf) = v.parse() {
                self.crf = crf;
            }
        }
        if let Ok(v) = std::env::var("SPACESAVER_RES_CAP") {
            if let Ok(cap) = v.parse() {
                self.res_cap = cap;
            }
        }
        if let Ok(v) = std::env::var("SPACESAVER_HOST") {
            self.server.host = v;
        }
        if let Ok(v) = std::env::var("SPACESAVER_PORT") {
            if let Ok(port) = v.parse() {
                self.server.port = port;
            }
        }
        if let Ok(v) = std::env::var("SPACESAVER_FFMPEG_PATH") {
            self.ffmpeg_path = v;
        }
        if let Ok(v) = std::env::var("SPACESAVER_FFPROBE_PATH") {
            self.ffprobe_path = v;
        }
    }

    /// Sanity-check the loaded config, returning human-readable warnings
    /// rather than failing: a config that doesn't validate is still usable.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.source_dirs.is_empty() {
            warnings.push("no source_dirs configured; the scanner will find nothing".to_string());
        }
        for dir in &self.source_dirs {
            if !Path::new(dir).exists() {
                warnings.push(format!("source_dirs entry does not exist: {dir}"));
            }
        }
        if self.server.port == 0 {
            warnings.push("server.port is 0".to_string());
        }
        if self.crf > 51 {
            warnings.push(format!("crf {} is outside the typical libx265 range", self.crf));
        }

        warnings
    }

    /// Path to the state database file, `<dest_dir>/.transcoder/state.db`.
    #[must_use]
    pub fn db_path(&self) -> PathBuf {
        PathBuf::from(&self.dest_dir).join(".transcoder").join("state.db")
    }
}
