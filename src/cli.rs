use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "spacesaver")]
#[command(author, version, about = "On-demand HEVC transcoding service")]
pub struct Cli {
    /// Path to config file (default: config.toml in the working directory)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan, start the encoder driver, and serve the HTTP control surface (default)
    Serve,

    /// Run the Store + Scanner once and print the summary; no server, no encoder
    Scan,

    /// Probe a single file and print the resulting metadata as JSON
    Probe {
        /// File to probe
        #[arg(required = true)]
        path: PathBuf,
    },

    /// Verify the configured ffmpeg/ffprobe executables are resolvable
    CheckTools,
}
