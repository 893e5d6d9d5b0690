//! Command-line interface for captionq
//!
//! Provides argument parsing using clap derive macros.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Admission-controlled media recognition queue
#[derive(Parser, Debug)]
#[command(
    name = "captionq",
    version,
    about = "Admission-controlled media recognition queue"
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Suppress output (quiet mode)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose output (-v: job lifecycle, -vv: full diagnostics)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Parse a duration string into seconds.
///
/// Supports any duration format accepted by `humantime`: bare numbers
/// (seconds), single-unit (`30s`, `5m`, `2h`), and compound (`1h30m`).
fn parse_timeout_secs(s: &str) -> Result<u64, String> {
    let s = s.trim();
    // Bare number → seconds
    if let Ok(secs) = s.parse::<u64>() {
        return Ok(secs);
    }
    humantime::parse_duration(s)
        .map(|d| d.as_secs())
        .map_err(|e| e.to_string())
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the daemon (foreground process for systemd)
    Daemon {
        /// Path to Unix socket (default: $XDG_RUNTIME_DIR/captionq.sock)
        #[arg(long, value_name = "PATH")]
        socket: Option<PathBuf>,

        /// Use mock engines instead of remote ones (offline mode)
        #[arg(long)]
        mock: bool,

        /// Recognition timeout override. Examples: 30s, 5m, 120
        #[arg(long, value_name = "DURATION", value_parser = parse_timeout_secs)]
        timeout: Option<u64>,
    },

    /// Submit a speech recording for captioning
    Submit {
        /// Audio file to transcribe
        file: PathBuf,

        /// Target language for per-line translation. Examples: es, ru, uz
        #[arg(long, value_name = "LANG")]
        lang: Option<String>,

        /// Produce a plain transcript instead of timestamped captions
        #[arg(long)]
        whole: bool,

        /// Write the playback sync document (JSON) to this path
        #[arg(long, value_name = "PATH")]
        sync_out: Option<PathBuf>,

        /// Path to Unix socket (default: $XDG_RUNTIME_DIR/captionq.sock)
        #[arg(long, value_name = "PATH")]
        socket: Option<PathBuf>,
    },

    /// Submit scanned page images for text recognition
    Scan {
        /// Page image files, in page order
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Pages to recognize, e.g. "1-3,5" (default: all)
        #[arg(long, value_name = "RANGE")]
        pages: Option<String>,

        /// Path to Unix socket (default: $XDG_RUNTIME_DIR/captionq.sock)
        #[arg(long, value_name = "PATH")]
        socket: Option<PathBuf>,
    },

    /// Show queue status
    Status {
        /// Path to Unix socket (default: $XDG_RUNTIME_DIR/captionq.sock)
        #[arg(long, value_name = "PATH")]
        socket: Option<PathBuf>,
    },

    /// Cancel a queued job
    Cancel {
        /// Job id reported at submission
        id: u64,

        /// Path to Unix socket (default: $XDG_RUNTIME_DIR/captionq.sock)
        #[arg(long, value_name = "PATH")]
        socket: Option<PathBuf>,
    },

    /// Shut down the daemon
    Shutdown {
        /// Path to Unix socket (default: $XDG_RUNTIME_DIR/captionq.sock)
        #[arg(long, value_name = "PATH")]
        socket: Option<PathBuf>,
    },
}
