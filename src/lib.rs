//! captionq - admission-controlled media recognition queue
//!
//! Accepts a media artifact (speech recording or scanned page images),
//! serializes the expensive recognition work through a single execution
//! slot, and renders the result as time-aligned caption lines (optionally
//! translated) or a corrected text transcript.

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod daemon;
pub mod engine;
pub mod error;
pub mod ipc;
pub mod job;
pub mod ocr;
pub mod pipeline;
pub mod render;
pub mod scheduler;
pub mod transcript;

// Engine boundaries (recognition → aggregation → translation)
pub use engine::{ImageRecognizer, Segment, SpeechRecognizer, Translator};

// Scheduler
pub use scheduler::{JobContext, JobEvent, JobExecutor, JobHandle, JobOutcome, Scheduler};

// Pipeline
pub use pipeline::{JobPipeline, PipelineOptions};

// Data model
pub use job::{JobId, JobMode, JobOutput, JobRequest, JobState};
pub use transcript::{CaptionLine, Token};

// Rendering
pub use render::{Footer, SyncDocument};

// Error handling
pub use error::{CaptionqError, ErrorKind, Result};

// Config
pub use config::Config;

/// Build version string with optional git commit hash.
///
/// Returns `"0.1.0+abc1234"` when git hash is available, `"0.1.0"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}
