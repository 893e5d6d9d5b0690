//! Error types for captionq.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CaptionqError {
    // Recognition engine errors
    #[error("Recognition engine unavailable: {message}")]
    RecognitionUnavailable { message: String },

    #[error("Recognition quota exhausted: {message}")]
    RecognitionQuota { message: String },

    #[error("Recognition engine rejected the input: {message}")]
    RecognitionRejected { message: String },

    #[error("Recognition engine timed out after {seconds}s")]
    RecognitionTimeout { seconds: u64 },

    // Translation errors (soft: a failed translation degrades to
    // untranslated output, it never fails the job)
    #[error("Translation failed: {message}")]
    Translation { message: String },

    // Caller input validation
    #[error("Invalid page range '{input}': {message}")]
    InvalidPageRange { input: String, message: String },

    #[error("Too many pages: {count} exceeds the limit of {limit}")]
    TooManyPages { count: usize, limit: usize },

    #[error("The submitted artifact is empty")]
    EmptyArtifact,

    #[error("Unsupported mode: {message}")]
    InvalidMode { message: String },

    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    // Scheduler errors
    #[error("Scheduler internal error: {message}")]
    SchedulerInternal { message: String },

    #[error("Job was cancelled before it started")]
    JobCancelled,

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // IPC errors
    #[error("IPC socket error: {message}")]
    IpcSocket { message: String },

    #[error("IPC protocol error: {message}")]
    IpcProtocol { message: String },

    #[error("IPC connection failed: {message}")]
    IpcConnection { message: String },

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Generic error for cases not covered above
    #[error("{0}")]
    Other(String),
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, CaptionqError>;

/// Coarse classification used on the wire and in user-facing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Recognition,
    Translation,
    Validation,
    Internal,
    Io,
}

impl CaptionqError {
    /// Classify this error for reporting.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CaptionqError::RecognitionUnavailable { .. }
            | CaptionqError::RecognitionQuota { .. }
            | CaptionqError::RecognitionRejected { .. }
            | CaptionqError::RecognitionTimeout { .. } => ErrorKind::Recognition,
            CaptionqError::Translation { .. } => ErrorKind::Translation,
            CaptionqError::InvalidPageRange { .. }
            | CaptionqError::TooManyPages { .. }
            | CaptionqError::EmptyArtifact
            | CaptionqError::InvalidMode { .. }
            | CaptionqError::ConfigInvalidValue { .. } => ErrorKind::Validation,
            CaptionqError::SchedulerInternal { .. } | CaptionqError::JobCancelled => {
                ErrorKind::Internal
            }
            CaptionqError::Io(_) => ErrorKind::Io,
            CaptionqError::Config(_)
            | CaptionqError::IpcSocket { .. }
            | CaptionqError::IpcProtocol { .. }
            | CaptionqError::IpcConnection { .. }
            | CaptionqError::Other(_) => ErrorKind::Internal,
        }
    }

    /// Short caller-facing failure message.
    ///
    /// Keeps the three failure families distinguishable: engine failures,
    /// invalid input, and mode problems are never conflated.
    pub fn user_message(&self) -> String {
        match self {
            CaptionqError::RecognitionUnavailable { message }
            | CaptionqError::RecognitionRejected { message } => {
                format!("The recognition engine failed: {message}")
            }
            CaptionqError::RecognitionQuota { message } => {
                format!("The recognition engine failed: {message}; try again later or switch engines")
            }
            CaptionqError::RecognitionTimeout { seconds } => {
                format!("The recognition engine failed: no response within {seconds}s")
            }
            CaptionqError::InvalidMode { message } => {
                format!("{message}; please try a different mode")
            }
            CaptionqError::InvalidPageRange { .. }
            | CaptionqError::TooManyPages { .. }
            | CaptionqError::EmptyArtifact
            | CaptionqError::ConfigInvalidValue { .. } => {
                format!("Your input was invalid: {self}")
            }
            other => other.to_string(),
        }
    }
}
