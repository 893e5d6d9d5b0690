//! Job data model: one user request wrapping an artifact, a configuration,
//! and the identifiers the scheduler hands back.

use crate::error::{CaptionqError, Result};
use crate::render::SyncDocument;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Monotonically increasing job identifier, assigned at submission.
pub type JobId = u64;

/// Requested output mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobMode {
    /// Time-aligned caption lines plus a playback sync document.
    Timestamped,
    /// A single corrected text block without timestamps.
    Whole,
}

/// Lifecycle of a job inside the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Queued,
    Running,
    Done,
    Failed,
}

/// Coarse progress phase reported while a job runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobPhase {
    Fetching,
    Recognizing,
    Aggregating,
    Rendering,
}

impl JobPhase {
    /// Rough completion percentage for this phase.
    pub fn percent(&self) -> u8 {
        match self {
            JobPhase::Fetching => 10,
            JobPhase::Recognizing => 40,
            JobPhase::Aggregating => 70,
            JobPhase::Rendering => 90,
        }
    }

    /// Human-readable phase label.
    pub fn describe(&self) -> &'static str {
        match self {
            JobPhase::Fetching => "Fetching artifact",
            JobPhase::Recognizing => "Recognizing",
            JobPhase::Aggregating => "Aggregating lines",
            JobPhase::Rendering => "Rendering output",
        }
    }
}

/// A temporary artifact file exclusively owned by its job.
///
/// The backing file is deleted when this value is dropped, so cleanup
/// happens on every exit path (success, failure, cancellation) without a
/// separate sweep.
#[derive(Debug)]
pub struct TempArtifact {
    file: NamedTempFile,
    len: u64,
}

impl TempArtifact {
    /// Spool the given bytes into an owned temporary file.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.is_empty() {
            return Err(CaptionqError::EmptyArtifact);
        }
        let mut file = NamedTempFile::new()?;
        file.write_all(bytes)?;
        file.flush()?;
        Ok(Self {
            file,
            len: bytes.len() as u64,
        })
    }

    /// Copy an existing file into an owned temporary artifact.
    pub fn from_file(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    /// Read the artifact contents back.
    pub fn read(&self) -> Result<Vec<u8>> {
        Ok(std::fs::read(self.file.path())?)
    }

    /// Path of the backing temporary file.
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Size of the artifact in bytes.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// The media payload of a job.
#[derive(Debug)]
pub enum Artifact {
    /// One speech recording.
    Audio(TempArtifact),
    /// One or more scanned page images, in page order.
    Pages(Vec<TempArtifact>),
}

impl Artifact {
    /// Number of pages (1 for audio).
    pub fn page_count(&self) -> usize {
        match self {
            Artifact::Audio(_) => 1,
            Artifact::Pages(pages) => pages.len(),
        }
    }
}

/// One user request, owned by its worker for the lifetime of the job.
#[derive(Debug)]
pub struct JobRequest {
    pub artifact: Artifact,
    /// Target language for per-line translation; `None` keeps the original.
    pub target_lang: Option<String>,
    pub mode: JobMode,
    /// Page selection string such as `"1-3,5"`; `None` processes all pages.
    pub page_range: Option<String>,
}

impl JobRequest {
    /// A timestamped speech request without translation.
    pub fn speech(artifact: TempArtifact) -> Self {
        Self {
            artifact: Artifact::Audio(artifact),
            target_lang: None,
            mode: JobMode::Timestamped,
            page_range: None,
        }
    }

    /// A whole-text page recognition request.
    pub fn pages(pages: Vec<TempArtifact>) -> Self {
        Self {
            artifact: Artifact::Pages(pages),
            target_lang: None,
            mode: JobMode::Whole,
            page_range: None,
        }
    }

    pub fn with_target_lang(mut self, lang: impl Into<String>) -> Self {
        self.target_lang = Some(lang.into());
        self
    }

    pub fn with_mode(mut self, mode: JobMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_page_range(mut self, range: impl Into<String>) -> Self {
        self.page_range = Some(range.into());
        self
    }
}

/// Final rendered result of a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobOutput {
    /// Rendered text block (timestamped captions or corrected transcript).
    pub text: String,
    /// Playback sync document, present for timestamped output.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sync: Option<SyncDocument>,
}
