//! External engine boundaries: speech recognition, image recognition, and
//! translation.
//!
//! Everything behind these traits is slow, rate-limited, and expensive:
//! the scheduler exists to serialize access to it.

pub mod mock;
pub mod remote;

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One time-stamped text segment returned by a speech engine.
///
/// Segments are ordered by `start` and non-overlapping. They are
/// sentence-level; see `transcript::words` for word expansion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub text: String,
    pub start: f64,
    pub end: f64,
}

/// Preprocessing variant a page image was run through before recognition.
///
/// The filtering itself happens behind the engine boundary; the variant
/// name only identifies which rendition a candidate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageVariant {
    Original,
    /// Black-and-white scan rendition.
    Document,
    /// Contrast/brightness boosted rendition.
    Magic,
}

impl ImageVariant {
    pub fn label(&self) -> &'static str {
        match self {
            ImageVariant::Original => "original",
            ImageVariant::Document => "document",
            ImageVariant::Magic => "magic",
        }
    }
}

/// One (preprocess-variant, engine-profile) recognition attempt
/// configuration. The ensemble runs every pass over every page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OcrPass {
    pub variant: ImageVariant,
    pub profile: String,
}

impl OcrPass {
    pub fn new(variant: ImageVariant, profile: impl Into<String>) -> Self {
        Self {
            variant,
            profile: profile.into(),
        }
    }

    /// Stable identifier for this pass, used as a candidate's source tag.
    pub fn label(&self) -> String {
        format!("{}/{}", self.variant.label(), self.profile)
    }
}

/// Speech-to-text engine boundary.
///
/// Implementations must fail with a distinguishable Recognition* error on
/// quota, format, or network problems.
#[async_trait::async_trait]
pub trait SpeechRecognizer: Send + Sync {
    /// Transcribe raw audio bytes into ordered, non-overlapping segments.
    async fn transcribe(&self, audio: &[u8]) -> Result<Vec<Segment>>;

    /// Name of this engine for status reporting.
    fn name(&self) -> &str;
}

/// Implement SpeechRecognizer for Arc<T> to allow sharing across jobs.
#[async_trait::async_trait]
impl<T: SpeechRecognizer> SpeechRecognizer for Arc<T> {
    async fn transcribe(&self, audio: &[u8]) -> Result<Vec<Segment>> {
        (**self).transcribe(audio).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Optical character recognition engine boundary.
///
/// Invoked once per (variant, profile) pass by the caller: never batched
/// internally. An empty string is a valid result, not an error.
#[async_trait::async_trait]
pub trait ImageRecognizer: Send + Sync {
    async fn recognize(&self, image: &[u8], pass: &OcrPass) -> Result<String>;

    fn name(&self) -> &str;
}

/// Translation engine boundary. Failure is soft: callers emit the
/// original text untranslated instead of failing the job.
#[async_trait::async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str, target_lang: &str) -> Result<String>;

    fn name(&self) -> &str;
}
