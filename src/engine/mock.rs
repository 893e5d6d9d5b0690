//! Mock engines for testing and offline use.

use crate::engine::{ImageRecognizer, OcrPass, Segment, SpeechRecognizer, Translator};
use crate::error::{CaptionqError, Result};
use std::collections::HashMap;
use std::time::Duration;

/// Mock speech engine returning preconfigured segments.
#[derive(Debug, Clone, Default)]
pub struct MockSpeechRecognizer {
    segments: Vec<Segment>,
    should_fail: bool,
    delay: Option<Duration>,
}

impl MockSpeechRecognizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the segments returned by `transcribe`.
    pub fn with_segments(mut self, segments: Vec<Segment>) -> Self {
        self.segments = segments;
        self
    }

    /// Configure the mock to fail on transcribe.
    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }

    /// Sleep for the given duration before responding, to simulate a slow
    /// engine in scheduler tests.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait::async_trait]
impl SpeechRecognizer for MockSpeechRecognizer {
    async fn transcribe(&self, _audio: &[u8]) -> Result<Vec<Segment>> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.should_fail {
            return Err(CaptionqError::RecognitionUnavailable {
                message: "mock recognition failure".to_string(),
            });
        }
        Ok(self.segments.clone())
    }

    fn name(&self) -> &str {
        "mock-speech"
    }
}

/// Mock OCR engine with per-pass responses, keyed by `OcrPass::label()`.
///
/// Passes without a configured response return an empty string (a valid
/// engine result); passes listed as failing return a recognition error.
#[derive(Debug, Clone, Default)]
pub struct MockImageRecognizer {
    responses: HashMap<String, String>,
    failing: Vec<String>,
}

impl MockImageRecognizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the text returned for a specific pass label (e.g. `"original/c1"`).
    pub fn with_response(mut self, pass_label: &str, text: &str) -> Self {
        self.responses
            .insert(pass_label.to_string(), text.to_string());
        self
    }

    /// Make a specific pass fail with a recognition error.
    pub fn with_failing_pass(mut self, pass_label: &str) -> Self {
        self.failing.push(pass_label.to_string());
        self
    }
}

#[async_trait::async_trait]
impl ImageRecognizer for MockImageRecognizer {
    async fn recognize(&self, _image: &[u8], pass: &OcrPass) -> Result<String> {
        let label = pass.label();
        if self.failing.contains(&label) {
            return Err(CaptionqError::RecognitionUnavailable {
                message: format!("mock failure for pass {label}"),
            });
        }
        Ok(self.responses.get(&label).cloned().unwrap_or_default())
    }

    fn name(&self) -> &str {
        "mock-ocr"
    }
}

/// Mock translation engine.
#[derive(Debug, Clone)]
pub struct MockTranslator {
    mode: TranslatorMode,
}

#[derive(Debug, Clone)]
enum TranslatorMode {
    /// Return the input uppercased (visible, deterministic "translation").
    Uppercase,
    /// Prefix the input with the target language code.
    Tagging,
    /// Always fail.
    Fail,
}

impl MockTranslator {
    pub fn uppercasing() -> Self {
        Self {
            mode: TranslatorMode::Uppercase,
        }
    }

    pub fn tagging() -> Self {
        Self {
            mode: TranslatorMode::Tagging,
        }
    }

    pub fn failing() -> Self {
        Self {
            mode: TranslatorMode::Fail,
        }
    }
}

#[async_trait::async_trait]
impl Translator for MockTranslator {
    async fn translate(&self, text: &str, target_lang: &str) -> Result<String> {
        match &self.mode {
            TranslatorMode::Uppercase => Ok(text.to_uppercase()),
            TranslatorMode::Tagging => Ok(format!("[{target_lang}] {text}")),
            TranslatorMode::Fail => Err(CaptionqError::Translation {
                message: "mock translation failure".to_string(),
            }),
        }
    }

    fn name(&self) -> &str {
        "mock-translate"
    }
}
