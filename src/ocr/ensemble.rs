//! Per-page OCR ensemble: run every configured pass, keep the best result.

use crate::engine::{ImageRecognizer, OcrPass};
use crate::ocr::selector::{Candidate, winning_text};
use std::sync::Arc;

/// Recognized text for one page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageText {
    /// 0-based page index within the job.
    pub index: usize,
    pub text: String,
}

/// Runs the recognition engine over every (variant, profile) pass of a
/// page and deterministically picks one winning text.
pub struct OcrEnsemble {
    recognizer: Arc<dyn ImageRecognizer>,
    passes: Vec<OcrPass>,
}

impl OcrEnsemble {
    pub fn new(recognizer: Arc<dyn ImageRecognizer>, passes: Vec<OcrPass>) -> Self {
        Self { recognizer, passes }
    }

    pub fn passes(&self) -> &[OcrPass] {
        &self.passes
    }

    /// Recognize one page.
    ///
    /// Never fails: a pass that errors contributes no candidate, and a
    /// page where every pass errored or returned empty text yields the
    /// sentinel so the job continues to the next page.
    pub async fn recognize_page(&self, index: usize, image: &[u8]) -> PageText {
        let mut candidates = Vec::with_capacity(self.passes.len());

        for pass in &self.passes {
            match self.recognizer.recognize(image, pass).await {
                Ok(text) => candidates.push(Candidate::new(text, pass.label())),
                Err(_) => continue,
            }
        }

        PageText {
            index,
            text: winning_text(&candidates),
        }
    }
}
