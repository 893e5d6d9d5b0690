//! Candidate selection for the OCR ensemble.

use crate::ocr::cleanup;

/// Sentinel result for a page where no pass produced any text.
///
/// Returned instead of an error so the job continues to the next page.
pub const NO_TEXT_RECOGNIZED: &str = "[no text recognized]";

/// One OCR attempt's output under a specific pass configuration.
///
/// Ephemeral: discarded once the best candidate for the page is chosen.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub text: String,
    /// Character count of `text`: the selection score.
    pub score: usize,
    /// Label of the pass that produced this candidate.
    pub source_config: String,
}

impl Candidate {
    pub fn new(text: impl Into<String>, source_config: impl Into<String>) -> Self {
        let text = text.into();
        let score = text.chars().count();
        Self {
            text,
            score,
            source_config: source_config.into(),
        }
    }

    /// True when the candidate carries no usable text.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Pick the best candidate: the one with the greatest character count
/// among non-blank candidates, ties broken by submission order (first
/// wins). Length is a pragmatic proxy for the most complete transcription,
/// not an accuracy guarantee.
pub fn select_best(candidates: &[Candidate]) -> Option<&Candidate> {
    let mut best: Option<&Candidate> = None;
    for candidate in candidates {
        if candidate.is_blank() {
            continue;
        }
        // Strictly greater keeps the earlier candidate on ties.
        if best.is_none_or(|b| candidate.score > b.score) {
            best = Some(candidate);
        }
    }
    best
}

/// Select the winner, apply the correction pass, and return the page text.
/// All-blank input yields the sentinel, never an error.
pub fn winning_text(candidates: &[Candidate]) -> String {
    match select_best(candidates) {
        Some(winner) => cleanup::correct(&winner.text),
        None => NO_TEXT_RECOGNIZED.to_string(),
    }
}
