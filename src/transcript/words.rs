//! Segment-to-word expansion.
//!
//! Speech engines return sentence-level segments. The aggregator works on
//! word-level tokens, so each segment's text is split on whitespace and
//! its time span divided evenly across the words.

use crate::engine::Segment;
use crate::transcript::types::Token;

/// Expand engine segments into an ordered word-level token stream.
///
/// Word boundaries inside a segment carry no timing information of their
/// own, so each word gets an equal share of the segment's duration. The
/// last word of a segment ends exactly at the segment end so no drift
/// accumulates across segments. Segments with no words are skipped.
pub fn expand_segments(segments: &[Segment]) -> Vec<Token> {
    let mut tokens = Vec::new();

    for segment in segments {
        let words: Vec<&str> = segment.text.split_whitespace().collect();
        if words.is_empty() {
            continue;
        }

        let duration = (segment.end - segment.start) / words.len() as f64;
        for (i, word) in words.iter().enumerate() {
            let start = segment.start + i as f64 * duration;
            let end = if i == words.len() - 1 {
                segment.end
            } else {
                segment.start + (i + 1) as f64 * duration
            };
            tokens.push(Token::new(*word, start, end));
        }
    }

    tokens
}
