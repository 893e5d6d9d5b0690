//! Data types for transcript aggregation.

use serde::{Deserialize, Serialize};

/// A single recognized word with its time span, in seconds.
///
/// Tokens are ordered by `start` and non-overlapping (recognition engine
/// guarantee); they are immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub text: String,
    pub start: f64,
    pub end: f64,
}

impl Token {
    pub fn new(text: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            text: text.into(),
            start,
            end,
        }
    }
}

/// A display-ready grouped span of tokens with an optional translation.
///
/// `end` is the start of the *next* line, not the end of this line's last
/// token: a line stays visible until the next one begins. Only the final
/// line of a transcript ends at its own last token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionLine {
    pub start: f64,
    pub end: f64,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translation: Option<String>,
}

impl CaptionLine {
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
            translation: None,
        }
    }

    /// True when `t` falls inside this line's visible interval.
    pub fn contains(&self, t: f64) -> bool {
        self.start <= t && t < self.end
    }
}
