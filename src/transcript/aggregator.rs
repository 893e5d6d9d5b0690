//! Transcript aggregation: grouping a flat token stream into caption lines.

use crate::engine::Translator;
use crate::transcript::types::{CaptionLine, Token};
use std::sync::Arc;

/// Punctuation stripped before the capital-letter check. Recognition
/// engines frequently glue opening quotes or parentheses onto the first
/// word of a sentence.
const LEADING_PUNCTUATION: &[char] = &['"', '\'', '“', '”', '‘', '’', '«', '»', '(', '['];

/// True when this token opens a new caption line.
///
/// The line-break heuristic: a token whose first character (after
/// stripping leading quote/parenthesis punctuation) is uppercase starts a
/// new line. This approximates sentence boundaries without relying on
/// terminal punctuation, which the engines do not guarantee. It is a
/// replaceable strategy, not a contract: any segmenter producing caption
/// lines with monotonically increasing `start` may substitute for it.
fn starts_new_line(text: &str) -> bool {
    text.trim_start_matches(LEADING_PUNCTUATION)
        .chars()
        .next()
        .is_some_and(char::is_uppercase)
}

/// Group an ordered token stream into caption lines.
///
/// Pure and deterministic: the same tokens always produce the same lines.
/// Each line's `end` is the `start` of the next line; the final line ends
/// at its own last token. An empty stream yields no lines.
pub fn segment_lines(tokens: &[Token]) -> Vec<CaptionLine> {
    let mut lines = Vec::new();
    let Some(first) = tokens.first() else {
        return lines;
    };

    let mut buffer: Vec<&str> = vec![&first.text];
    let mut line_start = first.start;

    for token in &tokens[1..] {
        if starts_new_line(&token.text) {
            lines.push(CaptionLine::new(line_start, token.start, buffer.join(" ")));
            buffer.clear();
            line_start = token.start;
        }
        buffer.push(&token.text);
    }

    let stream_end = tokens[tokens.len() - 1].end;
    lines.push(CaptionLine::new(line_start, stream_end, buffer.join(" ")));
    lines
}

/// Aggregates tokens into caption lines and attaches per-line translations.
pub struct Aggregator {
    translator: Arc<dyn Translator>,
}

impl Aggregator {
    pub fn new(translator: Arc<dyn Translator>) -> Self {
        Self { translator }
    }

    /// Run the line-break pass, then translate each finalized line when a
    /// target language is requested.
    ///
    /// Translation is a soft dependency: a line whose translation fails is
    /// emitted untranslated instead of failing the job. Lines are
    /// translated sequentially, preserving token order in the output.
    pub async fn aggregate(&self, tokens: &[Token], target_lang: Option<&str>) -> Vec<CaptionLine> {
        let mut lines = segment_lines(tokens);

        if let Some(lang) = target_lang {
            for line in &mut lines {
                if let Ok(translated) = self.translator.translate(&line.text, lang).await {
                    line.translation = Some(translated);
                }
            }
        }

        lines
    }
}
