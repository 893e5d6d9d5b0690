//! Deterministic text correction applied to a winning OCR candidate.
//!
//! Heuristic, not an accuracy pass: collapses whitespace and fixes a
//! fixed table of well-known character confusions. Running it twice
//! produces the same output as running it once.

/// Character sequences OCR engines commonly emit for other glyphs.
const CONFUSION_SUBSTITUTIONS: &[(&str, &str)] = &[
    ("ﬁ", "fi"),
    ("ﬂ", "fl"),
    ("’", "'"),
    ("‘", "'"),
    ("“", "\""),
    ("”", "\""),
    ("…", "..."),
];

/// A standalone vertical bar is almost always a misread capital I.
fn fix_word(word: &str) -> &str {
    if word == "|" { "I" } else { word }
}

/// Correct a recognized page text.
///
/// Horizontal whitespace runs collapse to single spaces, blank lines are
/// dropped, and the confusion table is applied. Line structure is
/// preserved: page layout often carries meaning.
pub fn correct(text: &str) -> String {
    let mut lines: Vec<String> = Vec::new();

    for line in text.lines() {
        let words: Vec<&str> = line.split_whitespace().map(fix_word).collect();
        if words.is_empty() {
            continue;
        }
        let mut joined = words.join(" ");
        for (from, to) in CONFUSION_SUBSTITUTIONS {
            if joined.contains(from) {
                joined = joined.replace(from, to);
            }
        }
        lines.push(joined);
    }

    lines.join("\n")
}
