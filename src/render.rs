//! Output rendering: timestamped transcripts, page texts, and the
//! playback synchronization document.

use crate::job::JobPhase;
use crate::ocr::PageText;
use crate::transcript::CaptionLine;
use serde::{Deserialize, Serialize};

/// Attribution block appended once at the end of every complete output.
#[derive(Debug, Clone, PartialEq)]
pub struct Footer {
    pub attribution: String,
    pub note: Option<String>,
}

impl Footer {
    pub fn new(attribution: impl Into<String>) -> Self {
        Self {
            attribution: attribution.into(),
            note: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    fn render(&self) -> String {
        let mut block = format!("\n--\n{}\n", self.attribution);
        if let Some(note) = &self.note {
            block.push_str(note);
            block.push('\n');
        }
        block
    }
}

impl Default for Footer {
    fn default() -> Self {
        Self::new(format!("captionq {}", crate::version_string()))
    }
}

/// Format seconds as `MM:SS`. Minutes grow past 59 rather than rolling
/// into hours; negative input clamps to zero.
pub fn format_timestamp(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    format!("{:02}:{:02}", total / 60, total % 60)
}

/// Render caption lines as a flat timestamped text block.
///
/// One `[MM:SS] text` line per caption in time order, each translation on
/// its own indented follow-up line, and the footer appended once.
pub fn render_transcript(lines: &[CaptionLine], footer: &Footer) -> String {
    let mut out = String::new();
    for line in lines {
        out.push_str(&format!(
            "[{}] {}\n",
            format_timestamp(line.start),
            line.text
        ));
        if let Some(translation) = &line.translation {
            out.push_str(&format!("        {translation}\n"));
        }
    }
    out.push_str(&footer.render());
    out
}

/// Render caption lines as a plain text block without timestamps, for
/// whole-text speech output. Translations follow their line in parens.
pub fn render_plain(lines: &[CaptionLine], footer: &Footer) -> String {
    let mut out = String::new();
    for line in lines {
        out.push_str(&line.text);
        if let Some(translation) = &line.translation {
            out.push_str(&format!(" ({translation})"));
        }
        out.push('\n');
    }
    out.push_str(&footer.render());
    out
}

/// Render recognized page texts. Multi-page output labels each page;
/// a single page is emitted bare.
pub fn render_pages(pages: &[PageText], footer: &Footer) -> String {
    let mut out = String::new();
    if pages.len() == 1 {
        out.push_str(&pages[0].text);
        out.push('\n');
    } else {
        for (i, page) in pages.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            out.push_str(&format!("Page {}:\n{}\n", page.index + 1, page.text));
        }
    }
    out.push_str(&footer.render());
    out
}

/// Human-readable queue status for a freshly submitted job.
pub fn queue_message(position: usize) -> String {
    match position {
        0 => "Queued: you are next.".to_string(),
        1 => "Queued: 1 job ahead of you.".to_string(),
        n => format!("Queued: {n} jobs ahead of you."),
    }
}

/// Human-readable progress line for a running job.
pub fn progress_message(phase: JobPhase) -> String {
    format!("{}... {}%", phase.describe(), phase.percent())
}

/// The playback synchronization contract.
///
/// A client holding this document can derive the active line for any
/// playback time from the `(start, end, text, translation)` tuples alone:
/// no server state is needed at render time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncDocument {
    pub lines: Vec<CaptionLine>,
}

impl SyncDocument {
    pub fn new(lines: Vec<CaptionLine>) -> Self {
        Self { lines }
    }

    /// Index of the line where `start <= t < end`, if any.
    ///
    /// Caption intervals are contiguous and non-overlapping, so at most
    /// one line matches.
    pub fn active_line_at(&self, t: f64) -> Option<usize> {
        self.lines.iter().position(|line| line.contains(t))
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}
