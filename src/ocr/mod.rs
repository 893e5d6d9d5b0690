//! OCR ensemble: per-page candidate recognition, selection, and cleanup.

pub mod cleanup;
pub mod ensemble;
pub mod pages;
pub mod selector;

pub use ensemble::{OcrEnsemble, PageText};
pub use pages::{MAX_PAGES, parse_page_range};
pub use selector::{Candidate, NO_TEXT_RECOGNIZED, select_best, winning_text};
