//! Token streams and caption line aggregation.

pub mod aggregator;
pub mod types;
pub mod words;

pub use aggregator::{Aggregator, segment_lines};
pub use types::{CaptionLine, Token};
pub use words::expand_segments;
