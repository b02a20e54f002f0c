//! Archive intake: unpacking uploaded zip containers into a working area.

mod extract;

pub use extract::{ExtractionSummary, extract_archive, extract_zip};
