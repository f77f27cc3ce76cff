//! Sample acquisition for the EMG gesture pipeline.
//!
//! The serial transport itself lives behind the [`LineSource`] trait: a
//! collaborator that yields decoded, newline-delimited text lines. This crate
//! parses those lines into timestamped samples and runs the background
//! acquisition task that feeds the pipeline's FIFO queue.

pub mod mock;
pub mod parser;
pub mod source;

// Re-export types for convenience
pub use self::mock::MockLineSource;
pub use self::parser::parse_line;
pub use self::source::{LineSource, SampleSource};
