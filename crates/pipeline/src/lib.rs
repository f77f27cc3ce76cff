//! Acquisition-to-classification pipeline for multi-channel EMG.
//!
//! Samples flow from a background sample source through an unbounded FIFO
//! queue into a tick-driven driver, which runs each channel through a fixed
//! filter cascade (comb → low-pass → high-pass), classifies the cleaned value
//! against named thresholds with a sliding wall-clock majority window, and
//! publishes the cross-channel winner to a single-slot control mailbox.

pub mod arbiter;
pub mod classifier;
pub mod driver;
pub mod error;
pub mod filters;
pub mod mailbox;

#[cfg(test)]
mod tests;

// Re-export the public surface
pub use arbiter::arbitrate;
pub use classifier::StateManager;
pub use driver::{GesturePipeline, PipelineState};
pub use error::PipelineError;
pub use filters::{CombFilter, FilterBank, FilterCascade, HighPassFilter, LowPassFilter};
pub use mailbox::ControlMailbox;
