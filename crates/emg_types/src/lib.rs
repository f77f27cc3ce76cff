//! Shared types for the EMG gesture pipeline
//!
//! This crate contains the core types used throughout the acquisition and
//! classification system: sample and event definitions, configuration types,
//! and the error taxonomy shared by the sensor and pipeline crates.

pub mod config;
pub mod data;
pub mod error;
pub mod event;

// Re-export commonly used types
pub use config::*;
pub use data::*;
pub use error::*;
pub use event::*;
