//! Error taxonomy for the acquisition and classification pipeline.
//!
//! Three kinds with different blast radii: `ParseError` drops one line and
//! the pipeline continues, `TransportError` is fatal to the sample source and
//! stops the driver, `ConfigError` is rejected up front and leaves the
//! previous valid configuration in effect.

use thiserror::Error;

/// A single malformed line from the sensor. Recoverable: the line is logged
/// and discarded, acquisition continues.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    /// Token count did not match timestamp + channel count
    #[error("invalid sample line {line:?}: expected {expected} values, got {actual}")]
    ArityMismatch {
        line: String,
        expected: usize,
        actual: usize,
    },
    /// A token failed to parse as a number
    #[error("invalid sample line {line:?}: {token:?} is not a number")]
    NotANumber { line: String, token: String },
}

/// An I/O-level failure of the underlying line transport (port closed,
/// device unplugged). Fatal to the sample source; the driver sees it as a
/// stop signal, not a crash.
#[derive(Error, Debug, Clone)]
pub enum TransportError {
    #[error("I/O error on sensor transport: {0}")]
    Io(String),
    #[error("sensor device disconnected: {0}")]
    Disconnected(String),
    #[error("sensor transport closed")]
    Closed,
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        TransportError::Io(err.to_string())
    }
}

/// An invalid configuration value, rejected at construction or by a
/// live-update setter.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("alpha must be within [0, 1], got {0}")]
    AlphaOutOfRange(f64),
    #[error("threshold must be non-negative, got {0}")]
    NegativeThreshold(f64),
    #[error("channel count must be greater than zero")]
    NoChannels,
    #[error("channel {channel} has no threshold states")]
    NoStates { channel: usize },
    #[error("expected {expected} channel configurations, got {actual}")]
    ChannelCountMismatch { expected: usize, actual: usize },
    #[error("no threshold state named {0:?} on this channel")]
    UnknownState(String),
    #[error("channel index {channel} out of range for {count} channels")]
    ChannelOutOfRange { channel: usize, count: usize },
    #[error("interval must be greater than zero: {0}")]
    ZeroInterval(&'static str),
}
