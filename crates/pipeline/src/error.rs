//! Error types for the pipeline driver.

use thiserror::Error;

use emg_types::ConfigError;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("pipeline is already running")]
    AlreadyRunning,

    #[error("pipeline has been stopped and cannot be restarted")]
    Stopped,

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

/// Result type for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;
