//! Error types for wacloud-core

use thiserror::Error;

/// Action dispatch error type
#[derive(Debug, Error)]
pub enum Error {
    /// No action registered under this name
    #[error("action not found: {0}")]
    NotFound(String),

    /// Parameters rejected by the action's validate gate
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Handler failed after validation succeeded
    #[error("execution failed: {0}")]
    Execution(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
