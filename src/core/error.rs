//! Error types for puller operations.

use std::time::Duration;

use thiserror::Error;

use crate::core::worker_pool::PoolError;

/// Errors produced by puller components.
#[derive(Debug, Error)]
pub enum PullerError {
    /// Invoking the cancellation signal did not finish within the caller's deadline.
    #[error("stop timed out after {timeout:?}")]
    StopTimeout {
        /// Deadline supplied to `stop_pull`.
        timeout: Duration,
    },
    /// Options failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// The pulling loop or a dispatch thread could not be spawned.
    #[error("spawn failed: {0}")]
    Spawn(String),
    /// The bounded worker pool rejected an operation.
    #[error("worker pool error: {0}")]
    Pool(#[from] PoolError),
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
