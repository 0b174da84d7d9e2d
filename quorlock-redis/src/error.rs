//! Redis node error types.

use thiserror::Error;

/// Result type for Redis node construction.
pub type Result<T> = std::result::Result<T, RedisNodeError>;

/// Errors raised while building Redis node capabilities.
///
/// Runtime command failures never use this type: once a node is connected,
/// per-call failures are reported as [`quorlock_core::NodeError`] and
/// absorbed by the fan-out as failed votes.
#[derive(Debug, Error)]
pub enum RedisNodeError {
    /// Connection error.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Coordinator construction error.
    #[error(transparent)]
    Lock(#[from] quorlock_core::LockError),

    /// Underlying Redis error.
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),
}
