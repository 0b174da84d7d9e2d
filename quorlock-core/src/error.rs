//! Lock protocol error types.

use thiserror::Error;

/// Errors surfaced by [`QuorumLock`](crate::QuorumLock) construction and
/// acquisition calls.
///
/// A failed acquisition is not an error: it comes back as a
/// [`LockHandle`](crate::LockHandle) with `acquired == false`. These
/// variants cover only misconfiguration, which fails fast and is never
/// retried.
#[derive(Debug, Error)]
pub enum LockError {
    /// No nodes were supplied at construction.
    #[error("at least one lock node is required")]
    NoNodes,

    /// A zero TTL was passed to an acquisition call.
    #[error("lock TTL must be positive")]
    InvalidTtl,

    /// Configuration error.
    #[error("invalid lock configuration: {0}")]
    InvalidConfig(String),
}

/// Errors reported by a single node's atomic primitives.
///
/// The fan-out executor counts any of these as a failed vote for that node;
/// they never abort a quorum attempt and never reach the caller.
#[derive(Debug, Error)]
pub enum NodeError {
    /// The node could not be reached or the call failed in transit.
    #[error("node unavailable: {0}")]
    Unavailable(String),

    /// The node call exceeded its command timeout.
    #[error("node call timed out")]
    Timeout,

    /// The node replied with something the client could not interpret.
    #[error("protocol error: {0}")]
    Protocol(String),
}
