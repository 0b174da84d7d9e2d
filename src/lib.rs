// Quorlock - Redlock-style distributed mutual exclusion for Rust
//
// This library provides a quorum lock over N independent key-value nodes,
// safe under partial node failure as long as a majority is reachable.

// Re-export the protocol core
pub use quorlock_core::*;

// Re-export optional crates
#[cfg(feature = "redis")]
pub use quorlock_redis;

// Prelude for common imports
pub mod prelude {
    pub use quorlock_core::{
        LockConfig, LockConfigBuilder, LockError, LockHandle, LockNode, NodeError, QuorumLock,
    };

    #[cfg(feature = "redis")]
    pub use quorlock_redis::{RedisLockNode, RedisNodeConfig};
}
