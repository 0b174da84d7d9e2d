//! # Quorlock Redis
//!
//! Redis node capabilities for the Quorlock quorum lock.
//!
//! Each [`RedisLockNode`] wraps one independent Redis endpoint and exposes
//! the two atomic primitives the protocol needs: `SET key value NX PX ttl`
//! and a scripted compare-and-delete. Connections use the redis crate's
//! reconnecting `ConnectionManager`; every command carries a bounded
//! timeout so one unreachable node cannot stall a quorum attempt.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use quorlock_core::LockConfig;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let lock = quorlock_redis::coordinator(
//!         &[
//!             "redis://10.0.0.1:6379",
//!             "redis://10.0.0.2:6379",
//!             "redis://10.0.0.3:6379",
//!         ],
//!         LockConfig::default(),
//!     )
//!     .await?;
//!
//!     let handle = lock.acquire("orders:1234", Duration::from_secs(30)).await?;
//!     if handle.is_acquired() {
//!         // Critical section
//!         lock.release(&handle).await;
//!     }
//!
//!     Ok(())
//! }
//! ```

mod config;
mod error;
mod node;

pub use config::{RedisNodeConfig, RedisNodeConfigBuilder};
pub use error::{RedisNodeError, Result};
pub use node::RedisLockNode;

// Re-export redis crate for convenience
pub use redis;

use std::sync::Arc;

use quorlock_core::{LockConfig, LockNode, QuorumLock};

/// Build a [`QuorumLock`] from one connection URL per independent Redis
/// node, with default node settings.
pub async fn coordinator<S: AsRef<str>>(
    addresses: &[S],
    config: LockConfig,
) -> Result<QuorumLock> {
    let configs = addresses
        .iter()
        .map(|address| RedisNodeConfig::new(address.as_ref()))
        .collect();
    coordinator_with_configs(configs, config).await
}

/// Build a [`QuorumLock`] from fully specified per-node configurations.
pub async fn coordinator_with_configs(
    node_configs: Vec<RedisNodeConfig>,
    config: LockConfig,
) -> Result<QuorumLock> {
    let mut nodes: Vec<Arc<dyn LockNode>> = Vec::with_capacity(node_configs.len());
    for node_config in node_configs {
        let node = RedisLockNode::connect(node_config).await?;
        nodes.push(Arc::new(node));
    }
    Ok(QuorumLock::new(nodes, config)?)
}
