//! Quorum-lock protocol core
//!
//! This crate implements the Redlock-style quorum lock: a client acquires a
//! named lock by racing to write a unique token to a majority of N
//! independent key-value nodes before the TTL expires, and releases it by
//! majority compare-and-delete. The lock stays safe under partial node
//! failure as long as a majority of nodes is reachable and clock skew stays
//! within the configured drift budget.
//!
//! ## Features
//!
//! - **Quorum Fan-Out** - One task per node, every outcome accounted for
//! - **Validity Windows** - TTL minus acquisition latency minus drift margin
//! - **Bounded Retries** - Jittered backoff between acquisition attempts
//! - **Pluggable Nodes** - Any store implementing [`LockNode`]
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use quorlock_core::{LockConfig, QuorumLock};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // `nodes` is a Vec<Arc<dyn LockNode>>, e.g. from quorlock-redis
//!     let lock = QuorumLock::new(nodes, LockConfig::default())?;
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
//!
//! ## Operating assumptions
//!
//! The protocol compensates for bounded, estimated clock drift between the
//! client and the store nodes; it does not detect or recover from skew
//! exceeding `clock_drift_factor`. It also does not issue fencing tokens:
//! a client that keeps acting after its lock expired is not stopped at the
//! protected resource. These are known limitations of this class of
//! algorithm, not configuration problems.

pub mod config;
pub mod error;
pub mod fanout;
pub mod lock;
pub mod node;

mod token;

pub use config::{LockConfig, LockConfigBuilder};
pub use error::{LockError, NodeError};
pub use lock::{LockHandle, QuorumLock};
pub use node::LockNode;
