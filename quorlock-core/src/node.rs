//! Node capability contract consumed by the lock coordinator.

use async_trait::async_trait;
use std::time::Duration;

use crate::NodeError;

/// One independent key-value store node, exposing the two atomic primitives
/// the quorum-lock protocol needs.
///
/// Implementations own their connection handling and should bound every call
/// with a timeout so a single unreachable node cannot stall a fan-out. They
/// are stateless from the coordinator's perspective and may be shared across
/// concurrent `acquire`/`release` calls.
#[async_trait]
pub trait LockNode: Send + Sync {
    /// Atomically write `value` under `key` only if `key` does not currently
    /// exist, expiring automatically after `ttl`.
    ///
    /// Must execute as a single server-side operation; a separate existence
    /// check followed by a write races against competing clients. Returns
    /// `Ok(false)` if the key already existed.
    async fn try_set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, NodeError>;

    /// Atomically delete `key` only if its current value equals `expected`.
    ///
    /// Must execute as one atomic unit server-side (a read-then-delete
    /// script, not two round trips), so a lock acquired by another client
    /// after this one's TTL expired is never deleted. Returns `Ok(false)`
    /// if the value did not match or the key was absent.
    async fn compare_and_delete(&self, key: &str, expected: &str) -> Result<bool, NodeError>;
}
