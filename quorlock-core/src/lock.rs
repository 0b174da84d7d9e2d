//! Quorum lock coordinator.

use rand::Rng;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::{fanout, token, LockConfig, LockError, LockNode};

/// The result of one acquisition attempt.
///
/// Every `acquire` call returns a populated handle, failed attempts
/// included: the handle always carries the token that was actually written
/// (or attempted), so a caller can never release with a stale or foreign
/// token. Check [`is_acquired`](LockHandle::is_acquired) before entering the
/// critical section.
#[derive(Debug, Clone)]
pub struct LockHandle {
    resource: String,
    token: String,
    acquired: bool,
}

impl LockHandle {
    fn new(resource: String, token: String) -> Self {
        Self {
            resource,
            token,
            acquired: false,
        }
    }

    /// Key identifying the protected entity.
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// The opaque token written to the nodes for this attempt.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Whether quorum was reached within the validity window.
    pub fn is_acquired(&self) -> bool {
        self.acquired
    }
}

/// Redlock-style lock coordinator over a fixed set of independent nodes.
///
/// All state (`quorum`, nodes, config) is immutable after construction, so a
/// coordinator can serve concurrent `acquire`/`release` calls for different
/// resources without any internal locking.
pub struct QuorumLock {
    nodes: Vec<Arc<dyn LockNode>>,
    quorum: usize,
    config: LockConfig,
}

impl QuorumLock {
    /// Create a coordinator over `nodes`.
    ///
    /// The quorum is fixed at `floor(N/2) + 1`; any two majorities then
    /// intersect in at least one node, which is what makes it impossible for
    /// two tokens to hold the lock at once.
    pub fn new(nodes: Vec<Arc<dyn LockNode>>, config: LockConfig) -> Result<Self, LockError> {
        if nodes.is_empty() {
            return Err(LockError::NoNodes);
        }
        config.validate()?;

        let quorum = nodes.len() / 2 + 1;
        Ok(Self {
            nodes,
            quorum,
            config,
        })
    }

    /// Number of nodes whose agreement is treated as authoritative.
    pub fn quorum(&self) -> usize {
        self.quorum
    }

    /// Number of nodes in the fixed set.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Get the configuration.
    pub fn config(&self) -> &LockConfig {
        &self.config
    }

    /// Try to acquire `resource` for `ttl`, retrying with jittered backoff
    /// up to `max_retries` attempts.
    ///
    /// Exhausted retries are not an error: the returned handle reports
    /// `acquired == false` and the caller decides whether to try again at a
    /// higher level. `Err` is reserved for misconfiguration (zero TTL).
    pub async fn acquire(&self, resource: &str, ttl: Duration) -> Result<LockHandle, LockError> {
        if ttl.is_zero() {
            return Err(LockError::InvalidTtl);
        }
        let ttl_ms = ttl.as_millis() as i64;

        let mut handle = LockHandle::new(resource.to_owned(), token::generate());
        for attempt in 1..=self.config.max_retries {
            if attempt > 1 {
                // Each attempt races under its own token.
                handle = LockHandle::new(resource.to_owned(), token::generate());
            }

            let start = Instant::now();
            let accepted = fanout::execute(&self.nodes, |node| {
                let key = handle.resource.clone();
                let value = handle.token.clone();
                async move {
                    match node.try_set_if_absent(&key, &value, ttl).await {
                        Ok(set) => set,
                        Err(err) => {
                            debug!(key = %key, error = %err, "node vote failed during acquire");
                            false
                        }
                    }
                }
            })
            .await;

            // 2ms on top of the fractional drift: 1ms store-side expiry
            // precision plus 1ms minimum drift for small TTLs.
            let drift_ms = (ttl_ms as f64 * self.config.clock_drift_factor) as i64 + 2;
            let elapsed_ms = start.elapsed().as_millis() as i64;
            let validity_ms = ttl_ms - elapsed_ms - drift_ms;

            if accepted >= self.quorum && validity_ms > 0 {
                handle.acquired = true;
                info!(resource, validity_ms, "lock acquired");
                return Ok(handle);
            }

            debug!(
                resource,
                attempt,
                accepted,
                quorum = self.quorum,
                validity_ms,
                "quorum attempt failed"
            );

            // Best-effort cleanup of any partial acquisition; the outcome
            // is deliberately unchecked.
            self.delete_everywhere(&handle).await;

            if attempt < self.config.max_retries {
                tokio::time::sleep(self.jittered_delay()).await;
            }
        }

        Ok(handle)
    }

    /// Seconds-typed convenience wrapper around [`acquire`](Self::acquire).
    pub async fn acquire_secs(
        &self,
        resource: &str,
        ttl_secs: u64,
    ) -> Result<LockHandle, LockError> {
        if ttl_secs == 0 {
            return Err(LockError::InvalidTtl);
        }
        self.acquire(resource, Duration::from_secs(ttl_secs)).await
    }

    /// Release the lock held by `handle`, returning whether a majority of
    /// nodes confirmed the delete.
    ///
    /// Safe on an unacquired handle and idempotent: a second call finds
    /// nothing to delete on any node and simply reports `false`.
    pub async fn release(&self, handle: &LockHandle) -> bool {
        let deleted = self.delete_everywhere(handle).await;
        let released = deleted >= self.quorum;

        if released {
            debug!(resource = %handle.resource, "lock released");
        } else {
            debug!(
                resource = %handle.resource,
                deleted,
                quorum = self.quorum,
                "release did not reach quorum"
            );
        }
        released
    }

    /// Fan out a compare-and-delete of the handle's token to every node.
    async fn delete_everywhere(&self, handle: &LockHandle) -> usize {
        fanout::execute(&self.nodes, |node| {
            let key = handle.resource.clone();
            let expected = handle.token.clone();
            async move {
                match node.compare_and_delete(&key, &expected).await {
                    Ok(deleted) => deleted,
                    Err(err) => {
                        debug!(key = %key, error = %err, "node vote failed during delete");
                        false
                    }
                }
            }
        })
        .await
    }

    /// Uniform jittered delay from the configured retry range, spreading
    /// competing clients apart instead of letting them retry in lockstep.
    fn jittered_delay(&self) -> Duration {
        let min = self.config.retry_delay_min.as_millis() as u64;
        let max = self.config.retry_delay_max.as_millis() as u64;
        Duration::from_millis(rand::rng().random_range(min..=max))
    }
}
