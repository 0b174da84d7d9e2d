//! Protocol-level tests against simulated store nodes.
//!
//! `SimNode` is an in-memory key-value node with real TTL expiry, plus
//! injectable latency and failure so the quorum, validity-window, and retry
//! behavior can be exercised without a live store.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::task::JoinSet;

use quorlock_core::{LockConfig, LockNode, NodeError, QuorumLock};

struct Entry {
    value: String,
    expires_at: Instant,
}

#[derive(Default)]
struct SimNode {
    store: Mutex<HashMap<String, Entry>>,
    latency: Duration,
    failing: AtomicBool,
    set_calls: AtomicUsize,
    delete_calls: AtomicUsize,
    offered_values: Mutex<Vec<String>>,
}

impl SimNode {
    fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn with_latency(latency: Duration) -> Arc<Self> {
        Arc::new(Self {
            latency,
            ..Self::default()
        })
    }

    fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn holds(&self, key: &str) -> Option<String> {
        let store = self.store.lock().unwrap();
        store
            .get(key)
            .filter(|entry| entry.expires_at > Instant::now())
            .map(|entry| entry.value.clone())
    }

    fn set_calls(&self) -> usize {
        self.set_calls.load(Ordering::SeqCst)
    }

    fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }

    fn offered_values(&self) -> Vec<String> {
        self.offered_values.lock().unwrap().clone()
    }
}

#[async_trait]
impl LockNode for SimNode {
    async fn try_set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, NodeError> {
        self.set_calls.fetch_add(1, Ordering::SeqCst);
        self.offered_values.lock().unwrap().push(value.to_owned());
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(NodeError::Unavailable("injected failure".into()));
        }

        let mut store = self.store.lock().unwrap();
        let now = Instant::now();
        if store
            .get(key)
            .is_some_and(|entry| entry.expires_at > now)
        {
            return Ok(false);
        }
        store.insert(
            key.to_owned(),
            Entry {
                value: value.to_owned(),
                expires_at: now + ttl,
            },
        );
        Ok(true)
    }

    async fn compare_and_delete(&self, key: &str, expected: &str) -> Result<bool, NodeError> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(NodeError::Unavailable("injected failure".into()));
        }

        let mut store = self.store.lock().unwrap();
        let now = Instant::now();
        let matches = store
            .get(key)
            .is_some_and(|entry| entry.expires_at > now && entry.value == expected);
        if matches {
            store.remove(key);
        }
        Ok(matches)
    }
}

fn as_lock_nodes(sims: &[Arc<SimNode>]) -> Vec<Arc<dyn LockNode>> {
    sims.iter()
        .map(|sim| Arc::clone(sim) as Arc<dyn LockNode>)
        .collect()
}

fn fast_config(max_retries: u32) -> LockConfig {
    LockConfig::builder()
        .max_retries(max_retries)
        .retry_delay(Duration::from_millis(10), Duration::from_millis(20))
        .build()
}

#[tokio::test]
async fn acquire_and_release_against_healthy_quorum() {
    let sims: Vec<_> = (0..3).map(|_| SimNode::new()).collect();
    let lock = QuorumLock::new(as_lock_nodes(&sims), fast_config(3)).unwrap();

    let handle = lock
        .acquire("orders:1", Duration::from_secs(10))
        .await
        .unwrap();
    assert!(handle.is_acquired());
    for sim in &sims {
        assert_eq!(sim.holds("orders:1").as_deref(), Some(handle.token()));
    }

    assert!(lock.release(&handle).await);
    for sim in &sims {
        assert_eq!(sim.holds("orders:1"), None);
    }
}

#[tokio::test]
async fn lock_is_exclusive_while_held() {
    let sims: Vec<_> = (0..5).map(|_| SimNode::new()).collect();
    let lock = QuorumLock::new(as_lock_nodes(&sims), fast_config(2)).unwrap();
    let contender = QuorumLock::new(as_lock_nodes(&sims), fast_config(2)).unwrap();

    let held = lock.acquire("jobs:reindex", Duration::from_secs(10)).await.unwrap();
    assert!(held.is_acquired());

    let blocked = contender
        .acquire("jobs:reindex", Duration::from_secs(10))
        .await
        .unwrap();
    assert!(!blocked.is_acquired());

    // The loser's token differs, so its cleanup must not evict the holder.
    for sim in &sims {
        assert_eq!(sim.holds("jobs:reindex").as_deref(), Some(held.token()));
    }

    assert!(lock.release(&held).await);
    let after = contender
        .acquire("jobs:reindex", Duration::from_secs(10))
        .await
        .unwrap();
    assert!(after.is_acquired());
}

#[tokio::test]
async fn concurrent_racers_yield_at_most_one_winner() {
    // Uneven node latencies so the racers' fan-outs interleave.
    let sims: Vec<_> = (0..5)
        .map(|i| SimNode::with_latency(Duration::from_millis(i as u64 * 4)))
        .collect();

    let mut racers = JoinSet::new();
    for _ in 0..8 {
        let lock = QuorumLock::new(as_lock_nodes(&sims), fast_config(1)).unwrap();
        racers.spawn(async move {
            lock.acquire("inventory:42", Duration::from_secs(10))
                .await
                .unwrap()
        });
    }

    let mut winners = 0;
    while let Some(handle) = racers.join_next().await {
        if handle.unwrap().is_acquired() {
            winners += 1;
        }
    }
    assert!(winners <= 1, "two clients held the same lock: {}", winners);
}

#[tokio::test]
async fn quorum_of_successes_tolerates_erroring_minority() {
    let sims: Vec<_> = (0..5).map(|_| SimNode::new()).collect();
    sims[3].set_failing(true);
    sims[4].set_failing(true);

    let lock = QuorumLock::new(as_lock_nodes(&sims), fast_config(1)).unwrap();
    let handle = lock
        .acquire("sessions:7", Duration::from_secs(10))
        .await
        .unwrap();
    assert!(handle.is_acquired());
}

#[tokio::test]
async fn erroring_majority_exhausts_retries_unacquired() {
    let sims: Vec<_> = (0..5).map(|_| SimNode::new()).collect();
    sims[2].set_failing(true);
    sims[3].set_failing(true);
    sims[4].set_failing(true);

    let lock = QuorumLock::new(as_lock_nodes(&sims), fast_config(2)).unwrap();
    let handle = lock
        .acquire("sessions:7", Duration::from_secs(10))
        .await
        .unwrap();
    assert!(!handle.is_acquired());

    // Both attempts reached every node, including the healthy minority.
    for sim in &sims {
        assert_eq!(sim.set_calls(), 2);
    }
}

#[tokio::test]
async fn collapsed_validity_window_rejects_even_unanimous_votes() {
    // Every node accepts the write, but only after the TTL is effectively
    // spent, so the remaining validity is non-positive.
    let sims: Vec<_> = (0..3)
        .map(|_| SimNode::with_latency(Duration::from_millis(80)))
        .collect();
    let lock = QuorumLock::new(as_lock_nodes(&sims), fast_config(1)).unwrap();

    let handle = lock
        .acquire("reports:daily", Duration::from_millis(50))
        .await
        .unwrap();
    assert!(!handle.is_acquired());

    // The partial acquisition was cleaned up best-effort.
    for sim in &sims {
        assert_eq!(sim.delete_calls(), 1);
    }
}

#[tokio::test]
async fn retry_budget_is_exact_and_delays_are_jittered() {
    let sims: Vec<_> = (0..3).map(|_| SimNode::new()).collect();
    for sim in &sims {
        sim.set_failing(true);
    }

    let lock = QuorumLock::new(as_lock_nodes(&sims), fast_config(4)).unwrap();
    let started = Instant::now();
    let handle = lock
        .acquire("batch:nightly", Duration::from_secs(5))
        .await
        .unwrap();
    let elapsed = started.elapsed();

    assert!(!handle.is_acquired());
    for sim in &sims {
        assert_eq!(sim.set_calls(), 4);
    }
    // Three sleeps between four attempts, each at least the configured
    // minimum delay.
    assert!(elapsed >= Duration::from_millis(30), "elapsed {:?}", elapsed);
    assert!(elapsed < Duration::from_secs(2), "elapsed {:?}", elapsed);
}

#[tokio::test]
async fn each_retry_attempt_uses_a_fresh_token() {
    let sims: Vec<_> = (0..3).map(|_| SimNode::new()).collect();
    // A foreign holder occupies the key so every attempt loses the race.
    for sim in &sims {
        sim.try_set_if_absent("queues:drain", "foreign-token", Duration::from_secs(30))
            .await
            .unwrap();
    }

    let lock = QuorumLock::new(as_lock_nodes(&sims), fast_config(3)).unwrap();
    let handle = lock
        .acquire("queues:drain", Duration::from_secs(10))
        .await
        .unwrap();

    assert!(!handle.is_acquired());
    for sim in &sims {
        // The foreign holder survived every cleanup fan-out.
        assert_eq!(sim.holds("queues:drain").as_deref(), Some("foreign-token"));

        // Skipping the squatter's own write, the three attempts each raced
        // under a distinct token.
        let offered = sim.offered_values();
        let attempt_tokens: std::collections::HashSet<_> = offered[1..].iter().collect();
        assert_eq!(offered.len(), 4);
        assert_eq!(attempt_tokens.len(), 3);
    }
}

#[tokio::test]
async fn release_is_idempotent() {
    let sims: Vec<_> = (0..3).map(|_| SimNode::new()).collect();
    let lock = QuorumLock::new(as_lock_nodes(&sims), fast_config(1)).unwrap();

    let handle = lock
        .acquire("cache:rebuild", Duration::from_secs(10))
        .await
        .unwrap();
    assert!(handle.is_acquired());

    assert!(lock.release(&handle).await);
    // Nothing left to delete; the second release reports that and nothing
    // else changes.
    assert!(!lock.release(&handle).await);
    for sim in &sims {
        assert_eq!(sim.holds("cache:rebuild"), None);
    }
}

#[tokio::test]
async fn release_of_unacquired_handle_is_harmless() {
    let sims: Vec<_> = (0..3).map(|_| SimNode::new()).collect();
    for sim in &sims {
        sim.set_failing(true);
    }
    let lock = QuorumLock::new(as_lock_nodes(&sims), fast_config(1)).unwrap();

    let handle = lock
        .acquire("cron:cleanup", Duration::from_secs(10))
        .await
        .unwrap();
    assert!(!handle.is_acquired());

    for sim in &sims {
        sim.set_failing(false);
    }
    // Best-effort no-op: the token was never written anywhere.
    assert!(!lock.release(&handle).await);
}

#[tokio::test]
async fn expired_entries_do_not_block_new_acquisitions() {
    let sims: Vec<_> = (0..3).map(|_| SimNode::new()).collect();
    let lock = QuorumLock::new(as_lock_nodes(&sims), fast_config(1)).unwrap();

    let first = lock
        .acquire("leases:worker", Duration::from_millis(40))
        .await
        .unwrap();
    assert!(first.is_acquired());

    tokio::time::sleep(Duration::from_millis(60)).await;

    let second = lock
        .acquire("leases:worker", Duration::from_secs(10))
        .await
        .unwrap();
    assert!(second.is_acquired());
    assert_ne!(first.token(), second.token());
}
