//! Quorum fan-out executor.

use std::future::Future;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::warn;

use crate::LockNode;

/// Dispatch `op` to every node concurrently and count successful outcomes.
///
/// Each node gets its own task; none blocks another, and the executor waits
/// for every dispatched task before returning, so the count always accounts
/// for all N nodes. A task that panics is logged and counted as a failed
/// vote rather than propagated, so one bad node cannot abort a quorum
/// attempt.
pub async fn execute<F, Fut>(nodes: &[Arc<dyn LockNode>], op: F) -> usize
where
    F: Fn(Arc<dyn LockNode>) -> Fut,
    Fut: Future<Output = bool> + Send + 'static,
{
    let mut tasks = JoinSet::new();
    for node in nodes {
        tasks.spawn(op(Arc::clone(node)));
    }

    let mut successes = 0;
    while let Some(outcome) = tasks.join_next().await {
        match outcome {
            Ok(true) => successes += 1,
            Ok(false) => {}
            Err(err) => {
                warn!(error = %err, "node task aborted, counting as failed vote");
            }
        }
    }
    successes
}
