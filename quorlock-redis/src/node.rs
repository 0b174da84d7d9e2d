//! Redis node capability.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use std::time::Duration;
use tokio::time::timeout;
use tracing::info;

use quorlock_core::{LockNode, NodeError};

use crate::{RedisNodeConfig, RedisNodeError, Result};

/// Server-side read-then-delete as one atomic unit, so a lock acquired by
/// another client after this one's TTL expired is never deleted.
const COMPARE_AND_DELETE_SCRIPT: &str = r#"
    if redis.call("get", KEYS[1]) == ARGV[1] then
        return redis.call("del", KEYS[1])
    else
        return 0
    end
"#;

/// One Redis store node participating in the quorum.
///
/// Holds a reconnecting multiplexed connection; clones of it are cheap, so a
/// single node handle serves any number of concurrent fan-out votes. Every
/// command is bounded by the configured command timeout.
pub struct RedisLockNode {
    url: String,
    conn: ConnectionManager,
    command_timeout: Duration,
    delete_script: redis::Script,
}

impl RedisLockNode {
    /// Connect to one Redis node.
    pub async fn connect(config: RedisNodeConfig) -> Result<Self> {
        let client = redis::Client::open(config.connection_url())
            .map_err(|e| RedisNodeError::Config(e.to_string()))?;

        let conn = timeout(config.connect_timeout, client.get_connection_manager())
            .await
            .map_err(|_| {
                RedisNodeError::Connection(format!("timed out connecting to {}", config.url))
            })?
            .map_err(|e| RedisNodeError::Connection(e.to_string()))?;

        info!(url = %config.url, "Redis lock node connected");

        Ok(Self::from_connection(config, conn))
    }

    /// Wrap an existing connection manager.
    pub fn from_connection(config: RedisNodeConfig, conn: ConnectionManager) -> Self {
        Self {
            url: config.url,
            conn,
            command_timeout: config.command_timeout,
            delete_script: redis::Script::new(COMPARE_AND_DELETE_SCRIPT),
        }
    }

    /// The node's configured URL (without assembled credentials).
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl LockNode for RedisLockNode {
    async fn try_set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> std::result::Result<bool, NodeError> {
        let mut conn = self.conn.clone();

        let mut cmd = redis::cmd("SET");
        cmd.arg(key)
            .arg(value)
            .arg("NX") // Only set if not exists
            .arg("PX") // Expiry in milliseconds
            .arg(ttl.as_millis() as u64);

        let reply: Option<String> = timeout(self.command_timeout, cmd.query_async(&mut conn))
            .await
            .map_err(|_| NodeError::Timeout)?
            .map_err(map_redis_err)?;

        Ok(reply.is_some())
    }

    async fn compare_and_delete(
        &self,
        key: &str,
        expected: &str,
    ) -> std::result::Result<bool, NodeError> {
        let mut conn = self.conn.clone();

        let mut invocation = self.delete_script.prepare_invoke();
        invocation.key(key).arg(expected);

        let deleted: i64 = timeout(self.command_timeout, invocation.invoke_async(&mut conn))
            .await
            .map_err(|_| NodeError::Timeout)?
            .map_err(map_redis_err)?;

        Ok(deleted == 1)
    }
}

fn map_redis_err(err: redis::RedisError) -> NodeError {
    if err.is_timeout() {
        NodeError::Timeout
    } else if err.is_io_error() || err.is_connection_refusal() || err.is_connection_dropped() {
        NodeError::Unavailable(err.to_string())
    } else {
        NodeError::Protocol(err.to_string())
    }
}
