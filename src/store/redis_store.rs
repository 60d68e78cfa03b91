//! Redis Store Module
//!
//! `StoreClient` backed by a Redis server through a multiplexed,
//! auto-reconnecting connection manager.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use redis::aio::ConnectionManager;
use redis::{ErrorKind, FromRedisValue, RedisError};
use tracing::{debug, info};

use super::{ensure_ttl, StoreClient};
use crate::error::{CacheError, Result};

// == Redis Store ==
/// Redis-backed store with a per-command deadline.
#[derive(Clone)]
pub struct RedisStore {
    /// Shared multiplexed connection; clones share the same socket
    conn: ConnectionManager,
    /// Deadline applied to every command
    timeout: Duration,
}

impl RedisStore {
    // == Connect ==
    /// Opens the connection to `url`, failing if it cannot be established
    /// within `timeout`.
    pub async fn connect(url: &str, timeout: Duration) -> Result<Self> {
        let client = redis::Client::open(url).map_err(map_redis_error)?;

        let conn = tokio::time::timeout(timeout, ConnectionManager::new(client))
            .await
            .map_err(|_| {
                CacheError::StoreTimeout(format!(
                    "connecting to {} exceeded {}ms",
                    url,
                    timeout.as_millis()
                ))
            })?
            .map_err(map_redis_error)?;

        info!(url = %url, timeout_ms = timeout.as_millis() as u64, "Connected to Redis");
        Ok(Self { conn, timeout })
    }

    /// Runs one command under the configured deadline.
    async fn run<T: FromRedisValue>(&self, op: &str, cmd: redis::Cmd) -> Result<T> {
        let mut conn = self.conn.clone();

        match tokio::time::timeout(self.timeout, cmd.query_async(&mut conn)).await {
            Ok(result) => result.map_err(map_redis_error),
            Err(_) => Err(CacheError::StoreTimeout(format!(
                "{} exceeded {}ms",
                op,
                self.timeout.as_millis()
            ))),
        }
    }
}

#[async_trait]
impl StoreClient for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<Bytes>> {
        let mut cmd = redis::cmd("GET");
        cmd.arg(key);

        let value: Option<Vec<u8>> = self.run("GET", cmd).await?;
        debug!(key = %key, found = value.is_some(), "Redis GET");
        Ok(value.map(Bytes::from))
    }

    async fn set_with_expiry(&self, key: &str, value: Bytes, ttl_seconds: u64) -> Result<()> {
        ensure_ttl(ttl_seconds)?;

        let mut cmd = redis::cmd("SETEX");
        cmd.arg(key).arg(ttl_seconds).arg(value.as_ref());

        let () = self.run("SETEX", cmd).await?;
        debug!(key = %key, ttl_secs = ttl_seconds, "Redis SETEX");
        Ok(())
    }

    async fn increment(&self, key: &str) -> Result<i64> {
        let mut cmd = redis::cmd("INCR");
        cmd.arg(key);

        let value: i64 = self.run("INCR", cmd).await?;
        debug!(key = %key, value, "Redis INCR");
        Ok(value)
    }
}

// == Error Mapping ==
/// Classifies a client error into the store failure taxonomy.
fn map_redis_error(err: RedisError) -> CacheError {
    if err.is_timeout() {
        return CacheError::StoreTimeout(err.to_string());
    }
    if err.is_io_error() || err.is_connection_refusal() || err.is_connection_dropped() {
        return CacheError::StoreUnavailable(err.to_string());
    }

    match err.kind() {
        ErrorKind::ResponseError | ErrorKind::TypeError | ErrorKind::ExtensionError => {
            CacheError::StoreRejected(err.to_string())
        }
        _ => CacheError::StoreUnavailable(err.to_string()),
    }
}
