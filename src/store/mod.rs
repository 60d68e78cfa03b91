//! Store Client Module
//!
//! The key-value store contract the memoizer is built on, with a Redis
//! adapter for production and an in-memory adapter for tests and demos.

mod entry;
mod memory;
mod redis_store;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::{CacheError, Result};

pub use entry::{current_timestamp_ms, StoreEntry};
pub use memory::MemoryStore;
pub use redis_store::RedisStore;

// == Store Client ==
/// Minimal key-value operations needed for cache-aside and counters.
///
/// Implementations must be safe to share across concurrent callers and
/// must not retry on their own.
#[async_trait]
pub trait StoreClient: Send + Sync {
    /// Returns the value at `key` if present and unexpired.
    async fn get(&self, key: &str) -> Result<Option<Bytes>>;

    /// Stores `value` at `key`, replacing any previous entry, expiring after
    /// `ttl_seconds`.
    async fn set_with_expiry(&self, key: &str, value: Bytes, ttl_seconds: u64) -> Result<()>;

    /// Atomically increments the integer at `key` (starting from 0) and
    /// returns the new value.
    async fn increment(&self, key: &str) -> Result<i64>;
}

/// Rejects a zero TTL before it reaches the store.
pub(crate) fn ensure_ttl(ttl_seconds: u64) -> Result<()> {
    if ttl_seconds == 0 {
        return Err(CacheError::InvalidConfiguration(
            "TTL must be a positive number of seconds".to_string(),
        ));
    }
    Ok(())
}
