//! In-Memory Store Module
//!
//! HashMap-backed store with TTL expiration, used for tests, demos and
//! running the server without a Redis instance.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::RwLock;

use super::{ensure_ttl, StoreClient, StoreEntry};
use crate::error::{CacheError, Result};

// == Memory Store ==
/// Process-local store honoring expirations, with switchable faults.
#[derive(Debug, Default)]
pub struct MemoryStore {
    /// Key-value storage
    entries: RwLock<HashMap<String, StoreEntry>>,
    /// When set, reads fail with `StoreUnavailable`
    fail_reads: AtomicBool,
    /// When set, writes (SETEX and INCR) fail with `StoreUnavailable`
    fail_writes: AtomicBool,
}

impl MemoryStore {
    // == Constructor ==
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    // == Fault Injection ==
    /// Makes subsequent reads fail as if the store were unreachable.
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Makes subsequent writes fail as if the store were unreachable.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_reads(&self) -> Result<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(CacheError::StoreUnavailable(
                "memory store: reads disabled".to_string(),
            ));
        }
        Ok(())
    }

    fn check_writes(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(CacheError::StoreUnavailable(
                "memory store: writes disabled".to_string(),
            ));
        }
        Ok(())
    }

    // == Cleanup Expired ==
    /// Removes all expired entries, returning how many were dropped.
    pub async fn cleanup_expired(&self) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired());
        before - entries.len()
    }

    // == Length ==
    /// Number of entries currently held, including not-yet-swept expired ones.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    // == Is Empty ==
    /// Returns true if the store holds no entries.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl StoreClient for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Bytes>> {
        self.check_reads()?;

        // Write lock: expired entries are removed on access
        let mut entries = self.entries.write().await;
        match entries.get(key) {
            Some(entry) if entry.is_expired() => {
                entries.remove(key);
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.value.clone())),
            None => Ok(None),
        }
    }

    async fn set_with_expiry(&self, key: &str, value: Bytes, ttl_seconds: u64) -> Result<()> {
        ensure_ttl(ttl_seconds)?;
        self.check_writes()?;

        let mut entries = self.entries.write().await;
        entries.insert(key.to_string(), StoreEntry::with_ttl(value, ttl_seconds));
        Ok(())
    }

    async fn increment(&self, key: &str) -> Result<i64> {
        self.check_writes()?;

        let mut entries = self.entries.write().await;
        let (current, expires_at) = match entries.get(key) {
            Some(entry) if !entry.is_expired() => {
                let current = std::str::from_utf8(&entry.value)
                    .ok()
                    .and_then(|s| s.parse::<i64>().ok())
                    .ok_or_else(|| {
                        CacheError::StoreRejected(format!("value at '{}' is not an integer", key))
                    })?;
                (current, entry.expires_at)
            }
            _ => (0, None),
        };

        let next = current.checked_add(1).ok_or_else(|| {
            CacheError::StoreRejected(format!("increment of '{}' would overflow", key))
        })?;

        let mut entry = StoreEntry::persistent(Bytes::from(next.to_string()));
        entry.expires_at = expires_at;
        entries.insert(key.to_string(), entry);

        Ok(next)
    }
}
