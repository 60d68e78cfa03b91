//! Store Entry Module
//!
//! A single value held by the in-memory store, with its expiration.

use std::time::{SystemTime, UNIX_EPOCH};

use bytes::Bytes;

// == Store Entry ==
/// A stored value and its expiration metadata.
#[derive(Debug, Clone)]
pub struct StoreEntry {
    /// The stored bytes
    pub value: Bytes,
    /// Expiration timestamp (Unix milliseconds), None = no expiration
    pub expires_at: Option<u64>,
}

impl StoreEntry {
    // == Constructors ==
    /// Creates an entry expiring `ttl_seconds` from now.
    pub fn with_ttl(value: Bytes, ttl_seconds: u64) -> Self {
        let ttl_ms = ttl_seconds.saturating_mul(1000);
        Self {
            value,
            expires_at: Some(current_timestamp_ms().saturating_add(ttl_ms)),
        }
    }

    /// Creates an entry that never expires (counters created by INCR).
    pub fn persistent(value: Bytes) -> Self {
        Self {
            value,
            expires_at: None,
        }
    }

    // == Is Expired ==
    /// An entry is expired once the current time reaches its expiration.
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires) => current_timestamp_ms() >= expires,
            None => false,
        }
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
