//! Cache Statistics Module
//!
//! Counters the memoizer reports degraded store operations and hit rates to.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// == Cache Stats ==
/// Lock-free counters shared by every memoized function of a `Memoizer`.
#[derive(Debug, Default)]
pub struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
    store_read_errors: AtomicU64,
    store_write_errors: AtomicU64,
    computation_failures: AtomicU64,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Record Hit ==
    /// Increments the hit counter.
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    // == Record Miss ==
    /// Increments the miss counter.
    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    // == Record Read Error ==
    /// Counts a failed store read.
    pub fn record_read_error(&self) {
        self.store_read_errors.fetch_add(1, Ordering::Relaxed);
    }

    // == Record Write Error ==
    /// Counts a skipped write-back.
    pub fn record_write_error(&self) {
        self.store_write_errors.fetch_add(1, Ordering::Relaxed);
    }

    // == Record Computation Failure ==
    /// Counts a failed or timed-out computation.
    pub fn record_computation_failure(&self) {
        self.computation_failures.fetch_add(1, Ordering::Relaxed);
    }

    // == Snapshot ==
    /// Reads all counters, combined with the coordinator's flight counters.
    pub fn snapshot(&self, executions: u64, coalesced: u64, in_flight: usize) -> StatsSnapshot {
        StatsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            store_read_errors: self.store_read_errors.load(Ordering::Relaxed),
            store_write_errors: self.store_write_errors.load(Ordering::Relaxed),
            computation_failures: self.computation_failures.load(Ordering::Relaxed),
            executions,
            coalesced,
            in_flight,
        }
    }
}

// == Stats Snapshot ==
/// Point-in-time copy of the memoizer counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatsSnapshot {
    /// Calls answered from the store
    pub hits: u64,
    /// Calls that found nothing in the store (including degraded reads)
    pub misses: u64,
    /// Store reads that failed
    pub store_read_errors: u64,
    /// Write-backs that failed and were skipped
    pub store_write_errors: u64,
    /// Wrapped computations that failed or timed out
    pub computation_failures: u64,
    /// Computations actually executed
    pub executions: u64,
    /// Callers that shared another caller's computation
    pub coalesced: u64,
    /// Keys currently being computed
    pub in_flight: usize,
}

impl StatsSnapshot {
    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
