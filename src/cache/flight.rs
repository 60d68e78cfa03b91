//! Single-Flight Module
//!
//! Coalesces concurrent computations of the same key into one execution.
//!
//! The first caller for a key becomes its owner and runs the computation;
//! callers arriving while it runs subscribe to the owner's broadcast and
//! receive a clone of the same outcome. Keys never share a lock beyond the
//! brief check-or-create and remove steps on the in-flight table.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use bytes::Bytes;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::error::{CacheError, Result};

type Outcome = Result<Bytes>;

// == Single Flight ==
/// Per-key in-flight table.
#[derive(Debug, Default)]
pub struct SingleFlight {
    /// key -> channel the owner publishes its outcome on
    in_flight: Mutex<HashMap<String, broadcast::Sender<Outcome>>>,
    /// Computations actually executed by owners
    executions: AtomicU64,
    /// Callers that joined an existing computation instead of running one
    coalesced: AtomicU64,
}

/// How a caller takes part in a flight.
enum Role {
    Owner(broadcast::Sender<Outcome>),
    Waiter(broadcast::Receiver<Outcome>),
}

impl SingleFlight {
    // == Constructor ==
    /// Creates an empty coordinator.
    pub fn new() -> Self {
        Self::default()
    }

    // == Run Exclusive ==
    /// Runs `f` for `key` unless a computation for `key` is already running,
    /// in which case its outcome is awaited instead.
    ///
    /// If the owner is dropped before finishing, waiters receive
    /// [`CacheError::Cancelled`] and the key is released for a fresh attempt.
    pub async fn run_exclusive<F, Fut>(&self, key: &str, f: F) -> Result<Bytes>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Bytes>>,
    {
        match self.join(key) {
            Role::Owner(sender) => {
                self.executions.fetch_add(1, Ordering::Relaxed);
                let guard = FlightGuard {
                    flight: self,
                    key,
                    sender,
                    finished: false,
                };

                let outcome = f().await;
                guard.finish(outcome.clone());
                outcome
            }
            Role::Waiter(mut receiver) => {
                self.coalesced.fetch_add(1, Ordering::Relaxed);
                debug!(key = %key, "Joined in-flight computation");

                receiver.recv().await.unwrap_or_else(|_| {
                    Err(CacheError::Cancelled(format!(
                        "owner of '{}' dropped without a result",
                        key
                    )))
                })
            }
        }
    }

    /// Atomically subscribes to an existing flight or registers a new one.
    fn join(&self, key: &str) -> Role {
        let mut table = self.table();

        if let Some(sender) = table.get(key) {
            return Role::Waiter(sender.subscribe());
        }

        // One message is ever sent per flight
        let (sender, _) = broadcast::channel(1);
        table.insert(key.to_string(), sender.clone());
        Role::Owner(sender)
    }

    fn remove(&self, key: &str) {
        self.table().remove(key);
    }

    fn table(&self) -> MutexGuard<'_, HashMap<String, broadcast::Sender<Outcome>>> {
        // The guard is never held across an await, so a poisoned lock only
        // means a panic elsewhere; the map itself is still consistent.
        self.in_flight.lock().unwrap_or_else(|e| e.into_inner())
    }

    // == Introspection ==
    /// Number of keys currently being computed.
    pub fn in_flight(&self) -> usize {
        self.table().len()
    }

    /// Returns true if a computation for `key` is running.
    pub fn is_in_flight(&self, key: &str) -> bool {
        self.table().contains_key(key)
    }

    /// Total computations executed by owners.
    pub fn executions(&self) -> u64 {
        self.executions.load(Ordering::Relaxed)
    }

    /// Total callers served by another caller's computation.
    pub fn coalesced(&self) -> u64 {
        self.coalesced.load(Ordering::Relaxed)
    }
}

// == Flight Guard ==
/// Owner-side handle that always releases the key, even on cancellation.
struct FlightGuard<'a> {
    flight: &'a SingleFlight,
    key: &'a str,
    sender: broadcast::Sender<Outcome>,
    finished: bool,
}

impl FlightGuard<'_> {
    /// Releases the key, then publishes the outcome.
    ///
    /// Waiters subscribe under the table lock, so everyone who joined before
    /// the removal is already subscribed when the outcome is sent.
    fn finish(mut self, outcome: Outcome) {
        self.finished = true;
        self.flight.remove(self.key);
        // No receivers is fine: nobody joined this flight
        let _ = self.sender.send(outcome);
    }
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }

        warn!(key = %self.key, "In-flight computation cancelled");
        self.flight.remove(self.key);
        let _ = self.sender.send(Err(CacheError::Cancelled(format!(
            "computation of '{}' was cancelled",
            self.key
        ))));
    }
}
