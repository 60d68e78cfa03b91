//! Memoizer Module
//!
//! Read-through cache-aside wrapper around expensive async operations.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use tracing::{debug, info, warn};

use crate::cache::{CacheStats, SingleFlight, StatsSnapshot};
use crate::error::{CacheError, Result};
use crate::store::StoreClient;

/// Outcome of the first store read of a call.
enum Lookup {
    Hit(Bytes),
    Miss,
    /// The read failed and was downgraded to a miss
    Degraded,
}

// == Memoize Config ==
/// Settings for one memoized function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoizeConfig {
    /// Store key the result is cached under
    pub key: String,
    /// Expiration of the cached result, in seconds
    pub ttl_seconds: u64,
    /// Treat transient store read failures as a miss instead of an error
    pub stale_on_store_error: bool,
    /// Upper bound on a single computation, None = unbounded
    pub compute_timeout: Option<Duration>,
}

impl MemoizeConfig {
    // == Constructor ==
    /// Creates settings with degraded reads enabled and no compute bound.
    pub fn new(key: impl Into<String>, ttl_seconds: u64) -> Self {
        Self {
            key: key.into(),
            ttl_seconds,
            stale_on_store_error: true,
            compute_timeout: None,
        }
    }

    // == Stale On Store Error ==
    /// Sets whether a failed store read falls through to the computation.
    pub fn stale_on_store_error(mut self, enabled: bool) -> Self {
        self.stale_on_store_error = enabled;
        self
    }

    // == Compute Timeout ==
    /// Bounds each computation to `limit`.
    pub fn compute_timeout(mut self, limit: Duration) -> Self {
        self.compute_timeout = Some(limit);
        self
    }

    // == Validate ==
    /// Checks the settings; run once when a function is wrapped.
    pub fn validate(&self) -> Result<()> {
        if self.key.is_empty() {
            return Err(CacheError::InvalidConfiguration(
                "cache key cannot be empty".to_string(),
            ));
        }
        if self.ttl_seconds == 0 {
            return Err(CacheError::InvalidConfiguration(format!(
                "TTL for '{}' must be a positive number of seconds",
                self.key
            )));
        }
        if self.compute_timeout == Some(Duration::ZERO) {
            return Err(CacheError::InvalidConfiguration(format!(
                "compute timeout for '{}' must be non-zero",
                self.key
            )));
        }
        Ok(())
    }
}

// == Memoizer ==
/// Factory for memoized functions sharing one store and one in-flight table.
///
/// Cloning is cheap; clones share the store, the coordinator and counters.
#[derive(Clone)]
pub struct Memoizer {
    store: Arc<dyn StoreClient>,
    flights: Arc<SingleFlight>,
    stats: Arc<CacheStats>,
}

impl Memoizer {
    // == Constructor ==
    /// Creates a memoizer with its own in-flight table and counters.
    pub fn new(store: Arc<dyn StoreClient>) -> Self {
        Self::with_flights(store, Arc::new(SingleFlight::new()))
    }

    /// Creates a memoizer that coordinates through an existing in-flight table.
    pub fn with_flights(store: Arc<dyn StoreClient>, flights: Arc<SingleFlight>) -> Self {
        Self {
            store,
            flights,
            stats: Arc::new(CacheStats::new()),
        }
    }

    // == Wrap ==
    /// Wraps `func` so its result is cached under `key` for `ttl_seconds`.
    ///
    /// Fails with [`CacheError::InvalidConfiguration`] for an empty key or a
    /// zero TTL.
    pub fn wrap<F>(&self, key: impl Into<String>, ttl_seconds: u64, func: F) -> Result<Memoized<F>> {
        self.wrap_with(MemoizeConfig::new(key, ttl_seconds), func)
    }

    /// Wraps `func` with full control over the settings.
    pub fn wrap_with<F>(&self, config: MemoizeConfig, func: F) -> Result<Memoized<F>> {
        config.validate()?;
        debug!(key = %config.key, ttl_secs = config.ttl_seconds, "Wrapped function");

        Ok(Memoized {
            config,
            memoizer: self.clone(),
            func,
        })
    }

    // == Accessors ==
    /// The store results are cached in.
    pub fn store(&self) -> &Arc<dyn StoreClient> {
        &self.store
    }

    /// The in-flight table shared by every wrapped function.
    pub fn flights(&self) -> &SingleFlight {
        &self.flights
    }

    // == Stats ==
    /// Current hit/miss/degradation counters.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot(
            self.flights.executions(),
            self.flights.coalesced(),
            self.flights.in_flight(),
        )
    }
}

// == Memoized ==
/// A function whose results are served from the store while fresh.
///
/// The key alone identifies the cached result: arguments that change the
/// result must be folded into the key (see [`crate::cache::cache_key`]).
#[derive(Clone)]
pub struct Memoized<F> {
    config: MemoizeConfig,
    memoizer: Memoizer,
    func: F,
}

impl<F> Memoized<F> {
    // == Accessors ==
    /// The store key results are cached under.
    pub fn key(&self) -> &str {
        &self.config.key
    }

    /// The validated settings this function was wrapped with.
    pub fn config(&self) -> &MemoizeConfig {
        &self.config
    }

    // == Call ==
    /// Returns the cached result for this key, computing and storing it on
    /// a miss. Concurrent misses share a single computation.
    pub async fn call<A, Fut>(&self, args: A) -> Result<Bytes>
    where
        F: Fn(A) -> Fut,
        Fut: Future<Output = anyhow::Result<Bytes>>,
    {
        let recheck = match self.read_cached().await? {
            Lookup::Hit(value) => return Ok(value),
            Lookup::Miss => true,
            // The store just failed; reading it again only doubles the wait
            Lookup::Degraded => false,
        };

        self.memoizer
            .flights
            .run_exclusive(self.key(), || self.compute_and_store(args, recheck))
            .await
    }

    /// Reads the store, downgrading transient failures to a miss if allowed.
    async fn read_cached(&self) -> Result<Lookup> {
        let key = self.key();
        let stats = &self.memoizer.stats;

        match self.memoizer.store.get(key).await {
            Ok(Some(value)) => {
                stats.record_hit();
                debug!(key = %key, "Cache hit");
                Ok(Lookup::Hit(value))
            }
            Ok(None) => {
                stats.record_miss();
                debug!(key = %key, "Cache miss");
                Ok(Lookup::Miss)
            }
            Err(err) if err.is_transient() && self.config.stale_on_store_error => {
                stats.record_read_error();
                stats.record_miss();
                warn!(key = %key, error = %err, "Store read failed, treating as miss");
                Ok(Lookup::Degraded)
            }
            Err(err) => {
                stats.record_read_error();
                warn!(key = %key, error = %err, "Store read failed");
                Err(err)
            }
        }
    }

    /// Owner side of a flight: compute, then write back before releasing
    /// the key so no caller sees the gap between the two.
    ///
    /// With `recheck` set, the store is read once more first: a flight that
    /// finished just before this one started may have filled the key.
    async fn compute_and_store<A, Fut>(&self, args: A, recheck: bool) -> Result<Bytes>
    where
        F: Fn(A) -> Fut,
        Fut: Future<Output = anyhow::Result<Bytes>>,
    {
        let key = self.key();

        if recheck {
            match self.memoizer.store.get(key).await {
                Ok(Some(value)) => {
                    debug!(key = %key, "Filled by a previous computation");
                    return Ok(value);
                }
                Ok(None) => {}
                Err(err) => {
                    self.memoizer.stats.record_read_error();
                    warn!(key = %key, error = %err, "Store re-check failed, computing anyway");
                }
            }
        }

        let started = Instant::now();
        let value = match self.compute(args).await {
            Ok(value) => value,
            Err(err) => {
                self.memoizer.stats.record_computation_failure();
                warn!(key = %key, error = %err, "Computation failed, nothing cached");
                return Err(err);
            }
        };
        info!(
            key = %key,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Computed value"
        );

        self.write_back(value.clone()).await;
        Ok(value)
    }

    async fn compute<A, Fut>(&self, args: A) -> Result<Bytes>
    where
        F: Fn(A) -> Fut,
        Fut: Future<Output = anyhow::Result<Bytes>>,
    {
        let pending = (self.func)(args);

        let outcome = match self.config.compute_timeout {
            Some(limit) => tokio::time::timeout(limit, pending)
                .await
                .map_err(|_| CacheError::ComputationTimeout(limit.as_millis() as u64))?,
            None => pending.await,
        };

        outcome.map_err(|err| CacheError::ComputationFailed(format!("{:#}", err)))
    }

    /// Best-effort write; a failure only costs a future recomputation.
    async fn write_back(&self, value: Bytes) {
        let key = self.key();

        if let Err(err) = self
            .memoizer
            .store
            .set_with_expiry(key, value, self.config.ttl_seconds)
            .await
        {
            self.memoizer.stats.record_write_error();
            warn!(key = %key, error = %err, "Store write failed, result not cached");
        }
    }
}
