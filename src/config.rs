//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Which `StoreClient` implementation the server runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Redis,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "redis" => Ok(StoreBackend::Redis),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(format!("unknown store backend '{}'", other)),
        }
    }
}

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Store implementation to use
    pub store_backend: StoreBackend,
    /// Redis connection URL
    pub redis_url: String,
    /// Deadline for each store operation in milliseconds
    pub store_timeout_ms: u64,
    /// TTL in seconds for the cached expensive call
    pub cache_ttl: u64,
    /// Simulated latency of the expensive call in milliseconds
    pub slow_query_delay_ms: u64,
    /// Serve through computation when the store cannot be read
    pub stale_on_store_error: bool,
    /// Optional bound on the expensive call in milliseconds
    pub compute_timeout_ms: Option<u64>,
    /// Memory-store cleanup interval in seconds
    pub cleanup_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `PORT` - HTTP server port (default: 3000)
    /// - `STORE_BACKEND` - `redis` or `memory` (default: redis)
    /// - `REDIS_URL` - Redis address (default: redis://127.0.0.1:6379)
    /// - `STORE_TIMEOUT_MS` - Per-operation store deadline (default: 1000)
    /// - `CACHE_TTL` - TTL of the cached expensive call (default: 10)
    /// - `SLOW_QUERY_DELAY_MS` - Simulated backend latency (default: 5000)
    /// - `STALE_ON_STORE_ERROR` - Treat store read failures as misses (default: true)
    /// - `COMPUTE_TIMEOUT_MS` - Bound on the expensive call (default: unset)
    /// - `CLEANUP_INTERVAL` - Memory-store sweep frequency in seconds (default: 1)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            server_port: env_or("PORT", defaults.server_port),
            store_backend: env_or("STORE_BACKEND", defaults.store_backend),
            redis_url: env::var("REDIS_URL").unwrap_or(defaults.redis_url),
            store_timeout_ms: env_or("STORE_TIMEOUT_MS", defaults.store_timeout_ms),
            cache_ttl: env_or("CACHE_TTL", defaults.cache_ttl),
            slow_query_delay_ms: env_or("SLOW_QUERY_DELAY_MS", defaults.slow_query_delay_ms),
            stale_on_store_error: env_or("STALE_ON_STORE_ERROR", defaults.stale_on_store_error),
            compute_timeout_ms: env::var("COMPUTE_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok()),
            cleanup_interval: env_or("CLEANUP_INTERVAL", defaults.cleanup_interval),
        }
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    pub fn slow_query_delay(&self) -> Duration {
        Duration::from_millis(self.slow_query_delay_ms)
    }

    pub fn compute_timeout(&self) -> Option<Duration> {
        self.compute_timeout_ms.map(Duration::from_millis)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            store_backend: StoreBackend::Redis,
            redis_url: "redis://127.0.0.1:6379".to_string(),
            store_timeout_ms: 1000,
            cache_ttl: 10,
            slow_query_delay_ms: 5000,
            stale_on_store_error: true,
            compute_timeout_ms: None,
            cleanup_interval: 1,
        }
    }
}

/// Parses `name` from the environment, keeping `default` if unset or invalid.
fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.store_backend, StoreBackend::Redis);
        assert_eq!(config.cache_ttl, 10);
        assert_eq!(config.slow_query_delay(), Duration::from_secs(5));
        assert_eq!(config.store_timeout(), Duration::from_secs(1));
        assert!(config.stale_on_store_error);
        assert!(config.compute_timeout().is_none());
    }

    #[test]
    fn test_store_backend_parse() {
        assert_eq!("redis".parse::<StoreBackend>(), Ok(StoreBackend::Redis));
        assert_eq!(" Memory ".parse::<StoreBackend>(), Ok(StoreBackend::Memory));
        assert!("postgres".parse::<StoreBackend>().is_err());
    }

    #[test]
    fn test_env_or_falls_back_on_garbage() {
        env::set_var("CACHE_ASIDE_TEST_PORT", "not-a-port");
        assert_eq!(env_or("CACHE_ASIDE_TEST_PORT", 3000u16), 3000);

        env::set_var("CACHE_ASIDE_TEST_PORT", "8080");
        assert_eq!(env_or("CACHE_ASIDE_TEST_PORT", 3000u16), 8080);

        env::remove_var("CACHE_ASIDE_TEST_PORT");
        assert_eq!(env_or("CACHE_ASIDE_TEST_PORT", 3000u16), 3000);
    }
}
