//! Cache Aside - single-flight memoization over a key-value store
//!
//! Wraps expensive async operations with read-through caching: results are
//! served from the store while fresh, and concurrent misses on the same key
//! share one computation whose result is written back with a TTL.

pub mod api;
pub mod backend;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod store;
pub mod tasks;

pub use api::AppState;
pub use cache::{cache_key, MemoizeConfig, Memoized, Memoizer, SingleFlight};
pub use config::Config;
pub use error::{CacheError, Result};
pub use store::{MemoryStore, RedisStore, StoreClient};
pub use tasks::spawn_cleanup_task;
