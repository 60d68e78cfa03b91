//! Cache Module
//!
//! Single-flight cache-aside memoization on top of a [`StoreClient`].
//!
//! [`StoreClient`]: crate::store::StoreClient

mod flight;
mod key;
mod memoizer;
mod stats;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use flight::SingleFlight;
pub use key::cache_key;
pub use memoizer::{MemoizeConfig, Memoized, Memoizer};
pub use stats::{CacheStats, StatsSnapshot};
