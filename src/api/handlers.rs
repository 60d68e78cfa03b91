//! API Handlers
//!
//! HTTP request handlers for each demo endpoint.

use std::sync::Arc;

use axum::{extract::State, Json};
use bytes::Bytes;
use futures_util::future::{BoxFuture, FutureExt};

use crate::backend::slow_query;
use crate::cache::{MemoizeConfig, Memoized, Memoizer};
use crate::config::Config;
use crate::error::Result;
use crate::models::{CachedResponse, HealthResponse, PageviewResponse, StatsResponse};
use crate::store::StoreClient;

/// Store key of the page view counter.
pub const PAGEVIEWS_KEY: &str = "pageviews";

/// Store key the expensive call is cached under.
pub const EXPENSIVE_CALL_KEY: &str = "expensive_call";

/// Type-erased expensive computation held in the application state.
pub type ComputeFn = Box<dyn Fn(()) -> BoxFuture<'static, anyhow::Result<Bytes>> + Send + Sync>;

/// Application state shared across all handlers.
///
/// The store is created once at startup and shared by the counter and the
/// memoizer.
#[derive(Clone)]
pub struct AppState {
    /// Shared store client
    pub store: Arc<dyn StoreClient>,
    /// Memoizer owning the in-flight table and counters
    pub memoizer: Memoizer,
    /// The memoized expensive call behind GET /get-cached
    pub expensive_call: Arc<Memoized<ComputeFn>>,
}

impl AppState {
    /// Builds the state around `store`, wrapping the slow query per `config`.
    ///
    /// Fails if the cache settings are invalid (e.g. a zero TTL).
    pub fn new(store: Arc<dyn StoreClient>, config: &Config) -> Result<Self> {
        let memoizer = Memoizer::new(store.clone());

        let delay = config.slow_query_delay();
        let compute: ComputeFn = Box::new(move |_: ()| slow_query(delay).boxed());

        let mut settings = MemoizeConfig::new(EXPENSIVE_CALL_KEY, config.cache_ttl)
            .stale_on_store_error(config.stale_on_store_error);
        if let Some(limit) = config.compute_timeout() {
            settings = settings.compute_timeout(limit);
        }
        let expensive_call = memoizer.wrap_with(settings, compute)?;

        Ok(Self {
            store,
            memoizer,
            expensive_call: Arc::new(expensive_call),
        })
    }
}

/// Handler for GET /pageview
///
/// Atomically increments the page view counter.
pub async fn pageview_handler(State(state): State<AppState>) -> Result<Json<PageviewResponse>> {
    let views = state.store.increment(PAGEVIEWS_KEY).await?;

    Ok(Json(PageviewResponse::new(views)))
}

/// Handler for GET /get-cached
///
/// Serves the expensive call from the store, computing it at most once per
/// expiry no matter how many requests arrive together.
pub async fn cached_handler(State(state): State<AppState>) -> Result<Json<CachedResponse>> {
    let data = state.expensive_call.call(()).await?;

    Ok(Json(CachedResponse::new(String::from_utf8_lossy(&data))))
}

/// Handler for GET /stats
///
/// Returns current memoizer statistics.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::new(state.memoizer.stats()))
}

/// Handler for GET /health
///
/// Returns health status of the server.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
