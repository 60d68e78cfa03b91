//! API Routes
//!
//! Configures the Axum router with all demo endpoints.

use axum::{routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{cached_handler, health_handler, pageview_handler, stats_handler, AppState};

/// Creates the main router with all endpoints configured.
///
/// # Middleware
/// - CORS: Allows any origin
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/pageview", get(pageview_handler))
        .route("/get-cached", get(cached_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::store::MemoryStore;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use std::sync::Arc;
    use tower::util::ServiceExt;

    fn create_test_app() -> Router {
        let config = Config {
            slow_query_delay_ms: 20,
            ..Config::default()
        };
        let state = AppState::new(Arc::new(MemoryStore::new()), &config).unwrap();
        create_router(state)
    }

    async fn status_of(uri: &str) -> StatusCode {
        create_test_app()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        assert_eq!(status_of("/health").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_stats_endpoint() {
        assert_eq!(status_of("/stats").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_pageview_endpoint() {
        assert_eq!(status_of("/pageview").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_get_cached_endpoint() {
        assert_eq!(status_of("/get-cached").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_route() {
        assert_eq!(status_of("/set").await, StatusCode::NOT_FOUND);
    }
}
