//! Cache Aside demo server
//!
//! Serves a page view counter and a cached expensive call over HTTP.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cache_aside::api::create_router;
use cache_aside::config::StoreBackend;
use cache_aside::{spawn_cleanup_task, AppState, Config, MemoryStore, RedisStore, StoreClient};

/// Main entry point for the demo server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Connect the store (Redis, or in-memory with its cleanup task)
/// 4. Wrap the expensive call and build the router
/// 5. Serve until SIGINT/SIGTERM, then release the store
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cache_aside=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting cache-aside demo server");

    let config = Config::from_env();
    info!(
        "Configuration loaded: backend={:?}, cache_ttl={}s, slow_query_delay={}ms, port={}",
        config.store_backend, config.cache_ttl, config.slow_query_delay_ms, config.server_port
    );

    let (store, cleanup_handle) = connect_store(&config).await?;

    let state = AppState::new(store.clone(), &config).context("invalid cache configuration")?;
    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    // The cleanup task holds its own reference until it has actually stopped
    if let Some(handle) = cleanup_handle {
        handle.abort();
        let _ = handle.await;
        info!("Cleanup task stopped");
    }

    // Router, handlers and cleanup task are gone; this is the last handle
    drop(store);
    info!("Store connection released, shutdown complete");

    Ok(())
}

/// Builds the configured store once for the whole process.
async fn connect_store(
    config: &Config,
) -> anyhow::Result<(Arc<dyn StoreClient>, Option<JoinHandle<()>>)> {
    match config.store_backend {
        StoreBackend::Redis => {
            let store = RedisStore::connect(&config.redis_url, config.store_timeout())
                .await
                .with_context(|| format!("failed to connect to {}", config.redis_url))?;
            let store: Arc<dyn StoreClient> = Arc::new(store);
            Ok((store, None))
        }
        StoreBackend::Memory => {
            let memory = Arc::new(MemoryStore::new());
            let handle = spawn_cleanup_task(memory.clone(), config.cleanup_interval);
            info!("Using in-memory store");
            let store: Arc<dyn StoreClient> = memory;
            Ok((store, Some(handle)))
        }
    }
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
