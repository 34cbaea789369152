//! Dataset Cache - HTTP server entry point
//!
//! Serves the flight delay datasets and their aggregations through the cache.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dataset_cache::api::create_router;
use dataset_cache::data::{CsvSource, DatasetCatalog};
use dataset_cache::store::{KvStore, MemoryStore, RedisStore};
use dataset_cache::{
    spawn_cleanup_task, AppState, CacheFacade, CacheSettings, Config, StoreBackend,
};

/// Main entry point for the dataset cache server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Open the configured store (Redis, or in-memory with a cleanup task)
/// 4. Connect the cache facade; an unreachable store ends the process
/// 5. Create Axum router with all endpoints
/// 6. Start HTTP server on configured port
/// 7. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dataset_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Dataset Cache Server");

    let config = Config::from_env();
    info!(
        "Configuration loaded: backend={:?}, ttl={}s, chunks={}, data_dir={}, port={}",
        config.store_backend,
        config.cache_ttl,
        config.default_chunks,
        config.data_dir.display(),
        config.server_port
    );

    let (store, cleanup_handle) = match open_store(&config).await {
        Ok(opened) => opened,
        Err(err) => {
            error!("Could not open store: {}", err);
            std::process::exit(1);
        }
    };

    let source = Arc::new(CsvSource::new(
        config.data_dir.clone(),
        DatasetCatalog::flight_delays(),
    ));
    let facade = match CacheFacade::connect(store, source, CacheSettings::from(&config)).await {
        Ok(facade) => facade,
        Err(err) => {
            error!("Store is unreachable: {}", err);
            std::process::exit(1);
        }
    };

    let app = create_router(AppState::new(facade));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cleanup_handle))
        .await
        .context("serving HTTP")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Opens the configured store. The in-memory store also gets its TTL sweep.
async fn open_store(
    config: &Config,
) -> dataset_cache::Result<(Arc<dyn KvStore>, Option<JoinHandle<()>>)> {
    match config.store_backend {
        StoreBackend::Redis => {
            let store = RedisStore::connect(&config.redis_url()).await?;
            Ok((Arc::new(store), None))
        }
        StoreBackend::Memory => {
            let store = Arc::new(MemoryStore::new());
            let handle = spawn_cleanup_task(store.clone(), config.cleanup_interval);
            info!("Background cleanup task started");
            let store: Arc<dyn KvStore> = store;
            Ok((store, Some(handle)))
        }
    }
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// On shutdown signal, aborts the cleanup task if one is running.
async fn shutdown_signal(cleanup_handle: Option<JoinHandle<()>>) {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", err);
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
                error!("Failed to install SIGTERM handler: {}", err);
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

    if let Some(handle) = cleanup_handle {
        handle.abort();
        warn!("Cleanup task aborted");
    }
}
