//! Adcast Service - HTTP API for campaign generation, export, and credits
//!
//! This is the main entry point for the adcast service.

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use adcast_service::{create_router, AppState, ServiceConfig};
use adcast_store::Store;

/// How often expired campaigns are swept from the read cache.
const CACHE_SWEEP_INTERVAL: Duration = Duration::from_secs(300);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,adcast=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Adcast Service");

    // Load configuration from environment
    let config = ServiceConfig::from_env();

    tracing::info!(
        listen_addr = %config.listen_addr,
        data_dir = %config.data_dir,
        reasoning_configured = %config.reasoning.api_key.is_some(),
        allow_real_ads = %config.allow_real_ads,
        export_timeout_seconds = config.export_timeout_seconds,
        "Service configuration loaded"
    );

    let store = open_store(&config)?;

    // Build app state
    let state = AppState::new(store, config.clone());

    // Sweep expired campaigns from the cache
    let workflow = Arc::clone(&state.workflow);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(CACHE_SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            let evicted = workflow.cache().evict_expired();
            if evicted > 0 {
                tracing::debug!(evicted, "Evicted expired campaigns from cache");
            }
        }
    });

    // Create the router
    let app = create_router(state);
    tracing::info!("Router configured with all API endpoints");

    // Start HTTP server
    tracing::info!(listen_addr = %config.listen_addr, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(feature = "rocksdb-backend")]
fn open_store(config: &ServiceConfig) -> Result<Arc<dyn Store>, Box<dyn std::error::Error>> {
    tracing::info!(path = %config.data_dir, "Opening RocksDB store");
    Ok(Arc::new(adcast_store::RocksStore::open(&config.data_dir)?))
}

#[cfg(not(feature = "rocksdb-backend"))]
fn open_store(_config: &ServiceConfig) -> Result<Arc<dyn Store>, Box<dyn std::error::Error>> {
    tracing::warn!("Built without RocksDB - using in-memory store, data will not persist");
    Ok(Arc::new(adcast_store::MemoryStore::new()))
}
