//! # Storefront Runtime
//!
//! Main entry point for the storefront server.
//!
//! ## Startup Sequence
//!
//! 1. Install logging (`SF_LOG`, `SF_LOG_FORMAT`)
//! 2. Load configuration (defaults, `SF_CONFIG` file, env overrides)
//! 3. Lock the data directory and open RocksDB
//! 4. Wire subsystems, seed the catalog if `SF_CATALOG_SEED` is set
//! 5. Start maintenance, serve HTTP until Ctrl+C

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use sf_06_api_gateway::StorefrontGateway;
use storefront_runtime::seed::ENV_CATALOG_SEED;
use storefront_runtime::{load_config, seed_catalog, Maintenance, StorefrontContainer};

const ENV_LOG: &str = "SF_LOG";
const ENV_LOG_FORMAT: &str = "SF_LOG_FORMAT";

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_env(ENV_LOG).unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true);

    let json = std::env::var(ENV_LOG_FORMAT).is_ok_and(|f| f.eq_ignore_ascii_case("json"));
    if json {
        builder
            .json()
            .try_init()
            .map_err(|e| anyhow::anyhow!(e))?;
    } else {
        builder.try_init().map_err(|e| anyhow::anyhow!(e))?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing()?;

    info!("===========================================");
    info!("  Storefront Runtime v{}", env!("CARGO_PKG_VERSION"));
    info!("===========================================");

    let config = load_config().context("Failed to load configuration")?;
    let container =
        StorefrontContainer::open(config.clone()).context("Failed to open storefront storage")?;

    if let Some(seed) = std::env::var_os(ENV_CATALOG_SEED) {
        let path = PathBuf::from(seed);
        seed_catalog(container.catalog.as_ref(), &path)
            .with_context(|| format!("Failed to seed catalog from {}", path.display()))?;
    }

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let maintenance = Arc::new(Maintenance::new(
        container.sessions.clone(),
        container.cart_store.clone(),
        container.clock.clone(),
        config.cart.abandoned_retention,
    ));
    let maintenance_task = tokio::spawn(maintenance.run(config.maintenance.purge_interval, shutdown_rx));

    info!("Data Dir: {:?}", config.storage.data_dir);
    info!(
        "Abandoned carts: {}",
        config
            .cart
            .abandoned_retention
            .map(|r| format!("purged after {:?}", r))
            .unwrap_or_else(|| "retained".to_string())
    );

    let gateway = StorefrontGateway::new(config, container.app_state())
        .context("Failed to build HTTP gateway")?;
    let served = gateway
        .serve(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Ctrl+C received, shutting down");
            }
        })
        .await;

    let _ = shutdown_tx.send(true);
    let _ = maintenance_task.await;
    drop(container);
    info!("Shutdown complete");

    served.context("HTTP gateway failed")
}
