//! Gateway service - binds the HTTP server and owns its background tasks.

use crate::domain::config::StorefrontConfig;
use crate::domain::error::GatewayError;
use crate::middleware::rate_limit::cleanup_task;
use crate::middleware::RateLimitLayer;
use crate::router::{build_router, AppState};
use axum::Router;
use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;
use tracing::info;

/// Idle rate limit buckets older than this are dropped.
const BUCKET_MAX_AGE: Duration = Duration::from_secs(600);
const BUCKET_CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

/// Storefront HTTP gateway
pub struct StorefrontGateway {
    config: StorefrontConfig,
    state: AppState,
    rate_limit: RateLimitLayer,
}

impl StorefrontGateway {
    /// Create a new gateway over already wired subsystems
    pub fn new(config: StorefrontConfig, state: AppState) -> Result<Self, GatewayError> {
        config.validate()?;
        let rate_limit = RateLimitLayer::new(config.rate_limit.clone());
        Ok(Self {
            config,
            state,
            rate_limit,
        })
    }

    /// Router with the full middleware stack, for serving or in-process tests
    pub fn router(&self) -> Router {
        build_router(self.state.clone(), &self.config, &self.rate_limit)
    }

    /// Serve until `shutdown` resolves or the server fails.
    pub async fn serve<F>(self, shutdown: F) -> Result<(), GatewayError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.config.http_addr();
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| GatewayError::Bind(format!("{}: {}", addr, e)))?;

        let cleanup = tokio::spawn(cleanup_task(
            self.rate_limit.state(),
            BUCKET_CLEANUP_INTERVAL,
            BUCKET_MAX_AGE,
        ));

        info!(addr = %addr, "[sf-06] storefront gateway listening");
        let served = axum::serve(
            listener,
            self.router()
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown)
        .await;

        cleanup.abort();
        info!("[sf-06] storefront gateway stopped");
        served.map_err(|e| GatewayError::Serve(e.to_string()))
    }
}
