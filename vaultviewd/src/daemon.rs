//! Daemon: Main runtime orchestrator.
//!
//! The Daemon ties together:
//! - Connector Registry (mock or live, chosen at startup)
//! - Balance Fetcher (batch orchestration)
//! - API Server (HTTP endpoints)
//!
//! # Lifecycle
//!
//! 1. Load configuration
//! 2. Build the connector registry and fetcher
//! 3. Start API server
//! 4. Wait for SIGINT
//! 5. Graceful shutdown (in-flight requests complete)

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use vaultview_connectors::ConnectorRegistry;

use crate::api::{cors_layer, create_router, ApiState};
use crate::config::Config;
use crate::error::{DaemonError, DaemonResult};
use crate::fetcher::BalanceFetcher;

// =============================================================================
// Daemon
// =============================================================================

/// The main Vaultview daemon.
pub struct Daemon {
    /// Configuration
    config: Config,
    /// Balance fetcher shared with the API handlers
    fetcher: Arc<BalanceFetcher>,
}

impl Daemon {
    /// Create a daemon with the connectors selected by the configuration.
    pub fn new(config: Config) -> Self {
        let registry =
            ConnectorRegistry::from_mode(config.connectors.mode, &config.connectors.live);
        Self::with_registry(config, registry)
    }

    /// Create a daemon over an explicit registry.
    pub fn with_registry(config: Config, registry: ConnectorRegistry) -> Self {
        let fetcher = Arc::new(BalanceFetcher::new(
            Arc::new(registry),
            config.fetch.timeout,
            config.fetch.policy,
        ));

        Self { config, fetcher }
    }

    /// Active configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run the daemon.
    ///
    /// This method blocks until shutdown is requested (SIGINT).
    pub async fn run(self) -> DaemonResult<()> {
        info!(
            version = env!("CARGO_PKG_VERSION"),
            environment = %self.config.environment,
            connectors = %self.config.connectors.mode,
            "Starting Vaultview daemon"
        );

        let shutdown = CancellationToken::new();
        let (api_addr, server) = self.start_api_server(shutdown.clone()).await?;
        info!(%api_addr, "API server started");

        tokio::signal::ctrl_c()
            .await
            .map_err(|e| DaemonError::Server(format!("Failed to listen for shutdown: {}", e)))?;
        info!("Received shutdown signal");

        shutdown.cancel();
        server
            .await
            .map_err(|e| DaemonError::Server(format!("API server task failed: {}", e)))?;

        info!("Daemon shutdown complete");
        Ok(())
    }

    /// Bind the listener and spawn the HTTP server.
    ///
    /// Returns the bound address (useful with port 0) and the server task,
    /// which finishes once `shutdown` is cancelled and open connections drain.
    pub async fn start_api_server(
        &self,
        shutdown: CancellationToken,
    ) -> DaemonResult<(SocketAddr, JoinHandle<()>)> {
        let state = Arc::new(ApiState {
            fetcher: self.fetcher.clone(),
        });

        let cors = cors_layer(&self.config.api.cors_origins)?;
        let router = create_router(state, cors);
        let addr = format!("{}:{}", self.config.api.host, self.config.api.port);

        let listener = TcpListener::bind(&addr).await.map_err(|e| {
            DaemonError::Config(format!("Failed to bind to {}: {}", addr, e))
        })?;

        let local_addr = listener.local_addr().map_err(|e| {
            DaemonError::Config(format!("Failed to get local address: {}", e))
        })?;

        // Spawn the server task
        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router)
                .with_graceful_shutdown(async move { shutdown.cancelled().await })
                .await
            {
                error!(error = %e, "API server error");
            }
        });

        Ok((local_addr, handle))
    }
}

// =============================================================================
// Tests
// =============================================================================
