//! Vaultview Daemon
//!
//! HTTP service that fetches and aggregates exchange balances.
//!
//! # Usage
//!
//! ```bash
//! # Start with mock connectors
//! cargo run -p vaultviewd
//!
//! # Start against the real exchanges
//! VAULTVIEW_CONNECTORS=live VAULTVIEW_API_PORT=8081 cargo run -p vaultviewd
//! ```
//!
//! # Environment Variables
//!
//! - `VAULTVIEW_ENV`: Environment (test, development, production)
//! - `VAULTVIEW_API_HOST`: API host (default: 0.0.0.0)
//! - `VAULTVIEW_API_PORT`: API port (default: 8080)
//! - `VAULTVIEW_CORS_ORIGINS`: Comma-separated allowed origins (default: *)
//! - `VAULTVIEW_CONNECTORS`: mock or live (default: mock)
//! - `VAULTVIEW_FETCH_TIMEOUT_MS`: Per-exchange fetch deadline (default: 10000)
//! - `VAULTVIEW_FETCH_POLICY`: fail_fast or best_effort (default: fail_fast)
//! - `VAULTVIEW_HTTP_TIMEOUT_MS`: Live connector request timeout (default: 5000)
//! - `VAULTVIEW_BINANCE_URL`, `VAULTVIEW_COINBASE_URL`, `VAULTVIEW_UPBIT_URL`: API base URLs
//! - `VAULTVIEW_LOG_FORMAT`: text or json (default: text)

use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use vaultviewd::{Config, Daemon, LogFormat};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    let filter = EnvFilter::from_default_env().add_directive("vaultviewd=info".parse()?);
    match config.log_format {
        LogFormat::Text => tracing_subscriber::registry()
            .with(fmt::layer())
            .with(filter)
            .init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(filter)
            .init(),
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = %config.environment,
        api_host = %config.api.host,
        api_port = config.api.port,
        connectors = %config.connectors.mode,
        "Vaultview Daemon"
    );

    // Create and run daemon
    let daemon = Daemon::new(config);
    daemon.run().await?;

    Ok(())
}
