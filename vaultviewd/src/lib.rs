//! Vaultview Daemon Library
//!
//! Balance aggregation service for exchange accounts.
//!
//! # Architecture
//!
//! ```text
//! HTTP client → API Server → Balance Fetcher → Connector Registry → Connector → Exchange
//!                                  ↓
//!                           aggregate_balances
//! ```
//!
//! # Components
//!
//! - **Daemon**: Startup, API server, graceful shutdown
//! - **Balance Fetcher**: Resolves credentials, fans out to connectors, aggregates
//! - **API**: HTTP endpoints for the dashboard
//! - **Config**: Environment-based configuration
//!
//! # Example
//!
//! ```rust,ignore
//! use vaultviewd::{Config, Daemon};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = Config::from_env().expect("Failed to load config");
//!     let daemon = Daemon::new(config);
//!     daemon.run().await.expect("Daemon error");
//! }
//! ```

#![warn(clippy::all)]

pub mod api;
pub mod config;
pub mod daemon;
pub mod error;
pub mod fetcher;

// Re-exports for convenience
pub use api::{BalancesResponse, ErrorResponse, HealthResponse};
pub use config::{ApiConfig, Config, ConnectorsConfig, Environment, FetchConfig, LogFormat};
pub use daemon::Daemon;
pub use error::{DaemonError, DaemonResult};
pub use fetcher::{BalanceFetcher, FetchOutcome, FetchPolicy};
