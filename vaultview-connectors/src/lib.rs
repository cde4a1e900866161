//! Vaultview Exchange Connectors
//!
//! Adapters that fetch account balances from exchange APIs and normalize
//! them to domain `Balance` records.
//!
//! # Architecture
//!
//! ```text
//! ExchangeCredential → ConnectorRegistry::resolve(id) → Connector → Vec<Balance>
//! ```
//!
//! # Components
//!
//! - **Connector**: Trait implemented once per exchange
//! - **Registry**: Fixed id → connector map built at startup
//! - **Mock**: Static balances for development and tests
//! - **Binance / Coinbase / Upbit**: Authenticated REST implementations
//!
//! # Example
//!
//! ```rust,ignore
//! use vaultview_connectors::ConnectorRegistry;
//! use vaultview_domain::ExchangeCredential;
//!
//! let registry = ConnectorRegistry::mock();
//! let connector = registry.resolve("binance").expect("registered");
//! let balances = connector
//!     .get_balances(&ExchangeCredential::new("binance", "key", "secret"))
//!     .await?;
//! ```

#![warn(clippy::all)]

// Public modules
pub mod binance;
pub mod coinbase;
pub mod connector;
pub mod error;
pub mod mock;
pub mod registry;
pub mod upbit;

mod http;

// Re-exports
pub use binance::BinanceConnector;
pub use coinbase::CoinbaseConnector;
pub use connector::Connector;
pub use error::{ConnectorError, ConnectorResult};
pub use mock::MockConnector;
pub use registry::{ConnectorMode, ConnectorRegistry, LiveConfig};
pub use upbit::UpbitConnector;
