//! Connector registry.
//!
//! Maps an exchange identifier to the connector serving it. Built once at
//! startup and shared read-only afterwards.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use vaultview_domain::ExchangeSummary;

use crate::binance::{BinanceConnector, BINANCE_API_URL};
use crate::coinbase::{CoinbaseConnector, COINBASE_API_URL};
use crate::connector::Connector;
use crate::mock::MockConnector;
use crate::upbit::{UpbitConnector, UPBIT_API_URL};

// =============================================================================
// Connector Mode
// =============================================================================

/// Which connector implementations to register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectorMode {
    /// Static balances, no network
    Mock,
    /// Authenticated REST calls to the exchanges
    Live,
}

impl fmt::Display for ConnectorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectorMode::Mock => write!(f, "mock"),
            ConnectorMode::Live => write!(f, "live"),
        }
    }
}

/// Settings for the live connectors.
#[derive(Debug, Clone)]
pub struct LiveConfig {
    /// Binance API base URL
    pub binance_url: String,
    /// Coinbase API base URL
    pub coinbase_url: String,
    /// Upbit API base URL
    pub upbit_url: String,
    /// Timeout applied to each HTTP request
    pub request_timeout: Duration,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            binance_url: BINANCE_API_URL.to_string(),
            coinbase_url: COINBASE_API_URL.to_string(),
            upbit_url: UPBIT_API_URL.to_string(),
            request_timeout: Duration::from_secs(5),
        }
    }
}

// =============================================================================
// Registry
// =============================================================================

/// Fixed mapping from exchange id to connector.
#[derive(Clone, Default)]
pub struct ConnectorRegistry {
    connectors: HashMap<String, Arc<dyn Connector>>,
}

impl ConnectorRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the mock Binance, Coinbase, and Upbit connectors.
    pub fn mock() -> Self {
        Self::new()
            .with(MockConnector::binance())
            .with(MockConnector::coinbase())
            .with(MockConnector::upbit())
    }

    /// Registry with the authenticated Binance, Coinbase, and Upbit connectors.
    pub fn live(config: &LiveConfig) -> Self {
        Self::new()
            .with(BinanceConnector::new(&config.binance_url, config.request_timeout))
            .with(CoinbaseConnector::new(&config.coinbase_url, config.request_timeout))
            .with(UpbitConnector::new(&config.upbit_url, config.request_timeout))
    }

    /// Registry for the given mode.
    pub fn from_mode(mode: ConnectorMode, live: &LiveConfig) -> Self {
        match mode {
            ConnectorMode::Mock => Self::mock(),
            ConnectorMode::Live => Self::live(live),
        }
    }

    /// Add a connector, consuming and returning the registry.
    pub fn with(mut self, connector: impl Connector + 'static) -> Self {
        self.register(Arc::new(connector));
        self
    }

    /// Add a connector under its own id.
    ///
    /// Returns the connector previously registered under that id, if any.
    pub fn register(&mut self, connector: Arc<dyn Connector>) -> Option<Arc<dyn Connector>> {
        self.connectors.insert(connector.id().to_string(), connector)
    }

    /// Look up the connector for an exchange id.
    ///
    /// `None` means the exchange is unsupported; callers report it as a
    /// request validation error.
    pub fn resolve(&self, exchange_id: &str) -> Option<Arc<dyn Connector>> {
        self.connectors.get(exchange_id).cloned()
    }

    /// Check if an exchange id is registered.
    pub fn contains(&self, exchange_id: &str) -> bool {
        self.connectors.contains_key(exchange_id)
    }

    /// Supported exchanges, sorted by id.
    pub fn supported_exchanges(&self) -> Vec<ExchangeSummary> {
        let mut summaries: Vec<ExchangeSummary> =
            self.connectors.values().map(|c| c.summary()).collect();
        summaries.sort_by(|a, b| a.id.cmp(&b.id));
        summaries
    }

    /// Number of registered connectors.
    pub fn len(&self) -> usize {
        self.connectors.len()
    }

    /// True if no connectors are registered.
    pub fn is_empty(&self) -> bool {
        self.connectors.is_empty()
    }
}

impl fmt::Debug for ConnectorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<&str> = self.connectors.keys().map(String::as_str).collect();
        ids.sort_unstable();
        f.debug_struct("ConnectorRegistry")
            .field("exchanges", &ids)
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use vaultview_domain::{Balance, ExchangeCredential};

    #[test]
    fn test_mock_registry_has_three_exchanges() {
        let registry = ConnectorRegistry::mock();

        assert_eq!(registry.len(), 3);
        assert!(registry.contains("binance"));
        assert!(registry.contains("coinbase"));
        assert!(registry.contains("upbit"));
    }

    #[test]
    fn test_resolve_unknown_is_none() {
        let registry = ConnectorRegistry::mock();

        assert!(registry.resolve("kraken").is_none());
        // Lookup is exact: ids are not case-folded
        assert!(registry.resolve("Binance").is_none());
    }

    #[test]
    fn test_supported_exchanges_sorted() {
        let supported = ConnectorRegistry::mock().supported_exchanges();

        assert_eq!(
            supported,
            vec![
                ExchangeSummary::new("binance", "Binance"),
                ExchangeSummary::new("coinbase", "Coinbase"),
                ExchangeSummary::new("upbit", "Upbit"),
            ]
        );
    }

    #[test]
    fn test_live_registry_uses_same_ids() {
        let live = ConnectorRegistry::live(&LiveConfig::default());

        assert_eq!(
            live.supported_exchanges(),
            ConnectorRegistry::mock().supported_exchanges()
        );
    }

    #[test]
    fn test_from_mode() {
        let live = LiveConfig::default();

        assert_eq!(ConnectorRegistry::from_mode(ConnectorMode::Mock, &live).len(), 3);
        assert_eq!(ConnectorRegistry::from_mode(ConnectorMode::Live, &live).len(), 3);
        assert_eq!(ConnectorMode::Live.to_string(), "live");
    }

    #[tokio::test]
    async fn test_register_replaces_existing() {
        let mut registry = ConnectorRegistry::mock();

        let previous = registry.register(Arc::new(MockConnector::new(
            "binance",
            "Binance",
            vec![Balance::new("BNB", dec!(3))],
        )));
        assert!(previous.is_some());
        assert_eq!(registry.len(), 3);

        let balances = registry
            .resolve("binance")
            .unwrap()
            .get_balances(&ExchangeCredential::new("binance", "k", "s"))
            .await
            .unwrap();
        assert_eq!(balances, vec![Balance::new("BNB", dec!(3))]);
    }

    #[test]
    fn test_debug_lists_ids() {
        let debug = format!("{:?}", ConnectorRegistry::mock());

        assert!(debug.contains("binance"));
        assert!(debug.contains("upbit"));
    }
}
