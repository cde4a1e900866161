//! Mock connectors for development and testing.
//!
//! These return a fixed balance list without making any API calls.
//! The credential is ignored.

use async_trait::async_trait;
use rust_decimal_macros::dec;

use vaultview_domain::{Balance, ExchangeCredential};

use crate::connector::Connector;
use crate::error::ConnectorResult;

/// Connector returning a static balance list.
#[derive(Debug, Clone)]
pub struct MockConnector {
    id: String,
    display_name: String,
    balances: Vec<Balance>,
}

impl MockConnector {
    /// Create a mock connector with the given balances.
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        balances: Vec<Balance>,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            balances,
        }
    }

    /// Binance with BTC and USDT.
    pub fn binance() -> Self {
        Self::new(
            "binance",
            "Binance",
            vec![
                Balance::new("BTC", dec!(0.1234)),
                Balance::new("USDT", dec!(2500)),
            ],
        )
    }

    /// Coinbase with ETH and USDC.
    pub fn coinbase() -> Self {
        Self::new(
            "coinbase",
            "Coinbase",
            vec![
                Balance::new("ETH", dec!(1.5)),
                Balance::new("USDC", dec!(1200)),
            ],
        )
    }

    /// Upbit with BTC and KRW.
    pub fn upbit() -> Self {
        Self::new(
            "upbit",
            "Upbit",
            vec![
                Balance::new("BTC", dec!(0.02)),
                Balance::new("KRW", dec!(1500000)),
            ],
        )
    }
}

#[async_trait]
impl Connector for MockConnector {
    fn id(&self) -> &str {
        &self.id
    }

    fn display_name(&self) -> &str {
        &self.display_name
    }

    async fn get_balances(&self, _credential: &ExchangeCredential) -> ConnectorResult<Vec<Balance>> {
        Ok(self.balances.clone())
    }
}

// =============================================================================
// Tests
// =============================================================================
