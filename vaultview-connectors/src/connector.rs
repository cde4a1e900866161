//! Connector port definition.
//!
//! A connector is the capability to fetch balances from one exchange.
//! Implementations:
//! - `MockConnector` - Static balances, ignores the credential
//! - `BinanceConnector` - Signed `GET /api/v3/account`
//! - `CoinbaseConnector` - JWT-authenticated Advanced Trade accounts
//! - `UpbitConnector` - JWT-authenticated `GET /v1/accounts`

use async_trait::async_trait;

use vaultview_domain::{Balance, ExchangeCredential, ExchangeSummary};

use crate::error::ConnectorResult;

/// Port for fetching account balances from an exchange.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Registry identifier (e.g., "binance").
    fn id(&self) -> &str;

    /// Human-readable label (e.g., "Binance").
    fn display_name(&self) -> &str;

    /// Fetch all balances visible to the credential.
    ///
    /// # Returns
    ///
    /// The account's balances. An empty list means the account holds
    /// nothing; transport and auth failures are errors.
    async fn get_balances(&self, credential: &ExchangeCredential) -> ConnectorResult<Vec<Balance>>;

    /// Identifier and label pair for exchange pickers.
    fn summary(&self) -> ExchangeSummary {
        ExchangeSummary::new(self.id(), self.display_name())
    }
}
