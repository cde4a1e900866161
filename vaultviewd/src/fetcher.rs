//! Balance Fetcher: batch orchestration for one balance request.
//!
//! # Flow
//!
//! 1. Resolve every credential's exchange (first unknown id aborts, no calls made)
//! 2. Call all connectors concurrently, each under the fetch timeout
//! 3. Collect per-exchange lists (later duplicates of an exchange win)
//! 4. Aggregate across exchanges
//!
//! Under `FailFast` the first connector error aborts the batch. Under
//! `BestEffort` failed exchanges are reported next to the successful subset.

use futures_util::future::{join_all, try_join_all};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use vaultview_connectors::{Connector, ConnectorRegistry};
use vaultview_domain::{
    aggregate_balances, AggregatedBalance, Balance, BalancesByExchange, ExchangeCredential,
};

use crate::error::{DaemonError, DaemonResult};

// =============================================================================
// Types
// =============================================================================

/// Behaviour when an exchange fails during a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchPolicy {
    /// Abort the whole batch on the first failure
    FailFast,
    /// Aggregate what succeeded and report the failures
    BestEffort,
}

/// Result of a balance batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchOutcome {
    /// Balances per exchange id
    pub balances_by_exchange: BalancesByExchange,
    /// Cross-exchange totals, sorted by asset
    pub aggregated: Vec<AggregatedBalance>,
    /// Failure message per exchange id (only populated under `BestEffort`)
    pub failures: BTreeMap<String, String>,
}

// =============================================================================
// Balance Fetcher
// =============================================================================

/// Fetches and aggregates balances for a list of credentials.
pub struct BalanceFetcher {
    registry: Arc<ConnectorRegistry>,
    timeout: Duration,
    policy: FetchPolicy,
}

impl BalanceFetcher {
    /// Create a fetcher over a registry.
    pub fn new(registry: Arc<ConnectorRegistry>, timeout: Duration, policy: FetchPolicy) -> Self {
        Self {
            registry,
            timeout,
            policy,
        }
    }

    /// The registry connectors are resolved from.
    pub fn registry(&self) -> &ConnectorRegistry {
        &self.registry
    }

    /// Fetch balances for every credential and aggregate them.
    ///
    /// # Errors
    ///
    /// - `UnsupportedExchange` for the first credential whose exchange is not
    ///   registered. No connector is called in that case.
    /// - `Connector` / `FetchTimeout` for the first failing exchange under
    ///   `FailFast`.
    pub async fn fetch(&self, accounts: &[ExchangeCredential]) -> DaemonResult<FetchOutcome> {
        let resolved = self.resolve_all(accounts)?;

        if resolved.is_empty() {
            return Ok(FetchOutcome::default());
        }

        info!(
            accounts = resolved.len(),
            policy = ?self.policy,
            "Fetching balances"
        );

        let calls = resolved
            .iter()
            .map(|(credential, connector)| self.fetch_one(credential, connector.as_ref()));

        let mut outcome = FetchOutcome::default();

        match self.policy {
            FetchPolicy::FailFast => {
                let results = try_join_all(calls).await?;
                for ((credential, _), balances) in resolved.iter().zip(results) {
                    outcome
                        .balances_by_exchange
                        .insert(credential.exchange.clone(), balances);
                }
            }
            FetchPolicy::BestEffort => {
                let results = join_all(calls).await;
                for ((credential, _), result) in resolved.iter().zip(results) {
                    let exchange = credential.exchange.clone();
                    match result {
                        Ok(balances) => {
                            outcome.failures.remove(&exchange);
                            outcome.balances_by_exchange.insert(exchange, balances);
                        }
                        Err(e) => {
                            warn!(exchange = %exchange, error = %e, "Exchange failed, continuing");
                            outcome.balances_by_exchange.remove(&exchange);
                            outcome.failures.insert(exchange, e.to_string());
                        }
                    }
                }
            }
        }

        outcome.aggregated = aggregate_balances(outcome.balances_by_exchange.values());

        info!(
            exchanges = outcome.balances_by_exchange.len(),
            assets = outcome.aggregated.len(),
            failures = outcome.failures.len(),
            "Balances aggregated"
        );

        Ok(outcome)
    }

    /// Resolve every credential up front so that an unknown exchange stops
    /// the request before any exchange is contacted.
    fn resolve_all<'a>(
        &self,
        accounts: &'a [ExchangeCredential],
    ) -> DaemonResult<Vec<(&'a ExchangeCredential, Arc<dyn Connector>)>> {
        accounts
            .iter()
            .map(|credential| {
                self.registry
                    .resolve(&credential.exchange)
                    .map(|connector| (credential, connector))
                    .ok_or_else(|| DaemonError::UnsupportedExchange(credential.exchange.clone()))
            })
            .collect()
    }

    async fn fetch_one(
        &self,
        credential: &ExchangeCredential,
        connector: &dyn Connector,
    ) -> DaemonResult<Vec<Balance>> {
        debug!(exchange = connector.id(), "Requesting balances");

        match timeout(self.timeout, connector.get_balances(credential)).await {
            Ok(Ok(balances)) => {
                debug!(
                    exchange = connector.id(),
                    count = balances.len(),
                    "Received balances"
                );
                Ok(balances)
            }
            Ok(Err(source)) => {
                if source.is_auth_failure() {
                    warn!(exchange = connector.id(), error = %source, "Exchange rejected credential");
                } else {
                    warn!(exchange = connector.id(), error = %source, "Exchange request failed");
                }
                Err(DaemonError::Connector {
                    exchange: connector.id().to_string(),
                    source,
                })
            }
            Err(_) => Err(DaemonError::FetchTimeout {
                exchange: connector.id().to_string(),
                timeout_ms: self.timeout.as_millis(),
            }),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
