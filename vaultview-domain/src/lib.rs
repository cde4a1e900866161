//! Vaultview Domain Layer
//!
//! Pure domain logic with zero I/O dependencies.
//! Contains balance records, exchange credentials, and the cross-exchange
//! aggregation rule.

#![warn(missing_docs)]
#![warn(clippy::all)]

// Public modules
pub mod aggregate;
pub mod balance;
pub mod credentials;

// Re-export commonly used types
pub use aggregate::aggregate_balances;
pub use balance::{AggregatedBalance, Balance, BalancesByExchange};
pub use credentials::{DomainError, ExchangeCredential, ExchangeSummary};
