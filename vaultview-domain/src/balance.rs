//! Balance records as reported by exchanges and as aggregated across them.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Per-exchange balance lists keyed by exchange identifier.
pub type BalancesByExchange = BTreeMap<String, Vec<Balance>>;

// =============================================================================
// Balance
// =============================================================================

/// A holding of one asset on one exchange.
///
/// Quantities serialize as JSON numbers. `locked` is omitted from the wire
/// when the exchange did not report it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    /// Ticker symbol as reported by the exchange (case is not normalized)
    pub asset: String,
    /// Available quantity
    #[serde(with = "rust_decimal::serde::float")]
    pub free: Decimal,
    /// Quantity held in open orders or otherwise encumbered
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub locked: Option<Decimal>,
}

impl Balance {
    /// Create a balance with no locked amount.
    pub fn new(asset: impl Into<String>, free: Decimal) -> Self {
        Self {
            asset: asset.into(),
            free,
            locked: None,
        }
    }

    /// Create a balance with a locked amount.
    pub fn with_locked(asset: impl Into<String>, free: Decimal, locked: Decimal) -> Self {
        Self {
            asset: asset.into(),
            free,
            locked: Some(locked),
        }
    }

    /// Locked amount, treating an absent value as zero.
    pub fn locked_or_zero(&self) -> Decimal {
        self.locked.unwrap_or(Decimal::ZERO)
    }

    /// Free plus locked.
    pub fn total(&self) -> Decimal {
        self.free + self.locked_or_zero()
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.locked {
            Some(locked) => write!(f, "{} {} (+{} locked)", self.free, self.asset, locked),
            None => write!(f, "{} {}", self.free, self.asset),
        }
    }
}

// =============================================================================
// AggregatedBalance
// =============================================================================

/// Sum of one asset across every exchange.
///
/// `free` is the grand total: locked quantities are folded in during
/// aggregation and not reported separately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatedBalance {
    /// Ticker symbol
    pub asset: String,
    /// Total quantity (free + locked) across all exchanges
    #[serde(with = "rust_decimal::serde::float")]
    pub free: Decimal,
}

// =============================================================================
// Tests
// =============================================================================
