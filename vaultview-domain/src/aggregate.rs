//! Cross-exchange balance aggregation.

use rust_decimal::Decimal;
use std::collections::BTreeMap;

use crate::balance::{AggregatedBalance, Balance};

/// Fold per-exchange balance lists into one entry per asset.
///
/// Each record contributes `free + locked` (absent locked counts as zero) to
/// its asset's total. The result is sorted ascending by asset using ordinal
/// string comparison and contains one entry per distinct asset. Asset
/// symbols are compared as given, so `btc` and `BTC` stay separate.
///
/// Accepts anything that yields balance lists, e.g. `&BalancesByExchange`
/// values or a plain slice of lists.
pub fn aggregate_balances<'a, I>(lists: I) -> Vec<AggregatedBalance>
where
    I: IntoIterator<Item = &'a Vec<Balance>>,
{
    let mut totals: BTreeMap<&str, Decimal> = BTreeMap::new();

    for balances in lists {
        for balance in balances {
            *totals.entry(balance.asset.as_str()).or_insert(Decimal::ZERO) += balance.total();
        }
    }

    // BTreeMap<&str, _> iterates in byte order, which is the ordinal order
    totals
        .into_iter()
        .map(|(asset, free)| AggregatedBalance {
            asset: asset.to_string(),
            free,
        })
        .collect()
}

// =============================================================================
// Tests
// =============================================================================
