//! Log-to-position aggregation.
//!
//! Positions are never stored. They are folded out of the transaction log on
//! every read, so there is no second balance that can drift from the log.

use super::types::{Holding, Transaction};
use std::collections::BTreeMap;

/// Sum of signed shares for one symbol. Zero when the symbol never traded.
///
/// Stores refuse commits whose position would overflow, so saturation only
/// guards logs that were written by something else.
pub fn net_shares_from_log<'a, I>(log: I, symbol: &str) -> i64
where
    I: IntoIterator<Item = &'a Transaction>,
{
    log.into_iter()
        .filter(|t| t.symbol == symbol)
        .fold(0i64, |net, t| net.saturating_add(t.shares))
}

/// Held positions (net > 0), one row per symbol, ordered by symbol.
///
/// The display name comes from the latest row for the symbol.
pub fn holdings_from_log<'a, I>(log: I) -> Vec<Holding>
where
    I: IntoIterator<Item = &'a Transaction>,
{
    let mut by_symbol: BTreeMap<&str, (i64, &str)> = BTreeMap::new();
    for t in log {
        let entry = by_symbol.entry(t.symbol.as_str()).or_insert((0, ""));
        entry.0 = entry.0.saturating_add(t.shares);
        entry.1 = t.name.as_str();
    }

    by_symbol
        .into_iter()
        .filter(|(_, (net, _))| *net > 0)
        .map(|(symbol, (net_shares, name))| Holding {
            symbol: symbol.to_string(),
            name: name.to_string(),
            net_shares,
        })
        .collect()
}
