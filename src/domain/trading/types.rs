use crate::domain::ledger::types::{Transaction, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeSide {
    Buy,
    Sell,
}

impl fmt::Display for TradeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeSide::Buy => write!(f, "BUY"),
            TradeSide::Sell => write!(f, "SELL"),
        }
    }
}

/// Current price of a listed asset as returned by a price lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    pub name: String,
    pub price: Decimal,
}

/// A request to buy or sell on behalf of an already-authenticated user
#[derive(Debug, Clone, PartialEq)]
pub struct TradeIntent {
    pub user: UserId,
    pub symbol: String,
    pub shares: i64,
    pub side: TradeSide,
}

impl TradeIntent {
    pub fn buy(user: UserId, symbol: impl Into<String>, shares: i64) -> Self {
        Self {
            user,
            symbol: symbol.into(),
            shares,
            side: TradeSide::Buy,
        }
    }

    pub fn sell(user: UserId, symbol: impl Into<String>, shares: i64) -> Self {
        Self {
            user,
            symbol: symbol.into(),
            shares,
            side: TradeSide::Sell,
        }
    }
}

/// Outcome of a committed trade
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeReceipt {
    pub side: TradeSide,
    pub transaction: Transaction,
    /// Absolute cash amount moved by the trade
    pub amount: Decimal,
    pub cash_after: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DepositReceipt {
    pub user: UserId,
    pub amount: Decimal,
    pub cash_after: Decimal,
}
