use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub cash: Decimal,
}

/// A transaction that has not been committed yet
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub symbol: String,
    /// Positive for a buy, negative for a sell
    pub shares: i64,
    pub price: Decimal,
    pub name: String,
    pub timestamp: DateTime<Utc>,
}

impl NewTransaction {
    /// Checks that the row may enter the log: non-zero shares, positive price.
    pub fn validate(&self) -> Result<(), String> {
        if self.symbol.trim().is_empty() {
            return Err("transaction symbol is empty".to_string());
        }
        if self.shares == 0 {
            return Err(format!("zero-share transaction for {}", self.symbol));
        }
        if self.shares == i64::MIN {
            return Err(format!(
                "share count {} for {} is out of range",
                self.shares, self.symbol
            ));
        }
        if self.price <= Decimal::ZERO {
            return Err(format!(
                "non-positive price {} for {}",
                self.price, self.symbol
            ));
        }
        Ok(())
    }

    /// Signed notional of the row (shares * price)
    pub fn notional(&self) -> Option<Decimal> {
        Decimal::from(self.shares).checked_mul(self.price)
    }

    pub fn into_committed(self, id: i64, user_id: UserId) -> Transaction {
        Transaction {
            id,
            user_id,
            symbol: self.symbol,
            shares: self.shares,
            price: self.price,
            name: self.name,
            timestamp: self.timestamp,
        }
    }
}

/// An immutable row of the append-only log
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    pub id: i64,
    pub user_id: UserId,
    pub symbol: String,
    pub shares: i64,
    pub price: Decimal,
    pub name: String,
    pub timestamp: DateTime<Utc>,
}

/// Net position in one symbol, derived from the log
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Holding {
    pub symbol: String,
    pub name: String,
    pub net_shares: i64,
}
