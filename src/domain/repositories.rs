//! Ledger Store Abstraction
//!
//! The ledger store owns the only shared mutable state of the system: one cash
//! figure per user and the append-only transaction log. Positions are always
//! derived from the log at read time.
//!
//! # Concurrency contract
//!
//! Implementations serialize conflicting operations per user. Operations on
//! different users proceed independently. `append_and_adjust_cash` re-checks
//! the cash and share invariants under that serialization, so a caller that
//! validated against stale reads can never push an account negative.
//!
//! # Implementations
//!
//! - `InMemoryLedgerStore`: per-account `tokio::sync::Mutex`, for tests and
//!   single-process use
//! - `SqliteLedgerStore`: durable, per-user lock plus compare-and-swap on cash
//!
//! # Example
//!
//! ```rust,no_run
//! use stockledger::domain::repositories::LedgerStore;
//! use stockledger::infrastructure::InMemoryLedgerStore;
//! use rust_decimal_macros::dec;
//!
//! # async {
//! let store = InMemoryLedgerStore::new();
//! let user = store.create_user("alice", dec!(10000)).await.unwrap();
//! let cash = store.get_cash(user.id).await.unwrap();
//! # };
//! ```

use crate::domain::errors::LedgerError;
use crate::domain::ledger::types::{Holding, NewTransaction, Transaction, User, UserId};
use async_trait::async_trait;
use rust_decimal::Decimal;

pub type LedgerResult<T> = Result<T, LedgerError>;

/// Result of a successful `append_and_adjust_cash`
#[derive(Debug, Clone, PartialEq)]
pub struct Commit {
    pub transaction: Transaction,
    /// Balance produced by this commit
    pub cash_after: Decimal,
}

#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Register a user with an opening cash balance
    async fn create_user(&self, username: &str, cash: Decimal) -> LedgerResult<User>;

    async fn get_user(&self, user: UserId) -> LedgerResult<User>;

    async fn find_user_by_username(&self, username: &str) -> LedgerResult<Option<User>>;

    async fn get_cash(&self, user: UserId) -> LedgerResult<Decimal>;

    /// Held positions (net shares > 0), ordered by symbol
    async fn get_holdings(&self, user: UserId) -> LedgerResult<Vec<Holding>>;

    /// Net shares for one symbol; zero when the symbol never traded
    async fn get_net_shares(&self, user: UserId, symbol: &str) -> LedgerResult<i64>;

    /// Full log for the user in insertion order
    async fn get_history(&self, user: UserId) -> LedgerResult<Vec<Transaction>>;

    /// Atomically append `transaction` and apply `cash += cash_delta`.
    ///
    /// Either both effects are visible afterwards or neither is.
    async fn append_and_adjust_cash(
        &self,
        user: UserId,
        transaction: NewTransaction,
        cash_delta: Decimal,
    ) -> LedgerResult<Commit>;

    /// Cash-only adjustment with no log row. Returns the new balance.
    async fn adjust_cash(&self, user: UserId, delta: Decimal) -> LedgerResult<Decimal>;
}

/// Shared pre-commit rules, evaluated under the store's per-user serialization.
///
/// `held` is the current net position in the transaction's symbol.
pub fn check_commit(
    cash: Decimal,
    held: i64,
    transaction: &NewTransaction,
    cash_delta: Decimal,
) -> LedgerResult<Decimal> {
    transaction
        .validate()
        .map_err(LedgerError::InvalidTransaction)?;

    if transaction.notional().is_none() {
        return Err(LedgerError::InvalidTransaction(format!(
            "value of {} {} @ {} overflows",
            transaction.shares, transaction.symbol, transaction.price
        )));
    }

    let net_after = held.checked_add(transaction.shares).ok_or_else(|| {
        LedgerError::InvalidTransaction(format!(
            "position in {} would overflow ({} held, {} more)",
            transaction.symbol, held, transaction.shares
        ))
    })?;

    // validate() guarantees the negation below cannot overflow
    if transaction.shares < 0 && net_after < 0 {
        return Err(LedgerError::InsufficientShares {
            symbol: transaction.symbol.clone(),
            requested: -transaction.shares,
            held,
        });
    }

    check_cash(cash, cash_delta)
}

/// Applies `delta` to `cash`, refusing any result below zero.
pub fn check_cash(cash: Decimal, delta: Decimal) -> LedgerResult<Decimal> {
    let new_cash = cash
        .checked_add(delta)
        .ok_or_else(|| LedgerError::InvalidTransaction("cash adjustment overflows".to_string()))?;
    if new_cash < Decimal::ZERO {
        return Err(LedgerError::InsufficientFunds {
            need: -delta,
            available: cash,
        });
    }
    Ok(new_cash)
}
