//! In-Memory Ledger Store
//!
//! Thread-safe implementation of `LedgerStore` kept entirely in RAM.
//!
//! # Locking
//!
//! - A directory `RwLock` maps ids and usernames to accounts. It is held
//!   only long enough to clone an account handle, or exclusively while a user
//!   is created.
//! - Each account sits behind its own `tokio::sync::Mutex`. Every read and
//!   write of an account takes that mutex, so operations on one user are
//!   serialized while different users never contend.
//!
//! # Limitations
//!
//! - Data is lost on restart
//! - Holdings are folded from the full log on every read

use crate::domain::errors::LedgerError;
use crate::domain::ledger::position::{holdings_from_log, net_shares_from_log};
use crate::domain::ledger::types::{Holding, NewTransaction, Transaction, User, UserId};
use crate::domain::repositories::{Commit, LedgerResult, LedgerStore, check_cash, check_commit};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

struct Account {
    user: User,
    log: Vec<Transaction>,
}

#[derive(Default)]
struct Directory {
    by_id: HashMap<UserId, Arc<Mutex<Account>>>,
    by_username: HashMap<String, UserId>,
}

pub struct InMemoryLedgerStore {
    directory: RwLock<Directory>,
    next_user_id: AtomicI64,
    next_transaction_id: AtomicI64,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self {
            directory: RwLock::new(Directory::default()),
            next_user_id: AtomicI64::new(1),
            next_transaction_id: AtomicI64::new(1),
        }
    }

    async fn account(&self, user: UserId) -> LedgerResult<Arc<Mutex<Account>>> {
        self.directory
            .read()
            .await
            .by_id
            .get(&user)
            .cloned()
            .ok_or(LedgerError::UserNotFound(user))
    }
}

impl Default for InMemoryLedgerStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn create_user(&self, username: &str, cash: Decimal) -> LedgerResult<User> {
        if cash < Decimal::ZERO {
            return Err(LedgerError::InvalidTransaction(format!(
                "opening cash {} is negative",
                cash
            )));
        }

        let mut directory = self.directory.write().await;
        if directory.by_username.contains_key(username) {
            return Err(LedgerError::UsernameTaken(username.to_string()));
        }

        let user = User {
            id: UserId(self.next_user_id.fetch_add(1, Ordering::Relaxed)),
            username: username.to_string(),
            cash,
        };
        directory.by_username.insert(username.to_string(), user.id);
        directory.by_id.insert(
            user.id,
            Arc::new(Mutex::new(Account {
                user: user.clone(),
                log: Vec::new(),
            })),
        );

        debug!("InMemoryLedgerStore: created user {} ({})", user.id, username);
        Ok(user)
    }

    async fn get_user(&self, user: UserId) -> LedgerResult<User> {
        let account = self.account(user).await?;
        let account = account.lock().await;
        Ok(account.user.clone())
    }

    async fn find_user_by_username(&self, username: &str) -> LedgerResult<Option<User>> {
        let id = self.directory.read().await.by_username.get(username).copied();
        match id {
            Some(id) => self.get_user(id).await.map(Some),
            None => Ok(None),
        }
    }

    async fn get_cash(&self, user: UserId) -> LedgerResult<Decimal> {
        let account = self.account(user).await?;
        let account = account.lock().await;
        Ok(account.user.cash)
    }

    async fn get_holdings(&self, user: UserId) -> LedgerResult<Vec<Holding>> {
        let account = self.account(user).await?;
        let account = account.lock().await;
        Ok(holdings_from_log(&account.log))
    }

    async fn get_net_shares(&self, user: UserId, symbol: &str) -> LedgerResult<i64> {
        let account = self.account(user).await?;
        let account = account.lock().await;
        Ok(net_shares_from_log(&account.log, symbol))
    }

    async fn get_history(&self, user: UserId) -> LedgerResult<Vec<Transaction>> {
        let account = self.account(user).await?;
        let account = account.lock().await;
        Ok(account.log.clone())
    }

    async fn append_and_adjust_cash(
        &self,
        user: UserId,
        transaction: NewTransaction,
        cash_delta: Decimal,
    ) -> LedgerResult<Commit> {
        let account = self.account(user).await?;
        let mut account = account.lock().await;

        let held = net_shares_from_log(&account.log, &transaction.symbol);
        let new_cash = check_commit(account.user.cash, held, &transaction, cash_delta)?;

        // Both effects are applied under the same guard with nothing fallible in between
        let id = self.next_transaction_id.fetch_add(1, Ordering::Relaxed);
        let committed = transaction.into_committed(id, user);
        account.log.push(committed.clone());
        account.user.cash = new_cash;

        Ok(Commit {
            transaction: committed,
            cash_after: new_cash,
        })
    }

    async fn adjust_cash(&self, user: UserId, delta: Decimal) -> LedgerResult<Decimal> {
        let account = self.account(user).await?;
        let mut account = account.lock().await;

        let new_cash = check_cash(account.user.cash, delta)?;
        account.user.cash = new_cash;
        Ok(new_cash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn row(symbol: &str, shares: i64, price: Decimal) -> NewTransaction {
        NewTransaction {
            symbol: symbol.to_string(),
            shares,
            price,
            name: format!("{} Corp", symbol),
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_create_user_rejects_duplicate_username() {
        let store = InMemoryLedgerStore::new();
        let alice = store.create_user("alice", dec!(100)).await.unwrap();
        assert_eq!(alice.cash, dec!(100));

        let err = store.create_user("alice", dec!(5)).await.unwrap_err();
        assert_eq!(err, LedgerError::UsernameTaken("alice".to_string()));

        let found = store.find_user_by_username("alice").await.unwrap();
        assert_eq!(found.map(|u| u.id), Some(alice.id));
        assert!(store.find_user_by_username("bob").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unknown_user_is_not_found() {
        let store = InMemoryLedgerStore::new();
        assert_eq!(
            store.get_cash(UserId(42)).await.unwrap_err(),
            LedgerError::UserNotFound(UserId(42))
        );
        assert!(matches!(
            store
                .append_and_adjust_cash(UserId(42), row("X", 1, dec!(1)), dec!(-1))
                .await,
            Err(LedgerError::UserNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_append_applies_both_effects() {
        let store = InMemoryLedgerStore::new();
        let user = store.create_user("alice", dec!(10000)).await.unwrap().id;

        let commit = store
            .append_and_adjust_cash(user, row("X", 10, dec!(100)), dec!(-1000))
            .await
            .unwrap();
        assert_eq!(commit.transaction.user_id, user);
        assert_eq!(commit.cash_after, dec!(9000));

        assert_eq!(store.get_cash(user).await.unwrap(), dec!(9000));
        assert_eq!(store.get_net_shares(user, "X").await.unwrap(), 10);
        assert_eq!(store.get_history(user).await.unwrap(), vec![commit.transaction]);
    }

    #[tokio::test]
    async fn test_rejected_append_leaves_account_untouched() {
        let store = InMemoryLedgerStore::new();
        let user = store.create_user("alice", dec!(50)).await.unwrap().id;

        let err = store
            .append_and_adjust_cash(user, row("X", 1, dec!(100)), dec!(-100))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientFunds { .. }));

        let err = store
            .append_and_adjust_cash(user, row("X", -1, dec!(100)), dec!(100))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientShares { held: 0, .. }));

        assert_eq!(store.get_cash(user).await.unwrap(), dec!(50));
        assert!(store.get_history(user).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_out_of_range_share_counts_are_rejected() {
        let store = InMemoryLedgerStore::new();
        let plenty = Decimal::from(i64::MAX) * dec!(100);
        let user = store.create_user("alice", plenty).await.unwrap().id;

        let err = store
            .append_and_adjust_cash(user, row("X", i64::MIN, dec!(1)), dec!(1))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidTransaction(_)));

        store
            .append_and_adjust_cash(user, row("X", i64::MAX, dec!(1)), -Decimal::from(i64::MAX))
            .await
            .unwrap();
        let err = store
            .append_and_adjust_cash(user, row("X", 1, dec!(1)), dec!(-1))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidTransaction(_)));

        assert_eq!(store.get_net_shares(user, "X").await.unwrap(), i64::MAX);
        assert_eq!(store.get_holdings(user).await.unwrap()[0].net_shares, i64::MAX);
        assert_eq!(store.get_history(user).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_adjust_cash_refuses_overdraft() {
        let store = InMemoryLedgerStore::new();
        let user = store.create_user("alice", dec!(0)).await.unwrap().id;

        assert_eq!(store.adjust_cash(user, dec!(25.50)).await.unwrap(), dec!(25.50));
        assert!(store.adjust_cash(user, dec!(-30)).await.is_err());
        assert_eq!(store.get_cash(user).await.unwrap(), dec!(25.50));
    }
}
