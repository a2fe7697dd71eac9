use crate::domain::errors::LedgerError;
use crate::domain::ledger::types::{Holding, NewTransaction, Transaction, User, UserId};
use crate::domain::repositories::{Commit, LedgerResult, LedgerStore, check_cash, check_commit};
use crate::infrastructure::core::keyed_lock::KeyedLock;
use crate::infrastructure::persistence::database::Database;
use async_trait::async_trait;
use chrono::DateTime;
use rust_decimal::Decimal;
use sqlx::Row;
use sqlx::sqlite::SqliteRow;
use std::future::Future;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, warn};

const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_COMMIT_ATTEMPTS: u32 = 3;

/// Account state read ahead of a commit
struct AccountSnapshot {
    version: i64,
    cash: Decimal,
    held: i64,
}

impl From<sqlx::Error> for LedgerError {
    fn from(e: sqlx::Error) -> Self {
        LedgerError::Storage(e.to_string())
    }
}

/// Durable ledger store on SQLite.
///
/// Writers for one user are serialized by an in-process keyed lock. Every
/// write also bumps `users.version` through a compare-and-swap, so a writer in
/// another process is detected too, and a lost race re-reads and re-validates.
pub struct SqliteLedgerStore {
    database: Database,
    locks: KeyedLock<UserId>,
    operation_timeout: Duration,
    max_commit_attempts: u32,
}

impl SqliteLedgerStore {
    pub fn new(database: Database) -> Self {
        Self {
            database,
            locks: KeyedLock::new(),
            operation_timeout: DEFAULT_OPERATION_TIMEOUT,
            max_commit_attempts: DEFAULT_COMMIT_ATTEMPTS,
        }
    }

    pub fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = timeout;
        self
    }

    pub fn with_max_commit_attempts(mut self, attempts: u32) -> Self {
        self.max_commit_attempts = attempts.max(1);
        self
    }

    /// Runs `operation` under the storage timeout
    async fn timed<T, F>(&self, name: &str, operation: F) -> LedgerResult<T>
    where
        F: Future<Output = LedgerResult<T>>,
    {
        match tokio::time::timeout(self.operation_timeout, operation).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    "SqliteLedgerStore: {} timed out after {:?}",
                    name, self.operation_timeout
                );
                Err(LedgerError::Storage(format!(
                    "{} timed out after {:?}",
                    name, self.operation_timeout
                )))
            }
        }
    }

    /// Current cash and write version of the user
    async fn read_account(&self, user: UserId) -> LedgerResult<(Decimal, i64)> {
        let row: Option<(String, i64)> =
            sqlx::query_as("SELECT cash, version FROM users WHERE id = ?")
                .bind(user.0)
                .fetch_optional(&self.database.pool)
                .await?;
        let (raw, version) = row.ok_or(LedgerError::UserNotFound(user))?;
        Ok((parse_decimal(&raw, "users.cash")?, version))
    }

    async fn ensure_user(&self, user: UserId) -> LedgerResult<()> {
        let exists: Option<i64> = sqlx::query_scalar("SELECT 1 FROM users WHERE id = ?")
            .bind(user.0)
            .fetch_optional(&self.database.pool)
            .await?;
        exists.map(|_| ()).ok_or(LedgerError::UserNotFound(user))
    }

    async fn net_shares(&self, user: UserId, symbol: &str) -> LedgerResult<i64> {
        let net: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(shares), 0) FROM transactions WHERE user_id = ? AND symbol = ?",
        )
        .bind(user.0)
        .bind(symbol)
        .fetch_one(&self.database.pool)
        .await?;
        Ok(net)
    }

    /// Reads the state a commit is validated against.
    ///
    /// The version is read before the position. Any append that lands after
    /// the version read bumps the version, so the write step rejects it.
    async fn snapshot(&self, user: UserId, symbol: &str) -> LedgerResult<AccountSnapshot> {
        let (cash, version) = self.read_account(user).await?;
        let held = self.net_shares(user, symbol).await?;
        Ok(AccountSnapshot {
            version,
            cash,
            held,
        })
    }

    /// Writes the row and the new cash if the user is still at
    /// `snapshot.version`. `Ok(None)` means another writer got there first.
    async fn try_commit(
        &self,
        user: UserId,
        snapshot: &AccountSnapshot,
        transaction: &NewTransaction,
        cash_delta: Decimal,
    ) -> LedgerResult<Option<Commit>> {
        let new_cash = check_commit(snapshot.cash, snapshot.held, transaction, cash_delta)?;

        // Rows keep millisecond precision, so the receipt does too
        let millis = transaction.timestamp.timestamp_millis();
        let timestamp = DateTime::from_timestamp_millis(millis).ok_or_else(|| {
            LedgerError::InvalidTransaction(format!("timestamp {} out of range", millis))
        })?;

        let mut tx = self.database.pool.begin().await?;

        let swapped = sqlx::query(
            "UPDATE users SET cash = ?, version = version + 1 WHERE id = ? AND version = ?",
        )
        .bind(new_cash.to_string())
        .bind(user.0)
        .bind(snapshot.version)
        .execute(&mut *tx)
        .await?;
        if swapped.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        let inserted = sqlx::query(
            r#"
            INSERT INTO transactions (user_id, symbol, shares, price, name, timestamp)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(user.0)
        .bind(&transaction.symbol)
        .bind(transaction.shares)
        .bind(transaction.price.to_string())
        .bind(&transaction.name)
        .bind(millis)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        let committed = NewTransaction {
            timestamp,
            ..transaction.clone()
        }
        .into_committed(inserted.last_insert_rowid(), user);
        Ok(Some(Commit {
            transaction: committed,
            cash_after: new_cash,
        }))
    }

    async fn commit(
        &self,
        user: UserId,
        transaction: NewTransaction,
        cash_delta: Decimal,
    ) -> LedgerResult<Commit> {
        let _guard = self.locks.lock(&user).await;

        for attempt in 1..=self.max_commit_attempts {
            let snapshot = self.snapshot(user, &transaction.symbol).await?;
            if let Some(commit) = self
                .try_commit(user, &snapshot, &transaction, cash_delta)
                .await?
            {
                debug!(
                    "SqliteLedgerStore: committed transaction {} for user {}",
                    commit.transaction.id, user
                );
                return Ok(commit);
            }
            warn!(
                "SqliteLedgerStore: user {} was written concurrently (attempt {}/{})",
                user, attempt, self.max_commit_attempts
            );
        }

        Err(LedgerError::Storage(format!(
            "user {} kept changing, gave up after {} attempts",
            user, self.max_commit_attempts
        )))
    }

    async fn apply_cash_delta(&self, user: UserId, delta: Decimal) -> LedgerResult<Decimal> {
        let _guard = self.locks.lock(&user).await;

        for attempt in 1..=self.max_commit_attempts {
            let (cash, version) = self.read_account(user).await?;
            let new_cash = check_cash(cash, delta)?;

            let swapped = sqlx::query(
                "UPDATE users SET cash = ?, version = version + 1 WHERE id = ? AND version = ?",
            )
            .bind(new_cash.to_string())
            .bind(user.0)
            .bind(version)
            .execute(&self.database.pool)
            .await?;
            if swapped.rows_affected() == 1 {
                return Ok(new_cash);
            }
            warn!(
                "SqliteLedgerStore: user {} was written concurrently (attempt {}/{})",
                user, attempt, self.max_commit_attempts
            );
        }

        Err(LedgerError::Storage(format!(
            "user {} kept changing, gave up after {} attempts",
            user, self.max_commit_attempts
        )))
    }
}

#[async_trait]
impl LedgerStore for SqliteLedgerStore {
    async fn create_user(&self, username: &str, cash: Decimal) -> LedgerResult<User> {
        if cash < Decimal::ZERO {
            return Err(LedgerError::InvalidTransaction(format!(
                "opening cash {} is negative",
                cash
            )));
        }

        self.timed("create_user", async {
            let result = sqlx::query("INSERT INTO users (username, cash) VALUES (?, ?)")
                .bind(username)
                .bind(cash.to_string())
                .execute(&self.database.pool)
                .await;

            match result {
                Ok(done) => {
                    let user = User {
                        id: UserId(done.last_insert_rowid()),
                        username: username.to_string(),
                        cash,
                    };
                    info!("SqliteLedgerStore: registered user {} ({})", user.id, username);
                    Ok(user)
                }
                Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                    Err(LedgerError::UsernameTaken(username.to_string()))
                }
                Err(e) => Err(e.into()),
            }
        })
        .await
    }

    async fn get_user(&self, user: UserId) -> LedgerResult<User> {
        self.timed("get_user", async {
            let row = sqlx::query("SELECT id, username, cash FROM users WHERE id = ?")
                .bind(user.0)
                .fetch_optional(&self.database.pool)
                .await?;
            match row {
                Some(row) => map_user(&row),
                None => Err(LedgerError::UserNotFound(user)),
            }
        })
        .await
    }

    async fn find_user_by_username(&self, username: &str) -> LedgerResult<Option<User>> {
        self.timed("find_user_by_username", async {
            let row = sqlx::query("SELECT id, username, cash FROM users WHERE username = ?")
                .bind(username)
                .fetch_optional(&self.database.pool)
                .await?;
            row.as_ref().map(map_user).transpose()
        })
        .await
    }

    async fn get_cash(&self, user: UserId) -> LedgerResult<Decimal> {
        self.timed("get_cash", async { Ok(self.read_account(user).await?.0) })
            .await
    }

    async fn get_holdings(&self, user: UserId) -> LedgerResult<Vec<Holding>> {
        self.timed("get_holdings", async {
            self.ensure_user(user).await?;

            let rows = sqlx::query(
                r#"
                SELECT
                    t.symbol AS symbol,
                    SUM(t.shares) AS net_shares,
                    (
                        SELECT latest.name FROM transactions latest
                        WHERE latest.user_id = t.user_id AND latest.symbol = t.symbol
                        ORDER BY latest.id DESC
                        LIMIT 1
                    ) AS name
                FROM transactions t
                WHERE t.user_id = ?
                GROUP BY t.symbol
                HAVING SUM(t.shares) > 0
                ORDER BY t.symbol ASC
                "#,
            )
            .bind(user.0)
            .fetch_all(&self.database.pool)
            .await?;

            let mut holdings = Vec::with_capacity(rows.len());
            for row in rows {
                holdings.push(Holding {
                    symbol: row.try_get("symbol")?,
                    name: row.try_get("name")?,
                    net_shares: row.try_get("net_shares")?,
                });
            }
            Ok(holdings)
        })
        .await
    }

    async fn get_net_shares(&self, user: UserId, symbol: &str) -> LedgerResult<i64> {
        self.timed("get_net_shares", async {
            self.ensure_user(user).await?;
            self.net_shares(user, symbol).await
        })
        .await
    }

    async fn get_history(&self, user: UserId) -> LedgerResult<Vec<Transaction>> {
        self.timed("get_history", async {
            self.ensure_user(user).await?;

            let rows = sqlx::query(
                r#"
                SELECT id, user_id, symbol, shares, price, name, timestamp
                FROM transactions
                WHERE user_id = ?
                ORDER BY id ASC
                "#,
            )
            .bind(user.0)
            .fetch_all(&self.database.pool)
            .await?;

            rows.iter().map(map_transaction).collect()
        })
        .await
    }

    async fn append_and_adjust_cash(
        &self,
        user: UserId,
        transaction: NewTransaction,
        cash_delta: Decimal,
    ) -> LedgerResult<Commit> {
        self.timed(
            "append_and_adjust_cash",
            self.commit(user, transaction, cash_delta),
        )
        .await
    }

    async fn adjust_cash(&self, user: UserId, delta: Decimal) -> LedgerResult<Decimal> {
        self.timed("adjust_cash", self.apply_cash_delta(user, delta))
            .await
    }
}

fn parse_decimal(raw: &str, column: &str) -> LedgerResult<Decimal> {
    Decimal::from_str(raw).map_err(|e| {
        LedgerError::Storage(format!("corrupt decimal in {}: '{}' ({})", column, raw, e))
    })
}

fn map_user(row: &SqliteRow) -> LedgerResult<User> {
    let cash: String = row.try_get("cash")?;
    Ok(User {
        id: UserId(row.try_get("id")?),
        username: row.try_get("username")?,
        cash: parse_decimal(&cash, "users.cash")?,
    })
}

fn map_transaction(row: &SqliteRow) -> LedgerResult<Transaction> {
    let price: String = row.try_get("price")?;
    let millis: i64 = row.try_get("timestamp")?;
    let timestamp = DateTime::from_timestamp_millis(millis).ok_or_else(|| {
        LedgerError::Storage(format!("corrupt timestamp in transactions: {}", millis))
    })?;

    Ok(Transaction {
        id: row.try_get("id")?,
        user_id: UserId(row.try_get("user_id")?),
        symbol: row.try_get("symbol")?,
        shares: row.try_get("shares")?,
        price: parse_decimal(&price, "transactions.price")?,
        name: row.try_get("name")?,
        timestamp,
    })
}
