#![allow(dead_code)]

use rust_decimal::Decimal;
use std::sync::Arc;
use stockledger::application::trading::{TradingEngine, TradingEngineConfig};
use stockledger::domain::ledger::types::UserId;
use stockledger::domain::repositories::LedgerStore;
use stockledger::infrastructure::{
    Database, InMemoryLedgerStore, MockPriceLookup, SqliteLedgerStore,
};

#[derive(Debug, Clone, Copy)]
pub enum StoreKind {
    InMemory,
    Sqlite,
}

pub const STORE_KINDS: [StoreKind; 2] = [StoreKind::InMemory, StoreKind::Sqlite];

pub async fn ledger(kind: StoreKind) -> Arc<dyn LedgerStore> {
    match kind {
        StoreKind::InMemory => Arc::new(InMemoryLedgerStore::new()),
        StoreKind::Sqlite => Arc::new(SqliteLedgerStore::new(
            Database::in_memory()
                .await
                .expect("in-memory database should open"),
        )),
    }
}

pub struct Harness {
    pub engine: Arc<TradingEngine>,
    pub ledger: Arc<dyn LedgerStore>,
    pub prices: MockPriceLookup,
}

impl Harness {
    pub async fn new(kind: StoreKind) -> Self {
        let ledger = ledger(kind).await;
        let prices = MockPriceLookup::new();
        let engine = Arc::new(TradingEngine::new(
            ledger.clone(),
            Arc::new(prices.clone()),
            TradingEngineConfig::default(),
        ));
        Self {
            engine,
            ledger,
            prices,
        }
    }

    /// Creates a user directly in the store with an arbitrary opening balance
    pub async fn user_with_cash(&self, username: &str, cash: Decimal) -> UserId {
        let user = self
            .ledger
            .create_user(username, cash)
            .await
            .expect("user should be created");
        user.id
    }

    pub async fn listing(&self, symbol: &str, price: Decimal) {
        self.prices
            .set_quote(symbol, &format!("{} Corp", symbol), price)
            .await;
    }

    /// Σ shares of `symbol` over the user's history
    pub async fn history_net(&self, user: UserId, symbol: &str) -> i64 {
        self.ledger
            .get_history(user)
            .await
            .expect("history should load")
            .iter()
            .filter(|t| t.symbol == symbol)
            .map(|t| t.shares)
            .sum()
    }
}
