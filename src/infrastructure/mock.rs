use crate::domain::ports::PriceLookup;
use crate::domain::trading::types::Quote;
use anyhow::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// In-process quote table for tests and offline runs.
///
/// Prices can be changed at any time, and a symbol can be told to fail so
/// that degraded portfolio views can be produced on demand.
#[derive(Clone, Default)]
pub struct MockPriceLookup {
    quotes: Arc<RwLock<HashMap<String, Quote>>>,
    failing: Arc<RwLock<HashSet<String>>>,
}

impl MockPriceLookup {
    /// Empty table: every symbol is unknown
    pub fn new() -> Self {
        Self::default()
    }

    /// A handful of well-known tickers at fixed prices
    pub async fn with_defaults() -> Self {
        let lookup = Self::new();
        for (symbol, name, price) in [
            ("AAPL", "Apple Inc.", dec!(189.84)),
            ("MSFT", "Microsoft Corporation", dec!(415.50)),
            ("GOOGL", "Alphabet Inc.", dec!(171.25)),
            ("NFLX", "Netflix, Inc.", dec!(640.10)),
            ("AMZN", "Amazon.com, Inc.", dec!(183.66)),
        ] {
            lookup.set_quote(symbol, name, price).await;
        }
        lookup
    }

    pub async fn set_quote(&self, symbol: &str, name: &str, price: Decimal) {
        self.quotes.write().await.insert(
            symbol.to_string(),
            Quote {
                symbol: symbol.to_string(),
                name: name.to_string(),
                price,
            },
        );
    }

    /// Changes the price of an already listed symbol. Unknown symbols are ignored.
    pub async fn set_price(&self, symbol: &str, price: Decimal) {
        if let Some(quote) = self.quotes.write().await.get_mut(symbol) {
            quote.price = price;
        }
    }

    pub async fn delist(&self, symbol: &str) {
        self.quotes.write().await.remove(symbol);
    }

    /// Makes lookups of `symbol` fail as if the provider were unreachable
    pub async fn fail_symbol(&self, symbol: &str) {
        self.failing.write().await.insert(symbol.to_string());
    }

    pub async fn recover_symbol(&self, symbol: &str) {
        self.failing.write().await.remove(symbol);
    }
}

#[async_trait]
impl PriceLookup for MockPriceLookup {
    async fn lookup(&self, symbol: &str) -> Result<Option<Quote>> {
        if self.failing.read().await.contains(symbol) {
            anyhow::bail!("MockPriceLookup: provider unreachable for {}", symbol);
        }
        let quote = self.quotes.read().await.get(symbol).cloned();
        debug!("MockPriceLookup: {} -> {:?}", symbol, quote.as_ref().map(|q| q.price));
        Ok(quote)
    }
}
