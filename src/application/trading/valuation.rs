//! Portfolio Valuation Service
//!
//! Prices every held position at read time. Lookups run concurrently, one per
//! symbol; a lookup that fails or finds nothing marks only its own row
//! unavailable and flags the whole view as degraded.

use crate::domain::errors::TradingError;
use crate::domain::ledger::types::UserId;
use crate::domain::ports::PriceLookup;
use crate::domain::repositories::LedgerStore;
use crate::domain::trading::portfolio::PortfolioView;
use futures::future::join_all;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, warn};

pub struct PortfolioValuationService {
    ledger: Arc<dyn LedgerStore>,
    prices: Arc<dyn PriceLookup>,
}

impl PortfolioValuationService {
    pub fn new(ledger: Arc<dyn LedgerStore>, prices: Arc<dyn PriceLookup>) -> Self {
        Self { ledger, prices }
    }

    pub async fn view(&self, user: UserId) -> Result<PortfolioView, TradingError> {
        let cash = self.ledger.get_cash(user).await?;
        let holdings = self.ledger.get_holdings(user).await?;

        let prices = join_all(holdings.iter().map(|h| self.price_of(&h.symbol))).await;

        let view = PortfolioView::compose(cash, holdings, prices);
        if view.degraded {
            warn!(
                "PortfolioValuationService: degraded view for {}, unpriced: {:?}",
                user,
                view.unavailable_symbols()
            );
        } else {
            debug!(
                "PortfolioValuationService: {} valued at ${} ({} rows)",
                user,
                view.total,
                view.rows.len()
            );
        }
        Ok(view)
    }

    async fn price_of(&self, symbol: &str) -> Result<Decimal, String> {
        match self.prices.lookup(symbol).await {
            Ok(Some(quote)) => Ok(quote.price),
            Ok(None) => Err(format!("{} is no longer listed", symbol)),
            Err(e) => Err(format!("price lookup failed: {:#}", e)),
        }
    }
}
