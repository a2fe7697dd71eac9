//! Trading Engine
//!
//! Validates buy, sell and deposit intents and turns the accepted ones into
//! ledger commits. The engine holds no state between calls; every rule that
//! depends on the account is re-checked by the store when it commits.

use crate::application::trading::valuation::PortfolioValuationService;
use crate::config::LedgerEnvConfig;
use crate::domain::errors::TradingError;
use crate::domain::ledger::types::{Holding, NewTransaction, Transaction, User, UserId};
use crate::domain::ports::PriceLookup;
use crate::domain::repositories::LedgerStore;
use crate::domain::trading::money::{
    DEFAULT_CASH_SCALE, ensure_positive_shares, normalize_symbol, trade_value, validate_deposit,
};
use crate::domain::trading::portfolio::PortfolioView;
use crate::domain::trading::types::{
    DepositReceipt, Quote, TradeIntent, TradeReceipt, TradeSide,
};
use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct TradingEngineConfig {
    /// Opening balance granted on registration
    pub initial_cash: Decimal,
    /// Maximum fractional digits accepted for deposits
    pub cash_scale: u32,
}

impl Default for TradingEngineConfig {
    fn default() -> Self {
        Self {
            initial_cash: dec!(10000),
            cash_scale: DEFAULT_CASH_SCALE,
        }
    }
}

impl From<&LedgerEnvConfig> for TradingEngineConfig {
    fn from(config: &LedgerEnvConfig) -> Self {
        Self {
            initial_cash: config.initial_cash,
            cash_scale: config.cash_scale,
        }
    }
}

pub struct TradingEngine {
    ledger: Arc<dyn LedgerStore>,
    prices: Arc<dyn PriceLookup>,
    valuation: PortfolioValuationService,
    config: TradingEngineConfig,
}

impl TradingEngine {
    pub fn new(
        ledger: Arc<dyn LedgerStore>,
        prices: Arc<dyn PriceLookup>,
        config: TradingEngineConfig,
    ) -> Self {
        let valuation = PortfolioValuationService::new(ledger.clone(), prices.clone());
        Self {
            ledger,
            prices,
            valuation,
            config,
        }
    }

    pub fn config(&self) -> &TradingEngineConfig {
        &self.config
    }

    /// Creates an account funded with the configured opening balance.
    pub async fn register(&self, username: &str) -> Result<User, TradingError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(reject(
                "register",
                TradingError::InvalidInput("must provide username".to_string()),
            ));
        }

        let user = self
            .ledger
            .create_user(username, self.config.initial_cash)
            .await
            .map_err(|e| reject("register", e.into()))?;

        info!(
            "TradingEngine: registered {} as {} with ${}",
            username, user.id, user.cash
        );
        Ok(user)
    }

    /// Current quote for a ticker, or `UnknownSymbol` when it is not listed.
    pub async fn quote(&self, symbol: &str) -> Result<Quote, TradingError> {
        let symbol = normalize_symbol(symbol).map_err(|e| reject("quote", e))?;
        self.fetch_quote(&symbol)
            .await
            .map_err(|e| reject("quote", e))
    }

    pub async fn execute(&self, intent: TradeIntent) -> Result<TradeReceipt, TradingError> {
        match intent.side {
            TradeSide::Buy => self.buy(intent.user, &intent.symbol, intent.shares).await,
            TradeSide::Sell => self.sell(intent.user, &intent.symbol, intent.shares).await,
        }
    }

    pub async fn buy(
        &self,
        user: UserId,
        symbol: &str,
        shares: i64,
    ) -> Result<TradeReceipt, TradingError> {
        self.try_buy(user, symbol, shares)
            .await
            .map_err(|e| reject("buy", e))
    }

    pub async fn sell(
        &self,
        user: UserId,
        symbol: &str,
        shares: i64,
    ) -> Result<TradeReceipt, TradingError> {
        self.try_sell(user, symbol, shares)
            .await
            .map_err(|e| reject("sell", e))
    }

    /// Credits cash without writing a transaction row.
    pub async fn deposit(
        &self,
        user: UserId,
        amount: Decimal,
    ) -> Result<DepositReceipt, TradingError> {
        let amount =
            validate_deposit(amount, self.config.cash_scale).map_err(|e| reject("deposit", e))?;

        let cash_after = self
            .ledger
            .adjust_cash(user, amount)
            .await
            .map_err(|e| reject("deposit", e.into()))?;

        info!(
            "TradingEngine: deposit of ${} for {} (cash now ${})",
            amount, user, cash_after
        );
        Ok(DepositReceipt {
            user,
            amount,
            cash_after,
        })
    }

    pub async fn portfolio_view(&self, user: UserId) -> Result<PortfolioView, TradingError> {
        self.valuation
            .view(user)
            .await
            .map_err(|e| reject("portfolio", e))
    }

    pub async fn history(&self, user: UserId) -> Result<Vec<Transaction>, TradingError> {
        self.ledger
            .get_history(user)
            .await
            .map_err(|e| reject("history", e.into()))
    }

    /// Symbols the user can currently sell
    pub async fn holdings(&self, user: UserId) -> Result<Vec<Holding>, TradingError> {
        self.ledger
            .get_holdings(user)
            .await
            .map_err(|e| reject("holdings", e.into()))
    }

    pub async fn cash(&self, user: UserId) -> Result<Decimal, TradingError> {
        self.ledger
            .get_cash(user)
            .await
            .map_err(|e| reject("cash", e.into()))
    }

    async fn try_buy(
        &self,
        user: UserId,
        symbol: &str,
        shares: i64,
    ) -> Result<TradeReceipt, TradingError> {
        let shares = ensure_positive_shares(shares)?;
        let symbol = normalize_symbol(symbol)?;

        let quote = self.fetch_quote(&symbol).await?;
        let cash = self.ledger.get_cash(user).await?;

        let cost = trade_value(shares, quote.price)?;
        if cash < cost {
            return Err(TradingError::InsufficientFunds {
                need: cost,
                available: cash,
            });
        }

        let recorded_symbol = normalize_symbol(&quote.symbol).unwrap_or(symbol);
        let row = NewTransaction {
            symbol: recorded_symbol,
            shares,
            price: quote.price,
            name: quote.name,
            timestamp: Utc::now(),
        };
        let commit = self.ledger.append_and_adjust_cash(user, row, -cost).await?;

        info!(
            "TradingEngine: BUY {} {} @ ${} for {} (cash now ${})",
            shares, commit.transaction.symbol, commit.transaction.price, user, commit.cash_after
        );
        Ok(TradeReceipt {
            side: TradeSide::Buy,
            transaction: commit.transaction,
            amount: cost,
            cash_after: commit.cash_after,
        })
    }

    async fn try_sell(
        &self,
        user: UserId,
        symbol: &str,
        shares: i64,
    ) -> Result<TradeReceipt, TradingError> {
        let shares = ensure_positive_shares(shares)?;
        let symbol = normalize_symbol(symbol)?;

        let held = self.ledger.get_net_shares(user, &symbol).await?;
        if held <= 0 {
            return Err(TradingError::NoPosition(symbol));
        }
        if shares > held {
            return Err(TradingError::InsufficientShares {
                symbol,
                requested: shares,
                held,
            });
        }

        let quote = self.fetch_quote(&symbol).await?;
        let proceeds = trade_value(shares, quote.price)?;

        let row = NewTransaction {
            symbol,
            shares: -shares,
            price: quote.price,
            name: quote.name,
            timestamp: Utc::now(),
        };
        let commit = self
            .ledger
            .append_and_adjust_cash(user, row, proceeds)
            .await?;

        info!(
            "TradingEngine: SELL {} {} @ ${} for {} (cash now ${})",
            shares, commit.transaction.symbol, commit.transaction.price, user, commit.cash_after
        );
        Ok(TradeReceipt {
            side: TradeSide::Sell,
            transaction: commit.transaction,
            amount: proceeds,
            cash_after: commit.cash_after,
        })
    }

    /// `Ok(None)` from the lookup is an unknown symbol; a lookup failure is
    /// reported separately so callers can retry.
    async fn fetch_quote(&self, symbol: &str) -> Result<Quote, TradingError> {
        match self.prices.lookup(symbol).await {
            Ok(Some(quote)) => {
                debug!("TradingEngine: {} quoted at ${}", symbol, quote.price);
                Ok(quote)
            }
            Ok(None) => Err(TradingError::UnknownSymbol(symbol.to_string())),
            Err(e) => Err(TradingError::QuoteUnavailable {
                symbol: symbol.to_string(),
                reason: format!("{:#}", e),
            }),
        }
    }
}

fn reject(operation: &str, error: TradingError) -> TradingError {
    warn!(
        "TradingEngine: {} rejected [{}]: {}",
        operation,
        error.code(),
        error
    );
    error
}
