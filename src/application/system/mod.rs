use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use crate::application::bootstrap::{
    PersistenceBootstrap, PersistenceHandle, ServicesBootstrap, ServicesHandle,
};
use crate::application::trading::{TradingEngine, TradingEngineConfig};
use crate::config::Config;

/// Fully wired ledger application: database, price source and engine.
pub struct Application {
    pub config: Config,
    pub persistence: PersistenceHandle,
    pub services: ServicesHandle,
    pub engine: Arc<TradingEngine>,
}

impl Application {
    pub async fn build(config: Config) -> Result<Self> {
        info!(
            "Building stockledger application (Quotes: {:?})...",
            config.quotes.mode
        );

        let persistence = PersistenceBootstrap::init(&config.database).await?;
        let services = ServicesBootstrap::init(&config.quotes).await?;

        let engine = Arc::new(TradingEngine::new(
            persistence.ledger.clone(),
            services.price_lookup.clone(),
            TradingEngineConfig::from(&config.ledger),
        ));

        info!(
            "Trading engine ready: opening cash ${}, cash scale {}",
            config.ledger.initial_cash, config.ledger.cash_scale
        );

        Ok(Self {
            config,
            persistence,
            services,
            engine,
        })
    }
}
