use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::{QuoteEnvConfig, QuoteMode};
use crate::domain::ports::PriceLookup;
use crate::infrastructure::mock::MockPriceLookup;
use crate::infrastructure::quotes::IexPriceLookup;

pub struct ServicesHandle {
    pub price_lookup: Arc<dyn PriceLookup>,
}

pub struct ServicesBootstrap;

impl ServicesBootstrap {
    pub async fn init(config: &QuoteEnvConfig) -> Result<ServicesHandle> {
        let price_lookup: Arc<dyn PriceLookup> = match config.mode {
            QuoteMode::Iex => {
                let api_key = config
                    .api_key
                    .clone()
                    .context("API_KEY must be set when QUOTE_MODE=iex")?;
                info!("Price lookup: IEX at {}", config.base_url);
                Arc::new(IexPriceLookup::new(
                    config.base_url.clone(),
                    api_key,
                    config.request_timeout,
                ))
            }
            QuoteMode::Mock => {
                warn!("Price lookup: MOCK quotes, prices are not real");
                Arc::new(MockPriceLookup::with_defaults().await)
            }
        };

        Ok(ServicesHandle { price_lookup })
    }
}
