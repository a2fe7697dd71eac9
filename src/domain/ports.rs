use crate::domain::trading::types::Quote;
use anyhow::Result;
use async_trait::async_trait;

/// Fetch-by-symbol price source.
///
/// `Ok(None)` means the symbol is not listed; `Err` means the source could
/// not be reached. Every call is treated as current truth, nothing is cached.
#[async_trait]
pub trait PriceLookup: Send + Sync {
    async fn lookup(&self, symbol: &str) -> Result<Option<Quote>>;
}
