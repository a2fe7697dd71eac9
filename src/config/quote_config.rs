//! Price lookup configuration parsing from environment variables.

use super::{VarSource, parse_var};
use anyhow::Result;
use std::str::FromStr;
use std::time::Duration;

/// Which price source backs the trading engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteMode {
    Mock,
    Iex,
}

impl FromStr for QuoteMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mock" => Ok(QuoteMode::Mock),
            "iex" => Ok(QuoteMode::Iex),
            _ => anyhow::bail!("Invalid QUOTE_MODE: {}. Must be 'mock' or 'iex'", s),
        }
    }
}

#[derive(Debug, Clone)]
pub struct QuoteEnvConfig {
    pub mode: QuoteMode,
    pub api_key: Option<String>,
    pub base_url: String,
    pub request_timeout: Duration,
}

impl QuoteEnvConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(&|key| std::env::var(key).ok())
    }

    pub fn from_lookup(source: VarSource<'_>) -> Result<Self> {
        let mode = parse_var(source, "QUOTE_MODE", QuoteMode::Mock)?;
        let api_key = source("API_KEY").filter(|k| !k.trim().is_empty());

        if mode == QuoteMode::Iex && api_key.is_none() {
            anyhow::bail!("API_KEY not set (required when QUOTE_MODE=iex)");
        }

        Ok(Self {
            mode,
            api_key,
            base_url: source("QUOTE_BASE_URL")
                .unwrap_or_else(|| "https://cloud.iexapis.com/stable".to_string()),
            request_timeout: Duration::from_millis(parse_var(
                source,
                "QUOTE_TIMEOUT_MS",
                10_000u64,
            )?),
        })
    }
}
