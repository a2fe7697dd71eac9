//! Configuration module for stockledger.
//!
//! Structured configuration loaded from environment variables, organized by
//! concern: Database, Quotes, Ledger, and Observability. Every sub-config can
//! also be built from an arbitrary key lookup, which keeps tests away from the
//! process environment.

mod database_config;
mod ledger_config;
mod observability_config;
mod quote_config;

pub use database_config::DatabaseEnvConfig;
pub use ledger_config::LedgerEnvConfig;
pub use observability_config::{LogFormat, ObservabilityEnvConfig};
pub use quote_config::{QuoteEnvConfig, QuoteMode};

use anyhow::{Context, Result};
use std::env;
use std::fmt::Display;
use std::str::FromStr;

/// Key lookup used to read configuration values
pub type VarSource<'a> = &'a dyn Fn(&str) -> Option<String>;

/// Reads `key` and parses it, falling back to `default` when the key is unset.
/// A present but malformed value is an error.
pub(crate) fn parse_var<T>(source: VarSource<'_>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match source(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{}", e))
            .context(format!("Failed to parse {}={}", key, raw)),
        _ => Ok(default),
    }
}

/// Main application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub database: DatabaseEnvConfig,
    pub quotes: QuoteEnvConfig,
    pub ledger: LedgerEnvConfig,
    pub observability: ObservabilityEnvConfig,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(&|key| env::var(key).ok())
    }

    pub fn from_lookup(source: VarSource<'_>) -> Result<Self> {
        Ok(Self {
            database: DatabaseEnvConfig::from_lookup(source)
                .context("Failed to load database config")?,
            quotes: QuoteEnvConfig::from_lookup(source).context("Failed to load quote config")?,
            ledger: LedgerEnvConfig::from_lookup(source).context("Failed to load ledger config")?,
            observability: ObservabilityEnvConfig::from_lookup(source)
                .context("Failed to load observability config")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    fn source(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::from_lookup(&source(&[])).expect("Should parse with defaults");
        assert_eq!(config.database.url, "sqlite://data/stockledger.db");
        assert_eq!(config.quotes.mode, QuoteMode::Mock);
        assert_eq!(config.ledger.initial_cash, dec!(10000));
        assert_eq!(config.ledger.cash_scale, 2);
    }

    #[test]
    fn test_malformed_value_is_an_error() {
        let err = Config::from_lookup(&source(&[("STORAGE_TIMEOUT_MS", "soon")])).unwrap_err();
        assert!(format!("{:#}", err).contains("STORAGE_TIMEOUT_MS"));
    }

    #[test]
    fn test_iex_mode_requires_api_key() {
        assert!(Config::from_lookup(&source(&[("QUOTE_MODE", "iex")])).is_err());

        let config =
            Config::from_lookup(&source(&[("QUOTE_MODE", "iex"), ("API_KEY", "pk_live")])).unwrap();
        assert_eq!(config.quotes.mode, QuoteMode::Iex);
        assert_eq!(config.quotes.api_key.as_deref(), Some("pk_live"));
    }
}
