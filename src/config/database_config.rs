//! Database configuration parsing from environment variables.

use super::{VarSource, parse_var};
use anyhow::Result;
use std::time::Duration;

/// Database environment configuration
#[derive(Debug, Clone)]
pub struct DatabaseEnvConfig {
    pub url: String,
    pub max_connections: u32,
    /// Upper bound for any single ledger store operation
    pub storage_timeout: Duration,
    /// Compare-and-swap attempts before a commit gives up
    pub commit_max_attempts: u32,
}

impl Default for DatabaseEnvConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://data/stockledger.db".to_string(),
            max_connections: 5,
            storage_timeout: Duration::from_millis(5000),
            commit_max_attempts: 3,
        }
    }
}

impl DatabaseEnvConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(&|key| std::env::var(key).ok())
    }

    pub fn from_lookup(source: VarSource<'_>) -> Result<Self> {
        let defaults = Self::default();
        let timeout_ms = parse_var(source, "STORAGE_TIMEOUT_MS", 5000u64)?;
        let commit_max_attempts = parse_var(source, "COMMIT_MAX_ATTEMPTS", defaults.commit_max_attempts)?;
        if commit_max_attempts == 0 {
            anyhow::bail!("COMMIT_MAX_ATTEMPTS must be at least 1");
        }

        Ok(Self {
            url: source("DATABASE_URL").unwrap_or(defaults.url),
            max_connections: parse_var(source, "DATABASE_MAX_CONNECTIONS", defaults.max_connections)?,
            storage_timeout: Duration::from_millis(timeout_ms),
            commit_max_attempts,
        })
    }
}
