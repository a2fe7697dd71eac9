//! Observability configuration parsing from environment variables.
//!
//! `RUST_LOG`, when set, takes precedence over `LOG_LEVEL`.

use super::{VarSource, parse_var};
use anyhow::Result;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Compact,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "compact" => Ok(LogFormat::Compact),
            _ => anyhow::bail!("Invalid LOG_FORMAT: {}. Must be 'pretty' or 'compact'", s),
        }
    }
}

/// Observability environment configuration
#[derive(Debug, Clone)]
pub struct ObservabilityEnvConfig {
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Default for ObservabilityEnvConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}

impl ObservabilityEnvConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(&|key| std::env::var(key).ok())
    }

    pub fn from_lookup(source: VarSource<'_>) -> Result<Self> {
        Ok(Self {
            log_level: source("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            log_format: parse_var(source, "LOG_FORMAT", LogFormat::Pretty)?,
        })
    }
}
