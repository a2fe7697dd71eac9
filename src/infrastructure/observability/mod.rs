//! Log output for stockledger.
//!
//! Everything is emitted through `tracing`; this module only installs the
//! subscriber. `RUST_LOG` wins over the configured default level.

use crate::config::{LogFormat, ObservabilityEnvConfig};
use anyhow::Result;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

pub fn env_filter(config: &ObservabilityEnvConfig) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&config.log_level)
            .map_err(|e| anyhow::anyhow!("Invalid LOG_LEVEL '{}': {}", config.log_level, e)),
    }
}

/// Installs the global subscriber. Call once, from the binary.
pub fn init_tracing(config: &ObservabilityEnvConfig) -> Result<()> {
    let filter = env_filter(config)?;

    match config.log_format {
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(false).pretty())
            .try_init()?,
        LogFormat::Compact => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(false).compact())
            .try_init()?,
    }

    Ok(())
}
