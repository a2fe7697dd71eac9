//! Ledger configuration: opening balance and cash precision.

use super::{VarSource, parse_var};
use crate::domain::trading::money::DEFAULT_CASH_SCALE;
use anyhow::Result;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

#[derive(Debug, Clone)]
pub struct LedgerEnvConfig {
    /// Cash credited to a newly registered user
    pub initial_cash: Decimal,
    /// Fractional digits accepted on deposits
    pub cash_scale: u32,
}

impl Default for LedgerEnvConfig {
    fn default() -> Self {
        Self {
            initial_cash: dec!(10000),
            cash_scale: DEFAULT_CASH_SCALE,
        }
    }
}

impl LedgerEnvConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(&|key| std::env::var(key).ok())
    }

    pub fn from_lookup(source: VarSource<'_>) -> Result<Self> {
        let defaults = Self::default();
        let initial_cash = parse_var(source, "INITIAL_CASH", defaults.initial_cash)?;
        if initial_cash < Decimal::ZERO {
            anyhow::bail!("INITIAL_CASH must not be negative, got {}", initial_cash);
        }
        let cash_scale = parse_var(source, "CASH_SCALE", defaults.cash_scale)?;
        if cash_scale > 8 {
            anyhow::bail!("CASH_SCALE must be at most 8, got {}", cash_scale);
        }

        Ok(Self {
            initial_cash,
            cash_scale,
        })
    }
}
