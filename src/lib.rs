//! stockledger: cash ledger and trading engine for a paper stock portfolio.
//!
//! - `domain`: ledger types, invariants, errors and the store/price ports
//! - `application`: the trading engine, portfolio valuation and bootstrap
//! - `infrastructure`: SQLite and in-memory stores, price lookups, logging
//! - `config`: environment-driven configuration

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
