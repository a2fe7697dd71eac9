// Append-only ledger: users, transactions, derived positions
pub mod ledger;

// Port interfaces
pub mod ports;

// Ledger store trait
pub mod repositories;

// Trade intents, quotes and portfolio valuation
pub mod trading;

// Domain-specific error types
pub mod errors;
