pub mod database;
pub mod ledger_repository;

pub use database::Database;
pub use ledger_repository::SqliteLedgerStore;
