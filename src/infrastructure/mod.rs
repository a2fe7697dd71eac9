pub mod core;
pub mod mock;
pub mod observability;
pub mod persistence;
pub mod quotes;
pub mod repositories;

pub use mock::MockPriceLookup;
pub use persistence::{Database, SqliteLedgerStore};
pub use quotes::IexPriceLookup;
pub use repositories::InMemoryLedgerStore;
