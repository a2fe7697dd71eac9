pub mod iex;

pub use iex::IexPriceLookup;
