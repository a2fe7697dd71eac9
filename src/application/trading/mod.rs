pub mod engine;
pub mod valuation;

pub use engine::{TradingEngine, TradingEngineConfig};
pub use valuation::PortfolioValuationService;
