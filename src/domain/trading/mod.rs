// Trade intents, quotes, input rules and portfolio valuation
pub mod money;
pub mod portfolio;
pub mod types;
