pub mod bootstrap;

// Buy, sell, deposit and portfolio valuation
pub mod trading;

// Wiring of the whole application
pub mod system;
