//! stockledger server - headless ledger engine
//!
//! Opens the ledger database, wires the configured price source into the
//! trading engine and stays up until Ctrl+C.
//!
//! # Usage
//! ```sh
//! DATABASE_URL=sqlite://data/stockledger.db QUOTE_MODE=mock cargo run --bin server
//! ```
//!
//! # Environment Variables
//! - `DATABASE_URL` - SQLite database (default: sqlite://data/stockledger.db)
//! - `QUOTE_MODE` - `mock` or `iex` (default: mock); `iex` requires `API_KEY`
//! - `LOG_LEVEL` / `RUST_LOG` - log filter (default: info)
//! - `LOG_FORMAT` - `pretty` or `compact` (default: pretty)

use anyhow::Result;
use stockledger::application::system::Application;
use stockledger::config::Config;
use stockledger::infrastructure::observability::init_tracing;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    init_tracing(&config.observability)?;

    info!("stockledger {} starting...", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration loaded: Database={}, Quotes={:?}, Opening cash=${}",
        config.database.url, config.quotes.mode, config.ledger.initial_cash
    );

    let app = Application::build(config).await?;
    info!(
        "Ledger ready (cash scale {}). Press Ctrl+C to shutdown.",
        app.engine.config().cash_scale
    );

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received. Closing database...");
    app.persistence.db.pool.close().await;

    Ok(())
}
