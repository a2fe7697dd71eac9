use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

use crate::config::DatabaseEnvConfig;
use crate::domain::repositories::LedgerStore;
use crate::infrastructure::persistence::database::Database;
use crate::infrastructure::persistence::ledger_repository::SqliteLedgerStore;

pub struct PersistenceHandle {
    pub db: Database,
    pub ledger: Arc<dyn LedgerStore>,
}

pub struct PersistenceBootstrap;

impl PersistenceBootstrap {
    pub async fn init(config: &DatabaseEnvConfig) -> Result<PersistenceHandle> {
        info!("Initializing Database at {}", config.url);

        let db = Database::new(&config.url, config.max_connections)
            .await
            .context("Failed to initialize database")?;

        let ledger = SqliteLedgerStore::new(db.clone())
            .with_operation_timeout(config.storage_timeout)
            .with_max_commit_attempts(config.commit_max_attempts);

        Ok(PersistenceHandle {
            db,
            ledger: Arc::new(ledger),
        })
    }
}
