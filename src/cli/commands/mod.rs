pub mod company;
pub mod migrate;
pub mod serve;

use std::sync::Arc;

use crate::config::AppConfig;
use crate::database::{DatabaseManager, TransactionalStore};

/// Connect to Postgres, applying migrations first when configured to
pub async fn connect_store(
    config: &AppConfig,
) -> anyhow::Result<(DatabaseManager, Arc<dyn TransactionalStore>)> {
    let manager = DatabaseManager::connect(&config.database).await?;
    if config.database.run_migrations {
        manager.migrate().await?;
    }
    let store: Arc<dyn TransactionalStore> = Arc::new(manager.store());
    Ok((manager, store))
}
