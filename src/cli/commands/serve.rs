use std::sync::Arc;

use clap::Args;
use tracing::{info, warn};

use crate::app::{router, AppState};
use crate::config::{AppConfig, Environment};
use crate::database::{MemoryStore, TransactionalStore};

#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    #[arg(long, help = "Keep all data in process memory instead of Postgres")]
    pub memory: bool,
}

pub async fn handle(args: ServeArgs, config: AppConfig) -> anyhow::Result<()> {
    info!("Starting PeopleOS API in {:?} mode", config.environment);

    let (manager, store) = if args.memory {
        if config.environment != Environment::Development {
            warn!("In-memory store selected outside development; data will not persist");
        }
        let store: Arc<dyn TransactionalStore> = Arc::new(MemoryStore::new());
        (None, store)
    } else {
        let (manager, store) = super::connect_store(&config).await?;
        (Some(manager), store)
    };

    let state = AppState::from_config(store, &config)?;
    let app = router(state, config.server.enable_cors);

    let bind_addr = config.server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| anyhow::anyhow!("failed to bind {}: {}", bind_addr, e))?;

    info!("PeopleOS API listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(manager) = manager {
        manager.close().await;
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
