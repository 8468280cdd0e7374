use ferrous_dsync_domain::config::DatabaseConfig;
use ferrous_dsync_infrastructure::database::create_pool;
use sqlx::SqlitePool;
use tracing::{error, info};

pub async fn init_database(cfg: &DatabaseConfig) -> anyhow::Result<SqlitePool> {
    let database_url = cfg.url();
    info!("Initializing key store: {}", database_url);

    let pool = create_pool(&database_url, cfg.max_connections)
        .await
        .map_err(|e| {
            error!("Failed to initialize key store: {}", e);
            anyhow::anyhow!(e)
        })?;

    info!(
        "Key store initialized successfully (max connections={})",
        cfg.max_connections
    );
    Ok(pool)
}
