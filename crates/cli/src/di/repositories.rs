use anyhow::Context;
use ferrous_dsync_application::ports::ZoneStore;
use ferrous_dsync_domain::Config;
use ferrous_dsync_infrastructure::repositories::SqliteKeyStore;
use ferrous_dsync_infrastructure::zone::{load_zone_file, MemoryZoneStore};
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::info;

pub struct Repositories {
    pub key_store: Arc<SqliteKeyStore>,
    pub zones: Arc<MemoryZoneStore>,
}

impl Repositories {
    pub fn new(pool: SqlitePool, config: &Config) -> anyhow::Result<Self> {
        let zones = MemoryZoneStore::new();
        for zone_config in &config.zones {
            let zone = load_zone_file(zone_config)
                .with_context(|| format!("failed to load zone {}", zone_config.name))?;
            zones.insert(Arc::new(zone));
        }
        info!(zones = zones.names().len(), "Repositories initialized");

        Ok(Self {
            key_store: Arc::new(SqliteKeyStore::new(pool)),
            zones: Arc::new(zones),
        })
    }
}
