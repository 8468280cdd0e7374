pub mod dns;
pub mod engines;
pub mod repositories;
pub mod use_cases;

pub use dns::DnsServices;
pub use engines::{Engines, Queues};
pub use repositories::Repositories;
pub use use_cases::UseCases;

use anyhow::Context;
use ferrous_dsync_application::ports::{ZoneData, ZoneStore};
use ferrous_dsync_domain::Config;
use sqlx::SqlitePool;
use std::sync::Arc;

/// Everything a command needs, with the engines already running.
pub struct App {
    pub config: Config,
    pub repos: Repositories,
    pub dns: DnsServices,
    pub use_cases: UseCases,
    pub queues: Queues,
    pub engines: Engines,
}

impl App {
    /// Wires adapters, use cases and engines. The periodic delegation
    /// check only runs when `periodic_check` is set.
    pub async fn build(
        config: Config,
        pool: SqlitePool,
        periodic_check: bool,
    ) -> anyhow::Result<Self> {
        let repos = Repositories::new(pool, &config)?;
        let dns = DnsServices::new(&config);
        let (queues, receivers) = Queues::new(engines::QUEUE_CAPACITY);
        let use_cases = UseCases::new(&config, &repos, &dns, &queues)?;
        let engines = Engines::start(
            &config,
            &repos,
            &dns,
            &use_cases,
            &queues,
            receivers,
            periodic_check,
        )
        .await;

        Ok(Self {
            config,
            repos,
            dns,
            use_cases,
            queues,
            engines,
        })
    }

    pub fn zone(&self, name: &str) -> anyhow::Result<Arc<dyn ZoneData>> {
        self.repos
            .zones
            .get(name)
            .with_context(|| format!("zone {} is not configured", name))
    }

    pub async fn shutdown(self) {
        self.engines.shutdown().await;
    }
}
