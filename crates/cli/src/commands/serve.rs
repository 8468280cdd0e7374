use crate::di::App;
use ferrous_dsync_application::ports::{ZoneData, ZoneStore};
use ferrous_dsync_domain::config::ZoneOption;
use ferrous_dsync_jobs::{DelegationSyncRequest, SyncCommand};
use tracing::info;

/// Queues a setup run for every child zone, then runs the engines until
/// Ctrl+C.
pub async fn run(app: App) -> anyhow::Result<()> {
    for name in app.repos.zones.names() {
        let zone = app.zone(&name)?;
        if zone.has_option(ZoneOption::DelegationSyncChild) {
            app.queues
                .syncher
                .submit(DelegationSyncRequest::new(SyncCommand::Setup, &name))
                .await?;
        }
    }

    info!("Engines running, press Ctrl+C to stop");
    tokio::signal::ctrl_c().await?;

    info!("Shutting down");
    app.shutdown().await;
    Ok(())
}
