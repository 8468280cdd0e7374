use crate::queues::DelegationSyncHandle;
use crate::requests::{DelegationSyncRequest, SyncCommand};
use ferrous_dsync_application::ports::ZoneStore;
use ferrous_dsync_domain::config::ZoneOption;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Periodically asks the syncher to reconcile every delegation-sync
/// child zone with its parent.
pub struct DelegationCheckJob {
    zones: Arc<dyn ZoneStore>,
    syncher: DelegationSyncHandle,
    interval_secs: u64,
    shutdown: CancellationToken,
}

impl DelegationCheckJob {
    pub fn new(zones: Arc<dyn ZoneStore>, syncher: DelegationSyncHandle) -> Self {
        Self {
            zones,
            syncher,
            interval_secs: 3600,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn with_interval(mut self, secs: u64) -> Self {
        self.interval_secs = secs.max(1);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    pub fn start(self: Arc<Self>) -> JoinHandle<()> {
        info!(interval_secs = self.interval_secs, "Starting delegation check job");
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs));
            // The first tick fires immediately; startup runs SETUP instead
            interval.tick().await;
            loop {
                tokio::select! {
                    _ = self.shutdown.cancelled() => {
                        info!("DelegationCheckJob: shutting down");
                        break;
                    }
                    _ = interval.tick() => {
                        let queued = self.run_once().await;
                        debug!(zones = queued, "Delegation check queued");
                    }
                }
            }
        })
    }

    /// Queues a sync for every child zone; returns how many were queued.
    pub async fn run_once(&self) -> usize {
        let mut queued = 0;
        for name in self.zones.names() {
            let Some(zone) = self.zones.get(&name) else {
                continue;
            };
            if !zone.has_option(ZoneOption::DelegationSyncChild) {
                continue;
            }
            match self
                .syncher
                .submit(DelegationSyncRequest::new(SyncCommand::SyncDelegation, &name))
                .await
            {
                Ok(()) => queued += 1,
                Err(e) => {
                    error!(zone = %name, error = %e, "Delegation check could not queue sync");
                    break;
                }
            }
        }
        queued
    }
}
