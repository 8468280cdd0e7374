use super::{DnsServices, Repositories, UseCases};
use ferrous_dsync_application::ports::{NotifyRequest, ZoneUpdateRequest};
use ferrous_dsync_domain::Config;
use ferrous_dsync_jobs::{
    delegation_sync_channel, key_lifecycle_channel, notify_channel, zone_update_channel,
    ChannelNotifyQueue, ChannelZoneUpdateQueue, DelegationCheckJob, DelegationSyncHandle,
    DelegationSyncRequest, DelegationSyncherJob, JobRunner, KeyBootstrapperJob,
    KeyLifecycleHandle, KeyLifecycleRequest, NotifierJob, ZoneUpdaterJob,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub const QUEUE_CAPACITY: usize = 64;

/// Sending sides of the engine queues.
pub struct Queues {
    pub zone_updates: ChannelZoneUpdateQueue,
    pub notify: ChannelNotifyQueue,
    pub syncher: DelegationSyncHandle,
    pub key_lifecycle: KeyLifecycleHandle,
}

/// Receiving sides, consumed by `Engines::start`.
pub struct Receivers {
    zone_updates: mpsc::Receiver<ZoneUpdateRequest>,
    notify: mpsc::Receiver<NotifyRequest>,
    syncher: mpsc::Receiver<DelegationSyncRequest>,
    key_lifecycle: mpsc::Receiver<KeyLifecycleRequest>,
}

impl Queues {
    pub fn new(capacity: usize) -> (Self, Receivers) {
        let (zone_updates, zone_updates_rx) = zone_update_channel(capacity);
        let (notify, notify_rx) = notify_channel(capacity);
        let (syncher, syncher_rx) = delegation_sync_channel(capacity);
        let (key_lifecycle, key_lifecycle_rx) = key_lifecycle_channel(capacity);
        (
            Self {
                zone_updates,
                notify,
                syncher,
                key_lifecycle,
            },
            Receivers {
                zone_updates: zone_updates_rx,
                notify: notify_rx,
                syncher: syncher_rx,
                key_lifecycle: key_lifecycle_rx,
            },
        )
    }
}

pub struct Engines {
    shutdown: CancellationToken,
    handles: Vec<JoinHandle<()>>,
}

impl Engines {
    pub async fn start(
        config: &Config,
        repos: &Repositories,
        dns: &DnsServices,
        use_cases: &UseCases,
        queues: &Queues,
        receivers: Receivers,
        periodic_check: bool,
    ) -> Self {
        let shutdown = CancellationToken::new();

        let zone_updater = ZoneUpdaterJob::new(
            repos.zones.clone(),
            repos.key_store.clone(),
            dns.signer.clone(),
            receivers.zone_updates,
        )
        .with_syncher(queues.syncher.clone())
        .with_cancellation(shutdown.clone());

        let notifier = NotifierJob::new(dns.messenger.clone(), receivers.notify)
            .with_min_interval(config.delegation_sync.notify_min_interval())
            .with_cancellation(shutdown.clone());

        let key_bootstrapper = KeyBootstrapperJob::new(
            repos.zones.clone(),
            use_cases.bootstrap.clone(),
            use_cases.rollover.clone(),
            receivers.key_lifecycle,
        )
        .with_cancellation(shutdown.clone());

        let syncher = DelegationSyncherJob::new(
            repos.zones.clone(),
            use_cases.analyse.clone(),
            use_cases.sync.clone(),
            use_cases.publish.clone(),
            queues.key_lifecycle.clone(),
            receivers.syncher,
        )
        .with_key_reply_timeout(config.delegation_sync.reply_timeout() * 2)
        .with_cancellation(shutdown.clone());

        let mut runner = JobRunner::new()
            .with_zone_updater(zone_updater)
            .with_notifier(notifier)
            .with_key_bootstrapper(key_bootstrapper)
            .with_delegation_syncher(syncher);

        let interval = config.delegation_sync.check_interval_secs;
        if periodic_check {
            if interval > 0 {
                runner = runner.with_delegation_check(
                    DelegationCheckJob::new(repos.zones.clone(), queues.syncher.clone())
                        .with_interval(interval)
                        .with_cancellation(shutdown.clone()),
                );
            } else {
                info!("Periodic delegation check disabled");
            }
        }

        let handles = runner.start().await;
        Self { shutdown, handles }
    }

    /// Cancels every engine and waits for them to stop.
    pub async fn shutdown(self) {
        self.shutdown.cancel();
        for handle in self.handles {
            if let Err(e) = handle.await {
                warn!(error = %e, "Engine task ended abnormally");
            }
        }
    }
}
