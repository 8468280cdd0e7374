use super::{DnsServices, Queues, Repositories};
use ferrous_dsync_application::ports::DnsMessenger;
use ferrous_dsync_application::use_cases::{
    AnalyseDelegationUseCase, BootstrapSig0KeyUseCase, DsyncDiscoveryUseCase, ManageKeysUseCase,
    PublishSig0KeyUseCase, RolloverSig0KeyUseCase, SyncDelegationUseCase,
};
use ferrous_dsync_domain::Config;
use std::sync::Arc;

pub struct UseCases {
    pub dsync: Arc<DsyncDiscoveryUseCase>,
    pub analyse: Arc<AnalyseDelegationUseCase>,
    pub sync: Arc<SyncDelegationUseCase>,
    pub publish: Arc<PublishSig0KeyUseCase>,
    pub bootstrap: Arc<BootstrapSig0KeyUseCase>,
    pub rollover: Arc<RolloverSig0KeyUseCase>,
    pub manage_keys: Arc<ManageKeysUseCase>,
}

impl UseCases {
    pub fn new(
        config: &Config,
        repos: &Repositories,
        dns: &DnsServices,
        queues: &Queues,
    ) -> anyhow::Result<Self> {
        let messenger: Arc<dyn DnsMessenger> = dns.messenger.clone();
        let algorithm = config.keygen.algorithm()?;
        let schemes = config.delegation_sync.scheme_preference()?;
        let reply_timeout = config.delegation_sync.reply_timeout();
        let resolver = config.resolver.address.as_str();

        let dsync = Arc::new(DsyncDiscoveryUseCase::new(messenger.clone(), resolver));

        Ok(Self {
            analyse: Arc::new(AnalyseDelegationUseCase::new(
                messenger.clone(),
                repos.zones.clone(),
                dsync.clone(),
                resolver,
            )),
            sync: Arc::new(SyncDelegationUseCase::new(
                messenger.clone(),
                repos.key_store.clone(),
                dsync.clone(),
                Arc::new(queues.zone_updates.clone()),
                Arc::new(queues.notify.clone()),
                schemes,
                reply_timeout,
            )),
            publish: Arc::new(PublishSig0KeyUseCase::new(
                repos.key_store.clone(),
                Arc::new(queues.zone_updates.clone()),
                algorithm,
                reply_timeout,
            )),
            bootstrap: Arc::new(BootstrapSig0KeyUseCase::new(
                messenger.clone(),
                repos.key_store.clone(),
                dsync.clone(),
                algorithm,
            )),
            rollover: Arc::new(RolloverSig0KeyUseCase::new(
                messenger,
                repos.key_store.clone(),
                dsync.clone(),
                Arc::new(queues.zone_updates.clone()),
                algorithm,
                reply_timeout,
            )),
            manage_keys: Arc::new(ManageKeysUseCase::new(repos.key_store.clone())),
            dsync,
        })
    }
}
