use crate::queues::DelegationSyncHandle;
use crate::requests::{DelegationSyncRequest, SyncCommand};
use ferrous_dsync_application::ports::{
    KeyStore, ZoneData, ZoneSigner, ZoneStore, ZoneUpdateRequest, ZoneUpdateResponse,
};
use ferrous_dsync_application::use_cases::{delegation_data_changed, dnskeys_changed};
use ferrous_dsync_domain::config::ZoneOption;
use ferrous_dsync_domain::{DomainError, KeyState, RecordType, ResourceRecord};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Single writer for zone contents. Applies queued updates, bumps the SOA
/// serial, re-signs what changed and tells the delegation syncher when
/// the delegation or the DNSKEY RRset moved.
pub struct ZoneUpdaterJob {
    zones: Arc<dyn ZoneStore>,
    keys: Arc<dyn KeyStore>,
    signer: Arc<dyn ZoneSigner>,
    syncher: Option<DelegationSyncHandle>,
    rx: mpsc::Receiver<ZoneUpdateRequest>,
    shutdown: CancellationToken,
}

impl ZoneUpdaterJob {
    pub fn new(
        zones: Arc<dyn ZoneStore>,
        keys: Arc<dyn KeyStore>,
        signer: Arc<dyn ZoneSigner>,
        rx: mpsc::Receiver<ZoneUpdateRequest>,
    ) -> Self {
        Self {
            zones,
            keys,
            signer,
            syncher: None,
            rx,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn with_syncher(mut self, syncher: DelegationSyncHandle) -> Self {
        self.syncher = Some(syncher);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    pub fn start(mut self) -> JoinHandle<()> {
        info!("Starting zone updater");
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = self.shutdown.cancelled() => {
                        info!("ZoneUpdaterJob: shutting down");
                        break;
                    }
                    request = self.rx.recv() => {
                        let Some(request) = request else {
                            info!("ZoneUpdaterJob: queue closed");
                            break;
                        };
                        let zone = request.zone_name.clone();
                        if AssertUnwindSafe(self.handle(request)).catch_unwind().await.is_err() {
                            error!(zone = %zone, "Zone update handler panicked");
                        }
                    }
                }
            }
        })
    }

    async fn handle(&self, mut request: ZoneUpdateRequest) {
        let reply = request.response.take();
        let response = match self
            .apply(&request.zone_name, &request.actions, request.internal_update)
            .await
        {
            Ok(response) => response,
            Err(e) => {
                error!(zone = %request.zone_name, error = %e, "Zone update failed");
                ZoneUpdateResponse {
                    error: true,
                    error_msg: e.to_string(),
                    ..Default::default()
                }
            }
        };
        if let Some(reply) = reply {
            let _ = reply.send(response);
        }
    }

    /// Applies `actions` to `zone_name` and runs the follow-up work.
    pub async fn apply(
        &self,
        zone_name: &str,
        actions: &[ResourceRecord],
        internal: bool,
    ) -> Result<ZoneUpdateResponse, DomainError> {
        let zone = self
            .zones
            .get(zone_name)
            .ok_or_else(|| DomainError::ZoneNotFound(zone_name.to_string()))?;

        if !internal {
            check_child_policy(zone.as_ref(), actions)?;
        }

        let before = zone.snapshot();
        let changed = zone.apply_actions(actions)?;
        if changed.is_empty() {
            debug!(zone = %zone.name(), internal, "Update changed nothing");
            return Ok(ZoneUpdateResponse {
                serial: zone.soa_serial(),
                ..Default::default()
            });
        }

        let serial = zone.bump_serial()?;
        info!(zone = %zone.name(), serial, rrsets = changed.len(), internal, "Zone updated");

        if zone.has_option(ZoneOption::OnlineSigning) {
            self.resign(zone.as_ref(), &changed).await;
        }
        self.trigger_sync(before.as_ref(), &zone);

        Ok(ZoneUpdateResponse {
            changed: true,
            serial: Some(serial),
            ..Default::default()
        })
    }

    /// Signs every changed RRset plus the apex SOA. Deleted RRsets have
    /// nothing left to sign.
    async fn resign(&self, zone: &dyn ZoneData, changed: &[(String, RecordType)]) {
        let keys = match self.keys.get_dnssec_keys(zone.name(), KeyState::Active).await {
            Ok(keys) => keys,
            Err(e) => {
                warn!(zone = %zone.name(), error = %e, "Online signing skipped");
                return;
            }
        };
        let apex_soa = (zone.name().to_string(), RecordType::SOA);
        for (owner, rtype) in changed.iter().chain(std::iter::once(&apex_soa)) {
            let Some(rrset) = zone.get_rrset(owner, *rtype) else {
                continue;
            };
            match self.signer.sign_rrset(zone.name(), &rrset, &keys) {
                Ok(rrsigs) => zone.set_rrsigs(owner, *rtype, rrsigs),
                Err(e) => warn!(zone = %zone.name(), owner = %owner, rtype = %rtype, error = %e, "Signing failed"),
            }
        }
    }

    fn trigger_sync(&self, before: &dyn ZoneData, zone: &Arc<dyn ZoneData>) {
        let Some(syncher) = &self.syncher else {
            return;
        };
        let child = zone.has_option(ZoneOption::DelegationSyncChild);
        let name = zone.name();

        if child {
            let status = delegation_data_changed(before, zone.as_ref());
            if status.has_delegation_changes() {
                info!(zone = %name, changes = %status.summary(), "Delegation changed, syncing with parent");
                syncher.try_submit(
                    DelegationSyncRequest::new(SyncCommand::SyncDelegation, name)
                        .with_status(status),
                );
            }
        }

        if (child || zone.has_option(ZoneOption::MultiSigner))
            && dnskeys_changed(before, zone.as_ref()).differs()
        {
            info!(zone = %name, "DNSKEY RRset changed");
            syncher.try_submit(DelegationSyncRequest::new(
                SyncCommand::SyncDnskeyRrset,
                name,
            ));
        }
    }
}

/// External updates may only touch delegations below the apex when the
/// zone accepts child updates.
fn check_child_policy(zone: &dyn ZoneData, actions: &[ResourceRecord]) -> Result<(), DomainError> {
    if zone.has_option(ZoneOption::AllowChildUpdates) {
        return Ok(());
    }
    let below_cut = actions.iter().find(|rr| {
        rr.name != zone.name()
            && (rr.record_type() == RecordType::NS || zone.find_delegation(&rr.name).is_some())
    });
    match below_cut {
        Some(rr) => Err(DomainError::ZoneUpdateFailed {
            zone: zone.name().to_string(),
            reason: format!(
                "{} is delegation data and the zone does not have the {} option",
                rr.name,
                ZoneOption::AllowChildUpdates
            ),
        }),
        None => Ok(()),
    }
}
