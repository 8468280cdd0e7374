use ferrous_dsync_domain::config::ZoneOption;
use ferrous_dsync_domain::{
    DelegationSyncStatus, DomainError, DsyncTarget, KeyState, RecordType, ResourceRecord,
    SyncScheme,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{info, instrument, warn};

use super::changes::apex_records;
use crate::ports::{
    DnsMessenger, KeyStore, NotifyQueue, NotifyRequest, NotifyResponse, ZoneData,
    ZoneUpdateQueue, ZoneUpdateRequest, ZoneUpdateResponse,
};
use crate::services::{cds_records, create_update, csync_record, replace_rrset_actions};
use crate::use_cases::await_reply;
use crate::use_cases::dsync::DsyncDiscoveryUseCase;

/// TTL of the CSYNC and CDS records the child publishes.
pub const SYNC_RECORD_TTL: u32 = 120;

/// Pushes a delegation diff to the parent with the best scheme the parent
/// advertises.
pub struct SyncDelegationUseCase {
    messenger: Arc<dyn DnsMessenger>,
    keys: Arc<dyn KeyStore>,
    dsync: Arc<DsyncDiscoveryUseCase>,
    zone_updates: Arc<dyn ZoneUpdateQueue>,
    notifier: Arc<dyn NotifyQueue>,
    schemes: Vec<SyncScheme>,
    reply_timeout: Duration,
}

impl SyncDelegationUseCase {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        messenger: Arc<dyn DnsMessenger>,
        keys: Arc<dyn KeyStore>,
        dsync: Arc<DsyncDiscoveryUseCase>,
        zone_updates: Arc<dyn ZoneUpdateQueue>,
        notifier: Arc<dyn NotifyQueue>,
        schemes: Vec<SyncScheme>,
        reply_timeout: Duration,
    ) -> Self {
        Self {
            messenger,
            keys,
            dsync,
            zone_updates,
            notifier,
            schemes,
            reply_timeout,
        }
    }

    /// First scheme in the preference order that the parent advertises,
    /// with its resolved target.
    ///
    /// UPDATE targets are looked up for any type, NOTIFY targets for CSYNC.
    #[instrument(skip(self))]
    pub async fn best_sync_scheme(&self, zone: &str) -> Result<DsyncTarget, DomainError> {
        let lookup = self.dsync.discover(zone).await?;
        for scheme in &self.schemes {
            let rrtype = match scheme {
                SyncScheme::Update => RecordType::ANY,
                SyncScheme::Notify => RecordType::CSYNC,
                _ => continue,
            };
            if lookup.find(rrtype, *scheme).is_none() {
                continue;
            }
            match self.dsync.resolve_target(zone, &lookup, rrtype, *scheme).await {
                Ok(target) => return Ok(target),
                Err(e) => warn!(zone = %zone, scheme = %scheme, error = %e, "Scheme unusable"),
            }
        }
        Err(DomainError::NoDsyncTarget {
            zone: zone.to_string(),
            scheme: self
                .schemes
                .iter()
                .map(|s| s.to_string())
                .collect::<Vec<_>>()
                .join(","),
        })
    }

    /// Brings the parent in line with `status`.
    ///
    /// Transport failures are reported in the returned status rather than
    /// as an error, so callers can show the per-target diagnostics.
    #[instrument(skip(self, zone, status), fields(zone = %zone.name()))]
    pub async fn execute(
        &self,
        zone: Arc<dyn ZoneData>,
        mut status: DelegationSyncStatus,
    ) -> Result<DelegationSyncStatus, DomainError> {
        if !status.has_delegation_changes() {
            status.message = "delegation already in sync".to_string();
            return Ok(status);
        }

        let target = self.best_sync_scheme(zone.name()).await?;
        match target.scheme {
            SyncScheme::Update => self.sync_via_update(zone.as_ref(), status, &target).await,
            _ => self.sync_via_notify(zone, status, &target).await,
        }
    }

    async fn sync_via_update(
        &self,
        zone: &dyn ZoneData,
        mut status: DelegationSyncStatus,
        target: &DsyncTarget,
    ) -> Result<DelegationSyncStatus, DomainError> {
        let parent = match zone.parent() {
            Some(parent) => parent,
            None => self.dsync.resolve_parent(zone).await?,
        };
        let msg = create_update(&parent, zone.name(), &status.adds(), &status.removes());

        let keys = self.keys.get_sig0_keys(zone.name(), KeyState::Active).await?;
        if keys.is_empty() {
            return Err(DomainError::NoActiveKey {
                zone: zone.name().to_string(),
                kind: "SIG(0)",
            });
        }

        match self
            .messenger
            .send_update(&msg, &keys, &target.addresses)
            .await
        {
            Ok(result) => {
                status.rcode = result.rcode;
                status.message = format!(
                    "UPDATE with {} actions accepted by {}",
                    msg.actions.len(),
                    target.name
                );
                status.update_result = Some(result);
                info!(zone = %zone.name(), target = %target.name, "Delegation synced via UPDATE");
            }
            Err(DomainError::AllTargetsFailed { result, .. }) => {
                status.error = true;
                status.rcode = result.rcode;
                status.error_msg = format!("UPDATE failed: {}", result.failure_summary());
                warn!(zone = %zone.name(), error = %status.error_msg, "Delegation sync failed");
                status.update_result = Some(result);
            }
            Err(e) => return Err(e),
        }
        Ok(status)
    }

    /// Publishes CSYNC (and CDS when the DNSKEYs moved) and NOTIFYs the
    /// parent's target.
    async fn sync_via_notify(
        &self,
        zone: Arc<dyn ZoneData>,
        mut status: DelegationSyncStatus,
        target: &DsyncTarget,
    ) -> Result<DelegationSyncStatus, DomainError> {
        let name = zone.name().to_string();
        let serial = zone.soa_serial().unwrap_or(0);
        let mut actions = replace_rrset_actions(
            &name,
            RecordType::CSYNC,
            vec![csync_record(&name, serial, SYNC_RECORD_TTL)],
        );
        if status.has_dnskey_changes() {
            let cds = cds_records(
                &name,
                &apex_records(zone.as_ref(), RecordType::DNSKEY),
                SYNC_RECORD_TTL,
            )?;
            actions.extend(replace_rrset_actions(&name, RecordType::CDS, cds));
        }
        self.publish(&name, actions).await?;

        let reply = self
            .notify(&name, Some(zone), RecordType::CSYNC, target.addresses.clone())
            .await?;
        apply_notify_reply(&mut status, reply, &target.name);
        Ok(status)
    }

    /// Propagates a DNSKEY change: to the other signers of a multi-signer
    /// zone, otherwise to the parent as CDS.
    #[instrument(skip(self, zone), fields(zone = %zone.name()))]
    pub async fn sync_dnskey_rrset(
        &self,
        zone: Arc<dyn ZoneData>,
    ) -> Result<DelegationSyncStatus, DomainError> {
        let name = zone.name().to_string();
        let mut status = DelegationSyncStatus::new(&name, &zone.parent().unwrap_or_default());

        if zone.has_option(ZoneOption::MultiSigner) {
            let targets = zone.multisigner_targets();
            if targets.is_empty() {
                return Err(DomainError::Configuration(format!(
                    "zone {} is multi-signer but has no multisigner_targets",
                    name
                )));
            }
            let reply = self
                .notify(&name, Some(zone), RecordType::DNSKEY, targets)
                .await?;
            apply_notify_reply(&mut status, reply, "multi-signer peers");
            return Ok(status);
        }

        let dnskeys = apex_records(zone.as_ref(), RecordType::DNSKEY);
        let published = if dnskeys.is_empty() {
            info!("Zone has no DNSKEY, asking the parent to remove its DS");
            "delete CDS published"
        } else {
            "CDS published"
        };
        let cds = cds_records(&name, &dnskeys, SYNC_RECORD_TTL)?;
        self.publish(&name, replace_rrset_actions(&name, RecordType::CDS, cds))
            .await?;
        status.message = published.to_string();

        let lookup = match self.dsync.discover(&name).await {
            Ok(lookup) => lookup,
            Err(e) => {
                status.message = format!("{}; parent not notified: {}", published, e);
                return Ok(status);
            }
        };
        match self
            .dsync
            .resolve_target(&name, &lookup, RecordType::CDS, SyncScheme::Notify)
            .await
        {
            Ok(target) => {
                let reply = self
                    .notify(&name, Some(zone), RecordType::CDS, target.addresses.clone())
                    .await?;
                apply_notify_reply(&mut status, reply, &target.name);
            }
            Err(e) => {
                status.message = format!("{}; parent not notified: {}", published, e);
            }
        }
        Ok(status)
    }

    async fn publish(
        &self,
        zone: &str,
        actions: Vec<ResourceRecord>,
    ) -> Result<ZoneUpdateResponse, DomainError> {
        let (tx, rx) = oneshot::channel();
        let mut request = ZoneUpdateRequest::internal(zone, actions);
        request.response = Some(tx);
        self.zone_updates.submit(request).await?;
        let reply = await_reply(rx, self.reply_timeout, "zone updater").await?;
        if reply.error {
            return Err(DomainError::ZoneUpdateFailed {
                zone: zone.to_string(),
                reason: reply.error_msg,
            });
        }
        Ok(reply)
    }

    async fn notify(
        &self,
        zone: &str,
        data: Option<Arc<dyn ZoneData>>,
        rrtype: RecordType,
        targets: Vec<String>,
    ) -> Result<NotifyResponse, DomainError> {
        let (tx, rx) = oneshot::channel();
        self.notifier
            .submit(NotifyRequest {
                zone_name: zone.to_string(),
                zone: data,
                rrtype,
                targets,
                urgent: true,
                response: Some(tx),
            })
            .await?;
        await_reply(rx, self.reply_timeout, "notifier").await
    }
}

fn apply_notify_reply(status: &mut DelegationSyncStatus, reply: NotifyResponse, target: &str) {
    if let Some(result) = &reply.result {
        status.rcode = result.rcode;
    }
    status.update_result = reply.result;
    if reply.error {
        status.error = true;
        status.error_msg = format!("NOTIFY failed: {}", reply.error_msg);
    } else {
        status.message = format!("NOTIFY sent to {}", target);
    }
}
