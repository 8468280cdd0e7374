use ferrous_dsync_domain::{
    Algorithm, DomainError, KeyState, PrivateKeyCache, RecordType, ResourceRecord,
    Sig0ActiveKeys, SyncScheme, UpdateMessage,
};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{info, instrument, warn};

use super::{settle_sig0_key, stage_sig0_key};
use crate::ports::{DnsMessenger, KeyStore, ZoneData, ZoneUpdateQueue, ZoneUpdateRequest};
use crate::services::{create_update, replace_rrset_actions};
use crate::use_cases::dsync::DsyncDiscoveryUseCase;
use crate::use_cases::{await_reply, finish_tx};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RolloverAction {
    /// Only introduce the new key to the parent.
    Add,
    /// Introduce the new key (unless already published) and remove the
    /// old one.
    Complete,
}

impl FromStr for RolloverAction {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "add" => Ok(RolloverAction::Add),
            "complete" => Ok(RolloverAction::Complete),
            other => Err(DomainError::Configuration(format!(
                "unknown rollover action '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RolloverOutcome {
    pub old_key_id: u16,
    pub new_key_id: u16,
    pub completed: bool,
}

/// Replaces the zone's active SIG(0) key at the parent without ever
/// leaving the parent with no trusted key.
pub struct RolloverSig0KeyUseCase {
    messenger: Arc<dyn DnsMessenger>,
    keys: Arc<dyn KeyStore>,
    dsync: Arc<DsyncDiscoveryUseCase>,
    zone_updates: Arc<dyn ZoneUpdateQueue>,
    algorithm: Algorithm,
    reply_timeout: Duration,
}

impl RolloverSig0KeyUseCase {
    pub fn new(
        messenger: Arc<dyn DnsMessenger>,
        keys: Arc<dyn KeyStore>,
        dsync: Arc<DsyncDiscoveryUseCase>,
        zone_updates: Arc<dyn ZoneUpdateQueue>,
        algorithm: Algorithm,
        reply_timeout: Duration,
    ) -> Self {
        Self {
            messenger,
            keys,
            dsync,
            zone_updates,
            algorithm,
            reply_timeout,
        }
    }

    /// Two phases:
    ///
    /// 1. Generate a key, UPDATE-add its KEY signed by the old key, mark
    ///    it `published`. Skipped when a `published` key already exists.
    /// 2. UPDATE-remove the old KEY signed by the new key, then make the
    ///    new key `active` and the old one `retired` and republish the
    ///    zone's KEY RRset.
    ///
    /// `RolloverAction::Add` stops after phase 1.
    ///
    /// # Errors
    ///
    /// * `DomainError::NoActiveKey` - if the zone has no active key to roll
    /// * `DomainError::RolloverIncomplete` - if phase 2 failed; the old key
    ///   is still active and a later `Complete` retries phase 2 only
    #[instrument(skip(self, zone), fields(zone = %zone.name()))]
    pub async fn execute(
        &self,
        zone: &dyn ZoneData,
        action: RolloverAction,
    ) -> Result<RolloverOutcome, DomainError> {
        let name = zone.name().to_string();
        let parent = self.dsync.resolve_parent(zone).await?;

        let active = self.keys.get_sig0_keys(&name, KeyState::Active).await?;
        let old = active
            .keys
            .first()
            .cloned()
            .ok_or_else(|| DomainError::NoActiveKey {
                zone: name.clone(),
                kind: "SIG(0)",
            })?;

        let target = self
            .dsync
            .lookup_target(&name, RecordType::ANY, SyncScheme::Update)
            .await?;

        let published = self.keys.get_sig0_keys(&name, KeyState::Published).await?;
        let new = match published.keys.first() {
            Some(key) => {
                info!(key_id = key.key_id, "Reusing published key");
                Arc::clone(key)
            }
            None => {
                self.introduce_new_key(&name, &parent, &old, &target.addresses)
                    .await?
            }
        };

        if action == RolloverAction::Add {
            info!(old_key_id = old.key_id, new_key_id = new.key_id, "New SIG(0) key added at parent");
            return Ok(RolloverOutcome {
                old_key_id: old.key_id,
                new_key_id: new.key_id,
                completed: false,
            });
        }

        let remove = create_update(&parent, &name, &[], std::slice::from_ref(&old.key_rr));
        if let Err(e) = self.send(&remove, &new, &target.addresses).await {
            warn!(old_key_id = old.key_id, new_key_id = new.key_id, error = %e, "Removing old KEY at parent failed");
            return Err(DomainError::RolloverIncomplete {
                zone: name,
                old_key_id: old.key_id,
                new_key_id: new.key_id,
                reason: e.to_string(),
            });
        }

        let mut tx = self.keys.begin().await?;
        let result = async {
            tx.set_sig0_key_state(&name, new.key_id, KeyState::Active)
                .await?;
            tx.set_sig0_key_state(&name, old.key_id, KeyState::Retired)
                .await
        }
        .await;
        finish_tx(tx, result).await?;

        self.republish(&name, new.key_rr.clone()).await?;

        info!(old_key_id = old.key_id, new_key_id = new.key_id, "SIG(0) rollover completed");
        Ok(RolloverOutcome {
            old_key_id: old.key_id,
            new_key_id: new.key_id,
            completed: true,
        })
    }

    /// Phase 1. The generated key is staged as `created` while the UPDATE
    /// is in flight and becomes `published` once the parent accepted it.
    async fn introduce_new_key(
        &self,
        zone: &str,
        parent: &str,
        old: &Arc<PrivateKeyCache>,
        targets: &[String],
    ) -> Result<Arc<PrivateKeyCache>, DomainError> {
        let new = stage_sig0_key(self.keys.as_ref(), zone, self.algorithm, "rollover").await?;
        let add = create_update(parent, zone, std::slice::from_ref(&new.key_rr), &[]);
        let sent = self.send(&add, old, targets).await;
        settle_sig0_key(self.keys.as_ref(), zone, new.key_id, KeyState::Published, sent).await?;
        info!(zone = %zone, key_id = new.key_id, "New SIG(0) key published at parent");
        Ok(new)
    }

    async fn send(
        &self,
        msg: &UpdateMessage,
        signer: &Arc<PrivateKeyCache>,
        targets: &[String],
    ) -> Result<(), DomainError> {
        let keys = Sig0ActiveKeys {
            keys: vec![Arc::clone(signer)],
        };
        self.messenger.send_update(msg, &keys, targets).await?;
        Ok(())
    }

    /// Replaces the apex KEY RRset with the new key.
    async fn republish(&self, zone: &str, key_rr: ResourceRecord) -> Result<(), DomainError> {
        let (tx, rx) = oneshot::channel();
        let mut request =
            ZoneUpdateRequest::internal(zone, replace_rrset_actions(zone, RecordType::KEY, vec![key_rr]));
        request.response = Some(tx);
        self.zone_updates.submit(request).await?;
        let reply = await_reply(rx, self.reply_timeout, "zone updater").await?;
        if reply.error {
            return Err(DomainError::ZoneUpdateFailed {
                zone: zone.to_string(),
                reason: reply.error_msg,
            });
        }
        Ok(())
    }
}
