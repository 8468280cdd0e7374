use ferrous_dsync_domain::{
    Algorithm, DomainError, KeyState, RecordClass, RecordData, RecordType, ResourceRecord,
    Sig0ActiveKeys,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{info, instrument, warn};

use crate::ports::{KeyStore, ZoneData, ZoneUpdateQueue, ZoneUpdateRequest};
use crate::use_cases::{await_reply, finish_tx};

/// Makes sure the zone publishes the KEY RR of its active SIG(0) key.
pub struct PublishSig0KeyUseCase {
    keys: Arc<dyn KeyStore>,
    zone_updates: Arc<dyn ZoneUpdateQueue>,
    algorithm: Algorithm,
    reply_timeout: Duration,
}

impl PublishSig0KeyUseCase {
    pub fn new(
        keys: Arc<dyn KeyStore>,
        zone_updates: Arc<dyn ZoneUpdateQueue>,
        algorithm: Algorithm,
        reply_timeout: Duration,
    ) -> Self {
        Self {
            keys,
            zone_updates,
            algorithm,
            reply_timeout,
        }
    }

    /// Generates an active key when the zone has none, then reconciles the
    /// apex KEY RRset: published keys the store does not know (neither
    /// active nor published) are removed, missing active keys are added.
    ///
    /// Returns `true` if the zone was changed.
    #[instrument(skip(self, zone), fields(zone = %zone.name()))]
    pub async fn execute(&self, zone: &dyn ZoneData) -> Result<bool, DomainError> {
        let name = zone.name().to_string();
        let active = self.ensure_active_key(&name).await?;

        // Matched on the full rdata: two keys may share a tag.
        let mut known: Vec<RecordData> = Vec::new();
        for state in [KeyState::Active, KeyState::Published] {
            for key in self.keys.get_sig0_keys(&name, state).await?.keys {
                known.push(key.key_rr.data.clone());
            }
        }

        let published = zone
            .apex_rrset(RecordType::KEY)
            .map(|rrset| rrset.records)
            .unwrap_or_default();

        let mut actions: Vec<ResourceRecord> = Vec::new();
        for rr in &published {
            let Some(key) = rr.data.as_key() else {
                continue;
            };
            if !known.contains(&rr.data) {
                warn!(
                    key_id = key.key_tag(),
                    "Published KEY has no private key in the store, removing"
                );
                actions.push(rr.as_delete());
            }
        }
        for key in &active.keys {
            let mut key_rr = key.key_rr.clone();
            key_rr.class = RecordClass::IN;
            if !published.iter().any(|rr| rr.is_duplicate(&key_rr)) {
                actions.push(key_rr);
            }
        }

        if actions.is_empty() {
            info!("SIG(0) KEY already published");
            return Ok(false);
        }

        let (tx, rx) = oneshot::channel();
        let mut request = ZoneUpdateRequest::internal(&name, actions);
        request.response = Some(tx);
        self.zone_updates.submit(request).await?;
        let reply = await_reply(rx, self.reply_timeout, "zone updater").await?;
        if reply.error {
            return Err(DomainError::ZoneUpdateFailed {
                zone: name,
                reason: reply.error_msg,
            });
        }
        info!(serial = ?reply.serial, "SIG(0) KEY RRset published");
        Ok(reply.changed)
    }

    async fn ensure_active_key(&self, zone: &str) -> Result<Sig0ActiveKeys, DomainError> {
        let active = self.keys.get_sig0_keys(zone, KeyState::Active).await?;
        if !active.is_empty() {
            return Ok(active);
        }

        let mut tx = self.keys.begin().await?;
        let result = tx
            .generate_sig0_key(zone, self.algorithm, KeyState::Active, "publish")
            .await;
        let record = finish_tx(tx, result).await?;
        info!(zone = %zone, key_id = record.key_id, "Generated SIG(0) key");

        self.keys.get_sig0_keys(zone, KeyState::Active).await
    }
}
