use ferrous_dsync_domain::{
    Algorithm, DomainError, KeyState, PrivateKeyCache, RecordType, Sig0ActiveKeys, SyncScheme,
    UpdateResult,
};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::{settle_sig0_key, stage_sig0_key};
use crate::ports::{DnsMessenger, KeyStore, ZoneData};
use crate::services::create_update;
use crate::use_cases::dsync::DsyncDiscoveryUseCase;

/// Introduces the zone's SIG(0) key to the parent with a self-signed
/// UPDATE (RFC 9615 style bootstrap).
pub struct BootstrapSig0KeyUseCase {
    messenger: Arc<dyn DnsMessenger>,
    keys: Arc<dyn KeyStore>,
    dsync: Arc<DsyncDiscoveryUseCase>,
    algorithm: Algorithm,
}

#[derive(Debug, Clone)]
pub struct BootstrapOutcome {
    pub parent: String,
    pub key_id: u16,
    pub generated: bool,
    pub result: UpdateResult,
}

impl BootstrapSig0KeyUseCase {
    pub fn new(
        messenger: Arc<dyn DnsMessenger>,
        keys: Arc<dyn KeyStore>,
        dsync: Arc<DsyncDiscoveryUseCase>,
        algorithm: Algorithm,
    ) -> Self {
        Self {
            messenger,
            keys,
            dsync,
            algorithm,
        }
    }

    /// Sends the zone's KEY RR to the parent's UPDATE target, signed by
    /// that same key.
    ///
    /// A key generated here is staged as `created` and only becomes
    /// `active` once the parent accepted it; a refused bootstrap drops it
    /// again. No key store transaction is open while the UPDATE is in
    /// flight.
    ///
    /// # Errors
    ///
    /// * `DomainError::NoDsyncTarget` - if the parent advertises no UPDATE
    ///   target
    /// * `DomainError::AllTargetsFailed` - if no target accepted the UPDATE
    #[instrument(skip(self, zone), fields(zone = %zone.name()))]
    pub async fn execute(&self, zone: &dyn ZoneData) -> Result<BootstrapOutcome, DomainError> {
        let name = zone.name().to_string();
        let parent = self.dsync.resolve_parent(zone).await?;

        let active = self.keys.get_sig0_keys(&name, KeyState::Active).await?;
        let (key, generated) = match active.keys.first() {
            Some(key) => (Arc::clone(key), false),
            None => (
                stage_sig0_key(self.keys.as_ref(), &name, self.algorithm, "bootstrap").await?,
                true,
            ),
        };

        let sent = self.send_key(&name, &parent, Arc::clone(&key)).await;
        let result = if generated {
            settle_sig0_key(self.keys.as_ref(), &name, key.key_id, KeyState::Active, sent).await?
        } else {
            sent?
        };

        info!(parent = %parent, key_id = key.key_id, generated, "SIG(0) key bootstrapped with parent");
        Ok(BootstrapOutcome {
            parent,
            key_id: key.key_id,
            generated,
            result,
        })
    }

    async fn send_key(
        &self,
        zone: &str,
        parent: &str,
        key: Arc<PrivateKeyCache>,
    ) -> Result<UpdateResult, DomainError> {
        let target = self
            .dsync
            .lookup_target(zone, RecordType::ANY, SyncScheme::Update)
            .await?;
        let msg = create_update(parent, zone, std::slice::from_ref(&key.key_rr), &[]);
        let signers = Sig0ActiveKeys { keys: vec![key] };
        self.messenger
            .send_update(&msg, &signers, &target.addresses)
            .await
            .inspect_err(|e| warn!(zone = %zone, target = %target.name, error = %e, "Bootstrap UPDATE failed"))
    }
}
