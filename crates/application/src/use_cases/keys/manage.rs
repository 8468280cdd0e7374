use ferrous_dsync_domain::name::parse_fqdn;
use ferrous_dsync_domain::{
    Algorithm, DnssecKeyRecord, DomainError, KeyState, Sig0KeyRecord, TrustedKey,
};
use std::sync::Arc;
use tracing::{info, instrument};

use crate::ports::KeyStore;
use crate::use_cases::finish_tx;

/// Operator-facing key management. Every mutation runs in its own
/// transaction.
pub struct ManageKeysUseCase {
    keys: Arc<dyn KeyStore>,
}

impl ManageKeysUseCase {
    pub fn new(keys: Arc<dyn KeyStore>) -> Self {
        Self { keys }
    }

    pub async fn list_sig0(&self, zone: Option<&str>) -> Result<Vec<Sig0KeyRecord>, DomainError> {
        let zone = zone.map(parse_fqdn).transpose()?;
        self.keys.list_sig0_keys(zone.as_deref()).await
    }

    pub async fn list_dnssec(
        &self,
        zone: Option<&str>,
    ) -> Result<Vec<DnssecKeyRecord>, DomainError> {
        let zone = zone.map(parse_fqdn).transpose()?;
        self.keys.list_dnssec_keys(zone.as_deref()).await
    }

    pub async fn list_trusted(&self, zone: Option<&str>) -> Result<Vec<TrustedKey>, DomainError> {
        let zone = zone.map(parse_fqdn).transpose()?;
        self.keys.list_trusted_keys(zone.as_deref()).await
    }

    #[instrument(skip(self, record), fields(zone = %record.zone, key_id = record.key_id))]
    pub async fn add_sig0(&self, record: &Sig0KeyRecord) -> Result<(), DomainError> {
        let mut tx = self.keys.begin().await?;
        let result = tx.add_sig0_key(record).await;
        finish_tx(tx, result).await?;
        info!("SIG(0) key imported");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn generate_sig0(
        &self,
        zone: &str,
        algorithm: Algorithm,
        state: KeyState,
        creator: &str,
    ) -> Result<Sig0KeyRecord, DomainError> {
        let zone = parse_fqdn(zone)?;
        let mut tx = self.keys.begin().await?;
        let result = tx.generate_sig0_key(&zone, algorithm, state, creator).await;
        let record = finish_tx(tx, result).await?;
        info!(key_id = record.key_id, "SIG(0) key generated");
        Ok(record)
    }

    /// Returns the number of rows changed; 0 when the key is missing or
    /// already in `state`.
    #[instrument(skip(self))]
    pub async fn set_sig0_state(
        &self,
        zone: &str,
        key_id: u16,
        state: KeyState,
    ) -> Result<u64, DomainError> {
        let zone = parse_fqdn(zone)?;
        let mut tx = self.keys.begin().await?;
        let result = tx.set_sig0_key_state(&zone, key_id, state).await;
        finish_tx(tx, result).await
    }

    #[instrument(skip(self))]
    pub async fn delete_sig0(&self, zone: &str, key_id: u16) -> Result<u64, DomainError> {
        let zone = parse_fqdn(zone)?;
        let mut tx = self.keys.begin().await?;
        let result = tx.delete_sig0_key(&zone, key_id).await;
        finish_tx(tx, result).await
    }

    #[instrument(skip(self, record), fields(zone = %record.zone, key_id = record.key_id))]
    pub async fn add_dnssec(&self, record: &DnssecKeyRecord) -> Result<(), DomainError> {
        let mut tx = self.keys.begin().await?;
        let result = tx.add_dnssec_key(record).await;
        finish_tx(tx, result).await?;
        info!("DNSSEC key imported");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn generate_dnssec(
        &self,
        zone: &str,
        flags: u16,
        algorithm: Algorithm,
        state: KeyState,
        creator: &str,
    ) -> Result<DnssecKeyRecord, DomainError> {
        let zone = parse_fqdn(zone)?;
        let mut tx = self.keys.begin().await?;
        let result = tx
            .generate_dnssec_key(&zone, flags, algorithm, state, creator)
            .await;
        let record = finish_tx(tx, result).await?;
        info!(key_id = record.key_id, ksk = record.is_ksk(), "DNSSEC key generated");
        Ok(record)
    }

    #[instrument(skip(self))]
    pub async fn set_dnssec_state(
        &self,
        zone: &str,
        key_id: u16,
        state: KeyState,
    ) -> Result<u64, DomainError> {
        let zone = parse_fqdn(zone)?;
        let mut tx = self.keys.begin().await?;
        let result = tx.set_dnssec_key_state(&zone, key_id, state).await;
        finish_tx(tx, result).await
    }

    #[instrument(skip(self))]
    pub async fn delete_dnssec(&self, zone: &str, key_id: u16) -> Result<u64, DomainError> {
        let zone = parse_fqdn(zone)?;
        let mut tx = self.keys.begin().await?;
        let result = tx.delete_dnssec_key(&zone, key_id).await;
        finish_tx(tx, result).await
    }
}
