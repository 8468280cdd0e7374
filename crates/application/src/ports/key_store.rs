use async_trait::async_trait;
use ferrous_dsync_domain::{
    Algorithm, DnssecActiveKeys, DnssecKeyRecord, DomainError, KeyState, PrivateKeyCache,
    Sig0ActiveKeys, Sig0KeyRecord, TrustedKey,
};

/// Read side of the key store plus the entry point for transactions.
///
/// Reads of `(zone, state)` are served from a cache that every mutating
/// call for that zone invalidates.
#[async_trait]
pub trait KeyStore: Send + Sync {
    /// Opens a transaction. Nothing it does is visible until
    /// [`KeyStoreTx::commit`].
    async fn begin(&self) -> Result<Box<dyn KeyStoreTx>, DomainError>;

    /// SIG(0) keys of `zone` in `state`, ready for signing.
    async fn get_sig0_keys(
        &self,
        zone: &str,
        state: KeyState,
    ) -> Result<Sig0ActiveKeys, DomainError>;

    /// DNSSEC keys of `zone` in `state`, split into KSKs and ZSKs.
    ///
    /// # Errors
    ///
    /// * `DomainError::NoActiveKey` - if `state` is `Active` and no KSK exists
    async fn get_dnssec_keys(
        &self,
        zone: &str,
        state: KeyState,
    ) -> Result<DnssecActiveKeys, DomainError>;

    /// All SIG(0) rows (optionally of one zone) with private keys masked.
    async fn list_sig0_keys(&self, zone: Option<&str>) -> Result<Vec<Sig0KeyRecord>, DomainError>;

    /// All DNSSEC rows (optionally of one zone) with private keys masked.
    async fn list_dnssec_keys(
        &self,
        zone: Option<&str>,
    ) -> Result<Vec<DnssecKeyRecord>, DomainError>;

    async fn list_trusted_keys(&self, zone: Option<&str>) -> Result<Vec<TrustedKey>, DomainError>;

    /// Turns a row (for example one just generated inside a still-open
    /// transaction) into a signing key without touching the database.
    fn sig0_key_from_record(&self, record: &Sig0KeyRecord) -> Result<PrivateKeyCache, DomainError>;
}

/// Mutations of the key store inside one caller-owned transaction.
///
/// `set_*_state` and `delete_*` return the number of rows affected; a
/// missing key or a no-op transition yields 0 and is not an error.
#[async_trait]
pub trait KeyStoreTx: Send {
    /// Imports a keypair and trusts its public half.
    async fn add_sig0_key(&mut self, record: &Sig0KeyRecord) -> Result<(), DomainError>;

    /// Generates, stores and trusts a new SIG(0) keypair for `zone`.
    async fn generate_sig0_key(
        &mut self,
        zone: &str,
        algorithm: Algorithm,
        state: KeyState,
        creator: &str,
    ) -> Result<Sig0KeyRecord, DomainError>;

    async fn set_sig0_key_state(
        &mut self,
        zone: &str,
        key_id: u16,
        state: KeyState,
    ) -> Result<u64, DomainError>;

    /// Removes the key and its trust-store entry.
    async fn delete_sig0_key(&mut self, zone: &str, key_id: u16) -> Result<u64, DomainError>;

    async fn add_dnssec_key(&mut self, record: &DnssecKeyRecord) -> Result<(), DomainError>;

    async fn generate_dnssec_key(
        &mut self,
        zone: &str,
        flags: u16,
        algorithm: Algorithm,
        state: KeyState,
        creator: &str,
    ) -> Result<DnssecKeyRecord, DomainError>;

    async fn set_dnssec_key_state(
        &mut self,
        zone: &str,
        key_id: u16,
        state: KeyState,
    ) -> Result<u64, DomainError>;

    async fn delete_dnssec_key(&mut self, zone: &str, key_id: u16) -> Result<u64, DomainError>;

    async fn commit(self: Box<Self>) -> Result<(), DomainError>;

    async fn rollback(self: Box<Self>) -> Result<(), DomainError>;
}
