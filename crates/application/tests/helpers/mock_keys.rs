use async_trait::async_trait;
use ferrous_dsync_application::ports::{KeyStore, KeyStoreTx};
use ferrous_dsync_domain::keys::{DNSKEY_FLAG_SEP, SIG0_KEY_FLAGS};
use ferrous_dsync_domain::rr::KeyRdata;
use ferrous_dsync_domain::{
    Algorithm, DnssecActiveKeys, DnssecKeyRecord, DomainError, KeyState, KeyType,
    PrivateKeyCache, RecordData, ResourceRecord, Sig0ActiveKeys, Sig0KeyRecord, SigningKey,
    TrustedKey,
};
use std::sync::Arc;
use tokio::sync::RwLock;

// ============================================================================
// Fake signer
// ============================================================================

/// "Signs" by prefixing the key id, enough to tell signers apart.
pub struct FakeSigner {
    pub algorithm: Algorithm,
    pub key_id: u16,
}

impl SigningKey for FakeSigner {
    fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    fn sign(&self, data: &[u8]) -> Result<Vec<u8>, DomainError> {
        let mut out = self.key_id.to_be_bytes().to_vec();
        out.extend_from_slice(&data[..data.len().min(8)]);
        Ok(out)
    }
}

#[derive(Debug, Clone, Default)]
struct Tables {
    sig0: Vec<Sig0KeyRecord>,
    dnssec: Vec<DnssecKeyRecord>,
    trusted: Vec<TrustedKey>,
    next_key: u8,
}

// ============================================================================
// Mock KeyStore
// ============================================================================

/// Transactions work on a copy of the tables that replaces the committed
/// tables on commit.
#[derive(Clone, Default)]
pub struct MockKeyStore {
    tables: Arc<RwLock<Tables>>,
    commits: Arc<RwLock<usize>>,
    rollbacks: Arc<RwLock<usize>>,
    open: Arc<RwLock<usize>>,
}

impl MockKeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn sig0_rows(&self, zone: &str) -> Vec<Sig0KeyRecord> {
        self.tables
            .read()
            .await
            .sig0
            .iter()
            .filter(|r| r.zone == zone)
            .cloned()
            .collect()
    }

    pub async fn sig0_state(&self, zone: &str, key_id: u16) -> Option<KeyState> {
        self.sig0_rows(zone)
            .await
            .into_iter()
            .find(|r| r.key_id == key_id)
            .map(|r| r.state)
    }

    pub async fn commits(&self) -> usize {
        *self.commits.read().await
    }

    pub async fn rollbacks(&self) -> usize {
        *self.rollbacks.read().await
    }

    /// Transactions begun but neither committed nor rolled back.
    pub async fn open_transactions(&self) -> usize {
        *self.open.read().await
    }

    /// Inserts a committed SIG(0) key directly.
    pub async fn seed_sig0(&self, zone: &str, state: KeyState) -> Sig0KeyRecord {
        let mut tables = self.tables.write().await;
        let record = make_sig0(&mut tables, zone, state, "seed");
        tables.sig0.push(record.clone());
        record
    }

    /// Inserts a committed DNSSEC key directly.
    pub async fn seed_dnssec(&self, zone: &str, flags: u16, state: KeyState) -> DnssecKeyRecord {
        let mut tables = self.tables.write().await;
        let record = make_dnssec(&mut tables, zone, flags, state);
        tables.dnssec.push(record.clone());
        record
    }
}

fn next_public_key(tables: &mut Tables) -> Vec<u8> {
    tables.next_key = tables.next_key.wrapping_add(1);
    vec![tables.next_key; 32]
}

fn make_sig0(tables: &mut Tables, zone: &str, state: KeyState, creator: &str) -> Sig0KeyRecord {
    let key = KeyRdata::new(SIG0_KEY_FLAGS, Algorithm::ED25519, next_public_key(tables));
    let key_id = key.key_tag();
    let key_rr = ResourceRecord::new(zone, 3600, RecordData::Key(key));
    Sig0KeyRecord {
        zone: zone.to_string(),
        state,
        key_id,
        algorithm: Algorithm::ED25519,
        creator: creator.to_string(),
        private_key: format!("private-{}", key_id),
        key_rr: key_rr.to_string(),
    }
}

fn make_dnssec(tables: &mut Tables, zone: &str, flags: u16, state: KeyState) -> DnssecKeyRecord {
    let key = KeyRdata::new(flags, Algorithm::ED25519, next_public_key(tables));
    let key_id = key.key_tag();
    let key_rr = ResourceRecord::new(zone, 3600, RecordData::Dnskey(key));
    DnssecKeyRecord {
        zone: zone.to_string(),
        state,
        key_id,
        flags,
        algorithm: Algorithm::ED25519,
        creator: "seed".to_string(),
        private_key: format!("private-{}", key_id),
        key_rr: key_rr.to_string(),
    }
}

fn load(key_rr: &str, key_id: u16, algorithm: Algorithm, key_type: KeyType) -> Result<PrivateKeyCache, DomainError> {
    Ok(PrivateKeyCache {
        key_rr: key_rr.parse()?,
        key_id,
        algorithm,
        signer: Arc::new(FakeSigner { algorithm, key_id }),
        key_type,
    })
}

#[async_trait]
impl KeyStore for MockKeyStore {
    async fn begin(&self) -> Result<Box<dyn KeyStoreTx>, DomainError> {
        let staged = self.tables.read().await.clone();
        *self.open.write().await += 1;
        Ok(Box::new(MockKeyStoreTx {
            store: self.clone(),
            staged,
        }))
    }

    async fn get_sig0_keys(&self, zone: &str, state: KeyState) -> Result<Sig0ActiveKeys, DomainError> {
        let mut keys = Vec::new();
        for row in self.sig0_rows(zone).await.into_iter().filter(|r| r.state == state) {
            keys.push(Arc::new(load(&row.key_rr, row.key_id, row.algorithm, KeyType::Sig0)?));
        }
        Ok(Sig0ActiveKeys { keys })
    }

    async fn get_dnssec_keys(&self, zone: &str, state: KeyState) -> Result<DnssecActiveKeys, DomainError> {
        let tables = self.tables.read().await;
        let mut keys = DnssecActiveKeys::default();
        for row in tables.dnssec.iter().filter(|r| r.zone == zone && r.state == state) {
            let key = Arc::new(load(&row.key_rr, row.key_id, row.algorithm, KeyType::Dnssec)?);
            if row.flags & DNSKEY_FLAG_SEP != 0 {
                keys.ksks.push(key);
            } else {
                keys.zsks.push(key);
            }
        }
        Ok(keys)
    }

    async fn list_sig0_keys(&self, zone: Option<&str>) -> Result<Vec<Sig0KeyRecord>, DomainError> {
        Ok(self
            .tables
            .read()
            .await
            .sig0
            .iter()
            .filter(|r| zone.map(|z| z == r.zone).unwrap_or(true))
            .cloned()
            .collect())
    }

    async fn list_dnssec_keys(&self, zone: Option<&str>) -> Result<Vec<DnssecKeyRecord>, DomainError> {
        Ok(self
            .tables
            .read()
            .await
            .dnssec
            .iter()
            .filter(|r| zone.map(|z| z == r.zone).unwrap_or(true))
            .cloned()
            .collect())
    }

    async fn list_trusted_keys(&self, zone: Option<&str>) -> Result<Vec<TrustedKey>, DomainError> {
        Ok(self
            .tables
            .read()
            .await
            .trusted
            .iter()
            .filter(|r| zone.map(|z| z == r.zone).unwrap_or(true))
            .cloned()
            .collect())
    }

    fn sig0_key_from_record(&self, record: &Sig0KeyRecord) -> Result<PrivateKeyCache, DomainError> {
        load(&record.key_rr, record.key_id, record.algorithm, KeyType::Sig0)
    }
}

pub struct MockKeyStoreTx {
    store: MockKeyStore,
    staged: Tables,
}

impl MockKeyStoreTx {
    fn trust(&mut self, zone: &str, key_id: u16, key_rr: &str) {
        self.staged.trusted.push(TrustedKey {
            zone: zone.to_string(),
            key_id,
            validated: true,
            trusted: true,
            source: "keystore".to_string(),
            key_rr: key_rr.to_string(),
        });
    }
}

#[async_trait]
impl KeyStoreTx for MockKeyStoreTx {
    async fn add_sig0_key(&mut self, record: &Sig0KeyRecord) -> Result<(), DomainError> {
        self.staged.sig0.push(record.clone());
        self.trust(&record.zone, record.key_id, &record.key_rr);
        Ok(())
    }

    async fn generate_sig0_key(
        &mut self,
        zone: &str,
        _algorithm: Algorithm,
        state: KeyState,
        creator: &str,
    ) -> Result<Sig0KeyRecord, DomainError> {
        let record = make_sig0(&mut self.staged, zone, state, creator);
        self.staged.sig0.push(record.clone());
        self.trust(zone, record.key_id, &record.key_rr);
        Ok(record)
    }

    async fn set_sig0_key_state(&mut self, zone: &str, key_id: u16, state: KeyState) -> Result<u64, DomainError> {
        let mut changed = 0;
        for row in self.staged.sig0.iter_mut() {
            if row.zone == zone && row.key_id == key_id && row.state != state {
                row.state = state;
                changed += 1;
            }
        }
        Ok(changed)
    }

    async fn delete_sig0_key(&mut self, zone: &str, key_id: u16) -> Result<u64, DomainError> {
        let before = self.staged.sig0.len();
        self.staged.sig0.retain(|r| !(r.zone == zone && r.key_id == key_id));
        self.staged.trusted.retain(|r| !(r.zone == zone && r.key_id == key_id));
        Ok((before - self.staged.sig0.len()) as u64)
    }

    async fn add_dnssec_key(&mut self, record: &DnssecKeyRecord) -> Result<(), DomainError> {
        self.staged.dnssec.push(record.clone());
        Ok(())
    }

    async fn generate_dnssec_key(
        &mut self,
        zone: &str,
        flags: u16,
        _algorithm: Algorithm,
        state: KeyState,
        _creator: &str,
    ) -> Result<DnssecKeyRecord, DomainError> {
        let record = make_dnssec(&mut self.staged, zone, flags, state);
        self.staged.dnssec.push(record.clone());
        Ok(record)
    }

    async fn set_dnssec_key_state(&mut self, zone: &str, key_id: u16, state: KeyState) -> Result<u64, DomainError> {
        let mut changed = 0;
        for row in self.staged.dnssec.iter_mut() {
            if row.zone == zone && row.key_id == key_id && row.state != state {
                row.state = state;
                changed += 1;
            }
        }
        Ok(changed)
    }

    async fn delete_dnssec_key(&mut self, zone: &str, key_id: u16) -> Result<u64, DomainError> {
        let before = self.staged.dnssec.len();
        self.staged.dnssec.retain(|r| !(r.zone == zone && r.key_id == key_id));
        Ok((before - self.staged.dnssec.len()) as u64)
    }

    async fn commit(self: Box<Self>) -> Result<(), DomainError> {
        *self.store.tables.write().await = self.staged;
        *self.store.commits.write().await += 1;
        *self.store.open.write().await -= 1;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), DomainError> {
        *self.store.rollbacks.write().await += 1;
        *self.store.open.write().await -= 1;
        Ok(())
    }
}
