use super::KeyCache;
use crate::crypto::{generate_keypair, key_record, RingSigner};
use async_trait::async_trait;
use ferrous_dsync_application::ports::{KeyStore, KeyStoreTx};
use ferrous_dsync_domain::keys::{mask_private_key, DNSKEY_FLAG_SEP, SIG0_KEY_FLAGS};
use ferrous_dsync_domain::name::fqdn;
use ferrous_dsync_domain::{
    Algorithm, DnssecActiveKeys, DnssecKeyRecord, DomainError, KeyState, KeyType,
    PrivateKeyCache, RecordType, ResourceRecord, Sig0ActiveKeys, Sig0KeyRecord, TrustedKey,
};
use sqlx::{Sqlite, SqlitePool, Transaction};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, error, info, instrument};

type Sig0Row = (String, String, i64, i64, String, String, String);
type DnssecRow = (String, String, i64, i64, i64, String, String, String);
type TrustRow = (String, i64, bool, bool, String, String);

/// Attempts at finding a key tag not yet used in the zone.
const KEYGEN_ATTEMPTS: usize = 8;

fn db_error(context: &'static str) -> impl FnOnce(sqlx::Error) -> DomainError {
    move |e| {
        error!(error = %e, "{}", context);
        DomainError::DatabaseError(e.to_string())
    }
}

fn parse_key_rr(text: &str, expected: RecordType) -> Result<ResourceRecord, DomainError> {
    let rr: ResourceRecord = text.parse()?;
    if rr.record_type() != expected {
        return Err(DomainError::InvalidRecord(format!(
            "expected a {} record, got {}",
            expected,
            rr.record_type()
        )));
    }
    Ok(rr)
}

fn key_tag_of(rr: &ResourceRecord) -> Result<u16, DomainError> {
    rr.data
        .as_key()
        .map(|key| key.key_tag())
        .ok_or_else(|| DomainError::InvalidRecord(format!("{} carries no key", rr)))
}

/// Builds a signer for a stored row; the key id is derived from the KEY
/// or DNSKEY rdata.
fn load_private_key(
    algorithm: Algorithm,
    private_key: &str,
    key_rr: &str,
    key_type: KeyType,
) -> Result<PrivateKeyCache, DomainError> {
    let expected = match key_type {
        KeyType::Sig0 => RecordType::KEY,
        KeyType::Dnssec => RecordType::DNSKEY,
    };
    let key_rr = parse_key_rr(key_rr, expected)?;
    let signer = RingSigner::from_base64(algorithm, private_key)?;
    Ok(PrivateKeyCache {
        key_id: key_tag_of(&key_rr)?,
        key_rr,
        algorithm,
        signer: Arc::new(signer),
        key_type,
    })
}

fn row_to_sig0(row: Sig0Row) -> Result<Sig0KeyRecord, DomainError> {
    let (zone, state, key_id, algorithm, creator, private_key, key_rr) = row;
    Ok(Sig0KeyRecord {
        zone,
        state: state.parse()?,
        key_id: key_id as u16,
        algorithm: Algorithm::from(algorithm as u8),
        creator,
        private_key,
        key_rr,
    })
}

fn row_to_dnssec(row: DnssecRow) -> Result<DnssecKeyRecord, DomainError> {
    let (zone, state, key_id, flags, algorithm, creator, private_key, key_rr) = row;
    Ok(DnssecKeyRecord {
        zone,
        state: state.parse()?,
        key_id: key_id as u16,
        flags: flags as u16,
        algorithm: Algorithm::from(algorithm as u8),
        creator,
        private_key,
        key_rr,
    })
}

fn row_to_trusted(row: TrustRow) -> TrustedKey {
    let (zone, key_id, validated, trusted, source, key_rr) = row;
    TrustedKey {
        zone,
        key_id: key_id as u16,
        validated,
        trusted,
        source,
        key_rr,
    }
}

/// SIG(0) and DNSSEC key tables plus the SIG(0) trust store in SQLite.
pub struct SqliteKeyStore {
    pool: SqlitePool,
    cache: Arc<KeyCache>,
}

impl SqliteKeyStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            cache: Arc::new(KeyCache::new()),
        }
    }

    pub fn cache(&self) -> &KeyCache {
        &self.cache
    }
}

#[async_trait]
impl KeyStore for SqliteKeyStore {
    async fn begin(&self) -> Result<Box<dyn KeyStoreTx>, DomainError> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("Failed to open key store transaction"))?;
        Ok(Box::new(SqliteKeyStoreTx {
            tx,
            cache: Arc::clone(&self.cache),
            touched: HashSet::new(),
        }))
    }

    #[instrument(skip(self))]
    async fn get_sig0_keys(
        &self,
        zone: &str,
        state: KeyState,
    ) -> Result<Sig0ActiveKeys, DomainError> {
        let zone = fqdn(zone);
        if let Some(keys) = self.cache.get_sig0(&zone, state) {
            return Ok(keys);
        }

        let rows = sqlx::query_as::<_, (i64, String, String)>(
            "SELECT algorithm, private_key, key_rr FROM sig0_keys
             WHERE zone = ? AND state = ? ORDER BY key_id",
        )
        .bind(&zone)
        .bind(state.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to load SIG(0) keys"))?;

        let mut keys = Sig0ActiveKeys::default();
        for (algorithm, private_key, key_rr) in rows {
            let key = load_private_key(
                Algorithm::from(algorithm as u8),
                &private_key,
                &key_rr,
                KeyType::Sig0,
            )?;
            keys.keys.push(Arc::new(key));
        }
        debug!(zone = %zone, state = %state, count = keys.keys.len(), "SIG(0) keys loaded");
        self.cache.put_sig0(&zone, state, keys.clone());
        Ok(keys)
    }

    #[instrument(skip(self))]
    async fn get_dnssec_keys(
        &self,
        zone: &str,
        state: KeyState,
    ) -> Result<DnssecActiveKeys, DomainError> {
        let zone = fqdn(zone);
        if let Some(keys) = self.cache.get_dnssec(&zone, state) {
            return Ok(keys);
        }

        let rows = sqlx::query_as::<_, (i64, i64, String, String)>(
            "SELECT flags, algorithm, private_key, key_rr FROM dnssec_keys
             WHERE zone = ? AND state = ? ORDER BY key_id",
        )
        .bind(&zone)
        .bind(state.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to load DNSSEC keys"))?;

        let mut keys = DnssecActiveKeys::default();
        for (flags, algorithm, private_key, key_rr) in rows {
            let key = Arc::new(load_private_key(
                Algorithm::from(algorithm as u8),
                &private_key,
                &key_rr,
                KeyType::Dnssec,
            )?);
            if flags as u16 & DNSKEY_FLAG_SEP != 0 {
                keys.ksks.push(key);
            } else {
                keys.zsks.push(key);
            }
        }

        if state == KeyState::Active && keys.ksks.is_empty() {
            return Err(DomainError::NoActiveKey { zone, kind: "KSK" });
        }
        // Single-key setups sign everything with the KSK
        if keys.zsks.is_empty() {
            keys.zsks = keys.ksks.clone();
        }

        self.cache.put_dnssec(&zone, state, keys.clone());
        Ok(keys)
    }

    #[instrument(skip(self))]
    async fn list_sig0_keys(&self, zone: Option<&str>) -> Result<Vec<Sig0KeyRecord>, DomainError> {
        let zone = zone.map(fqdn);
        let rows = sqlx::query_as::<_, Sig0Row>(
            "SELECT zone, state, key_id, algorithm, creator, private_key, key_rr
             FROM sig0_keys
             WHERE ? IS NULL OR zone = ?
             ORDER BY zone, key_id",
        )
        .bind(&zone)
        .bind(&zone)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to list SIG(0) keys"))?;

        rows.into_iter()
            .map(|row| {
                let mut record = row_to_sig0(row)?;
                record.private_key = mask_private_key(&record.private_key);
                Ok(record)
            })
            .collect()
    }

    #[instrument(skip(self))]
    async fn list_dnssec_keys(
        &self,
        zone: Option<&str>,
    ) -> Result<Vec<DnssecKeyRecord>, DomainError> {
        let zone = zone.map(fqdn);
        let rows = sqlx::query_as::<_, DnssecRow>(
            "SELECT zone, state, key_id, flags, algorithm, creator, private_key, key_rr
             FROM dnssec_keys
             WHERE ? IS NULL OR zone = ?
             ORDER BY zone, key_id",
        )
        .bind(&zone)
        .bind(&zone)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to list DNSSEC keys"))?;

        rows.into_iter()
            .map(|row| {
                let mut record = row_to_dnssec(row)?;
                record.private_key = mask_private_key(&record.private_key);
                Ok(record)
            })
            .collect()
    }

    #[instrument(skip(self))]
    async fn list_trusted_keys(&self, zone: Option<&str>) -> Result<Vec<TrustedKey>, DomainError> {
        let zone = zone.map(fqdn);
        let rows = sqlx::query_as::<_, TrustRow>(
            "SELECT zone, key_id, validated, trusted, source, key_rr
             FROM sig0_trust_store
             WHERE ? IS NULL OR zone = ?
             ORDER BY zone, key_id",
        )
        .bind(&zone)
        .bind(&zone)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to list trusted keys"))?;

        Ok(rows.into_iter().map(row_to_trusted).collect())
    }

    fn sig0_key_from_record(&self, record: &Sig0KeyRecord) -> Result<PrivateKeyCache, DomainError> {
        load_private_key(
            record.algorithm,
            &record.private_key,
            &record.key_rr,
            KeyType::Sig0,
        )
    }
}

/// One open SQLite transaction. Dropping it without `commit` rolls back.
pub struct SqliteKeyStoreTx {
    tx: Transaction<'static, Sqlite>,
    cache: Arc<KeyCache>,
    touched: HashSet<String>,
}

impl SqliteKeyStoreTx {
    fn touch(&mut self, zone: &str) {
        self.cache.invalidate(zone);
        self.touched.insert(zone.to_string());
    }

    async fn sig0_exists(&mut self, zone: &str, key_id: u16) -> Result<bool, DomainError> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM sig0_keys WHERE zone = ? AND key_id = ?")
                .bind(zone)
                .bind(key_id as i64)
                .fetch_one(&mut *self.tx)
                .await
                .map_err(db_error("Failed to look up SIG(0) key"))?;
        Ok(count > 0)
    }

    async fn dnssec_exists(&mut self, zone: &str, key_id: u16) -> Result<bool, DomainError> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM dnssec_keys WHERE zone = ? AND key_id = ?")
                .bind(zone)
                .bind(key_id as i64)
                .fetch_one(&mut *self.tx)
                .await
                .map_err(db_error("Failed to look up DNSSEC key"))?;
        Ok(count > 0)
    }

    async fn insert_sig0(&mut self, record: &Sig0KeyRecord) -> Result<(), DomainError> {
        sqlx::query(
            "INSERT INTO sig0_keys (zone, state, key_id, algorithm, creator, private_key, key_rr)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&record.zone)
        .bind(record.state.as_str())
        .bind(record.key_id as i64)
        .bind(record.algorithm.code() as i64)
        .bind(&record.creator)
        .bind(&record.private_key)
        .bind(&record.key_rr)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| {
            if e.to_string().contains("UNIQUE constraint failed") {
                DomainError::InvalidRecord(format!(
                    "SIG(0) key {} already exists for zone {}",
                    record.key_id, record.zone
                ))
            } else {
                error!(error = %e, "Failed to insert SIG(0) key");
                DomainError::DatabaseError(e.to_string())
            }
        })?;

        sqlx::query(
            "INSERT OR REPLACE INTO sig0_trust_store (zone, key_id, validated, trusted, source, key_rr)
             VALUES (?, ?, 1, 1, 'keystore', ?)",
        )
        .bind(&record.zone)
        .bind(record.key_id as i64)
        .bind(&record.key_rr)
        .execute(&mut *self.tx)
        .await
        .map_err(db_error("Failed to trust SIG(0) key"))?;

        self.touch(&record.zone);
        Ok(())
    }

    async fn insert_dnssec(&mut self, record: &DnssecKeyRecord) -> Result<(), DomainError> {
        sqlx::query(
            "INSERT INTO dnssec_keys (zone, state, key_id, flags, algorithm, creator, private_key, key_rr)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&record.zone)
        .bind(record.state.as_str())
        .bind(record.key_id as i64)
        .bind(record.flags as i64)
        .bind(record.algorithm.code() as i64)
        .bind(&record.creator)
        .bind(&record.private_key)
        .bind(&record.key_rr)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| {
            if e.to_string().contains("UNIQUE constraint failed") {
                DomainError::InvalidRecord(format!(
                    "DNSSEC key {} already exists for zone {}",
                    record.key_id, record.zone
                ))
            } else {
                error!(error = %e, "Failed to insert DNSSEC key");
                DomainError::DatabaseError(e.to_string())
            }
        })?;

        self.touch(&record.zone);
        Ok(())
    }
}

#[async_trait]
impl KeyStoreTx for SqliteKeyStoreTx {
    #[instrument(skip(self, record), fields(zone = %record.zone, key_id = record.key_id))]
    async fn add_sig0_key(&mut self, record: &Sig0KeyRecord) -> Result<(), DomainError> {
        let mut record = record.clone();
        record.zone = fqdn(&record.zone);
        // Reject rows whose halves do not belong together before storing them
        let loaded = load_private_key(
            record.algorithm,
            &record.private_key,
            &record.key_rr,
            KeyType::Sig0,
        )?;
        if loaded.key_rr.name != record.zone {
            return Err(DomainError::InvalidRecord(format!(
                "KEY owner {} is not the zone apex {}",
                loaded.key_rr.name, record.zone
            )));
        }
        record.key_id = loaded.key_id;
        self.insert_sig0(&record).await?;
        info!(zone = %record.zone, key_id = record.key_id, "SIG(0) key added");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn generate_sig0_key(
        &mut self,
        zone: &str,
        algorithm: Algorithm,
        state: KeyState,
        creator: &str,
    ) -> Result<Sig0KeyRecord, DomainError> {
        let zone = fqdn(zone);
        for _ in 0..KEYGEN_ATTEMPTS {
            let generated = generate_keypair(algorithm)?;
            let key_rr = key_record(&zone, SIG0_KEY_FLAGS, algorithm, generated.public_key, false);
            let key_id = key_tag_of(&key_rr)?;
            if self.sig0_exists(&zone, key_id).await? {
                debug!(zone = %zone, key_id, "Key tag collision, generating again");
                continue;
            }
            let record = Sig0KeyRecord {
                zone: zone.clone(),
                state,
                key_id,
                algorithm,
                creator: creator.to_string(),
                private_key: generated.private_key,
                key_rr: key_rr.to_string(),
            };
            self.insert_sig0(&record).await?;
            info!(zone = %zone, key_id, algorithm = %algorithm, state = %state, "SIG(0) key generated");
            return Ok(record);
        }
        Err(DomainError::InvalidPrivateKey(format!(
            "no free key tag for {} after {} attempts",
            zone, KEYGEN_ATTEMPTS
        )))
    }

    #[instrument(skip(self))]
    async fn set_sig0_key_state(
        &mut self,
        zone: &str,
        key_id: u16,
        state: KeyState,
    ) -> Result<u64, DomainError> {
        let zone = fqdn(zone);
        let result = sqlx::query(
            "UPDATE sig0_keys SET state = ?, updated_at = CURRENT_TIMESTAMP
             WHERE zone = ? AND key_id = ? AND state != ?",
        )
        .bind(state.as_str())
        .bind(&zone)
        .bind(key_id as i64)
        .bind(state.as_str())
        .execute(&mut *self.tx)
        .await
        .map_err(db_error("Failed to change SIG(0) key state"))?;

        self.touch(&zone);
        Ok(result.rows_affected())
    }

    #[instrument(skip(self))]
    async fn delete_sig0_key(&mut self, zone: &str, key_id: u16) -> Result<u64, DomainError> {
        let zone = fqdn(zone);
        let result = sqlx::query("DELETE FROM sig0_keys WHERE zone = ? AND key_id = ?")
            .bind(&zone)
            .bind(key_id as i64)
            .execute(&mut *self.tx)
            .await
            .map_err(db_error("Failed to delete SIG(0) key"))?;

        sqlx::query("DELETE FROM sig0_trust_store WHERE zone = ? AND key_id = ?")
            .bind(&zone)
            .bind(key_id as i64)
            .execute(&mut *self.tx)
            .await
            .map_err(db_error("Failed to purge trusted SIG(0) key"))?;

        self.touch(&zone);
        Ok(result.rows_affected())
    }

    #[instrument(skip(self, record), fields(zone = %record.zone, key_id = record.key_id))]
    async fn add_dnssec_key(&mut self, record: &DnssecKeyRecord) -> Result<(), DomainError> {
        let mut record = record.clone();
        record.zone = fqdn(&record.zone);
        let loaded = load_private_key(
            record.algorithm,
            &record.private_key,
            &record.key_rr,
            KeyType::Dnssec,
        )?;
        if loaded.key_rr.name != record.zone {
            return Err(DomainError::InvalidRecord(format!(
                "DNSKEY owner {} is not the zone apex {}",
                loaded.key_rr.name, record.zone
            )));
        }
        record.key_id = loaded.key_id;
        if let Some(key) = loaded.key_rr.data.as_key() {
            record.flags = key.flags;
        }
        self.insert_dnssec(&record).await?;
        info!(zone = %record.zone, key_id = record.key_id, "DNSSEC key added");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn generate_dnssec_key(
        &mut self,
        zone: &str,
        flags: u16,
        algorithm: Algorithm,
        state: KeyState,
        creator: &str,
    ) -> Result<DnssecKeyRecord, DomainError> {
        let zone = fqdn(zone);
        for _ in 0..KEYGEN_ATTEMPTS {
            let generated = generate_keypair(algorithm)?;
            let key_rr = key_record(&zone, flags, algorithm, generated.public_key, true);
            let key_id = key_tag_of(&key_rr)?;
            if self.dnssec_exists(&zone, key_id).await? {
                debug!(zone = %zone, key_id, "Key tag collision, generating again");
                continue;
            }
            let record = DnssecKeyRecord {
                zone: zone.clone(),
                state,
                key_id,
                flags,
                algorithm,
                creator: creator.to_string(),
                private_key: generated.private_key,
                key_rr: key_rr.to_string(),
            };
            self.insert_dnssec(&record).await?;
            info!(zone = %zone, key_id, flags, algorithm = %algorithm, "DNSSEC key generated");
            return Ok(record);
        }
        Err(DomainError::InvalidPrivateKey(format!(
            "no free key tag for {} after {} attempts",
            zone, KEYGEN_ATTEMPTS
        )))
    }

    #[instrument(skip(self))]
    async fn set_dnssec_key_state(
        &mut self,
        zone: &str,
        key_id: u16,
        state: KeyState,
    ) -> Result<u64, DomainError> {
        let zone = fqdn(zone);
        let result = sqlx::query(
            "UPDATE dnssec_keys SET state = ?, updated_at = CURRENT_TIMESTAMP
             WHERE zone = ? AND key_id = ? AND state != ?",
        )
        .bind(state.as_str())
        .bind(&zone)
        .bind(key_id as i64)
        .bind(state.as_str())
        .execute(&mut *self.tx)
        .await
        .map_err(db_error("Failed to change DNSSEC key state"))?;

        self.touch(&zone);
        Ok(result.rows_affected())
    }

    #[instrument(skip(self))]
    async fn delete_dnssec_key(&mut self, zone: &str, key_id: u16) -> Result<u64, DomainError> {
        let zone = fqdn(zone);
        let result = sqlx::query("DELETE FROM dnssec_keys WHERE zone = ? AND key_id = ?")
            .bind(&zone)
            .bind(key_id as i64)
            .execute(&mut *self.tx)
            .await
            .map_err(db_error("Failed to delete DNSSEC key"))?;

        self.touch(&zone);
        Ok(result.rows_affected())
    }

    async fn commit(self: Box<Self>) -> Result<(), DomainError> {
        let SqliteKeyStoreTx { tx, cache, touched } = *self;
        tx.commit()
            .await
            .map_err(db_error("Failed to commit key store transaction"))?;
        // Readers may have cached pre-commit rows while the transaction was open
        for zone in &touched {
            cache.invalidate(zone);
        }
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), DomainError> {
        let SqliteKeyStoreTx { tx, cache, touched } = *self;
        tx.rollback()
            .await
            .map_err(db_error("Failed to roll back key store transaction"))?;
        for zone in &touched {
            cache.invalidate(zone);
        }
        Ok(())
    }
}
