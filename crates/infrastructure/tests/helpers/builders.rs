use ferrous_dsync_domain::keys::SIG0_KEY_FLAGS;
use ferrous_dsync_domain::{Algorithm, KeyType, PrivateKeyCache, ResourceRecord, Sig0ActiveKeys};
use ferrous_dsync_infrastructure::crypto::{generate_keypair, key_record};
use ferrous_dsync_infrastructure::database::create_pool;
use ferrous_dsync_infrastructure::repositories::SqliteKeyStore;
use sqlx::SqlitePool;
use std::sync::Arc;

pub fn rr(text: &str) -> ResourceRecord {
    text.parse().unwrap()
}

/// Fresh in-memory database with migrations applied.
pub async fn test_pool() -> SqlitePool {
    create_pool("sqlite::memory:", 1).await.unwrap()
}

pub async fn test_key_store() -> SqliteKeyStore {
    SqliteKeyStore::new(test_pool().await)
}

/// A SIG(0) keypair that never touched the database.
pub struct TestKey {
    pub key_rr: ResourceRecord,
    pub private_key: String,
    pub cache: Arc<PrivateKeyCache>,
}

impl TestKey {
    pub fn generate(zone: &str, algorithm: Algorithm) -> Self {
        let generated = generate_keypair(algorithm).unwrap();
        let key_rr = key_record(zone, SIG0_KEY_FLAGS, algorithm, generated.public_key, false);
        let key_id = key_rr.data.as_key().unwrap().key_tag();
        Self {
            private_key: generated.private_key,
            cache: Arc::new(PrivateKeyCache {
                key_rr: key_rr.clone(),
                key_id,
                algorithm,
                signer: Arc::new(generated.signer),
                key_type: KeyType::Sig0,
            }),
            key_rr,
        }
    }
}

pub fn sig0_keys(keys: &[&TestKey]) -> Sig0ActiveKeys {
    Sig0ActiveKeys {
        keys: keys.iter().map(|k| Arc::clone(&k.cache)).collect(),
    }
}
