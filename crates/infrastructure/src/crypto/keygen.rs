use super::signer::{ecdsa_signing_algorithm, RingSigner};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use ferrous_dsync_domain::rr::KeyRdata;
use ferrous_dsync_domain::{Algorithm, DomainError, RecordData, ResourceRecord};
use ring::rand::SystemRandom;
use ring::signature::{EcdsaKeyPair, Ed25519KeyPair};

/// TTL of generated KEY and DNSKEY records.
const KEY_RR_TTL: u32 = 3600;

pub struct GeneratedKeypair {
    /// Base64 PKCS#8 document, the form persisted in the key store.
    pub private_key: String,
    pub public_key: Vec<u8>,
    pub signer: RingSigner,
}

pub fn generate_keypair(algorithm: Algorithm) -> Result<GeneratedKeypair, DomainError> {
    let rng = SystemRandom::new();
    let document = match algorithm {
        Algorithm::ED25519 => Ed25519KeyPair::generate_pkcs8(&rng),
        other => {
            let alg = ecdsa_signing_algorithm(other).ok_or_else(|| {
                DomainError::UnsupportedAlgorithm(format!("{} cannot be generated", other))
            })?;
            EcdsaKeyPair::generate_pkcs8(alg, &rng)
        }
    }
    .map_err(|_| DomainError::InvalidPrivateKey(format!("{} key generation failed", algorithm)))?;

    let signer = RingSigner::from_pkcs8(algorithm, document.as_ref())?;
    Ok(GeneratedKeypair {
        private_key: BASE64.encode(document.as_ref()),
        public_key: signer.public_key(),
        signer,
    })
}

/// KEY (SIG(0)) or DNSKEY record publishing `public_key` at the zone apex.
pub fn key_record(
    zone: &str,
    flags: u16,
    algorithm: Algorithm,
    public_key: Vec<u8>,
    dnskey: bool,
) -> ResourceRecord {
    let rdata = KeyRdata::new(flags, algorithm, public_key);
    let data = if dnskey {
        RecordData::Dnskey(rdata)
    } else {
        RecordData::Key(rdata)
    };
    ResourceRecord::new(zone, KEY_RR_TTL, data)
}
