//! Key material model shared by the key store, the signers and the
//! lifecycle use cases.

use crate::rr::ResourceRecord;
use crate::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// DNSSEC algorithm numbers (RFC 8624 subset plus passthrough).
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Algorithm {
    RSASHA256,
    RSASHA512,
    ECDSAP256SHA256,
    ECDSAP384SHA384,
    ED25519,
    Unknown(u8),
}

impl Algorithm {
    pub fn code(&self) -> u8 {
        match self {
            Algorithm::RSASHA256 => 8,
            Algorithm::RSASHA512 => 10,
            Algorithm::ECDSAP256SHA256 => 13,
            Algorithm::ECDSAP384SHA384 => 14,
            Algorithm::ED25519 => 15,
            Algorithm::Unknown(code) => *code,
        }
    }

    /// Algorithms this engine can create new keypairs for.
    pub fn supports_keygen(&self) -> bool {
        matches!(
            self,
            Algorithm::ECDSAP256SHA256 | Algorithm::ECDSAP384SHA384 | Algorithm::ED25519
        )
    }
}

impl From<u8> for Algorithm {
    fn from(code: u8) -> Self {
        match code {
            8 => Algorithm::RSASHA256,
            10 => Algorithm::RSASHA512,
            13 => Algorithm::ECDSAP256SHA256,
            14 => Algorithm::ECDSAP384SHA384,
            15 => Algorithm::ED25519,
            other => Algorithm::Unknown(other),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Algorithm::RSASHA256 => f.write_str("RSASHA256"),
            Algorithm::RSASHA512 => f.write_str("RSASHA512"),
            Algorithm::ECDSAP256SHA256 => f.write_str("ECDSAP256SHA256"),
            Algorithm::ECDSAP384SHA384 => f.write_str("ECDSAP384SHA384"),
            Algorithm::ED25519 => f.write_str("ED25519"),
            Algorithm::Unknown(code) => write!(f, "{}", code),
        }
    }
}

impl FromStr for Algorithm {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(code) = s.parse::<u8>() {
            return Ok(Algorithm::from(code));
        }
        match s.to_ascii_uppercase().as_str() {
            "RSASHA256" => Ok(Algorithm::RSASHA256),
            "RSASHA512" => Ok(Algorithm::RSASHA512),
            "ECDSAP256SHA256" => Ok(Algorithm::ECDSAP256SHA256),
            "ECDSAP384SHA384" => Ok(Algorithm::ECDSAP384SHA384),
            "ED25519" => Ok(Algorithm::ED25519),
            _ => Err(DomainError::UnsupportedAlgorithm(s.to_string())),
        }
    }
}

impl TryFrom<String> for Algorithm {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Algorithm> for String {
    fn from(value: Algorithm) -> Self {
        value.to_string()
    }
}

/// Linear key lifecycle. Deletion removes the row instead of being a state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyState {
    Created,
    Published,
    Active,
    Retired,
}

impl KeyState {
    pub const ALL: [KeyState; 4] = [
        KeyState::Created,
        KeyState::Published,
        KeyState::Active,
        KeyState::Retired,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            KeyState::Created => "created",
            KeyState::Published => "published",
            KeyState::Active => "active",
            KeyState::Retired => "retired",
        }
    }
}

impl fmt::Display for KeyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KeyState {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "created" => Ok(KeyState::Created),
            "published" => Ok(KeyState::Published),
            "active" => Ok(KeyState::Active),
            "retired" => Ok(KeyState::Retired),
            other => Err(DomainError::InvalidRecord(format!(
                "unknown key state '{}'",
                other
            ))),
        }
    }
}

/// Which table (and which RR type) a cached key came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyType {
    Sig0,
    Dnssec,
}

pub const DNSKEY_FLAG_ZONE: u16 = 0x0100;
pub const DNSKEY_FLAG_SEP: u16 = 0x0001;
pub const DNSKEY_FLAGS_KSK: u16 = DNSKEY_FLAG_ZONE | DNSKEY_FLAG_SEP;
pub const DNSKEY_FLAGS_ZSK: u16 = DNSKEY_FLAG_ZONE;
/// KEY flags used for SIG(0) keys: zone key, usable for authentication.
pub const SIG0_KEY_FLAGS: u16 = 0x0100;

/// Persisted row of the SIG(0) key table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sig0KeyRecord {
    pub zone: String,
    pub state: KeyState,
    pub key_id: u16,
    pub algorithm: Algorithm,
    pub creator: String,
    pub private_key: String,
    pub key_rr: String,
}

/// Persisted row of the DNSSEC key table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DnssecKeyRecord {
    pub zone: String,
    pub state: KeyState,
    pub key_id: u16,
    pub flags: u16,
    pub algorithm: Algorithm,
    pub creator: String,
    pub private_key: String,
    pub key_rr: String,
}

impl DnssecKeyRecord {
    pub fn is_ksk(&self) -> bool {
        self.flags & DNSKEY_FLAG_SEP != 0
    }
}

/// Public half registered in the SIG(0) trust store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrustedKey {
    pub zone: String,
    pub key_id: u16,
    pub validated: bool,
    pub trusted: bool,
    pub source: String,
    pub key_rr: String,
}

/// Shows only the first and last few characters of private key material.
pub fn mask_private_key(material: &str) -> String {
    const SHOWN: usize = 4;
    let chars: Vec<char> = material.chars().collect();
    if chars.len() <= SHOWN * 2 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..SHOWN].iter().collect();
    let tail: String = chars[chars.len() - SHOWN..].iter().collect();
    format!("{}...{}", head, tail)
}

/// Opaque signing capability backed by a private key.
pub trait SigningKey: Send + Sync {
    fn algorithm(&self) -> Algorithm;

    fn sign(&self, data: &[u8]) -> Result<Vec<u8>, DomainError>;
}

/// A key loaded from the store, ready for signing.
#[derive(Clone)]
pub struct PrivateKeyCache {
    pub key_rr: ResourceRecord,
    pub key_id: u16,
    pub algorithm: Algorithm,
    pub signer: Arc<dyn SigningKey>,
    pub key_type: KeyType,
}

impl PrivateKeyCache {
    /// Owner of the key RR, used as the signer name.
    pub fn signer_name(&self) -> &str {
        &self.key_rr.name
    }
}

impl fmt::Debug for PrivateKeyCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKeyCache")
            .field("key_rr", &self.key_rr.to_string())
            .field("key_id", &self.key_id)
            .field("algorithm", &self.algorithm)
            .field("key_type", &self.key_type)
            .finish()
    }
}

/// SIG(0) keys of one zone in one state.
#[derive(Debug, Clone, Default)]
pub struct Sig0ActiveKeys {
    pub keys: Vec<Arc<PrivateKeyCache>>,
}

impl Sig0ActiveKeys {
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn find(&self, key_id: u16) -> Option<&Arc<PrivateKeyCache>> {
        self.keys.iter().find(|k| k.key_id == key_id)
    }
}

/// DNSSEC keys of one zone in one state, split by role.
#[derive(Debug, Clone, Default)]
pub struct DnssecActiveKeys {
    pub ksks: Vec<Arc<PrivateKeyCache>>,
    pub zsks: Vec<Arc<PrivateKeyCache>>,
}
