use crate::update::UpdateResult;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Invalid domain name: {0}")]
    InvalidDomainName(String),

    #[error("Invalid resource record: {0}")]
    InvalidRecord(String),

    #[error("Invalid DNS response: {0}")]
    InvalidDnsResponse(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Timeout talking to {0}")]
    TransportTimeout(String),

    #[error("Connection refused by {0}")]
    TransportConnectionRefused(String),

    #[error("All {} targets failed for zone {zone}", .result.targets.len())]
    AllTargetsFailed { zone: String, result: UpdateResult },

    #[error("DSYNC discovery for {zone} failed: {reason}")]
    DsyncDiscoveryFailed { zone: String, reason: String },

    #[error("No DSYNC destination found for {zone} (scheme {scheme})")]
    NoDsyncTarget { zone: String, scheme: String },

    #[error("No active {kind} key found for zone {zone}")]
    NoActiveKey { zone: String, kind: &'static str },

    #[error("Key {key_id} not found for zone {zone}")]
    KeyNotFound { zone: String, key_id: u16 },

    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("Invalid private key material: {0}")]
    InvalidPrivateKey(String),

    #[error("Signature error: {0}")]
    SignatureError(String),

    #[error(
        "Rollover for {zone} incomplete: new key {new_key_id} trusted by parent, old key {old_key_id} still active: {reason}"
    )]
    RolloverIncomplete {
        zone: String,
        old_key_id: u16,
        new_key_id: u16,
        reason: String,
    },

    #[error("Update of zone {zone} failed: {reason}")]
    ZoneUpdateFailed { zone: String, reason: String },

    #[error("Zone not found: {0}")]
    ZoneNotFound(String),

    #[error("Parent of {0} could not be determined")]
    ParentUnknown(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Channel closed: {0}")]
    ChannelClosed(String),
}

impl DomainError {
    /// Transient network failures that the fan-out senders move past.
    pub fn is_transport_error(&self) -> bool {
        matches!(
            self,
            DomainError::TransportTimeout(_)
                | DomainError::TransportConnectionRefused(_)
                | DomainError::IoError(_)
        )
    }
}
