//! ferrous-dsync domain layer
pub mod config;
pub mod delegation;
pub mod errors;
pub mod keys;
pub mod name;
pub mod rcode;
pub mod rr;
pub mod update;

pub use config::{CliOverrides, Config, ConfigError};
pub use delegation::{DelegationSyncStatus, DsyncLookup, DsyncTarget};
pub use errors::DomainError;
pub use keys::{
    Algorithm, DnssecActiveKeys, DnssecKeyRecord, KeyState, KeyType, PrivateKeyCache,
    Sig0ActiveKeys, Sig0KeyRecord, SigningKey, TrustedKey,
};
pub use rcode::Rcode;
pub use rr::{
    OwnerData, RRset, RecordClass, RecordData, RecordType, ResourceRecord, SyncScheme,
};
pub use update::{ExtendedError, TargetStatus, UpdateMessage, UpdateResult};
