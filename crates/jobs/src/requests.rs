use ferrous_dsync_application::use_cases::{BootstrapOutcome, RolloverAction, RolloverOutcome};
use ferrous_dsync_domain::{DelegationSyncStatus, DomainError};
use std::fmt;
use std::str::FromStr;
use tokio::sync::oneshot;

/// Commands understood by the delegation syncher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncCommand {
    /// Make sure the zone has a published SIG(0) key and report the
    /// delegation status.
    Setup,
    /// Analyse only; nothing is sent to the parent.
    Status,
    /// Implicit sync after a local change; uses the attached status when
    /// one is present.
    SyncDelegation,
    /// Operator-requested sync; always re-analyses against the parent.
    ExplicitSyncDelegation,
    /// Push a DNSKEY change (CDS or multi-signer NOTIFY).
    SyncDnskeyRrset,
}

impl SyncCommand {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncCommand::Setup => "SETUP",
            SyncCommand::Status => "STATUS",
            SyncCommand::SyncDelegation => "SYNC-DELEGATION",
            SyncCommand::ExplicitSyncDelegation => "EXPLICIT-SYNC-DELEGATION",
            SyncCommand::SyncDnskeyRrset => "SYNC-DNSKEY-RRSET",
        }
    }
}

impl fmt::Display for SyncCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncCommand {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().replace('_', "-").as_str() {
            "SETUP" => Ok(SyncCommand::Setup),
            "STATUS" => Ok(SyncCommand::Status),
            "SYNC-DELEGATION" => Ok(SyncCommand::SyncDelegation),
            "EXPLICIT-SYNC-DELEGATION" => Ok(SyncCommand::ExplicitSyncDelegation),
            "SYNC-DNSKEY-RRSET" => Ok(SyncCommand::SyncDnskeyRrset),
            other => Err(DomainError::Configuration(format!(
                "unknown delegation sync command '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DelegationSyncResponse {
    pub zone: String,
    pub status: Option<DelegationSyncStatus>,
    pub message: String,
    pub error: bool,
    pub error_msg: String,
}

impl DelegationSyncResponse {
    pub fn failed(zone: &str, error: &DomainError) -> Self {
        Self {
            zone: zone.to_string(),
            error: true,
            error_msg: error.to_string(),
            ..Default::default()
        }
    }
}

#[derive(Debug)]
pub struct DelegationSyncRequest {
    pub command: SyncCommand,
    pub zone_name: String,
    pub sync_status: Option<DelegationSyncStatus>,
    pub response: Option<oneshot::Sender<DelegationSyncResponse>>,
}

impl DelegationSyncRequest {
    pub fn new(command: SyncCommand, zone_name: &str) -> Self {
        Self {
            command,
            zone_name: zone_name.to_string(),
            sync_status: None,
            response: None,
        }
    }

    pub fn with_status(mut self, status: DelegationSyncStatus) -> Self {
        self.sync_status = Some(status);
        self
    }
}

/// SIG(0) key lifecycle work handled by the key bootstrapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyLifecycleCommand {
    /// Introduce the zone's active key to the parent.
    Bootstrap,
    /// Replace the active key at the parent.
    Rollover(RolloverAction),
}

impl fmt::Display for KeyLifecycleCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyLifecycleCommand::Bootstrap => f.write_str("BOOTSTRAP"),
            KeyLifecycleCommand::Rollover(RolloverAction::Add) => f.write_str("ROLLOVER-ADD"),
            KeyLifecycleCommand::Rollover(RolloverAction::Complete) => {
                f.write_str("ROLLOVER-COMPLETE")
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct KeyLifecycleResponse {
    pub zone: String,
    pub bootstrap: Option<BootstrapOutcome>,
    pub rollover: Option<RolloverOutcome>,
    pub message: String,
    pub error: bool,
    pub error_msg: String,
}

impl KeyLifecycleResponse {
    pub fn failed(zone: &str, error: &DomainError) -> Self {
        Self {
            zone: zone.to_string(),
            error: true,
            error_msg: error.to_string(),
            ..Default::default()
        }
    }
}

#[derive(Debug)]
pub struct KeyLifecycleRequest {
    pub command: KeyLifecycleCommand,
    pub zone_name: String,
    pub response: Option<oneshot::Sender<KeyLifecycleResponse>>,
}

impl KeyLifecycleRequest {
    pub fn new(command: KeyLifecycleCommand, zone_name: &str) -> Self {
        Self {
            command,
            zone_name: zone_name.to_string(),
            response: None,
        }
    }
}
