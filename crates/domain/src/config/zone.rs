use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-zone behaviour switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ZoneOption {
    /// Keep the parent's delegation in sync with this zone.
    DelegationSyncChild,
    /// Sign changed RRsets with the zone's active DNSSEC keys.
    OnlineSigning,
    /// Forward DNSKEY changes to multi-signer controllers.
    MultiSigner,
    /// Accept delegation updates from child zones.
    AllowChildUpdates,
}

impl fmt::Display for ZoneOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ZoneOption::DelegationSyncChild => "delegation-sync-child",
            ZoneOption::OnlineSigning => "online-signing",
            ZoneOption::MultiSigner => "multi-signer",
            ZoneOption::AllowChildUpdates => "allow-child-updates",
        };
        f.write_str(s)
    }
}

/// A zone served by this engine.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ZoneConfig {
    /// Zone apex (e.g. "child.example.com.")
    pub name: String,

    /// Zone file to load at startup
    pub file: String,

    #[serde(default)]
    pub options: Vec<ZoneOption>,

    /// Parent nameserver addresses ("ip:port") queried during delegation
    /// analysis. Discovered from the parent's NS RRset when empty.
    #[serde(default)]
    pub parent_servers: Vec<String>,

    /// Multi-signer controller addresses notified about DNSKEY changes
    #[serde(default)]
    pub multisigner_targets: Vec<String>,
}

impl ZoneConfig {
    pub fn has_option(&self, option: ZoneOption) -> bool {
        self.options.contains(&option)
    }
}
