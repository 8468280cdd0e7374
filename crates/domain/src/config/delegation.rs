use crate::rr::SyncScheme;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Delegation synchronization behaviour shared by all child zones.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DelegationSyncConfig {
    /// Schemes to try, in order of preference (default: ["update", "notify"])
    #[serde(default = "default_schemes")]
    pub schemes: Vec<String>,

    /// Interval between polled delegation checks in seconds (default: 3600).
    /// Zero disables the periodic check.
    #[serde(default = "default_check_interval_secs")]
    pub check_interval_secs: u64,

    /// Minimum interval between non-urgent NOTIFYs for the same zone and
    /// type in seconds (default: 60)
    #[serde(default = "default_notify_min_interval_secs")]
    pub notify_min_interval_secs: u64,

    /// How long a caller waits for an engine reply in seconds (default: 30)
    #[serde(default = "default_reply_timeout_secs")]
    pub reply_timeout_secs: u64,
}

impl Default for DelegationSyncConfig {
    fn default() -> Self {
        Self {
            schemes: default_schemes(),
            check_interval_secs: default_check_interval_secs(),
            notify_min_interval_secs: default_notify_min_interval_secs(),
            reply_timeout_secs: default_reply_timeout_secs(),
        }
    }
}

impl DelegationSyncConfig {
    pub fn scheme_preference(&self) -> Result<Vec<SyncScheme>, crate::DomainError> {
        self.schemes.iter().map(|s| s.parse()).collect()
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs)
    }

    pub fn notify_min_interval(&self) -> Duration {
        Duration::from_secs(self.notify_min_interval_secs)
    }

    pub fn reply_timeout(&self) -> Duration {
        Duration::from_secs(self.reply_timeout_secs)
    }
}

fn default_schemes() -> Vec<String> {
    vec!["update".to_string(), "notify".to_string()]
}

fn default_check_interval_secs() -> u64 {
    3600
}

fn default_notify_min_interval_secs() -> u64 {
    60
}

fn default_reply_timeout_secs() -> u64 {
    30
}
