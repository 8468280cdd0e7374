use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Resolver used for DSYNC discovery, parent lookups and glue queries.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResolverConfig {
    /// Address of a recursive resolver (default: "8.8.8.8:53")
    #[serde(default = "default_address")]
    pub address: String,

    /// Timeout for a single DNS exchange in milliseconds (default: 5000)
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl ResolverConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn default_address() -> String {
    "8.8.8.8:53".to_string()
}

fn default_timeout_ms() -> u64 {
    5000
}
