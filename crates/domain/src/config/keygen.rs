use crate::keys::Algorithm;
use serde::{Deserialize, Serialize};

/// Defaults for generated keys.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct KeygenConfig {
    /// Algorithm for newly generated SIG(0) and DNSSEC keys (default: ED25519)
    #[serde(default = "default_algorithm")]
    pub algorithm: String,

    /// Validity of a SIG(0) signature in seconds, excluding the
    /// 60 second clock-skew margin on each side (default: 300)
    #[serde(default = "default_sig0_validity_secs")]
    pub sig0_validity_secs: u32,

    /// Validity of online RRSIGs in seconds (default: 14 days)
    #[serde(default = "default_rrsig_validity_secs")]
    pub rrsig_validity_secs: u32,
}

impl Default for KeygenConfig {
    fn default() -> Self {
        Self {
            algorithm: default_algorithm(),
            sig0_validity_secs: default_sig0_validity_secs(),
            rrsig_validity_secs: default_rrsig_validity_secs(),
        }
    }
}

impl KeygenConfig {
    /// The configured algorithm; only algorithms that can be generated
    /// locally are accepted.
    pub fn algorithm(&self) -> Result<Algorithm, crate::DomainError> {
        let algorithm: Algorithm = self.algorithm.parse()?;
        if !algorithm.supports_keygen() {
            return Err(crate::DomainError::UnsupportedAlgorithm(format!(
                "{} cannot be used for key generation",
                algorithm
            )));
        }
        Ok(algorithm)
    }
}

fn default_algorithm() -> String {
    "ED25519".to_string()
}

fn default_sig0_validity_secs() -> u32 {
    300
}

fn default_rrsig_validity_secs() -> u32 {
    14 * 24 * 3600
}
