use super::{
    ConfigError, DatabaseConfig, DelegationSyncConfig, KeygenConfig, LoggingConfig,
    ResolverConfig, ZoneConfig,
};
use crate::keys::Algorithm;
use crate::name::parse_fqdn;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::net::SocketAddr;

/// Main configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub resolver: ResolverConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub keygen: KeygenConfig,

    #[serde(default)]
    pub delegation_sync: DelegationSyncConfig,

    #[serde(default)]
    pub zones: Vec<ZoneConfig>,
}

/// Values given on the command line win over the config file.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub database_path: Option<String>,
    pub log_level: Option<String>,
    pub resolver: Option<String>,
}

impl Config {
    /// Loads the TOML file at `path` (defaults when `None`) and applies
    /// the CLI overrides.
    pub fn load(path: Option<&str>, overrides: CliOverrides) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => {
                let content =
                    std::fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
                        path: path.to_string(),
                        source,
                    })?;
                Self::from_toml(&content)?
            }
            None => Self::default(),
        };
        config.apply_overrides(overrides);
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    fn apply_overrides(&mut self, overrides: CliOverrides) {
        if let Some(path) = overrides.database_path {
            self.database.path = path;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
        if let Some(resolver) = overrides.resolver {
            self.resolver.address = resolver;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.resolver.address.trim().is_empty() {
            return Err(ConfigError::Validation(
                "resolver.address must be set".to_string(),
            ));
        }
        self.resolver
            .address
            .parse::<SocketAddr>()
            .map_err(|e| {
                ConfigError::Validation(format!(
                    "resolver.address '{}' is not ip:port: {}",
                    self.resolver.address, e
                ))
            })?;

        if !self.logging.is_known_level() {
            return Err(ConfigError::Validation(format!(
                "logging.level '{}' is not one of trace, debug, info, warn, error",
                self.logging.level
            )));
        }

        let algorithm: Algorithm = self
            .keygen
            .algorithm
            .parse()
            .map_err(|e: crate::DomainError| ConfigError::Validation(e.to_string()))?;
        if !algorithm.supports_keygen() {
            return Err(ConfigError::Validation(format!(
                "keygen.algorithm {} cannot be generated locally",
                algorithm
            )));
        }

        if self.delegation_sync.schemes.is_empty() {
            return Err(ConfigError::Validation(
                "delegation_sync.schemes must list at least one scheme".to_string(),
            ));
        }
        self.delegation_sync
            .scheme_preference()
            .map_err(|e| ConfigError::Validation(e.to_string()))?;

        let mut seen = HashSet::new();
        for zone in &self.zones {
            let name = parse_fqdn(&zone.name)
                .map_err(|e| ConfigError::Validation(format!("zone '{}': {}", zone.name, e)))?;
            if !seen.insert(name.clone()) {
                return Err(ConfigError::Validation(format!(
                    "zone {} is configured twice",
                    name
                )));
            }
            for server in zone.parent_servers.iter().chain(&zone.multisigner_targets) {
                server.parse::<SocketAddr>().map_err(|e| {
                    ConfigError::Validation(format!(
                        "zone {}: '{}' is not ip:port: {}",
                        name, server, e
                    ))
                })?;
            }
        }
        Ok(())
    }

    pub fn zone(&self, name: &str) -> Option<&ZoneConfig> {
        let name = crate::name::fqdn(name);
        self.zones
            .iter()
            .find(|z| crate::name::fqdn(&z.name) == name)
    }
}
